use super::causality_checker_structs::*;
use petgraph::graph::NodeIndex;
use petgraph::Graph;
use std::collections::HashMap;

/**
 * Checks a group's recorded delivery logs: each log must be free of
 * duplicate timestamps and be a linear extension of the vector clock
 * order, meaning no message appears before one of its causal
 * predecessors. On success the global causal graph of every recorded
 * message is returned, with an edge from each message to the messages
 * that causally follow it.
 *
 * # Arguments
 *
 * `peer_delivery_logs` - One delivery sequence per node, in delivery order.
 */
pub fn check_causal_delivery(peer_delivery_logs: &[Vec<DeliveryRecord>]) -> CausalityChecker {
    for (log_index, log) in peer_delivery_logs.iter().enumerate() {
        for position in 0..log.len() {
            let record = &log[position];

            for earlier in 0..position {
                let earlier_record = &log[earlier];

                if earlier_record.ts == record.ts {
                    return CausalityChecker::Error(CausalityCheckerError::new(
                        CausalityCheckerErrorEnum::Duplicate,
                        format!("already delivered at position {}", earlier),
                        log_index,
                        position,
                        record.clone(),
                    ));
                }

                if earlier_record.ts.dominates(&record.ts) {
                    return CausalityChecker::Error(CausalityCheckerError::new(
                        CausalityCheckerErrorEnum::Delivery,
                        format!(
                            "delivered after its causal successor {}",
                            earlier_record.label()
                        ),
                        log_index,
                        position,
                        record.clone(),
                    ));
                }
            }
        }
    }

    CausalityChecker::Ok(build_causal_graph(peer_delivery_logs))
}

/**
 * Builds the global causal graph over the distinct recorded messages.
 */
fn build_causal_graph(peer_delivery_logs: &[Vec<DeliveryRecord>]) -> Graph<String, ()> {
    let mut graph = Graph::<String, ()>::new();
    let mut distinct: Vec<DeliveryRecord> = Vec::new();
    let mut indexes: HashMap<String, NodeIndex> = HashMap::new();

    for log in peer_delivery_logs {
        for record in log {
            if !distinct.iter().any(|known| known.ts == record.ts) {
                let index = graph.add_node(record.label());
                indexes.insert(record.label(), index);
                distinct.push(record.clone());
            }
        }
    }

    for predecessor in &distinct {
        for successor in &distinct {
            if successor.ts.dominates(&predecessor.ts) {
                graph.add_edge(
                    indexes[&predecessor.label()],
                    indexes[&successor.label()],
                    (),
                );
            }
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flood::structs::actor::ActorId;
    use crate::flood::structs::vector_clock::VClock;

    fn actor(tag: u64) -> ActorId {
        ActorId::new("test", tag)
    }

    fn record(origin: u64, entries: &[(u64, u64)]) -> DeliveryRecord {
        let mut ts = VClock::fresh();
        for (tag, counter) in entries {
            for _ in 0..*counter {
                ts.increment(&actor(*tag));
            }
        }
        DeliveryRecord::new(actor(origin), ts)
    }

    #[test]
    fn consistent_logs_pass_and_build_the_graph() {
        let x = record(0, &[(0, 1)]);
        let y = record(1, &[(0, 1), (1, 1)]);
        let z = record(2, &[(2, 1)]);

        // z is concurrent with x and y, so both interleavings are fine.
        let logs = vec![
            vec![x.clone(), y.clone(), z.clone()],
            vec![z.clone(), x.clone(), y.clone()],
        ];

        match check_causal_delivery(&logs) {
            CausalityChecker::Ok(graph) => {
                assert_eq!(graph.node_count(), 3);
                // Only x -> y is a causal edge.
                assert_eq!(graph.edge_count(), 1);
            }
            CausalityChecker::Error(e) => panic!("unexpected violation: {}", e),
        }
    }

    #[test]
    fn the_causal_graph_can_be_plotted_in_dot_format() {
        use crate::causality_checker::petgraph::plot_graph;
        use std::fs;

        let x = record(0, &[(0, 1)]);
        let y = record(1, &[(0, 1), (1, 1)]);
        let logs = vec![vec![x, y]];

        let graph = match check_causal_delivery(&logs) {
            CausalityChecker::Ok(graph) => graph,
            CausalityChecker::Error(e) => panic!("unexpected violation: {}", e),
        };

        let path = std::env::temp_dir().join("trcb_causal_graph.dot");
        plot_graph(&graph, path.to_str().unwrap());

        let output = fs::read_to_string(&path).unwrap();
        assert!(output.contains("digraph"));
        // The x -> y dependency shows up as an edge.
        assert!(output.contains("->"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn an_inverted_pair_is_reported() {
        let x = record(0, &[(0, 1)]);
        let y = record(1, &[(0, 1), (1, 1)]);

        let logs = vec![vec![y, x]];

        match check_causal_delivery(&logs) {
            CausalityChecker::Ok(_) => panic!("the inversion was not detected"),
            CausalityChecker::Error(e) => {
                assert_eq!(e.kind, CausalityCheckerErrorEnum::Delivery);
                assert_eq!(e.log_index, 0);
                assert_eq!(e.position, 1);
            }
        }
    }

    #[test]
    fn a_duplicate_delivery_is_reported() {
        let x = record(0, &[(0, 1)]);

        let logs = vec![vec![x.clone(), x]];

        match check_causal_delivery(&logs) {
            CausalityChecker::Ok(_) => panic!("the duplicate was not detected"),
            CausalityChecker::Error(e) => {
                assert_eq!(e.kind, CausalityCheckerErrorEnum::Duplicate);
                assert_eq!(e.position, 1);
            }
        }
    }
}
