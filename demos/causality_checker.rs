use trcb::causality_checker::petgraph::plot_graph;
use trcb::causality_checker::{
    causality_checker::check_causal_delivery,
    causality_checker_structs::{CausalityChecker, DeliveryRecord},
};
use trcb::flood::structs::actor::ActorId;
use trcb::flood::structs::vector_clock::VClock;

fn main() {
    //A group with 2 nodes
    //A delivery log is a vec of DeliveryRecord in delivery order, one
    //per node; every broadcast also counts as a delivery at its origin
    let first = ActorId::new("localhost", 0);
    let second = ActorId::new("localhost", 1);

    //Building the first node's messages: three casts in a row
    let mut clock = VClock::fresh();
    clock.increment(&first);
    let a1 = DeliveryRecord::new(first.clone(), clock.clone());
    clock.increment(&first);
    let a2 = DeliveryRecord::new(first.clone(), clock.clone());
    clock.increment(&first);
    let a3 = DeliveryRecord::new(first.clone(), clock.clone());

    //Building the second node's messages: the second cast is sent after
    //delivering the first node's initial cast, so it causally follows it
    let mut other_clock = VClock::fresh();
    other_clock.increment(&second);
    let b1 = DeliveryRecord::new(second.clone(), other_clock.clone());
    other_clock.merge(&a1.ts);
    other_clock.increment(&second);
    let b2 = DeliveryRecord::new(second, other_clock);

    //Building the group's delivery logs
    //Both logs respect the causal order but interleave the concurrent
    //messages differently
    let one_peer_log = vec![a1.clone(), a2.clone(), a3.clone(), b1.clone(), b2.clone()];
    let another_peer_log = vec![b1, a1, b2, a2, a3];
    let peer_delivery_logs = vec![one_peer_log, another_peer_log];

    //Calling the causality checker function
    match check_causal_delivery(&peer_delivery_logs) {
        CausalityChecker::Ok(graph) => {
            //It's possible to write the causal graph to a file, so it can
            //be visualized. Note that the graph holds every distinct
            //recorded message, so only use this when the number of nodes
            //is relatively small.
            plot_graph(&graph, "causal_graph.dot");
            println!("the delivery logs are causally consistent");
            println!("causal graph written to causal_graph.dot");
        }
        CausalityChecker::Error(error) => {
            //An error was found while traversing the delivery logs.
            println!("{}", error);
        }
    }
}
