use petgraph::dot::{Config, Dot};
use petgraph::Graph;
use std::fs::File;
use std::io::Write;

/**
 * Writes to a file the causal graph built by the causality checker using
 * petgraph's dot format. This file can be visualized by opening it in a
 * program that can read this format. The graph is returned from the
 * check_causal_delivery function call.
 *
 * # Arguments
 *
 * `graph` - Causal graph built by the causality checker.
 *
 * `filename` - Filename to write the output into.
 */
pub fn plot_graph(graph: &Graph<String, ()>, filename: &str) {
    let dot = Dot::with_config(graph, &[Config::EdgeNoLabel]);
    let output = format!("{:?}", dot);
    let mut file = File::create(filename).unwrap();

    write!(file, "{}", output).unwrap();
}
