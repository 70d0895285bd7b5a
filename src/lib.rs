//! A middleware service for transitive reliable causal broadcast.
extern crate bincode;
extern crate crossbeam;
extern crate log;
extern crate petgraph;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate smallvec;
/**
 * Required broadcast API.
 */
pub mod broadcast;
/**
 * Causal verification of recorded delivery logs.
 */
pub mod causality_checker;
/**
 * Middleware configuration.
 */
pub mod configuration;
/**
 * Causal broadcast middleware that floods casts over the peer group.
 */
pub mod flood;
