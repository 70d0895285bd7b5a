/**
 * Causality checker algorithm implementation.
 */
pub mod causality_checker;
/**
 * Auxiliary structs for the causality checker.
 */
pub mod causality_checker_structs;
/**
 * Mapping the results of the checker to the petgraph format.
 */
pub mod petgraph;
