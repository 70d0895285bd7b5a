/**
 * Required API for the causal broadcast middleware.
 */
pub mod broadcast_trait;
