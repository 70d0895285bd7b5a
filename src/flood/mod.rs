/**
 * Transport layer of the middleware service.
 */
pub mod communication;
/**
 * API and necessary state for the client to communicate with the middleware.
 */
pub mod handle;
/**
 * Middleware that ensures causal delivery, reliable retransmission and
 * stability tracking.
 */
pub mod middleware;
/**
 * Common structs of the middleware service.
 */
pub mod structs;
