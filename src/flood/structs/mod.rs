/**
 * Node identity.
 */
pub mod actor;
/**
 * Wire frames and channel messages of the middleware service.
 */
pub mod messages;
/**
 * Keyed vector clock.
 */
pub mod vector_clock;
