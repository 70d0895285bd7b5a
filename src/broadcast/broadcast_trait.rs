use crate::configuration::middleware_configuration::Configuration;
use crate::flood::structs::actor::ActorId;
use crate::flood::structs::messages::DeliveryHandler;
use crate::flood::structs::vector_clock::VClock;
use crossbeam::{RecvError, RecvTimeoutError, TryRecvError};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;
use std::time::Duration;

/**
 * Required API for the reliable causal broadcast middleware.
 * Every broadcast is flooded through the group, delivered at each member
 * in an order consistent with vector clock causality, and retransmitted
 * until every recipient acknowledged it.
 */
pub trait CausalBroadcast {
    /**
     * Creates a new middleware instance. This function only returns after
     * the middleware has a connection to every other peer in both
     * directions.
     *
     * # Arguments
     *
     * `actor` - Local node's globally unique identity.
     *
     * `local_port` - Port where the middleware will be listening for connections.
     *
     * `peer_addresses` - Addresses the middleware will connect to.
     *
     * `configuration` - Middleware's configuration file.
     */
    fn new(
        actor: ActorId,
        local_port: usize,
        peer_addresses: Vec<String>,
        configuration: Configuration,
    ) -> Self;

    /**
     * Broadcasts a message to every peer in the group and returns the
     * timestamp assigned to it.
     *
     * # Arguments
     *
     * `payload` - Serialized message to be broadcast
     */
    fn broadcast(&mut self, payload: Vec<u8>) -> Result<VClock, BroadcastError>;

    /**
     * Replaces the delivery handler invoked for each causally ready
     * message. When a handler refuses a message it stays buffered and is
     * retried on the next state change. Until a handler is installed,
     * deliveries are sent to the channel behind `recv`.
     *
     * # Arguments
     *
     * `handler` - Callback receiving the timestamp and payload.
     */
    fn set_delivery_handler(&mut self, handler: DeliveryHandler) -> Result<(), BroadcastError>;

    /**
     * Filters the given timestamps down to those known to have been
     * observed by every current member.
     *
     * # Arguments
     *
     * `clocks` - Candidate timestamps.
     */
    fn stable_filter(&mut self, clocks: Vec<VClock>) -> Result<Vec<VClock>, BroadcastError>;

    /**
     * Replaces the member set. The local actor is ignored if present.
     *
     * # Arguments
     *
     * `members` - The new membership.
     */
    fn update_membership(&mut self, members: BTreeSet<ActorId>) -> Result<(), BroadcastError>;

    /**
     * Delivers a message from the middleware. Blocks the calling thread
     * until a message is delivered or the channel to the middleware is
     * disconnected.
     */
    fn recv(&mut self) -> Result<Delivery, RecvError>;

    /**
     * Attempts to deliver a message from the middleware without blocking
     * the caller thread. Either a message is immediately delivered from
     * the channel or an error is returned if the channel is empty.
     */
    fn try_recv(&mut self) -> Result<Delivery, TryRecvError>;

    /**
     * Waits for a message to be delivered from the middleware for a
     * limited time.
     *
     * # Arguments
     *
     * `duration` - Timeout duration
     */
    fn recv_timeout(&mut self, duration: Duration) -> Result<Delivery, RecvTimeoutError>;

    /**
     * Signals and waits for the middleware to terminate. Buffered and
     * unacknowledged messages are abandoned.
     */
    fn end(&self);
}

/**
 * A causally delivered message handed to the client.
 */
#[derive(Debug, Clone)]
pub struct Delivery {
    ///Timestamp assigned by the origin
    pub ts: VClock,
    ///Message payload
    pub payload: Vec<u8>,
}

/**
 * Error from a request to the middleware thread.
 */
#[derive(Debug)]
pub enum BroadcastError {
    ///The middleware mailbox is closed
    EngineDown,
    ///The middleware dropped the reply channel before answering
    NoReply,
}

impl fmt::Display for BroadcastError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BroadcastError::EngineDown => write!(f, "the middleware thread is not running"),
            BroadcastError::NoReply => write!(f, "the middleware did not answer the request"),
        }
    }
}

impl Error for BroadcastError {}
