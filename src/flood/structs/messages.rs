use super::actor::ActorId;
use super::vector_clock::VClock;
use crossbeam::Sender;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;

/**
 * Wire frame exchanged between peers.
 */
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum Frame {
    ///Application cast relayed through the group
    Cast {
        origin: ActorId,
        payload: Vec<u8>,
        ts: VClock,
        sender: ActorId,
    },
    ///Receipt acknowledgement for a cast
    Ack { ts: VClock, sender: ActorId },
}

/**
 * Enum of the messages sent/received in the streams between peers.
 */
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum StreamMsg {
    ///Stream opening: the connecting peer introduces itself
    Hello { actor: ActorId },
    ///Serialized wire frame
    Frame { bytes: Vec<u8> },
    ///Terminate connection
    Close,
}

/**
 * Error reported by the application delivery handler. A refused message
 * stays buffered and the local clock is not advanced.
 */
#[derive(Debug)]
pub struct HandlerError {
    ///Reason reported by the handler
    pub reason: String,
}

impl HandlerError {
    pub fn new(reason: &str) -> HandlerError {
        HandlerError {
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "delivery handler refused the message: {}", self.reason)
    }
}

impl Error for HandlerError {}

/**
 * Application callback invoked for each causally ready message.
 */
pub type DeliveryHandler = Box<dyn FnMut(&VClock, &[u8]) -> Result<(), HandlerError> + Send>;

/**
 * Enum for the events drained by the middleware thread, one at a time,
 * in arrival order.
 */
pub enum EngineEvent {
    ///Cast requested by the client; the assigned timestamp is sent back
    Broadcast {
        payload: Vec<u8>,
        reply: Sender<VClock>,
    },
    ///Replace the delivery handler
    SetHandler { handler: DeliveryHandler },
    ///Filter the given timestamps down to the stable ones
    StableFilter {
        clocks: Vec<VClock>,
        reply: Sender<Vec<VClock>>,
    },
    ///Frame received from a peer
    Frame { frame: Frame },
    ///Replacement of the member set
    Membership { members: BTreeSet<ActorId> },
    ///Periodic retransmit scan
    Tick,
    ///Connection end
    End,
}

/**
 * Enum that will be sent by the middleware to the client.
 */
pub enum EngineNotice {
    ///Causally delivered message with its timestamp and payload
    Deliver { ts: VClock, payload: Vec<u8> },
    ///The middleware finished shutting down
    Stopped,
}
