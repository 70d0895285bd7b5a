use crate::flood::structs::actor::ActorId;
use crate::flood::structs::vector_clock::VClock;
use petgraph::Graph;
use std::fmt;

/**
 * One delivery recorded at a node: the origin of the message and the
 * timestamp it was tagged with.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRecord {
    ///Actor that created the message
    pub origin: ActorId,
    ///Timestamp assigned by the origin
    pub ts: VClock,
}

impl DeliveryRecord {
    /**
     * Builds a new delivery record.
     *
     * # Arguments
     *
     * `origin` - Actor that created the message.
     *
     * `ts` - Timestamp assigned by the origin.
     */
    pub fn new(origin: ActorId, ts: VClock) -> DeliveryRecord {
        DeliveryRecord { origin, ts }
    }

    /**
     * Short label for the record, used as the node label in the causal
     * graph.
     */
    pub fn label(&self) -> String {
        format!("({}, {})", self.origin, self.ts.get(&self.origin))
    }
}

/**
 * Enum with the results of the causality checker.
 */
#[derive(Debug)]
pub enum CausalityChecker {
    ///Every log is a duplicate-free linear extension of the causal order.
    Ok(Graph<String, ()>),
    ///An error was found while traversing the delivery logs.
    Error(CausalityCheckerError),
}

/**
 * Enum with the type of errors found while traversing the delivery logs.
 */
#[derive(Debug, PartialEq)]
pub enum CausalityCheckerErrorEnum {
    ///The same timestamp was delivered twice at one node.
    Duplicate,
    ///A message was delivered before one of its causal predecessors.
    Delivery,
}

/**
 * Error found while traversing the delivery logs, with the offending
 * log and position.
 */
#[derive(Debug)]
pub struct CausalityCheckerError {
    ///Kind of violation
    pub kind: CausalityCheckerErrorEnum,
    ///Human readable description
    pub message: String,
    ///Index of the offending log
    pub log_index: usize,
    ///Offending position within the log
    pub position: usize,
    ///Record at the offending position
    pub record: DeliveryRecord,
}

impl CausalityCheckerError {
    pub fn new(
        kind: CausalityCheckerErrorEnum,
        message: String,
        log_index: usize,
        position: usize,
        record: DeliveryRecord,
    ) -> CausalityCheckerError {
        CausalityCheckerError {
            kind,
            message,
            log_index,
            position,
            record,
        }
    }
}

impl fmt::Display for CausalityCheckerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:?} violation at log {} position {} ({}): {}",
            self.kind,
            self.log_index,
            self.position,
            self.record.label(),
            self.message
        )
    }
}
