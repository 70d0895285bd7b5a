use crate::configuration::middleware_configuration::Configuration;
use crate::flood::communication::transport::Transport;
use crate::flood::middleware::retransmit::RetransmitQueue;
use crate::flood::middleware::stability::TimestampMatrix;
use crate::flood::structs::actor::ActorId;
use crate::flood::structs::messages::{DeliveryHandler, Frame};
use crate::flood::structs::vector_clock::VClock;
use log::{debug, warn};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/**
 * A received cast waiting for its causal dependencies.
 */
#[derive(Debug, Clone)]
pub struct PendingCast {
    ///Actor that created the cast
    pub origin: ActorId,
    ///Cast payload
    pub payload: Vec<u8>,
    ///Timestamp assigned by the origin
    pub ts: VClock,
}

/**
 * Implementation of the reliable causal broadcast state machine.
 *
 * Every mutation happens in response to exactly one event: a client
 * broadcast, a received frame, a membership replacement or the resend
 * timer. Received casts are acknowledged to the immediate hop, relayed
 * to every member that does not provably hold them yet, and buffered
 * until their causal dependencies are covered by the local clock.
 */
pub struct Engine<T: Transport> {
    actor: ActorId,
    vv: VClock,
    members: BTreeSet<ActorId>,
    pending: Vec<PendingCast>,
    rtm: TimestampMatrix,
    svv: VClock,
    retransmit: RetransmitQueue,
    handler: DeliveryHandler,
    transport: T,
    configuration: Arc<Configuration>,
}

impl<T: Transport> Engine<T> {
    /**
     * Builds a new engine.
     *
     * # Arguments
     *
     * `actor` - Local node's globally unique identity.
     *
     * `members` - Initial member set; the local actor is ignored if present.
     *
     * `transport` - Outgoing seam to the peer service.
     *
     * `handler` - Delivery handler invoked for each causally ready message.
     *
     * `configuration` - Middleware's configuration file.
     */
    pub fn new(
        actor: ActorId,
        mut members: BTreeSet<ActorId>,
        transport: T,
        handler: DeliveryHandler,
        configuration: Arc<Configuration>,
    ) -> Engine<T> {
        members.remove(&actor);
        let rtm = TimestampMatrix::new(&actor, &members);

        Engine {
            actor,
            vv: VClock::fresh(),
            members,
            pending: Vec::new(),
            rtm,
            svv: VClock::fresh(),
            retransmit: RetransmitQueue::new(),
            handler,
            transport,
            configuration,
        }
    }

    /**
     * Handler for a message sent by the client to be broadcast. Assigns
     * the next local timestamp, sends the cast to every member and
     * registers it for retransmission until everyone acknowledged.
     * Returns the assigned timestamp.
     *
     * # Arguments
     *
     * `payload` - Message received from the client.
     */
    pub fn broadcast(&mut self, payload: Vec<u8>) -> VClock {
        self.vv.increment(&self.actor);
        let ts = self.vv.clone();
        self.rtm.update_local(&self.actor, &self.vv);
        self.refresh_stable_vector();

        if self.configuration.deliver_locally {
            // This path is causally ready by construction and the clock
            // already covers it, so a refusal cannot be retried through
            // the buffer.
            if let Err(e) = (self.handler)(&ts, &payload) {
                warn!("{}: dropping refused local delivery {:?}: {}", self.actor, ts, e);
            }
        }

        let recipients: SmallVec<[ActorId; 8]> = self.members.iter().cloned().collect();
        let frame = Frame::Cast {
            origin: self.actor.clone(),
            payload: payload.clone(),
            ts: ts.clone(),
            sender: self.actor.clone(),
        };
        self.transport.send_many(&recipients, &frame);
        self.retransmit
            .register(ts.clone(), self.actor.clone(), payload, self.members.clone());

        ts
    }

    /**
     * Replaces the delivery handler and retries the buffered casts the
     * previous handler may have refused.
     *
     * # Arguments
     *
     * `handler` - The new delivery handler.
     */
    pub fn set_delivery_handler(&mut self, handler: DeliveryHandler) {
        self.handler = handler;
        self.drain_pending();
    }

    /**
     * Returns the subset of the given timestamps that every current
     * member is known to have observed.
     *
     * # Arguments
     *
     * `clocks` - Candidate timestamps.
     */
    pub fn stable_filter(&self, clocks: Vec<VClock>) -> Vec<VClock> {
        clocks
            .into_iter()
            .filter(|ts| self.svv.descends(ts))
            .collect()
    }

    /**
     * Handles a frame received from a peer.
     *
     * # Arguments
     *
     * `frame` - The received frame.
     */
    pub fn on_frame(&mut self, frame: Frame) {
        match frame {
            Frame::Cast {
                origin,
                payload,
                ts,
                sender,
            } => self.on_cast(origin, payload, ts, sender),
            Frame::Ack { ts, sender } => self.on_ack(ts, sender),
        }
    }

    /**
     * Replaces the member set. Departed members lose their stability row
     * so they cannot hold the stable vector down forever; joiners start
     * from a fresh row. Awaiting sets of already registered casts are
     * left untouched.
     *
     * # Arguments
     *
     * `members` - The new membership; the local actor is ignored if present.
     */
    pub fn on_membership(&mut self, mut members: BTreeSet<ActorId>) {
        members.remove(&self.actor);
        self.rtm.rescope(&self.actor, &members);
        self.members = members;
        self.refresh_stable_vector();
    }

    /**
     * Periodic retransmit scan: casts whose last send is older than the
     * configured threshold are sent again to the recipients that have
     * not acknowledged and are still members.
     */
    pub fn tick_resend(&mut self) {
        let resend_after = self.configuration.get_resend_after();
        let actor = self.actor.clone();
        let members = &self.members;
        let transport = &self.transport;

        for (ts, entry) in self.retransmit.due_mut(resend_after) {
            let targets: SmallVec<[ActorId; 8]> = entry
                .awaiting
                .iter()
                .filter(|peer| members.contains(*peer))
                .cloned()
                .collect();

            if !targets.is_empty() {
                let frame = Frame::Cast {
                    origin: entry.origin.clone(),
                    payload: entry.payload.clone(),
                    ts: ts.clone(),
                    sender: actor.clone(),
                };
                transport.send_many(&targets, &frame);
            }

            entry.last_sent = Instant::now();
        }
    }

    fn on_cast(&mut self, origin: ActorId, payload: Vec<u8>, ts: VClock, sender: ActorId) {
        // Receipt is an observation of the origin's progress whether or
        // not the cast turns out to be a duplicate.
        if self.rtm.observe(&origin, &ts) {
            self.refresh_stable_vector();
        }

        // Every copy is acknowledged: the sender resends until it hears
        // from us, and a duplicate means our previous ack may be lost.
        let ack = Frame::Ack {
            ts: ts.clone(),
            sender: self.actor.clone(),
        };
        self.transport.send(&sender, &ack);

        if self.vv.descends(&ts) || self.pending.iter().any(|cast| cast.ts == ts) {
            debug!("{}: dropping duplicate cast {:?} from {}", self.actor, ts, sender);
            return;
        }

        // Relay to everyone except the hop it came from and its origin,
        // who both already hold it.
        let targets: SmallVec<[ActorId; 8]> = self
            .members
            .iter()
            .filter(|member| **member != sender && **member != origin)
            .cloned()
            .collect();

        if !targets.is_empty() {
            let relay = Frame::Cast {
                origin: origin.clone(),
                payload: payload.clone(),
                ts: ts.clone(),
                sender: self.actor.clone(),
            };
            self.transport.send_many(&targets, &relay);
            self.retransmit.register(
                ts.clone(),
                origin.clone(),
                payload.clone(),
                targets.iter().cloned().collect(),
            );
        }

        self.admit(PendingCast {
            origin,
            payload,
            ts,
        });
    }

    fn on_ack(&mut self, ts: VClock, sender: ActorId) {
        if !self.retransmit.ack(&ts, &sender) {
            debug!("{}: ack from {} for an unknown cast {:?}", self.actor, sender, ts);
        }
    }

    /**
     * Delivers a cast right away when it is causally ready, otherwise
     * appends it to the pending buffer in arrival order.
     */
    fn admit(&mut self, cast: PendingCast) {
        if self.vv.admits(&cast.origin, &cast.ts) {
            if self.deliver(&cast) {
                self.drain_pending();
            } else {
                self.pending.push(cast);
            }
        } else {
            self.pending.push(cast);
        }
    }

    /**
     * Invokes the handler for one cast. The clock only advances when the
     * handler accepts.
     */
    fn deliver(&mut self, cast: &PendingCast) -> bool {
        match (self.handler)(&cast.ts, &cast.payload) {
            Ok(()) => {
                self.vv.merge(&cast.ts);
                self.rtm.update_local(&self.actor, &self.vv);
                self.refresh_stable_vector();
                true
            }
            Err(e) => {
                warn!("{}: keeping {:?} buffered: {}", self.actor, cast.ts, e);
                false
            }
        }
    }

    /**
     * Re-scans the pending buffer in insertion order, delivering every
     * cast that became causally ready, until a pass changes nothing.
     * Copies whose timestamp the clock already descends are discarded.
     * A handler refusal stops the scan; the refused cast stays buffered
     * for the next attempt.
     */
    fn drain_pending(&mut self) {
        let mut stalled = false;

        loop {
            let mut progressed = false;
            let mut kept_index = 0;

            for scan_index in 0..self.pending.len() {
                let cast = self.pending[scan_index].clone();

                if !stalled && self.vv.descends(&cast.ts) {
                    // Covered by a delivery on another path.
                    progressed = true;
                } else if !stalled && self.vv.admits(&cast.origin, &cast.ts) {
                    if self.deliver(&cast) {
                        progressed = true;
                    } else {
                        stalled = true;
                        self.pending[kept_index] = cast;
                        kept_index += 1;
                    }
                } else {
                    self.pending[kept_index] = cast;
                    kept_index += 1;
                }
            }

            self.pending.truncate(kept_index);

            if stalled || !progressed || self.pending.is_empty() {
                break;
            }
        }
    }

    fn refresh_stable_vector(&mut self) {
        self.svv = self.rtm.stable_vector(&self.actor, &self.members);
    }

    /**
     * The node's current causal knowledge.
     */
    pub fn vv(&self) -> &VClock {
        &self.vv
    }

    /**
     * The current stable version vector.
     */
    pub fn svv(&self) -> &VClock {
        &self.svv
    }

    pub fn members(&self) -> &BTreeSet<ActorId> {
        &self.members
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn retransmit_len(&self) -> usize {
        self.retransmit.len()
    }
}
