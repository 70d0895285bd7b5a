use crate::flood::structs::actor::ActorId;
use crate::flood::structs::messages::Frame;
use bincode::serialize;
use crossbeam::Sender;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/**
 * Outgoing seam between the engine and the peer service. Sends are
 * best-effort and must never block the middleware thread: a frame that
 * cannot be handed over is dropped and recovered by the retransmit
 * timer.
 */
pub trait Transport {
    /**
     * Sends one frame to one peer.
     *
     * # Arguments
     *
     * `peer` - Destination actor.
     *
     * `frame` - Frame to send.
     */
    fn send(&self, peer: &ActorId, frame: &Frame);

    /**
     * Sends the same frame to several peers.
     *
     * # Arguments
     *
     * `peers` - Destination actors.
     *
     * `frame` - Frame to send.
     */
    fn send_many(&self, peers: &[ActorId], frame: &Frame) {
        for peer in peers {
            self.send(peer, frame);
        }
    }
}

/**
 * Channel-backed transport over the per-peer Sender threads. A frame is
 * serialized once and the bytes shared across every destination.
 */
pub struct PeerLinks {
    links: HashMap<ActorId, Sender<Arc<Vec<u8>>>>,
}

impl PeerLinks {
    /**
     * Wraps the outbound channels returned by the connector.
     *
     * # Arguments
     *
     * `links` - Channel to the Sender thread of each peer.
     */
    pub fn new(links: HashMap<ActorId, Sender<Arc<Vec<u8>>>>) -> PeerLinks {
        PeerLinks { links }
    }

    /**
     * Iterates over the peers a link exists for.
     */
    pub fn peers(&self) -> impl Iterator<Item = &ActorId> {
        self.links.keys()
    }

    fn encode(frame: &Frame) -> Option<Arc<Vec<u8>>> {
        match serialize(frame) {
            Ok(bytes) => Some(Arc::new(bytes)),
            Err(e) => {
                warn!("could not serialize an outgoing frame: {}", e);
                None
            }
        }
    }

    fn dispatch(&self, peer: &ActorId, bytes: Arc<Vec<u8>>) {
        match self.links.get(peer) {
            Some(link) => {
                if link.send(bytes).is_err() {
                    warn!("the sender thread for {} is gone, dropping frame", peer);
                }
            }
            None => {
                debug!("no link to {}, dropping frame", peer);
            }
        }
    }
}

impl Transport for PeerLinks {
    fn send(&self, peer: &ActorId, frame: &Frame) {
        if let Some(bytes) = PeerLinks::encode(frame) {
            self.dispatch(peer, bytes);
        }
    }

    fn send_many(&self, peers: &[ActorId], frame: &Frame) {
        if peers.is_empty() {
            return;
        }

        if let Some(bytes) = PeerLinks::encode(frame) {
            for peer in peers {
                self.dispatch(peer, Arc::clone(&bytes));
            }
        }
    }
}
