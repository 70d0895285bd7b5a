use crate::flood::structs::actor::ActorId;
use crate::flood::structs::messages::{EngineEvent, Frame, StreamMsg};
use bincode::{deserialize, deserialize_from};
use crossbeam::Sender;
use log::{debug, warn};
use std::net::TcpStream;
use std::sync::{Arc, Barrier};

/**
 * Starts a Reader thread that decodes frames sent by a peer and posts
 * them to the middleware.
 *
 * # Arguments
 *
 * `stream` - TCP stream between the peers.
 *
 * `middleware_channel` - Channel from the Reader to the Middleware.
 *
 * `actor` - Local node's globally unique identity.
 *
 * `peer` - Other peer's globally unique identity.
 *
 * `setup_end_barrier` - Barrier signalling the middleware connected to every peer.
 */
pub fn start(
    stream: TcpStream,
    middleware_channel: Sender<EngineEvent>,
    actor: ActorId,
    peer: ActorId,
    setup_end_barrier: Option<Arc<Barrier>>,
) {
    if let Some(barrier) = setup_end_barrier {
        barrier.wait();
    }

    loop {
        match deserialize_from::<_, StreamMsg>(&stream) {
            Ok(StreamMsg::Frame { bytes }) => {
                handle_received_frame(&bytes, &middleware_channel);
            }
            Ok(StreamMsg::Close) => {
                break;
            }
            Ok(StreamMsg::Hello { .. }) => {
                warn!("{}: unexpected handshake message on the stream from {}", actor, peer);
            }
            Err(e) => {
                debug!("{}: closing the stream from {}: {}", actor, peer, e);
                break;
            }
        }
    }
}

/**
 * Decodes one frame and hands it to the middleware. Undecodable frames
 * are dropped; nothing on the receive path is surfaced to the client.
 */
fn handle_received_frame(bytes: &[u8], middleware_channel: &Sender<EngineEvent>) {
    let frame: Frame = match deserialize(bytes) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("dropping an undecodable frame: {}", e);
            return;
        }
    };

    if middleware_channel
        .send(EngineEvent::Frame { frame })
        .is_err()
    {
        debug!("the middleware mailbox is closed, dropping frame");
    }
}
