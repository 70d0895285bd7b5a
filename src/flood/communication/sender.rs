use crate::flood::structs::actor::ActorId;
use crate::flood::structs::messages::StreamMsg;
use bincode::serialize_into;
use crossbeam::Receiver;
use log::{debug, warn};
use std::io::{BufWriter, Write};
use std::net::TcpStream;
use std::sync::Arc;

/**
 * Starts a Sender thread that writes outbound frames to a peer stream.
 * Ends when the middleware goes away, closing the stream politely, or
 * when the peer drops the connection.
 *
 * # Arguments
 *
 * `stream` - TCP stream between the peers.
 *
 * `middleware_channel` - Channel from the Middleware to the Sender.
 *
 * `actor` - Local node's globally unique identity.
 *
 * `peer` - Other peer's globally unique identity.
 */
pub fn start(
    stream: TcpStream,
    middleware_channel: Receiver<Arc<Vec<u8>>>,
    actor: ActorId,
    peer: ActorId,
) {
    let mut stream = BufWriter::new(stream);

    loop {
        match middleware_channel.recv() {
            Ok(bytes) => {
                let stream_msg = StreamMsg::Frame {
                    bytes: (*bytes).clone(),
                };

                //Sending the message type and frame payload as a single array of bytes
                match serialize_into::<_, StreamMsg>(&mut stream, &stream_msg) {
                    Ok(_) => {
                        if let Err(e) = stream.flush() {
                            warn!("{}: the stream to {} was closed: {}", actor, peer, e);
                            break;
                        }
                    }
                    Err(_) => {
                        warn!("{}: the stream to {} was closed", actor, peer);
                        break;
                    }
                }
            }
            Err(_) => {
                //Middleware went away: close the stream politely
                let stream_msg = StreamMsg::Close;

                if serialize_into::<_, StreamMsg>(&mut stream, &stream_msg).is_ok() {
                    let _ = stream.flush();
                }

                debug!("{}: closing the stream to {}", actor, peer);
                break;
            }
        }
    }
}
