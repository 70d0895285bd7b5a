use crate::flood::structs::actor::ActorId;
use crate::flood::structs::messages::StreamMsg;
use bincode::{deserialize_from, serialize_into};
use std::net::TcpStream;

/**
 * Introduces the local actor on a fresh stream.
 *
 * # Arguments
 *
 * `stream` - TCP stream to write the hello message into.
 *
 * `actor` - Local node's globally unique identity.
 */
pub fn send_hello(mut stream: &TcpStream, actor: &ActorId) {
    serialize_into::<_, StreamMsg>(
        &mut stream,
        &StreamMsg::Hello {
            actor: actor.clone(),
        },
    )
    .expect("ERROR: Couldn't write the hello message to the peer socket");
}

/**
 * Reads the peer's introduction from a fresh stream.
 *
 * # Arguments
 *
 * `stream` - TCP stream to read the hello message from.
 */
pub fn read_hello(stream: &TcpStream) -> ActorId {
    match deserialize_from::<_, StreamMsg>(stream) {
        Ok(StreamMsg::Hello { actor }) => actor,
        Ok(_) => {
            panic!("ERROR: Unexpected message type during the handshake");
        }
        Err(e) => {
            panic!("ERROR: Occurred when reading the hello message: {}", e);
        }
    }
}
