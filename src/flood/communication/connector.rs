use crate::configuration::middleware_configuration::Configuration;
use crate::flood::communication::{handshake, sender};
use crate::flood::structs::actor::ActorId;
use crossbeam::crossbeam_channel::unbounded;
use crossbeam::Sender;
use log::warn;
use std::collections::HashMap;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/**
 * Connects to every peer in the group, performs the handshake and spawns
 * one Sender thread per peer. Ends only when connected to all of them.
 * Returns the outbound channels keyed by the peers' identities.
 *
 * # Arguments
 *
 * `actor` - Local node's globally unique identity.
 *
 * `peer_addresses` - Addresses the middleware will connect to.
 *
 * `configuration` - Middleware's configuration file.
 */
pub fn start(
    actor: &ActorId,
    peer_addresses: &Vec<String>,
    configuration: &Arc<Configuration>,
) -> HashMap<ActorId, Sender<Arc<Vec<u8>>>> {
    let mut links = HashMap::new();
    let mut connection_threads = Vec::new();

    //The connections to the peers will be concurrent
    for address in peer_addresses {
        let temp_actor = actor.clone();
        let temp_address = address.clone();
        let temp_configuration = Arc::clone(configuration);

        connection_threads.push(thread::spawn(move || {
            connect_to_single_peer(temp_actor, temp_address, temp_configuration)
        }));
    }

    for connection_thread in connection_threads {
        match connection_thread.join() {
            Ok((peer, link)) => {
                links.insert(peer, link);
            }
            Err(_) => {
                warn!("there were problems when joining a peer connection thread");
            }
        }
    }

    links
}

/**
 * Connects to a single peer. The call to this will only end when the
 * connection to the peer is successful.
 */
fn connect_to_single_peer(
    actor: ActorId,
    peer_address: String,
    configuration: Arc<Configuration>,
) -> (ActorId, Sender<Arc<Vec<u8>>>) {
    loop {
        match TcpStream::connect(&peer_address) {
            Ok(stream) => {
                stream
                    .set_nonblocking(false)
                    .expect("ERROR: Failed to set stream blocking mode");

                handshake::send_hello(&stream, &actor);
                let peer = handshake::read_hello(&stream);

                let (link_send, link_recv) = unbounded::<Arc<Vec<u8>>>();

                let thread_name = format!("sender_thread_{}_{}", actor, peer);
                let builder = thread::Builder::new()
                    .name(thread_name)
                    .stack_size(configuration.thread_stack_size);

                let sender_actor = actor.clone();
                let sender_peer = peer.clone();

                builder
                    .spawn(move || {
                        sender::start(stream, link_recv, sender_actor, sender_peer);
                    })
                    .unwrap();

                return (peer, link_send);
            }
            Err(_) => {
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
}
