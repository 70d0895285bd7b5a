use crate::configuration::middleware_configuration::Configuration;
use crate::flood::communication::{handshake, reader};
use crate::flood::structs::actor::ActorId;
use crate::flood::structs::messages::EngineEvent;
use crossbeam::Sender;
use log::warn;
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Barrier};
use std::thread;

/**
 * Starts the Acceptor thread that waits for connections from other peers
 * and spawns a Reader for each. This function is called on a thread as to
 * not block the caller. The setup barrier is released through the Readers
 * once the whole group has connected.
 *
 * # Arguments
 *
 * `actor` - Local node's globally unique identity.
 *
 * `local_port` - Port where the middleware will be listening for connections.
 *
 * `group_size` - Number of peers expected to connect during setup.
 *
 * `middleware_channel` - Channel from the readers to the middleware.
 *
 * `configuration` - Middleware's configuration file.
 *
 * `setup_end_barrier` - Barrier signalling the middleware connected to every peer.
 */
pub fn start(
    actor: ActorId,
    local_port: usize,
    group_size: usize,
    middleware_channel: Sender<EngineEvent>,
    configuration: Arc<Configuration>,
    setup_end_barrier: Arc<Barrier>,
) {
    //Binding the TCP listener and setting blocking behaviour
    let server = TcpListener::bind(format!("0.0.0.0:{}", local_port))
        .expect("ERROR: Failed to bind the listening socket");

    server
        .set_nonblocking(false)
        .expect("ERROR: Failed to set stream blocking mode");

    let mut connected_peers = 0;

    loop {
        match server.accept() {
            Ok((stream, _)) => {
                connected_peers += 1;

                //Late connections are past the setup rendezvous
                let barrier = if connected_peers <= group_size {
                    Some(Arc::clone(&setup_end_barrier))
                } else {
                    None
                };

                handle_new_connection(
                    &actor,
                    stream,
                    &middleware_channel,
                    &configuration,
                    barrier,
                );
            }
            Err(e) => {
                warn!("{}: the acceptor is closing: {}", actor, e);
                break;
            }
        }
    }
}

/**
 * Handles a new peer connection.
 */
fn handle_new_connection(
    actor: &ActorId,
    stream: TcpStream,
    middleware_channel: &Sender<EngineEvent>,
    configuration: &Arc<Configuration>,
    setup_end_barrier: Option<Arc<Barrier>>,
) {
    let peer = handshake::read_hello(&stream);
    handshake::send_hello(&stream, actor);

    let reader_channel = middleware_channel.clone();
    let reader_actor = actor.clone();
    let reader_peer = peer.clone();

    let thread_name = format!("stream_reader_{}_{}", actor, peer);
    let builder = thread::Builder::new()
        .name(thread_name)
        .stack_size(configuration.thread_stack_size);

    builder
        .spawn(move || {
            reader::start(
                stream,
                reader_channel,
                reader_actor,
                reader_peer,
                setup_end_barrier,
            );
        })
        .unwrap();
}
