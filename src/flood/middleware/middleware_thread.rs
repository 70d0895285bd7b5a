use crate::configuration::middleware_configuration::Configuration;
use crate::flood::communication::transport::Transport;
use crate::flood::middleware::engine::Engine;
use crate::flood::structs::actor::ActorId;
use crate::flood::structs::messages::{DeliveryHandler, EngineEvent, EngineNotice, HandlerError};
use crossbeam::{Receiver, Sender};
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

/**
 * Starts the Middleware thread that receives messages from the Client to
 * be broadcast, receives frames from other peers and handles the delivery
 * of messages to the Client. Events are processed one at a time in
 * arrival order; the engine state is never touched from anywhere else.
 *
 * # Arguments
 *
 * `actor` - Local node's globally unique identity.
 *
 * `members` - Initial member set.
 *
 * `receive_channel` - Channel where the middleware will receive events from the Client, Peers and Timer.
 *
 * `client` - Channel where the middleware will send delivered messages to the Client.
 *
 * `transport` - Outgoing seam to the peer service.
 *
 * `configuration` - Middleware's configuration file.
 */
pub fn start<T: Transport>(
    actor: ActorId,
    members: BTreeSet<ActorId>,
    receive_channel: Receiver<EngineEvent>,
    client: Sender<EngineNotice>,
    transport: T,
    configuration: Arc<Configuration>,
) {
    let handler = client_channel_handler(client.clone());
    let mut engine = Engine::new(actor, members, transport, handler, configuration);

    loop {
        match receive_channel.recv() {
            Ok(EngineEvent::Broadcast { payload, reply }) => {
                let ts = engine.broadcast(payload);

                if reply.send(ts).is_err() {
                    debug!("the broadcast caller went away before the timestamp reply");
                }
            }
            Ok(EngineEvent::SetHandler { handler }) => {
                engine.set_delivery_handler(handler);
            }
            Ok(EngineEvent::StableFilter { clocks, reply }) => {
                let stable = engine.stable_filter(clocks);

                if reply.send(stable).is_err() {
                    debug!("the stable_filter caller went away before the reply");
                }
            }
            Ok(EngineEvent::Frame { frame }) => {
                engine.on_frame(frame);
            }
            Ok(EngineEvent::Membership { members }) => {
                engine.on_membership(members);
            }
            Ok(EngineEvent::Tick) => {
                engine.tick_resend();
            }
            Ok(EngineEvent::End) => {
                handle_finished_shutdown(&client);
                break;
            }
            Err(_) => {
                break;
            }
        }
    }
}

/**
 * Builds the default delivery handler, which forwards every delivered
 * message to the client channel.
 */
pub fn client_channel_handler(client: Sender<EngineNotice>) -> DeliveryHandler {
    Box::new(move |ts, payload| {
        client
            .send(EngineNotice::Deliver {
                ts: ts.clone(),
                payload: payload.to_vec(),
            })
            .map_err(|_| HandlerError::new("the client delivery channel is closed"))
    })
}

/**
 * Confirms the shutdown to the client.
 */
fn handle_finished_shutdown(client: &Sender<EngineNotice>) {
    if client.send(EngineNotice::Stopped).is_err() {
        debug!("the client went away before the shutdown confirmation");
    }
}
