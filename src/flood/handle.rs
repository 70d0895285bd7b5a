use crate::broadcast::broadcast_trait::{BroadcastError, CausalBroadcast, Delivery};
use crate::configuration::middleware_configuration::Configuration;
use crate::flood::communication::transport::PeerLinks;
use crate::flood::communication::{acceptor, connector};
use crate::flood::middleware::{middleware_thread, timer};
use crate::flood::structs::actor::ActorId;
use crate::flood::structs::messages::{DeliveryHandler, EngineEvent, EngineNotice};
use crate::flood::structs::vector_clock::VClock;
use crossbeam::crossbeam_channel::unbounded;
use crossbeam::{Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/**
 * Client side of the flooding causal broadcast middleware service.
 * Maintains the channels to send requests to the middleware thread and
 * to read delivered messages back.
 */
pub struct Flood {
    //Receiver end of the channel between the client and the middleware thread
    receive_channel: Receiver<EngineNotice>,
    //Sender end of the channel between the client and the middleware thread
    middleware_channel: Sender<EngineEvent>,
    //Local node's identity
    actor: ActorId,
}

impl Flood {
    /**
     * The local node's identity.
     */
    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    /**
     * Unwraps a delivery notice from the middleware.
     */
    fn handle_notice(&self, notice: EngineNotice) -> Delivery {
        match notice {
            EngineNotice::Deliver { ts, payload } => Delivery { ts, payload },
            EngineNotice::Stopped => {
                panic!("ERROR: Received a shutdown notice when it shouldn't!");
            }
        }
    }

    /**
     * Starting method of the middleware service. It creates and
     * initializes the necessary variables, communication channels and
     * threads, and only returns once a connection exists to every peer
     * in both directions.
     *
     * # Arguments
     *
     * `actor` - Local node's globally unique identity.
     *
     * `local_port` - Port where the middleware will be listening for connections.
     *
     * `peer_addresses` - Addresses the middleware will connect to.
     *
     * `configuration` - Middleware's configuration file.
     */
    fn start_service(
        actor: ActorId,
        local_port: usize,
        peer_addresses: Vec<String>,
        configuration: Arc<Configuration>,
    ) -> (Sender<EngineEvent>, Receiver<EngineNotice>) {
        //Creating the channel where the middleware writes to
        //and the client reads from
        let (client_send_channel, client_receive_channel) = unbounded::<EngineNotice>();

        //Creating the channel where the main middleware thread reads from
        //and the reader threads, the timer and the client write to
        let (mailbox_send_channel, mailbox_receive_channel) = unbounded::<EngineEvent>();

        let acceptor_mailbox = mailbox_send_channel.clone();
        let acceptor_configuration = Arc::clone(&configuration);
        let acceptor_actor = actor.clone();
        let group_size = peer_addresses.len();

        let setup_end_barrier = Arc::new(Barrier::new(group_size + 1));
        let setup_end_barrier_clone = Arc::clone(&setup_end_barrier);

        //Spawning the acceptor thread
        let thread_name = format!("acceptor_thread_{}", actor);
        let builder = thread::Builder::new()
            .name(thread_name)
            .stack_size(configuration.thread_stack_size);

        builder
            .spawn(move || {
                acceptor::start(
                    acceptor_actor,
                    local_port,
                    group_size,
                    acceptor_mailbox,
                    acceptor_configuration,
                    setup_end_barrier_clone,
                );
            })
            .unwrap();

        //Connecting to the peers' ports and learning their identities
        let links = connector::start(&actor, &peer_addresses, &configuration);
        let members: BTreeSet<ActorId> = links.keys().cloned().collect();
        let transport = PeerLinks::new(links);

        //Spawning the main middleware thread
        let thread_name = format!("middleware_thread_{}", actor);
        let builder = thread::Builder::new()
            .name(thread_name)
            .stack_size(configuration.middleware_thread_stack_size);

        let middleware_actor = actor.clone();
        let middleware_configuration = Arc::clone(&configuration);

        builder
            .spawn(move || {
                middleware_thread::start(
                    middleware_actor,
                    members,
                    mailbox_receive_channel,
                    client_send_channel,
                    transport,
                    middleware_configuration,
                );
            })
            .unwrap();

        //Spawning the retransmit timer thread
        let thread_name = format!("resend_timer_{}", actor);
        let builder = thread::Builder::new()
            .name(thread_name)
            .stack_size(configuration.thread_stack_size);

        let timer_mailbox = mailbox_send_channel.clone();
        let timer_period = configuration.get_check_resend_interval();

        builder
            .spawn(move || {
                timer::start(timer_mailbox, timer_period);
            })
            .unwrap();

        setup_end_barrier.wait();
        //Return the channels the client writes and reads from to the middleware
        (mailbox_send_channel, client_receive_channel)
    }
}

impl CausalBroadcast for Flood {
    /**
     * Creates a new middleware instance. This function only returns after
     * the middleware has a connection to every other peer in both
     * directions.
     *
     * # Arguments
     *
     * `actor` - Local node's globally unique identity.
     *
     * `local_port` - Port where the middleware will be listening for connections.
     *
     * `peer_addresses` - Addresses the middleware will connect to.
     *
     * `configuration` - Middleware's configuration file.
     */
    fn new(
        actor: ActorId,
        local_port: usize,
        peer_addresses: Vec<String>,
        configuration: Configuration,
    ) -> Flood {
        let configuration = Arc::new(configuration);

        let (middleware_channel, receive_channel) = Flood::start_service(
            actor.clone(),
            local_port,
            peer_addresses,
            configuration,
        );

        Flood {
            receive_channel,
            middleware_channel,
            actor,
        }
    }

    /**
     * Broadcasts a message to every peer in the group and returns the
     * timestamp assigned to it.
     *
     * # Arguments
     *
     * `payload` - Serialized message to be broadcast
     */
    fn broadcast(&mut self, payload: Vec<u8>) -> Result<VClock, BroadcastError> {
        let (reply_send, reply_receive) = unbounded::<VClock>();

        self.middleware_channel
            .send(EngineEvent::Broadcast {
                payload,
                reply: reply_send,
            })
            .map_err(|_| BroadcastError::EngineDown)?;

        reply_receive.recv().map_err(|_| BroadcastError::NoReply)
    }

    /**
     * Replaces the delivery handler. Deliveries stop flowing to the
     * `recv` channel once a handler is installed.
     *
     * # Arguments
     *
     * `handler` - Callback receiving the timestamp and payload.
     */
    fn set_delivery_handler(&mut self, handler: DeliveryHandler) -> Result<(), BroadcastError> {
        self.middleware_channel
            .send(EngineEvent::SetHandler { handler })
            .map_err(|_| BroadcastError::EngineDown)
    }

    /**
     * Filters the given timestamps down to those known to have been
     * observed by every current member.
     *
     * # Arguments
     *
     * `clocks` - Candidate timestamps.
     */
    fn stable_filter(&mut self, clocks: Vec<VClock>) -> Result<Vec<VClock>, BroadcastError> {
        let (reply_send, reply_receive) = unbounded::<Vec<VClock>>();

        self.middleware_channel
            .send(EngineEvent::StableFilter {
                clocks,
                reply: reply_send,
            })
            .map_err(|_| BroadcastError::EngineDown)?;

        reply_receive.recv().map_err(|_| BroadcastError::NoReply)
    }

    /**
     * Replaces the member set.
     *
     * # Arguments
     *
     * `members` - The new membership.
     */
    fn update_membership(&mut self, members: BTreeSet<ActorId>) -> Result<(), BroadcastError> {
        self.middleware_channel
            .send(EngineEvent::Membership { members })
            .map_err(|_| BroadcastError::EngineDown)
    }

    /**
     * Delivers a message from the middleware. Blocks the calling thread
     * until a message is delivered or the channel to the middleware is
     * disconnected.
     */
    fn recv(&mut self) -> Result<Delivery, RecvError> {
        let notice = self.receive_channel.recv()?;

        Ok(self.handle_notice(notice))
    }

    /**
     * Attempts to deliver a message from the middleware without blocking
     * the caller thread. Either a message is immediately delivered from
     * the channel or an error is returned if the channel is empty.
     */
    fn try_recv(&mut self) -> Result<Delivery, TryRecvError> {
        let notice = self.receive_channel.try_recv()?;

        Ok(self.handle_notice(notice))
    }

    /**
     * Waits for a message to be delivered from the middleware for a
     * limited time. If there are no messages until the timeout ends or
     * the channel becomes disconnected, an error is returned.
     *
     * # Arguments
     *
     * `duration` - Timeout duration
     */
    fn recv_timeout(&mut self, duration: Duration) -> Result<Delivery, RecvTimeoutError> {
        let notice = self.receive_channel.recv_timeout(duration)?;

        Ok(self.handle_notice(notice))
    }

    /**
     * Signals and waits for the middleware to terminate.
     */
    fn end(&self) {
        if self.middleware_channel.send(EngineEvent::End).is_err() {
            return;
        }

        loop {
            match self.receive_channel.recv() {
                Ok(EngineNotice::Stopped) => {
                    break;
                }
                Ok(_) => {}
                Err(_) => {
                    break;
                }
            }
        }
    }
}
