use std::error::Error;
use std::time::Duration;
use trcb::broadcast::broadcast_trait::CausalBroadcast;
use trcb::configuration::middleware_configuration::Configuration;
use trcb::flood::handle::Flood;
use trcb::flood::structs::actor::ActorId;

/**
 * The flood middleware tags each broadcast with a vector clock timestamp
 * and floods it through the group. A received cast is buffered until its
 * causal dependencies were delivered; whenever a delivery happens the
 * buffer is traversed again so messages that became ready are delivered
 * too. Unacknowledged casts are re-sent periodically, so the middleware
 * works over a lossy transport.
 */
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    //Default configuration; a TOML file can be loaded instead with
    //configuration::middleware_configuration::read_configuration_file
    let configuration = Configuration::default();

    //The node's globally unique identity: host name plus a unique tag
    let actor = ActorId::new("localhost", 0);

    //The local port where the middleware will wait for connections
    let port: usize = 61887;

    //Vec with the addresses and ports where the other peers are waiting
    //for connections
    let group_addresses = vec![format!("localhost:61888")];

    //Creates a new flooding middleware instance; returns once connected
    //to the whole group in both directions
    let mut node = Flood::new(actor, port, group_addresses, configuration);

    //Creating and serializing the message to be sent
    let message = format!("Hello group");
    let serialized_message = message.into_bytes();

    //Broadcasting the message and keeping its assigned timestamp
    let sent_ts = node.broadcast(serialized_message)?;
    println!("broadcast tagged with {:?}", sent_ts);

    //Blocks the caller thread until a message is delivered
    let blocking_delivery = node.recv()?;
    println!(
        "delivered {:?} tagged with {:?}",
        blocking_delivery.payload, blocking_delivery.ts
    );

    //Returns a delivered message without blocking the caller
    let _non_blocking_delivery = node.try_recv();

    //Blocks the caller during a timeout or until a message is delivered
    let _timeout_delivery = node.recv_timeout(Duration::from_secs(1));

    //Once every member observed a timestamp, it becomes stable and is
    //safe to garbage collect downstream
    let stable = node.stable_filter(vec![blocking_delivery.ts.clone()])?;
    println!("stable timestamps: {:?}", stable);

    //Signals and waits for the middleware to terminate
    node.end();

    Ok(())
}
