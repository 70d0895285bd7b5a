//! End-to-end smoke test of the TCP bootstrap: two nodes on loopback,
//! one broadcast, one delivery.
use crossbeam::crossbeam_channel::unbounded;
use std::thread;
use std::time::Duration;
use trcb::broadcast::broadcast_trait::CausalBroadcast;
use trcb::configuration::middleware_configuration::Configuration;
use trcb::flood::handle::Flood;
use trcb::flood::structs::actor::ActorId;

#[test]
fn two_node_tcp_roundtrip() {
    let first = ActorId::new("localhost", 1);
    let second = ActorId::new("localhost", 2);
    let (sink, delivered) = unbounded();

    let peer_thread = thread::spawn(move || {
        let mut node = Flood::new(
            second,
            42612,
            vec![format!("localhost:42611")],
            Configuration::default(),
        );

        let delivery = node
            .recv_timeout(Duration::from_secs(30))
            .expect("the cast never arrived");
        sink.send(delivery).unwrap();

        node.end();
    });

    let mut node = Flood::new(
        first,
        42611,
        vec![format!("localhost:42612")],
        Configuration::default(),
    );

    let assigned = node.broadcast(b"over tcp".to_vec()).unwrap();

    let delivery = delivered
        .recv_timeout(Duration::from_secs(30))
        .expect("the peer reported no delivery");
    assert_eq!(delivery.payload, b"over tcp".to_vec());
    assert_eq!(delivery.ts, assigned);

    peer_thread.join().unwrap();
    node.end();
}
