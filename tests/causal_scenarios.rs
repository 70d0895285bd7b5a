//! Scenario tests driving several engines over a deterministic,
//! single-threaded in-memory mesh: every frame an engine sends is queued
//! on a shared wire and routed by the test, so loss, reordering and
//! duplication are all under test control.
use crossbeam::crossbeam_channel::unbounded;
use crossbeam::{Receiver, Sender};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use trcb::causality_checker::causality_checker::check_causal_delivery;
use trcb::causality_checker::causality_checker_structs::{CausalityChecker, DeliveryRecord};
use trcb::configuration::middleware_configuration::Configuration;
use trcb::flood::communication::transport::Transport;
use trcb::flood::middleware::engine::Engine;
use trcb::flood::structs::actor::ActorId;
use trcb::flood::structs::messages::{DeliveryHandler, Frame, HandlerError};
use trcb::flood::structs::vector_clock::VClock;

/**
 * Transport pushing every frame onto the shared wire.
 */
#[derive(Clone)]
struct MeshTransport {
    wire: Rc<RefCell<VecDeque<(ActorId, Frame)>>>,
}

impl Transport for MeshTransport {
    fn send(&self, peer: &ActorId, frame: &Frame) {
        self.wire
            .borrow_mut()
            .push_back((peer.clone(), frame.clone()));
    }
}

struct Mesh {
    engines: BTreeMap<ActorId, Engine<MeshTransport>>,
    wire: Rc<RefCell<VecDeque<(ActorId, Frame)>>>,
    deliveries: Receiver<(ActorId, VClock, Vec<u8>)>,
}

fn actor(tag: u64) -> ActorId {
    ActorId::new("test", tag)
}

fn ts(entries: &[(u64, u64)]) -> VClock {
    let mut vc = VClock::fresh();
    for (tag, counter) in entries {
        for _ in 0..*counter {
            vc.increment(&actor(*tag));
        }
    }
    vc
}

fn recording_handler(
    node: ActorId,
    sink: Sender<(ActorId, VClock, Vec<u8>)>,
) -> DeliveryHandler {
    Box::new(move |ts, payload| {
        sink.send((node.clone(), ts.clone(), payload.to_vec()))
            .map_err(|_| HandlerError::new("the delivery sink is closed"))
    })
}

fn mesh(tags: &[u64], configuration: Configuration) -> Mesh {
    let configuration = Arc::new(configuration);
    let wire = Rc::new(RefCell::new(VecDeque::new()));
    let (sink, deliveries) = unbounded();
    let group: BTreeSet<ActorId> = tags.iter().map(|tag| actor(*tag)).collect();
    let mut engines = BTreeMap::new();

    for tag in tags {
        let node = actor(*tag);
        let mut members = group.clone();
        members.remove(&node);

        let transport = MeshTransport {
            wire: Rc::clone(&wire),
        };
        let engine = Engine::new(
            node.clone(),
            members,
            transport,
            recording_handler(node.clone(), sink.clone()),
            Arc::clone(&configuration),
        );
        engines.insert(node, engine);
    }

    Mesh {
        engines,
        wire,
        deliveries,
    }
}

impl Mesh {
    fn broadcast(&mut self, tag: u64, payload: &[u8]) -> VClock {
        self.engines
            .get_mut(&actor(tag))
            .unwrap()
            .broadcast(payload.to_vec())
    }

    fn take_wire(&mut self) -> Vec<(ActorId, Frame)> {
        self.wire.borrow_mut().drain(..).collect()
    }

    fn route_one(&mut self, dest: &ActorId, frame: Frame) {
        if let Some(engine) = self.engines.get_mut(dest) {
            engine.on_frame(frame);
        }
    }

    /**
     * Routes frames until the wire goes silent.
     */
    fn pump(&mut self) {
        loop {
            let next = self.wire.borrow_mut().pop_front();

            match next {
                Some((dest, frame)) => self.route_one(&dest, frame),
                None => break,
            }
        }
    }

    /**
     * Like pump, but returns every routed frame for later replay.
     */
    fn pump_recording(&mut self) -> Vec<(ActorId, Frame)> {
        let mut routed = Vec::new();

        loop {
            let next = self.wire.borrow_mut().pop_front();

            match next {
                Some((dest, frame)) => {
                    routed.push((dest.clone(), frame.clone()));
                    self.route_one(&dest, frame);
                }
                None => break,
            }
        }

        routed
    }

    fn delivered(&self) -> Vec<(ActorId, VClock, Vec<u8>)> {
        self.deliveries.try_iter().collect()
    }

    fn all_retransmit_queues_empty(&self) -> bool {
        self.engines
            .values()
            .all(|engine| engine.retransmit_len() == 0)
    }
}

fn log_of(delivered: &[(ActorId, VClock, Vec<u8>)], node: u64) -> Vec<(VClock, Vec<u8>)> {
    delivered
        .iter()
        .filter(|(at, _, _)| *at == actor(node))
        .map(|(_, ts, payload)| (ts.clone(), payload.clone()))
        .collect()
}

#[test]
fn a_cast_reaches_the_peer_and_acks_clear_the_sender() {
    let mut mesh = mesh(&[0, 1], Configuration::default());

    let assigned = mesh.broadcast(0, b"x");
    mesh.pump();

    let delivered = mesh.delivered();
    assert_eq!(assigned, ts(&[(0, 1)]));
    // The peer delivered exactly ("x", {A:1}); the sender delivered
    // nothing since local delivery is off.
    assert_eq!(delivered, vec![(actor(1), ts(&[(0, 1)]), b"x".to_vec())]);
    assert!(mesh.all_retransmit_queues_empty());
}

#[test]
fn a_dependent_cast_waits_for_its_dependency() {
    let mut mesh = mesh(&[0, 1, 2], Configuration::default());
    let mut held = Vec::new();

    // "x" reaches node 1 but every copy destined to node 2 is held back.
    mesh.broadcast(0, b"x");
    loop {
        let traffic = mesh.take_wire();
        if traffic.is_empty() {
            break;
        }
        for (dest, frame) in traffic {
            if dest == actor(2) {
                held.push(frame);
            } else {
                mesh.route_one(&dest, frame);
            }
        }
    }

    // Node 1 reacts to "x" with "y", which reaches node 2 first.
    mesh.broadcast(1, b"y");
    mesh.pump();

    assert!(log_of(&mesh.delivered(), 2).is_empty());
    assert_eq!(mesh.engines[&actor(2)].pending_len(), 1);

    // Releasing the held copies of "x" delivers it and drains "y" in the
    // same admission sequence.
    for frame in held {
        mesh.route_one(&actor(2), frame);
    }
    mesh.pump();

    assert_eq!(
        log_of(&mesh.delivered(), 2),
        vec![
            (ts(&[(0, 1)]), b"x".to_vec()),
            (ts(&[(0, 1), (1, 1)]), b"y".to_vec()),
        ]
    );
    assert_eq!(mesh.engines[&actor(2)].pending_len(), 0);
    assert!(mesh.all_retransmit_queues_empty());
}

#[test]
fn concurrent_casts_are_delivered_once_in_some_order() {
    let mut mesh = mesh(&[0, 1, 2], Configuration::default());

    mesh.broadcast(0, b"x");
    mesh.broadcast(1, b"y");
    mesh.pump();

    let delivered = mesh.delivered();
    let at_third = log_of(&delivered, 2);

    assert_eq!(at_third.len(), 2);
    assert!(at_third.contains(&(ts(&[(0, 1)]), b"x".to_vec())));
    assert!(at_third.contains(&(ts(&[(1, 1)]), b"y".to_vec())));
    assert_eq!(mesh.engines[&actor(2)].vv(), &ts(&[(0, 1), (1, 1)]));

    // Every node delivered each foreign cast exactly once.
    assert_eq!(log_of(&delivered, 0), vec![(ts(&[(1, 1)]), b"y".to_vec())]);
    assert_eq!(log_of(&delivered, 1), vec![(ts(&[(0, 1)]), b"x".to_vec())]);

    // The recorded logs respect the causal order.
    let origin_of = |payload: &Vec<u8>| {
        if payload == &b"x".to_vec() {
            actor(0)
        } else {
            actor(1)
        }
    };
    let logs: Vec<Vec<DeliveryRecord>> = (0..3)
        .map(|tag| {
            log_of(&delivered, tag)
                .into_iter()
                .map(|(ts, payload)| DeliveryRecord::new(origin_of(&payload), ts))
                .collect()
        })
        .collect();

    match check_causal_delivery(&logs) {
        CausalityChecker::Ok(_) => {}
        CausalityChecker::Error(e) => panic!("causal violation: {}", e),
    }
}

#[test]
fn flooding_echoes_are_absorbed_and_fully_acked() {
    let mut mesh = mesh(&[0, 1, 2], Configuration::default());

    mesh.broadcast(0, b"x");
    mesh.pump();

    let delivered = mesh.delivered();
    // Each peer delivered the cast exactly once despite receiving it
    // both directly and through the other peer's relay.
    assert_eq!(log_of(&delivered, 0).len(), 0);
    assert_eq!(log_of(&delivered, 1), vec![(ts(&[(0, 1)]), b"x".to_vec())]);
    assert_eq!(log_of(&delivered, 2), vec![(ts(&[(0, 1)]), b"x".to_vec())]);

    for tag in &[0, 1, 2] {
        assert_eq!(mesh.engines[&actor(*tag)].vv(), &ts(&[(0, 1)]));
    }

    // Relay entries were acked too, including for the duplicate copies.
    assert!(mesh.all_retransmit_queues_empty());
}

#[test]
fn replaying_the_inbound_stream_changes_nothing() {
    let mut mesh = mesh(&[0, 1, 2], Configuration::default());

    mesh.broadcast(0, b"x");
    mesh.broadcast(1, b"y");
    let routed = mesh.pump_recording();
    let delivered_before = mesh.delivered();

    // Feed every node its whole inbound stream a second time.
    for (dest, frame) in routed {
        mesh.route_one(&dest, frame);
    }
    mesh.take_wire();

    assert!(mesh.delivered().is_empty());
    for tag in &[0, 1, 2] {
        assert_eq!(mesh.engines[&actor(*tag)].vv(), &ts(&[(0, 1), (1, 1)]));
    }
    assert_eq!(delivered_before.len(), 4);
}

#[test]
fn a_dropped_frame_is_recovered_by_the_resend_scan() {
    let mut configuration = Configuration::default();
    configuration.resend_after_ms = 0;
    let mut mesh = mesh(&[0, 1], configuration);

    mesh.broadcast(0, b"x");
    // The first copy of every frame is lost.
    mesh.take_wire();
    assert!(mesh.delivered().is_empty());

    // The scan re-sends to the peer that never acknowledged.
    mesh.engines.get_mut(&actor(0)).unwrap().tick_resend();
    mesh.pump();

    assert_eq!(
        mesh.delivered(),
        vec![(actor(1), ts(&[(0, 1)]), b"x".to_vec())]
    );
    assert!(mesh.all_retransmit_queues_empty());
}

#[test]
fn timestamps_observed_by_the_whole_group_become_stable() {
    let mut mesh = mesh(&[0, 1, 2], Configuration::default());

    // A causal chain of casts followed by one more round from the first
    // two nodes, so everyone's latest observation from every peer covers
    // the early timestamps.
    mesh.broadcast(0, b"x1");
    mesh.pump();
    mesh.broadcast(1, b"y1");
    mesh.pump();
    mesh.broadcast(2, b"z1");
    mesh.pump();
    mesh.broadcast(0, b"x2");
    mesh.pump();
    mesh.broadcast(1, b"y2");
    mesh.pump();

    let candidates = vec![ts(&[(0, 1)]), ts(&[(0, 1), (1, 1)])];

    for tag in &[0, 1, 2] {
        let stable = mesh.engines[&actor(*tag)].stable_filter(candidates.clone());
        assert_eq!(stable, candidates, "at node {}", tag);
    }

    // A timestamp nobody created is not stable.
    let unseen = ts(&[(0, 9)]);
    assert_eq!(
        mesh.engines[&actor(0)].stable_filter(vec![unseen]),
        Vec::<VClock>::new()
    );
}

#[test]
fn a_departed_member_stops_holding_back_stability() {
    let mut mesh = mesh(&[0, 1, 2], Configuration::default());

    // Node 2 never acknowledges nor reports anything.
    mesh.broadcast(0, b"x");
    let traffic = mesh.take_wire();
    for (dest, frame) in traffic {
        if dest != actor(2) {
            mesh.route_one(&dest, frame);
        }
    }
    mesh.pump_ignoring(&actor(2));

    assert_eq!(
        mesh.engines[&actor(1)].stable_filter(vec![ts(&[(0, 1)])]),
        Vec::<VClock>::new()
    );

    // Node 2 departs: its stability row is dropped at the survivors.
    let survivors: BTreeSet<ActorId> = vec![actor(0), actor(1)].into_iter().collect();
    mesh.engines
        .get_mut(&actor(0))
        .unwrap()
        .on_membership(survivors.clone());
    mesh.engines
        .get_mut(&actor(1))
        .unwrap()
        .on_membership(survivors);

    assert_eq!(
        mesh.engines[&actor(1)].stable_filter(vec![ts(&[(0, 1)])]),
        vec![ts(&[(0, 1)])]
    );
}

impl Mesh {
    /**
     * Pumps the wire, dropping every frame destined to one node.
     */
    fn pump_ignoring(&mut self, ignored: &ActorId) {
        loop {
            let next = self.wire.borrow_mut().pop_front();

            match next {
                Some((dest, frame)) => {
                    if dest != *ignored {
                        self.route_one(&dest, frame);
                    }
                }
                None => break,
            }
        }
    }
}
