//! Convergence tests for tandem-engine
//!
//! Two peers and a relay connected by in-memory FIFO queues. Random
//! interleavings of local edits, uploads and deliveries must leave both
//! peers with the same document and the same timeline once every queue has
//! drained.

use std::collections::VecDeque;

use proptest::prelude::*;
use tandem_engine::{
    Batch, BatchId, Block, Document, Edit, Peer, PeerId, RelayedBatch, Relay, Shape,
    StrategyKind, TrackingMode,
};

/// Message from the relay to a peer.
#[derive(Debug)]
enum Downlink {
    Relayed(RelayedBatch),
    Confirmed(BatchId),
}

/// A local change, resolved against the peer's document when it happens.
#[derive(Debug, Clone)]
enum Choice {
    Place { slot: usize, to: [i64; 2] },
    Reshape { slot: usize },
    Nudge { slot: usize, by: [i64; 2] },
    Add,
    Remove { slot: usize },
}

#[derive(Debug, Clone)]
enum Event {
    Edit(PeerId, Choice),
    Upload(PeerId),
    Deliver(PeerId),
}

struct Network {
    relay: Relay,
    peers: [Peer; 2],
    uplinks: [VecDeque<Batch>; 2],
    downlinks: [VecDeque<Downlink>; 2],
    /// Keep absolute and relative position edits on different blocks
    separate_position_kinds: bool,
    next_block: usize,
}

fn slot_of(peer: PeerId) -> usize {
    match peer {
        PeerId::A => 0,
        PeerId::B => 1,
    }
}

impl Network {
    fn new(kind: StrategyKind) -> Self {
        Self {
            relay: Relay::new(),
            peers: [
                Peer::new(PeerId::A, Document::demo(), kind, TrackingMode::Live),
                Peer::new(PeerId::B, Document::demo(), kind, TrackingMode::Live),
            ],
            uplinks: [VecDeque::new(), VecDeque::new()],
            downlinks: [VecDeque::new(), VecDeque::new()],
            separate_position_kinds: kind == StrategyKind::IgnoreConflicting,
            next_block: 0,
        }
    }

    fn peer(&self, id: PeerId) -> &Peer {
        &self.peers[slot_of(id)]
    }

    fn build_edit(&mut self, id: PeerId, choice: &Choice) -> Option<Edit> {
        let doc = self.peer(id).document();
        let ids: Vec<String> = doc.blocks().map(|b| b.id.clone()).collect();
        let pick = |slot: usize| -> Option<String> {
            if ids.is_empty() {
                None
            } else {
                Some(ids[slot % ids.len()].clone())
            }
        };

        match choice {
            Choice::Place { slot, to } => {
                let target = if self.separate_position_kinds {
                    "a".to_string()
                } else {
                    pick(*slot)?
                };
                doc.set_positions([(target, *to)])
            }
            Choice::Reshape { slot } => {
                let target = pick(*slot)?;
                let shape = doc.get(&target)?.shape.toggled();
                doc.set_shapes([(target, shape)])
            }
            Choice::Nudge { slot, by } => {
                let target = if self.separate_position_kinds {
                    "b".to_string()
                } else {
                    pick(*slot)?
                };
                Edit::move_relative([(target, *by)])
            }
            Choice::Add => {
                self.next_block += 1;
                let fresh = format!("{}{}", id, self.next_block);
                let doc = self.peer(id).document();
                doc.add_blocks([Block::new(fresh, Shape::Circle, [0, 0])])
            }
            Choice::Remove { slot } => doc.remove_blocks([pick(*slot)?]),
        }
    }

    fn run(&mut self, event: &Event) {
        match event {
            Event::Edit(id, choice) => {
                if let Some(edit) = self.build_edit(*id, choice) {
                    let peer = &mut self.peers[slot_of(*id)];
                    if let Some(batch) = peer.edit(vec![edit]) {
                        self.uplinks[slot_of(*id)].push_back(batch);
                    }
                }
            }
            Event::Upload(id) => {
                if let Some(batch) = self.uplinks[slot_of(*id)].pop_front() {
                    let batch_id = batch.id.clone();
                    let relayed = self.relay.integrate(batch);
                    self.downlinks[slot_of(id.other())].push_back(Downlink::Relayed(relayed));
                    self.downlinks[slot_of(*id)].push_back(Downlink::Confirmed(batch_id));
                }
            }
            Event::Deliver(id) => {
                if let Some(message) = self.downlinks[slot_of(*id)].pop_front() {
                    let peer = &mut self.peers[slot_of(*id)];
                    match message {
                        Downlink::Relayed(relayed) => {
                            peer.handle_relayed(relayed).expect("reconcile");
                        }
                        Downlink::Confirmed(batch_id) => {
                            peer.confirm(&batch_id).expect("confirm");
                        }
                    }
                }
            }
        }
    }

    fn drain(&mut self) {
        while self.uplinks.iter().any(|q| !q.is_empty())
            || self.downlinks.iter().any(|q| !q.is_empty())
        {
            for id in PeerId::ALL {
                self.run(&Event::Upload(id));
            }
            for id in PeerId::ALL {
                self.run(&Event::Deliver(id));
            }
        }
    }

    fn timeline(&self, id: PeerId) -> Vec<BatchId> {
        self.peer(id).local_log().iter().map(|b| b.id.clone()).collect()
    }

    fn relay_order(&self) -> Vec<BatchId> {
        self.relay.log().iter().map(|r| r.id().clone()).collect()
    }
}

fn arb_choice() -> impl Strategy<Value = Choice> {
    let offset = (-3i64..=3, -3i64..=3).prop_map(|(x, y)| [x, y]);
    prop_oneof![
        (0usize..8, (0i64..10, 0i64..10)).prop_map(|(slot, (x, y))| Choice::Place {
            slot,
            to: [x, y]
        }),
        (0usize..8).prop_map(|slot| Choice::Reshape { slot }),
        (0usize..8, offset).prop_map(|(slot, by)| Choice::Nudge { slot, by }),
        Just(Choice::Add),
        (0usize..8).prop_map(|slot| Choice::Remove { slot }),
    ]
}

fn arb_peer() -> impl Strategy<Value = PeerId> {
    prop_oneof![Just(PeerId::A), Just(PeerId::B)]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        2 => (arb_peer(), arb_choice()).prop_map(|(id, c)| Event::Edit(id, c)),
        1 => arb_peer().prop_map(Event::Upload),
        2 => arb_peer().prop_map(Event::Deliver),
    ]
}

fn assert_converged(network: &Network) {
    let a = network.peer(PeerId::A);
    let b = network.peer(PeerId::B);

    assert_eq!(a.document(), b.document());
    assert!(a.unconfirmed().is_empty());
    assert!(b.unconfirmed().is_empty());
    assert_eq!(network.timeline(PeerId::A), network.relay_order());
    assert_eq!(network.timeline(PeerId::B), network.relay_order());
}

proptest! {
    #[test]
    fn prop_rewind_replay_converges(events in prop::collection::vec(arb_event(), 1..40)) {
        let mut network = Network::new(StrategyKind::RewindReplay);
        for event in &events {
            network.run(event);
        }
        network.drain();

        assert_converged(&network);
    }

    #[test]
    fn prop_ignore_conflicting_converges(events in prop::collection::vec(arb_event(), 1..40)) {
        let mut network = Network::new(StrategyKind::IgnoreConflicting);
        for event in &events {
            network.run(event);
        }
        network.drain();

        assert_converged(&network);
    }
}

#[test]
fn concurrent_absolute_writes_settle_on_relay_order() {
    for kind in [StrategyKind::RewindReplay, StrategyKind::IgnoreConflicting] {
        let mut network = Network::new(kind);

        network.run(&Event::Edit(PeerId::A, Choice::Place { slot: 0, to: [1, 1] }));
        network.run(&Event::Edit(PeerId::B, Choice::Place { slot: 0, to: [9, 9] }));
        network.run(&Event::Upload(PeerId::B));
        network.run(&Event::Upload(PeerId::A));
        network.drain();

        assert_converged(&network);
        // A's write was integrated last
        assert_eq!(
            network.peer(PeerId::B).document().get("a").unwrap().position,
            [1, 1],
            "{kind}"
        );
    }
}
