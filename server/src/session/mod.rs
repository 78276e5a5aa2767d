//! Simulation session: one relay, two peers, four delayed links.
//!
//! Every peer runs in its own task and is only touched under its lock, so
//! local edits and relay messages are applied one at a time. Each task
//! handles its messages in arrival order.

mod peer;
mod relay;

use std::sync::Arc;

use tandem_engine::{
    Batch, Document, Edit, Peer, PeerId, PeerSnapshot, Relay, RelaySnapshot, TrackingMode,
};
use tokio::sync::{mpsc, Mutex};

use crate::config::Config;
use crate::network::{DelayedLink, InFlight, Uplink};

/// A peer and its up-link to the relay.
#[derive(Debug)]
struct PeerSlot {
    peer: Arc<Mutex<Peer>>,
    uplink: DelayedLink<Uplink>,
}

/// Result of one local interaction tick.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Batch sent to the relay, if any edit qualified for synchronization
    pub batch: Option<Batch>,
    /// Every edit applied or recorded locally
    pub edits: Vec<Edit>,
}

/// The up-link of a peer is gone.
#[derive(Debug, thiserror::Error)]
#[error("link from peer {0} to the relay is closed")]
pub struct LinkClosed(pub PeerId);

/// Running relay and peers.
#[derive(Debug)]
pub struct Session {
    a: PeerSlot,
    b: PeerSlot,
    relay: Arc<Mutex<Relay>>,
    in_flight: Arc<InFlight>,
}

impl Session {
    /// Spawn the relay, both peers and their links.
    ///
    /// Must be called from within a tokio runtime. Dropping the session
    /// closes the up-links, which shuts down every task in turn.
    pub fn start(config: &Config) -> Self {
        let in_flight = InFlight::new_shared();
        let relay = Arc::new(Mutex::new(Relay::new()));
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();

        let spawn_peer = |id: PeerId| {
            let settings = config.peer(id);
            let peer = Arc::new(Mutex::new(Peer::new(
                id,
                Document::demo(),
                config.strategy,
                settings.tracking_mode(),
            )));

            let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
            let downlink = DelayedLink::spawn(settings.down_delay, inbox_tx, in_flight.clone());
            tokio::spawn(peer::run(
                peer.clone(),
                inbox_rx,
                config.compact_log,
                in_flight.clone(),
            ));

            let uplink =
                DelayedLink::spawn(settings.up_delay, relay_tx.clone(), in_flight.clone());

            tracing::info!(
                peer = %id,
                up_delay = ?uplink.delay(),
                down_delay = ?downlink.delay(),
                tracking = ?settings.tracking_mode(),
                "Peer started"
            );

            (PeerSlot { peer, uplink }, downlink)
        };

        let (a, down_a) = spawn_peer(PeerId::A);
        let (b, down_b) = spawn_peer(PeerId::B);
        drop(relay_tx);

        tokio::spawn(relay::run(
            relay.clone(),
            relay_rx,
            relay::Downlinks {
                a: down_a,
                b: down_b,
            },
            in_flight.clone(),
        ));

        tracing::info!(strategy = %config.strategy, "Session started");

        Self {
            a,
            b,
            relay,
            in_flight,
        }
    }

    fn slot(&self, id: PeerId) -> &PeerSlot {
        match id {
            PeerId::A => &self.a,
            PeerId::B => &self.b,
        }
    }

    /// Run one local interaction tick on a peer.
    ///
    /// `build` sees the peer's current document and returns the tick's
    /// edits. They are applied and, if any qualifies, sent to the relay as
    /// one batch before the peer is unlocked.
    pub async fn submit<F>(&self, id: PeerId, build: F) -> Result<Submission, LinkClosed>
    where
        F: FnOnce(&Document) -> Vec<Edit>,
    {
        let slot = self.slot(id);
        let mut peer = slot.peer.lock().await;

        let edits = build(peer.document());
        if edits.is_empty() {
            return Ok(Submission {
                batch: None,
                edits,
            });
        }

        let batch = peer.edit(edits.clone());
        match &batch {
            Some(batch) => {
                tracing::debug!(
                    peer = %id,
                    batch_id = %batch.id,
                    edits = batch.len(),
                    "Sending batch"
                );
                let sent = slot.uplink.send(Uplink {
                    from: id,
                    batch: batch.clone(),
                });
                if !sent {
                    return Err(LinkClosed(id));
                }
            }
            None => tracing::debug!(peer = %id, "Nothing to synchronize"),
        }

        Ok(Submission { batch, edits })
    }

    pub async fn set_tracking_mode(&self, id: PeerId, mode: TrackingMode) {
        self.slot(id).peer.lock().await.set_tracking_mode(mode);
        tracing::info!(peer = %id, tracking = ?mode, "Tracking mode changed");
    }

    pub async fn peer_snapshot(&self, id: PeerId) -> PeerSnapshot {
        self.slot(id).peer.lock().await.snapshot()
    }

    pub async fn relay_snapshot(&self) -> RelaySnapshot {
        self.relay.lock().await.snapshot()
    }

    /// Wait until every message sent so far has been delivered and handled.
    pub async fn settled(&self) {
        self.in_flight.settled().await;
    }
}
