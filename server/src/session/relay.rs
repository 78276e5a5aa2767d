//! Relay task: orders uploads and fans them out.

use std::sync::Arc;

use tandem_engine::{PeerId, Relay};
use tokio::sync::{mpsc, Mutex};

use crate::network::{DelayedLink, Downlink, InFlight, Uplink};

/// The relay's down-links, one per peer.
#[derive(Debug)]
pub struct Downlinks {
    pub a: DelayedLink<Downlink>,
    pub b: DelayedLink<Downlink>,
}

impl Downlinks {
    fn to(&self, id: PeerId) -> &DelayedLink<Downlink> {
        match id {
            PeerId::A => &self.a,
            PeerId::B => &self.b,
        }
    }

    fn send(&self, id: PeerId, message: Downlink) {
        if !self.to(id).send(message) {
            tracing::warn!(peer = %id, "Down-link closed, message dropped");
        }
    }
}

/// Integrate every upload in arrival order.
///
/// The batch goes to the other peer first, then back to its origin as a
/// confirmation.
pub async fn run(
    relay: Arc<Mutex<Relay>>,
    mut inbox: mpsc::UnboundedReceiver<Uplink>,
    downlinks: Downlinks,
    in_flight: Arc<InFlight>,
) {
    while let Some(Uplink { from, batch }) = inbox.recv().await {
        let batch_id = batch.id.clone();
        let relayed = relay.lock().await.integrate(batch);

        tracing::debug!(
            peer = %from,
            batch_id = %batch_id,
            parent_id = ?relayed.parent_id,
            edits = relayed.batch.len(),
            "Relay integrated batch"
        );

        downlinks.send(from.other(), Downlink::Relayed(relayed));
        downlinks.send(from, Downlink::confirmed(batch_id));
        in_flight.exit();
    }

    tracing::debug!("Relay stopped");
}
