//! Peer task: feeds relay messages into one peer.

use std::sync::Arc;

use tandem_engine::{Error, Peer};
use tokio::sync::{mpsc, Mutex};

use crate::network::{Downlink, InFlight};

/// Handle down-link messages until the link closes.
pub async fn run(
    peer: Arc<Mutex<Peer>>,
    mut inbox: mpsc::UnboundedReceiver<Downlink>,
    compact_log: bool,
    in_flight: Arc<InFlight>,
) {
    while let Some(message) = inbox.recv().await {
        {
            let mut peer = peer.lock().await;
            deliver(&mut peer, message, compact_log);
        }
        in_flight.exit();
    }
}

/// Apply one relay message to the peer.
///
/// Errors are logged rather than returned; a fatal one has already halted
/// the peer.
pub fn deliver(peer: &mut Peer, message: Downlink, compact_log: bool) {
    let batch_id = message.batch_id().clone();

    let result = match message {
        Downlink::Relayed(relayed) => {
            let parent_id = relayed.parent_id.clone();
            peer.handle_relayed(relayed).map(|reconciliation| {
                tracing::debug!(
                    peer = %peer.id(),
                    batch_id = %batch_id,
                    parent_id = ?parent_id,
                    path = ?reconciliation.path,
                    steps = reconciliation.steps.len(),
                    "Integrated relayed batch"
                );
                if compact_log {
                    peer.compact_log();
                }
            })
        }
        Downlink::Confirmed { batch_id } => peer.confirm(&batch_id).map(|()| {
            tracing::debug!(peer = %peer.id(), batch_id = %batch_id, "Batch confirmed");
        }),
    };

    match result {
        Ok(()) => {}
        Err(Error::SyncHalted(id)) => {
            tracing::warn!(peer = %id, batch_id = %batch_id, "Peer halted, message dropped");
        }
        Err(e) => {
            tracing::error!(
                peer = %peer.id(),
                batch_id = %batch_id,
                error = %e,
                "Synchronization halted"
            );
        }
    }
}
