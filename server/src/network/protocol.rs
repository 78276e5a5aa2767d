//! Messages carried between the peers and the relay.
//!
//! All messages are JSON-encodable and use snake_case type tags.

use serde::{Deserialize, Serialize};
use tandem_engine::{Batch, BatchId, PeerId, RelayedBatch};

/// A batch sent by a peer to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uplink {
    /// Peer that produced the batch
    pub from: PeerId,
    pub batch: Batch,
}

/// Messages sent from the relay to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Downlink {
    /// A batch from the other peer, stamped with its parent.
    Relayed(RelayedBatch),

    /// The relay has integrated one of the receiver's own batches.
    Confirmed {
        /// Id of the integrated batch
        batch_id: BatchId,
    },
}

impl Downlink {
    pub fn confirmed(batch_id: BatchId) -> Self {
        Downlink::Confirmed { batch_id }
    }

    /// Id of the batch this message is about.
    pub fn batch_id(&self) -> &BatchId {
        match self {
            Downlink::Relayed(relayed) => relayed.id(),
            Downlink::Confirmed { batch_id } => batch_id,
        }
    }
}
