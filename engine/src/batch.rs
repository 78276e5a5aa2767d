//! Batches: the unit of synchronization.

use crate::{BatchId, Edit};
use serde::{Deserialize, Serialize};

/// Generate a globally unique batch id.
pub fn new_batch_id() -> BatchId {
    uuid::Uuid::new_v4().to_string()
}

/// An immutable group of edits produced by one interaction tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub edits: Vec<Edit>,
}

impl Batch {
    /// Create a batch with a fresh random id.
    pub fn new(edits: Vec<Edit>) -> Self {
        Self::with_id(new_batch_id(), edits)
    }

    /// Create a batch with a caller-chosen id.
    pub fn with_id(id: impl Into<BatchId>, edits: Vec<Edit>) -> Self {
        Self {
            id: id.into(),
            edits,
        }
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// A batch as ordered by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedBatch {
    pub batch: Batch,
    /// The relay head when this batch was integrated; `None` only for the first batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BatchId>,
}

impl RelayedBatch {
    pub fn new(batch: Batch, parent_id: Option<BatchId>) -> Self {
        Self { batch, parent_id }
    }

    pub fn id(&self) -> &BatchId {
        &self.batch.id
    }
}

/// Which edits of a tick are synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    /// Drag sync enabled: live drag positions are sent, history-only edits are not
    #[default]
    Live,
    /// Drag sync disabled: only edits that land in history are sent
    History,
}

impl TrackingMode {
    /// Drop the edits this mode does not synchronize.
    pub fn filter(self, edits: Vec<Edit>) -> Vec<Edit> {
        edits
            .into_iter()
            .filter(|edit| match self {
                TrackingMode::Live => !edit.skip_state,
                TrackingMode::History => !edit.skip_history,
            })
            .collect()
    }
}
