//! Error types for the Tandem engine.
//!
//! Every variant is a protocol invariant violation. None of them are retried
//! internally; a peer that hits one stops synchronizing.

use crate::{BatchId, PeerId};
use thiserror::Error;

/// All possible errors from the Tandem engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Rewind/replay errors
    #[error(
        "received batch {batch_id} out of sync: causal parent {parent_id} not found in local log [{}]",
        short_ids(.log)
    )]
    CausalParentNotFound {
        batch_id: BatchId,
        parent_id: BatchId,
        log: Vec<BatchId>,
    },

    // Unconfirmed queue errors
    #[error("no outgoing batch to confirm, got {0}")]
    NothingToConfirm(BatchId),

    #[error("unexpected batch id to confirm: expected {expected}, got {actual}")]
    UnexpectedConfirmation { expected: BatchId, actual: BatchId },

    // Peer state errors
    #[error("synchronization halted for peer {0}")]
    SyncHalted(PeerId),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Render ids by their first four characters, enough to tell uuids apart in logs.
fn short_ids(ids: &[BatchId]) -> String {
    ids.iter()
        .map(|id| id.chars().take(4).collect::<String>())
        .collect::<Vec<_>>()
        .join(", ")
}
