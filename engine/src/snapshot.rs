//! Read-only diagnostic views of peers and the relay.
//!
//! Nothing here is ever loaded back; snapshots exist so a UI or an operator
//! can see each peer's log, queue and document.

use crate::{Batch, BatchId, Document, Peer, PeerId, Relay, StrategyKind, TrackingMode};
use serde::{Deserialize, Serialize};

/// Compact description of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub id: BatchId,
    /// Parent assigned by the relay, for relay entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BatchId>,
    /// Number of edits in the batch
    pub edits: usize,
}

impl BatchSummary {
    fn of(batch: &Batch) -> Self {
        Self {
            id: batch.id.clone(),
            parent_id: None,
            edits: batch.len(),
        }
    }
}

/// Point-in-time view of one peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSnapshot {
    pub peer: PeerId,
    pub strategy: StrategyKind,
    pub tracking: TrackingMode,
    pub halted: bool,
    pub document: Document,
    /// Local log, oldest first
    pub log: Vec<BatchSummary>,
    /// Unconfirmed queue, oldest first
    pub unconfirmed: Vec<BatchId>,
    /// Number of local batches that may still be reverted or are unconfirmed
    pub speculative: usize,
}

impl PeerSnapshot {
    pub(crate) fn of(peer: &Peer) -> Self {
        Self {
            peer: peer.id(),
            strategy: peer.strategy_kind(),
            tracking: peer.tracking_mode(),
            halted: peer.is_halted(),
            document: peer.document().clone(),
            log: peer.local_log().iter().map(BatchSummary::of).collect(),
            unconfirmed: peer.unconfirmed().iter().map(|b| b.id.clone()).collect(),
            speculative: peer.speculative().len(),
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Point-in-time view of the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaySnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<BatchId>,
    /// Integrated batches in relay order
    pub log: Vec<BatchSummary>,
}

impl RelaySnapshot {
    pub fn of(relay: &Relay) -> Self {
        Self {
            head: relay.head().cloned(),
            log: relay
                .log()
                .iter()
                .map(|r| BatchSummary {
                    parent_id: r.parent_id.clone(),
                    ..BatchSummary::of(&r.batch)
                })
                .collect(),
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
