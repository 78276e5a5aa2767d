//! Reconciliation of relayed batches against locally pending work.
//!
//! A peer picks one [`SyncStrategy`] at setup. Both strategies turn an
//! incoming [`RelayedBatch`] into a [`Reconciliation`]: the ordered list of
//! steps that the peer then applies to its document in one transaction.
//!
//! # Rewind and replay
//!
//! [`RewindReplay`] keeps every batch the peer has applied in its local log.
//!
//! 1. If the log is empty or ends with the incoming parent, apply the batch
//! 2. Otherwise find the parent in the log; everything after it is the
//!    speculative tail
//! 3. Revert the tail newest-first, apply the incoming batch, replay the tail
//! 4. The log becomes `[..parent, incoming, ..tail]`
//!
//! # Ignore conflicting updates
//!
//! [`IgnoreConflicting`] never reverts. Outgoing batches wait in an
//! unconfirmed queue, and incoming absolute edits lose every key that a
//! queued edit of the same kind also writes. Additive and structural edits
//! are applied as they are.

use crate::{
    error::Result, ActionKind, Batch, BatchId, Edit, Error, RelayedBatch,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which reconciliation strategy a peer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Revert speculative local batches, apply, replay (default)
    #[default]
    RewindReplay,
    /// Drop incoming absolute keys with unconfirmed local writes
    IgnoreConflicting,
}

impl StrategyKind {
    /// Create an empty strategy of this kind.
    pub fn build(self) -> Box<dyn SyncStrategy> {
        match self {
            StrategyKind::RewindReplay => Box::new(RewindReplay::new()),
            StrategyKind::IgnoreConflicting => Box::new(IgnoreConflicting::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::RewindReplay => "rewind-replay",
            StrategyKind::IgnoreConflicting => "ignore-conflicting",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sync strategy '{0}', expected 'rewind-replay' or 'ignore-conflicting'")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rewind-replay" | "rewind" => Ok(StrategyKind::RewindReplay),
            "ignore-conflicting" | "ignore" => Ok(StrategyKind::IgnoreConflicting),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

/// One step of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Undo the edit
    Revert(Edit),
    /// Apply the edit
    Forward(Edit),
}

/// What a reconciliation had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "path")]
pub enum ReconcilePath {
    /// Incoming batch was causally next and applied as is
    FastForward,
    /// Speculative tail was reverted and replayed on top of the incoming batch
    #[serde(rename_all = "camelCase")]
    Rebased {
        tail_batches: usize,
        tail_edits: usize,
    },
    /// Conflicting absolute keys were dropped from the incoming batch
    #[serde(rename_all = "camelCase")]
    Filtered {
        dropped_keys: usize,
        dropped_edits: usize,
    },
}

/// The outcome of reconciling one relayed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The incoming batch
    pub batch_id: BatchId,
    pub path: ReconcilePath,
    /// Steps to apply, in order, as one atomic update
    pub steps: Vec<Step>,
}

impl Reconciliation {
    fn fast_forward(batch: &Batch) -> Self {
        Self {
            batch_id: batch.id.clone(),
            path: ReconcilePath::FastForward,
            steps: batch.edits.iter().cloned().map(Step::Forward).collect(),
        }
    }
}

/// A reconciliation strategy.
///
/// Implementations own the peer's local log (and unconfirmed queue, if they
/// keep one). They never touch the document; they only say what to do to it.
pub trait SyncStrategy: fmt::Debug + Send {
    fn kind(&self) -> StrategyKind;

    /// Track a batch the peer just produced and applied locally.
    fn record_outgoing(&mut self, batch: &Batch);

    /// Integrate a relayed batch from the other peer.
    fn reconcile(&mut self, incoming: RelayedBatch) -> Result<Reconciliation>;

    /// The relay has integrated one of this peer's own batches.
    fn confirm(&mut self, id: &BatchId) -> Result<()>;

    /// Batches believed to be, or about to be, on the authoritative timeline.
    fn local_log(&self) -> &[Batch];

    /// Outgoing batches awaiting confirmation, oldest first.
    fn unconfirmed(&self) -> &[Batch] {
        &[]
    }

    /// Local batches that may still be reverted.
    fn speculative(&self) -> &[Batch] {
        &[]
    }

    /// Drop log entries that can no longer be named as a parent.
    fn compact(&mut self) {}
}

/// Rewind-and-replay strategy.
#[derive(Debug, Clone, Default)]
pub struct RewindReplay {
    log: Vec<Batch>,
    /// Index of the last batch received from the relay
    last_remote: Option<usize>,
}

impl RewindReplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn parent_not_found(&self, batch: Batch, parent_id: BatchId) -> Error {
        Error::CausalParentNotFound {
            batch_id: batch.id,
            parent_id,
            log: self.log.iter().map(|b| b.id.clone()).collect(),
        }
    }
}

impl SyncStrategy for RewindReplay {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RewindReplay
    }

    fn record_outgoing(&mut self, batch: &Batch) {
        self.log.push(batch.clone());
    }

    fn reconcile(&mut self, incoming: RelayedBatch) -> Result<Reconciliation> {
        let RelayedBatch { batch, parent_id } = incoming;

        let is_next = match self.log.last() {
            None => true,
            Some(last) => parent_id.as_ref() == Some(&last.id),
        };
        if is_next {
            let reconciliation = Reconciliation::fast_forward(&batch);
            self.log.push(batch);
            self.last_remote = Some(self.log.len() - 1);
            return Ok(reconciliation);
        }

        // First relayed batch ever: everything local is speculative
        let split = match parent_id {
            None => 0,
            Some(parent_id) => match self.log.iter().position(|b| b.id == parent_id) {
                Some(idx) => idx + 1,
                None => return Err(self.parent_not_found(batch, parent_id)),
            },
        };

        let tail = self.log.split_off(split);
        let tail_edits: usize = tail.iter().map(Batch::len).sum();

        let mut steps = Vec::with_capacity(2 * tail_edits + batch.len());
        steps.extend(
            tail.iter()
                .rev()
                .flat_map(|b| b.edits.iter().rev())
                .cloned()
                .map(Step::Revert),
        );
        steps.extend(batch.edits.iter().cloned().map(Step::Forward));
        steps.extend(
            tail.iter()
                .flat_map(|b| b.edits.iter())
                .cloned()
                .map(Step::Forward),
        );

        let reconciliation = Reconciliation {
            batch_id: batch.id.clone(),
            path: ReconcilePath::Rebased {
                tail_batches: tail.len(),
                tail_edits,
            },
            steps,
        };

        self.log.push(batch);
        self.last_remote = Some(split);
        self.log.extend(tail);

        Ok(reconciliation)
    }

    fn confirm(&mut self, _id: &BatchId) -> Result<()> {
        // Ordering is carried by parent ids; there is no queue to pop.
        Ok(())
    }

    fn local_log(&self) -> &[Batch] {
        &self.log
    }

    fn speculative(&self) -> &[Batch] {
        let start = self.last_remote.map_or(0, |i| i + 1);
        &self.log[start..]
    }

    fn compact(&mut self) {
        if let Some(idx) = self.last_remote {
            self.log.drain(..idx);
            self.last_remote = Some(0);
        }
    }
}

/// Ignore-conflicting-updates strategy.
#[derive(Debug, Clone, Default)]
pub struct IgnoreConflicting {
    /// Timeline as integrated: incoming batches on arrival, own batches on confirmation
    log: Vec<Batch>,
    unconfirmed: Vec<Batch>,
}

impl IgnoreConflicting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an unconfirmed outgoing edit of `kind` writes `key`.
    fn is_pending(&self, kind: ActionKind, key: &str) -> bool {
        self.unconfirmed
            .iter()
            .flat_map(|b| b.edits.iter())
            .any(|e| e.touches(kind, key))
    }
}

impl SyncStrategy for IgnoreConflicting {
    fn kind(&self) -> StrategyKind {
        StrategyKind::IgnoreConflicting
    }

    fn record_outgoing(&mut self, batch: &Batch) {
        self.unconfirmed.push(batch.clone());
    }

    fn reconcile(&mut self, incoming: RelayedBatch) -> Result<Reconciliation> {
        let batch = incoming.batch;

        let mut steps = Vec::with_capacity(batch.len());
        let mut dropped_keys = 0;
        let mut dropped_edits = 0;

        for edit in &batch.edits {
            let kind = edit.kind();
            if !kind.is_absolute() {
                steps.push(Step::Forward(edit.clone()));
                continue;
            }

            let offered = edit.keys().len();
            match edit.retain_keys(|key| !self.is_pending(kind, key)) {
                Some(kept) => {
                    dropped_keys += offered - kept.keys().len();
                    steps.push(Step::Forward(kept));
                }
                None => {
                    dropped_keys += offered;
                    dropped_edits += 1;
                }
            }
        }

        let path = if dropped_keys == 0 {
            ReconcilePath::FastForward
        } else {
            ReconcilePath::Filtered {
                dropped_keys,
                dropped_edits,
            }
        };

        let batch_id = batch.id.clone();
        self.log.push(batch);

        Ok(Reconciliation {
            batch_id,
            path,
            steps,
        })
    }

    fn confirm(&mut self, id: &BatchId) -> Result<()> {
        match self.unconfirmed.first() {
            None => Err(Error::NothingToConfirm(id.clone())),
            Some(head) if head.id != *id => Err(Error::UnexpectedConfirmation {
                expected: head.id.clone(),
                actual: id.clone(),
            }),
            Some(_) => {
                let confirmed = self.unconfirmed.remove(0);
                self.log.push(confirmed);
                Ok(())
            }
        }
    }

    fn local_log(&self) -> &[Batch] {
        &self.log
    }

    fn unconfirmed(&self) -> &[Batch] {
        &self.unconfirmed
    }

    fn speculative(&self) -> &[Batch] {
        &self.unconfirmed
    }

    fn compact(&mut self) {
        self.log.clear();
    }
}
