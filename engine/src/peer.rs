//! Peer - one editor's document plus its synchronization state.
//!
//! The peer applies its own edits immediately, hands the resulting batch to
//! the caller for delivery, and integrates relayed batches through its
//! [`SyncStrategy`].

use crate::{
    error::Result, reconcile::Step, Batch, BatchId, Document, Edit, EditTarget, Error,
    PeerSnapshot, Reconciliation, RelayedBatch, StrategyKind, SyncStrategy, TrackingMode,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerId {
    A,
    B,
}

impl PeerId {
    pub const ALL: [PeerId; 2] = [PeerId::A, PeerId::B];

    /// The peer on the other side of the relay.
    pub fn other(self) -> PeerId {
        match self {
            PeerId::A => PeerId::B,
            PeerId::B => PeerId::A,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PeerId::A => "a",
            PeerId::B => "b",
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeerId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(PeerId::A),
            "b" | "B" => Ok(PeerId::B),
            other => Err(format!("unknown peer '{}'", other)),
        }
    }
}

/// A peer's document and synchronization state.
#[derive(Debug)]
pub struct Peer {
    id: PeerId,
    document: Document,
    tracking: TrackingMode,
    strategy: Box<dyn SyncStrategy>,
    /// Set by the first fatal protocol error
    halted: bool,
}

impl Peer {
    /// Create a peer running a fresh strategy of `kind`.
    pub fn new(id: PeerId, document: Document, kind: StrategyKind, tracking: TrackingMode) -> Self {
        Self::with_strategy(id, document, kind.build(), tracking)
    }

    /// Create a peer with an already constructed strategy.
    pub fn with_strategy(
        id: PeerId,
        document: Document,
        strategy: Box<dyn SyncStrategy>,
        tracking: TrackingMode,
    ) -> Self {
        Self {
            id,
            document,
            tracking,
            strategy,
            halted: false,
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    /// The peer's visible state.
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn tracking_mode(&self) -> TrackingMode {
        self.tracking
    }

    pub fn set_tracking_mode(&mut self, tracking: TrackingMode) {
        self.tracking = tracking;
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn local_log(&self) -> &[Batch] {
        self.strategy.local_log()
    }

    pub fn unconfirmed(&self) -> &[Batch] {
        self.strategy.unconfirmed()
    }

    pub fn speculative(&self) -> &[Batch] {
        self.strategy.speculative()
    }

    /// Apply one interaction tick locally and produce its batch.
    ///
    /// Edits flagged `skip_state` only record history, so they do not touch
    /// the document here. Returns the batch to send, if any edit qualifies
    /// for synchronization.
    pub fn edit(&mut self, edits: Vec<Edit>) -> Option<Batch> {
        for edit in edits.iter().filter(|e| !e.skip_state) {
            self.document.apply(edit);
        }
        self.push_local(edits)
    }

    /// Turn already-applied edits into an outgoing batch.
    ///
    /// Filters by tracking mode; returns `None` when nothing is left.
    pub fn push_local(&mut self, edits: Vec<Edit>) -> Option<Batch> {
        let edits = self.tracking.filter(edits);
        if edits.is_empty() {
            return None;
        }

        let batch = Batch::new(edits);
        self.strategy.record_outgoing(&batch);
        Some(batch)
    }

    /// Integrate a batch relayed from the other peer.
    ///
    /// All reverts, the incoming edits and all replays land on the document
    /// at once. A protocol error halts the peer.
    pub fn handle_relayed(&mut self, incoming: RelayedBatch) -> Result<Reconciliation> {
        self.ensure_running()?;

        let reconciliation = self
            .strategy
            .reconcile(incoming)
            .map_err(|e| self.halt(e))?;

        let mut staged = self.document.clone();
        apply_steps(&mut staged, &reconciliation.steps);
        self.document = staged;

        Ok(reconciliation)
    }

    /// The relay has integrated one of this peer's own batches.
    pub fn confirm(&mut self, id: &BatchId) -> Result<()> {
        self.ensure_running()?;
        self.strategy.confirm(id).map_err(|e| self.halt(e))
    }

    /// Drop log entries that can no longer be named as a parent.
    pub fn compact_log(&mut self) {
        self.strategy.compact();
    }

    /// Diagnostic view of the peer.
    pub fn snapshot(&self) -> PeerSnapshot {
        PeerSnapshot::of(self)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.halted {
            return Err(Error::SyncHalted(self.id));
        }
        Ok(())
    }

    fn halt(&mut self, err: Error) -> Error {
        self.halted = true;
        err
    }
}

/// Run reconciliation steps against a target in order.
pub fn apply_steps<T: EditTarget>(target: &mut T, steps: &[Step]) {
    for step in steps {
        match step {
            Step::Revert(edit) => target.invert(edit),
            Step::Forward(edit) => target.apply(edit),
        }
    }
}
