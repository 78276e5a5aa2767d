//! # Tandem Engine
//!
//! Optimistic synchronization for two peers editing one undoable document.
//!
//! Each peer applies its own edits immediately, before anybody has confirmed
//! them. A relay stamps every batch of edits with the batch it considered
//! "head" at integration time, and the receiving peer reconciles that
//! authoritative batch against whatever it still has in flight.
//!
//! ## Design Principles
//!
//! - **No IO**: Engine has no knowledge of networks, timers, or threads
//! - **Atomic updates**: A reconciliation is applied to the document as one step
//! - **Testable**: Pure logic, no mocks needed
//!
//! ## Core Concepts
//!
//! ### Edits and Batches
//!
//! An [`Edit`] is an invertible change to the [`Document`]. Edits from one
//! interaction tick are grouped into a [`Batch`] with a globally unique id.
//!
//! ### Relay
//!
//! The [`Relay`] assigns a total order: every integrated batch becomes a
//! [`RelayedBatch`] whose `parent_id` names the previous head.
//!
//! ### Reconciliation
//!
//! A [`Peer`] integrates relayed batches through one [`SyncStrategy`]:
//! - [`RewindReplay`] - revert the speculative tail, apply, replay (rebase)
//! - [`IgnoreConflicting`] - drop incoming absolute keys the peer still has
//!   unconfirmed writes for
//!
//! ## Quick Start
//!
//! ```rust
//! use tandem_engine::{Document, Peer, PeerId, Relay, StrategyKind, TrackingMode};
//!
//! let mut relay = Relay::new();
//! let mut a = Peer::new(PeerId::A, Document::demo(), StrategyKind::RewindReplay, TrackingMode::Live);
//! let mut b = Peer::new(PeerId::B, Document::demo(), StrategyKind::RewindReplay, TrackingMode::Live);
//!
//! // Peer A moves block `a` to [1, 1]
//! let edit = a.document().set_positions([("a", [1, 1])]).unwrap();
//! let batch = a.edit(vec![edit]).unwrap();
//!
//! // The relay orders it and B integrates it
//! let relayed = relay.integrate(batch);
//! b.handle_relayed(relayed).unwrap();
//!
//! assert_eq!(a.document(), b.document());
//! assert_eq!(b.document().get("a").unwrap().position, [1, 1]);
//! ```

pub mod batch;
pub mod document;
pub mod edit;
pub mod error;
pub mod peer;
pub mod reconcile;
pub mod relay;
pub mod snapshot;

// Re-export main types at crate root
pub use batch::{new_batch_id, Batch, RelayedBatch, TrackingMode};
pub use document::{Block, Document, EditTarget, Shape};
pub use edit::{Action, ActionKind, Edit, Transition};
pub use error::Error;
pub use peer::{Peer, PeerId};
pub use reconcile::{
    IgnoreConflicting, ReconcilePath, Reconciliation, RewindReplay, Step, StrategyKind,
    SyncStrategy,
};
pub use relay::Relay;
pub use snapshot::{BatchSummary, PeerSnapshot, RelaySnapshot};

/// Type aliases for clarity
pub type BatchId = String;
pub type BlockId = String;
pub type Vector = [i64; 2];
