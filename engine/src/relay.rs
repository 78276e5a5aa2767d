//! The relay: single ordering authority for both peers.
//!
//! Every incoming batch is stamped with the current head as its parent and
//! then becomes the head. The relay performs no conflict detection; two
//! concurrent batches can be given parents that disagree with what either
//! peer has seen, and the receiving peer sorts that out.
//!
//! Integrated batches are retained in an append-only log rather than only the
//! latest one, so a parent id can always be resolved.

use crate::{Batch, BatchId, RelayedBatch, RelaySnapshot};
use std::collections::HashMap;

/// Append-only commit log with an id index.
#[derive(Debug, Clone, Default)]
pub struct Relay {
    log: Vec<RelayedBatch>,
    index: HashMap<BatchId, usize>,
}

impl Relay {
    /// Create a relay with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `batch` with the current head and make it the new head.
    pub fn integrate(&mut self, batch: Batch) -> RelayedBatch {
        let parent_id = self.head().cloned();
        let relayed = RelayedBatch::new(batch, parent_id);

        self.index.insert(relayed.id().clone(), self.log.len());
        self.log.push(relayed.clone());

        relayed
    }

    /// Id of the most recently integrated batch.
    pub fn head(&self) -> Option<&BatchId> {
        self.log.last().map(RelayedBatch::id)
    }

    /// Look up an integrated batch by id.
    pub fn get(&self, id: &str) -> Option<&RelayedBatch> {
        self.index.get(id).map(|&i| &self.log[i])
    }

    /// All integrated batches in relay order.
    pub fn log(&self) -> &[RelayedBatch] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Diagnostic view of the relay.
    pub fn snapshot(&self) -> RelaySnapshot {
        RelaySnapshot::of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_batch_has_no_parent() {
        let mut relay = Relay::new();
        assert!(relay.head().is_none());

        let relayed = relay.integrate(Batch::with_id("b1", vec![]));
        assert_eq!(relayed.parent_id, None);
        assert_eq!(relay.head().map(String::as_str), Some("b1"));
    }

    #[test]
    fn each_batch_names_previous_head() {
        let mut relay = Relay::new();
        relay.integrate(Batch::with_id("b1", vec![]));
        let second = relay.integrate(Batch::with_id("b2", vec![]));
        let third = relay.integrate(Batch::with_id("b3", vec![]));

        assert_eq!(second.parent_id.as_deref(), Some("b1"));
        assert_eq!(third.parent_id.as_deref(), Some("b2"));
        assert_eq!(relay.len(), 3);
    }

    #[test]
    fn lookup_by_id() {
        let mut relay = Relay::new();
        relay.integrate(Batch::with_id("b1", vec![]));
        relay.integrate(Batch::with_id("b2", vec![]));

        assert_eq!(
            relay.get("b2").and_then(|r| r.parent_id.as_deref()),
            Some("b1")
        );
        assert!(relay.get("missing").is_none());
    }

    #[test]
    fn log_keeps_relay_order() {
        let mut relay = Relay::new();
        for id in ["x", "y", "z"] {
            relay.integrate(Batch::with_id(id, vec![]));
        }

        let ids: Vec<_> = relay.log().iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }
}
