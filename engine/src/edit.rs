//! Edit descriptors.
//!
//! An edit is an atomic change that carries enough information to be undone
//! losslessly: absolute edits store both the value they replaced and the
//! value they wrote, structural edits store the whole blocks they add or
//! remove.

use crate::{document::Block, BlockId, Shape, Vector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The value of a field before and after an absolute edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition<T> {
    pub before: T,
    pub after: T,
}

impl<T> Transition<T> {
    pub fn new(before: T, after: T) -> Self {
        Self { before, after }
    }

    /// Swap before and after.
    pub fn reversed(self) -> Self {
        Self {
            before: self.after,
            after: self.before,
        }
    }
}

/// The change an edit makes, keyed by block id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Action {
    /// Insert whole blocks
    Add(BTreeMap<BlockId, Block>),
    /// Delete blocks (the payload keeps them so the removal can be undone)
    Remove(BTreeMap<BlockId, Block>),
    /// Overwrite the shape of each block
    SetShape(BTreeMap<BlockId, Transition<Shape>>),
    /// Overwrite the position of each block
    SetPosition(BTreeMap<BlockId, Transition<Vector>>),
    /// Shift the position of each block by an offset
    SetPositionRelative(BTreeMap<BlockId, Vector>),
}

/// Discriminant of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Add,
    Remove,
    SetShape,
    SetPosition,
    SetPositionRelative,
}

impl ActionKind {
    /// Absolute kinds overwrite a field outright and can conflict.
    /// Everything else is treated as commutative.
    pub fn is_absolute(self) -> bool {
        matches!(self, ActionKind::SetShape | ActionKind::SetPosition)
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Add(_) => ActionKind::Add,
            Action::Remove(_) => ActionKind::Remove,
            Action::SetShape(_) => ActionKind::SetShape,
            Action::SetPosition(_) => ActionKind::SetPosition,
            Action::SetPositionRelative(_) => ActionKind::SetPositionRelative,
        }
    }

    /// Block ids named by the payload, in ascending order.
    pub fn keys(&self) -> Vec<&BlockId> {
        match self {
            Action::Add(blocks) | Action::Remove(blocks) => blocks.keys().collect(),
            Action::SetShape(shapes) => shapes.keys().collect(),
            Action::SetPosition(positions) => positions.keys().collect(),
            Action::SetPositionRelative(offsets) => offsets.keys().collect(),
        }
    }

    fn contains_key(&self, key: &str) -> bool {
        match self {
            Action::Add(blocks) | Action::Remove(blocks) => blocks.contains_key(key),
            Action::SetShape(shapes) => shapes.contains_key(key),
            Action::SetPosition(positions) => positions.contains_key(key),
            Action::SetPositionRelative(offsets) => offsets.contains_key(key),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Action::Add(blocks) | Action::Remove(blocks) => blocks.is_empty(),
            Action::SetShape(shapes) => shapes.is_empty(),
            Action::SetPosition(positions) => positions.is_empty(),
            Action::SetPositionRelative(offsets) => offsets.is_empty(),
        }
    }

    fn retain(&mut self, mut keep: impl FnMut(&BlockId) -> bool) {
        match self {
            Action::Add(blocks) | Action::Remove(blocks) => blocks.retain(|id, _| keep(id)),
            Action::SetShape(shapes) => shapes.retain(|id, _| keep(id)),
            Action::SetPosition(positions) => positions.retain(|id, _| keep(id)),
            Action::SetPositionRelative(offsets) => offsets.retain(|id, _| keep(id)),
        }
    }

    fn inverted(&self) -> Action {
        match self {
            Action::Add(blocks) => Action::Remove(blocks.clone()),
            Action::Remove(blocks) => Action::Add(blocks.clone()),
            Action::SetShape(shapes) => Action::SetShape(
                shapes
                    .iter()
                    .map(|(id, t)| (id.clone(), t.reversed()))
                    .collect(),
            ),
            Action::SetPosition(positions) => Action::SetPosition(
                positions
                    .iter()
                    .map(|(id, t)| (id.clone(), t.reversed()))
                    .collect(),
            ),
            Action::SetPositionRelative(offsets) => Action::SetPositionRelative(
                offsets
                    .iter()
                    .map(|(id, [x, y])| (id.clone(), [x.wrapping_neg(), y.wrapping_neg()]))
                    .collect(),
            ),
        }
    }
}

/// A single invertible change, as produced by the undo engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    /// What the edit does
    pub action: Action,
    /// Recorded for history only; the visible state already reflects it
    #[serde(default, skip_serializing_if = "is_false")]
    pub skip_state: bool,
    /// Live state only (e.g. an intermediate drag position), not kept in history
    #[serde(default, skip_serializing_if = "is_false")]
    pub skip_history: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl Edit {
    /// Create an edit with both skip flags cleared.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            skip_state: false,
            skip_history: false,
        }
    }

    /// Relative move of each block by its offset. Zero offsets are dropped.
    pub fn move_relative<I, K>(offsets: I) -> Option<Edit>
    where
        I: IntoIterator<Item = (K, Vector)>,
        K: Into<BlockId>,
    {
        let offsets: BTreeMap<BlockId, Vector> = offsets
            .into_iter()
            .filter(|(_, offset)| *offset != [0, 0])
            .map(|(id, offset)| (id.into(), offset))
            .collect();
        if offsets.is_empty() {
            return None;
        }
        Some(Edit::new(Action::SetPositionRelative(offsets)))
    }

    /// Mark the edit as history-only.
    pub fn skipping_state(mut self) -> Self {
        self.skip_state = true;
        self
    }

    /// Mark the edit as live-state-only.
    pub fn skipping_history(mut self) -> Self {
        self.skip_history = true;
        self
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn keys(&self) -> Vec<&BlockId> {
        self.action.keys()
    }

    /// Whether this edit is of `kind` and names `key` in its payload.
    pub fn touches(&self, kind: ActionKind, key: &str) -> bool {
        self.kind() == kind && self.action.contains_key(key)
    }

    /// The edit that exactly undoes this one.
    pub fn inverted(&self) -> Edit {
        Edit {
            action: self.action.inverted(),
            skip_state: self.skip_state,
            skip_history: self.skip_history,
        }
    }

    /// Keep only the payload keys accepted by `keep`.
    ///
    /// Returns `None` when no key survives.
    pub fn retain_keys(&self, keep: impl FnMut(&BlockId) -> bool) -> Option<Edit> {
        let mut edit = self.clone();
        edit.action.retain(keep);
        if edit.action.is_empty() {
            None
        } else {
            Some(edit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_position(id: &str, before: Vector, after: Vector) -> Edit {
        Edit::new(Action::SetPosition(BTreeMap::from([(
            id.to_string(),
            Transition::new(before, after),
        )])))
    }

    #[test]
    fn absolute_kinds() {
        assert!(ActionKind::SetShape.is_absolute());
        assert!(ActionKind::SetPosition.is_absolute());
        assert!(!ActionKind::Add.is_absolute());
        assert!(!ActionKind::Remove.is_absolute());
        assert!(!ActionKind::SetPositionRelative.is_absolute());
    }

    #[test]
    fn invert_swaps_transition() {
        let edit = set_position("a", [3, 3], [1, 1]);
        assert_eq!(edit.inverted(), set_position("a", [1, 1], [3, 3]));
        assert_eq!(edit.inverted().inverted(), edit);
    }

    #[test]
    fn invert_add_is_remove() {
        let block = Block::new("c", Shape::Circle, [0, 0]);
        let add = Edit::new(Action::Add(BTreeMap::from([("c".to_string(), block.clone())])));
        let inverted = add.inverted();

        assert_eq!(inverted.kind(), ActionKind::Remove);
        assert_eq!(inverted.inverted(), add);
    }

    #[test]
    fn invert_negates_offsets() {
        let edit = Edit::move_relative([("a", [2, -1])]).unwrap();
        assert_eq!(
            edit.inverted().action,
            Action::SetPositionRelative(BTreeMap::from([("a".to_string(), [-2, 1])]))
        );
    }

    #[test]
    fn invert_negates_extreme_offsets() {
        let edit = Edit::move_relative([("a", [i64::MIN, i64::MAX])]).unwrap();
        assert_eq!(
            edit.inverted().action,
            Action::SetPositionRelative(BTreeMap::from([(
                "a".to_string(),
                [i64::MIN, -i64::MAX]
            )]))
        );
    }

    #[test]
    fn invert_keeps_flags() {
        let edit = Edit::move_relative([("a", [1, 0])])
            .unwrap()
            .skipping_state();
        assert!(edit.inverted().skip_state);
        assert!(!edit.inverted().skip_history);
    }

    #[test]
    fn move_relative_drops_zero_offsets() {
        assert!(Edit::move_relative([("a", [0, 0])]).is_none());

        let edit = Edit::move_relative([("a", [0, 0]), ("b", [1, 0])]).unwrap();
        assert_eq!(edit.keys(), vec!["b"]);
    }

    #[test]
    fn touches_requires_same_kind() {
        let edit = set_position("a", [0, 0], [1, 1]);
        assert!(edit.touches(ActionKind::SetPosition, "a"));
        assert!(!edit.touches(ActionKind::SetPosition, "b"));
        assert!(!edit.touches(ActionKind::SetShape, "a"));
    }

    #[test]
    fn retain_keys_filters_payload() {
        let edit = Edit::new(Action::SetPosition(BTreeMap::from([
            ("a".to_string(), Transition::new([0, 0], [1, 1])),
            ("b".to_string(), Transition::new([0, 0], [2, 2])),
        ])));

        let filtered = edit.retain_keys(|id| id != "a").unwrap();
        assert_eq!(filtered, set_position("b", [0, 0], [2, 2]));

        assert!(edit.retain_keys(|_| false).is_none());
    }

    #[test]
    fn serialization_format() {
        let edit = set_position("a", [3, 3], [1, 1]).skipping_history();
        let json = serde_json::to_value(&edit).unwrap();

        assert_eq!(json["action"]["type"], "setPosition");
        assert_eq!(json["action"]["payload"]["a"]["after"], serde_json::json!([1, 1]));
        assert_eq!(json["skipHistory"], true);
        assert!(json.get("skipState").is_none());

        let parsed: Edit = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, edit);
    }
}
