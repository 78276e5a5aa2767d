//! The shared document: a board of blocks.
//!
//! [`Document`] is the state both peers converge on. It implements
//! [`EditTarget`], the apply/invert pair the reconciliation engine drives,
//! and offers builders that turn an intended change into an [`Edit`] that
//! remembers what it overwrote.

use crate::{
    edit::{Action, Transition},
    BlockId, Edit, Vector,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shape of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Square,
    Circle,
}

impl Shape {
    /// The other shape.
    pub fn toggled(self) -> Self {
        match self {
            Shape::Square => Shape::Circle,
            Shape::Circle => Shape::Square,
        }
    }
}

/// A block on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub shape: Shape,
    pub position: Vector,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, shape: Shape, position: Vector) -> Self {
        Self {
            id: id.into(),
            shape,
            position,
        }
    }
}

/// Something edits can be applied to and reverted from.
///
/// `invert(e)` must exactly undo `apply(e)`.
pub trait EditTarget {
    /// Mutate the state forward.
    fn apply(&mut self, edit: &Edit);

    /// Mutate the state backward using the edit's stored before values.
    fn invert(&mut self, edit: &Edit) {
        self.apply(&edit.inverted());
    }
}

/// The document both peers edit.
///
/// Uses BTreeMap so equal documents compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    blocks: BTreeMap<BlockId, Block>,
}

impl Document {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// The starting board: a circle `a` at [3, 3] and a square `b` at [6, 8].
    pub fn demo() -> Self {
        Self::from_blocks([
            Block::new("a", Shape::Circle, [3, 3]),
            Block::new("b", Shape::Square, [6, 8]),
        ])
    }

    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        Self {
            blocks: blocks.into_iter().map(|b| (b.id.clone(), b)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// All blocks in id order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Edit inserting `blocks`. Ids already on the board are skipped.
    pub fn add_blocks(&self, blocks: impl IntoIterator<Item = Block>) -> Option<Edit> {
        let blocks: BTreeMap<BlockId, Block> = blocks
            .into_iter()
            .filter(|b| !self.blocks.contains_key(&b.id))
            .map(|b| (b.id.clone(), b))
            .collect();
        if blocks.is_empty() {
            return None;
        }
        Some(Edit::new(Action::Add(blocks)))
    }

    /// Edit removing the named blocks. Unknown ids are skipped.
    pub fn remove_blocks<I, K>(&self, ids: I) -> Option<Edit>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let blocks: BTreeMap<BlockId, Block> = ids
            .into_iter()
            .filter_map(|id| self.blocks.get(id.as_ref()).cloned())
            .map(|b| (b.id.clone(), b))
            .collect();
        if blocks.is_empty() {
            return None;
        }
        Some(Edit::new(Action::Remove(blocks)))
    }

    /// Edit overwriting shapes. Unknown ids are skipped.
    pub fn set_shapes<I, K>(&self, shapes: I) -> Option<Edit>
    where
        I: IntoIterator<Item = (K, Shape)>,
        K: Into<BlockId>,
    {
        let shapes: BTreeMap<BlockId, Transition<Shape>> = shapes
            .into_iter()
            .filter_map(|(id, shape)| {
                let id = id.into();
                let before = self.blocks.get(&id)?.shape;
                Some((id, Transition::new(before, shape)))
            })
            .collect();
        if shapes.is_empty() {
            return None;
        }
        Some(Edit::new(Action::SetShape(shapes)))
    }

    /// Edit overwriting positions. Unknown ids are skipped.
    pub fn set_positions<I, K>(&self, positions: I) -> Option<Edit>
    where
        I: IntoIterator<Item = (K, Vector)>,
        K: Into<BlockId>,
    {
        let positions: BTreeMap<BlockId, Transition<Vector>> = positions
            .into_iter()
            .filter_map(|(id, position)| {
                let id = id.into();
                let before = self.blocks.get(&id)?.position;
                Some((id, Transition::new(before, position)))
            })
            .collect();
        if positions.is_empty() {
            return None;
        }
        Some(Edit::new(Action::SetPosition(positions)))
    }
}

impl EditTarget for Document {
    fn apply(&mut self, edit: &Edit) {
        match &edit.action {
            Action::Add(blocks) => {
                for (id, block) in blocks {
                    self.blocks.insert(id.clone(), block.clone());
                }
            }
            Action::Remove(blocks) => {
                for id in blocks.keys() {
                    self.blocks.remove(id);
                }
            }
            Action::SetShape(shapes) => {
                for (id, t) in shapes {
                    if let Some(block) = self.blocks.get_mut(id) {
                        block.shape = t.after;
                    }
                }
            }
            Action::SetPosition(positions) => {
                for (id, t) in positions {
                    if let Some(block) = self.blocks.get_mut(id) {
                        block.position = t.after;
                    }
                }
            }
            Action::SetPositionRelative(offsets) => {
                for (id, [dx, dy]) in offsets {
                    if let Some(block) = self.blocks.get_mut(id) {
                        let [x, y] = block.position;
                        block.position = [x.wrapping_add(*dx), y.wrapping_add(*dy)];
                    }
                }
            }
        }
    }
}
