//! Edit handler - turns edit requests into one local interaction tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tandem_engine::{BatchId, Block, BlockId, Document, Edit, EditTarget, PeerId, Shape, Vector};

use crate::error::{AppError, Result};
use crate::session::Session;

/// One requested change, resolved against the peer's current document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    #[serde(flatten)]
    pub change: Change,
    /// Record in history without touching the document (drag end)
    #[serde(default)]
    pub skip_state: bool,
    /// Change the document without a history entry (drag step)
    #[serde(default)]
    pub skip_history: bool,
}

/// The change itself.
///
/// Changes in one request are resolved in order, each against the board as
/// the earlier ones left it. A later change can therefore refer to a block
/// added earlier in the same request.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Change {
    Add { blocks: Vec<Block> },
    Remove { ids: Vec<BlockId> },
    SetShape { shapes: BTreeMap<BlockId, Shape> },
    ToggleShape { ids: Vec<BlockId> },
    SetPosition { positions: BTreeMap<BlockId, Vector> },
    MoveRelative { offsets: BTreeMap<BlockId, Vector> },
}

impl EditRequest {
    /// Build the edit, or `None` if nothing in the request applies.
    pub fn build(&self, doc: &Document) -> Option<Edit> {
        let edit = match &self.change {
            Change::Add { blocks } => doc.add_blocks(blocks.iter().cloned()),
            Change::Remove { ids } => doc.remove_blocks(ids),
            Change::SetShape { shapes } => doc.set_shapes(shapes.clone()),
            Change::ToggleShape { ids } => doc.set_shapes(
                ids.iter()
                    .filter_map(|id| doc.get(id))
                    .map(|block| (block.id.clone(), block.shape.toggled())),
            ),
            Change::SetPosition { positions } => doc.set_positions(positions.clone()),
            Change::MoveRelative { offsets } => Edit::move_relative(offsets.clone()),
        }?;

        let edit = if self.skip_state { edit.skipping_state() } else { edit };
        Some(if self.skip_history {
            edit.skipping_history()
        } else {
            edit
        })
    }
}

/// Build a tick's edits in order against a scratch copy of `doc`.
///
/// Each edit records the values left by the edits before it, so reverting
/// the tick in reverse order restores `doc` exactly.
pub fn build_tick(requests: &[EditRequest], doc: &Document) -> Vec<Edit> {
    let mut scratch = doc.clone();
    requests
        .iter()
        .filter_map(|request| {
            let edit = request.build(&scratch)?;
            if !edit.skip_state {
                scratch.apply(&edit);
            }
            Some(edit)
        })
        .collect()
}

/// Request body for a local tick.
#[derive(Debug, Deserialize)]
pub struct EditsRequest {
    pub edits: Vec<EditRequest>,
}

/// Response for a local tick.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditsResponse {
    /// Id of the batch sent to the relay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<BatchId>,
    /// Edits applied or recorded locally
    pub edits: Vec<Edit>,
}

/// Apply a request's edits on a peer as one tick.
pub async fn handle_edits(
    session: &Session,
    peer: PeerId,
    request: EditsRequest,
) -> Result<EditsResponse> {
    if request.edits.is_empty() {
        return Err(AppError::BadRequest("no edits in request".to_string()));
    }

    let submission = session
        .submit(peer, |doc| build_tick(&request.edits, doc))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(EditsResponse {
        batch_id: submission.batch.map(|batch| batch.id),
        edits: submission.edits,
    })
}
