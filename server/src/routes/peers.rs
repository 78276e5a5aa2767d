//! Peer endpoint routes.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tandem_engine::{PeerId, PeerSnapshot};

use crate::error::{AppError, Result};
use crate::handlers::{handle_edits, handle_tracking, EditsRequest, EditsResponse, TrackingRequest};
use crate::AppState;

/// Create peer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/peers/{peer}", get(snapshot_handler))
        .route("/peers/{peer}/edits", post(edits_handler))
        .route("/peers/{peer}/tracking", put(tracking_handler))
}

fn parse_peer(peer: &str) -> Result<PeerId> {
    peer.parse()
        .map_err(|_| AppError::NotFound(format!("peer '{}'", peer)))
}

/// GET /peers/{peer} - Diagnostic view of a peer.
async fn snapshot_handler(
    State(state): State<AppState>,
    Path(peer): Path<String>,
) -> Result<Json<PeerSnapshot>> {
    let peer = parse_peer(&peer)?;
    Ok(Json(state.session.peer_snapshot(peer).await))
}

/// POST /peers/{peer}/edits - Run one local interaction tick.
async fn edits_handler(
    State(state): State<AppState>,
    Path(peer): Path<String>,
    Json(request): Json<EditsRequest>,
) -> Result<Json<EditsResponse>> {
    let peer = parse_peer(&peer)?;
    let response = handle_edits(&state.session, peer, request).await?;
    Ok(Json(response))
}

/// PUT /peers/{peer}/tracking - Switch drag synchronization.
async fn tracking_handler(
    State(state): State<AppState>,
    Path(peer): Path<String>,
    Json(request): Json<TrackingRequest>,
) -> Result<Json<TrackingRequest>> {
    let peer = parse_peer(&peer)?;
    let response = handle_tracking(&state.session, peer, request).await?;
    Ok(Json(response))
}
