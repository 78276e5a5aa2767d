//! Relay endpoint routes.

use axum::{extract::State, routing::get, Json, Router};
use tandem_engine::RelaySnapshot;

use crate::AppState;

/// Create relay routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/relay", get(snapshot_handler))
}

/// GET /relay - Diagnostic view of the relay log.
async fn snapshot_handler(State(state): State<AppState>) -> Json<RelaySnapshot> {
    Json(state.session.relay_snapshot().await)
}
