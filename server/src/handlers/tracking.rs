//! Tracking handler - switches drag synchronization on or off.

use serde::{Deserialize, Serialize};
use tandem_engine::{PeerId, TrackingMode};

use crate::error::Result;
use crate::session::Session;

/// Request body for a tracking change.
#[derive(Debug, Deserialize, Serialize)]
pub struct TrackingRequest {
    pub mode: TrackingMode,
}

/// Set the tracking mode of a peer; the response echoes the new mode.
pub async fn handle_tracking(
    session: &Session,
    peer: PeerId,
    request: TrackingRequest,
) -> Result<TrackingRequest> {
    session.set_tracking_mode(peer, request.mode).await;
    Ok(request)
}
