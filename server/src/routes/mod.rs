//! HTTP route definitions.

mod health;
mod peers;
mod relay;

use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(peers::routes())
        .merge(relay::routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::Session;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<Session>) {
        let config = Config::default();
        let session = Arc::new(Session::start(&config));
        let state = AppState {
            session: session.clone(),
            config: Arc::new(config),
        };
        (create_routes().with_state(state), session)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["strategy"], "rewind-replay");
    }

    #[tokio::test]
    async fn test_edit_propagates_to_other_peer() {
        let (app, session) = app();
        let edits = json!({
            "edits": [{ "type": "setPosition", "positions": { "a": [1, 1] } }]
        });

        let (status, body) = send(&app, Method::POST, "/peers/a/edits", Some(edits)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["batchId"].is_string());
        assert_eq!(body["edits"].as_array().unwrap().len(), 1);

        session.settled().await;

        let (status, body) = send(&app, Method::GET, "/peers/b", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["document"]["blocks"]["a"]["position"], json!([1, 1]));
        assert_eq!(body["log"].as_array().unwrap().len(), 1);

        let (_, relay) = send(&app, Method::GET, "/relay", None).await;
        assert_eq!(relay["head"], body["log"][0]["id"]);
    }

    #[tokio::test]
    async fn test_unknown_peer_is_not_found() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/peers/c", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "peer 'c'");
    }

    #[tokio::test]
    async fn test_empty_edit_list_is_rejected() {
        let (app, _) = app();
        let empty = json!({ "edits": [] });
        let (status, _) = send(&app, Method::POST, "/peers/a/edits", Some(empty)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_mode_holds_drag_steps() {
        let (app, session) = app();
        let (status, body) = send(
            &app,
            Method::PUT,
            "/peers/b/tracking",
            Some(json!({ "mode": "history" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "history");

        let drag = json!({
            "edits": [{ "type": "moveRelative", "offsets": { "b": [1, 0] }, "skipHistory": true }]
        });
        let (status, body) = send(&app, Method::POST, "/peers/b/edits", Some(drag)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("batchId").is_none());

        session.settled().await;
        let (_, relay) = send(&app, Method::GET, "/relay", None).await;
        assert!(relay["log"].as_array().unwrap().is_empty());

        let (_, peer) = send(&app, Method::GET, "/peers/b", None).await;
        assert_eq!(peer["tracking"], "history");
        assert_eq!(peer["document"]["blocks"]["b"]["position"], json!([7, 8]));
    }
}
