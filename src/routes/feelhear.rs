//! FeelHear routes
//!
//! Voice check-in surface. The upload/transcription/analysis pipeline is an
//! unimplemented collaborator: the contract (input and output shapes) is
//! fixed here, the behavior is stubbed.

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::routes::{
    json_response, message_response, or_error, parse_query, route_path, unmatched, Body,
};
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct SaveQuery {
    session_id: String,
}

/// Dispatch /api/feelhear/* requests
pub async fn handle_feelhear_request(
    req: Request<Incoming>,
    _state: Arc<AppState>,
) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        // Audio body is accepted and dropped; analysis is not wired up yet
        (Method::POST, "/api/feelhear/upload") => json_response(
            StatusCode::OK,
            &json!({ "session_id": "mock_session_id", "message": "Audio uploaded" }),
        ),
        (Method::GET, p) if p.starts_with("/api/feelhear/response/") => json_response(
            StatusCode::OK,
            &json!({ "response": "I hear the emotion in your voice. You're not alone." }),
        ),
        (Method::POST, "/api/feelhear/save") => or_error(save_session(req).await),
        _ => unmatched(
            &path,
            &[
                "/api/feelhear/upload",
                "/api/feelhear/response/",
                "/api/feelhear/save",
            ],
        ),
    }
}

/// POST /api/feelhear/save - acknowledges a session id
async fn save_session(req: Request<Incoming>) -> Result<Response<Body>> {
    let _query: SaveQuery = parse_query(&req)?;
    Ok(message_response("Session saved"))
}
