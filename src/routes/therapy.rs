//! Therapy session routes
//!
//! Session start and history are real table operations; the message
//! endpoint is a stub with a fixed reply until message persistence and the
//! inference hookup land.

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::routes::{
    json_response, or_error, parse_query, route_path, rows_response, unmatched, Body,
};
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Deserialize)]
struct SessionQuery {
    user_id: String,
    mode: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct MessageQuery {
    session_id: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    user_id: String,
}

/// Dispatch /api/therapy/* requests
pub async fn handle_therapy_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::POST, "/api/therapy/session") => or_error(start_session(req, state).await),
        (Method::POST, "/api/therapy/message") => or_error(send_message(req).await),
        (Method::GET, "/api/therapy/history") => or_error(get_history(req, state).await),
        _ => unmatched(
            &path,
            &[
                "/api/therapy/session",
                "/api/therapy/message",
                "/api/therapy/history",
            ],
        ),
    }
}

/// POST /api/therapy/session - open a new session record
async fn start_session(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: SessionQuery = parse_query(&req)?;

    let row = json!({
        "user_id": query.user_id,
        "mode": query.mode,
    });

    let rows = state.store.table("therapy_sessions").insert(&row).await?;
    Ok(rows_response(&rows))
}

/// POST /api/therapy/message - stub; validates the shape, returns a fixed
/// reply, persists nothing
async fn send_message(req: Request<Incoming>) -> Result<Response<Body>> {
    let _query: MessageQuery = parse_query(&req)?;

    Ok(json_response(
        StatusCode::OK,
        &json!({ "response": "I hear you. Can you tell me more about that?" }),
    ))
}

/// GET /api/therapy/history - sessions for a user, newest first
async fn get_history(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: HistoryQuery = parse_query(&req)?;

    let rows = state
        .store
        .table("therapy_sessions")
        .eq("user_id", &query.user_id)
        .order_desc("started_at")
        .fetch()
        .await?;

    Ok(rows_response(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_query_requires_both_fields() {
        let ok: MessageQuery =
            serde_urlencoded::from_str("session_id=s1&message=hello").unwrap();
        assert_eq!(ok.session_id, "s1");

        let missing: std::result::Result<MessageQuery, _> =
            serde_urlencoded::from_str("session_id=s1");
        assert!(missing.is_err());
    }
}
