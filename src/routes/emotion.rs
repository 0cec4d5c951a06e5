//! Emotion log routes
//!
//! Quick emotion check-ins: label, 1-10 intensity, and a source tag
//! (manual entry by default; inference-classified events use "gemini").

use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::routes::{
    message_response, or_error, parse_query, route_path, rows_response, unmatched, Body,
};
use crate::server::AppState;
use crate::types::Result;

fn default_limit() -> u32 {
    50
}

fn default_source() -> String {
    "manual".to_string()
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    user_id: String,
    #[serde(default = "default_limit")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct CreateQuery {
    user_id: String,
    label: String,
    intensity: i64,
    #[serde(default = "default_source")]
    source: String,
}

#[derive(Debug, Deserialize)]
struct OwnerQuery {
    user_id: String,
}

/// Dispatch /api/emotion/* requests
pub async fn handle_emotion_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, "/api/emotion/logs") => or_error(get_logs(req, state).await),
        (Method::POST, "/api/emotion/logs") => or_error(create_log(req, state).await),
        (Method::DELETE, p) if p.starts_with("/api/emotion/logs/") => {
            let log_id = p.trim_start_matches("/api/emotion/logs/").to_string();
            or_error(delete_log(req, state, &log_id).await)
        }
        _ => unmatched(&path, &["/api/emotion/logs", "/api/emotion/logs/"]),
    }
}

/// GET /api/emotion/logs - most recent events, capped by limit
async fn get_logs(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: LogsQuery = parse_query(&req)?;

    let rows = state
        .store
        .table("emotion_events")
        .eq("user_id", &query.user_id)
        .order_desc("timestamp")
        .limit(query.limit)
        .fetch()
        .await?;

    Ok(rows_response(&rows))
}

/// POST /api/emotion/logs
async fn create_log(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: CreateQuery = parse_query(&req)?;

    let row = json!({
        "user_id": query.user_id,
        "label": query.label,
        "intensity": query.intensity,
        "source": query.source,
    });

    let rows = state.store.table("emotion_events").insert(&row).await?;
    Ok(rows_response(&rows))
}

/// DELETE /api/emotion/logs/{id} - owner-scoped no-op delete
async fn delete_log(
    req: Request<Incoming>,
    state: Arc<AppState>,
    log_id: &str,
) -> Result<Response<Body>> {
    let query: OwnerQuery = parse_query(&req)?;

    state
        .store
        .table("emotion_events")
        .eq("id", log_id)
        .eq("user_id", &query.user_id)
        .delete()
        .await?;

    Ok(message_response("Log deleted"))
}
