//! Meditation session routes

use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::routes::{or_error, parse_query, route_path, rows_response, unmatched, Body};
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Deserialize)]
struct ListQuery {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateQuery {
    user_id: String,
    theme: String,
    duration_minutes: i64,
    voice_type: String,
    time_of_day: String,
}

/// Dispatch /api/meditation/* requests
pub async fn handle_meditation_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, "/api/meditation/sessions") => or_error(get_sessions(req, state).await),
        (Method::POST, "/api/meditation/sessions") => or_error(create_session(req, state).await),
        _ => unmatched(&path, &["/api/meditation/sessions"]),
    }
}

/// GET /api/meditation/sessions - newest first
async fn get_sessions(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: ListQuery = parse_query(&req)?;

    let rows = state
        .store
        .table("meditation_sessions")
        .eq("user_id", &query.user_id)
        .order_desc("timestamp")
        .fetch()
        .await?;

    Ok(rows_response(&rows))
}

/// POST /api/meditation/sessions
async fn create_session(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: CreateQuery = parse_query(&req)?;

    let row = json!({
        "user_id": query.user_id,
        "theme": query.theme,
        "duration_minutes": query.duration_minutes,
        "voice_type": query.voice_type,
        "time_of_day": query.time_of_day,
    });

    let rows = state.store.table("meditation_sessions").insert(&row).await?;
    Ok(rows_response(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_query_parses_duration() {
        let q: CreateQuery = serde_urlencoded::from_str(
            "user_id=u1&theme=sleep&duration_minutes=15&voice_type=calm&time_of_day=evening",
        )
        .unwrap();
        assert_eq!(q.duration_minutes, 15);
        assert_eq!(q.time_of_day, "evening");
    }
}
