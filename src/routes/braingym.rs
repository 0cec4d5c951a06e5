//! Brain gym routes
//!
//! The game catalog is static; scores are append-only per user.

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

const GAMES: [&str; 4] = ["memory_match", "recall", "pattern", "reaction"];

#[derive(Debug, Deserialize)]
struct ScoresQuery {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct SubmitQuery {
    user_id: String,
    game_type: String,
    score: i64,
}

/// Dispatch /api/braingym/* requests
pub async fn handle_braingym_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, "/api/braingym/games") => {
            json_response(StatusCode::OK, &json!({ "games": GAMES }))
        }
        (Method::POST, "/api/braingym/score") => or_error(submit_score(req, state).await),
        (Method::GET, "/api/braingym/score") => or_error(get_scores(req, state).await),
        _ => unmatched(&path, &["/api/braingym/games", "/api/braingym/score"]),
    }
}

/// POST /api/braingym/score
async fn submit_score(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: SubmitQuery = parse_query(&req)?;

    let row = json!({
        "user_id": query.user_id,
        "game_type": query.game_type,
        "score": query.score,
    });

    let rows = state.store.table("braingym_scores").insert(&row).await?;
    Ok(rows_response(&rows))
}

/// GET /api/braingym/score - score history, newest first
async fn get_scores(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: ScoresQuery = parse_query(&req)?;

    let rows = state
        .store
        .table("braingym_scores")
        .eq("user_id", &query.user_id)
        .order_desc("timestamp")
        .fetch()
        .await?;

    Ok(rows_response(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_catalog_is_fixed() {
        assert_eq!(GAMES.len(), 4);
        assert!(GAMES.contains(&"memory_match"));
        assert!(GAMES.contains(&"reaction"));
    }

    #[test]
    fn test_submit_query_coerces_score() {
        let q: SubmitQuery =
            serde_urlencoded::from_str("user_id=u1&game_type=pattern&score=980").unwrap();
        assert_eq!(q.score, 980);
    }
}
