//! Content library routes
//!
//! Items are curated externally and read-only here. Progress tracking is a
//! two-phase pair of independent writes: "opened" inserts a row,
//! "completed" later stamps it. The pair is not transactional; a completed
//! action with no prior opened row patches nothing and still acknowledges.

use chrono::Utc;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::routes::{
    message_response, or_error, parse_query, route_path, rows_response, unmatched, Body,
};
use crate::server::AppState;
use crate::types::{GatewayError, Result};

#[derive(Debug, Deserialize)]
struct ItemsQuery {
    category: Option<String>,
    #[serde(rename = "type")]
    item_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProgressQuery {
    user_id: String,
    content_id: String,
    action: String,
}

/// Dispatch /api/content/* requests
pub async fn handle_content_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, "/api/content/items") => or_error(get_items(req, state).await),
        (Method::POST, "/api/content/progress") => or_error(track_progress(req, state).await),
        _ => unmatched(&path, &["/api/content/items", "/api/content/progress"]),
    }
}

/// GET /api/content/items - optional category/type equality filters
async fn get_items(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: ItemsQuery = parse_query(&req)?;

    let mut table_query = state.store.table("content_items");
    if let Some(ref category) = query.category {
        table_query = table_query.eq("category", category);
    }
    if let Some(ref item_type) = query.item_type {
        table_query = table_query.eq("type", item_type);
    }

    let rows = table_query.fetch().await?;
    Ok(rows_response(&rows))
}

/// POST /api/content/progress
async fn track_progress(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: ProgressQuery = parse_query(&req)?;

    match query.action.as_str() {
        "opened" => {
            let row = json!({
                "user_id": query.user_id,
                "content_id": query.content_id,
            });
            state.store.table("content_progress").insert(&row).await?;
        }
        "completed" => {
            state
                .store
                .table("content_progress")
                .eq("user_id", &query.user_id)
                .eq("content_id", &query.content_id)
                .update(&json!({ "completed_at": Utc::now().to_rfc3339() }))
                .await?;
        }
        other => {
            return Err(GatewayError::BadRequest(format!(
                "Invalid action '{}': expected 'opened' or 'completed'",
                other
            )));
        }
    }

    Ok(message_response("Progress tracked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_query_filters_are_optional() {
        let q: ItemsQuery = serde_urlencoded::from_str("").unwrap();
        assert!(q.category.is_none());
        assert!(q.item_type.is_none());

        let q: ItemsQuery = serde_urlencoded::from_str("category=sleep&type=article").unwrap();
        assert_eq!(q.category.as_deref(), Some("sleep"));
        assert_eq!(q.item_type.as_deref(), Some("article"));
    }

    #[test]
    fn test_progress_query_shape() {
        let q: ProgressQuery =
            serde_urlencoded::from_str("user_id=u1&content_id=c1&action=opened").unwrap();
        assert_eq!(q.action, "opened");
    }
}
