//! Journal routes
//!
//! Entries are immutable once written; the only mutation is an owner-scoped
//! delete. Content arrives already encrypted by the client.

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

#[derive(Debug, Deserialize)]
struct ListQuery {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateQuery {
    user_id: String,
    encrypted_content: String,
    mood_tag: Option<String>,
    theme: Option<String>,
}

/// Dispatch /api/journal/* requests
pub async fn handle_journal_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, "/api/journal") => or_error(get_entries(req, state).await),
        (Method::POST, "/api/journal") => or_error(create_entry(req, state).await),
        (Method::DELETE, p) if p.starts_with("/api/journal/") => {
            let entry_id = p.trim_start_matches("/api/journal/").to_string();
            or_error(delete_entry(req, state, &entry_id).await)
        }
        _ => unmatched(&path, &["/api/journal", "/api/journal/"]),
    }
}

/// GET /api/journal - all entries for a user, newest first
async fn get_entries(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: ListQuery = parse_query(&req)?;

    let rows = state
        .store
        .table("journal_entries")
        .eq("user_id", &query.user_id)
        .order_desc("timestamp")
        .fetch()
        .await?;

    Ok(rows_response(&rows))
}

/// POST /api/journal - insert one entry
async fn create_entry(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: CreateQuery = parse_query(&req)?;

    let row = json!({
        "user_id": query.user_id,
        "encrypted_content": query.encrypted_content,
        "mood_tag": query.mood_tag,
        "theme": query.theme,
    });

    let rows = state.store.table("journal_entries").insert(&row).await?;
    Ok(rows_response(&rows))
}

/// DELETE /api/journal/{id} - owner-scoped; a non-owner delete is a no-op
/// that still gets the fixed acknowledgement
async fn delete_entry(
    req: Request<Incoming>,
    state: Arc<AppState>,
    entry_id: &str,
) -> Result<Response<Body>> {
    let query: ListQuery = parse_query(&req)?;

    state
        .store
        .table("journal_entries")
        .eq("id", entry_id)
        .eq("user_id", &query.user_id)
        .delete()
        .await?;

    Ok(message_response("Entry deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_query_optional_tags() {
        let q: CreateQuery =
            serde_urlencoded::from_str("user_id=u1&encrypted_content=abc123").unwrap();
        assert_eq!(q.user_id, "u1");
        assert!(q.mood_tag.is_none());
        assert!(q.theme.is_none());

        let q: CreateQuery =
            serde_urlencoded::from_str("user_id=u1&encrypted_content=abc&mood_tag=calm&theme=work")
                .unwrap();
        assert_eq!(q.mood_tag.as_deref(), Some("calm"));
        assert_eq!(q.theme.as_deref(), Some("work"));
    }

    #[test]
    fn test_create_query_requires_content() {
        let result: std::result::Result<CreateQuery, _> =
            serde_urlencoded::from_str("user_id=u1");
        assert!(result.is_err());
    }
}
