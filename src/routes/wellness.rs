//! Digital wellness routes
//!
//! One metric row per user per day: total screen minutes plus a free-form
//! per-app usage map. The usage payload is genuinely schema-less telemetry,
//! so it stays an open JSON object rather than a typed record.

use chrono::Utc;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use serde_json::{json, Map, Value};
use serde::Deserialize;
use std::sync::Arc;

use crate::routes::{
    or_error, parse_json_body, parse_query, route_path, rows_response, unmatched, Body,
};
use crate::server::AppState;
use crate::types::Result;

fn default_days() -> u32 {
    7
}

#[derive(Debug, Deserialize)]
struct MetricsQuery {
    user_id: String,
    #[serde(default = "default_days")]
    days: u32,
}

#[derive(Debug, Deserialize)]
struct SubmitQuery {
    user_id: String,
    daily_screen_minutes: i64,
}

/// Dispatch /api/digital-wellness/* requests
pub async fn handle_wellness_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, "/api/digital-wellness/metrics") => or_error(get_metrics(req, state).await),
        (Method::POST, "/api/digital-wellness/metrics") => {
            or_error(submit_metrics(req, state).await)
        }
        _ => unmatched(&path, &["/api/digital-wellness/metrics"]),
    }
}

/// GET /api/digital-wellness/metrics - one row per day, newest first
async fn get_metrics(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: MetricsQuery = parse_query(&req)?;

    let rows = state
        .store
        .table("digital_wellness")
        .eq("user_id", &query.user_id)
        .order_desc("date")
        .limit(query.days)
        .fetch()
        .await?;

    Ok(rows_response(&rows))
}

/// POST /api/digital-wellness/metrics - scalar fields in the query, the
/// app-usage map as the JSON body
async fn submit_metrics(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: SubmitQuery = parse_query(&req)?;
    let app_usage: Map<String, Value> = parse_json_body(req).await?;

    let row = json!({
        "user_id": query.user_id,
        "daily_screen_minutes": query.daily_screen_minutes,
        "app_usage_json": app_usage,
        "date": Utc::now().date_naive().to_string(),
    });

    let rows = state.store.table("digital_wellness").insert(&row).await?;
    Ok(rows_response(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_query_default_window() {
        let q: MetricsQuery = serde_urlencoded::from_str("user_id=u1").unwrap();
        assert_eq!(q.days, 7);

        let q: MetricsQuery = serde_urlencoded::from_str("user_id=u1&days=30").unwrap();
        assert_eq!(q.days, 30);
    }

    #[test]
    fn test_usage_payload_must_be_an_object() {
        let ok: std::result::Result<Map<String, Value>, _> =
            serde_json::from_str(r#"{"instagram": 42, "maps": 7}"#);
        assert!(ok.is_ok());

        let not_object: std::result::Result<Map<String, Value>, _> =
            serde_json::from_str("[1, 2, 3]");
        assert!(not_object.is_err());
    }
}
