//! Symphony routes
//!
//! A shared, anonymous emotion wall: users contribute labeled posts, and
//! the aggregate endpoint tallies labels across the most recent posts
//! inside the requested time window.

use chrono::{DateTime, Duration, Utc};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::routes::{
    json_response, or_error, parse_query, route_path, rows_response, unmatched, Body,
};
use crate::server::AppState;
use crate::types::Result;

/// Cap on posts fetched for an aggregation pass
const AGGREGATE_FETCH_LIMIT: u32 = 100;

/// Raw posts echoed back alongside the tally
const AGGREGATE_PREVIEW_LIMIT: usize = 20;

fn default_timeframe() -> String {
    "today".to_string()
}

#[derive(Debug, Deserialize)]
struct ContributeQuery {
    user_id: String,
    emotion_label: String,
    short_text: Option<String>,
    color_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggregateQuery {
    #[serde(default = "default_timeframe")]
    timeframe: String,
}

/// Dispatch /api/symphony/* requests
pub async fn handle_symphony_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::POST, "/api/symphony/contribute") => or_error(contribute(req, state).await),
        (Method::GET, "/api/symphony/aggregate") => or_error(get_aggregate(req, state).await),
        _ => unmatched(&path, &["/api/symphony/contribute", "/api/symphony/aggregate"]),
    }
}

/// POST /api/symphony/contribute
async fn contribute(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: ContributeQuery = parse_query(&req)?;

    let row = json!({
        "user_id": query.user_id,
        "emotion_label": query.emotion_label,
        "short_text": query.short_text,
        "color_code": query.color_code,
    });

    let rows = state.store.table("symphony_posts").insert(&row).await?;
    Ok(rows_response(&rows))
}

/// GET /api/symphony/aggregate
///
/// Fetches the most recent posts inside the requested window, tallies
/// emotion labels in one pass, and returns the tally plus a truncated
/// preview of the raw posts.
async fn get_aggregate(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: AggregateQuery = parse_query(&req)?;

    let mut table_query = state
        .store
        .table("symphony_posts")
        .select("emotion_label,color_code")
        .order_desc("timestamp")
        .limit(AGGREGATE_FETCH_LIMIT);

    if let Some(start) = timeframe_start(&query.timeframe, Utc::now()) {
        table_query = table_query.gte("timestamp", &start.to_rfc3339());
    }

    let posts = table_query.fetch().await?;
    let emotions = aggregate_emotions(&posts);
    let preview: Vec<&Value> = posts.iter().take(AGGREGATE_PREVIEW_LIMIT).collect();

    Ok(json_response(
        StatusCode::OK,
        &json!({
            "emotions": emotions,
            "total": posts.len(),
            "posts": preview,
        }),
    ))
}

/// Window start for a timeframe; `None` means unbounded
///
/// Unknown values fall back to "today" rather than silently widening the
/// window.
fn timeframe_start(timeframe: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match timeframe {
        "all" => None,
        "week" => Some(now - Duration::days(7)),
        "month" => Some(now - Duration::days(30)),
        // "today" and anything unrecognized
        _ => now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|start| start.and_utc()),
    }
}

/// Frequency map from emotion label to count, single linear pass
fn aggregate_emotions(posts: &[Value]) -> BTreeMap<String, u64> {
    let mut emotions = BTreeMap::new();
    for post in posts {
        if let Some(label) = post.get("emotion_label").and_then(|v| v.as_str()) {
            *emotions.entry(label.to_string()).or_insert(0) += 1;
        }
    }
    emotions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_aggregate_counts_labels() {
        let posts = vec![
            json!({ "emotion_label": "joy", "color_code": "#ffd700" }),
            json!({ "emotion_label": "joy", "color_code": "#ffcc00" }),
            json!({ "emotion_label": "sad", "color_code": "#4169e1" }),
        ];

        let emotions = aggregate_emotions(&posts);
        assert_eq!(emotions.get("joy"), Some(&2));
        assert_eq!(emotions.get("sad"), Some(&1));
        assert_eq!(emotions.len(), 2);
    }

    #[test]
    fn test_aggregate_skips_unlabeled_posts() {
        let posts = vec![json!({ "color_code": "#fff" }), json!({ "emotion_label": "calm" })];
        let emotions = aggregate_emotions(&posts);
        assert_eq!(emotions.get("calm"), Some(&1));
        assert_eq!(emotions.len(), 1);
    }

    #[test]
    fn test_aggregate_empty_input() {
        assert!(aggregate_emotions(&[]).is_empty());
    }

    #[test]
    fn test_timeframe_today_starts_at_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 15, 45, 0).unwrap();
        let start = timeframe_start("today", now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 30, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_timeframe_week_and_month_windows() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        assert_eq!(
            timeframe_start("week", now).unwrap(),
            Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap()
        );
        assert_eq!(
            timeframe_start("month", now).unwrap(),
            Utc.with_ymd_and_hms(2026, 7, 31, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_timeframe_all_is_unbounded() {
        let now = Utc::now();
        assert!(timeframe_start("all", now).is_none());
    }

    #[test]
    fn test_unknown_timeframe_falls_back_to_today() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();
        assert_eq!(
            timeframe_start("fortnight", now),
            timeframe_start("today", now)
        );
    }
}
