//! HTTP routes for the MindMate gateway
//!
//! One module per resource group; each exposes a `handle_*_request`
//! dispatcher that matches method and path the same way for every group.
//! Shared request/response plumbing lives here.

pub mod auth_routes;
pub mod braingym;
pub mod content;
pub mod emotion;
pub mod feelhear;
pub mod gemini_routes;
pub mod health;
pub mod journal;
pub mod meditation;
pub mod symphony;
pub mod therapy;
pub mod users;
pub mod wellness;

pub use auth_routes::handle_auth_request;
pub use braingym::handle_braingym_request;
pub use content::handle_content_request;
pub use emotion::handle_emotion_request;
pub use feelhear::handle_feelhear_request;
pub use gemini_routes::handle_gemini_request;
pub use health::{health_check, root_info};
pub use journal::handle_journal_request;
pub use meditation::handle_meditation_request;
pub use symphony::handle_symphony_request;
pub use therapy::handle_therapy_request;
pub use users::handle_users_request;
pub use wellness::handle_wellness_request;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::types::{GatewayError, Result};

/// Response body type shared by all routes
pub type Body = Full<Bytes>;

/// Largest accepted request body; all real payloads here are small JSON
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Serialize a payload into a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

/// Fixed `{"message": ...}` acknowledgement
pub fn message_response(message: &str) -> Response<Body> {
    json_response(StatusCode::OK, &json!({ "message": message }))
}

/// Raw record rows, exactly as the store echoed them
pub fn rows_response(rows: &[Value]) -> Response<Body> {
    json_response(StatusCode::OK, &rows)
}

/// Error envelope: status from the taxonomy, message passed through
pub fn error_response(err: &GatewayError) -> Response<Body> {
    json_response(err.status(), &json!({ "detail": err.to_string() }))
}

/// Collapse a handler result into a response
pub fn or_error(result: Result<Response<Body>>) -> Response<Body> {
    result.unwrap_or_else(|e| error_response(&e))
}

pub fn not_found(path: &str) -> Response<Body> {
    json_response(
        StatusCode::NOT_FOUND,
        &json!({ "detail": "Not Found", "path": path }),
    )
}

pub fn method_not_allowed() -> Response<Body> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &json!({ "detail": "Method not allowed" }),
    )
}

/// Terminal dispatch arm: a known path hit with the wrong method is 405,
/// anything else is 404. Entries ending in '/' match as prefixes.
pub fn unmatched(path: &str, known: &[&str]) -> Response<Body> {
    let known_path = known
        .iter()
        .any(|k| path == *k || (k.ends_with('/') && path.starts_with(k)));

    if known_path {
        method_not_allowed()
    } else {
        not_found(path)
    }
}

/// Deserialize the query string into a typed per-route struct
pub fn parse_query<T: DeserializeOwned>(req: &Request<Incoming>) -> Result<T> {
    let query = req.uri().query().unwrap_or("");
    serde_urlencoded::from_str(query)
        .map_err(|e| GatewayError::BadRequest(format!("Invalid query parameters: {}", e)))
}

/// Read and deserialize a JSON request body
///
/// The stream is capped while it is read; an oversized body is rejected
/// without ever being buffered whole.
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T>
where
    T: DeserializeOwned,
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                GatewayError::BadRequest("Request body too large".into())
            } else {
                GatewayError::BadRequest(format!("Failed to read body: {}", e))
            }
        })?;

    serde_json::from_slice(&body.to_bytes())
        .map_err(|e| GatewayError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Path without its query string
pub fn route_path(req: &Request<Incoming>) -> String {
    req.uri().path().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct ScoreQuery {
        user_id: String,
        game_type: String,
        score: i64,
    }

    #[test]
    fn test_query_struct_roundtrip() {
        let q: ScoreQuery =
            serde_urlencoded::from_str("user_id=u1&game_type=recall&score=42").unwrap();
        assert_eq!(q.user_id, "u1");
        assert_eq!(q.game_type, "recall");
        assert_eq!(q.score, 42);
    }

    #[test]
    fn test_query_struct_rejects_bad_int() {
        let result: std::result::Result<ScoreQuery, _> =
            serde_urlencoded::from_str("user_id=u1&game_type=recall&score=forty");
        assert!(result.is_err());
    }

    #[test]
    fn test_error_envelope_shape() {
        let resp = error_response(&GatewayError::NotFound("Profile"));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_unmatched_known_path_is_405() {
        let known = ["/api/journal", "/api/journal/"];
        assert_eq!(
            unmatched("/api/journal", &known).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        // prefix entries cover id-bearing subpaths
        assert_eq!(
            unmatched("/api/journal/e1", &known).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_unmatched_unknown_path_is_404() {
        let known = ["/api/journal", "/api/journal/"];
        assert_eq!(
            unmatched("/api/journals", &known).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(unmatched("/api/nope", &known).status(), StatusCode::NOT_FOUND);
    }

    #[derive(Debug, Deserialize)]
    struct TextBody {
        text: String,
    }

    fn json_request(body: String) -> Request<Full<Bytes>> {
        Request::builder()
            .method("POST")
            .uri("/x")
            .body(Full::new(Bytes::from(body)))
            .unwrap()
    }

    #[test]
    fn test_json_body_parses_within_cap() {
        let req = json_request(r#"{"text": "hello"}"#.to_string());
        let parsed: TextBody = tokio_test::block_on(parse_json_body(req)).unwrap();
        assert_eq!(parsed.text, "hello");
    }

    #[test]
    fn test_oversized_body_is_refused() {
        let big = format!(r#"{{"text": "{}"}}"#, "a".repeat(MAX_BODY_BYTES + 1));
        let req = json_request(big);
        let err = tokio_test::block_on(parse_json_body::<TextBody, _>(req)).unwrap_err();
        match err {
            GatewayError::BadRequest(msg) => assert_eq!(msg, "Request body too large"),
            other => panic!("expected bad request, got {:?}", other),
        }
    }
}
