//! Generative-language routes
//!
//! Each endpoint wraps one prompt shape around the shared inference
//! client. Scalar envelopes ("response", "summary") wrap free text;
//! the structured endpoints return the model's JSON directly.

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::routes::{json_response, or_error, parse_json_body, route_path, unmatched, Body};
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Deserialize)]
struct EmpatheticReplyRequest {
    user_message: String,
    #[serde(default)]
    conversation_history: Vec<Value>,
    #[serde(default)]
    user_context: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct JournalSummaryRequest {
    entries: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SuggestActionRequest {
    state: Value,
}

#[derive(Debug, Deserialize)]
struct ClassifyEmotionRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
struct DetectCrisisRequest {
    text: String,
}

/// Dispatch /api/gemini/* requests
pub async fn handle_gemini_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::POST, "/api/gemini/empathetic-reply") => {
            or_error(empathetic_reply(req, state).await)
        }
        (Method::POST, "/api/gemini/summarize-journal") => {
            or_error(summarize_journal(req, state).await)
        }
        (Method::POST, "/api/gemini/suggest-action") => or_error(suggest_action(req, state).await),
        (Method::POST, "/api/gemini/classify-emotion") => {
            or_error(classify_emotion(req, state).await)
        }
        (Method::POST, "/api/gemini/detect-crisis") => or_error(detect_crisis(req, state).await),
        _ => unmatched(
            &path,
            &[
                "/api/gemini/empathetic-reply",
                "/api/gemini/summarize-journal",
                "/api/gemini/suggest-action",
                "/api/gemini/classify-emotion",
                "/api/gemini/detect-crisis",
            ],
        ),
    }
}

/// POST /api/gemini/empathetic-reply
async fn empathetic_reply(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let body: EmpatheticReplyRequest = parse_json_body(req).await?;

    let text = state
        .gemini
        .empathetic_reply(
            &body.user_message,
            &body.conversation_history,
            &body.user_context,
        )
        .await?;

    Ok(json_response(StatusCode::OK, &json!({ "response": text })))
}

/// POST /api/gemini/summarize-journal
async fn summarize_journal(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let body: JournalSummaryRequest = parse_json_body(req).await?;
    let text = state.gemini.summarize_journal(&body.entries).await?;
    Ok(json_response(StatusCode::OK, &json!({ "summary": text })))
}

/// POST /api/gemini/suggest-action
async fn suggest_action(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let body: SuggestActionRequest = parse_json_body(req).await?;
    let suggestion = state.gemini.suggest_action(&body.state).await?;
    Ok(json_response(StatusCode::OK, &suggestion))
}

/// POST /api/gemini/classify-emotion
async fn classify_emotion(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let body: ClassifyEmotionRequest = parse_json_body(req).await?;
    let classification = state.gemini.classify_emotion(&body.text).await?;
    Ok(json_response(StatusCode::OK, &classification))
}

/// POST /api/gemini/detect-crisis
async fn detect_crisis(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let body: DetectCrisisRequest = parse_json_body(req).await?;
    let assessment = state.gemini.detect_crisis(&body.text).await?;
    Ok(json_response(StatusCode::OK, &assessment))
}
