//! Authentication routes
//!
//! - POST /api/auth/register - create auth identity + profile row
//! - POST /api/auth/login    - password sign-in, sets the session cookie
//! - POST /api/auth/logout   - clears the session cookie (idempotent)
//! - POST /api/auth/refresh  - placeholder, no-op
//!
//! Identity management is fully delegated to the hosted auth service; the
//! gateway only relays credentials and the issued bearer token. The
//! register flow is the one two-step write in the system (identity, then
//! profile row) and is intentionally non-transactional: a profile insert
//! failure after a successful sign-up leaves an orphaned identity behind.

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::routes::{
    json_response, message_response, or_error, parse_json_body, route_path, unmatched, Body,
};
use crate::server::AppState;
use crate::types::Result;

/// Session cookie lifetime, matching the issued token's one-hour expiry
const COOKIE_MAX_AGE_SECONDS: u64 = 3600;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    username: String,
    email: String,
    password: String,
    user_type: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Dispatch /api/auth/* requests
pub async fn handle_auth_request(req: Request<Incoming>, state: Arc<AppState>) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::POST, "/api/auth/register") => or_error(handle_register(req, state).await),
        (Method::POST, "/api/auth/login") => or_error(handle_login(req, state).await),
        (Method::POST, "/api/auth/logout") => handle_logout(),
        (Method::POST, "/api/auth/refresh") => handle_refresh(),
        _ => unmatched(
            &path,
            &[
                "/api/auth/register",
                "/api/auth/login",
                "/api/auth/logout",
                "/api/auth/refresh",
            ],
        ),
    }
}

/// POST /api/auth/register
///
/// Creates the auth identity, then inserts the profile row keyed by the new
/// subject id with the username as display name.
async fn handle_register(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let body: RegisterRequest = parse_json_body(req).await?;

    let user_id = state.auth.sign_up(&body.email, &body.password).await?;

    let profile = json!({
        "id": user_id,
        "name": body.name,
        "display_name": body.username,
        "user_type": body.user_type,
    });

    if let Err(e) = state.store.table("profiles").insert(&profile).await {
        // The identity already exists at this point; the window is accepted
        // behavior, but worth a trace for reconciliation.
        warn!(%user_id, "profile insert failed after sign-up: {}", e);
        return Err(e);
    }

    info!(%user_id, email = %body.email, "registered new user");

    Ok(json_response(
        StatusCode::OK,
        &json!({
            "message": "Registration successful",
            "user": {
                "id": user_id,
                "email": body.email,
                "name": body.name,
            }
        }),
    ))
}

/// POST /api/auth/login
async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let body: LoginRequest = parse_json_body(req).await?;

    let session = state.auth.sign_in(&body.email, &body.password).await?;

    info!(email = %body.email, "login successful");

    let payload = json!({
        "message": "Login successful",
        "access_token": session.access_token,
        "user": session.user,
    });

    let mut response = json_response(StatusCode::OK, &payload);
    if let Ok(cookie) = session_cookie(&session.access_token).parse() {
        response.headers_mut().insert(hyper::header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// POST /api/auth/logout
///
/// Always succeeds; clearing an absent cookie is a no-op.
fn handle_logout() -> Response<Body> {
    let mut response = message_response("Logout successful");
    if let Ok(cookie) = clear_session_cookie().parse() {
        response.headers_mut().insert(hyper::header::SET_COOKIE, cookie);
    }
    response
}

/// POST /api/auth/refresh - placeholder with a fixed acknowledgement
fn handle_refresh() -> Response<Body> {
    message_response("Token refreshed")
}

fn session_cookie(token: &str) -> String {
    format!(
        "access_token={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=Lax",
        token, COOKIE_MAX_AGE_SECONDS
    )
}

fn clear_session_cookie() -> String {
    "access_token=; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=Lax".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok-123");
        assert!(cookie.starts_with("access_token=tok-123;"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie();
        assert!(cookie.starts_with("access_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let first = handle_logout();
        let second = handle_logout();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(
            first.headers().get(hyper::header::SET_COOKIE),
            second.headers().get(hyper::header::SET_COOKIE)
        );
    }

    #[test]
    fn test_register_body_requires_all_fields() {
        let result: std::result::Result<RegisterRequest, _> =
            serde_json::from_str(r#"{"name": "Ada", "email": "ada@x.com"}"#);
        assert!(result.is_err());

        let ok: RegisterRequest = serde_json::from_str(
            r#"{"name":"Ada","username":"ada","email":"ada@x.com","password":"secret1","user_type":"client"}"#,
        )
        .unwrap();
        assert_eq!(ok.username, "ada");
    }
}
