//! Auth API client
//!
//! Delegates identity management to the hosted auth service (GoTrue
//! dialect). The gateway never stores or verifies credentials itself; it
//! forwards email/password pairs and relays the issued bearer session.

use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::types::{GatewayError, Result};

/// Bearer session issued by the auth service on sign-in
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    /// User object exactly as the auth service returned it
    pub user: Value,
}

/// Client for the hosted auth API
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl AuthClient {
    /// Create a new auth API client
    pub fn new(base_url: &str, service_key: &str, timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| GatewayError::Auth(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    /// Create a new auth identity; returns the new subject id
    ///
    /// Any rejection from the auth service (duplicate email, weak password)
    /// surfaces as the distinct registration-rejected category.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<String> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        debug!(%email, "auth sign-up");

        let resp = self
            .authed(self.http.post(&url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| GatewayError::Auth(format!("Failed to reach auth service: {}", e)))?;

        let status = resp.status();
        let body: Value = match resp.json().await {
            Ok(v) => v,
            Err(_) => Value::Null,
        };

        if status.is_client_error() {
            return Err(GatewayError::RegistrationRejected);
        }
        if !status.is_success() {
            return Err(GatewayError::Auth(format!(
                "Auth service sign-up failed with status {}",
                status
            )));
        }

        subject_id(&body).ok_or(GatewayError::RegistrationRejected)
    }

    /// Password sign-in; returns the bearer session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        debug!(%email, "auth sign-in");

        let resp = self
            .authed(self.http.post(&url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| GatewayError::Auth(format!("Failed to reach auth service: {}", e)))?;

        let status = resp.status();
        if status.is_client_error() {
            return Err(GatewayError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(GatewayError::Auth(format!(
                "Auth service sign-in failed with status {}",
                status
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| GatewayError::Auth(format!("Invalid auth response: {}", e)))?;

        let access_token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or(GatewayError::InvalidCredentials)?
            .to_string();

        Ok(Session {
            access_token,
            user: body.get("user").cloned().unwrap_or(Value::Null),
        })
    }
}

/// Extract the subject id from a sign-up response
///
/// The auth service returns either the user object directly or a session
/// wrapper with a nested `user`, depending on confirmation settings.
fn subject_id(body: &Value) -> Option<String> {
    body.get("id")
        .or_else(|| body.pointer("/user/id"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_id_top_level() {
        let body = json!({ "id": "u-123", "email": "ada@x.com" });
        assert_eq!(subject_id(&body), Some("u-123".to_string()));
    }

    #[test]
    fn test_subject_id_nested_user() {
        let body = json!({ "access_token": "t", "user": { "id": "u-456" } });
        assert_eq!(subject_id(&body), Some("u-456".to_string()));
    }

    #[test]
    fn test_subject_id_missing() {
        assert_eq!(subject_id(&json!({ "msg": "nope" })), None);
        assert_eq!(subject_id(&Value::Null), None);
    }
}
