//! Shared error types for the gateway
//!
//! Every route resolves to either a normal JSON payload or a `GatewayError`.
//! The error carries the underlying collaborator message verbatim; clients
//! distinguish outcomes by HTTP status plus the message field.

use hyper::StatusCode;
use thiserror::Error;

/// Gateway error taxonomy, mapped onto {400, 401, 404, 500}
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed request shape: bad query string, bad JSON body, unknown action
    #[error("{0}")]
    BadRequest(String),

    /// Sign-up rejected by the hosted auth service
    #[error("Registration failed")]
    RegistrationRejected,

    /// Password sign-in rejected
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Single-record lookup with no matching row
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Table API failure; the store's own message is passed through
    #[error("{0}")]
    Store(String),

    /// Auth service failure outside the credential cases
    #[error("{0}")]
    Auth(String),

    /// Inference service failure
    #[error("{0}")]
    Inference(String),

    /// Startup configuration failure; never surfaces over HTTP
    #[error("{0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// HTTP status for this error category
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) | GatewayError::RegistrationRejected => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Store(_)
            | GatewayError::Auth(_)
            | GatewayError::Inference(_)
            | GatewayError::Config(_)
            | GatewayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::BadRequest("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::RegistrationRejected.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::NotFound("Profile").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::Store("duplicate key".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_pass_through_verbatim() {
        let err = GatewayError::Store("duplicate key value violates unique constraint".into());
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
        assert_eq!(
            GatewayError::NotFound("Profile").to_string(),
            "Profile not found"
        );
    }
}
