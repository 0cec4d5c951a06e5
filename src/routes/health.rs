//! Root and health endpoints

use hyper::{Response, StatusCode};
use serde_json::json;

use crate::routes::{json_response, Body};

/// GET / - service banner
pub fn root_info() -> Response<Body> {
    json_response(
        StatusCode::OK,
        &json!({
            "message": "MindMate API",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// GET /health - liveness probe, 200 whenever the process is serving
pub fn health_check() -> Response<Body> {
    json_response(StatusCode::OK, &json!({ "status": "healthy" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_is_ok() {
        assert_eq!(health_check().status(), StatusCode::OK);
    }

    #[test]
    fn test_root_is_ok() {
        assert_eq!(root_info().status(), StatusCode::OK);
    }
}
