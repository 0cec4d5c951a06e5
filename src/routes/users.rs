//! User profile routes
//!
//! - GET /api/users/me - fetch the profile for a user id (404 when absent)
//! - PUT /api/users/me - patch only the supplied profile fields
//!
//! The user_id arrives as a query parameter and is not verified against
//! the bearer token; ownership is the id filter on every operation.

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::routes::{
    json_response, or_error, parse_json_body, parse_query, route_path, unmatched, Body,
};
use crate::server::AppState;
use crate::types::{GatewayError, Result};

#[derive(Debug, Deserialize)]
struct UserQuery {
    user_id: String,
}

/// Partial profile update; absent fields stay untouched
#[derive(Debug, Default, Deserialize)]
struct ProfileUpdate {
    name: Option<String>,
    display_name: Option<String>,
    age: Option<i64>,
    gender: Option<String>,
    phone: Option<String>,
    place: Option<String>,
    location: Option<Value>,
}

impl ProfileUpdate {
    /// Only the explicitly supplied fields, as a patch object
    fn patch(&self) -> Map<String, Value> {
        let mut patch = Map::new();
        if let Some(ref v) = self.name {
            patch.insert("name".into(), json!(v));
        }
        if let Some(ref v) = self.display_name {
            patch.insert("display_name".into(), json!(v));
        }
        if let Some(v) = self.age {
            patch.insert("age".into(), json!(v));
        }
        if let Some(ref v) = self.gender {
            patch.insert("gender".into(), json!(v));
        }
        if let Some(ref v) = self.phone {
            patch.insert("phone".into(), json!(v));
        }
        if let Some(ref v) = self.place {
            patch.insert("place".into(), json!(v));
        }
        if let Some(ref v) = self.location {
            patch.insert("location".into(), v.clone());
        }
        patch
    }
}

/// Dispatch /api/users/* requests
pub async fn handle_users_request(req: Request<Incoming>, state: Arc<AppState>) -> Response<Body> {
    let path = route_path(&req);
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, "/api/users/me") => or_error(get_profile(req, state).await),
        (Method::PUT, "/api/users/me") => or_error(update_profile(req, state).await),
        _ => unmatched(&path, &["/api/users/me"]),
    }
}

/// GET /api/users/me
async fn get_profile(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: UserQuery = parse_query(&req)?;

    let rows = state
        .store
        .table("profiles")
        .eq("id", &query.user_id)
        .fetch()
        .await?;

    let profile = rows
        .into_iter()
        .next()
        .ok_or(GatewayError::NotFound("Profile"))?;

    Ok(json_response(StatusCode::OK, &profile))
}

/// PUT /api/users/me
async fn update_profile(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Body>> {
    let query: UserQuery = parse_query(&req)?;
    let update: ProfileUpdate = parse_json_body(req).await?;

    let patch = update.patch();
    let rows = if patch.is_empty() {
        // Nothing to apply; skip the store round trip
        Vec::new()
    } else {
        state
            .store
            .table("profiles")
            .eq("id", &query.user_id)
            .update(&Value::Object(patch))
            .await?
    };

    Ok(json_response(
        StatusCode::OK,
        &json!({ "message": "Profile updated", "data": rows }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_keeps_only_supplied_fields() {
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"display_name": "ada", "age": 30}"#).unwrap();
        let patch = update.patch();
        assert_eq!(patch.len(), 2);
        assert_eq!(patch["display_name"], "ada");
        assert_eq!(patch["age"], 30);
        assert!(!patch.contains_key("name"));
    }

    #[test]
    fn test_empty_body_yields_empty_patch() {
        let update: ProfileUpdate = serde_json::from_str("{}").unwrap();
        assert!(update.patch().is_empty());
    }

    #[test]
    fn test_location_passes_through_as_object() {
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"location": {"lat": 1.5, "lng": 2.5}}"#).unwrap();
        let patch = update.patch();
        assert_eq!(patch["location"]["lat"], 1.5);
    }
}
