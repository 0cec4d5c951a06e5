//! Table API client
//!
//! Thin reqwest wrapper over the hosted backend's REST table interface
//! (PostgREST dialect). Each endpoint performs at most one insert, select,
//! update, or delete; the store's own schema constraints are the only
//! validation layer. Filters are equality (plus `gte` for time windows),
//! ordering is a single descending column, and results are raw JSON rows.

use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::types::{GatewayError, Result};

/// Client for the hosted table API
///
/// Built once at startup and injected through `AppState`; handlers never
/// construct their own.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl StoreClient {
    /// Create a new table API client
    pub fn new(base_url: &str, service_key: &str, timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| GatewayError::Store(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    /// Start a query against the named table
    pub fn table(&self, name: &str) -> TableQuery<'_> {
        TableQuery {
            client: self,
            table: name.to_string(),
            select: "*".to_string(),
            filters: Vec::new(),
            order_desc: None,
            limit: None,
        }
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }
}

/// One equality/range filter on a column
#[derive(Debug, Clone)]
struct Filter {
    column: String,
    op: &'static str,
    value: String,
}

impl Filter {
    fn pair(&self) -> (String, String) {
        (
            self.column.clone(),
            format!("{}.{}", self.op, urlencoding::encode(&self.value)),
        )
    }
}

/// Builder for a single table operation
pub struct TableQuery<'a> {
    client: &'a StoreClient,
    table: String,
    select: String,
    filters: Vec<Filter>,
    order_desc: Option<String>,
    limit: Option<u32>,
}

impl<'a> TableQuery<'a> {
    /// Restrict the returned columns (default `*`)
    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.to_string();
        self
    }

    /// Equality filter on a column
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op: "eq",
            value: value.to_string(),
        });
        self
    }

    /// Greater-or-equal filter (time windows)
    pub fn gte(mut self, column: &str, value: &str) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op: "gte",
            value: value.to_string(),
        });
        self
    }

    /// Sort by a column, newest first
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order_desc = Some(column.to_string());
        self
    }

    /// Cap the number of returned rows
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Query string for a select: filters + order + limit
    fn read_query_string(&self) -> String {
        let mut pairs: Vec<(String, String)> = vec![("select".into(), self.select.clone())];
        pairs.extend(self.filters.iter().map(Filter::pair));
        if let Some(ref col) = self.order_desc {
            pairs.push(("order".into(), format!("{}.desc", col)));
        }
        if let Some(n) = self.limit {
            pairs.push(("limit".into(), n.to_string()));
        }
        join_pairs(&pairs)
    }

    /// Query string for a mutation: filters only
    fn filter_query_string(&self) -> String {
        let pairs: Vec<(String, String)> = self.filters.iter().map(Filter::pair).collect();
        join_pairs(&pairs)
    }

    /// Fetch matching rows; an empty result is a valid outcome
    pub async fn fetch(self) -> Result<Vec<Value>> {
        let url = format!(
            "{}?{}",
            self.client.endpoint(&self.table),
            self.read_query_string()
        );
        debug!(table = %self.table, "store select");

        let resp = self
            .client
            .authed(self.client.http.get(&url))
            .send()
            .await
            .map_err(store_unreachable)?;

        expect_rows(resp).await
    }

    /// Insert one row, returning the inserted record(s) as echoed by the store
    pub async fn insert(self, row: &Value) -> Result<Vec<Value>> {
        let url = self.client.endpoint(&self.table);
        debug!(table = %self.table, "store insert");

        let resp = self
            .client
            .authed(self.client.http.post(&url))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .map_err(store_unreachable)?;

        expect_rows(resp).await
    }

    /// Patch the filtered rows with the supplied fields only
    pub async fn update(self, patch: &Value) -> Result<Vec<Value>> {
        let url = format!(
            "{}?{}",
            self.client.endpoint(&self.table),
            self.filter_query_string()
        );
        debug!(table = %self.table, "store update");

        let resp = self
            .client
            .authed(self.client.http.patch(&url))
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(store_unreachable)?;

        expect_rows(resp).await
    }

    /// Delete the filtered rows; matching zero rows is not an error
    pub async fn delete(self) -> Result<()> {
        let url = format!(
            "{}?{}",
            self.client.endpoint(&self.table),
            self.filter_query_string()
        );
        debug!(table = %self.table, "store delete");

        let resp = self
            .client
            .authed(self.client.http.delete(&url))
            .send()
            .await
            .map_err(store_unreachable)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(store_rejection(status, body));
        }
        Ok(())
    }
}

fn join_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn store_unreachable(e: reqwest::Error) -> GatewayError {
    GatewayError::Store(format!("Failed to reach store: {}", e))
}

fn store_rejection(status: reqwest::StatusCode, body: String) -> GatewayError {
    if body.is_empty() {
        GatewayError::Store(format!("Store request failed with status {}", status))
    } else {
        GatewayError::Store(body)
    }
}

/// Read a row-array response, surfacing store rejections verbatim
async fn expect_rows(resp: reqwest::Response) -> Result<Vec<Value>> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| GatewayError::Store(format!("Failed to read store response: {}", e)))?;

    if !status.is_success() {
        return Err(store_rejection(status, body));
    }

    if body.is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&body)
        .map_err(|e| GatewayError::Store(format!("Invalid store response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StoreClient {
        StoreClient::new("http://localhost:54321/", "test-key", 5_000).unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let c = client();
        assert_eq!(
            c.endpoint("profiles"),
            "http://localhost:54321/rest/v1/profiles"
        );
    }

    #[test]
    fn test_read_query_string_full() {
        let c = client();
        let q = c
            .table("emotion_events")
            .eq("user_id", "u1")
            .order_desc("timestamp")
            .limit(50);
        assert_eq!(
            q.read_query_string(),
            "select=*&user_id=eq.u1&order=timestamp.desc&limit=50"
        );
    }

    #[test]
    fn test_read_query_string_column_projection_and_gte() {
        let c = client();
        let q = c
            .table("symphony_posts")
            .select("emotion_label,color_code")
            .gte("timestamp", "2026-08-30T00:00:00+00:00")
            .order_desc("timestamp")
            .limit(100);
        assert_eq!(
            q.read_query_string(),
            "select=emotion_label,color_code&timestamp=gte.2026-08-30T00%3A00%3A00%2B00%3A00&order=timestamp.desc&limit=100"
        );
    }

    #[test]
    fn test_filter_query_string_owner_scope() {
        let c = client();
        let q = c.table("journal_entries").eq("id", "e1").eq("user_id", "u1");
        assert_eq!(q.filter_query_string(), "id=eq.e1&user_id=eq.u1");
    }

    #[test]
    fn test_filter_values_are_encoded() {
        let c = client();
        let q = c.table("profiles").eq("id", "a b&c");
        assert_eq!(q.filter_query_string(), "id=eq.a%20b%26c");
    }

    #[test]
    fn test_fetch_surfaces_unreachable_store() {
        // Nothing listens on this port; the error must come back as a
        // store failure, not a panic.
        let c = StoreClient::new("http://127.0.0.1:1", "test-key", 500).unwrap();
        let result = tokio_test::block_on(c.table("profiles").eq("id", "u1").fetch());
        match result {
            Err(GatewayError::Store(msg)) => assert!(msg.contains("Failed to reach store")),
            other => panic!("expected store error, got {:?}", other.map(|r| r.len())),
        }
    }
}
