/// HTTP client for the Multi-Management Platform backend.
///
/// Communicates with the backend REST API using the synchronous `ureq`
/// client. Provides:
///
/// - **get/post**: single-attempt JSON requests that attach an
///   `Authorization: Bearer <token>` header when a token is present and
///   otherwise go out unauthenticated (the backend rejects those).
/// - **Wire types** for every consumed endpoint.
///
/// No retry, no circuit breaking — one request, one attempt. A non-2xx
/// response fails with an error carrying the HTTP status and response
/// body; no structured error parsing happens beyond that.
pub mod activity;

use std::time::Instant;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::FetchCache;
use crate::config::MmpConfig;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response body from `POST /auth/login`.
///
/// The token is a compact three-segment structure; its middle segment
/// carries the JSON claims (see [`crate::session::token`]).
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Response body from `GET /analytics/{system}`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsResponse {
    #[serde(default)]
    pub series: Vec<AnalyticsRow>,
}

/// One aggregate row: a (month, type) group and its count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsRow {
    #[serde(rename = "_id")]
    pub group: AnalyticsGroup,
    pub count: u64,
}

/// Group key of an analytics row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsGroup {
    pub month: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A resource record: an id plus a schemaless data payload.
///
/// The key set of `data` varies per record; the table layer derives its
/// column set structurally from whatever keys are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Request body for `POST /systems/{system}/{type}/query`.
#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub filter: &'a Value,
    pub limit: usize,
}

/// Request body for `POST /systems/{system}/{type}`.
#[derive(Debug, Serialize)]
pub struct CreateRequest<'a> {
    pub system: &'a str,
    #[serde(rename = "type")]
    pub resource_type: &'a str,
    pub data: &'a Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous backend HTTP client.
///
/// Built from the resolved config plus an optional session token and
/// reused for the lifetime of a single invocation or console session.
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    log_enabled: bool,
}

impl ApiClient {
    /// Build an unauthenticated client (used for login).
    pub fn from_config(config: &MmpConfig) -> Self {
        Self {
            base_url: config.backend.base_url.trim_end_matches('/').to_string(),
            token: None,
            log_enabled: config.logging.enabled,
        }
    }

    /// Build a client that attaches a bearer token to every request.
    pub fn with_token(config: &MmpConfig, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::from_config(config)
        }
    }

    /// Issue a GET request and parse the JSON response.
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = ureq::get(&url);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let started = Instant::now();
        let result = request.call();
        self.log("GET", path, status_of(&result), started);

        into_payload(result, "GET", path)
    }

    /// Issue a POST request with a JSON body and parse the JSON response.
    pub fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = ureq::post(&url);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let started = Instant::now();
        let result = request.send_json(body);
        self.log("POST", path, status_of(&result), started);

        into_payload(result, "POST", path)
    }

    /// Check whether the backend answers HTTP at all.
    ///
    /// Any HTTP response — including an auth rejection — counts as
    /// reachable; only transport failures do not.
    pub fn is_reachable(&self) -> bool {
        let url = format!("{}/systems", self.base_url);
        match ureq::get(&url).call() {
            Ok(_) | Err(ureq::Error::Status(..)) => true,
            Err(_) => false,
        }
    }

    /// Record an activity-log entry for a completed request.
    fn log(&self, method: &str, path: &str, status: Option<u16>, started: Instant) {
        if self.log_enabled {
            activity::record(method, path, status, started.elapsed().as_millis() as u64);
        }
    }
}

// ---------------------------------------------------------------------------
// Cached fetches
// ---------------------------------------------------------------------------

/// Fetch the list of system names, served from cache on repeated reads.
pub fn fetch_systems(client: &ApiClient, cache: &mut FetchCache) -> Result<Vec<String>> {
    let value = cache.get_or_fetch(&crate::cache::systems_key(), || client.get("/systems"))?;
    serde_json::from_value(value).context("unexpected systems response shape")
}

/// Fetch a system's analytics rows, served from cache on repeated reads.
pub fn fetch_analytics(
    client: &ApiClient,
    cache: &mut FetchCache,
    system: &str,
) -> Result<Vec<AnalyticsRow>> {
    let value = cache.get_or_fetch(&crate::cache::analytics_key(system), || {
        client.get(&format!("/analytics/{system}"))
    })?;
    let response: AnalyticsResponse =
        serde_json::from_value(value).context("unexpected analytics response shape")?;
    Ok(response.series)
}

/// Extract the HTTP status from a ureq result, if a response came back.
fn status_of(result: &Result<ureq::Response, ureq::Error>) -> Option<u16> {
    match result {
        Ok(resp) => Some(resp.status()),
        Err(ureq::Error::Status(code, _)) => Some(*code),
        Err(_) => None,
    }
}

/// Turn a ureq result into a parsed payload or an error carrying the
/// HTTP status and response body.
fn into_payload<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
    method: &str,
    path: &str,
) -> Result<T> {
    match result {
        Ok(resp) => resp
            .into_json()
            .with_context(|| format!("failed to parse response of {method} {path}")),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            anyhow::bail!("{method} {path} failed with status {code}: {body}")
        }
        Err(e) => Err(e).with_context(|| format!("{method} {path} request failed")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_strips_trailing_slash() {
        let mut config = MmpConfig::default();
        config.backend.base_url = "http://localhost:8000/".to_string();
        let client = ApiClient::from_config(&config);
        assert_eq!(client.base_url, "http://localhost:8000");
        assert!(client.token.is_none());
    }

    #[test]
    fn with_token_keeps_base_url() {
        let config = MmpConfig::default();
        let client = ApiClient::with_token(&config, "abc");
        assert_eq!(client.base_url, "http://localhost:8000");
        assert_eq!(client.token.as_deref(), Some("abc"));
    }

    #[test]
    fn analytics_row_deserializes_wire_shape() {
        let row: AnalyticsRow =
            serde_json::from_str(r#"{"_id":{"month":3,"type":"student"},"count":5}"#).unwrap();
        assert_eq!(row.group.month, 3);
        assert_eq!(row.group.kind, "student");
        assert_eq!(row.count, 5);
    }

    #[test]
    fn resource_record_defaults_missing_data() {
        let record: ResourceRecord = serde_json::from_str(r#"{"id":"r1"}"#).unwrap();
        assert_eq!(record.id, "r1");
        assert!(record.data.is_empty());
    }

    #[test]
    fn create_request_serializes_type_key() {
        let data = Map::new();
        let req = CreateRequest {
            system: "alpha",
            resource_type: "student",
            data: &data,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""type":"student""#));
        assert!(json.contains(r#""system":"alpha""#));
    }

    #[test]
    fn query_request_serializes_filter_and_limit() {
        let filter = serde_json::json!({"data.name": "Alice"});
        let req = QueryRequest {
            filter: &filter,
            limit: 50,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""limit":50"#));
        assert!(json.contains(r#""data.name":"Alice""#));
    }
}
