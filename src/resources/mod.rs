//! Generic resource browser — query and create loosely-typed records.
//!
//! A system holds arbitrary, backend-defined resource types (e.g.
//! "student") with schemaless `data` payloads. Queries take a user-typed
//! JSON filter with dot-addressed field paths (`{"data.name": "Alice"}`)
//! and a fixed page size; results render as a dynamic table whose column
//! set is the union of keys across the currently loaded rows.
//!
//! User-typed JSON (filter or create payload) is parsed BEFORE any
//! network dispatch — a broken filter is never sent, and a broken create
//! payload issues no request and leaves the current result set alone.

use std::collections::HashSet;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::api::{ApiClient, CreateRequest, QueryRequest, ResourceRecord};
use crate::cache::{self, FetchCache};

/// Fixed page size for resource queries.
pub const PAGE_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// User-typed JSON parsing
// ---------------------------------------------------------------------------

/// Parse the user-typed filter text.
///
/// Empty text means "match everything" (`{}`); anything else must be
/// valid JSON.
pub fn parse_filter(filter_text: &str) -> Result<Value> {
    if filter_text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(filter_text).context("filter is not valid JSON")
}

/// Parse the user-typed create payload.
///
/// Must be a JSON object — the record's `data` mapping.
pub fn parse_data(data_json: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(data_json).context("data payload is not a valid JSON object")
}

// ---------------------------------------------------------------------------
// Result set
// ---------------------------------------------------------------------------

/// A page of records plus the column set derived from it.
///
/// Columns are recomputed from the current result set every time it
/// changes — never persisted or merged across queries, so a record whose
/// unique field is filtered out of view takes its column with it.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub records: Vec<ResourceRecord>,
    pub columns: Vec<String>,
}

impl ResultSet {
    pub fn from_records(records: Vec<ResourceRecord>) -> Self {
        let columns = columns(&records);
        Self { records, columns }
    }
}

/// Union of all keys across all rows' `data` maps, in first-seen order.
pub fn columns(records: &[ResourceRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cols = Vec::new();
    for record in records {
        for key in record.data.keys() {
            if seen.insert(key.clone()) {
                cols.push(key.clone());
            }
        }
    }
    cols
}

/// Rendered text of one cell.
///
/// Missing keys (and JSON nulls) render as an empty string, never an
/// error; strings render bare; other values render as compact JSON.
pub fn cell(record: &ResourceRecord, column: &str) -> String {
    match record.data.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Search / create
// ---------------------------------------------------------------------------

/// Query records of one type within a system.
///
/// The filter text is parsed up front (a parse failure never reaches the
/// network), then the query goes through the fetch cache — a repeated
/// read for the same system/type/filter is served without a request.
pub fn search(
    client: &ApiClient,
    cache: &mut FetchCache,
    system: &str,
    resource_type: &str,
    filter_text: &str,
) -> Result<ResultSet> {
    let filter = parse_filter(filter_text)?;

    let key = cache::resources_key(system, resource_type, filter_text);
    let value = cache.get_or_fetch(&key, || {
        client.post(
            &format!("/systems/{system}/{resource_type}/query"),
            &QueryRequest {
                filter: &filter,
                limit: PAGE_LIMIT,
            },
        )
    })?;

    let records: Vec<ResourceRecord> =
        serde_json::from_value(value).context("unexpected query response shape")?;

    Ok(ResultSet::from_records(records))
}

/// Outcome of a create: the backend's created record plus the refreshed
/// result set.
#[derive(Debug)]
pub struct CreateOutcome {
    pub created: Value,
    pub results: ResultSet,
}

/// Create a record, then re-run the current query so it appears.
///
/// Exactly one write request followed by one read request for the same
/// system/type/filter: the dependent cache entry is invalidated and
/// [`search`] re-fetches. The two are not atomic — the re-fetch is a
/// plain trailing read.
pub fn create(
    client: &ApiClient,
    cache: &mut FetchCache,
    system: &str,
    resource_type: &str,
    filter_text: &str,
    data_json: &str,
) -> Result<CreateOutcome> {
    let data = parse_data(data_json)?;

    let created: Value = client.post(
        &format!("/systems/{system}/{resource_type}"),
        &CreateRequest {
            system,
            resource_type,
            data: &data,
        },
    )?;

    cache.invalidate(&cache::resources_key(system, resource_type, filter_text));
    let results = search(client, cache, system, resource_type, filter_text)?;

    Ok(CreateOutcome { created, results })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, data: Value) -> ResourceRecord {
        serde_json::from_value(json!({ "id": id, "data": data })).unwrap()
    }

    #[test]
    fn columns_are_the_union_of_data_keys() {
        let records = vec![
            record("1", json!({"name": "Alice"})),
            record("2", json!({"age": 9})),
        ];
        let cols = columns(&records);
        assert_eq!(cols, vec!["name", "age"]);
    }

    #[test]
    fn missing_key_renders_as_empty_string() {
        let records = vec![
            record("1", json!({"name": "Alice"})),
            record("2", json!({"age": 9})),
        ];
        assert_eq!(cell(&records[0], "age"), "");
        assert_eq!(cell(&records[1], "age"), "9");
        assert_eq!(cell(&records[0], "name"), "Alice");
    }

    #[test]
    fn columns_keep_first_seen_order_across_rows() {
        let records = vec![
            record("1", json!({"zip": "10115"})),
            record("2", json!({"age": 9, "zip": "10117"})),
        ];
        // "zip" was seen in row 1, so it stays ahead of "age" even
        // though "age" sorts first
        let cols = columns(&records);
        assert_eq!(cols, vec!["zip", "age"]);
    }

    #[test]
    fn columns_of_empty_result_set_are_empty() {
        assert!(columns(&[]).is_empty());
        let set = ResultSet::from_records(Vec::new());
        assert!(set.columns.is_empty());
    }

    #[test]
    fn null_and_nested_values_render() {
        let records = vec![record(
            "1",
            json!({"note": null, "tags": ["a", "b"], "meta": {"k": 1}}),
        )];
        assert_eq!(cell(&records[0], "note"), "");
        assert_eq!(cell(&records[0], "tags"), r#"["a","b"]"#);
        assert_eq!(cell(&records[0], "meta"), r#"{"k":1}"#);
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert_eq!(parse_filter("").unwrap(), json!({}));
        assert_eq!(parse_filter("   ").unwrap(), json!({}));
    }

    #[test]
    fn filter_accepts_dot_addressed_paths() {
        let filter = parse_filter(r#"{"data.name": "Alice"}"#).unwrap();
        assert_eq!(filter, json!({"data.name": "Alice"}));
    }

    #[test]
    fn malformed_filter_fails_before_network() {
        assert!(parse_filter("{name:}").is_err());
        assert!(parse_filter("{").is_err());
    }

    #[test]
    fn malformed_data_fails() {
        assert!(parse_data("{name:}").is_err());
        // Non-object payloads are rejected too — data is a mapping
        assert!(parse_data("42").is_err());
        assert!(parse_data(r#""text""#).is_err());
    }

    #[test]
    fn well_formed_data_parses() {
        let data = parse_data(r#"{"name": "Alice", "age": 9}"#).unwrap();
        assert_eq!(data.get("name"), Some(&json!("Alice")));
        assert_eq!(data.get("age"), Some(&json!(9)));
    }
}
