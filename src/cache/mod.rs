//! Keyed fetch cache with manual invalidation.
//!
//! Associates a query with a cache key built from the resource kind plus
//! its full selection parameters (system, resource type, filter text).
//! Repeated reads for the same key are served from cache; create/write
//! operations invalidate the dependent key and re-fetch so the view
//! reflects the mutation. There is no TTL and no eviction beyond key
//! replacement.
//!
//! Because keys carry the full selection, a response can never land in a
//! different selection's slot — switching systems or resource types
//! always reads through its own key.

use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Cache keys
// ---------------------------------------------------------------------------

/// Key for the systems list.
pub fn systems_key() -> String {
    "systems".to_string()
}

/// Key for a system's analytics series.
pub fn analytics_key(system: &str) -> String {
    format!("analytics:{system}")
}

/// Key for a resource query — system, type, and filter text all
/// participate, so distinct selections never share an entry.
pub fn resources_key(system: &str, resource_type: &str, filter_text: &str) -> String {
    format!("resources:{system}:{resource_type}:{filter_text}")
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// In-memory request/response cache, confined to one console session or
/// one CLI invocation.
#[derive(Debug, Default)]
pub struct FetchCache {
    entries: HashMap<String, Value>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `key` from cache, or run the fetch and remember its result.
    ///
    /// Errors are propagated and not cached — a failed fetch leaves the
    /// slot empty so the next read retries.
    pub fn get_or_fetch<F>(&mut self, key: &str, fetch: F) -> Result<Value>
    where
        F: FnOnce() -> Result<Value>,
    {
        if let Some(value) = self.entries.get(key) {
            return Ok(value.clone());
        }

        let value = fetch()?;
        self.entries.insert(key.to_string(), value.clone());
        Ok(value)
    }

    /// Whether a key currently has a cached value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop a single cached entry (after a write that affects it).
    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop everything (logout).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fetches_once_then_serves_from_cache() {
        let mut cache = FetchCache::new();
        let mut calls = 0;

        for _ in 0..3 {
            let value = cache
                .get_or_fetch("systems", || {
                    calls += 1;
                    Ok(json!(["alpha", "beta"]))
                })
                .unwrap();
            assert_eq!(value, json!(["alpha", "beta"]));
        }

        assert_eq!(calls, 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let mut cache = FetchCache::new();

        let result = cache.get_or_fetch("k", || anyhow::bail!("network down"));
        assert!(result.is_err());
        assert!(!cache.contains("k"));

        // Next read retries and succeeds
        let value = cache.get_or_fetch("k", || Ok(json!(1))).unwrap();
        assert_eq!(value, json!(1));
    }

    #[test]
    fn invalidate_forces_refetch() {
        let mut cache = FetchCache::new();
        let mut calls = 0;
        let mut read = |cache: &mut FetchCache| {
            cache
                .get_or_fetch("k", || {
                    calls += 1;
                    Ok(json!(calls))
                })
                .unwrap()
        };

        assert_eq!(read(&mut cache), json!(1));
        assert_eq!(read(&mut cache), json!(1));

        cache.invalidate("k");
        assert_eq!(read(&mut cache), json!(2));
    }

    #[test]
    fn invalidate_leaves_other_keys_alone() {
        let mut cache = FetchCache::new();
        cache.get_or_fetch("a", || Ok(json!("a"))).unwrap();
        cache.get_or_fetch("b", || Ok(json!("b"))).unwrap();

        cache.invalidate("a");
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
    }

    #[test]
    fn keys_carry_the_full_selection() {
        assert_ne!(
            resources_key("alpha", "student", ""),
            resources_key("beta", "student", "")
        );
        assert_ne!(
            resources_key("alpha", "student", ""),
            resources_key("alpha", "teacher", "")
        );
        assert_ne!(
            resources_key("alpha", "student", ""),
            resources_key("alpha", "student", r#"{"data.name":"Alice"}"#)
        );
    }
}
