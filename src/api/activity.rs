use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Activity log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the API activity log (`~/.mmpctl/activity-log.jsonl`).
///
/// Each entry records one backend request: method, path, HTTP status (if
/// a response came back at all), and latency. Used by `mmpctl health` to
/// show how much traffic the client has issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub method: String,
    pub path: String,
    /// HTTP status of the response; `None` when the request never got one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

/// Append an activity entry for a completed request.
///
/// Logging must never take down the request it describes — any I/O
/// failure here is swallowed.
pub fn record(method: &str, path: &str, status: Option<u16>, latency_ms: u64) {
    let entry = ActivityEntry {
        timestamp: Utc::now().to_rfc3339(),
        method: method.to_string(),
        path: path.to_string(),
        status,
        latency_ms,
    };

    let _ = append_entry(&entry);
}

fn append_entry(entry: &ActivityEntry) -> Result<()> {
    let Some(path) = activity_log_path() else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read all activity entries.
///
/// Silently skips malformed lines. Returns an empty vec if the file does
/// not exist or cannot be read.
pub fn read_all_entries() -> Vec<ActivityEntry> {
    let Some(path) = activity_log_path() else {
        return Vec::new();
    };

    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    let reader = BufReader::new(file);
    reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
        .collect()
}

/// Return the path to the activity log file.
pub fn activity_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mmpctl").join("activity-log.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_round_trips_through_json() {
        let entry = ActivityEntry {
            timestamp: "2026-08-01T10:00:00+00:00".to_string(),
            method: "POST".to_string(),
            path: "/systems/alpha/student/query".to_string(),
            status: Some(200),
            latency_ms: 42,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: ActivityEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.method, "POST");
        assert_eq!(back.status, Some(200));
        assert_eq!(back.latency_ms, 42);
    }

    #[test]
    fn missing_status_is_omitted_and_defaulted() {
        let entry = ActivityEntry {
            timestamp: "2026-08-01T10:00:00+00:00".to_string(),
            method: "GET".to_string(),
            path: "/systems".to_string(),
            status: None,
            latency_ms: 7,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("status"));

        let back: ActivityEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, None);
    }
}
