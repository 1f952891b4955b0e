//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use launchpad_store::EntryInfo;
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// A cache entry as shown to scripts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryOutput {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_datetime_opt")]
    pub fetched_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub fetching: bool,
    pub subscribers: usize,
    pub has_data: bool,
}

impl From<&EntryInfo> for EntryOutput {
    fn from(entry: &EntryInfo) -> Self {
        Self {
            key: entry.key.to_string(),
            fetched_at: entry.fetched_at,
            stale: entry.stale,
            fetching: entry.fetching,
            subscribers: entry.subscriber_count,
            has_data: entry.has_data,
        }
    }
}

/// One line of `watch` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u64>,
    pub version: u64,
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(serialize_with = "serialize_datetime")]
    pub at: DateTime<Utc>,
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339())
}

#[allow(clippy::ref_option)]
fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(output)
    }

    /// Formats cache entries.
    pub fn format_entries(&self, entries: &[EntryInfo]) -> Result<String> {
        let outputs: Vec<EntryOutput> = entries.iter().map(EntryOutput::from).collect();
        self.format(&outputs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty() {
        let formatter = JsonFormatter::new(true);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_format_compact() {
        let formatter = JsonFormatter::new(false);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_watch_output_omits_missing_fields() {
        let formatter = JsonFormatter::new(false);
        let output = formatter
            .format(&WatchOutput {
                unread_count: None,
                version: 0,
                stale: false,
                error: None,
                at: Utc::now(),
            })
            .unwrap();
        assert!(!output.contains("unreadCount"));
        assert!(!output.contains("error"));
        assert!(output.contains("\"version\":0"));
    }
}
