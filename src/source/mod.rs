//! Call sources and the refresh cycle.
//!
//! A [`CallSource`] hands back raw rows. [`refresh`] runs one cycle:
//! consult the caller's [`FetchCache`], normalize, order newest first, and
//! append a [`RefreshEvent`] to the refresh log.

pub mod airtable;
pub mod cache;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;

use crate::analytics::logger::{self, RefreshEvent};
use crate::config::CallboardConfig;
use crate::config::schema::{FieldNames, LoggingConfig};
use crate::error::{FetchError, FieldError};
use crate::records::{self, CallRecord, RawCallRecord};

pub use airtable::AirtableSource;
pub use cache::{CacheStatus, FetchCache};

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Anything that can list the raw call rows.
pub trait CallSource {
    /// Short label used in the refresh log.
    fn name(&self) -> String;

    fn fetch(&self) -> Result<Vec<RawCallRecord>, FetchError>;
}

/// Rows from a JSON file: either `{ "records": [...] }` or a bare array.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CallSource for FileSource {
    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<RawCallRecord>, FetchError> {
        let content = fs::read_to_string(&self.path).map_err(|source| FetchError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        parse_records(&content)
    }
}

/// Decode a records document in either accepted shape.
pub fn parse_records(content: &str) -> Result<Vec<RawCallRecord>, FetchError> {
    let doc: Value = serde_json::from_str(content).map_err(|e| FetchError::Decode(e.to_string()))?;
    let list = match doc {
        Value::Object(mut map) => map
            .remove("records")
            .ok_or_else(|| FetchError::Decode("expected a \"records\" array".to_string()))?,
        list @ Value::Array(_) => list,
        _ => {
            return Err(FetchError::Decode(
                "expected an array or an object with \"records\"".to_string(),
            ));
        }
    };
    serde_json::from_value(list).map_err(|e| FetchError::Decode(e.to_string()))
}

/// The file source when `input` is given, otherwise the configured API.
pub fn from_config(config: &CallboardConfig, input: Option<&Path>) -> Box<dyn CallSource> {
    match input {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(AirtableSource::from_config(&config.source, &config.fields)),
    }
}

// ---------------------------------------------------------------------------
// Refresh cycle
// ---------------------------------------------------------------------------

/// Result of one refresh cycle.
#[derive(Debug)]
pub struct Refresh {
    /// Normalized records, newest first.
    pub records: Vec<CallRecord>,
    pub issues: Vec<FieldError>,
    /// Set when the fetch failed and cached rows were served instead.
    pub stale_error: Option<FetchError>,
    pub event: RefreshEvent,
}

/// Run one refresh: cache or fetch, normalize, sort, and log.
///
/// Fails only when the fetch fails and nothing is cached.
pub fn refresh(
    source: &dyn CallSource,
    cache: &mut FetchCache,
    fields: &FieldNames,
    logging: &LoggingConfig,
) -> Result<Refresh, FetchError> {
    let started = Instant::now();
    let mut event = RefreshEvent::now(source.name());

    let fetched = match cache.get_or_fetch(started, || source.fetch()) {
        Ok(fetched) => fetched,
        Err(err) => {
            event.success = false;
            event.error = Some(err.to_string());
            event.latency_ms = started.elapsed().as_millis() as u64;
            logger::log_refresh(logging, &event);
            return Err(err);
        }
    };

    let normalized = records::normalize_all(fetched.rows, fields);
    let mut records = normalized.records;
    sort_newest_first(&mut records);

    event.records = records.len();
    event.invalid_fields = normalized.issues.len();
    event.cache_hit = fetched.status.is_hit();
    let stale_error = match fetched.status {
        CacheStatus::Stale(err) => {
            event.stale = true;
            event.success = false;
            event.error = Some(err.to_string());
            Some(err)
        }
        CacheStatus::Fresh | CacheStatus::Fetched => None,
    };
    event.latency_ms = started.elapsed().as_millis() as u64;
    logger::log_refresh(logging, &event);

    Ok(Refresh {
        records,
        issues: normalized.issues,
        stale_error,
        event,
    })
}

/// Order by start time, newest first. Records without one go last, in
/// their original order.
pub fn sort_newest_first(records: &mut [CallRecord]) {
    records.sort_by(|a, b| b.start_time.cmp(&a.start_time));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn parses_wrapped_and_bare_documents() {
        let wrapped = r#"{"records":[{"id":"a","fields":{"Call status":"missed"}}]}"#;
        let bare = r#"[{"id":"a","fields":{}},{"id":"b","fields":{}}]"#;
        assert_eq!(parse_records(wrapped).unwrap().len(), 1);
        assert_eq!(parse_records(bare).unwrap().len(), 2);
    }

    #[test]
    fn one_bad_row_does_not_sink_the_batch() {
        let doc = r#"[{"id":"a","fields":null},{"id":7,"fields":{"Call status":"missed"}},"junk"]"#;
        let rows = parse_records(doc).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].id, "7");

        let out = records::normalize_all(&rows, &FieldNames::default());
        let ids: Vec<&str> = out.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "7"]);
        assert_eq!(out.records[1].status, crate::records::CallStatus::Missed);
        assert!(matches!(out.issues.as_slice(), [FieldError::MalformedRow { index: 2, .. }]));
    }

    #[test]
    fn rejects_other_documents() {
        assert!(matches!(parse_records("42"), Err(FetchError::Decode(_))));
        assert!(matches!(parse_records(r#"{"rows":[]}"#), Err(FetchError::Decode(_))));
        assert!(matches!(parse_records("{not json"), Err(FetchError::Decode(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = FileSource::new("/nonexistent/callboard/calls.json").fetch().unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[test]
    fn sort_puts_undated_last() {
        let at = |id: &str, d: u32| CallRecord {
            start_time: Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).single(),
            ..CallRecord::new(id)
        };
        let mut records = vec![CallRecord::new("none"), at("old", 1), at("new", 9)];
        sort_newest_first(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "none"]);
    }
}
