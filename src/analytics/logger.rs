use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::expand_home;
use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Refresh log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the refresh log (`~/.callboard/refresh-log.jsonl`).
///
/// One entry is written per refresh cycle, whether the rows came from the
/// upstream source or the cache. `callboard health` reads the tail of this
/// log to report the last refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshEvent {
    pub timestamp: String,
    /// `"airtable"` or `"file:<path>"`.
    pub source: String,
    /// Records returned to the dashboard (possibly stale).
    pub records: usize,
    /// Fields that failed to parse across all records.
    #[serde(default)]
    pub invalid_fields: usize,
    /// Rows were served from the cache without contacting the source.
    #[serde(default)]
    pub cache_hit: bool,
    /// Rows are stale because the latest fetch failed.
    #[serde(default)]
    pub stale: bool,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    /// Time spent fetching and normalizing (milliseconds).
    pub latency_ms: u64,
}

fn default_true() -> bool {
    true
}

impl RefreshEvent {
    /// Entry stamped with the current time.
    pub fn now(source: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            source: source.into(),
            records: 0,
            invalid_fields: 0,
            cache_hit: false,
            stale: false,
            success: true,
            error: None,
            latency_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging functions
// ---------------------------------------------------------------------------

/// Append `event` to the configured log. Best-effort: failures are dropped.
pub fn log_refresh(config: &LoggingConfig, event: &RefreshEvent) {
    if !config.enabled {
        return;
    }
    let Some(path) = refresh_log_path(config) else {
        return;
    };
    let _ = append_log_entry(&path, event);
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read all refresh events from `path`.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_all_entries(path: &Path) -> Vec<RefreshEvent> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    let reader = BufReader::new(file);
    reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<RefreshEvent>(&line).ok())
        .collect()
}

/// The most recent event in the configured log, if any.
pub fn last_refresh(config: &LoggingConfig) -> Option<RefreshEvent> {
    let path = refresh_log_path(config)?;
    read_all_entries(&path).pop()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_log_entry(path: &Path, entry: &RefreshEvent) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the refresh log file.
pub fn refresh_log_path(config: &LoggingConfig) -> Option<PathBuf> {
    expand_home(&config.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("callboard-logger-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("refresh-log.jsonl")
    }

    fn logging_at(path: &Path) -> LoggingConfig {
        LoggingConfig {
            enabled: true,
            path: path.to_string_lossy().into_owned(),
        }
    }

    #[test]
    fn appends_one_line_per_event() {
        let path = temp_log("append");
        let cfg = logging_at(&path);

        let mut first = RefreshEvent::now("airtable");
        first.records = 12;
        log_refresh(&cfg, &first);

        let mut second = RefreshEvent::now("airtable");
        second.success = false;
        second.stale = true;
        second.error = Some("upstream returned HTTP 500".to_string());
        log_refresh(&cfg, &second);

        let entries = read_all_entries(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].records, 12);
        assert!(!entries[1].success);
        assert_eq!(last_refresh(&cfg), Some(second));
    }

    #[test]
    fn disabled_logging_writes_nothing() {
        let path = temp_log("disabled");
        let mut cfg = logging_at(&path);
        cfg.enabled = false;

        log_refresh(&cfg, &RefreshEvent::now("airtable"));
        assert!(!path.exists());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let path = temp_log("malformed");
        create_dir_all(path.parent().unwrap()).unwrap();
        let good = serde_json::to_string(&RefreshEvent::now("file:calls.json")).unwrap();
        fs::write(&path, format!("not json\n{good}\n")).unwrap();

        let entries = read_all_entries(&path);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, "file:calls.json");
    }

    #[test]
    fn missing_file_reads_empty() {
        assert!(read_all_entries(Path::new("/nonexistent/callboard/log.jsonl")).is_empty());
    }
}
