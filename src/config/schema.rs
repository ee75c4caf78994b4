/// Configuration schema and defaults for callboard.
///
/// Defines the TOML-serializable configuration structure with sections
/// `[source]`, `[fields]`, `[refresh]`, `[dashboard]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

use crate::analytics::patterns::View;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level callboard configuration.
///
/// Maps directly to `~/.callboard/config.toml` and `.callboard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallboardConfig {
    pub source: SourceConfig,
    pub fields: FieldNames,
    pub refresh: RefreshConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [source]
// ---------------------------------------------------------------------------

/// Upstream table API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// API base URL, without the base id.
    pub api_url: String,
    /// Base (workspace) id.
    pub base_id: String,
    /// Table holding the call rows.
    pub table: String,
    /// Personal access token. Prefer `CALLBOARD_API_KEY` over storing it here.
    pub api_key: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.airtable.com/v0".to_string(),
            base_id: String::new(),
            table: "Calls".to_string(),
            api_key: String::new(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [fields]
// ---------------------------------------------------------------------------

/// Upstream column names for each record attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub start_time: String,
    pub end_time: String,
    pub duration: String,
    pub status: String,
    pub total_cost: String,
    pub cumulative_total_cost: String,
    pub avg_cost_per_minute: String,
    pub week_number: String,
    pub phone_number: String,
    pub ended_reason: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            start_time: "Start time".to_string(),
            end_time: "End time".to_string(),
            duration: "Call duration".to_string(),
            status: "Call status".to_string(),
            total_cost: "Total cost".to_string(),
            cumulative_total_cost: "Cumulative Total Cost".to_string(),
            avg_cost_per_minute: "Avg cost per minute".to_string(),
            week_number: "Week number".to_string(),
            phone_number: "Phone number".to_string(),
            ended_reason: "Ended reason".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [refresh]
// ---------------------------------------------------------------------------

/// Refresh cadence and cache freshness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between refresh cycles in `callboard watch`.
    pub interval_secs: u64,
    /// Maximum age (seconds) of cached rows before a new fetch.
    pub freshness_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            freshness_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Presentation defaults for the CLI and web dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Rows per call-log page.
    pub page_size: usize,
    /// Histogram shown when no view is requested.
    pub default_view: View,
    /// Listen address for `callboard web`.
    pub listen_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            default_view: View::Day,
            listen_addr: "127.0.0.1:9747".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Refresh log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether refresh events are appended to the log file.
    pub enabled: bool,
    /// Path to the refresh log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.callboard/refresh-log.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML
// ---------------------------------------------------------------------------

impl CallboardConfig {
    /// Annotated default config written by `callboard config init`.
    pub fn default_toml() -> String {
        r#"# callboard configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (CALLBOARD_*)
#   2. Project config (.callboard.toml in current directory)
#   3. User global config (~/.callboard/config.toml)
#   4. Built-in defaults

[source]
api_url = "https://api.airtable.com/v0"
base_id = ""              # e.g. "appXXXXXXXXXXXXXX"
table = "Calls"
api_key = ""              # Prefer CALLBOARD_API_KEY
timeout_ms = 10000

[fields]
start_time = "Start time"
end_time = "End time"
duration = "Call duration"
status = "Call status"
total_cost = "Total cost"
cumulative_total_cost = "Cumulative Total Cost"
avg_cost_per_minute = "Avg cost per minute"
week_number = "Week number"
phone_number = "Phone number"
ended_reason = "Ended reason"

[refresh]
interval_secs = 30        # callboard watch cadence
freshness_secs = 30       # cached rows younger than this are reused

[dashboard]
page_size = 10
default_view = "day"      # day | week | month
listen_addr = "127.0.0.1:9747"

[logging]
enabled = true
path = "~/.callboard/refresh-log.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = CallboardConfig::default();
        assert_eq!(config.source.table, "Calls");
        assert_eq!(config.refresh.freshness_secs, 30);
        assert_eq!(config.dashboard.page_size, 10);
        assert_eq!(config.dashboard.default_view, View::Day);
        assert_eq!(config.fields.start_time, "Start time");
        assert!(config.logging.enabled);
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[source]
base_id = "appTEST"

[dashboard]
default_view = "month"
"#;
        let config: CallboardConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.source.base_id, "appTEST");
        assert_eq!(config.source.table, "Calls");
        assert_eq!(config.dashboard.default_view, View::Month);
        assert_eq!(config.dashboard.page_size, 10);
    }

    #[test]
    fn renamed_columns_are_honored() {
        let toml_str = r#"
[fields]
start_time = "Started At"
"#;
        let config: CallboardConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.fields.start_time, "Started At");
        assert_eq!(config.fields.total_cost, "Total cost");
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: CallboardConfig = toml::from_str("").unwrap();
        assert_eq!(config.refresh.interval_secs, 30);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: CallboardConfig = toml::from_str(&CallboardConfig::default_toml()).unwrap();
        assert_eq!(config.fields, FieldNames::default());
        assert_eq!(config.dashboard.listen_addr, "127.0.0.1:9747");
    }
}
