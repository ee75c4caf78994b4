/// Configuration system for callboard.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::CallboardConfig::default()`]
/// 2. **User global config**: `~/.callboard/config.toml`
/// 3. **Project local config**: `.callboard.toml` in the current working directory
/// 4. **Environment variables**: `CALLBOARD_*` overrides (highest precedence)
///
/// Missing sections in a TOML file fall back to built-in defaults.
///
/// # Usage
///
/// ```rust,ignore
/// use callboard::config;
///
/// let cfg = config::load();
/// let page_size = cfg.dashboard.page_size;
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::CallboardConfig;

use crate::analytics::patterns::View;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> CallboardConfig {
    let mut config = CallboardConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }

    // A project file replaces the global one wholesale; each file is
    // deserialized with defaults for the keys it omits.
    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Malformed files are ignored so a typo never blocks the dashboard.
fn load_toml_file(path: Option<PathBuf>) -> Option<CallboardConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!("[callboard] ignoring malformed {}: {e}", path.display());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.callboard`, the home for config and logs.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".callboard"))
}

fn global_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".callboard.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `CALLBOARD_API_KEY`: upstream access token
/// - `CALLBOARD_BASE_ID`: upstream base id
/// - `CALLBOARD_TABLE`: table name
/// - `CALLBOARD_API_URL`: API base URL
/// - `CALLBOARD_PAGE_SIZE`: call-log rows per page
/// - `CALLBOARD_VIEW`: default histogram view (`day`, `week`, `month`)
/// - `CALLBOARD_FRESHNESS_SECS`: cache freshness window
/// - `CALLBOARD_INTERVAL_SECS`: watch refresh interval
/// - `CALLBOARD_LOGGING`: refresh log on/off
fn apply_env_overrides(config: &mut CallboardConfig) {
    if let Ok(val) = std::env::var("CALLBOARD_API_KEY")
        && !val.is_empty()
    {
        config.source.api_key = val;
    }
    if let Ok(val) = std::env::var("CALLBOARD_BASE_ID")
        && !val.is_empty()
    {
        config.source.base_id = val;
    }
    if let Ok(val) = std::env::var("CALLBOARD_TABLE")
        && !val.is_empty()
    {
        config.source.table = val;
    }
    if let Ok(val) = std::env::var("CALLBOARD_API_URL")
        && !val.is_empty()
    {
        config.source.api_url = val;
    }

    if let Ok(val) = std::env::var("CALLBOARD_PAGE_SIZE")
        && let Ok(n) = val.parse::<usize>()
    {
        config.dashboard.page_size = n;
    }
    if let Ok(val) = std::env::var("CALLBOARD_VIEW")
        && let Some(view) = View::parse(&val)
    {
        config.dashboard.default_view = view;
    }

    if let Ok(val) = std::env::var("CALLBOARD_FRESHNESS_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.refresh.freshness_secs = secs;
    }
    if let Ok(val) = std::env::var("CALLBOARD_INTERVAL_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.refresh.interval_secs = secs;
    }

    if let Ok(val) = std::env::var("CALLBOARD_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.callboard/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.callboard/ directory")?;
    }

    fs::write(&path, CallboardConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `dashboard.page_size`. When no file exists yet
/// the defaults are written first.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&CallboardConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Refuse to write something that no longer deserializes.
    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    toml::from_str::<CallboardConfig>(&output)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        None => anyhow::bail!("unknown config key '{key}'"),
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
    };

    table.insert((*leaf).to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML, with the API key masked.
pub fn show_effective_config() -> Result<String> {
    let mut config = load();
    if !config.source.api_key.is_empty() {
        config.source.api_key = "********".to_string();
    }
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/log/cb.jsonl"),
            Some(PathBuf::from("/var/log/cb.jsonl"))
        );
    }

    #[test]
    fn set_toml_value_updates_integer() {
        let mut root: toml::Value = toml::from_str("[dashboard]\npage_size = 10\n").unwrap();
        set_toml_value(&mut root, "dashboard.page_size", "25").unwrap();
        assert_eq!(root["dashboard"]["page_size"].as_integer(), Some(25));
    }

    #[test]
    fn set_toml_value_updates_string_and_bool() {
        let mut root: toml::Value =
            toml::from_str("[source]\ntable = \"Calls\"\n[logging]\nenabled = true\n").unwrap();
        set_toml_value(&mut root, "source.table", "Inbound").unwrap();
        set_toml_value(&mut root, "logging.enabled", "off").unwrap();
        assert_eq!(root["source"]["table"].as_str(), Some("Inbound"));
        assert_eq!(root["logging"]["enabled"].as_bool(), Some(false));
    }

    #[test]
    fn set_toml_value_rejects_unknown_keys() {
        let mut root: toml::Value = toml::from_str("[source]\ntable = \"Calls\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "x").is_err());
        assert!(set_toml_value(&mut root, "source.nope", "x").is_err());
    }

    #[test]
    fn set_toml_value_rejects_bad_integer() {
        let mut root: toml::Value = toml::from_str("[refresh]\ninterval_secs = 30\n").unwrap();
        assert!(set_toml_value(&mut root, "refresh.interval_secs", "soon").is_err());
    }
}
