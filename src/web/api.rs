//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content. View handlers wrap their
//! payload with [`RefreshMeta`] so the client can tell stale data apart.

use std::io::Cursor;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::analytics::logger::{self, RefreshEvent};
use crate::analytics::pagination::{self, Nav};
use crate::analytics::patterns::{self, View};
use crate::analytics::{self, PageRequest, revenue, summary, weekly};
use crate::config::schema::DashboardConfig;
use crate::config::{self, CallboardConfig};
use crate::source::{FetchCache, Refresh};

use super::content_type_json;

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// How the rows behind a response were obtained.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshMeta {
    pub source: String,
    pub records: usize,
    pub invalid_fields: usize,
    pub cache_hit: bool,
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub refreshed_at: String,
}

impl From<&Refresh> for RefreshMeta {
    fn from(refresh: &Refresh) -> Self {
        let event = &refresh.event;
        Self {
            source: event.source.clone(),
            records: event.records,
            invalid_fields: event.invalid_fields,
            cache_hit: event.cache_hit,
            stale: event.stale,
            error: event.error.clone(),
            refreshed_at: event.timestamp.clone(),
        }
    }
}

/// A view payload plus its refresh metadata.
#[derive(Serialize)]
struct Envelope<T: Serialize> {
    meta: RefreshMeta,
    data: T,
}

/// Health API response.
#[derive(Serialize)]
struct HealthResponse {
    source: String,
    api_key_configured: bool,
    config_exists: bool,
    log_enabled: bool,
    cache_age_secs: Option<u64>,
    freshness_secs: u64,
    last_refresh: Option<RefreshEvent>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

fn envelope<T: Serialize>(refresh: &Refresh, data: T) -> Result<Response<Cursor<Vec<u8>>>> {
    json_response(&Envelope {
        meta: RefreshMeta::from(refresh),
        data,
    })
}

/// 400 response with a message.
pub(super) fn bad_request(message: &str) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(400))
}

/// Value of query parameter `key`, if present.
fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == key { Some(v) } else { None }
    })
}

/// `?view=` or `default` when absent. `None` when present but unknown.
pub(super) fn view_param(url: &str, default: View) -> Option<View> {
    match query_param(url, "view") {
        None | Some("") => Some(default),
        Some(v) => View::parse(v),
    }
}

/// `?page=&nav=` with the configured page size. Bad values fall back to page 1 / no nav.
pub(super) fn page_request(url: &str, cfg: &DashboardConfig) -> PageRequest {
    PageRequest {
        page: query_param(url, "page")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1),
        page_size: cfg.page_size,
        nav: query_param(url, "nav").and_then(Nav::parse),
    }
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/summary`: totals and status breakdown.
pub fn get_summary(refresh: &Refresh) -> Result<Response<Cursor<Vec<u8>>>> {
    envelope(refresh, summary::summarize(&refresh.records))
}

/// `GET /api/pattern?view=day|week|month`: activity histogram.
pub fn get_pattern(refresh: &Refresh, url: &str, cfg: &DashboardConfig) -> Result<Response<Cursor<Vec<u8>>>> {
    let Some(view) = view_param(url, cfg.default_view) else {
        return Ok(bad_request("view must be day, week, or month"));
    };
    envelope(
        refresh,
        patterns::call_pattern(&refresh.records, view, &Local::now()),
    )
}

/// `GET /api/revenue`: cost per calendar month.
pub fn get_revenue(refresh: &Refresh) -> Result<Response<Cursor<Vec<u8>>>> {
    envelope(refresh, revenue::monthly_revenue(&refresh.records, &Local))
}

/// `GET /api/weekly`: call volume per week number.
pub fn get_weekly(refresh: &Refresh) -> Result<Response<Cursor<Vec<u8>>>> {
    envelope(refresh, weekly::weekly_volume(&refresh.records))
}

/// `GET /api/calls?page=N&nav=prev|next|N`: one page of the call log.
pub fn get_calls(refresh: &Refresh, url: &str, cfg: &DashboardConfig) -> Result<Response<Cursor<Vec<u8>>>> {
    let req = page_request(url, cfg);
    let window = pagination::paginate(refresh.records.len(), req.page, req.page_size, req.nav);
    let rows = pagination::page_rows(&refresh.records, &window);

    envelope(refresh, serde_json::json!({ "page": window, "rows": rows }))
}

/// `GET /api/snapshot?view=&page=&nav=`: every view at once.
pub fn get_snapshot(refresh: &Refresh, url: &str, cfg: &DashboardConfig) -> Result<Response<Cursor<Vec<u8>>>> {
    let Some(view) = view_param(url, cfg.default_view) else {
        return Ok(bad_request("view must be day, week, or month"));
    };
    let snapshot = analytics::snapshot(&refresh.records, &Local::now(), view, page_request(url, cfg));
    envelope(refresh, snapshot)
}

/// `GET /api/health`: config, cache, and refresh log status.
pub fn get_health(
    config: &CallboardConfig,
    source_name: &str,
    cache: &FetchCache,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);

    let resp = HealthResponse {
        source: source_name.to_string(),
        api_key_configured: !config.source.api_key.is_empty(),
        config_exists,
        log_enabled: config.logging.enabled,
        cache_age_secs: cache.age(std::time::Instant::now()).map(|d| d.as_secs()),
        freshness_secs: config.refresh.freshness_secs,
        last_refresh: logger::last_refresh(&config.logging),
    };

    json_response(&resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
