//! Embedded web dashboard for callboard.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A server-rendered dashboard page with plain HTML tables
//! - JSON API endpoints for each view and for the whole snapshot
//!
//! Launched via `callboard web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::analytics;
use crate::config::CallboardConfig;
use crate::error::FetchError;
use crate::source::{self, CallSource, FetchCache, Refresh};

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

/// Everything the server keeps between requests: the source and its cache.
pub struct Dashboard {
    config: CallboardConfig,
    source: Box<dyn CallSource>,
    cache: FetchCache,
}

impl Dashboard {
    pub fn new(config: CallboardConfig, source: Box<dyn CallSource>) -> Self {
        let cache = FetchCache::new(config.refresh.freshness_secs);
        Self {
            config,
            source,
            cache,
        }
    }

    /// Rows for this request; the cache decides whether the source is hit.
    fn refresh(&mut self) -> Result<Refresh, FetchError> {
        source::refresh(
            self.source.as_ref(),
            &mut self.cache,
            &self.config.fields,
            &self.config.logging,
        )
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard). Errors are answered per request and
/// never stop the server.
pub fn serve(addr: &str, mut dashboard: Dashboard, open: bool) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("callboard dashboard running at http://{addr}");
    println!("Source: {}", dashboard.source.name());
    println!("Press Ctrl+C to stop.\n");

    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    for request in server.incoming_requests() {
        let started = Instant::now();
        let method = request.method().clone();
        let url = request.url().to_string();

        let resp = match dispatch(&mut dashboard, &method, &url) {
            Ok(resp) => resp,
            Err(e) => error_response(&e),
        };
        let status = resp.status_code().0;
        let _ = request.respond(resp);

        // Brief access log
        println!(
            "{} {} {} {} {}ms",
            Local::now().format("%H:%M:%S"),
            method,
            url,
            status,
            started.elapsed().as_millis()
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch(dashboard: &mut Dashboard, method: &Method, url: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    if *method != Method::Get {
        return Ok(method_not_allowed());
    }

    match path {
        // Frontend
        "/" | "/index.html" => serve_frontend(dashboard, url),

        // Health never touches the source
        "/api/health" => api::get_health(&dashboard.config, &dashboard.source.name(), &dashboard.cache),

        // Views
        "/api/summary" | "/api/pattern" | "/api/revenue" | "/api/weekly" | "/api/calls"
        | "/api/snapshot" => {
            let refresh = dashboard.refresh()?;
            let cfg = &dashboard.config.dashboard;
            match path {
                "/api/summary" => api::get_summary(&refresh),
                "/api/pattern" => api::get_pattern(&refresh, url, cfg),
                "/api/revenue" => api::get_revenue(&refresh),
                "/api/weekly" => api::get_weekly(&refresh),
                "/api/calls" => api::get_calls(&refresh, url, cfg),
                _ => api::get_snapshot(&refresh, url, cfg),
            }
        }

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Render the dashboard page for `?view=&page=&nav=`.
fn serve_frontend(dashboard: &mut Dashboard, url: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let cfg = dashboard.config.dashboard.clone();
    let Some(view) = api::view_param(url, cfg.default_view) else {
        return Ok(api::bad_request("view must be day, week, or month"));
    };

    let html = match dashboard.refresh() {
        Ok(refresh) => {
            let page = api::page_request(url, &cfg);
            let snapshot = analytics::snapshot(&refresh.records, &Local::now(), view, page);
            let meta = api::RefreshMeta::from(&refresh);
            frontend::render_page(&snapshot, &meta, dashboard.config.refresh.interval_secs)
        }
        Err(e) => frontend::render_error(&e.to_string(), dashboard.config.refresh.interval_secs),
    };

    Ok(Response::from_data(html.into_bytes())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200)))
}

/// JSON error body; upstream fetch failures map to 502.
fn error_response(err: &anyhow::Error) -> Response<Cursor<Vec<u8>>> {
    let status = if err.downcast_ref::<FetchError>().is_some() {
        502
    } else {
        500
    };
    let body = serde_json::json!({ "error": err.to_string() }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

/// 404 response.
fn not_found() -> Response<Cursor<Vec<u8>>> {
    let body = r#"{"error": "not found"}"#;
    Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json())
        .with_status_code(StatusCode(404))
}

/// 405 response; the dashboard is read-only.
fn method_not_allowed() -> Response<Cursor<Vec<u8>>> {
    let body = r#"{"error": "method not allowed"}"#;
    Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json())
        .with_status_code(StatusCode(405))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
