//! Server-rendered HTML for the callboard web dashboard.
//!
//! The page is plain tables and links: view switching and paging are query
//! parameters, and a `<meta http-equiv="refresh">` re-requests the page on
//! the refresh interval. No scripts, no external assets.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};

use crate::analytics::DashboardSnapshot;
use crate::analytics::patterns::View;
use crate::analytics::summary::StatusCategory;

use super::api::RefreshMeta;

const STYLE: &str = r#"
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; line-height: 1.5; }
.app { max-width: 1200px; margin: 0 auto; padding: 24px; }
header { display: flex; align-items: baseline; justify-content: space-between; margin-bottom: 24px; padding-bottom: 16px; border-bottom: 1px solid var(--border); }
header h1 { font-size: 24px; font-weight: 600; color: var(--accent); }
.subtitle, .muted { color: var(--text-muted); font-size: 13px; }
.banner { padding: 10px 14px; border-radius: var(--radius); margin-bottom: 16px; border: 1px solid var(--yellow); color: var(--yellow); }
.banner.error { border-color: var(--red); color: var(--red); }
.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(340px, 1fr)); gap: 16px; }
.card { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 16px; margin-bottom: 16px; }
.card h2 { font-size: 15px; margin-bottom: 12px; }
.metrics { display: flex; flex-wrap: wrap; gap: 24px; }
.metric .value { font-size: 22px; font-weight: 600; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 4px 8px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; }
td.num, th.num { text-align: right; font-variant-numeric: tabular-nums; }
a { color: var(--accent); text-decoration: none; }
nav a, nav span { margin-right: 12px; }
nav .current { font-weight: 600; color: var(--text); }
"#;

/// Render the full dashboard for one snapshot.
pub fn render_page(snap: &DashboardSnapshot, meta: &RefreshMeta, refresh_secs: u64) -> String {
    let mut html = String::with_capacity(16 * 1024);
    push_head(&mut html, refresh_secs);

    let _ = write!(
        html,
        r#"<header><h1>callboard</h1><span class="subtitle">{} &middot; {} records &middot; {}</span></header>"#,
        escape(&meta.source),
        meta.records,
        snap.generated_at.format("%Y-%m-%d %H:%M:%S"),
    );

    if let Some(err) = &meta.error {
        let _ = write!(
            html,
            r#"<div class="banner">Showing cached data: {}</div>"#,
            escape(err)
        );
    }
    if meta.invalid_fields > 0 {
        let _ = write!(
            html,
            r#"<div class="banner">{} invalid field(s) were replaced with defaults.</div>"#,
            meta.invalid_fields
        );
    }

    push_summary(&mut html, snap);
    html.push_str(r#"<div class="grid">"#);
    push_pattern(&mut html, snap);
    html.push_str("<div>");
    push_revenue(&mut html, snap);
    push_weekly(&mut html, snap);
    html.push_str("</div></div>");
    push_calls(&mut html, snap);

    html.push_str("</div></body></html>");
    html
}

/// Render a page that only reports a failed refresh.
pub fn render_error(message: &str, refresh_secs: u64) -> String {
    let mut html = String::new();
    push_head(&mut html, refresh_secs);
    let _ = write!(
        html,
        r#"<header><h1>callboard</h1></header><div class="banner error">Could not load calls: {}</div></div></body></html>"#,
        escape(message)
    );
    html
}

fn push_head(html: &mut String, refresh_secs: u64) {
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta http-equiv="refresh" content="{}">
<title>callboard</title>
<style>{STYLE}</style>
</head>
<body><div class="app">"#,
        refresh_secs.max(1)
    );
}

fn push_summary(html: &mut String, snap: &DashboardSnapshot) {
    let s = &snap.summary;
    let _ = write!(
        html,
        r#"<div class="card"><h2>Summary</h2><div class="metrics">
<div class="metric"><div class="muted">Total calls</div><div class="value">{}</div></div>
<div class="metric"><div class="muted">Total cost</div><div class="value">${:.2}</div></div>
<div class="metric"><div class="muted">Talk minutes</div><div class="value">{:.1}</div></div>
<div class="metric"><div class="muted">Cumulative cost</div><div class="value">${:.2}</div></div>
<div class="metric"><div class="muted">Avg cost / min</div><div class="value">${:.2}</div></div>
</div><table><thead><tr><th>Status</th><th class="num">Calls</th><th class="num">Share</th></tr></thead><tbody>"#,
        s.total_calls,
        s.total_cost,
        s.total_duration_minutes,
        s.latest.cumulative_total_cost,
        s.latest.avg_cost_per_minute,
    );
    for category in StatusCategory::ALL {
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td class="num">{}</td><td class="num">{:.1}%</td></tr>"#,
            category,
            s.count(category),
            s.pct(category)
        );
    }
    html.push_str("</tbody></table></div>");
}

fn push_pattern(html: &mut String, snap: &DashboardSnapshot) {
    let hist = &snap.pattern;
    html.push_str(r#"<div class="card"><h2>Call pattern</h2><nav>"#);
    for view in [View::Day, View::Week, View::Month] {
        if view == hist.view {
            let _ = write!(html, r#"<span class="current">{view}</span>"#);
        } else {
            let _ = write!(html, r#"<a href="/?view={view}">{view}</a>"#);
        }
    }
    let _ = write!(
        html,
        r#"</nav><p class="muted">{} to {} (exclusive)</p><table><thead><tr><th>Bucket</th><th class="num">Calls</th></tr></thead><tbody>"#,
        hist.window_start, hist.window_end
    );
    for (label, count) in hist.labels.iter().zip(&hist.counts) {
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td class="num">{count}</td></tr>"#,
            escape(label)
        );
    }
    html.push_str("</tbody></table></div>");
}

fn push_revenue(html: &mut String, snap: &DashboardSnapshot) {
    html.push_str(r#"<div class="card"><h2>Monthly revenue</h2>"#);
    if snap.revenue.is_empty() {
        html.push_str(r#"<p class="muted">No dated calls.</p></div>"#);
        return;
    }
    html.push_str(r#"<table><thead><tr><th>Month</th><th class="num">Calls</th><th class="num">Cost</th></tr></thead><tbody>"#);
    for m in &snap.revenue {
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td class="num">{}</td><td class="num">${:.2}</td></tr>"#,
            escape(&m.label),
            m.calls,
            m.total_cost
        );
    }
    html.push_str("</tbody></table></div>");
}

fn push_weekly(html: &mut String, snap: &DashboardSnapshot) {
    html.push_str(r#"<div class="card"><h2>Weekly volume</h2>"#);
    if snap.weekly.is_empty() {
        html.push_str(r#"<p class="muted">No week numbers.</p></div>"#);
        return;
    }
    html.push_str(r#"<table><thead><tr><th>Week</th><th class="num">Calls</th></tr></thead><tbody>"#);
    for w in &snap.weekly {
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td class="num">{}</td></tr>"#,
            escape(&w.label),
            w.calls
        );
    }
    html.push_str("</tbody></table></div>");
}

fn push_calls(html: &mut String, snap: &DashboardSnapshot) {
    let page = &snap.page;
    let view = snap.pattern.view;
    html.push_str(
        r#"<div class="card"><h2>Call log</h2><table><thead><tr><th>Phone</th><th class="num">Duration</th><th>Status</th><th>Ended reason</th><th class="num">Cost</th><th>Start</th><th>End</th></tr></thead><tbody>"#,
    );
    for row in &snap.rows {
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td class="num">{}</td><td>{}</td><td>{}</td><td class="num">${:.2}</td><td>{}</td><td>{}</td></tr>"#,
            escape(row.phone_number.as_deref().unwrap_or("-")),
            row.duration,
            escape(&row.status),
            escape(row.ended_reason.as_deref().unwrap_or("-")),
            row.total_cost,
            local_time(row.start_time),
            local_time(row.end_time),
        );
    }
    if snap.rows.is_empty() {
        html.push_str(r#"<tr><td colspan="7" class="muted">No calls.</td></tr>"#);
    }
    html.push_str("</tbody></table><nav>");

    if page.has_prev() {
        let _ = write!(html, r#"<a href="/?view={view}&amp;page={}">&larr; prev</a>"#, page.page - 1);
    }
    let _ = write!(
        html,
        r#"<span class="muted">page {} of {}</span>"#,
        page.page, page.total_pages
    );
    if page.has_next() {
        let _ = write!(html, r#"<a href="/?view={view}&amp;page={}">next &rarr;</a>"#, page.page + 1);
    }
    html.push_str("</nav></div>");
}

fn local_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Escape text for HTML element and attribute content.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
