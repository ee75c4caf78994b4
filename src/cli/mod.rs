//! CLI command implementations for callboard.
//!
//! Provides subcommand handlers for:
//! - `callboard summary`: totals, status breakdown, running totals
//! - `callboard pattern --view day|week|month`: activity histogram
//! - `callboard revenue`: cost per calendar month
//! - `callboard weekly`: call volume per week number
//! - `callboard calls --page N --nav prev|next|N`: paged call log
//! - `callboard watch`: periodic refresh of summary and pattern
//! - `callboard health`: config, source, and refresh log status
//! - `callboard config show|init|set|reset`: configuration management

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Local;
use colored::Colorize;

use crate::analytics::logger;
use crate::analytics::pagination::{self, CallLogRow, Nav, PageWindow};
use crate::analytics::patterns::{self, Histogram, View};
use crate::analytics::revenue::{self, MonthlyRevenue};
use crate::analytics::summary::{self, StatusCategory, Summary};
use crate::analytics::weekly::{self, WeeklyVolume};
use crate::config::{self, CallboardConfig};
use crate::source::{self, FetchCache, Refresh};

/// Output format for report commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Resolved config plus the global `--input` override.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: CallboardConfig,
    pub input: Option<PathBuf>,
}

impl Context {
    pub fn new(input: Option<PathBuf>) -> Self {
        Self {
            config: config::load(),
            input,
        }
    }

    /// One refresh against a throwaway cache, with warnings on stderr.
    fn load(&self) -> Result<Refresh> {
        let source = source::from_config(&self.config, self.input.as_deref());
        let mut cache = FetchCache::new(self.config.refresh.freshness_secs);
        let refresh = source::refresh(
            source.as_ref(),
            &mut cache,
            &self.config.fields,
            &self.config.logging,
        )?;
        report_issues(&refresh);
        Ok(refresh)
    }
}

fn report_issues(refresh: &Refresh) {
    if let Some(err) = &refresh.stale_error {
        eprintln!("{} serving cached rows: {err}", "warning:".yellow().bold());
    }
    if let Some(first) = refresh.issues.first() {
        eprintln!(
            "{} {} invalid field(s) replaced with defaults (first: {first})",
            "warning:".yellow().bold(),
            refresh.issues.len(),
        );
    }
}

// ---------------------------------------------------------------------------
// callboard summary
// ---------------------------------------------------------------------------

/// Show totals and the status breakdown.
pub fn run_summary(ctx: &Context, format: OutputFormat) -> Result<()> {
    let refresh = ctx.load()?;
    let summary = summary::summarize(&refresh.records);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Csv => print_summary_csv(&summary),
        OutputFormat::Table => print_summary_table(&summary),
    }

    Ok(())
}

fn print_summary_table(summary: &Summary) {
    println!("{}", "Call Summary".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();

    println!("  {} {}", "Total calls:    ".bold(), format_number(summary.total_calls));
    println!("  {} {}", "Total cost:     ".bold(), format_cost(summary.total_cost));
    println!(
        "  {} {:.1}",
        "Talk minutes:   ".bold(),
        summary.total_duration_minutes
    );
    println!(
        "  {} {}",
        "Cumulative cost:".bold(),
        format_cost(summary.latest.cumulative_total_cost)
    );
    println!(
        "  {} {}/min",
        "Avg cost:       ".bold(),
        format_cost(summary.latest.avg_cost_per_minute)
    );
    println!();

    println!("{}", "Status Breakdown".bold().cyan());
    println!("  {:<12} {:>8} {:>8}", "Status", "Calls", "Share");
    println!("  {}", "-".repeat(30));
    for category in StatusCategory::ALL {
        println!(
            "  {:<12} {:>8} {:>7.1}%",
            category.to_string(),
            summary.count(category),
            summary.pct(category),
        );
    }

    if !summary.other_statuses.is_empty() {
        println!();
        println!("  {}", "Other statuses:".dimmed());
        for (raw, count) in &summary.other_statuses {
            let name = if raw.is_empty() { "(missing)" } else { raw.as_str() };
            println!("    {:<20} {}", truncate(name, 20).dimmed(), count);
        }
    }
}

fn print_summary_csv(summary: &Summary) {
    for line in summary_csv_lines(summary) {
        println!("{line}");
    }
}

fn summary_csv_lines(summary: &Summary) -> Vec<String> {
    let mut lines = vec!["status,calls,pct".to_string()];
    for category in StatusCategory::ALL {
        lines.push(format!(
            "{},{},{:.2}",
            category,
            summary.count(category),
            summary.pct(category)
        ));
    }
    let total_pct = if summary.total_calls == 0 { 0.0 } else { 100.0 };
    lines.push(format!("total,{},{:.2}", summary.total_calls, total_pct));
    lines
}

// ---------------------------------------------------------------------------
// callboard pattern
// ---------------------------------------------------------------------------

/// Show the activity histogram for the current day, week, or month.
pub fn run_pattern(ctx: &Context, view: Option<View>, format: OutputFormat) -> Result<()> {
    let refresh = ctx.load()?;
    let view = view.unwrap_or(ctx.config.dashboard.default_view);
    let hist = patterns::call_pattern(&refresh.records, view, &Local::now());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hist)?),
        OutputFormat::Csv => print_pattern_csv(&hist),
        OutputFormat::Table => print_pattern_table(&hist),
    }

    Ok(())
}

fn print_pattern_table(hist: &Histogram) {
    println!(
        "{}",
        format!(
            "Call Pattern ({}) {} .. {}",
            hist.view, hist.window_start, hist.window_end
        )
        .bold()
        .cyan()
    );
    println!("{}", "=".repeat(50));
    println!("  {:<20} {:>8}", "Bucket", "Calls");
    println!("  {}", "-".repeat(30));

    for (i, (label, count)) in hist.labels.iter().zip(&hist.counts).enumerate() {
        let line = format!("  {:<20} {:>8}", label, count);
        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }

    println!("  {}", "-".repeat(30));
    println!("  {:<20} {:>8}", "Total".bold(), hist.total());
    if hist.undated > 0 {
        println!(
            "  {}",
            format!("{} record(s) without a start time skipped", hist.undated).dimmed()
        );
    }
}

fn print_pattern_csv(hist: &Histogram) {
    println!("bucket,label,calls");
    for (i, (label, count)) in hist.labels.iter().zip(&hist.counts).enumerate() {
        println!("{},{},{}", i, csv_field(label), count);
    }
}

// ---------------------------------------------------------------------------
// callboard revenue
// ---------------------------------------------------------------------------

/// Show cost per calendar month.
pub fn run_revenue(ctx: &Context, format: OutputFormat) -> Result<()> {
    let refresh = ctx.load()?;
    let months = revenue::monthly_revenue(&refresh.records, &Local);

    if months.is_empty() && format == OutputFormat::Table {
        println!("{}", "No dated calls yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&months)?),
        OutputFormat::Csv => print_revenue_csv(&months),
        OutputFormat::Table => print_revenue_table(&months),
    }

    Ok(())
}

fn print_revenue_table(months: &[MonthlyRevenue]) {
    println!("{}", "Monthly Revenue".bold().cyan());
    println!("{}", "=".repeat(40));
    println!("  {:<12} {:>8} {:>14}", "Month", "Calls", "Cost");
    println!("  {}", "-".repeat(36));

    for m in months {
        println!(
            "  {:<12} {:>8} {:>14}",
            m.label,
            format_number(m.calls),
            format_cost(m.total_cost)
        );
    }

    let total: f64 = months.iter().map(|m| m.total_cost).sum();
    println!("  {}", "-".repeat(36));
    println!("  {:<12} {:>8} {:>14}", "Total".bold(), "", format_cost(total));
}

fn print_revenue_csv(months: &[MonthlyRevenue]) {
    println!("year,month,label,calls,total_cost");
    for m in months {
        println!(
            "{},{},{},{},{:.2}",
            m.year,
            m.month,
            csv_field(&m.label),
            m.calls,
            m.total_cost
        );
    }
}

// ---------------------------------------------------------------------------
// callboard weekly
// ---------------------------------------------------------------------------

/// Show call volume per week number.
pub fn run_weekly(ctx: &Context, format: OutputFormat) -> Result<()> {
    let refresh = ctx.load()?;
    let weeks = weekly::weekly_volume(&refresh.records);

    if weeks.is_empty() && format == OutputFormat::Table {
        println!("{}", "No calls carry a week number.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&weeks)?),
        OutputFormat::Csv => print_weekly_csv(&weeks),
        OutputFormat::Table => print_weekly_table(&weeks),
    }

    Ok(())
}

fn print_weekly_table(weeks: &[WeeklyVolume]) {
    println!("{}", "Weekly Call Volume".bold().cyan());
    println!("{}", "=".repeat(30));
    println!("  {:<12} {:>8}", "Week", "Calls");
    println!("  {}", "-".repeat(22));
    for w in weeks {
        println!("  {:<12} {:>8}", w.label, format_number(w.calls));
    }
}

fn print_weekly_csv(weeks: &[WeeklyVolume]) {
    println!("week_number,calls");
    for w in weeks {
        println!("{},{}", w.week_number, w.calls);
    }
}

// ---------------------------------------------------------------------------
// callboard calls
// ---------------------------------------------------------------------------

/// Show one page of the call log, newest first.
pub fn run_calls(ctx: &Context, page: usize, nav: Option<Nav>, format: OutputFormat) -> Result<()> {
    let refresh = ctx.load()?;
    let window = pagination::paginate(
        refresh.records.len(),
        page,
        ctx.config.dashboard.page_size,
        nav,
    );
    let rows = pagination::page_rows(&refresh.records, &window);

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "page": window, "rows": rows });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => print_calls_csv(&rows),
        OutputFormat::Table => print_calls_table(&rows, &window),
    }

    Ok(())
}

fn print_calls_table(rows: &[CallLogRow], window: &PageWindow) {
    println!("{}", "Call Log".bold().cyan());
    println!("{}", "=".repeat(96));
    println!(
        "  {:<16} {:>6} {:<10} {:<20} {:>9} {:<16} {:<16}",
        "Phone", "Dur", "Status", "Ended reason", "Cost", "Start", "End"
    );
    println!("  {}", "-".repeat(94));

    if rows.is_empty() {
        println!("  {}", "No calls.".dimmed());
    }
    for (i, row) in rows.iter().enumerate() {
        let line = format!(
            "  {:<16} {:>6} {:<10} {:<20} {:>9} {:<16} {:<16}",
            truncate(row.phone_number.as_deref().unwrap_or("-"), 16),
            row.duration,
            truncate(&row.status, 10),
            truncate(row.ended_reason.as_deref().unwrap_or("-"), 20),
            format_cost(row.total_cost),
            format_time(row.start_time),
            format_time(row.end_time),
        );
        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }

    println!();
    println!(
        "  Page {} of {} ({} calls){}{}",
        window.page,
        window.total_pages,
        format_number(window.total_count),
        if window.has_prev() { "  [prev]" } else { "" },
        if window.has_next() { "  [next]" } else { "" },
    );
}

fn print_calls_csv(rows: &[CallLogRow]) {
    println!("id,phone_number,duration,status,ended_reason,total_cost,start_time,end_time");
    for row in rows {
        println!(
            "{},{},{},{},{},{:.2},{},{}",
            csv_field(&row.id),
            csv_field(row.phone_number.as_deref().unwrap_or("")),
            row.duration,
            csv_field(&row.status),
            csv_field(row.ended_reason.as_deref().unwrap_or("")),
            row.total_cost,
            row.start_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
            row.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
        );
    }
}

// ---------------------------------------------------------------------------
// callboard watch
// ---------------------------------------------------------------------------

/// Redraw summary and pattern every `refresh.interval_secs` until interrupted.
pub fn run_watch(ctx: &Context, view: Option<View>) -> Result<()> {
    let view = view.unwrap_or(ctx.config.dashboard.default_view);
    let interval = Duration::from_secs(ctx.config.refresh.interval_secs.max(1));
    let source = source::from_config(&ctx.config, ctx.input.as_deref());
    let mut cache = FetchCache::new(ctx.config.refresh.freshness_secs);

    loop {
        let cycle_start = Instant::now();
        // Clear screen, cursor home.
        print!("\x1B[2J\x1B[H");

        match source::refresh(
            source.as_ref(),
            &mut cache,
            &ctx.config.fields,
            &ctx.config.logging,
        ) {
            Ok(refresh) => {
                report_issues(&refresh);
                let summary = summary::summarize(&refresh.records);
                print_summary_table(&summary);
                println!();
                let hist = patterns::call_pattern(&refresh.records, view, &Local::now());
                print_pattern_table(&hist);
            }
            Err(e) => println!("{} {e}", "refresh failed:".red().bold()),
        }

        println!();
        println!(
            "  {}",
            format!(
                "{} · {} · refreshing every {}s (Ctrl-C to stop)",
                source.name(),
                Local::now().format("%H:%M:%S"),
                interval.as_secs()
            )
            .dimmed()
        );

        std::thread::sleep(interval.saturating_sub(cycle_start.elapsed()));
    }
}

// ---------------------------------------------------------------------------
// callboard health
// ---------------------------------------------------------------------------

/// Check config files, the call source, and the refresh log.
pub fn run_health(ctx: &Context) -> Result<()> {
    println!("{}", "callboard Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    // 0. Config file status
    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.callboard/config.toml found"
        } else {
            "not found (run `callboard config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".callboard.toml found"
        } else {
            "none (optional)"
        },
    );

    // 1. Source settings
    let cfg = &ctx.config;
    if ctx.input.is_none() {
        print_health_item(
            "API key",
            !cfg.source.api_key.is_empty(),
            if cfg.source.api_key.is_empty() {
                "missing (set CALLBOARD_API_KEY)"
            } else {
                "configured"
            },
        );
        print_health_item(
            "Base / table",
            !cfg.source.base_id.is_empty(),
            &format!(
                "{} / {}",
                if cfg.source.base_id.is_empty() { "(unset)" } else { cfg.source.base_id.as_str() },
                cfg.source.table
            ),
        );
    }

    // 2. Live fetch
    let source = source::from_config(cfg, ctx.input.as_deref());
    let started = Instant::now();
    let fetched = source.fetch();
    let elapsed = started.elapsed().as_millis();
    match fetched {
        Ok(rows) => print_health_item(
            "Source",
            true,
            &format!("{}: {} rows in {}ms", source.name(), format_number(rows.len()), elapsed),
        ),
        Err(e) => print_health_item("Source", false, &format!("{}: {e}", source.name())),
    }

    // 3. Refresh log
    let log_path = logger::refresh_log_path(&cfg.logging);
    let log_exists = log_path.as_ref().is_some_and(|p| p.exists());
    let detail = match logger::last_refresh(&cfg.logging) {
        Some(last) => format!(
            "last refresh {} ({} records, {})",
            last.timestamp,
            last.records,
            if last.success { "ok" } else { "failed" }
        ),
        None if !cfg.logging.enabled => "disabled".to_string(),
        None => "no log file yet".to_string(),
    };
    print_health_item("Refresh log", log_exists, &detail);

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// callboard config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective callboard Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source_line("~/.callboard/config.toml", global_exists);
    print_source_line(".callboard.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "CALLBOARD_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source_line(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.callboard/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Set source.base_id and CALLBOARD_API_KEY to connect.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Format a dollar amount with cents and thousands separators.
fn format_cost(amount: f64) -> String {
    let cents = (amount * 100.0).round().max(0.0) as u64;
    format!("${}.{:02}", format_number((cents / 100) as usize), cents % 100)
}

/// Local `YYYY-MM-DD HH:MM`, or `-` when absent.
fn format_time(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
