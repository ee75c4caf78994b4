//! Page windows over the (already sorted) call log.
//!
//! The window is recomputed from `(total_count, page)` on every call, so a
//! page number remembered from a larger data set clamps to the new last
//! page instead of pointing past the end.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::records::CallRecord;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Navigation intent applied to the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Prev,
    Next,
    Goto(usize),
}

impl Nav {
    /// Parse `prev`, `next`, or a page number.
    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_ascii_lowercase().as_str() {
            "prev" | "previous" => Some(Self::Prev),
            "next" => Some(Self::Next),
            other => other.parse().ok().map(Self::Goto),
        }
    }
}

impl fmt::Display for Nav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prev => write!(f, "prev"),
            Self::Next => write!(f, "next"),
            Self::Goto(n) => write!(f, "goto {n}"),
        }
    }
}

/// A clamped page plus the slice bounds it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    /// 1-based; 1 even when there are no items.
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
    /// `ceil(total_count / page_size)`; 0 when there are no items.
    pub total_pages: usize,
    pub start_index: usize,
    /// Exclusive.
    pub end_index: usize,
}

impl PageWindow {
    /// Window for `page`, clamped into `[1, total_pages]`. A zero page size is treated as 1.
    pub fn new(total_count: usize, page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_count.div_ceil(page_size);
        let page = page.clamp(1, total_pages.max(1));
        let start_index = ((page - 1) * page_size).min(total_count);
        let end_index = (start_index + page_size).min(total_count);

        Self {
            page,
            page_size,
            total_count,
            total_pages,
            start_index,
            end_index,
        }
    }

    /// Apply a navigation intent. `Prev` on page 1 and `Next` on the last
    /// page leave the window unchanged.
    pub fn navigate(&self, nav: Nav) -> Self {
        let target = match nav {
            Nav::Prev if self.has_prev() => self.page - 1,
            Nav::Next if self.has_next() => self.page + 1,
            Nav::Prev | Nav::Next => self.page,
            Nav::Goto(n) => n,
        };
        Self::new(self.total_count, target, self.page_size)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// The items on this page. Items beyond `total_count` are never returned.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end_index.min(items.len());
        let start = self.start_index.min(end);
        &items[start..end]
    }
}

/// Clamp `current_page` against `total_count`, then apply `nav` if given.
pub fn paginate(total_count: usize, current_page: usize, page_size: usize, nav: Option<Nav>) -> PageWindow {
    let window = PageWindow::new(total_count, current_page, page_size);
    match nav {
        Some(nav) => window.navigate(nav),
        None => window,
    }
}

// ---------------------------------------------------------------------------
// Call-log rows
// ---------------------------------------------------------------------------

/// One row of the paginated call log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallLogRow {
    pub id: String,
    pub phone_number: Option<String>,
    /// `m:ss`.
    pub duration: String,
    pub status: String,
    pub ended_reason: Option<String>,
    pub total_cost: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl From<&CallRecord> for CallLogRow {
    fn from(record: &CallRecord) -> Self {
        Self {
            id: record.id.clone(),
            phone_number: record.phone_number.clone(),
            duration: format_duration(record.duration_seconds),
            status: record.status.to_string(),
            ended_reason: record.ended_reason.clone(),
            total_cost: record.total_cost,
            start_time: record.start_time,
            end_time: record.end_time,
        }
    }
}

/// Rows for the page described by `window`.
pub fn page_rows(records: &[CallRecord], window: &PageWindow) -> Vec<CallLogRow> {
    window.slice(records).iter().map(CallLogRow::from).collect()
}

/// Format seconds as `m:ss`.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
