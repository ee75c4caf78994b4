//! Aggregation engine over normalized call records.
//!
//! Every function here is pure: it borrows a snapshot of records (plus an
//! injected `now` where the view is time-relative) and returns a fresh
//! result. Fetching, caching, and rendering live elsewhere.

pub mod logger;
pub mod pagination;
pub mod patterns;
pub mod revenue;
pub mod summary;
pub mod weekly;

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::Serialize;

use crate::records::CallRecord;

use pagination::{CallLogRow, Nav, PageWindow};
use patterns::{Histogram, View};
use revenue::MonthlyRevenue;
use summary::Summary;
use weekly::WeeklyVolume;

/// Every dashboard view computed from one snapshot of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<FixedOffset>,
    pub summary: Summary,
    pub pattern: Histogram,
    pub revenue: Vec<MonthlyRevenue>,
    pub weekly: Vec<WeeklyVolume>,
    pub page: PageWindow,
    pub rows: Vec<CallLogRow>,
}

/// Parameters of the paged call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
    pub nav: Option<Nav>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: pagination::DEFAULT_PAGE_SIZE,
            nav: None,
        }
    }
}

/// Compute every view over `records` (newest first) as of `now`.
pub fn snapshot<Tz: TimeZone>(
    records: &[CallRecord],
    now: &DateTime<Tz>,
    view: View,
    page: PageRequest,
) -> DashboardSnapshot {
    let window = pagination::paginate(records.len(), page.page, page.page_size, page.nav);

    DashboardSnapshot {
        generated_at: now.fixed_offset(),
        summary: summary::summarize(records),
        pattern: patterns::call_pattern(records, view, now),
        revenue: revenue::monthly_revenue(records, &now.timezone()),
        weekly: weekly::weekly_volume(records),
        page: window,
        rows: pagination::page_rows(records, &window),
    }
}
