//! Cost totals grouped by calendar month.
//!
//! Months are keyed by (year, month) so "Jan 2024" and "Jan 2025" never
//! merge. Labels are the short month name; once the series spans more than
//! one year every label carries its year.

use std::collections::BTreeMap;

use chrono::{Datelike, TimeZone};
use serde::Serialize;

use crate::records::CallRecord;

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Revenue for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
    pub label: String,
    pub total_cost: f64,
    pub calls: usize,
}

/// Sum costs per calendar month in `tz`, ordered chronologically.
///
/// Records without a valid start time are excluded.
pub fn monthly_revenue<Tz: TimeZone>(records: &[CallRecord], tz: &Tz) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();

    for record in records {
        let Some(start) = record.start_time else {
            continue;
        };
        let local = start.with_timezone(tz);
        let entry = months.entry((local.year(), local.month())).or_default();
        entry.0 += record.total_cost;
        entry.1 += 1;
    }

    let multi_year = months
        .keys()
        .next()
        .zip(months.keys().next_back())
        .is_some_and(|(first, last)| first.0 != last.0);

    months
        .into_iter()
        .map(|((year, month), (total_cost, calls))| MonthlyRevenue {
            year,
            month,
            label: month_label(year, month, multi_year),
            total_cost,
            calls,
        })
        .collect()
}

fn month_label(year: i32, month: u32, with_year: bool) -> String {
    let name = MONTH_ABBR[(month.clamp(1, 12) - 1) as usize];
    if with_year {
        format!("{name} {year}")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn call(id: &str, ts: Option<DateTime<Utc>>, cost: f64) -> CallRecord {
        CallRecord {
            start_time: ts,
            total_cost: cost,
            ..CallRecord::new(id)
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).single()
    }

    #[test]
    fn months_sort_chronologically_not_by_insertion() {
        let records = vec![
            call("feb", ymd(2024, 2, 3), 10.0),
            call("jan", ymd(2024, 1, 20), 5.0),
        ];
        let out = monthly_revenue(&records, &Utc);
        let pairs: Vec<(&str, f64)> = out.iter().map(|m| (m.label.as_str(), m.total_cost)).collect();
        assert_eq!(pairs, vec![("Jan", 5.0), ("Feb", 10.0)]);
    }

    #[test]
    fn months_that_sort_wrong_alphabetically() {
        let records = vec![
            call("dec", ymd(2024, 12, 1), 1.0),
            call("apr", ymd(2024, 4, 1), 1.0),
            call("aug", ymd(2024, 8, 1), 1.0),
        ];
        let labels: Vec<String> = monthly_revenue(&records, &Utc)
            .into_iter()
            .map(|m| m.label)
            .collect();
        assert_eq!(labels, vec!["Apr", "Aug", "Dec"]);
    }

    #[test]
    fn same_month_in_different_years_stays_separate() {
        let records = vec![
            call("jan25", ymd(2025, 1, 5), 7.0),
            call("jan24", ymd(2024, 1, 5), 3.0),
            call("jan24b", ymd(2024, 1, 9), 1.0),
        ];
        let out = monthly_revenue(&records, &Utc);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].label, "Jan 2024");
        assert_eq!(out[0].total_cost, 4.0);
        assert_eq!(out[0].calls, 2);
        assert_eq!(out[1].label, "Jan 2025");
        assert_eq!(out[1].total_cost, 7.0);
    }

    #[test]
    fn undated_records_are_excluded() {
        let records = vec![call("none", None, 99.0), call("ok", ymd(2024, 3, 1), 2.0)];
        let out = monthly_revenue(&records, &Utc);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].total_cost, 2.0);
    }

    #[test]
    fn empty_input_yields_empty_series() {
        assert!(monthly_revenue(&[], &Utc).is_empty());
    }
}
