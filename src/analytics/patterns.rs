//! Call-activity histograms for the current day, week, or month.
//!
//! All windows are calendar windows in the time zone of the injected `now`:
//!
//! | View    | Buckets             | Window                                      |
//! |---------|---------------------|---------------------------------------------|
//! | `day`   | 24 (hour of day)    | `[today 00:00, tomorrow 00:00)`             |
//! | `week`  | 7 (Sunday = 0)      | `[Sunday 00:00, next Sunday 00:00)`         |
//! | `month` | days in the month   | `[1st 00:00, 1st of next month 00:00)`      |
//!
//! Records without a valid start time, or outside the window, are skipped.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::records::CallRecord;

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Histogram granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Day,
    Week,
    Month,
}

impl View {
    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_ascii_lowercase().as_str() {
            "day" | "today" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
        }
    }
}

/// Fixed-length bucket counts for one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub view: View,
    /// First calendar day of the window.
    pub window_start: NaiveDate,
    /// First calendar day after the window (exclusive).
    pub window_end: NaiveDate,
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
    /// Records skipped because their start time was missing or invalid.
    pub undated: usize,
}

impl Histogram {
    /// Number of records that landed in a bucket.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Build the histogram for `view` around `now`.
pub fn call_pattern<Tz: TimeZone>(records: &[CallRecord], view: View, now: &DateTime<Tz>) -> Histogram {
    let tz = now.timezone();
    let today = now.date_naive();
    let (window_start, window_end) = window(view, today);
    let bucket_count = match view {
        View::Day => 24,
        View::Week => 7,
        View::Month => days_in_month(today.year(), today.month()) as usize,
    };

    let mut counts = vec![0usize; bucket_count];
    let mut undated = 0;

    for record in records {
        let Some(start) = record.start_time else {
            undated += 1;
            continue;
        };
        let local = start.with_timezone(&tz);
        let date = local.date_naive();
        if date < window_start || date >= window_end {
            continue;
        }

        let bucket = match view {
            View::Day => local.hour() as usize,
            View::Week => local.weekday().num_days_from_sunday() as usize,
            View::Month => local.day0() as usize,
        };
        counts[bucket] += 1;
    }

    Histogram {
        view,
        window_start,
        window_end,
        labels: labels(view, window_start, bucket_count),
        counts,
        undated,
    }
}

/// Calendar window `[start, end)` for `view` containing `today`.
pub fn window(view: View, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match view {
        View::Day => (today, today + Duration::days(1)),
        View::Week => {
            let start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
            (start, start + Duration::days(7))
        }
        View::Month => {
            let start = today.with_day(1).unwrap_or(today);
            let days = i64::from(days_in_month(today.year(), today.month()));
            (start, start + Duration::days(days))
        }
    }
}

/// Number of days in the given month (1-based).
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 31,
    }
}

/// Display labels for each bucket.
pub fn labels(view: View, window_start: NaiveDate, bucket_count: usize) -> Vec<String> {
    match view {
        View::Day => (0..bucket_count).map(|h| format!("{h:02}:00")).collect(),
        View::Week => WEEKDAYS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let date = window_start + Duration::days(i as i64);
                format!("{name} ({}/{})", date.day(), date.month())
            })
            .collect(),
        View::Month => (1..=bucket_count).map(|d| format!("Day {d}")).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn at(id: &str, ts: DateTime<Utc>) -> CallRecord {
        CallRecord {
            start_time: Some(ts),
            ..CallRecord::new(id)
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn view_parse_and_display() {
        assert_eq!(View::parse("Week"), Some(View::Week));
        assert_eq!(View::parse("month"), Some(View::Month));
        assert_eq!(View::parse("year"), None);
        assert_eq!(View::Day.to_string(), "day");
    }

    #[test]
    fn empty_input_has_correct_lengths() {
        // 2024-02-14 is a Wednesday in a leap-year February.
        let now = utc(2024, 2, 14, 12, 0, 0);
        assert_eq!(call_pattern(&[], View::Day, &now).counts, vec![0; 24]);
        assert_eq!(call_pattern(&[], View::Week, &now).counts, vec![0; 7]);
        assert_eq!(call_pattern(&[], View::Month, &now).counts, vec![0; 29]);
    }

    #[test]
    fn day_view_counts_today_only() {
        let now = utc(2024, 5, 8, 18, 0, 0);
        let records = vec![
            at("today-14", utc(2024, 5, 8, 14, 0, 0)),
            at("yesterday-14", utc(2024, 5, 7, 14, 0, 0)),
            at("tomorrow-00", utc(2024, 5, 9, 0, 0, 0)),
        ];
        let hist = call_pattern(&records, View::Day, &now);
        assert_eq!(hist.counts[14], 1);
        assert_eq!(hist.total(), 1);
    }

    #[test]
    fn week_window_starts_sunday_and_is_half_open() {
        // Wednesday 2024-05-08; week is Sun 05-05 .. Sat 05-11.
        let now = utc(2024, 5, 8, 9, 0, 0);
        let records = vec![
            at("sunday-start", utc(2024, 5, 5, 0, 0, 0)),
            at("saturday-late", utc(2024, 5, 11, 23, 59, 59)),
            at("next-sunday", utc(2024, 5, 12, 0, 0, 0)),
            at("prev-saturday", utc(2024, 5, 4, 23, 59, 59)),
        ];
        let hist = call_pattern(&records, View::Week, &now);
        assert_eq!(hist.window_start, NaiveDate::from_ymd_opt(2024, 5, 5).unwrap());
        assert_eq!(hist.counts[0], 1);
        assert_eq!(hist.counts[6], 1);
        assert_eq!(hist.total(), 2);
        assert_eq!(hist.labels[0], "Sunday (5/5)");
    }

    #[test]
    fn month_view_includes_entire_last_day() {
        let now = utc(2024, 4, 10, 12, 0, 0);
        let records = vec![
            at("first", utc(2024, 4, 1, 0, 0, 0)),
            at("last-evening", utc(2024, 4, 30, 22, 15, 0)),
            at("next-month", utc(2024, 5, 1, 0, 0, 0)),
        ];
        let hist = call_pattern(&records, View::Month, &now);
        assert_eq!(hist.counts.len(), 30);
        assert_eq!(hist.counts[0], 1);
        assert_eq!(hist.counts[29], 1);
        assert_eq!(hist.total(), 2);
        assert_eq!(hist.labels[29], "Day 30");
    }

    #[test]
    fn undated_records_are_skipped_not_fatal() {
        let now = utc(2024, 5, 8, 18, 0, 0);
        let records = vec![CallRecord::new("no-start"), at("ok", utc(2024, 5, 8, 1, 0, 0))];
        let hist = call_pattern(&records, View::Day, &now);
        assert_eq!(hist.undated, 1);
        assert_eq!(hist.total(), 1);
    }

    #[test]
    fn buckets_use_the_time_zone_of_now() {
        // 23:30 UTC on May 7 is 01:30 on May 8 at UTC+2.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = plus_two.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap();
        let records = vec![at("late-utc", utc(2024, 5, 7, 23, 30, 0))];
        let hist = call_pattern(&records, View::Day, &now);
        assert_eq!(hist.counts[1], 1);
    }

    #[test]
    fn days_in_month_handles_december_and_leap_years() {
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2024, 6), 30);
    }
}
