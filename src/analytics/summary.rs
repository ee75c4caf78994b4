//! Summary counters: totals, status breakdown, and the upstream running totals.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::records::{CallRecord, CallStatus};

/// Closed set of status buckets used for percentage breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Incoming,
    Outgoing,
    Missed,
    Other,
}

impl StatusCategory {
    pub const ALL: [StatusCategory; 4] = [
        StatusCategory::Incoming,
        StatusCategory::Outgoing,
        StatusCategory::Missed,
        StatusCategory::Other,
    ];
}

impl From<&CallStatus> for StatusCategory {
    fn from(status: &CallStatus) -> Self {
        match status {
            CallStatus::Incoming => Self::Incoming,
            CallStatus::Outgoing => Self::Outgoing,
            CallStatus::Missed => Self::Missed,
            CallStatus::Other(_) => Self::Other,
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoming => write!(f, "incoming"),
            Self::Outgoing => write!(f, "outgoing"),
            Self::Missed => write!(f, "missed"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Running totals carried by the newest record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatestTotals {
    pub cumulative_total_cost: f64,
    pub avg_cost_per_minute: f64,
}

/// Aggregate counters over a batch of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_calls: usize,
    pub total_cost: f64,
    pub total_duration_minutes: f64,
    /// Always holds every [`StatusCategory`].
    pub status_counts: BTreeMap<StatusCategory, usize>,
    /// Always holds every [`StatusCategory`]; all zero when there are no calls.
    pub status_percentages: BTreeMap<StatusCategory, f64>,
    /// Raw values that landed in [`StatusCategory::Other`]. Missing status is `""`.
    pub other_statuses: BTreeMap<String, usize>,
    pub latest: LatestTotals,
}

impl Summary {
    pub fn count(&self, category: StatusCategory) -> usize {
        self.status_counts.get(&category).copied().unwrap_or(0)
    }

    pub fn pct(&self, category: StatusCategory) -> f64 {
        self.status_percentages.get(&category).copied().unwrap_or(0.0)
    }
}

/// Compute the summary for `records`.
///
/// `records` are expected newest first, so the running totals are read from
/// the first record.
pub fn summarize(records: &[CallRecord]) -> Summary {
    let mut status_counts: BTreeMap<StatusCategory, usize> =
        StatusCategory::ALL.iter().map(|c| (*c, 0)).collect();
    let mut other_statuses: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_cost = 0.0;
    let mut total_duration_minutes = 0.0;

    for record in records {
        total_cost += record.total_cost;
        total_duration_minutes += record.duration_minutes();

        let category = StatusCategory::from(&record.status);
        *status_counts.entry(category).or_default() += 1;
        if let CallStatus::Other(raw) = &record.status {
            *other_statuses.entry(raw.clone()).or_default() += 1;
        }
    }

    let total_calls = records.len();
    let status_percentages = status_counts
        .iter()
        .map(|(category, &count)| (*category, percentage(count, total_calls)))
        .collect();

    let latest = records
        .first()
        .map(|newest| LatestTotals {
            cumulative_total_cost: newest.cumulative_total_cost.unwrap_or(0.0),
            avg_cost_per_minute: newest.avg_cost_per_minute.unwrap_or(0.0),
        })
        .unwrap_or_default();

    Summary {
        total_calls,
        total_cost,
        total_duration_minutes,
        status_counts,
        status_percentages,
        other_statuses,
        latest,
    }
}

/// `100 * count / total`, or 0.0 when `total` is zero.
fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, status: &str, cost: f64) -> CallRecord {
        CallRecord {
            status: CallStatus::parse(Some(status)),
            total_cost: cost,
            ..CallRecord::new(id)
        }
    }

    #[test]
    fn empty_input_is_all_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_calls, 0);
        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.latest, LatestTotals::default());
        for category in StatusCategory::ALL {
            assert_eq!(summary.count(category), 0);
            let pct = summary.pct(category);
            assert_eq!(pct, 0.0);
            assert!(pct.is_finite());
        }
    }

    #[test]
    fn counts_and_costs() {
        let records = vec![
            call("a", "incoming", 1.5),
            call("b", "incoming", 0.5),
            call("c", "missed", 0.0),
            call("d", "outgoing", 2.0),
        ];
        let summary = summarize(&records);

        assert_eq!(summary.total_calls, 4);
        assert!((summary.total_cost - 4.0).abs() < 1e-9);
        assert_eq!(summary.count(StatusCategory::Incoming), 2);
        assert!((summary.pct(StatusCategory::Incoming) - 50.0).abs() < 1e-9);
        assert!((summary.pct(StatusCategory::Missed) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_statuses_go_to_other_and_percentages_sum_to_100() {
        let records = vec![
            call("a", "incoming", 0.0),
            call("b", "voicemail", 0.0),
            call("c", "voicemail", 0.0),
            CallRecord::new("d"),
            call("e", "forwarded", 0.0),
            call("f", "outgoing", 0.0),
        ];
        let summary = summarize(&records);

        assert_eq!(summary.count(StatusCategory::Other), 4);
        assert_eq!(summary.other_statuses.get("voicemail"), Some(&2));
        assert_eq!(summary.other_statuses.get(""), Some(&1));
        let sum: f64 = summary.status_percentages.values().sum();
        assert!((sum - 100.0).abs() < 0.01);
    }

    #[test]
    fn latest_totals_come_from_first_record() {
        let mut newest = call("new", "incoming", 1.0);
        newest.cumulative_total_cost = Some(42.5);
        newest.avg_cost_per_minute = Some(0.12);
        let mut older = call("old", "incoming", 1.0);
        older.cumulative_total_cost = Some(41.5);

        let summary = summarize(&[newest, older]);
        assert_eq!(summary.latest.cumulative_total_cost, 42.5);
        assert_eq!(summary.latest.avg_cost_per_minute, 0.12);
    }

    #[test]
    fn duration_minutes_are_summed() {
        let mut a = CallRecord::new("a");
        a.duration_seconds = 150;
        let mut b = CallRecord::new("b");
        b.duration_seconds = 30;
        let summary = summarize(&[a, b]);
        assert!((summary.total_duration_minutes - 3.0).abs() < 1e-9);
    }

    #[test]
    fn summary_serializes_category_keys() {
        let summary = summarize(&[call("a", "missed", 0.0)]);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"missed\":1"));
        assert!(json.contains("\"other\":0"));
    }
}
