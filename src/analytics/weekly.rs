//! Call volume per upstream week label.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::records::CallRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyVolume {
    pub week_number: u32,
    pub label: String,
    pub calls: usize,
}

/// Count records per week number, ascending. Records without one are skipped.
///
/// Week numbers come from the data source as opaque labels; nothing here
/// derives them from dates.
pub fn weekly_volume(records: &[CallRecord]) -> Vec<WeeklyVolume> {
    let mut weeks: BTreeMap<u32, usize> = BTreeMap::new();
    for week in records.iter().filter_map(|r| r.week_number) {
        *weeks.entry(week).or_default() += 1;
    }

    weeks
        .into_iter()
        .map(|(week_number, calls)| WeeklyVolume {
            week_number,
            label: format!("Week {week_number}"),
            calls,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(id: &str, n: Option<u32>) -> CallRecord {
        CallRecord {
            week_number: n,
            ..CallRecord::new(id)
        }
    }

    #[test]
    fn groups_and_sorts_numerically() {
        let records = vec![week("a", Some(2)), week("b", Some(2)), week("c", Some(1))];
        let pairs: Vec<(u32, usize)> = weekly_volume(&records)
            .iter()
            .map(|w| (w.week_number, w.calls))
            .collect();
        assert_eq!(pairs, vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn double_digit_weeks_sort_after_single_digit() {
        let records = vec![week("a", Some(10)), week("b", Some(9))];
        let out = weekly_volume(&records);
        assert_eq!(out[0].week_number, 9);
        assert_eq!(out[1].label, "Week 10");
    }

    #[test]
    fn records_without_week_are_excluded() {
        let records = vec![week("a", None), week("b", Some(3))];
        let out = weekly_volume(&records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].calls, 1);
    }
}
