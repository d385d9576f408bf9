use super::split::split_interval;
use crate::domain::ClosedRun;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated totals for one calendar day. Monotonically non-decreasing;
/// entries are created lazily on first credit and never deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayTotals {
    #[serde(default)]
    pub total_seconds: f64,
    #[serde(default)]
    pub tasks: BTreeMap<String, f64>,
}

/// Per-day accumulated time, keyed by "YYYY-MM-DD". Fed exclusively by the
/// interval splitter; the UI only reads.
#[derive(Debug, Clone, Default)]
pub struct History {
    days: BTreeMap<String, DayTotals>,
}

impl History {
    pub fn new(days: BTreeMap<String, DayTotals>) -> Self {
        Self { days }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Add seconds to a day's totals, overall and under the task label.
    pub fn credit(&mut self, day_key: &str, seconds: f64, label: &str) {
        if seconds <= 0.0 {
            return;
        }
        let day = self.days.entry(day_key.to_string()).or_default();
        day.total_seconds += seconds;
        *day.tasks.entry(label.to_string()).or_insert(0.0) += seconds;
    }

    /// Split a closed run across local midnights and fold every segment in.
    pub fn credit_run(&mut self, run: &ClosedRun) {
        for (day, seconds) in split_interval(run.start, run.end) {
            self.credit(&day, seconds, &run.label);
        }
    }

    pub fn total_for_day(&self, day_key: &str) -> f64 {
        self.days.get(day_key).map_or(0.0, |d| d.total_seconds)
    }

    /// Task breakdown for a day, sorted descending by seconds.
    pub fn breakdown_for_day(&self, day_key: &str) -> Vec<(String, f64)> {
        let mut rows: Vec<(String, f64)> = self
            .days
            .get(day_key)
            .map(|d| d.tasks.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        rows
    }

    /// All recorded days, newest first (for history browsing).
    pub fn all_days(&self) -> Vec<String> {
        self.days.keys().rev().cloned().collect()
    }

    pub fn days(&self) -> &BTreeMap<String, DayTotals> {
        &self.days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_credit_accumulates_per_day_and_label() {
        let mut history = History::default();
        history.credit("2024-01-05", 600.0, "reading");
        history.credit("2024-01-05", 300.0, "reading");
        history.credit("2024-01-05", 100.0, "writing");

        assert_eq!(history.total_for_day("2024-01-05"), 1000.0);
        assert_eq!(
            history.breakdown_for_day("2024-01-05"),
            vec![("reading".to_string(), 900.0), ("writing".to_string(), 100.0)]
        );
    }

    #[test]
    fn test_zero_credit_creates_no_entry() {
        let mut history = History::default();
        history.credit("2024-01-05", 0.0, "reading");
        assert!(history.is_empty());
    }

    #[test]
    fn test_missing_day_reads_as_empty() {
        let history = History::default();
        assert_eq!(history.total_for_day("2024-01-05"), 0.0);
        assert!(history.breakdown_for_day("2024-01-05").is_empty());
    }

    #[test]
    fn test_all_days_newest_first() {
        let mut history = History::default();
        history.credit("2024-01-05", 10.0, "a");
        history.credit("2024-01-07", 10.0, "a");
        history.credit("2024-01-06", 10.0, "a");

        assert_eq!(
            history.all_days(),
            vec!["2024-01-07", "2024-01-06", "2024-01-05"]
        );
    }

    #[test]
    fn test_credit_run_splits_across_midnight() {
        let mut history = History::default();
        let run = ClosedRun {
            start: Local.with_ymd_and_hms(2024, 1, 5, 23, 0, 0).unwrap(),
            end: Local.with_ymd_and_hms(2024, 1, 6, 1, 0, 0).unwrap(),
            label: "night shift".to_string(),
        };
        history.credit_run(&run);

        assert_eq!(history.total_for_day("2024-01-05"), 3600.0);
        assert_eq!(history.total_for_day("2024-01-06"), 3600.0);
        assert_eq!(
            history.breakdown_for_day("2024-01-06"),
            vec![("night shift".to_string(), 3600.0)]
        );
    }
}
