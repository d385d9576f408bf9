use crate::domain::{span_seconds, TaskList};
use crate::history::{day_key, local_midnight, History};
use chrono::{DateTime, Local, NaiveDate};

/// Fixed daily time goal: 6.5 hours.
pub const DAILY_GOAL_SECONDS: f64 = 23_400.0;

/// Seconds tracked today: closed history credit plus the live contribution
/// of every running task, clipped to today's local midnight so a run started
/// yesterday only counts its portion since midnight. This matches exactly
/// what the splitter will credit to today once the run closes.
pub fn tracked_seconds_today(
    history: &History,
    tasks: &TaskList,
    now: DateTime<Local>,
) -> f64 {
    let today = now.date_naive();
    let mut total = history.total_for_day(&day_key(today));
    let day_start = local_midnight(today);

    for task in tasks.iter() {
        if !task.running {
            continue;
        }
        if let Some(started) = task.started_at {
            total += span_seconds(started.max(day_start), now);
        }
    }
    total
}

/// Edge-triggered latch for the daily goal. Re-evaluating on every tick must
/// not re-fire the reached transition; a new calendar day resets the latch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalTracker {
    date: NaiveDate,
    reached: bool,
}

impl GoalTracker {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            reached: false,
        }
    }

    /// Restore latch state from a persisted record.
    pub fn from_parts(date: NaiveDate, reached: bool) -> Self {
        Self { date, reached }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn reached(&self) -> bool {
        self.reached
    }

    /// Feed an observation. Returns true only on the transition from below
    /// the threshold to at-or-above it, once per calendar day.
    pub fn observe(&mut self, today: NaiveDate, tracked_seconds: f64) -> bool {
        if today != self.date {
            self.date = today;
            self.reached = false;
        }
        if !self.reached && tracked_seconds >= DAILY_GOAL_SECONDS {
            self.reached = true;
            return true;
        }
        false
    }
}
