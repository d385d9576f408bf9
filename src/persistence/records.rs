use super::files::{atomic_write, read_file};
use crate::domain::{span_seconds, Task, TaskList};
use crate::encourage;
use crate::goal::GoalTracker;
use crate::history::{DayTotals, History};
use crate::rewards::RewardLedger;
use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use uuid::Uuid;

/// Persisted task shape, matching the tasks.json wire format. Older files
/// may carry an active start time with no explicit running flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub text: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub elapsed_seconds: f64,
    #[serde(default)]
    pub started_at: Option<f64>,
    #[serde(default)]
    pub running: bool,
}

/// Persisted reward ledger shape (cards_state.json).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardStateRecord {
    #[serde(default)]
    pub unlocked: Vec<String>,
    #[serde(default)]
    pub awarded_dates: BTreeMap<String, String>,
}

/// App metadata (meta.json): the daily goal latch, so the reached
/// transition stays edge-triggered across process restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaRecord {
    #[serde(default)]
    pub goal_date: Option<String>,
    #[serde(default)]
    pub goal_reached: bool,
}

fn epoch_to_local(ts: f64) -> Option<DateTime<Local>> {
    if !ts.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis((ts * 1000.0).round() as i64)
        .map(|dt| dt.with_timezone(&Local))
}

fn local_to_epoch(dt: DateTime<Local>) -> f64 {
    dt.timestamp_millis() as f64 / 1000.0
}

/// Turn one persisted record into a live task, applying the restart
/// recovery rule: a stored start time on a record not flagged running is a
/// stale timer from an unclean exit - fold it into elapsed and load paused.
/// A record legitimately flagged running keeps its start time as-is.
fn migrate_task_record(record: TaskRecord, now: DateTime<Local>) -> Option<Task> {
    let text = record.text.trim().to_string();
    if text.is_empty() {
        return None;
    }

    let done = record.done;
    let mut elapsed_seconds = if record.elapsed_seconds.is_finite() {
        record.elapsed_seconds.max(0.0)
    } else {
        0.0
    };

    let mut running = record.running && !done;
    let mut started_at = None;
    match record.started_at.and_then(epoch_to_local) {
        Some(started) if running => started_at = Some(started),
        Some(started) if !done => elapsed_seconds += span_seconds(started, now),
        _ => {}
    }
    // running without a start time cannot advance; load it paused.
    if started_at.is_none() {
        running = false;
    }

    Some(Task {
        id: Uuid::new_v4(),
        text,
        done,
        elapsed_seconds,
        started_at,
        running,
    })
}

/// Load the task list. Malformed records are dropped individually; a
/// missing or unreadable file resets the list to empty.
pub fn load_tasks(path: &Path, now: DateTime<Local>) -> TaskList {
    let content = read_file(path).unwrap_or_default();
    if content.is_empty() {
        return TaskList::default();
    }

    let raw: Vec<serde_json::Value> = match serde_json::from_str(&content) {
        Ok(serde_json::Value::Array(items)) => items,
        _ => return TaskList::default(),
    };

    let tasks = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value::<TaskRecord>(value).ok())
        .filter_map(|record| migrate_task_record(record, now))
        .collect();
    TaskList::new(tasks)
}

pub fn save_tasks(path: &Path, tasks: &TaskList) -> Result<()> {
    let records: Vec<TaskRecord> = tasks
        .iter()
        .map(|task| TaskRecord {
            text: task.text.clone(),
            done: task.done,
            elapsed_seconds: task.elapsed_seconds,
            started_at: task.started_at.map(local_to_epoch),
            running: task.running,
        })
        .collect();
    let json = serde_json::to_string_pretty(&records)?;
    atomic_write(path, &json)
}

/// Load history. Malformed day entries are dropped individually; a corrupt
/// file resets to empty.
pub fn load_history(path: &Path) -> History {
    let content = read_file(path).unwrap_or_default();
    if content.is_empty() {
        return History::default();
    }

    let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&content) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        _ => return History::default(),
    };

    let days = raw
        .into_iter()
        .filter_map(|(day, value)| {
            serde_json::from_value::<DayTotals>(value)
                .ok()
                .filter(|totals| totals.total_seconds.is_finite())
                .map(|totals| (day, totals))
        })
        .collect();
    History::new(days)
}

pub fn save_history(path: &Path, history: &History) -> Result<()> {
    let json = serde_json::to_string_pretty(history.days())?;
    atomic_write(path, &json)
}

/// Load the reward ledger, trimming identifiers and dropping empties.
pub fn load_card_state(path: &Path) -> RewardLedger {
    let content = read_file(path).unwrap_or_default();
    let record: CardStateRecord = if content.is_empty() {
        CardStateRecord::default()
    } else {
        serde_json::from_str(&content).unwrap_or_default()
    };

    let unlocked: BTreeSet<String> = record
        .unlocked
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    let awarded_dates: BTreeMap<String, String> = record
        .awarded_dates
        .into_iter()
        .map(|(day, card)| (day.trim().to_string(), card.trim().to_string()))
        .filter(|(day, card)| !day.is_empty() && !card.is_empty())
        .collect();
    RewardLedger::new(unlocked, awarded_dates)
}

pub fn save_card_state(path: &Path, ledger: &RewardLedger) -> Result<()> {
    let record = CardStateRecord {
        unlocked: ledger.unlocked().iter().cloned().collect(),
        awarded_dates: ledger.awarded_dates().clone(),
    };
    let json = serde_json::to_string_pretty(&record)?;
    atomic_write(path, &json)
}

/// Load encouragement lines, falling back to the built-in defaults on a
/// missing or malformed file.
pub fn load_encouragements(path: &Path) -> Vec<String> {
    let content = read_file(path).unwrap_or_default();
    if content.is_empty() {
        return encourage::default_lines();
    }

    let lines: Vec<String> = match serde_json::from_str::<Vec<serde_json::Value>>(&content) {
        Ok(values) => values
            .iter()
            .filter_map(|value| value.as_str())
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    };
    if lines.is_empty() {
        encourage::default_lines()
    } else {
        lines
    }
}

/// Restore the goal latch. A record from any day other than today starts a
/// fresh attempt.
pub fn load_goal(path: &Path, today: NaiveDate) -> GoalTracker {
    let content = read_file(path).unwrap_or_default();
    let record: MetaRecord = if content.is_empty() {
        MetaRecord::default()
    } else {
        serde_json::from_str(&content).unwrap_or_default()
    };

    let recorded_today = record
        .goal_date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .map(|date| date == today)
        .unwrap_or(false);
    if recorded_today {
        GoalTracker::from_parts(today, record.goal_reached)
    } else {
        GoalTracker::new(today)
    }
}

pub fn save_goal(path: &Path, goal: &GoalTracker) -> Result<()> {
    let record = MetaRecord {
        goal_date: Some(goal.date().format("%Y-%m-%d").to_string()),
        goal_reached: goal.reached(),
    };
    let json = serde_json::to_string_pretty(&record)?;
    atomic_write(path, &json)
}
