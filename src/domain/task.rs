use chrono::{DateTime, Local};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced to the user as status text. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Please type a task first.")]
    EmptyText,
    #[error("No task at position {0}.")]
    BadIndex(usize),
    #[error("Completed task cannot start. Uncheck first.")]
    CompletedTask,
}

/// A closed `[start, end)` run of a single task, ready to be credited to
/// history. `label` is the task text at the moment the run closed; renaming
/// a task never rewrites past history.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedRun {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub label: String,
}

impl ClosedRun {
    /// Duration in seconds, clamped at zero for clock anomalies.
    pub fn seconds(&self) -> f64 {
        span_seconds(self.start, self.end)
    }
}

/// Seconds between two instants, never negative.
pub fn span_seconds(start: DateTime<Local>, end: DateTime<Local>) -> f64 {
    ((end - start).num_milliseconds() as f64 / 1000.0).max(0.0)
}

/// A tracked task. Identity towards the UI is its list position; `id` is a
/// stable internal handle that survives reordering within a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub text: String,
    pub done: bool,
    /// Time banked while not running, in seconds.
    pub elapsed_seconds: f64,
    /// Set iff `running`.
    pub started_at: Option<DateTime<Local>>,
    pub running: bool,
}

impl Task {
    pub fn new(text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            done: false,
            elapsed_seconds: 0.0,
            started_at: None,
            running: false,
        }
    }

    /// Banked time plus the live projection of the current run. The live
    /// part is never persisted until the task pauses.
    pub fn elapsed(&self, now: DateTime<Local>) -> f64 {
        let mut elapsed = self.elapsed_seconds;
        if self.running {
            if let Some(started) = self.started_at {
                elapsed += span_seconds(started, now);
            }
        }
        elapsed
    }

    /// Close the current run, banking its time. Returns the closed interval
    /// so the caller can credit history. No-op when not running.
    fn close_run(&mut self, now: DateTime<Local>) -> Option<ClosedRun> {
        if !self.running {
            return None;
        }
        self.running = false;
        let started = self.started_at.take()?;
        self.elapsed_seconds += span_seconds(started, now);
        Some(ClosedRun {
            start: started,
            end: now,
            label: self.text.clone(),
        })
    }
}

/// Whether a start/pause toggle ended up starting or pausing the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunToggle {
    Started,
    Paused,
}

/// Ordered task list with the single-running-timer invariant: starting any
/// task pauses every other running one, modeling single-person attention.
#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&Task> {
        self.tasks.get(idx)
    }

    /// Add a task. Text is trimmed; empty text is rejected without mutation.
    pub fn add(&mut self, text: &str) -> Result<&Task, TaskError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskError::EmptyText);
        }
        self.tasks.push(Task::new(text.to_string()));
        Ok(self.tasks.last().expect("just pushed"))
    }

    fn check_index(&self, idx: usize) -> Result<(), TaskError> {
        if idx < self.tasks.len() {
            Ok(())
        } else {
            Err(TaskError::BadIndex(idx))
        }
    }

    /// Start the timer on one task, pausing every other running task first.
    /// Returns the runs closed by that forced pause. Completed tasks refuse
    /// to start.
    pub fn start(
        &mut self,
        idx: usize,
        now: DateTime<Local>,
    ) -> Result<Vec<ClosedRun>, TaskError> {
        self.check_index(idx)?;
        if self.tasks[idx].done {
            return Err(TaskError::CompletedTask);
        }

        let mut closed = Vec::new();
        for (i, task) in self.tasks.iter_mut().enumerate() {
            if i != idx {
                closed.extend(task.close_run(now));
            }
        }

        let task = &mut self.tasks[idx];
        if !task.running {
            task.running = true;
            task.started_at = Some(now);
        }
        Ok(closed)
    }

    /// Pause a task's timer, banking its time. Returns the closed run, or
    /// `None` when the task was not running.
    pub fn pause(
        &mut self,
        idx: usize,
        now: DateTime<Local>,
    ) -> Result<Option<ClosedRun>, TaskError> {
        self.check_index(idx)?;
        Ok(self.tasks[idx].close_run(now))
    }

    /// Toggle between running and paused, the UI-facing operation.
    pub fn toggle_run(
        &mut self,
        idx: usize,
        now: DateTime<Local>,
    ) -> Result<(RunToggle, Vec<ClosedRun>), TaskError> {
        self.check_index(idx)?;
        if self.tasks[idx].running {
            let closed = self.tasks[idx].close_run(now).into_iter().collect();
            Ok((RunToggle::Paused, closed))
        } else {
            let closed = self.start(idx, now)?;
            Ok((RunToggle::Started, closed))
        }
    }

    /// Toggle completion. Completing pauses first (crediting any live run);
    /// reopening never auto-resumes the timer. Returns the new done flag
    /// and any closed run.
    pub fn toggle_done(
        &mut self,
        idx: usize,
        now: DateTime<Local>,
    ) -> Result<(bool, Option<ClosedRun>), TaskError> {
        self.check_index(idx)?;
        let task = &mut self.tasks[idx];
        if task.done {
            task.done = false;
            task.running = false;
            task.started_at = None;
            Ok((false, None))
        } else {
            let closed = task.close_run(now);
            task.done = true;
            Ok((true, closed))
        }
    }

    /// Delete a task, force-pausing it first so in-flight time is credited
    /// before removal. Positions above `idx` shift down by one.
    pub fn delete(
        &mut self,
        idx: usize,
        now: DateTime<Local>,
    ) -> Result<(Task, Option<ClosedRun>), TaskError> {
        self.check_index(idx)?;
        let closed = self.tasks[idx].close_run(now);
        Ok((self.tasks.remove(idx), closed))
    }

    pub fn elapsed(&self, idx: usize, now: DateTime<Local>) -> Result<f64, TaskError> {
        self.check_index(idx)?;
        Ok(self.tasks[idx].elapsed(now))
    }

    /// Sum of elapsed time across every task, live runs included.
    pub fn total_elapsed(&self, now: DateTime<Local>) -> f64 {
        self.tasks.iter().map(|t| t.elapsed(now)).sum()
    }

    /// Pause every running task. Shutdown discipline: skipping this before
    /// the final save silently drops the in-progress session's time.
    pub fn pause_all(&mut self, now: DateTime<Local>) -> Vec<ClosedRun> {
        self.tasks
            .iter_mut()
            .filter_map(|task| task.close_run(now))
            .collect()
    }

    pub fn running_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.running).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 5, h, m, s).unwrap()
    }

    fn list_of(names: &[&str]) -> TaskList {
        let mut list = TaskList::default();
        for name in names {
            list.add(name).unwrap();
        }
        list
    }

    #[test]
    fn test_add_rejects_empty_text() {
        let mut list = TaskList::default();
        assert_eq!(list.add("   "), Err(TaskError::EmptyText));
        assert!(list.is_empty());

        list.add("  write tests  ").unwrap();
        assert_eq!(list.get(0).unwrap().text, "write tests");
    }

    #[test]
    fn test_start_sets_running_and_start_time() {
        let mut list = list_of(&["a"]);
        let closed = list.start(0, at(10, 0, 0)).unwrap();
        assert!(closed.is_empty());

        let task = list.get(0).unwrap();
        assert!(task.running);
        assert_eq!(task.started_at, Some(at(10, 0, 0)));
    }

    #[test]
    fn test_start_refuses_completed_task() {
        let mut list = list_of(&["a"]);
        list.toggle_done(0, at(9, 0, 0)).unwrap();
        assert_eq!(list.start(0, at(10, 0, 0)), Err(TaskError::CompletedTask));
        assert_eq!(list.running_count(), 0);
    }

    #[test]
    fn test_start_pauses_every_other_running_task() {
        let mut list = list_of(&["a", "b", "c"]);
        list.start(0, at(9, 0, 0)).unwrap();

        let closed = list.start(2, at(9, 30, 0)).unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].label, "a");
        assert_eq!(closed[0].seconds(), 1800.0);

        assert_eq!(list.running_count(), 1);
        assert!(list.get(2).unwrap().running);
        assert_eq!(list.get(0).unwrap().elapsed_seconds, 1800.0);
    }

    #[test]
    fn test_elapsed_is_live_while_running_and_frozen_after_pause() {
        let mut list = list_of(&["a"]);
        list.start(0, at(10, 0, 0)).unwrap();

        let early = list.elapsed(0, at(10, 0, 30)).unwrap();
        let late = list.elapsed(0, at(10, 5, 0)).unwrap();
        assert!(late >= early);
        assert_eq!(late, 300.0);

        list.pause(0, at(10, 5, 0)).unwrap();
        assert_eq!(list.elapsed(0, at(11, 0, 0)).unwrap(), 300.0);
        assert_eq!(list.elapsed(0, at(12, 0, 0)).unwrap(), 300.0);
    }

    #[test]
    fn test_pause_returns_closed_run_once() {
        let mut list = list_of(&["a"]);
        list.start(0, at(10, 0, 0)).unwrap();

        let run = list.pause(0, at(10, 10, 0)).unwrap().unwrap();
        assert_eq!(run.start, at(10, 0, 0));
        assert_eq!(run.end, at(10, 10, 0));
        assert_eq!(run.label, "a");

        // Pausing a paused task is a no-op.
        assert!(list.pause(0, at(10, 20, 0)).unwrap().is_none());
        assert_eq!(list.get(0).unwrap().elapsed_seconds, 600.0);
    }

    #[test]
    fn test_clock_backwards_banks_nothing() {
        let mut list = list_of(&["a"]);
        list.start(0, at(10, 0, 0)).unwrap();

        let run = list.pause(0, at(9, 0, 0)).unwrap().unwrap();
        assert_eq!(run.seconds(), 0.0);
        assert_eq!(list.get(0).unwrap().elapsed_seconds, 0.0);
        assert!(!list.get(0).unwrap().running);
    }

    #[test]
    fn test_toggle_done_pauses_first() {
        let mut list = list_of(&["a"]);
        list.start(0, at(10, 0, 0)).unwrap();

        let (done, closed) = list.toggle_done(0, at(10, 15, 0)).unwrap();
        assert!(done);
        assert_eq!(closed.unwrap().seconds(), 900.0);

        let task = list.get(0).unwrap();
        assert!(task.done);
        assert!(!task.running);
        assert!(task.started_at.is_none());
    }

    #[test]
    fn test_reopen_does_not_resume_timer() {
        let mut list = list_of(&["a"]);
        list.start(0, at(10, 0, 0)).unwrap();
        list.toggle_done(0, at(10, 15, 0)).unwrap();

        let (done, closed) = list.toggle_done(0, at(11, 0, 0)).unwrap();
        assert!(!done);
        assert!(closed.is_none());

        let task = list.get(0).unwrap();
        assert!(!task.running);
        assert!(task.started_at.is_none());
        assert_eq!(task.elapsed_seconds, 900.0);
    }

    #[test]
    fn test_delete_closes_live_run() {
        let mut list = list_of(&["a", "b"]);
        list.start(1, at(10, 0, 0)).unwrap();

        let (removed, closed) = list.delete(1, at(10, 0, 10)).unwrap();
        assert_eq!(removed.text, "b");
        assert_eq!(closed.unwrap().seconds(), 10.0);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().text, "a");
    }

    #[test]
    fn test_toggle_run_switches_states() {
        let mut list = list_of(&["a"]);

        let (outcome, _) = list.toggle_run(0, at(10, 0, 0)).unwrap();
        assert_eq!(outcome, RunToggle::Started);

        let (outcome, closed) = list.toggle_run(0, at(10, 1, 0)).unwrap();
        assert_eq!(outcome, RunToggle::Paused);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].seconds(), 60.0);
    }

    #[test]
    fn test_pause_all_closes_every_live_run() {
        let mut list = list_of(&["a", "b"]);
        list.start(0, at(10, 0, 0)).unwrap();
        // Exclusivity means only one can be running; pause_all still sweeps.
        let closed = list.pause_all(at(10, 30, 0));
        assert_eq!(closed.len(), 1);
        assert_eq!(list.running_count(), 0);
    }

    #[test]
    fn test_at_most_one_running_is_a_standing_property() {
        let mut list = list_of(&["a", "b", "c", "d"]);
        let mut now = at(9, 0, 0);
        for idx in [0, 2, 1, 3, 0] {
            now += Duration::minutes(5);
            list.start(idx, now).unwrap();
            assert!(list.running_count() <= 1);
        }
    }

    #[test]
    fn test_bad_index_reported_not_panicked() {
        let mut list = list_of(&["a"]);
        assert_eq!(list.start(5, at(9, 0, 0)), Err(TaskError::BadIndex(5)));
        assert_eq!(
            list.pause(5, at(9, 0, 0)),
            Err(TaskError::BadIndex(5))
        );
    }
}
