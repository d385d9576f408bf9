use crate::domain::{Clock, RunToggle, TaskError, TaskList};
use crate::encourage;
use crate::goal::{tracked_seconds_today, GoalTracker, DAILY_GOAL_SECONDS};
use crate::history::{day_key, History};
use crate::persistence;
use crate::rewards::{Award, RewardLedger};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Where each store lives on disk. Absent for in-memory engines (tests).
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub tasks: PathBuf,
    pub history: PathBuf,
    pub cards_state: PathBuf,
    pub meta: PathBuf,
}

/// The engine facade the UI drives: task timers, history, the daily goal,
/// and the reward ledger, plus a status line describing the last operation.
pub struct AppState {
    pub tasks: TaskList,
    pub history: History,
    pub goal: GoalTracker,
    pub ledger: RewardLedger,
    pub encouragements: Vec<String>,
    pub card_pool: Vec<String>,
    pub status: String,
    pub needs_save: bool,
    clock: Rc<dyn Clock>,
    paths: Option<StorePaths>,
}

impl AppState {
    /// Load every store from the data directory. Corrupt or missing files
    /// reset to empty state rather than failing.
    pub fn load(clock: Rc<dyn Clock>) -> Result<Self> {
        let now = clock.now();
        let paths = StorePaths {
            tasks: persistence::tasks_file()?,
            history: persistence::history_file()?,
            cards_state: persistence::cards_state_file()?,
            meta: persistence::meta_file()?,
        };

        let tasks = persistence::load_tasks(&paths.tasks, now);
        let history = persistence::load_history(&paths.history);
        let goal = persistence::load_goal(&paths.meta, now.date_naive());
        let ledger = persistence::load_card_state(&paths.cards_state);
        let encouragements =
            persistence::load_encouragements(&persistence::encouragements_file()?);
        let card_pool = crate::rewards::scan_pool(&persistence::cards_dir()?);

        Ok(Self {
            tasks,
            history,
            goal,
            ledger,
            encouragements,
            card_pool,
            status: "Ready".to_string(),
            needs_save: false,
            clock,
            paths: Some(paths),
        })
    }

    /// Assemble an engine from parts, without disk stores.
    pub fn with_parts(
        tasks: TaskList,
        history: History,
        goal: GoalTracker,
        ledger: RewardLedger,
        card_pool: Vec<String>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            tasks,
            history,
            goal,
            ledger,
            encouragements: encourage::default_lines(),
            card_pool,
            status: "Ready".to_string(),
            needs_save: false,
            clock,
            paths: None,
        }
    }

    fn report(&mut self, error: TaskError) {
        self.status = error.to_string();
    }

    fn credit_runs<I>(&mut self, runs: I)
    where
        I: IntoIterator<Item = crate::domain::ClosedRun>,
    {
        for run in runs {
            self.history.credit_run(&run);
        }
    }

    pub fn add_task(&mut self, text: &str) {
        match self.tasks.add(text) {
            Ok(task) => {
                self.status = format!("Added: \"{}\"", task.text);
                self.needs_save = true;
            }
            Err(error) => self.report(error),
        }
    }

    /// Start a task's timer, pausing every other running task.
    pub fn start(&mut self, idx: usize) {
        let now = self.clock.now();
        match self.tasks.start(idx, now) {
            Ok(closed) => {
                self.credit_runs(closed);
                let text = self.tasks.get(idx).map(|t| t.text.clone()).unwrap_or_default();
                self.status = format!("Started: \"{}\"", text);
                self.needs_save = true;
            }
            Err(error) => self.report(error),
        }
    }

    /// Pause a task's timer, crediting the closed run to history.
    pub fn pause(&mut self, idx: usize) {
        let now = self.clock.now();
        match self.tasks.pause(idx, now) {
            Ok(closed) => {
                self.credit_runs(closed);
                let text = self.tasks.get(idx).map(|t| t.text.clone()).unwrap_or_default();
                self.status = format!("Paused: \"{}\"", text);
                self.needs_save = true;
            }
            Err(error) => self.report(error),
        }
    }

    /// Start/pause switch, the row-button operation.
    pub fn toggle_run(&mut self, idx: usize) {
        let now = self.clock.now();
        match self.tasks.toggle_run(idx, now) {
            Ok((outcome, closed)) => {
                self.credit_runs(closed);
                let text = self.tasks.get(idx).map(|t| t.text.clone()).unwrap_or_default();
                self.status = match outcome {
                    RunToggle::Started => format!("Started: \"{}\"", text),
                    RunToggle::Paused => format!("Paused: \"{}\"", text),
                };
                self.needs_save = true;
            }
            Err(error) => self.report(error),
        }
    }

    /// Complete (pausing first) or reopen a task.
    pub fn toggle_done(&mut self, idx: usize) {
        let now = self.clock.now();
        match self.tasks.toggle_done(idx, now) {
            Ok((done, closed)) => {
                self.credit_runs(closed);
                let text = self.tasks.get(idx).map(|t| t.text.clone()).unwrap_or_default();
                self.status = if done {
                    format!("Completed: \"{}\"", text)
                } else {
                    format!("Reopened: \"{}\"", text)
                };
                self.needs_save = true;
            }
            Err(error) => self.report(error),
        }
    }

    /// Delete a task, crediting any in-flight time first.
    pub fn delete_task(&mut self, idx: usize) {
        let now = self.clock.now();
        match self.tasks.delete(idx, now) {
            Ok((removed, closed)) => {
                self.credit_runs(closed);
                self.status = format!("Deleted: \"{}\"", removed.text);
                self.needs_save = true;
            }
            Err(error) => self.report(error),
        }
    }

    pub fn elapsed(&self, idx: usize) -> Option<f64> {
        self.tasks.elapsed(idx, self.clock.now()).ok()
    }

    pub fn total_elapsed(&self) -> f64 {
        self.tasks.total_elapsed(self.clock.now())
    }

    pub fn tracked_seconds_today(&self) -> f64 {
        tracked_seconds_today(&self.history, &self.tasks, self.clock.now())
    }

    pub fn goal_reached(&self) -> bool {
        self.tracked_seconds_today() >= DAILY_GOAL_SECONDS
    }

    /// One polling tick: re-evaluate the goal and, on the once-per-day
    /// reached transition, issue the daily card. Returns the award when
    /// the transition fired.
    pub fn tick(&mut self) -> Option<Award> {
        let now = self.clock.now();
        let tracked = tracked_seconds_today(&self.history, &self.tasks, now);
        if !self.goal.observe(now.date_naive(), tracked) {
            return None;
        }

        let mut rng = rand::thread_rng();
        let message = encourage::pick(&self.encouragements, &mut rng);
        let award = self
            .ledger
            .award(&day_key(now.date_naive()), &self.card_pool, &mut rng);
        let reward_text = match &award {
            Award::Unlocked(name) => format!("New card unlocked: {}", name),
            Award::AlreadyAwarded(name) => format!("Today's card: {}", name),
            Award::AllCollected => "All cards are already collected.".to_string(),
            Award::EmptyPool => "Card folder is empty.".to_string(),
        };
        self.status = format!("Goal reached: {} {}", message, reward_text);

        if let Some(paths) = &self.paths {
            if let Err(error) = persistence::save_card_state(&paths.cards_state, &self.ledger)
                .and_then(|_| persistence::save_goal(&paths.meta, &self.goal))
            {
                self.status = format!("{} (save failed: {})", self.status, error);
            }
        }
        Some(award)
    }

    /// Flush tasks, history, and the goal latch to disk. In-memory state
    /// stays authoritative whether or not the write succeeds.
    pub fn save(&mut self) -> Result<()> {
        let Some(paths) = &self.paths else {
            return Ok(());
        };
        persistence::save_tasks(&paths.tasks, &self.tasks).context("Failed to save tasks")?;
        persistence::save_history(&paths.history, &self.history)
            .context("Failed to save history")?;
        persistence::save_goal(&paths.meta, &self.goal).context("Failed to save metadata")?;
        self.needs_save = false;
        Ok(())
    }

    /// Shutdown discipline: pause every running task so in-flight time is
    /// credited, then save.
    pub fn shutdown(&mut self) -> Result<()> {
        let closed = self.tasks.pause_all(self.clock.now());
        if !closed.is_empty() {
            self.needs_save = true;
        }
        self.credit_runs(closed);
        self.save()
    }

    /// Copy tasks.json and history.json into a directory, flushing first.
    pub fn export_data(&mut self, target: &Path) -> Result<()> {
        self.save()?;
        let Some(paths) = &self.paths else {
            self.status = "No data files available to export.".to_string();
            return Ok(());
        };

        let mut exported = Vec::new();
        for (src, name) in [(&paths.tasks, "tasks"), (&paths.history, "history")] {
            if src.exists() {
                std::fs::copy(src, target.join(format!("{}.json", name)))
                    .with_context(|| format!("Failed to export {}.json", name))?;
                exported.push(name);
            }
        }

        self.status = if exported.is_empty() {
            "No data files available to export.".to_string()
        } else {
            format!("Exported: {}.", exported.join(", "))
        };
        Ok(())
    }

    /// Copy tasks.json/history.json from a directory into the data dir and
    /// reload both stores.
    pub fn import_data(&mut self, source: &Path) -> Result<()> {
        let Some(paths) = self.paths.clone() else {
            self.status = "No tasks.json/history.json found in selected folder.".to_string();
            return Ok(());
        };

        let mut imported = Vec::new();
        for (dst, name) in [(&paths.tasks, "tasks"), (&paths.history, "history")] {
            let src = source.join(format!("{}.json", name));
            if src.exists() {
                std::fs::copy(&src, dst)
                    .with_context(|| format!("Failed to import {}.json", name))?;
                imported.push(name);
            }
        }

        if imported.is_empty() {
            self.status = "No tasks.json/history.json found in selected folder.".to_string();
            return Ok(());
        }

        self.tasks = persistence::load_tasks(&paths.tasks, self.clock.now());
        self.history = persistence::load_history(&paths.history);
        self.status = format!("Imported: {}.", imported.join(", "));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ManualClock;
    use chrono::{DateTime, Duration, Local, TimeZone};
    use pretty_assertions::assert_eq;

    fn start_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap()
    }

    fn engine(clock: Rc<ManualClock>, pool: &[&str]) -> AppState {
        let date = clock.now().date_naive();
        AppState::with_parts(
            TaskList::default(),
            History::default(),
            GoalTracker::new(date),
            RewardLedger::default(),
            pool.iter().map(|s| s.to_string()).collect(),
            clock,
        )
    }

    #[test]
    fn test_add_empty_text_sets_status_without_mutation() {
        let clock = Rc::new(ManualClock::new(start_time()));
        let mut app = engine(clock, &[]);

        app.add_task("   ");
        assert_eq!(app.status, "Please type a task first.");
        assert!(app.tasks.is_empty());
        assert!(!app.needs_save);
    }

    #[test]
    fn test_start_on_completed_task_is_rejected() {
        let clock = Rc::new(ManualClock::new(start_time()));
        let mut app = engine(clock, &[]);
        app.add_task("write");
        app.toggle_done(0);

        app.start(0);
        assert_eq!(app.status, "Completed task cannot start. Uncheck first.");
        assert_eq!(app.tasks.running_count(), 0);
    }

    #[test]
    fn test_pause_credits_history_under_task_label() {
        let clock = Rc::new(ManualClock::new(start_time()));
        let mut app = engine(clock.clone(), &[]);
        app.add_task("reading");
        app.start(0);

        clock.advance(Duration::minutes(25));
        app.pause(0);

        assert_eq!(app.history.total_for_day("2024-01-05"), 1500.0);
        assert_eq!(
            app.history.breakdown_for_day("2024-01-05"),
            vec![("reading".to_string(), 1500.0)]
        );
    }

    #[test]
    fn test_delete_running_task_credits_inflight_time() {
        let clock = Rc::new(ManualClock::new(start_time()));
        let mut app = engine(clock.clone(), &[]);
        app.add_task("doomed");
        app.start(0);

        clock.advance(Duration::seconds(10));
        app.delete_task(0);

        assert!(app.tasks.is_empty());
        assert_eq!(app.history.total_for_day("2024-01-05"), 10.0);
        assert_eq!(
            app.history.breakdown_for_day("2024-01-05"),
            vec![("doomed".to_string(), 10.0)]
        );
    }

    #[test]
    fn test_live_estimate_matches_persisted_credit() {
        let clock = Rc::new(ManualClock::new(start_time()));
        let mut app = engine(clock.clone(), &[]);
        app.add_task("deep work");
        app.start(0);
        clock.advance(Duration::minutes(90));

        let live = app.tracked_seconds_today();
        app.pause(0);
        assert_eq!(app.tracked_seconds_today(), live);
    }

    #[test]
    fn test_goal_awards_exactly_once_across_many_ticks() {
        let clock = Rc::new(ManualClock::new(start_time()));
        let mut app = engine(clock.clone(), &["a.png", "b.png"]);
        app.history.credit("2024-01-05", 23_400.0, "grind");

        let mut fired = 0;
        for _ in 0..101 {
            if app.tick().is_some() {
                fired += 1;
            }
            clock.advance(Duration::seconds(1));
        }

        assert_eq!(fired, 1);
        assert_eq!(app.ledger.unlocked().len(), 1);
        assert_eq!(app.ledger.awarded_dates().len(), 1);
        assert!(app.status.starts_with("Goal reached:"));
    }

    #[test]
    fn test_goal_not_fired_below_threshold() {
        let clock = Rc::new(ManualClock::new(start_time()));
        let mut app = engine(clock, &["a.png"]);
        app.history.credit("2024-01-05", 23_399.0, "almost");
        assert!(app.tick().is_none());
        assert!(!app.goal_reached());
    }

    #[test]
    fn test_running_task_can_push_over_the_goal() {
        let clock = Rc::new(ManualClock::new(start_time()));
        let mut app = engine(clock.clone(), &["a.png"]);
        app.history.credit("2024-01-05", 23_000.0, "closed");
        app.add_task("live");
        app.start(0);

        assert!(app.tick().is_none());
        clock.advance(Duration::seconds(400));
        assert!(app.goal_reached());
        assert!(matches!(app.tick(), Some(Award::Unlocked(_))));
    }

    #[test]
    fn test_shutdown_pauses_all_and_credits() {
        let clock = Rc::new(ManualClock::new(start_time()));
        let mut app = engine(clock.clone(), &[]);
        app.add_task("session");
        app.start(0);
        clock.advance(Duration::minutes(5));

        app.shutdown().unwrap();
        assert_eq!(app.tasks.running_count(), 0);
        assert_eq!(app.history.total_for_day("2024-01-05"), 300.0);
    }

    #[test]
    fn test_start_switches_the_single_running_slot() {
        let clock = Rc::new(ManualClock::new(start_time()));
        let mut app = engine(clock.clone(), &[]);
        app.add_task("first");
        app.add_task("second");

        app.start(0);
        clock.advance(Duration::minutes(10));
        app.start(1);

        assert_eq!(app.tasks.running_count(), 1);
        assert!(app.tasks.get(1).unwrap().running);
        // The forced pause credited the first task's run.
        assert_eq!(app.history.total_for_day("2024-01-05"), 600.0);
    }
}
