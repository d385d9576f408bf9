mod app;
mod domain;
mod encourage;
mod goal;
mod history;
mod persistence;
mod report;
mod rewards;

use anyhow::Result;
use app::AppState;
use clap::{Parser, Subcommand};
use domain::SystemClock;
use goal::DAILY_GOAL_SECONDS;
use report::format_seconds;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "A daily task tracker with stopwatch time accounting, a daily goal, and card rewards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task text
        text: Vec<String>,
    },
    /// Start a task's timer (pauses any other running task)
    Start {
        /// Task position, as shown by `list` (1-based)
        pos: usize,
    },
    /// Pause a task's timer
    Pause {
        /// Task position (1-based)
        pos: usize,
    },
    /// Toggle a task between running and paused
    Toggle {
        /// Task position (1-based)
        pos: usize,
    },
    /// Toggle a task's completion
    Done {
        /// Task position (1-based)
        pos: usize,
    },
    /// Delete a task (crediting any in-flight time first)
    Delete {
        /// Task position (1-based)
        pos: usize,
    },
    /// List tasks with their tracked time
    List,
    /// Show today's progress against the 6.5h goal
    Status,
    /// Browse the per-day time history
    History {
        /// Day to show in detail (YYYY-MM-DD). Omit to list all days.
        date: Option<String>,
    },
    /// Show the reward card collection
    Cards,
    /// Copy tasks.json and history.json to a directory
    Export {
        /// Target directory
        dir: PathBuf,
    },
    /// Copy tasks.json and history.json from a directory
    Import {
        /// Source directory
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut app = AppState::load(Rc::new(SystemClock))?;

    match cli.command {
        Commands::Add { text } => {
            app.add_task(&text.join(" "));
        }
        Commands::Start { pos } => match to_index(pos) {
            Some(idx) => app.start(idx),
            None => app.status = format!("No task at position {}.", pos),
        },
        Commands::Pause { pos } => match to_index(pos) {
            Some(idx) => app.pause(idx),
            None => app.status = format!("No task at position {}.", pos),
        },
        Commands::Toggle { pos } => match to_index(pos) {
            Some(idx) => app.toggle_run(idx),
            None => app.status = format!("No task at position {}.", pos),
        },
        Commands::Done { pos } => match to_index(pos) {
            Some(idx) => app.toggle_done(idx),
            None => app.status = format!("No task at position {}.", pos),
        },
        Commands::Delete { pos } => match to_index(pos) {
            Some(idx) => app.delete_task(idx),
            None => app.status = format!("No task at position {}.", pos),
        },
        Commands::List => print_task_list(&app),
        Commands::Status => print_status(&app),
        Commands::History { date } => print_history(&app, date.as_deref()),
        Commands::Cards => print_cards(&app),
        Commands::Export { dir } => {
            if let Err(error) = app.export_data(&dir) {
                app.status = format!("Export failed: {}", error);
            }
        }
        Commands::Import { dir } => {
            if let Err(error) = app.import_data(&dir) {
                app.status = format!("Import failed: {}", error);
            }
        }
    }

    // Every invocation is one polling tick: the goal evaluator may fire
    // and issue today's card.
    app.tick();

    if app.needs_save {
        if let Err(error) = app.save() {
            // In-memory state stays authoritative; the user may retry.
            eprintln!("Error saving state: {}", error);
        }
    }

    println!("{}", app.status);
    Ok(())
}

/// Map a 1-based display position to a list index.
fn to_index(pos: usize) -> Option<usize> {
    pos.checked_sub(1)
}

fn print_task_list(app: &AppState) {
    if app.tasks.is_empty() {
        println!("No tasks yet.");
        return;
    }
    for (i, task) in app.tasks.iter().enumerate() {
        let mark = if task.done { "[x]" } else { "[ ]" };
        let run = if task.running { " (running)" } else { "" };
        let elapsed = app.elapsed(i).unwrap_or(0.0);
        println!(
            "{:>3}. {} {}  {}{}",
            i + 1,
            mark,
            task.text,
            format_seconds(elapsed),
            run
        );
    }
}

fn print_status(app: &AppState) {
    let today = app.tracked_seconds_today();
    println!("Total: {}", format_seconds(app.total_elapsed()));
    println!(
        "Today: {} / {}",
        format_seconds(today),
        format_seconds(DAILY_GOAL_SECONDS)
    );
    if app.goal_reached() {
        println!("Goal reached today.");
    } else {
        println!(
            "Keep going: {} left to reach 6.5h.",
            format_seconds(DAILY_GOAL_SECONDS - today)
        );
    }
}

fn print_history(app: &AppState, date: Option<&str>) {
    match date {
        Some(day) => println!("{}", report::render_day(&app.history, day)),
        None => {
            let days = report::render_day_list(&app.history);
            if days.is_empty() {
                println!("No history yet.");
                println!("Start a task and pause/complete it to generate records.");
            } else {
                for line in days {
                    println!("{}", line);
                }
            }
        }
    }
}

fn print_cards(app: &AppState) {
    let pool = &app.card_pool;
    println!("Collected {} / {}", app.ledger.owned_count(pool), pool.len());
    if pool.is_empty() {
        if let Ok(dir) = persistence::cards_dir() {
            println!("No card images yet. Put images into: {}", dir.display());
        }
        return;
    }
    for name in pool {
        let state = if app.ledger.unlocked().contains(name) {
            "Collected"
        } else {
            "Not collected"
        };
        println!("- {} ({})", name, state);
    }
}
