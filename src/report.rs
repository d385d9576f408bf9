use crate::goal::DAILY_GOAL_SECONDS;
use crate::history::History;

/// Format seconds as HH:MM:SS, clamped at zero.
pub fn format_seconds(total_seconds: f64) -> String {
    let total = total_seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// One line per recorded day, newest first, with a star on days that
/// reached the goal.
pub fn render_day_list(history: &History) -> Vec<String> {
    history
        .all_days()
        .into_iter()
        .map(|day| {
            let reached = history.total_for_day(&day) >= DAILY_GOAL_SECONDS;
            if reached {
                format!("{} ★", day)
            } else {
                day
            }
        })
        .collect()
}

/// Detail view for one day: total, goal verdict, and the task breakdown
/// sorted descending by time.
pub fn render_day(history: &History, day_key: &str) -> String {
    let total = history.total_for_day(day_key);
    let reached = total >= DAILY_GOAL_SECONDS;

    let mut lines = vec![
        format!("Date: {}", day_key),
        format!("Total: {}", format_seconds(total)),
        format!(
            "Goal 6.5h: {}",
            if reached { "Reached ★" } else { "Not reached" }
        ),
        String::new(),
        "Task Breakdown:".to_string(),
    ];

    let breakdown = history.breakdown_for_day(day_key);
    if breakdown.is_empty() {
        lines.push("- No data".to_string());
    } else {
        for (label, seconds) in breakdown {
            lines.push(format!("- {}: {}", label, format_seconds(seconds)));
        }
    }
    lines.join("\n")
}
