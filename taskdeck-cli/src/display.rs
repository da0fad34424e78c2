//! Task display formatting module
//!
//! Handles colored output and different view modes for tasks

use colored::*;

use chrono::NaiveDate;
use taskdeck_core::date::format_due_human;
use taskdeck_core::{Priority, Stats, TaskView};

/// Display mode for task list
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayMode {
    /// Minimal one-line format
    Compact,
    /// Full info with formatted dates
    Detailed,
    /// Balanced view with clear status indicators (default)
    Default,
}

/// Check if terminal supports colors
pub fn supports_color() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn paint_priority(priority: Priority, use_color: bool) -> String {
    let label = priority.as_str();
    if !use_color {
        return label.to_string();
    }
    match priority {
        Priority::High => label.red().bold().to_string(),
        Priority::Medium => label.yellow().to_string(),
        Priority::Low => label.normal().to_string(),
    }
}

/// Format a task for display; `today` anchors the relative due date
pub fn format_task(view: &TaskView, today: NaiveDate, mode: DisplayMode, use_color: bool) -> String {
    let task = &view.task;
    let checkbox = if task.completed { "[✓]" } else { "[ ]" };

    let due_info = match task.due_date {
        Some(date) => {
            let date_str = match mode {
                DisplayMode::Compact => date.format("%Y-%m-%d").to_string(),
                _ => format_due_human(date, today),
            };
            let text = format!("({})", date_str);

            if !use_color {
                text
            } else if task.completed {
                text.green().to_string()
            } else if view.is_overdue {
                text.red().bold().to_string()
            } else if view.days_until_due.is_some_and(|d| d <= 1) {
                text.yellow().to_string()
            } else {
                text
            }
        }
        None => String::new(),
    };

    let title = if use_color && task.completed {
        task.title.green().to_string()
    } else {
        task.title.clone()
    };

    match mode {
        DisplayMode::Compact => {
            if due_info.is_empty() {
                format!("{} [{}] {}", checkbox, task.id, title)
            } else {
                format!("{} [{}] {} {}", checkbox, task.id, title, due_info)
            }
        }
        DisplayMode::Detailed => {
            let mut parts = vec![
                format!("{} [ID: {}]", checkbox, task.id),
                format!("Title: {}", title),
            ];

            if !task.description.is_empty() {
                parts.push(format!("Description: {}", task.description));
            }

            parts.push(format!("Category: {}", task.category));
            parts.push(format!("Priority: {}", paint_priority(task.priority, use_color)));

            match (task.due_date, view.days_until_due) {
                (Some(date), Some(days)) => parts.push(format!(
                    "Due: {} {} ({} days left)",
                    date.format("%Y-%m-%d"),
                    due_info,
                    days
                )),
                (Some(date), None) => {
                    parts.push(format!("Due: {} {}", date.format("%Y-%m-%d"), due_info))
                }
                (None, _) => parts.push("Due: (none)".to_string()),
            }

            parts.push(format!("Created: {}", task.created_at.format("%Y-%m-%d %H:%M")));

            match task.completed_date {
                Some(done) => parts.push(format!("Status: Complete ({})", done.format("%Y-%m-%d %H:%M"))),
                None => parts.push("Status: Incomplete".to_string()),
            }

            parts.join("\n  ")
        }
        DisplayMode::Default => {
            let id_str = if use_color {
                format!("[{}]", task.id).cyan().to_string()
            } else {
                format!("[{}]", task.id)
            };

            let mut line = format!(
                "{} {} {} <{}> {}",
                checkbox,
                id_str,
                title,
                task.category,
                paint_priority(task.priority, use_color)
            );
            if !due_info.is_empty() {
                line.push(' ');
                line.push_str(&due_info);
            }
            line
        }
    }
}

/// Format a summary line for task list
pub fn format_summary(stats: &Stats, use_color: bool) -> String {
    let parts = vec![
        format!("{} total", stats.total),
        format!("{} active", stats.active),
        if use_color {
            format!("{} done", stats.completed).green().to_string()
        } else {
            format!("{} done", stats.completed)
        },
        if stats.overdue > 0 {
            if use_color {
                format!("{} overdue", stats.overdue).red().to_string()
            } else {
                format!("{} overdue", stats.overdue)
            }
        } else {
            String::new()
        },
        if stats.high_priority > 0 {
            format!("{} high priority", stats.high_priority)
        } else {
            String::new()
        },
    ];

    let summary: Vec<&str> = parts.iter().filter(|s| !s.is_empty()).map(|s| s.as_str()).collect();

    format!("[{}]", summary.join(" | "))
}
