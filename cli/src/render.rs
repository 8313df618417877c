//! Plain-text and JSON output for command results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use taskdeck_core::api::{FieldErrors, StatsSnapshot, Task, TaskPriority, TaskStatus, UserProfile};

use crate::commands::cli::OutputFormat;

pub fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

pub fn task_line(task: &Task, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{:<26} [{:<11}] {:<6} {}",
        task.id,
        task.status.label(),
        task.priority.as_str(),
        task.title
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", due.format("%Y-%m-%d")));
        if task.is_overdue(now) && task.status != TaskStatus::Completed {
            line.push_str(" (overdue)");
        }
    }
    line
}

pub fn tasks(tasks: &[Task], format: OutputFormat, now: DateTime<Utc>) -> String {
    match format {
        OutputFormat::Json => json(tasks),
        OutputFormat::Text if tasks.is_empty() => "No tasks found.".to_string(),
        OutputFormat::Text => tasks
            .iter()
            .map(|t| task_line(t, now))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn task(task: &Task, format: OutputFormat, now: DateTime<Utc>) -> String {
    match format {
        OutputFormat::Json => json(task),
        OutputFormat::Text => {
            let mut out = task_line(task, now);
            if let Some(desc) = task.description.as_deref().filter(|d| !d.trim().is_empty()) {
                out.push_str("\n    ");
                out.push_str(desc.trim());
            }
            out
        }
    }
}

pub fn stats(stats: &StatsSnapshot, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json(stats),
        OutputFormat::Text => {
            let mut lines = vec![format!("Total: {}", stats.total)];
            for status in TaskStatus::ALL {
                lines.push(format!("  {:<12} {}", status.label(), stats.count(status)));
            }
            if !stats.by_priority.is_empty() {
                for priority in TaskPriority::ALL {
                    lines.push(format!(
                        "  {:<12} {}",
                        priority.as_str(),
                        stats.priority_count(priority)
                    ));
                }
            }
            lines.join("\n")
        }
    }
}

pub fn user(user: &UserProfile, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json(user),
        OutputFormat::Text => format!("{} <{}>", user.name, user.email),
    }
}

pub fn field_errors(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, msg)| format!("  {field}: {msg}"))
        .collect::<Vec<_>>()
        .join("\n")
}
