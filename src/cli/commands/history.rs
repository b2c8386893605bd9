//! Completed session listing.

use colored::Colorize;

use crate::cli::args::OutputFormat;
use crate::cli::commands::{load_records, to_json};
use crate::config::{Config, Paths};
use crate::engine::{format_duration_short, CompletedSessionRecord};
use crate::error::PomoError;

/// Execute the history command.
///
/// # Errors
///
/// Returns an error if the history store cannot be read or output
/// formatting fails.
pub fn history(
    paths: &Paths,
    config: &Config,
    limit: usize,
    format: OutputFormat,
) -> Result<String, PomoError> {
    let records = load_records(paths, config)?;
    format_history(&records, limit, format)
}

/// Render the newest `limit` records.
fn format_history(
    records: &[CompletedSessionRecord],
    limit: usize,
    format: OutputFormat,
) -> Result<String, PomoError> {
    let mut recent: Vec<&CompletedSessionRecord> = records.iter().collect();
    recent.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    recent.truncate(limit);

    match format {
        OutputFormat::Json => to_json(&recent),
        OutputFormat::Pretty => {
            if recent.is_empty() {
                return Ok("No completed sessions yet.\n\nStart one with: pomo run".to_string());
            }

            let mut output = Vec::new();
            output.push("Completed Sessions".bold().to_string());
            output.push("═".repeat(60));
            output.push(String::new());

            output.push(format!(
                "{:<17} {:<8} {:<6} {}",
                "Completed", "Focus", "Count", "Task"
            ));
            output.push("─".repeat(60));

            for record in &recent {
                let when = record
                    .recorded_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string();
                let task = record
                    .linked_task
                    .as_deref()
                    .map_or_else(|| "-".dimmed().to_string(), ToString::to_string);
                output.push(format!(
                    "{:<17} {:<8} {:<6} {}",
                    when,
                    format_duration_short(record.focus_time),
                    record.progress.completed_sessions,
                    task
                ));
            }

            output.push(String::new());
            output.push(format!("Showing {} of {} sessions", recent.len(), records.len()));

            Ok(output.join("\n"))
        }
    }
}
