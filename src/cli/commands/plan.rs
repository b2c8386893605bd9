//! Upcoming rotation preview.

use colored::Colorize;
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::cli::commands::to_json;
use crate::config::Config;
use crate::engine::{format_duration, SessionConfig, SessionType};
use crate::error::PomoError;

/// One slot of the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    /// Completed sessions before this slot
    pub completed_sessions: u32,
    /// Derived session type
    pub session_type: SessionType,
    /// Configured length in seconds
    pub duration_seconds: i64,
}

/// Derive the first `count` slots of the rotation.
#[must_use]
pub fn rotation(config: &SessionConfig, count: u32) -> Vec<PlanEntry> {
    (0..count)
        .map(|completed_sessions| {
            let session_type =
                SessionType::derive(completed_sessions, config.sessions_until_long_break);
            PlanEntry {
                completed_sessions,
                session_type,
                duration_seconds: config.duration_for(session_type).num_seconds(),
            }
        })
        .collect()
}

/// Execute the plan command.
///
/// # Errors
///
/// Returns an error if the configured timer is invalid or output
/// formatting fails.
pub fn plan(config: &Config, count: u32, format: OutputFormat) -> Result<String, PomoError> {
    let session_config = config.timer.to_session_config()?;
    let entries = rotation(&session_config, count);

    match format {
        OutputFormat::Json => to_json(&entries),
        OutputFormat::Pretty => {
            let mut output = Vec::new();
            output.push("Session Rotation".bold().to_string());
            output.push("─".repeat(40));

            for entry in &entries {
                let padded = format!("{:<14}", entry.session_type.display_name());
                let name = match entry.session_type {
                    SessionType::Work => padded.green(),
                    SessionType::ShortBreak => padded.cyan(),
                    SessionType::LongBreak => padded.blue().bold(),
                };
                output.push(format!(
                    "  {:>3}. {} {}",
                    entry.completed_sessions + 1,
                    name,
                    format_duration(chrono::Duration::seconds(entry.duration_seconds))
                ));
            }

            output.push(String::new());
            output.push(
                format!(
                    "Long break after every {} completed sessions",
                    session_config.sessions_until_long_break
                )
                .dimmed()
                .to_string(),
            );
            Ok(output.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rotation() {
        let types: Vec<_> = rotation(&SessionConfig::default(), 9)
            .into_iter()
            .map(|e| e.session_type)
            .collect();
        assert_eq!(
            types,
            vec![
                SessionType::Work,
                SessionType::ShortBreak,
                SessionType::Work,
                SessionType::ShortBreak,
                SessionType::LongBreak,
                SessionType::ShortBreak,
                SessionType::Work,
                SessionType::ShortBreak,
                SessionType::LongBreak,
            ]
        );
    }

    #[test]
    fn test_rotation_durations() {
        let entries = rotation(&SessionConfig::default(), 5);
        assert_eq!(entries[0].duration_seconds, 25 * 60);
        assert_eq!(entries[1].duration_seconds, 5 * 60);
        assert_eq!(entries[4].duration_seconds, 15 * 60);
    }

    #[test]
    fn test_plan_json() {
        let json = plan(&Config::default(), 2, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["session_type"], "work");
        assert_eq!(value[1]["session_type"], "short_break");
    }

    #[test]
    fn test_plan_rejects_invalid_timer() {
        let mut config = Config::default();
        config.timer.sessions_until_long_break = 1;
        assert!(matches!(
            plan(&config, 4, OutputFormat::Pretty),
            Err(PomoError::InvalidConfiguration(_))
        ));
    }
}
