//! Timer state and duration parsing/formatting.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::PomoError;

/// Engine-wide countdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Waiting for `start`
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Countdown frozen by `pause`
    Paused,
    /// Countdown reached zero; rearms to Idle shortly
    Completed,
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Paused => write!(f, "Paused"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// Format a duration as MM:SS.
#[must_use]
pub fn format_duration_mmss(d: Duration) -> String {
    let total_seconds = d.num_seconds().abs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Format a duration as a short string (e.g., "25m", "1h 30m").
#[must_use]
pub fn format_duration_short(d: Duration) -> String {
    let total_minutes = d.num_minutes();
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Format a duration as a human-readable string.
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let total_minutes = d.num_minutes();

    if total_minutes < 1 {
        let seconds = d.num_seconds();
        return format!("{} second{}", seconds, plural(seconds));
    }

    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    match (hours, minutes) {
        (0, m) => format!("{m} minute{}", plural(m)),
        (h, 0) => format!("{h} hour{}", plural(h)),
        (h, m) => format!("{h} hour{}, {m} minute{}", plural(h), plural(m)),
    }
}

const fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Parse a duration string like "25m", "1h30m", "90s".
///
/// A bare number means minutes.
///
/// # Errors
///
/// Returns `PomoError::Parse` for unknown units, empty input or a zero total.
pub fn parse_duration(s: &str) -> Result<Duration, PomoError> {
    let input = s.trim().to_lowercase();
    let invalid = || PomoError::Parse(format!("invalid duration '{s}' (try 25m, 1h30m, 90s)"));

    if let Ok(minutes) = input.parse::<i64>() {
        return if minutes > 0 {
            Duration::try_minutes(minutes).ok_or_else(invalid)
        } else {
            Err(invalid())
        };
    }

    let mut total_seconds: i64 = 0;
    let mut current_num = String::new();

    for c in input.chars() {
        if c.is_ascii_digit() {
            current_num.push(c);
            continue;
        }
        if current_num.is_empty() {
            return Err(invalid());
        }

        let num: i64 = current_num.parse().map_err(|_| invalid())?;
        current_num.clear();

        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(invalid()),
        };
        total_seconds = num
            .checked_mul(unit)
            .and_then(|secs| total_seconds.checked_add(secs))
            .ok_or_else(invalid)?;
    }

    // Trailing number without unit counts as minutes
    if !current_num.is_empty() {
        let num: i64 = current_num.parse().map_err(|_| invalid())?;
        total_seconds = num
            .checked_mul(60)
            .and_then(|secs| total_seconds.checked_add(secs))
            .ok_or_else(invalid)?;
    }

    if total_seconds > 0 {
        Duration::try_seconds(total_seconds).ok_or_else(invalid)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_minutes() {
        assert_eq!(parse_duration("25").unwrap(), Duration::minutes(25));
        assert_eq!(parse_duration("25m").unwrap(), Duration::minutes(25));
        assert_eq!(parse_duration(" 25M ").unwrap(), Duration::minutes(25));
    }

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration("1h").unwrap(), Duration::hours(1));
        assert_eq!(parse_duration("2h30m").unwrap(), Duration::minutes(150));
        assert_eq!(parse_duration("1h5").unwrap(), Duration::minutes(65));
    }

    #[test]
    fn test_parse_duration_seconds() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::seconds(90));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("0m").is_err());
        assert!(parse_duration("-5").is_err());
        assert!(parse_duration("10x").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(25)), "25 minutes");
        assert_eq!(format_duration(Duration::minutes(1)), "1 minute");
        assert_eq!(format_duration(Duration::hours(2)), "2 hours");
        assert_eq!(format_duration(Duration::minutes(90)), "1 hour, 30 minutes");
        assert_eq!(format_duration(Duration::seconds(1)), "1 second");
    }

    #[test]
    fn test_format_duration_mmss() {
        assert_eq!(format_duration_mmss(Duration::minutes(25)), "25:00");
        assert_eq!(format_duration_mmss(Duration::seconds(90)), "01:30");
        assert_eq!(format_duration_mmss(Duration::seconds(0)), "00:00");
    }

    #[test]
    fn test_format_duration_short() {
        assert_eq!(format_duration_short(Duration::minutes(25)), "25m");
        assert_eq!(format_duration_short(Duration::minutes(90)), "1h 30m");
        assert_eq!(format_duration_short(Duration::minutes(0)), "0m");
    }

    #[test]
    fn test_timer_state_display() {
        assert_eq!(TimerState::Idle.to_string(), "Idle");
        assert_eq!(TimerState::default(), TimerState::Idle);
    }
}
