//! Session configuration, progress counters and the session-type rotation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PomoError;

/// Which countdown the engine is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// Focused work
    Work,
    /// Short break between work sessions
    ShortBreak,
    /// Long break every `sessions_until_long_break` completions
    LongBreak,
}

impl SessionType {
    /// Derive the session type from the completion counter.
    ///
    /// The long-break check runs before the parity check, so a multiple of
    /// `sessions_until_long_break` becomes a long break even when the count
    /// is even (which would otherwise be a work slot).
    #[must_use]
    pub const fn derive(completed_sessions: u32, sessions_until_long_break: u32) -> Self {
        if completed_sessions == 0 {
            return Self::Work;
        }
        if let Some(0) = completed_sessions.checked_rem(sessions_until_long_break) {
            return Self::LongBreak;
        }
        if completed_sessions % 2 == 0 {
            Self::Work
        } else {
            Self::ShortBreak
        }
    }

    /// Get display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::ShortBreak => "Short Break",
            Self::LongBreak => "Long Break",
        }
    }

    /// Check if this is a break type.
    #[must_use]
    pub const fn is_break(&self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Durations and rotation length for a Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Length of a work session
    #[serde(rename = "work_seconds", with = "duration_secs")]
    pub work: Duration,
    /// Length of a short break
    #[serde(rename = "short_break_seconds", with = "duration_secs")]
    pub short_break: Duration,
    /// Length of a long break
    #[serde(rename = "long_break_seconds", with = "duration_secs")]
    pub long_break: Duration,
    /// Completions between long breaks
    pub sessions_until_long_break: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            work: Duration::minutes(25),
            short_break: Duration::minutes(5),
            long_break: Duration::minutes(15),
            sessions_until_long_break: 4,
        }
    }
}

impl SessionConfig {
    /// Create a configuration without validating it.
    #[must_use]
    pub const fn new(
        work: Duration,
        short_break: Duration,
        long_break: Duration,
        sessions_until_long_break: u32,
    ) -> Self {
        Self {
            work,
            short_break,
            long_break,
            sessions_until_long_break,
        }
    }

    /// Check that every duration is at least one second and that a long
    /// break is at least two sessions away.
    ///
    /// # Errors
    ///
    /// Returns `PomoError::InvalidConfiguration` naming the first bad field.
    pub fn validate(&self) -> Result<(), PomoError> {
        let durations = [
            ("work", self.work),
            ("short break", self.short_break),
            ("long break", self.long_break),
        ];

        for (name, duration) in durations {
            if duration.num_seconds() < 1 {
                return Err(PomoError::InvalidConfiguration(format!(
                    "{name} duration must be at least one second, got {}s",
                    duration.num_seconds()
                )));
            }
        }

        if self.sessions_until_long_break < 2 {
            return Err(PomoError::InvalidConfiguration(format!(
                "sessions until long break must be at least 2, got {}",
                self.sessions_until_long_break
            )));
        }

        Ok(())
    }

    /// Duration of the given session type.
    #[must_use]
    pub const fn duration_for(&self, session_type: SessionType) -> Duration {
        match session_type {
            SessionType::Work => self.work,
            SessionType::ShortBreak => self.short_break,
            SessionType::LongBreak => self.long_break,
        }
    }
}

/// Counters accumulated while the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProgress {
    /// Sessions of any type completed since the last reset
    pub completed_sessions: u32,
    /// Work time completed, never cleared by a reset
    #[serde(rename = "total_focus_seconds", with = "duration_secs")]
    pub total_focus_time: Duration,
}

impl Default for SessionProgress {
    fn default() -> Self {
        Self {
            completed_sessions: 0,
            total_focus_time: Duration::zero(),
        }
    }
}

impl SessionProgress {
    /// Session type the next countdown should run.
    #[must_use]
    pub const fn current_type(&self, config: &SessionConfig) -> SessionType {
        SessionType::derive(self.completed_sessions, config.sessions_until_long_break)
    }
}

/// Snapshot written to the history log when a work session finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSessionRecord {
    /// When the work session finished
    pub recorded_at: DateTime<Utc>,
    /// Configuration in effect at completion
    pub config: SessionConfig,
    /// Counters right after the completion was counted
    pub progress: SessionProgress,
    /// Work time this completion contributed
    #[serde(rename = "focus_seconds", with = "duration_secs")]
    pub focus_time: Duration,
    /// Task the session was linked to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_task: Option<String>,
}

impl CompletedSessionRecord {
    /// Build a record for a work session completing now.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        progress: SessionProgress,
        linked_task: Option<String>,
    ) -> Self {
        Self::at(Utc::now(), config, progress, linked_task)
    }

    /// Build a record with an explicit timestamp.
    #[must_use]
    pub fn at(
        recorded_at: DateTime<Utc>,
        config: SessionConfig,
        progress: SessionProgress,
        linked_task: Option<String>,
    ) -> Self {
        Self {
            recorded_at,
            config,
            progress,
            focus_time: config.work,
            linked_task,
        }
    }
}

/// Serde adapter storing a `chrono::Duration` as whole seconds.
mod duration_secs {
    use chrono::Duration;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(duration.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Duration::try_seconds(secs)
            .ok_or_else(|| D::Error::custom(format!("duration out of range: {secs}s")))
    }
}
