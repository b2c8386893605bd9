//! Change notifications pushed by the engine.

use std::sync::mpsc::Sender;

use chrono::Duration;
use serde::Serialize;

use super::session::{SessionConfig, SessionProgress, SessionType};
use super::timer::TimerState;

/// Something observable about the engine changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Timer state transition
    StateChanged {
        /// Previous state
        from: TimerState,
        /// New state
        to: TimerState,
    },
    /// Countdown value changed
    RemainingChanged(Duration),
    /// Completion counter or focus total changed
    ProgressChanged(SessionProgress),
    /// A new configuration was applied
    ConfigChanged(SessionConfig),
    /// A countdown of the given type reached zero
    SessionCompleted(SessionType),
    /// The history store failed; in-memory state is unaffected
    PersistenceFailed(String),
}

/// Receives engine notifications.
pub trait EngineObserver {
    /// Called synchronously after each change.
    fn on_event(&mut self, event: &EngineEvent);
}

impl<F> EngineObserver for F
where
    F: FnMut(&EngineEvent),
{
    fn on_event(&mut self, event: &EngineEvent) {
        self(event);
    }
}

/// Forwards events to another thread. A closed receiver is ignored.
impl EngineObserver for Sender<EngineEvent> {
    fn on_event(&mut self, event: &EngineEvent) {
        let _ = self.send(event.clone());
    }
}

/// Pull view of the engine at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineSnapshot {
    /// Current timer state
    pub state: TimerState,
    /// Type of the current (or next) countdown
    pub session_type: SessionType,
    /// Countdown left, in seconds
    pub remaining_seconds: i64,
    /// Counters
    pub progress: SessionProgress,
    /// Active configuration
    pub config: SessionConfig,
    /// Task attached to upcoming records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_task: Option<String>,
}

impl EngineSnapshot {
    /// Remaining time as a duration.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        Duration::seconds(self.remaining_seconds)
    }

    /// Fraction of the current countdown already elapsed (0.0 - 1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self) -> f64 {
        let total = self.config.duration_for(self.session_type).num_seconds();
        if total <= 0 {
            return 1.0;
        }
        (1.0 - self.remaining_seconds as f64 / total as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |event: &EngineEvent| seen.push(event.clone());
            observer.on_event(&EngineEvent::SessionCompleted(SessionType::Work));
        }
        assert_eq!(seen, vec![EngineEvent::SessionCompleted(SessionType::Work)]);
    }

    #[test]
    fn test_sender_observer() {
        let (mut tx, rx) = mpsc::channel();
        tx.on_event(&EngineEvent::RemainingChanged(Duration::seconds(3)));
        assert_eq!(
            rx.recv().unwrap(),
            EngineEvent::RemainingChanged(Duration::seconds(3))
        );

        drop(rx);
        tx.on_event(&EngineEvent::RemainingChanged(Duration::seconds(2)));
    }

    #[test]
    fn test_snapshot_progress_fraction() {
        let snapshot = EngineSnapshot {
            state: TimerState::Running,
            session_type: SessionType::Work,
            remaining_seconds: 750,
            progress: SessionProgress::default(),
            config: SessionConfig::default(),
            linked_task: None,
        };
        assert!((snapshot.progress_fraction() - 0.5).abs() < f64::EPSILON);
        assert_eq!(snapshot.remaining(), Duration::minutes(12) + Duration::seconds(30));
    }
}
