//! Pomodoro session engine.
//!
//! Provides the timer state machine and its collaborators:
//! - Session configuration, counters and type rotation
//! - Cancelable repeating/one-shot timers with virtual and system clocks
//! - Observer notifications and pull snapshots
//! - Duration parsing and formatting

mod machine;
pub mod observer;
pub mod scheduler;
pub mod session;
pub mod timer;

pub use machine::{SessionEngine, COMPLETION_DELAY, TICK_PERIOD};
pub use observer::{EngineEvent, EngineObserver, EngineSnapshot};
pub use scheduler::{
    Clock, EventSource, ManualClock, ScheduledEvent, Scheduler, SystemClock, TimerEvent,
    TimerHandle, TimerQueue,
};
pub use session::{CompletedSessionRecord, SessionConfig, SessionProgress, SessionType};
pub use timer::{format_duration, format_duration_mmss, format_duration_short, parse_duration, TimerState};
