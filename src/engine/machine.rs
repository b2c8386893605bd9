//! The Pomodoro session engine.
//!
//! States: Idle -> Running -> {Paused, Completed}; Paused -> Running;
//! Completed -> Idle after a one second rearm delay. The engine is driven by
//! commands (`start`, `pause`, `stop`, `reset`, `customize`) and by timer
//! events handed back through [`SessionEngine::dispatch`]. Completed work
//! sessions are queued and written by [`SessionEngine::flush_pending`], never
//! from inside a transition.

use chrono::Duration;

use super::observer::{EngineEvent, EngineObserver, EngineSnapshot};
use super::scheduler::{
    Clock, EventSource, ManualClock, ScheduledEvent, Scheduler, TimerEvent, TimerHandle,
    TimerQueue,
};
use super::session::{CompletedSessionRecord, SessionConfig, SessionProgress, SessionType};
use super::timer::TimerState;
use crate::error::PomoError;
use crate::history::SessionLog;

/// Countdown resolution.
pub const TICK_PERIOD: Duration = Duration::seconds(1);

/// How long the engine stays in `Completed` before rearming.
pub const COMPLETION_DELAY: Duration = Duration::seconds(1);

/// Pomodoro timer state machine.
///
/// Owns the configuration, counters and countdown. Timers are armed through
/// the injected [`Scheduler`]; finished work sessions are queued for the
/// injected [`SessionLog`] and written on the next
/// [`flush_pending`](Self::flush_pending). All methods run to completion and
/// must be called from one thread.
pub struct SessionEngine<S, L> {
    config: SessionConfig,
    progress: SessionProgress,
    state: TimerState,
    remaining_seconds: i64,
    linked_task: Option<String>,
    history: Vec<CompletedSessionRecord>,
    unsaved: Vec<CompletedSessionRecord>,
    warnings: Vec<String>,
    scheduler: S,
    log: L,
    tick_timer: Option<TimerHandle>,
    pending_rearm: Option<TimerHandle>,
    observers: Vec<Box<dyn EngineObserver>>,
}

impl<S: Scheduler, L: SessionLog> SessionEngine<S, L> {
    /// Create an idle engine and load the stored history once.
    ///
    /// A history that cannot be loaded is not fatal: the engine starts with
    /// an empty history and records a warning (see [`Self::take_warnings`]).
    ///
    /// # Errors
    ///
    /// Returns `PomoError::InvalidConfiguration` if `config` is invalid.
    pub fn new(config: SessionConfig, scheduler: S, log: L) -> Result<Self, PomoError> {
        config.validate()?;

        let mut warnings = Vec::new();
        let history = log.load_all().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load session history");
            warnings.push(format!("Failed to load session history: {e}"));
            Vec::new()
        });
        tracing::debug!(records = history.len(), "session engine created");

        let progress = SessionProgress::default();
        let remaining_seconds = config
            .duration_for(progress.current_type(&config))
            .num_seconds();

        Ok(Self {
            config,
            progress,
            state: TimerState::Idle,
            remaining_seconds,
            linked_task: None,
            history,
            unsaved: Vec::new(),
            warnings,
            scheduler,
            log,
            tick_timer: None,
            pending_rearm: None,
            observers: Vec::new(),
        })
    }

    /// Register an observer for change notifications.
    pub fn subscribe(&mut self, observer: impl EngineObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Start or resume the countdown. No-op while already running.
    ///
    /// From `Idle` the countdown restarts at the full duration of the current
    /// session type. From `Completed` the pending rearm is applied first.
    pub fn start(&mut self) {
        match self.state {
            TimerState::Running => return,
            TimerState::Completed => self.finish_rearm(),
            TimerState::Idle | TimerState::Paused => {}
        }

        if self.state == TimerState::Idle {
            self.set_remaining(self.current_duration_seconds());
        }

        self.cancel_tick();
        self.tick_timer = Some(
            self.scheduler
                .schedule_repeating(TICK_PERIOD, TimerEvent::Tick),
        );
        self.set_state(TimerState::Running);
    }

    /// Freeze the countdown. Only acts while running.
    pub fn pause(&mut self) {
        if self.state != TimerState::Running {
            return;
        }
        self.cancel_tick();
        self.set_state(TimerState::Paused);
    }

    /// Abandon the current countdown and return to `Idle`.
    ///
    /// Cancels any pending rearm. Counters are left untouched.
    pub fn stop(&mut self) {
        self.cancel_tick();
        self.cancel_rearm();
        self.set_remaining(self.current_duration_seconds());
        self.set_state(TimerState::Idle);
    }

    /// Stop and restart the rotation from a work session.
    ///
    /// Total focus time and the stored history are kept.
    pub fn reset(&mut self) {
        self.stop();
        if self.progress.completed_sessions != 0 {
            self.progress.completed_sessions = 0;
            self.emit(EngineEvent::ProgressChanged(self.progress));
        }
        self.set_remaining(self.current_duration_seconds());
    }

    /// Advance the countdown by one second. Ignored unless running.
    pub fn tick(&mut self) {
        if self.state != TimerState::Running {
            return;
        }

        if self.remaining_seconds <= 1 {
            self.set_remaining(0);
            self.complete_session();
        } else {
            self.set_remaining(self.remaining_seconds - 1);
        }
    }

    /// Replace the configuration.
    ///
    /// When idle the countdown is re-derived right away; a running, paused
    /// or completed countdown keeps its length and the change applies to the
    /// next session.
    ///
    /// # Errors
    ///
    /// Returns `PomoError::InvalidConfiguration` and keeps the previous
    /// configuration if `config` is invalid.
    pub fn customize(&mut self, config: SessionConfig) -> Result<(), PomoError> {
        config.validate()?;

        self.config = config;
        tracing::debug!(?config, "session configuration changed");
        self.emit(EngineEvent::ConfigChanged(config));

        if self.state == TimerState::Idle {
            self.set_remaining(self.current_duration_seconds());
        }
        Ok(())
    }

    /// Attach a task label to records of subsequent work sessions.
    pub fn link_task(&mut self, task: Option<String>) {
        self.linked_task = task;
    }

    /// Deliver a fired timer.
    ///
    /// Events from timers the engine no longer holds (canceled ticks, a
    /// rearm superseded by `stop`/`reset`) are dropped.
    pub fn dispatch(&mut self, fired: ScheduledEvent) {
        match fired.event {
            TimerEvent::Tick if self.tick_timer == Some(fired.handle) => self.tick(),
            TimerEvent::Rearm if self.pending_rearm == Some(fired.handle) => self.finish_rearm(),
            event => {
                tracing::trace!(?event, handle = fired.handle.id(), "dropping stale timer event");
            }
        }
    }

    /// Current timer state.
    #[must_use]
    pub const fn state(&self) -> TimerState {
        self.state
    }

    /// Countdown left.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        Duration::seconds(self.remaining_seconds)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Counters.
    #[must_use]
    pub const fn progress(&self) -> SessionProgress {
        self.progress
    }

    /// Type of the current (or next) countdown.
    #[must_use]
    pub const fn session_type(&self) -> SessionType {
        self.progress.current_type(&self.config)
    }

    /// Task attached to upcoming records.
    #[must_use]
    pub fn linked_task(&self) -> Option<&str> {
        self.linked_task.as_deref()
    }

    /// Stored history plus records completed in this process.
    #[must_use]
    pub fn history(&self) -> &[CompletedSessionRecord] {
        &self.history
    }

    /// Write queued records to the history store. Returns how many were saved.
    ///
    /// A failed write is dropped with a warning (see [`Self::take_warnings`])
    /// and an [`EngineEvent::PersistenceFailed`]; engine state is unaffected.
    pub fn flush_pending(&mut self) -> usize {
        let mut saved = 0;
        for record in std::mem::take(&mut self.unsaved) {
            if self.persist(&record) {
                saved += 1;
            }
        }
        saved
    }

    /// Records completed but not yet handed to the history store.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.unsaved.len()
    }

    /// Drain persistence warnings collected so far.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Pull view of the engine.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            session_type: self.session_type(),
            remaining_seconds: self.remaining_seconds,
            progress: self.progress,
            config: self.config,
            linked_task: self.linked_task.clone(),
        }
    }

    /// The injected scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutable access to the injected scheduler.
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// The injected history store.
    #[must_use]
    pub const fn log(&self) -> &L {
        &self.log
    }

    fn current_duration_seconds(&self) -> i64 {
        self.config.duration_for(self.session_type()).num_seconds()
    }

    fn complete_session(&mut self) {
        self.cancel_tick();

        let completing = self.session_type();
        self.set_state(TimerState::Completed);

        if completing == SessionType::Work {
            self.progress.total_focus_time = self.progress.total_focus_time + self.config.work;
        }
        self.progress.completed_sessions = self.progress.completed_sessions.saturating_add(1);
        tracing::info!(
            session = %completing,
            completed = self.progress.completed_sessions,
            "session completed"
        );
        self.emit(EngineEvent::ProgressChanged(self.progress));
        self.emit(EngineEvent::SessionCompleted(completing));

        self.cancel_rearm();
        self.pending_rearm = Some(
            self.scheduler
                .schedule_once(COMPLETION_DELAY, TimerEvent::Rearm),
        );

        if completing == SessionType::Work {
            let record =
                CompletedSessionRecord::new(self.config, self.progress, self.linked_task.clone());
            self.unsaved.push(record.clone());
            self.history.push(record);
        }
    }

    fn finish_rearm(&mut self) {
        self.cancel_rearm();
        self.set_remaining(self.current_duration_seconds());
        self.set_state(TimerState::Idle);
    }

    fn persist(&mut self, record: &CompletedSessionRecord) -> bool {
        match self.log.append(record) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist completed session");
                let message = format!("Failed to save completed session: {e}");
                self.warnings.push(message.clone());
                self.emit(EngineEvent::PersistenceFailed(message));
                false
            }
        }
    }

    fn cancel_tick(&mut self) {
        if let Some(handle) = self.tick_timer.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn cancel_rearm(&mut self) {
        if let Some(handle) = self.pending_rearm.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn set_state(&mut self, to: TimerState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::debug!(%from, %to, "timer state changed");
        self.emit(EngineEvent::StateChanged { from, to });
    }

    fn set_remaining(&mut self, seconds: i64) {
        if self.remaining_seconds == seconds {
            return;
        }
        self.remaining_seconds = seconds;
        self.emit(EngineEvent::RemainingChanged(Duration::seconds(seconds)));
    }

    fn emit(&mut self, event: EngineEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }
}

impl<S: Scheduler + EventSource, L: SessionLog> SessionEngine<S, L> {
    /// Dispatch every timer that is due. Returns how many fired.
    pub fn run_due(&mut self) -> usize {
        let mut fired = 0;
        while let Some(event) = self.scheduler.pop_due() {
            self.dispatch(event);
            fired += 1;
        }
        fired
    }
}

impl<L: SessionLog> SessionEngine<TimerQueue<ManualClock>, L> {
    /// Move virtual time forward, firing timers at their exact deadlines.
    pub fn advance(&mut self, by: Duration) {
        let target = self.scheduler.clock().now() + by;
        while let Some(deadline) = self.scheduler.next_deadline().filter(|d| *d <= target) {
            self.scheduler.clock_mut().set(deadline);
            self.run_due();
        }
        self.scheduler.clock_mut().set(target);
    }
}
