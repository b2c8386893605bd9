//! Cancelable repeating and one-shot timers.
//!
//! The engine never holds callbacks. It asks a [`Scheduler`] to arm a timer
//! and later receives the [`ScheduledEvent`] back through
//! `SessionEngine::dispatch`. [`TimerQueue`] is a deadline-ordered queue that
//! works against any [`Clock`]: [`ManualClock`] for virtual time in tests and
//! [`SystemClock`] for the terminal timer.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Duration;

/// What a fired timer asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second of countdown elapsed
    Tick,
    /// The post-completion delay elapsed; return to Idle
    Rearm,
}

/// Identifies an armed timer so it can be canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Raw id, mostly for logging.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Handle returned when the timer was armed
    pub handle: TimerHandle,
    /// Event to deliver
    pub event: TimerEvent,
}

/// Arms and cancels timers on behalf of the engine.
pub trait Scheduler {
    /// Fire `event` every `period` until canceled.
    fn schedule_repeating(&mut self, period: Duration, event: TimerEvent) -> TimerHandle;

    /// Fire `event` once after `delay` unless canceled first.
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle;

    /// Disarm a timer. Unknown or already fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Yields timers whose deadline has passed.
pub trait EventSource {
    /// Pop the earliest due event, if any.
    fn pop_due(&mut self) -> Option<ScheduledEvent>;
}

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Virtual clock that only moves when told to.
#[derive(Debug, Clone, Copy)]
pub struct ManualClock {
    now: Duration,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Create a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::zero(),
        }
    }

    /// Move the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now = self.now + by;
    }

    /// Jump to an absolute time. Never moves backwards.
    pub fn set(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }
}

/// Wall-clock time backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        Duration::from_std(self.origin.elapsed()).unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    handle: TimerHandle,
    event: TimerEvent,
    period: Option<Duration>,
}

/// Deadline-ordered timer queue.
#[derive(Debug)]
pub struct TimerQueue<C: Clock> {
    clock: C,
    /// Keyed by (deadline, insertion sequence) so equal deadlines fire FIFO.
    entries: BTreeMap<(Duration, u64), Entry>,
    next_handle: u64,
    next_seq: u64,
}

impl<C: Clock + Default> Default for TimerQueue<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: Clock> TimerQueue<C> {
    /// Create an empty queue on the given clock.
    #[must_use]
    pub const fn new(clock: C) -> Self {
        Self {
            clock,
            entries: BTreeMap::new(),
            next_handle: 1,
            next_seq: 0,
        }
    }

    /// The clock driving this queue.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable access to the clock (virtual time).
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Whether the given timer is still armed.
    #[must_use]
    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.entries.values().any(|e| e.handle == handle)
    }

    /// Absolute deadline of the earliest armed timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Time left until the earliest deadline, clamped at zero.
    #[must_use]
    pub fn time_until_next(&self) -> Option<std::time::Duration> {
        self.next_deadline().map(|deadline| {
            (deadline - self.clock.now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO)
        })
    }

    fn insert(&mut self, deadline: Duration, entry: Entry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert((deadline, seq), entry);
    }

    fn arm(&mut self, delay: Duration, event: TimerEvent, period: Option<Duration>) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let deadline = self.clock.now() + delay;
        self.insert(
            deadline,
            Entry {
                handle,
                event,
                period,
            },
        );
        handle
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn schedule_repeating(&mut self, period: Duration, event: TimerEvent) -> TimerHandle {
        // A non-positive period would fire forever within one instant.
        let period = period.max(Duration::milliseconds(1));
        self.arm(period, event, Some(period))
    }

    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle {
        self.arm(delay.max(Duration::zero()), event, None)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.entries.retain(|_, entry| entry.handle != handle);
    }
}

impl<C: Clock> EventSource for TimerQueue<C> {
    fn pop_due(&mut self) -> Option<ScheduledEvent> {
        let now = self.clock.now();
        let (&key, _) = self.entries.iter().next().filter(|((deadline, _), _)| *deadline <= now)?;
        let entry = self.entries.remove(&key)?;

        if let Some(period) = entry.period {
            self.insert(key.0 + period, entry);
        }

        Some(ScheduledEvent {
            handle: entry.handle,
            event: entry.event,
        })
    }
}
