#![forbid(unsafe_code)]

//! Deterministic, host-driven scheduling of frame callbacks and timers.
//!
//! The [`Scheduler`] is the single place where deferred work waits. It
//! models the two suspension points of a browser event loop:
//!
//! - **Frames**: work requested for the next rendering pass. Tasks queued
//!   while a frame is running land in the following frame.
//! - **Timers**: single-shot timeouts and repeating intervals against a
//!   [`DeterministicClock`] that only moves when the host advances it.
//!
//! # Invariants
//!
//! 1. Timers fire in deadline order; ties fire in scheduling order.
//! 2. Cancelling an unknown or already-fired handle is a no-op.
//! 3. A zero-delay timeout scheduled while timers are being drained fires
//!    within the same advance, after the timer that scheduled it.
//! 4. Nothing fires unless the host calls [`Scheduler::pop_due`] or
//!    [`Scheduler::take_frame_tasks`].

use std::time::Duration;

/// Minimum period for repeating timers, so an interval can never spin.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[inline]
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time. Moving backwards is ignored.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Handle of a scheduled timeout or interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw numeric value (diagnostics only).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Handle of a queued frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

impl FrameHandle {
    /// Raw numeric value (diagnostics only).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Explicit state of one owned timer.
///
/// Components keep one slot per timer they own instead of a nullable handle.
/// `take()` is the only way back to `Idle`, and it hands out the handle that
/// must be cancelled, so a cancelled handle can never linger and be mistaken
/// for a pending one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerSlot {
    /// No timer.
    #[default]
    Idle,
    /// A single-shot timeout is pending.
    Scheduled(TimerId),
    /// A repeating interval is active.
    Running(TimerId),
}

impl TimerSlot {
    #[inline]
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[inline]
    #[must_use]
    pub const fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    /// The handle held by this slot, if any.
    #[must_use]
    pub const fn handle(&self) -> Option<TimerId> {
        match *self {
            Self::Idle => None,
            Self::Scheduled(id) | Self::Running(id) => Some(id),
        }
    }

    /// Whether a firing timer is the one this slot holds.
    #[inline]
    #[must_use]
    pub fn matches(&self, id: TimerId) -> bool {
        self.handle() == Some(id)
    }

    /// Transition to `Idle`, returning the handle that was held.
    pub fn take(&mut self) -> Option<TimerId> {
        std::mem::take(self).handle()
    }

    /// Transition to `Idle`, cancelling the held timer in `scheduler`.
    ///
    /// Returns `true` if a timer was actually pending.
    pub fn cancel<T: Clone>(&mut self, scheduler: &mut Scheduler<T>) -> bool {
        match self.take() {
            Some(id) => scheduler.cancel(id),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TimerEntry<T> {
    id: TimerId,
    deadline: Duration,
    /// Tie-breaker: scheduling order.
    seq: u64,
    period: Option<Duration>,
    task: T,
}

/// Frame queue plus timer set over a deterministic clock.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    clock: DeterministicClock,
    next_handle: u64,
    next_seq: u64,
    frames: Vec<(FrameHandle, T)>,
    timers: Vec<TimerEntry<T>>,
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Scheduler<T> {
    /// Create an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: DeterministicClock::new(),
            next_handle: 1,
            next_seq: 0,
            frames: Vec::new(),
            timers: Vec::new(),
        }
    }

    /// Current time.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Move the clock forward to `now` without firing anything.
    ///
    /// Callers drain [`pop_due`](Self::pop_due) first.
    pub fn advance_to(&mut self, now: Duration) {
        self.clock.set(now);
    }

    fn bump_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    // --- Frames ---

    /// Queue `task` for the next rendering pass.
    pub fn request_frame(&mut self, task: T) -> FrameHandle {
        let handle = FrameHandle(self.bump_handle());
        self.frames.push((handle, task));
        handle
    }

    /// Remove a queued frame task. Returns `true` if it was still queued.
    pub fn cancel_frame(&mut self, handle: FrameHandle) -> bool {
        let before = self.frames.len();
        self.frames.retain(|(h, _)| *h != handle);
        self.frames.len() != before
    }

    /// Drain the tasks queued for this frame, in request order.
    pub fn take_frame_tasks(&mut self) -> Vec<(FrameHandle, T)> {
        std::mem::take(&mut self.frames)
    }

    /// Number of queued frame tasks.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    // --- Timers ---

    /// Schedule a single-shot timer `delay` from now.
    pub fn set_timeout(&mut self, delay: Duration, task: T) -> TimerId {
        self.insert_timer(delay, None, task)
    }

    /// Schedule a repeating timer firing every `period` (at least
    /// [`MIN_INTERVAL`]).
    pub fn set_interval(&mut self, period: Duration, task: T) -> TimerId {
        let period = period.max(MIN_INTERVAL);
        self.insert_timer(period, Some(period), task)
    }

    fn insert_timer(&mut self, delay: Duration, period: Option<Duration>, task: T) -> TimerId {
        let id = TimerId(self.bump_handle());
        let seq = self.bump_seq();
        self.timers.push(TimerEntry {
            id,
            deadline: self.clock.now().saturating_add(delay),
            seq,
            period,
            task,
        });
        id
    }

    /// Cancel a timer. Returns `true` if it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|entry| entry.id != id);
        self.timers.len() != before
    }

    /// Whether `id` is still pending.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|entry| entry.id == id)
    }

    /// Number of pending timers (intervals included).
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.iter().map(|entry| entry.deadline).min()
    }

    /// Fire the earliest timer due at or before `until`.
    ///
    /// The clock moves to the timer's deadline. Intervals are re-armed one
    /// period later; timeouts are removed.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, T)> {
        let pos = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.deadline <= until)
            .min_by_key(|(_, entry)| (entry.deadline, entry.seq))
            .map(|(pos, _)| pos)?;

        let deadline = self.timers[pos].deadline;
        self.clock.set(deadline);

        match self.timers[pos].period {
            Some(period) => {
                let seq = self.bump_seq();
                let entry = &mut self.timers[pos];
                entry.deadline = deadline.saturating_add(period);
                entry.seq = seq;
                Some((entry.id, entry.task.clone()))
            }
            None => {
                let entry = self.timers.remove(pos);
                Some((entry.id, entry.task))
            }
        }
    }

    /// Whether no frame task or timer is pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.frames.is_empty() && self.timers.is_empty()
    }

    /// Drop every queued frame task and timer.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.timers.clear();
    }
}
