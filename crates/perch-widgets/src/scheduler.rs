#![forbid(unsafe_code)]

//! Deterministic timers and deferred work for a single-threaded host loop.
//!
//! A [`Scheduler`] keeps a virtual clock that only moves when the host calls
//! [`Scheduler::advance`]. Timers fire in deadline order; ties fire in
//! scheduling order. Deferred tasks wait for the next layout-safe point,
//! when the host drains them with [`Scheduler::take_deferred`].
//!
//! # Invariants
//!
//! - The clock never goes backwards.
//! - A cancelled timer never fires.
//! - `advance` returns each due task exactly once.

use std::collections::VecDeque;
use std::time::Duration;

/// Handle for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<T> {
    id: TimerId,
    deadline: Duration,
    task: T,
}

/// Virtual-clock timer queue plus a deferred (next layout-safe point) queue.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer<T>>,
    deferred: VecDeque<T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Create an empty scheduler at time zero.
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            timers: Vec::new(),
            deferred: VecDeque::new(),
        }
    }

    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run `task` once `delay` has elapsed.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            deadline: self.now.saturating_add(delay),
            task,
        });
        id
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Number of timers that have not fired yet.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Move the clock forward and return every task that became due.
    pub fn advance(&mut self, delta: Duration) -> Vec<T> {
        self.now = self.now.saturating_add(delta);
        let now = self.now;
        let (mut due, pending): (Vec<Timer<T>>, Vec<Timer<T>>) =
            self.timers.drain(..).partition(|t| t.deadline <= now);
        self.timers = pending;
        due.sort_by_key(|t| (t.deadline, t.id.0));
        due.into_iter().map(|t| t.task).collect()
    }

    /// Queue `task` for the next layout-safe point.
    pub fn defer(&mut self, task: T) {
        self.deferred.push_back(task);
    }

    /// Whether any deferred task is waiting.
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Drain deferred tasks in queue order.
    pub fn take_deferred(&mut self) -> Vec<T> {
        self.deferred.drain(..).collect()
    }

    /// Drop all deferred tasks without running them.
    pub fn clear_deferred(&mut self) {
        self.deferred.clear();
    }

    /// Drop every timer and deferred task. The clock keeps its value.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.deferred.clear();
    }
}
