#![forbid(unsafe_code)]

//! Visibility transition controller.
//!
//! Four-phase lifecycle driven by an external `active` flag and a fixed
//! settle duration:
//!
//! ```text
//!            set_active(true)           settle
//!   Exited ─────────────────► Entering ────────► Entered
//!     ▲                        │                    │
//!     │ settle                 │ set_active(false)  │ set_active(false)
//!     │                        ▼                    │
//!     └──────────────────── Exiting ◄───────────────┘
//! ```
//!
//! Deactivating while entering goes straight to exiting. Reactivating while
//! exiting only records the flag: the exit runs to completion, and
//! [`TransitionController::resume`] then starts a fresh entry from `Exited`.
//! Settle timers live in a [`Scheduler`]; each flip bumps a generation, and a
//! [`SettleToken`] from an older generation is ignored, so a superseded timer
//! never moves state.

use std::fmt;
use std::time::Duration;

use crate::scheduler::{Scheduler, TimerId};

/// Default settle duration.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// Current visibility phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionState {
    /// Mounted, animating in.
    Entering,
    /// Mounted and settled.
    Entered,
    /// Mounted, animating out.
    Exiting,
    /// Not mounted.
    #[default]
    Exited,
}

impl TransitionState {
    /// Whether content exists in this state.
    #[inline]
    pub fn is_mounted(self) -> bool {
        self != Self::Exited
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entering => "entering",
            Self::Entered => "entered",
            Self::Exiting => "exiting",
            Self::Exited => "exited",
        }
    }

    /// Whether `self -> to` is a permitted edge.
    pub fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Exited, Self::Entering)
                | (Self::Entering, Self::Entered)
                | (Self::Entering, Self::Exiting)
                | (Self::Entered, Self::Exiting)
                | (Self::Exiting, Self::Exited)
        )
    }
}

impl fmt::Display for TransitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the change.
    pub from: TransitionState,
    /// State after the change.
    pub to: TransitionState,
}

impl Transition {
    /// True when this change mounts content.
    pub fn mounts(&self) -> bool {
        !self.from.is_mounted() && self.to.is_mounted()
    }

    /// True when this change unmounts content.
    pub fn unmounts(&self) -> bool {
        self.from.is_mounted() && !self.to.is_mounted()
    }
}

/// Identifies the flip a settle timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettleToken {
    generation: u64,
}

/// Drives [`TransitionState`] from the `active` flag and settle timers.
#[derive(Debug, Clone)]
pub struct TransitionController {
    state: TransitionState,
    active: bool,
    settle: Duration,
    generation: u64,
    timer: Option<TimerId>,
}

impl Default for TransitionController {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}

impl TransitionController {
    /// Create an exited controller.
    pub fn new(settle: Duration) -> Self {
        Self {
            state: TransitionState::Exited,
            active: false,
            settle,
            generation: 0,
            timer: None,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Last `active` input.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Configured settle duration.
    #[inline]
    pub fn settle_duration(&self) -> Duration {
        self.settle
    }

    /// Whether a settle timer is outstanding.
    #[inline]
    pub fn is_settling(&self) -> bool {
        self.timer.is_some()
    }

    /// Feed the `active` flag.
    ///
    /// Any flip that starts a new phase cancels the outstanding settle timer
    /// and schedules a fresh one built by `task`. Returns the resulting
    /// transition, or `None` when the flag did not change the phase. While
    /// exiting the flag is only recorded; see [`resume`](Self::resume).
    pub fn set_active<T>(
        &mut self,
        active: bool,
        timers: &mut Scheduler<T>,
        task: impl FnOnce(SettleToken) -> T,
    ) -> Option<Transition> {
        self.active = active;
        let to = match (self.state, active) {
            (TransitionState::Exited, true) => TransitionState::Entering,
            (TransitionState::Entering | TransitionState::Entered, false) => {
                TransitionState::Exiting
            }
            _ => return None,
        };
        Some(self.begin(to, timers, task))
    }

    /// Start a new entry when `active` was raised again during the exit that
    /// just settled.
    pub fn resume<T>(
        &mut self,
        timers: &mut Scheduler<T>,
        task: impl FnOnce(SettleToken) -> T,
    ) -> Option<Transition> {
        if self.state != TransitionState::Exited || !self.active {
            return None;
        }
        Some(self.begin(TransitionState::Entering, timers, task))
    }

    /// Handle a fired settle timer.
    pub fn settle(&mut self, token: SettleToken) -> Option<Transition> {
        if token.generation != self.generation || self.timer.is_none() {
            tracing::trace!(
                target: "perch::popover",
                generation = token.generation,
                current = self.generation,
                "stale settle timer ignored"
            );
            return None;
        }
        let to = match (self.state, self.active) {
            (TransitionState::Entering, true) => TransitionState::Entered,
            (TransitionState::Exiting, _) => TransitionState::Exited,
            _ => return None,
        };
        self.timer = None;
        Some(self.apply(to))
    }

    fn begin<T>(
        &mut self,
        to: TransitionState,
        timers: &mut Scheduler<T>,
        task: impl FnOnce(SettleToken) -> T,
    ) -> Transition {
        if let Some(id) = self.timer.take() {
            timers.cancel(id);
        }
        self.generation = self.generation.wrapping_add(1);
        let token = SettleToken {
            generation: self.generation,
        };
        self.timer = Some(timers.schedule(self.settle, task(token)));
        self.apply(to)
    }

    fn apply(&mut self, to: TransitionState) -> Transition {
        let from = self.state;
        debug_assert!(from.can_transition_to(to), "illegal edge {from} -> {to}");
        self.state = to;
        tracing::debug!(
            target: "perch::popover",
            from = from.as_str(),
            to = to.as_str(),
            "transition"
        );
        Transition { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(500);

    fn ctl() -> (TransitionController, Scheduler<SettleToken>) {
        (TransitionController::new(SETTLE), Scheduler::new())
    }

    fn run(
        ctl: &mut TransitionController,
        timers: &mut Scheduler<SettleToken>,
        delta: Duration,
    ) -> Vec<Transition> {
        timers
            .advance(delta)
            .into_iter()
            .filter_map(|token| ctl.settle(token))
            .collect()
    }

    #[test]
    fn starts_exited() {
        let (c, _) = ctl();
        assert_eq!(c.state(), TransitionState::Exited);
        assert!(!c.state().is_mounted());
        assert!(!c.is_settling());
    }

    #[test]
    fn full_cycle() {
        let (mut c, mut t) = ctl();
        let tr = c.set_active(true, &mut t, |k| k).unwrap();
        assert!(tr.mounts());
        assert_eq!(c.state(), TransitionState::Entering);

        assert!(run(&mut c, &mut t, Duration::from_millis(499)).is_empty());
        let fired = run(&mut c, &mut t, Duration::from_millis(1));
        assert_eq!(fired.len(), 1);
        assert_eq!(c.state(), TransitionState::Entered);

        c.set_active(false, &mut t, |k| k);
        assert_eq!(c.state(), TransitionState::Exiting);
        let fired = run(&mut c, &mut t, SETTLE);
        assert!(fired[0].unmounts());
        assert_eq!(c.state(), TransitionState::Exited);
    }

    #[test]
    fn repeated_input_is_noop() {
        let (mut c, mut t) = ctl();
        c.set_active(true, &mut t, |k| k);
        assert!(c.set_active(true, &mut t, |k| k).is_none());
        assert_eq!(t.pending_timers(), 1);

        let (mut c, mut t) = ctl();
        assert!(c.set_active(false, &mut t, |k| k).is_none());
        assert_eq!(t.pending_timers(), 0);
    }

    #[test]
    fn deactivate_while_entering_skips_entered() {
        let (mut c, mut t) = ctl();
        c.set_active(true, &mut t, |k| k);
        run(&mut c, &mut t, Duration::from_millis(200));
        let tr = c.set_active(false, &mut t, |k| k).unwrap();
        assert_eq!(tr.from, TransitionState::Entering);
        assert_eq!(tr.to, TransitionState::Exiting);

        // Only the exiting timer remains.
        assert_eq!(t.pending_timers(), 1);
        let fired = run(&mut c, &mut t, SETTLE);
        assert_eq!(fired.len(), 1);
        assert_eq!(c.state(), TransitionState::Exited);
    }

    #[test]
    fn reactivate_while_exiting_finishes_exit_first() {
        let (mut c, mut t) = ctl();
        c.set_active(true, &mut t, |k| k);
        run(&mut c, &mut t, SETTLE);
        c.set_active(false, &mut t, |k| k);
        assert!(c.set_active(true, &mut t, |k| k).is_none());
        assert_eq!(c.state(), TransitionState::Exiting);
        assert!(c.is_active());
        assert_eq!(t.pending_timers(), 1);

        let fired = run(&mut c, &mut t, SETTLE);
        assert_eq!(fired.len(), 1);
        assert!(fired[0].unmounts());
        assert_eq!(c.state(), TransitionState::Exited);

        let tr = c.resume(&mut t, |k| k).unwrap();
        assert_eq!(tr.from, TransitionState::Exited);
        assert_eq!(tr.to, TransitionState::Entering);
        assert!(tr.mounts());
        run(&mut c, &mut t, SETTLE);
        assert_eq!(c.state(), TransitionState::Entered);
    }

    #[test]
    fn reactivate_then_deactivate_while_exiting_just_exits() {
        let (mut c, mut t) = ctl();
        c.set_active(true, &mut t, |k| k);
        c.set_active(false, &mut t, |k| k);
        c.set_active(true, &mut t, |k| k);
        c.set_active(false, &mut t, |k| k);
        run(&mut c, &mut t, SETTLE);
        assert_eq!(c.state(), TransitionState::Exited);
        assert!(c.resume(&mut t, |k| k).is_none());
        assert_eq!(t.pending_timers(), 0);
    }

    #[test]
    fn resume_is_noop_unless_exited_and_active() {
        let (mut c, mut t) = ctl();
        assert!(c.resume(&mut t, |k| k).is_none());
        c.set_active(true, &mut t, |k| k);
        assert!(c.resume(&mut t, |k| k).is_none());
        assert_eq!(c.state(), TransitionState::Entering);
    }

    #[test]
    fn stale_token_is_ignored() {
        let (mut c, mut t) = ctl();
        let mut old = None;
        c.set_active(true, &mut t, |k| {
            old = Some(k);
            k
        });
        c.set_active(false, &mut t, |k| k);
        assert!(c.settle(old.unwrap()).is_none());
        assert_eq!(c.state(), TransitionState::Exiting);
    }

    #[test]
    fn token_fires_once() {
        let (mut c, mut t) = ctl();
        let mut token = None;
        c.set_active(true, &mut t, |k| {
            token = Some(k);
            k
        });
        let token = token.unwrap();
        assert!(c.settle(token).is_some());
        assert!(c.settle(token).is_none());
    }

    #[test]
    fn zero_settle_fires_on_next_advance() {
        let mut c = TransitionController::new(Duration::ZERO);
        let mut t = Scheduler::new();
        c.set_active(true, &mut t, |k| k);
        assert_eq!(c.state(), TransitionState::Entering);
        run(&mut c, &mut t, Duration::ZERO);
        assert_eq!(c.state(), TransitionState::Entered);
    }

    #[test]
    fn edge_table() {
        use TransitionState::*;
        assert!(Exited.can_transition_to(Entering));
        assert!(!Exited.can_transition_to(Entered));
        assert!(!Entered.can_transition_to(Exited));
        assert!(!Entered.can_transition_to(Entering));
        assert!(!Exiting.can_transition_to(Entered));
        assert!(!Exiting.can_transition_to(Entering));
    }

    #[test]
    fn display_names() {
        assert_eq!(TransitionState::Entering.to_string(), "entering");
        assert_eq!(TransitionState::Exited.to_string(), "exited");
    }
}
