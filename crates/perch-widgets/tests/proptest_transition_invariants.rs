//! Property-based invariant tests for the popover lifecycle.
//!
//! Random sequences of `active` flips, time steps, frames, and input events
//! are replayed against a live popover. After every step:
//!
//! 1. Every reported transition is one of the five lifecycle edges, and
//!    consecutive transitions chain (`to` of one is `from` of the next).
//! 2. Content is mounted iff the state is not `Exited`.
//! 3. Exactly one listener is live while mounted, none otherwise.
//! 4. `Entering`/`Entered` imply the last input was active, and a settled
//!    `Exited` implies it was inactive.
//! 5. No close is reported by a step that started unmounted.
//! 6. Determinism: replaying the same steps yields the same trace.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use perch_core::event::{Event, KeyCode, KeyEvent};
use perch_core::geometry::Rect;
use perch_core::node::{Element, NodeId};
use perch_widgets::popover::{
    AnchoredGeometry, DismissalCause, Popover, PopoverCx, Transition, TransitionState, View,
};
use perch_widgets::{Document, PopoverConfig};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const EDGES: [(TransitionState, TransitionState); 5] = [
    (TransitionState::Exited, TransitionState::Entering),
    (TransitionState::Entering, TransitionState::Entered),
    (TransitionState::Entering, TransitionState::Exiting),
    (TransitionState::Entered, TransitionState::Exiting),
    (TransitionState::Exiting, TransitionState::Exited),
];

#[derive(Debug, Clone, Copy)]
enum Step {
    Active(bool),
    Tick(u64),
    Frame,
    Escape,
    OutsideClick,
    InsideClick,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => any::<bool>().prop_map(Step::Active),
        4 => (0u64..=700).prop_map(Step::Tick),
        1 => Just(Step::Frame),
        1 => Just(Step::Escape),
        1 => Just(Step::OutsideClick),
        1 => Just(Step::InsideClick),
    ]
}

struct World {
    doc: Document,
    geometry: AnchoredGeometry,
    popover: Popover,
    elsewhere: NodeId,
    closes: Rc<RefCell<Vec<DismissalCause>>>,
}

impl World {
    fn new() -> Self {
        let mut doc = Document::new(Rect::from_size(60, 20));
        let root = doc.tree().root();
        let activator = doc
            .tree_mut()
            .append(root, Element::button().with_bounds(Rect::new(5, 5, 6, 1)))
            .unwrap();
        let elsewhere = doc
            .tree_mut()
            .append(root, Element::div().with_bounds(Rect::new(40, 15, 5, 2)))
            .unwrap();
        let closes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&closes);
        let popover = Popover::new(activator, PopoverConfig::default())
            .children(vec![View::new(Element::button()).into()])
            .on_close(move |cause| sink.borrow_mut().push(cause));
        Self {
            doc,
            geometry: AnchoredGeometry::new(),
            popover,
            elsewhere,
            closes,
        }
    }

    fn apply(&mut self, step: Step) -> Vec<Transition> {
        let content = self.popover.content_node();
        let elsewhere = self.elsewhere;
        let click = |doc: &Document, target: Option<NodeId>| target.map(|t| doc.click_on(t));
        let event = match step {
            Step::Escape => Some(Event::Key(KeyEvent::new(KeyCode::Escape))),
            Step::OutsideClick => click(&self.doc, Some(elsewhere)),
            Step::InsideClick => click(&self.doc, content),
            _ => None,
        };

        let mut cx = PopoverCx::new(&mut self.doc, &mut self.geometry);
        match step {
            Step::Active(active) => self.popover.set_active(active, &mut cx).into_iter().collect(),
            Step::Tick(ms) => self.popover.tick(Duration::from_millis(ms), &mut cx),
            Step::Frame => {
                self.popover.frame(&mut cx);
                Vec::new()
            }
            Step::Escape | Step::OutsideClick | Step::InsideClick => {
                if let Some(event) = event {
                    self.popover.handle_event(&event, &mut cx);
                }
                Vec::new()
            }
        }
    }

    fn check(&self) -> Result<(), TestCaseError> {
        let state = self.popover.transition_state();
        let mounted = state != TransitionState::Exited;
        prop_assert_eq!(self.popover.is_mounted(), mounted);
        prop_assert_eq!(self.popover.content_node().is_some(), mounted);
        prop_assert_eq!(self.doc.listeners().len(), usize::from(mounted));
        match state {
            TransitionState::Entering | TransitionState::Entered => {
                prop_assert!(self.popover.is_active());
            }
            TransitionState::Exited => {
                prop_assert!(!self.popover.is_active());
            }
            TransitionState::Exiting => {}
        }
        Ok(())
    }
}

fn run(steps: &[Step]) -> Result<Vec<(TransitionState, usize)>, TestCaseError> {
    let mut world = World::new();
    let mut last = TransitionState::Exited;
    let mut trace = Vec::new();
    for &step in steps {
        let was_mounted = world.popover.is_mounted();
        let closes_before = world.closes.borrow().len();

        for transition in world.apply(step) {
            prop_assert!(
                EDGES.contains(&(transition.from, transition.to)),
                "illegal edge {:?} after {:?}",
                transition,
                step
            );
            prop_assert!(transition.from.can_transition_to(transition.to));
            prop_assert_eq!(transition.from, last);
            last = transition.to;
        }
        prop_assert_eq!(world.popover.transition_state(), last);
        world.check()?;

        let closes_after = world.closes.borrow().len();
        if !was_mounted {
            prop_assert_eq!(closes_before, closes_after, "close while unmounted");
        }
        trace.push((last, closes_after));
    }
    Ok(trace)
}

// ═════════════════════════════════════════════════════════════════════════
// 1-5. Edge set, mount invariant, listener scope, close gating
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn lifecycle_invariants_hold(steps in proptest::collection::vec(step(), 1..80)) {
        run(&steps)?;
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2b. Inside clicks never close
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn inside_clicks_never_close(steps in proptest::collection::vec(
        prop_oneof![
            any::<bool>().prop_map(Step::Active),
            (0u64..=700).prop_map(Step::Tick),
            Just(Step::InsideClick),
        ],
        1..60,
    )) {
        let trace = run(&steps)?;
        prop_assert!(trace.iter().all(|(_, closes)| *closes == 0));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn replay_is_deterministic(steps in proptest::collection::vec(step(), 1..50)) {
        let first = run(&steps)?;
        let second = run(&steps)?;
        prop_assert_eq!(first, second);
    }
}
