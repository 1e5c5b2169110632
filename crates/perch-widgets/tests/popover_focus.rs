#![forbid(unsafe_code)]

//! Integration tests for autofocus coordination.
//!
//! # Invariants tested
//!
//! 1. Autofocus runs at the layout-safe point after `Entered`, never earlier.
//! 2. The first focusable descendant wins; the content root is the fallback.
//! 3. `prevent_autofocus` suppresses any focus movement.
//! 4. Autofocus runs at most once per arrival in `Entered`.
//! 5. Unmounting drops pending autofocus silently.

use std::time::Duration;

use perch_core::geometry::Rect;
use perch_core::node::{Element, NodeId};
use perch_widgets::popover::{
    AnchoredGeometry, AutofocusOutcome, Child, Pane, Popover, PopoverCx, TransitionState, View,
};
use perch_widgets::{Document, PopoverConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SETTLE: Duration = Duration::from_millis(500);

struct Harness {
    doc: Document,
    geometry: AnchoredGeometry,
    popover: Popover,
    activator: NodeId,
}

impl Harness {
    fn new(config: PopoverConfig, children: Vec<Child>) -> Self {
        let mut doc = Document::new(Rect::from_size(80, 24));
        let root = doc.tree().root();
        let activator = doc
            .tree_mut()
            .append(root, Element::button().with_bounds(Rect::new(2, 2, 6, 1)))
            .unwrap();
        let popover = Popover::new(activator, config).children(children);
        Self {
            doc,
            geometry: AnchoredGeometry::new(),
            popover,
            activator,
        }
    }

    fn set_active(&mut self, active: bool) {
        let mut cx = PopoverCx::new(&mut self.doc, &mut self.geometry);
        self.popover.set_active(active, &mut cx);
    }

    fn tick(&mut self, delta: Duration) {
        let mut cx = PopoverCx::new(&mut self.doc, &mut self.geometry);
        self.popover.tick(delta, &mut cx);
    }

    fn frame(&mut self) -> Option<AutofocusOutcome> {
        let mut cx = PopoverCx::new(&mut self.doc, &mut self.geometry);
        self.popover.frame(&mut cx)
    }
}

fn menu() -> Vec<Child> {
    vec![
        View::text("Actions").into(),
        View::new(Element::button().with_disabled(true)).into(),
        View::new(Element::link("/edit")).child(View::text("Edit")).into(),
        View::new(Element::button()).child(View::text("Delete")).into(),
    ]
}

// ---------------------------------------------------------------------------
// Target selection
// ---------------------------------------------------------------------------

#[test]
fn focuses_first_focusable_descendant_after_entered() {
    let mut h = Harness::new(PopoverConfig::default(), menu());
    h.doc.focus(h.activator);
    h.set_active(true);
    assert_eq!(h.frame(), None, "nothing deferred while entering");
    assert_eq!(h.doc.focused(), Some(h.activator));

    h.tick(SETTLE);
    assert_eq!(h.popover.transition_state(), TransitionState::Entered);
    assert_eq!(h.doc.focused(), Some(h.activator), "deferred to frame");

    let content = h.popover.content_node().unwrap();
    let link = h.doc.tree().first_focusable_descendant(content).unwrap();
    let outcome = h.frame().unwrap();
    assert_eq!(
        outcome,
        AutofocusOutcome::Focused {
            node: link,
            fallback: false
        }
    );
    assert_eq!(h.doc.focused(), Some(link));
}

#[test]
fn falls_back_to_content_root() {
    let mut h = Harness::new(PopoverConfig::default(), vec![View::text("Just text").into()]);
    h.set_active(true);
    h.tick(SETTLE);
    let content = h.popover.content_node().unwrap();
    assert_eq!(
        h.frame(),
        Some(AutofocusOutcome::Focused {
            node: content,
            fallback: true
        })
    );
    assert_eq!(h.doc.focused(), Some(content));
    let element = h.doc.tree().get(content).unwrap();
    assert_eq!(element.tab_index, Some(-1));
    assert!(!element.is_tabbable());
}

#[test]
fn focusable_inside_pane_section() {
    let pane = Pane::new()
        .sectioned(true)
        .child(View::new(Element::input()));
    let mut h = Harness::new(PopoverConfig::default(), vec![pane.into()]);
    h.set_active(true);
    h.tick(SETTLE);
    let outcome = h.frame().unwrap();
    let node = outcome.node().unwrap();
    assert!(matches!(
        h.doc.tree().get(node).unwrap().kind,
        perch_core::node::ElementKind::Input
    ));
}

// ---------------------------------------------------------------------------
// Suppression and cancellation
// ---------------------------------------------------------------------------

#[test]
fn prevent_autofocus_leaves_focus_alone() {
    let mut h = Harness::new(PopoverConfig::default().prevent_autofocus(true), menu());
    h.doc.focus(h.activator);
    h.set_active(true);
    h.tick(SETTLE);
    assert_eq!(h.frame(), None);
    assert_eq!(h.doc.focused(), Some(h.activator));
}

#[test]
fn autofocus_runs_once_per_arrival() {
    let mut h = Harness::new(PopoverConfig::default(), menu());
    h.set_active(true);
    h.tick(SETTLE);
    assert!(h.frame().is_some());
    h.doc.focus(h.activator);
    assert_eq!(h.frame(), None);
    h.tick(SETTLE);
    assert_eq!(h.frame(), None);
    assert_eq!(h.doc.focused(), Some(h.activator));
}

#[test]
fn unmount_before_frame_drops_pending_focus() {
    let mut h = Harness::new(PopoverConfig::default().settle_duration(Duration::ZERO), menu());
    h.set_active(true);
    h.tick(Duration::ZERO);
    assert_eq!(h.popover.transition_state(), TransitionState::Entered);

    h.set_active(false);
    h.tick(Duration::ZERO);
    assert!(!h.popover.is_mounted());
    assert_eq!(h.frame(), None);
    assert_eq!(h.doc.focused(), None);
}

#[test]
fn exiting_before_frame_skips_focus() {
    let mut h = Harness::new(PopoverConfig::default(), menu());
    h.set_active(true);
    h.tick(SETTLE);
    h.set_active(false);
    assert_eq!(h.frame(), Some(AutofocusOutcome::Skipped));
    assert_eq!(h.doc.focused(), None);
}

#[test]
fn focus_inside_panel_dropped_on_unmount() {
    let mut h = Harness::new(PopoverConfig::default(), menu());
    h.set_active(true);
    h.tick(SETTLE);
    h.frame();
    assert!(h.doc.focused().is_some());

    h.set_active(false);
    h.tick(SETTLE);
    assert_eq!(h.doc.focused(), None);
}

#[test]
fn reentering_autofocuses_again() {
    let mut h = Harness::new(PopoverConfig::default(), menu());
    h.set_active(true);
    h.tick(SETTLE);
    h.frame();
    h.set_active(false);
    h.tick(Duration::from_millis(100));
    h.set_active(true);
    h.tick(SETTLE);
    h.doc.blur();
    assert!(h.frame().is_some());
    assert!(h.doc.focused().is_some());
}
