#![forbid(unsafe_code)]

//! Dismissal classification.
//!
//! [`classify`] maps one event to at most one [`DismissalCause`]. It is pure:
//! containment is recomputed against the tree on every call and nothing is
//! remembered between events. Scroll-away does not arrive as an event; the
//! popover reports it from its render pass when the geometry provider gives up.
//!
//! Causes are not deduplicated. A click that coincides with a scroll-away
//! reports both; the close handler is expected to be idempotent.

use std::fmt;

use perch_core::event::{Event, KeyCode, KeyEventKind, PointerEvent};
use perch_core::node::{NodeId, NodeTree};

use super::transition::TransitionState;

/// Why the popover asked to be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DismissalCause {
    /// Pointer or touch outside both the panel and the activator.
    Click,
    /// Escape pressed.
    EscapeKeypress,
    /// Focus reached a boundary sentinel.
    FocusOut,
    /// The activator scrolled out of view.
    ScrollOut,
}

impl DismissalCause {
    /// Short name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::EscapeKeypress => "escape",
            Self::FocusOut => "focus-out",
            Self::ScrollOut => "scroll-out",
        }
    }
}

impl fmt::Display for DismissalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the classifier needs to know about the popover right now.
#[derive(Debug, Clone, Copy)]
pub struct DismissalContext<'a> {
    /// Document tree for containment tests.
    pub tree: &'a NodeTree,
    /// Current transition state.
    pub state: TransitionState,
    /// Mounted content node, if any.
    pub content: Option<NodeId>,
    /// Trigger element.
    pub activator: NodeId,
    /// Leading and trailing focus sentinels, if mounted.
    pub sentinels: Option<[NodeId; 2]>,
}

impl DismissalContext<'_> {
    fn inside(&self, root: Option<NodeId>, target: NodeId) -> bool {
        root.is_some_and(|root| self.tree.contains(root, target))
    }
}

/// Classify a single event.
pub fn classify(event: &Event, cx: &DismissalContext<'_>) -> Option<DismissalCause> {
    if !cx.state.is_mounted() {
        return None;
    }
    match event {
        Event::Pointer(pointer) => classify_pointer(pointer, cx),
        Event::Key(key) if key.code == KeyCode::Escape && key.kind == KeyEventKind::Press => {
            Some(DismissalCause::EscapeKeypress)
        }
        Event::Focus(focus) => cx
            .sentinels
            .filter(|s| s.contains(&focus.target))
            .map(|_| DismissalCause::FocusOut),
        _ => None,
    }
}

fn classify_pointer(pointer: &PointerEvent, cx: &DismissalContext<'_>) -> Option<DismissalCause> {
    if cx.state != TransitionState::Entered {
        return None;
    }
    // An untargeted pointer landed on nothing we own.
    let Some(target) = pointer.target else {
        return Some(DismissalCause::Click);
    };
    if cx.inside(cx.content, target) || cx.inside(Some(cx.activator), target) {
        return None;
    }
    Some(DismissalCause::Click)
}
