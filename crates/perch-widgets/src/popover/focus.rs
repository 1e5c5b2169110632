#![forbid(unsafe_code)]

//! Focus coordination for a mounted panel.
//!
//! Autofocus is requested when the panel settles into `Entered` and runs at
//! the next layout-safe point ([`Popover::frame`](super::Popover::frame)).
//! By then the content node may already be gone; that case is a silent skip.

use perch_core::node::NodeId;

use crate::document::Document;

/// Result of one autofocus attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutofocusOutcome {
    /// Focus moved (or already was) on `node`. `fallback` is set when no
    /// focusable descendant existed and the content root took focus.
    Focused {
        /// Node now holding focus.
        node: NodeId,
        /// The content root was used.
        fallback: bool,
    },
    /// The content node was cleared before the attempt ran.
    Skipped,
}

impl AutofocusOutcome {
    /// The focused node, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Focused { node, .. } => Some(*node),
            Self::Skipped => None,
        }
    }
}

/// Move focus into `content`: first focusable descendant, else the root.
pub fn autofocus(doc: &mut Document, content: Option<NodeId>) -> AutofocusOutcome {
    let Some(content) = content.filter(|c| doc.tree().is_alive(*c)) else {
        tracing::debug!(target: "perch::popover", "autofocus skipped, content cleared");
        return AutofocusOutcome::Skipped;
    };

    let (node, fallback) = match doc.tree().first_focusable_descendant(content) {
        Some(node) => (node, false),
        None => (content, true),
    };

    doc.focus(node);
    if doc.focused() != Some(node) {
        // Content root lost its tab index; nothing focusable remains.
        tracing::debug!(target: "perch::popover", ?node, "autofocus target refused focus");
        return AutofocusOutcome::Skipped;
    }

    tracing::debug!(target: "perch::popover", ?node, fallback, "autofocus");
    AutofocusOutcome::Focused { node, fallback }
}
