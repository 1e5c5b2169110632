#![forbid(unsafe_code)]

//! Document focus tracking and sequential (Tab) navigation.
//!
//! # Invariants
//!
//! 1. Focus is always on a live, focusable node (or `None`).
//! 2. Moving focus produces exactly one [`FocusEvent`]; re-focusing the
//!    current node produces none.
//! 3. Tab order follows [`NodeTree::tab_order`] and wraps at both ends.
//!
//! # Failure Modes
//!
//! - Focusing a stale or non-focusable node is ignored.
//! - If the focused node is removed, [`FocusManager::validate`] clears focus.

use perch_core::event::FocusEvent;
use perch_core::node::{NodeId, NodeTree};

/// Tracks which node holds keyboard focus.
#[derive(Debug, Clone, Default)]
pub struct FocusManager {
    current: Option<NodeId>,
}

impl FocusManager {
    /// Create a manager with nothing focused.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently focused node.
    #[inline]
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Move focus to `id`.
    ///
    /// Returns the resulting event, or `None` when `id` cannot take focus or
    /// already has it.
    pub fn focus(&mut self, tree: &NodeTree, id: NodeId) -> Option<FocusEvent> {
        if !tree.is_focusable(id) || self.current == Some(id) {
            return None;
        }
        let previous = self.current.replace(id);
        Some(FocusEvent {
            target: id,
            previous,
        })
    }

    /// Clear focus, returning the node that had it.
    pub fn blur(&mut self) -> Option<NodeId> {
        self.current.take()
    }

    /// Tab forward.
    pub fn focus_next(&mut self, tree: &NodeTree) -> Option<FocusEvent> {
        self.step(tree, true)
    }

    /// Tab backward.
    pub fn focus_prev(&mut self, tree: &NodeTree) -> Option<FocusEvent> {
        self.step(tree, false)
    }

    /// Drop focus that points at a removed node. Returns `true` if cleared.
    pub fn validate(&mut self, tree: &NodeTree) -> bool {
        match self.current {
            Some(id) if !tree.is_alive(id) => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    fn step(&mut self, tree: &NodeTree, forward: bool) -> Option<FocusEvent> {
        self.validate(tree);
        let order = tree.tab_order();
        if order.is_empty() {
            return None;
        }
        let position = self
            .current
            .and_then(|id| order.iter().position(|n| *n == id));
        let next = match (position, forward) {
            (None, true) => 0,
            (None, false) => order.len() - 1,
            (Some(i), true) => (i + 1) % order.len(),
            (Some(i), false) => (i + order.len() - 1) % order.len(),
        };
        self.focus(tree, order[next])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perch_core::node::Element;

    fn three_buttons() -> (NodeTree, [NodeId; 3]) {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let a = tree.append(root, Element::button()).unwrap();
        let b = tree.append(root, Element::button()).unwrap();
        let c = tree.append(root, Element::button()).unwrap();
        (tree, [a, b, c])
    }

    #[test]
    fn focus_reports_previous() {
        let (tree, [a, b, _]) = three_buttons();
        let mut fm = FocusManager::new();
        assert_eq!(
            fm.focus(&tree, a),
            Some(FocusEvent {
                target: a,
                previous: None
            })
        );
        assert_eq!(fm.focus(&tree, a), None);
        assert_eq!(fm.focus(&tree, b).map(|e| e.previous), Some(Some(a)));
        assert_eq!(fm.current(), Some(b));
    }

    #[test]
    fn non_focusable_is_ignored() {
        let mut tree = NodeTree::new();
        let plain = tree.append(tree.root(), Element::div()).unwrap();
        let mut fm = FocusManager::new();
        assert!(fm.focus(&tree, plain).is_none());
        assert_eq!(fm.current(), None);
    }

    #[test]
    fn tab_wraps_both_ways() {
        let (tree, [a, b, c]) = three_buttons();
        let mut fm = FocusManager::new();
        assert_eq!(fm.focus_next(&tree).map(|e| e.target), Some(a));
        assert_eq!(fm.focus_next(&tree).map(|e| e.target), Some(b));
        assert_eq!(fm.focus_next(&tree).map(|e| e.target), Some(c));
        assert_eq!(fm.focus_next(&tree).map(|e| e.target), Some(a));
        assert_eq!(fm.focus_prev(&tree).map(|e| e.target), Some(c));
    }

    #[test]
    fn removed_focus_is_cleared() {
        let (mut tree, [a, b, _]) = three_buttons();
        let mut fm = FocusManager::new();
        fm.focus(&tree, a);
        tree.remove(a).unwrap();
        assert!(fm.validate(&tree));
        assert_eq!(fm.current(), None);
        assert_eq!(fm.focus_next(&tree).map(|e| e.target), Some(b));
    }
}
