#![forbid(unsafe_code)]

//! The host document: element tree, focus, global listeners, viewport.
//!
//! [`Document`] is what overlays render into and what the host feeds input
//! through. The helpers here turn raw host input (a pointer position, a Tab
//! press) into the targeted [`Event`]s overlay logic consumes.

use perch_core::event::{Event, PointerEvent, PointerKind};
use perch_core::geometry::Rect;
use perch_core::node::{NodeId, NodeTree};

use crate::focus::FocusManager;
use crate::listeners::ListenerRegistry;

/// Element tree plus the interaction state that lives next to it.
#[derive(Debug)]
pub struct Document {
    tree: NodeTree,
    focus: FocusManager,
    listeners: ListenerRegistry,
    viewport: Rect,
}

impl Document {
    /// Create a document whose root covers `viewport`.
    pub fn new(viewport: Rect) -> Self {
        let mut tree = NodeTree::new();
        let root = tree.root();
        if let Some(element) = tree.get_mut(root) {
            element.bounds = viewport;
        }
        Self {
            tree,
            focus: FocusManager::new(),
            listeners: ListenerRegistry::new(),
            viewport,
        }
    }

    /// The element tree.
    #[inline]
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Mutable element tree.
    #[inline]
    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    /// Global listener registry.
    #[inline]
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Visible area of the document.
    #[inline]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Resize the viewport and return the matching event.
    pub fn set_viewport(&mut self, viewport: Rect) -> Event {
        self.viewport = viewport;
        let root = self.tree.root();
        if let Some(element) = self.tree.get_mut(root) {
            element.bounds = viewport;
        }
        Event::Resize {
            width: viewport.width,
            height: viewport.height,
        }
    }

    /// Node holding keyboard focus, if it is still alive.
    pub fn focused(&mut self) -> Option<NodeId> {
        self.validate_focus();
        self.focus.current()
    }

    /// Drop focus that points into a removed subtree. Returns `true` if cleared.
    pub fn validate_focus(&mut self) -> bool {
        self.focus.validate(&self.tree)
    }

    /// Build a pointer event targeted at whatever lies under `(x, y)`.
    pub fn pointer(&self, kind: PointerKind, x: u16, y: u16) -> Event {
        Event::Pointer(PointerEvent::new(kind, self.tree.hit_test(x, y), x, y))
    }

    /// Build a click targeted at a specific node.
    pub fn click_on(&self, id: NodeId) -> Event {
        let bounds = self.tree.get(id).map(|e| e.bounds).unwrap_or_default();
        Event::Pointer(PointerEvent::new(
            PointerKind::Click,
            Some(id),
            bounds.x,
            bounds.y,
        ))
    }

    /// Move focus to `id`.
    pub fn focus(&mut self, id: NodeId) -> Option<Event> {
        self.focus.focus(&self.tree, id).map(Event::Focus)
    }

    /// Clear focus.
    pub fn blur(&mut self) -> Option<NodeId> {
        self.focus.blur()
    }

    /// Tab forward through the document.
    pub fn focus_next(&mut self) -> Option<Event> {
        self.focus.focus_next(&self.tree).map(Event::Focus)
    }

    /// Tab backward through the document.
    pub fn focus_prev(&mut self) -> Option<Event> {
        self.focus.focus_prev(&self.tree).map(Event::Focus)
    }
}
