#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! Events arrive already targeted: the host resolves pointer coordinates to
//! the deepest element under the cursor (see [`NodeTree::hit_test`]) and focus
//! moves to a concrete element. Overlay logic only ever reasons about targets
//! and keys, never about raw terminal input.
//!
//! # Design Notes
//!
//! - Pointer coordinates are 0-indexed cells.
//! - `KeyEventKind` defaults to `Press` when not available from the host.
//!
//! [`NodeTree::hit_test`]: crate::node::NodeTree::hit_test

use crate::node::NodeId;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event, delivered globally.
    Key(KeyEvent),

    /// A click or touch-start, targeted at the element under the pointer.
    Pointer(PointerEvent),

    /// An element received keyboard focus.
    Focus(FocusEvent),

    /// The viewport was resized.
    Resize {
        /// New viewport width in cells.
        width: u16,
        /// New viewport height in cells.
        height: u16,
    },
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key involved.
    pub code: KeyCode,

    /// Press, repeat, or release.
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A key press.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            kind: KeyEventKind::Press,
        }
    }

    /// Same key with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Keys overlays react to or pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Enter/Return key.
    Enter,
    /// Escape key.
    Escape,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,
    /// Key is being held (repeat event).
    Repeat,
    /// Key was released.
    Release,
}

/// A pointer interaction that can dismiss an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    /// Click or touch-start.
    pub kind: PointerKind,

    /// Deepest element under the pointer, or `None` when nothing was hit.
    pub target: Option<NodeId>,

    /// X coordinate (0-indexed).
    pub x: u16,

    /// Y coordinate (0-indexed).
    pub y: u16,
}

impl PointerEvent {
    /// Create a pointer event.
    #[must_use]
    pub const fn new(kind: PointerKind, target: Option<NodeId>, x: u16, y: u16) -> Self {
        Self { kind, target, x, y }
    }
}

/// Pointer interaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Mouse click (button released over the same element).
    Click,
    /// First contact of a touch.
    TouchStart,
}

/// Focus moved onto an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEvent {
    /// The element that now holds focus.
    pub target: NodeId,
    /// The element that held focus before, if any.
    pub previous: Option<NodeId>,
}
