#![forbid(unsafe_code)]

//! perch public facade crate.
//!
//! Re-exports the element tree, events, and the popover overlay under one
//! name, plus a prelude for day-to-day use.

// --- Core re-exports -------------------------------------------------------

pub use perch_core::event::{
    Event, FocusEvent, KeyCode, KeyEvent, KeyEventKind, PointerEvent, PointerKind,
};
pub use perch_core::geometry::{Rect, Size};
pub use perch_core::node::{Element, ElementKind, Height, NodeId, NodeTree, TreeError};

// --- Widget re-exports -----------------------------------------------------

pub use perch_widgets::popover::{
    AnchoredGeometry, AutofocusOutcome, Child, DismissalCause, GeometryProvider, OverlayPlacement,
    Pane, PlacementPreferences, PlacementRequest, Popover, PopoverCx, Positioning,
    PreferredAlignment, PreferredPosition, Side, Transition, TransitionState, View,
};
pub use perch_widgets::{ConfigError, Document, PopoverConfig};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AnchoredGeometry, Child, DismissalCause, Document, Element, Event, KeyCode, KeyEvent,
        NodeId, Pane, Popover, PopoverConfig, PopoverCx, Rect, TransitionState, View,
    };

    pub use crate::{core, widgets};
}

pub use perch_core as core;
pub use perch_widgets as widgets;
