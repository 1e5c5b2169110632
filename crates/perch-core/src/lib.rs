#![forbid(unsafe_code)]

//! Core: element tree, geometry, and canonical input events.
//!
//! # Role in perch
//! `perch-core` is the host layer. It owns the retained element tree that
//! overlays mount into, the cell geometry they are positioned with, and the
//! targeted input events the host feeds them.
//!
//! # Primary responsibilities
//! - **NodeTree**: arena of elements with generational ids, containment,
//!   tab order, hit testing, and intrinsic sizing.
//! - **Event**: keys, pointer clicks/touches, focus moves, resizes.
//! - **Rect**: cell rectangles for bounds, viewport, and placement.
//!
//! # How it fits in the system
//! `perch-widgets` builds the popover on top of these types. Nothing here
//! knows about overlays; the tree and events are the whole contract.

pub mod event;
pub mod geometry;
pub mod node;
