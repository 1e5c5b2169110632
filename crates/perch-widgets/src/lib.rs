#![forbid(unsafe_code)]

//! Overlay widgets for perch.
//!
//! # Role in perch
//! `perch-widgets` holds the popover and the host-side machinery it runs
//! against: the [`Document`](document::Document) it renders into, keyboard
//! focus, scoped global listeners, and the virtual-clock scheduler that
//! drives settle timers and deferred work.
//!
//! # Primary responsibilities
//! - **Popover**: transition controller, dismissal classifier, focus
//!   coordinator, and panel renderer.
//! - **Geometry**: the [`GeometryProvider`](popover::GeometryProvider) seam
//!   and the bundled anchored implementation.
//! - **Config**: [`PopoverConfig`](config::PopoverConfig), loadable from TOML
//!   or JSON with the `config` feature.
//!
//! # How it fits in the system
//! Hosts own a `Document` and a geometry provider, feed input events and time
//! deltas to each popover, and call `frame` once the render for a tick has
//! been applied. Close requests come back as
//! [`DismissalCause`](popover::DismissalCause) values; the host decides
//! whether to deactivate.

pub mod config;
pub mod document;
pub mod focus;
pub mod listeners;
pub mod popover;
pub mod scheduler;

pub use config::{ConfigError, PopoverConfig};
pub use document::Document;
pub use popover::{Popover, PopoverCx};
