#![forbid(unsafe_code)]

//! Scoped global listeners.
//!
//! Overlays listen to document-wide input (clicks anywhere, touches, keys)
//! only while they are mounted. [`ListenerRegistry::attach`] hands out a
//! [`ListenerScope`]; the listener is live exactly as long as the scope
//! exists. Dropping the scope releases it, including while unwinding from a
//! panicking handler, so no listener outlives the mount that created it.
//!
//! # Invariants
//!
//! - `len()` counts live scopes only.
//! - A scope accepts an event only if it is still registered and its kinds
//!   cover the event.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use bitflags::bitflags;
use perch_core::event::{Event, PointerKind};

bitflags! {
    /// Global event kinds a listener subscribes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ListenerKinds: u8 {
        /// Pointer clicks anywhere in the document.
        const CLICK       = 0b001;
        /// Touch starts anywhere in the document.
        const TOUCH_START = 0b010;
        /// Key events.
        const KEY         = 0b100;
    }
}

impl ListenerKinds {
    /// The global kind an event belongs to. Focus and resize events are not
    /// delivered through global listeners and map to the empty set.
    pub fn of(event: &Event) -> Self {
        match event {
            Event::Key(_) => Self::KEY,
            Event::Pointer(p) => match p.kind {
                PointerKind::Click => Self::CLICK,
                PointerKind::TouchStart => Self::TOUCH_START,
            },
            Event::Focus(_) | Event::Resize { .. } => Self::empty(),
        }
    }
}

#[derive(Debug, Default)]
struct Table {
    next_id: u64,
    live: AHashMap<u64, ListenerKinds>,
}

/// Shared registry of live global listeners.
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    table: Rc<RefCell<Table>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `kinds`. It stays live until the scope is dropped.
    pub fn attach(&self, kinds: ListenerKinds) -> ListenerScope {
        let mut table = self.table.borrow_mut();
        let id = table.next_id;
        table.next_id += 1;
        table.live.insert(id, kinds);
        tracing::trace!(target: "perch::listeners", id, ?kinds, "listener attached");
        ListenerScope {
            id,
            kinds,
            table: Rc::clone(&self.table),
        }
    }

    /// Number of live listeners.
    pub fn len(&self) -> usize {
        self.table.borrow().live.len()
    }

    /// Whether no listener is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live listeners subscribed to any of `kinds`.
    pub fn count(&self, kinds: ListenerKinds) -> usize {
        self.table
            .borrow()
            .live
            .values()
            .filter(|k| k.intersects(kinds))
            .count()
    }
}

/// A live registration. Releasing happens on drop.
#[derive(Debug)]
pub struct ListenerScope {
    id: u64,
    kinds: ListenerKinds,
    table: Rc<RefCell<Table>>,
}

impl ListenerScope {
    /// Kinds this scope listens for.
    pub fn kinds(&self) -> ListenerKinds {
        self.kinds
    }

    /// Whether this scope should receive `event`.
    pub fn accepts(&self, event: &Event) -> bool {
        let kind = ListenerKinds::of(event);
        !kind.is_empty()
            && self.kinds.intersects(kind)
            && self.table.borrow().live.contains_key(&self.id)
    }
}

impl Drop for ListenerScope {
    fn drop(&mut self) {
        // `try_borrow_mut` keeps release infallible if a panic unwinds while
        // the table is borrowed.
        if let Ok(mut table) = self.table.try_borrow_mut() {
            table.live.remove(&self.id);
        }
        tracing::trace!(target: "perch::listeners", id = self.id, "listener released");
    }
}
