#![forbid(unsafe_code)]

//! Anchored popover overlay.
//!
//! A [`Popover`] is a transient panel anchored to an activator element. It
//! appears and disappears with a timed transition, asks a
//! [`GeometryProvider`] where to go on every render, moves focus into itself
//! once settled, and reports [`DismissalCause`]s through a single close
//! handler. It never closes itself: the host reacts to the cause by calling
//! [`Popover::set_active`] with `false`.
//!
//! # Driving a popover
//!
//! ```rust,ignore
//! let mut popover = Popover::new(activator, PopoverConfig::default())
//!     .id("menu")
//!     .children(vec![View::text("Hello").into()])
//!     .on_close(move |cause| closes.borrow_mut().push(cause));
//!
//! let mut geometry = AnchoredGeometry::new();
//! let mut cx = PopoverCx::new(&mut doc, &mut geometry);
//! popover.set_active(true, &mut cx);       // Exited -> Entering, mounts
//! popover.tick(Duration::from_millis(500), &mut cx); // -> Entered
//! popover.frame(&mut cx);                  // autofocus runs here
//! popover.handle_event(&event, &mut cx);   // may report a cause
//! ```
//!
//! # Invariants
//!
//! - Content is mounted iff the transition state is not `Exited`, after every
//!   public call returns.
//! - While mounted the popover holds exactly one global listener scope; it is
//!   released on unmount.
//! - No cause is reported while unmounted.
//! - Scroll-out is reported by host renders and the mount render, never by a
//!   settle re-render.
//! - Autofocus runs only from [`Popover::frame`], at most once per arrival in
//!   `Entered`.

pub mod content;
pub mod dismiss;
pub mod focus;
pub mod panel;
pub mod placement;
pub mod transition;

use std::fmt;
use std::time::Duration;

use perch_core::event::Event;
use perch_core::geometry::Size;
use perch_core::node::{NodeId, NodeTree};

pub use content::{Child, Pane, View};
pub use dismiss::{DismissalCause, DismissalContext, classify};
pub use focus::AutofocusOutcome;
pub use panel::{PanelClasses, PanelNodes, PanelView};
pub use placement::{
    AnchoredGeometry, GeometryProvider, OverlayPlacement, PlacementPreferences, PlacementRequest,
    Positioning, PreferredAlignment, PreferredPosition, Side,
};
pub use transition::{Transition, TransitionController, TransitionState};

use crate::config::PopoverConfig;
use crate::document::Document;
use crate::listeners::{ListenerKinds, ListenerScope};
use crate::scheduler::Scheduler;
use transition::SettleToken;

/// Close handler invoked with every reported cause.
pub type CloseHandler = Box<dyn FnMut(DismissalCause)>;

/// What a popover operates on during a call.
pub struct PopoverCx<'a> {
    /// Host document.
    pub doc: &'a mut Document,
    /// Placement source.
    pub geometry: &'a mut dyn GeometryProvider,
}

impl<'a> PopoverCx<'a> {
    /// Bundle a document and a geometry provider.
    pub fn new(doc: &'a mut Document, geometry: &'a mut dyn GeometryProvider) -> Self {
        Self { doc, geometry }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Settle(SettleToken),
    Autofocus { mount: u64 },
}

#[derive(Debug)]
struct Mounted {
    nodes: PanelNodes,
    scope: ListenerScope,
    measured: bool,
}

/// Anchored overlay with transition, focus, and dismissal handling.
pub struct Popover {
    activator: NodeId,
    config: PopoverConfig,
    id: Option<String>,
    children: Vec<Child>,
    on_close: Option<CloseHandler>,
    controller: TransitionController,
    scheduler: Scheduler<Task>,
    mounted: Option<Mounted>,
    placement: Option<OverlayPlacement>,
    mount_count: u64,
}

impl fmt::Debug for Popover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Popover")
            .field("activator", &self.activator)
            .field("id", &self.id)
            .field("state", &self.controller.state())
            .field("mounted", &self.mounted.as_ref().map(|m| m.nodes))
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

impl Popover {
    /// Create an inactive popover anchored to `activator`.
    pub fn new(activator: NodeId, config: PopoverConfig) -> Self {
        Self {
            activator,
            controller: TransitionController::new(config.settle_duration),
            config,
            id: None,
            children: Vec::new(),
            on_close: None,
            scheduler: Scheduler::new(),
            mounted: None,
            placement: None,
            mount_count: 0,
        }
    }

    /// Id applied to the content node.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Initial content.
    #[must_use]
    pub fn children(mut self, children: Vec<Child>) -> Self {
        self.children = children;
        self
    }

    /// Close handler.
    #[must_use]
    pub fn on_close(mut self, handler: impl FnMut(DismissalCause) + 'static) -> Self {
        self.on_close = Some(Box::new(handler));
        self
    }

    /// Current transition state.
    #[inline]
    pub fn transition_state(&self) -> TransitionState {
        self.controller.state()
    }

    /// Last `active` input.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.controller.is_active()
    }

    /// Whether the panel subtree exists.
    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Content node while mounted.
    pub fn content_node(&self) -> Option<NodeId> {
        self.mounted.as_ref().map(|m| m.nodes.content)
    }

    /// Panel node handles while mounted.
    pub fn panel_nodes(&self) -> Option<PanelNodes> {
        self.mounted.as_ref().map(|m| m.nodes)
    }

    /// Placement applied by the last render.
    pub fn placement(&self) -> Option<OverlayPlacement> {
        self.placement
    }

    /// The activator element.
    #[inline]
    pub fn activator(&self) -> NodeId {
        self.activator
    }

    /// Configuration.
    #[inline]
    pub fn config(&self) -> &PopoverConfig {
        &self.config
    }

    /// Feed the `active` flag. Returns the transition it caused, if any.
    pub fn set_active(&mut self, active: bool, cx: &mut PopoverCx<'_>) -> Option<Transition> {
        let transition = self
            .controller
            .set_active(active, &mut self.scheduler, Task::Settle)?;
        self.reconcile(transition, cx);
        Some(transition)
    }

    /// Advance time, settling any transition whose timer elapsed.
    pub fn tick(&mut self, delta: Duration, cx: &mut PopoverCx<'_>) -> Vec<Transition> {
        let mut transitions = Vec::new();
        for task in self.scheduler.advance(delta) {
            let Task::Settle(token) = task else {
                continue;
            };
            let Some(transition) = self.controller.settle(token) else {
                continue;
            };
            self.reconcile(transition, cx);
            transitions.push(transition);
            if let Some(reentry) = self.controller.resume(&mut self.scheduler, Task::Settle) {
                self.reconcile(reentry, cx);
                transitions.push(reentry);
            }
        }
        transitions
    }

    /// Layout-safe point: run deferred autofocus.
    pub fn frame(&mut self, cx: &mut PopoverCx<'_>) -> Option<AutofocusOutcome> {
        let mut outcome = None;
        for task in self.scheduler.take_deferred() {
            let Task::Autofocus { mount } = task else {
                continue;
            };
            let content = self
                .mounted
                .as_ref()
                .filter(|_| mount == self.mount_count)
                .filter(|_| self.controller.state() == TransitionState::Entered)
                .map(|m| m.nodes.content);
            outcome = Some(focus::autofocus(cx.doc, content));
        }
        outcome
    }

    /// Route an event through the dismissal classifier.
    ///
    /// Resize events re-render instead and can report a scroll-out.
    pub fn handle_event(
        &mut self,
        event: &Event,
        cx: &mut PopoverCx<'_>,
    ) -> Option<DismissalCause> {
        if matches!(event, Event::Resize { .. }) {
            return self.render(cx);
        }
        let mounted = self.mounted.as_ref()?;
        if !ListenerKinds::of(event).is_empty() && !mounted.scope.accepts(event) {
            return None;
        }
        let context = DismissalContext {
            tree: cx.doc.tree(),
            state: self.controller.state(),
            content: Some(mounted.nodes.content),
            activator: self.activator,
            sentinels: Some(mounted.nodes.sentinels()),
        };
        let cause = classify(event, &context)?;
        self.emit(cause);
        Some(cause)
    }

    /// Replace the content and re-render.
    pub fn set_children(&mut self, children: Vec<Child>, cx: &mut PopoverCx<'_>) {
        self.children = children;
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        let tree = cx.doc.tree_mut();
        for child in tree.children(mounted.nodes.content).to_vec() {
            if let Err(err) = tree.remove(child) {
                tracing::debug!(target: "perch::popover", %err, "stale content child");
            }
        }
        mount_content(tree, mounted.nodes.content, &self.children, self.config.sectioned);
        mounted.measured = false;
        self.paint(cx);
    }

    /// Query geometry and apply the panel view.
    ///
    /// Returns [`DismissalCause::ScrollOut`] (after reporting it) when the
    /// provider could not place the panel.
    pub fn render(&mut self, cx: &mut PopoverCx<'_>) -> Option<DismissalCause> {
        if !self.paint(cx) {
            return None;
        }
        self.emit(DismissalCause::ScrollOut);
        Some(DismissalCause::ScrollOut)
    }

    /// Apply the panel view for the current state. Returns `true` when the
    /// provider answered [`Positioning::ScrolledOut`].
    fn paint(&mut self, cx: &mut PopoverCx<'_>) -> bool {
        let state = self.controller.state();
        let Some(mounted) = self.mounted.as_mut() else {
            return false;
        };
        let span = tracing::debug_span!(
            target: "perch::popover",
            "popover.render",
            state = state.as_str(),
            measuring = tracing::field::Empty,
            side = tracing::field::Empty
        );
        let _guard = span.enter();

        let activator = cx.doc.tree().get(self.activator).map(|e| e.bounds);
        let mut content = mounted
            .measured
            .then(|| natural_size(cx.doc.tree(), mounted.nodes.content));
        let mut scrolled_out = false;

        let placement = loop {
            let positioning = match activator {
                Some(activator) => cx.geometry.position(&PlacementRequest {
                    activator,
                    viewport: cx.doc.viewport(),
                    content,
                    preferences: self.config.preferences,
                }),
                None => Positioning::ScrolledOut,
            };
            let placement = match positioning {
                Positioning::Placed(placement) => placement,
                Positioning::ScrolledOut => {
                    scrolled_out = true;
                    OverlayPlacement::measuring_at(activator.unwrap_or_default())
                }
            };
            let view = PanelView {
                state,
                placement,
                dom_id: self.id.as_deref(),
            };
            if let Err(err) = mounted.nodes.apply(cx.doc.tree_mut(), &view) {
                tracing::debug!(target: "perch::popover", %err, "panel render skipped");
            }
            if scrolled_out || mounted.measured {
                break placement;
            }
            mounted.measured = true;
            if !placement.measuring {
                break placement;
            }
            content = Some(natural_size(cx.doc.tree(), mounted.nodes.content));
        };

        span.record("measuring", placement.measuring);
        span.record("side", placement.side.as_str());
        self.placement = Some(placement);
        scrolled_out
    }

    // Only a mount render reports scroll-out here.
    fn reconcile(&mut self, transition: Transition, cx: &mut PopoverCx<'_>) {
        if transition.mounts() {
            self.mount(cx);
        }
        if transition.unmounts() {
            self.unmount(cx);
            return;
        }
        if self.paint(cx) && transition.mounts() {
            self.emit(DismissalCause::ScrollOut);
        }
        if transition.to == TransitionState::Entered && !self.config.prevent_autofocus {
            self.scheduler.defer(Task::Autofocus {
                mount: self.mount_count,
            });
        }
    }

    fn mount(&mut self, cx: &mut PopoverCx<'_>) {
        let tree = cx.doc.tree_mut();
        let root = tree.root();
        let nodes = match PanelNodes::mount(tree, root) {
            Ok(nodes) => nodes,
            Err(err) => {
                tracing::warn!(target: "perch::popover", %err, "panel mount failed");
                return;
            }
        };
        mount_content(tree, nodes.content, &self.children, self.config.sectioned);

        let scope = cx.doc.listeners().attach(ListenerKinds::all());
        self.mount_count = self.mount_count.wrapping_add(1);
        self.mounted = Some(Mounted {
            nodes,
            scope,
            measured: false,
        });
    }

    fn unmount(&mut self, cx: &mut PopoverCx<'_>) {
        self.scheduler.clear_deferred();
        self.placement = None;
        let Some(mounted) = self.mounted.take() else {
            return;
        };
        if let Err(err) = mounted.nodes.unmount(cx.doc.tree_mut()) {
            tracing::debug!(target: "perch::popover", %err, "panel already removed");
        }
        cx.doc.validate_focus();
    }

    fn emit(&mut self, cause: DismissalCause) {
        tracing::debug!(target: "perch::popover", cause = cause.as_str(), "dismissal");
        if let Some(handler) = self.on_close.as_mut() {
            handler(cause);
        }
    }
}

fn mount_content(tree: &mut NodeTree, content: NodeId, children: &[Child], sectioned: bool) {
    let panes = content::normalize(children, sectioned);
    if let Err(err) = content::mount_panes(tree, content, &panes) {
        tracing::debug!(target: "perch::popover", %err, "content mount skipped");
    }
}

/// Natural size of the content, ignoring any height fixed on the node itself.
fn natural_size(tree: &NodeTree, content: NodeId) -> Size {
    tree.children(content)
        .iter()
        .map(|child| tree.intrinsic_size(*child))
        .fold(Size::default(), |acc, s| {
            Size::new(acc.width.max(s.width), acc.height.saturating_add(s.height))
        })
}
