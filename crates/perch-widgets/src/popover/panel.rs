#![forbid(unsafe_code)]

//! Panel renderer.
//!
//! The panel skeleton is built once per mount by [`PanelNodes::mount`]:
//!
//! ```text
//! div.Popover
//!   div.Popover-Tip                  absent while measuring
//!   div.Popover-FocusTracker         leading sentinel, tabindex 0
//!   div.Popover-Wrapper
//!     div.Popover-Content #id        tabindex -1, the content node
//!   div.Popover-FocusTracker         trailing sentinel, tabindex 0
//! ```
//!
//! Every render calls [`PanelNodes::apply`] with a [`PanelView`] built from
//! the current transition state and placement. The view is a plain input;
//! nothing from the previous render is read back to decide classes.

use bitflags::bitflags;
use perch_core::geometry::Rect;
use perch_core::node::{Element, Height, NodeId, NodeTree, TreeError};

use super::placement::{OverlayPlacement, Side};
use super::transition::TransitionState;

/// Base class of the overlay root.
pub const OVERLAY_CLASS: &str = "Popover";
/// Tip indicator class.
pub const TIP_CLASS: &str = "Popover-Tip";
/// Focus sentinel class.
pub const FOCUS_TRACKER_CLASS: &str = "Popover-FocusTracker";
/// Content wrapper class.
pub const WRAPPER_CLASS: &str = "Popover-Wrapper";
/// Content node class.
pub const CONTENT_CLASS: &str = "Popover-Content";

bitflags! {
    /// State-dependent modifier classes on the overlay root.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PanelClasses: u8 {
        /// Only while exiting.
        const EXITING          = 0b0001;
        /// Placed above the activator.
        const POSITIONED_ABOVE = 0b0010;
        /// Spans the viewport width.
        const FULL_WIDTH       = 0b0100;
        /// Positioned against the viewport.
        const FIXED            = 0b1000;
    }
}

impl PanelClasses {
    const NAMES: [(Self, &'static str); 4] = [
        (Self::EXITING, "Popover-exiting"),
        (Self::POSITIONED_ABOVE, "Popover-positionedAbove"),
        (Self::FULL_WIDTH, "Popover-fullWidth"),
        (Self::FIXED, "Popover-fixed"),
    ];

    /// Modifier set for a state and placement.
    pub fn derive(state: TransitionState, placement: &OverlayPlacement) -> Self {
        let mut classes = Self::empty();
        classes.set(Self::EXITING, state == TransitionState::Exiting);
        classes.set(Self::POSITIONED_ABOVE, placement.side == Side::Above);
        classes.set(Self::FULL_WIDTH, placement.full_width);
        classes.set(Self::FIXED, placement.fixed);
        classes
    }

    /// Class identifiers for the set flags.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }

    fn apply(self, element: &mut Element) {
        for (flag, name) in Self::NAMES {
            element.set_class(name, self.contains(flag));
        }
    }
}

/// Inputs to one render of the panel.
#[derive(Debug, Clone, Copy)]
pub struct PanelView<'a> {
    /// Current transition state.
    pub state: TransitionState,
    /// Placement from the geometry provider.
    pub placement: OverlayPlacement,
    /// Id applied to the content node.
    pub dom_id: Option<&'a str>,
}

/// Node handles for a mounted panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelNodes {
    /// Overlay root, child of the document root.
    pub overlay: NodeId,
    /// Tip indicator, when shown.
    pub tip: Option<NodeId>,
    /// Leading focus sentinel.
    pub leading: NodeId,
    /// Content wrapper.
    pub wrapper: NodeId,
    /// Content node.
    pub content: NodeId,
    /// Trailing focus sentinel.
    pub trailing: NodeId,
}

impl PanelNodes {
    /// Build the skeleton under `parent`.
    pub fn mount(tree: &mut NodeTree, parent: NodeId) -> Result<Self, TreeError> {
        let overlay = tree.append(parent, Element::div().with_class(OVERLAY_CLASS))?;
        let leading = tree.append(overlay, sentinel())?;
        let wrapper = tree.append(overlay, Element::div().with_class(WRAPPER_CLASS))?;
        let content = tree.append(
            wrapper,
            Element::div().with_class(CONTENT_CLASS).with_tab_index(-1),
        )?;
        let trailing = tree.append(overlay, sentinel())?;
        Ok(Self {
            overlay,
            tip: None,
            leading,
            wrapper,
            content,
            trailing,
        })
    }

    /// Both sentinels, leading first.
    #[inline]
    pub fn sentinels(&self) -> [NodeId; 2] {
        [self.leading, self.trailing]
    }

    /// Apply one render.
    pub fn apply(&mut self, tree: &mut NodeTree, view: &PanelView<'_>) -> Result<(), TreeError> {
        let placement = &view.placement;

        let overlay = tree
            .get_mut(self.overlay)
            .ok_or(TreeError::StaleNode(self.overlay))?;
        PanelClasses::derive(view.state, placement).apply(overlay);

        self.sync_tip(tree, placement)?;

        let content = tree
            .get_mut(self.content)
            .ok_or(TreeError::StaleNode(self.content))?;
        content.dom_id = view.dom_id.map(str::to_owned);
        content.height = if placement.measuring {
            Height::Auto
        } else {
            Height::Cells(placement.desired_height)
        };

        let height = tree.intrinsic_size(self.content).height;
        let rect = placement.rect(height);
        for id in [self.overlay, self.wrapper, self.content] {
            tree.set_bounds(id, rect)?;
        }
        Ok(())
    }

    /// Remove the whole panel subtree.
    pub fn unmount(self, tree: &mut NodeTree) -> Result<(), TreeError> {
        tree.remove(self.overlay)
    }

    fn sync_tip(&mut self, tree: &mut NodeTree, placement: &OverlayPlacement) -> Result<(), TreeError> {
        if placement.measuring {
            if let Some(tip) = self.tip.take() {
                tree.remove(tip)?;
            }
            return Ok(());
        }
        let tip = match self.tip.filter(|tip| tree.is_alive(*tip)) {
            Some(tip) => tip,
            None => tree.insert(self.overlay, 0, Element::div().with_class(TIP_CLASS))?,
        };
        self.tip = Some(tip);
        if let Some(element) = tree.get_mut(tip) {
            element.left = Some(placement.activator_center_x.saturating_sub(placement.left));
        }
        Ok(())
    }
}

fn sentinel() -> Element {
    Element::div()
        .with_class(FOCUS_TRACKER_CLASS)
        .with_tab_index(0)
}
