#![forbid(unsafe_code)]

//! Geometry provider seam and the bundled anchored implementation.
//!
//! The popover never computes coordinates itself. Each render it hands a
//! [`PlacementRequest`] to a [`GeometryProvider`] and renders whatever
//! [`Positioning`] comes back. Nothing is cached across renders.
//!
//! [`AnchoredGeometry`] positions the panel directly above or below the
//! activator and flips to the other side when the preferred one lacks room.
//!
//! # Measuring protocol
//!
//! The first render of a mount has no content size (`request.content` is
//! `None`); providers answer with `measuring = true`. The popover then
//! samples the natural content size and renders again with it.
//!
//! # Invariants
//!
//! - The returned rectangle never extends past the viewport horizontally.
//! - `desired_height` never exceeds the space on the chosen side.
//! - An activator that no longer intersects the viewport yields
//!   [`Positioning::ScrolledOut`].

use perch_core::geometry::{Rect, Size};

/// Which side of the activator the caller would like the panel on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PreferredPosition {
    /// Above the activator.
    Above,
    /// Below the activator.
    #[default]
    Below,
    /// Whichever side has more room.
    MostSpace,
}

/// Horizontal alignment relative to the activator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PreferredAlignment {
    /// Left edges aligned.
    Left,
    /// Centers aligned.
    #[default]
    Center,
    /// Right edges aligned.
    Right,
}

/// Placement preferences forwarded verbatim to the geometry provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlacementPreferences {
    /// Preferred side.
    pub preferred_position: PreferredPosition,
    /// Preferred alignment.
    pub preferred_alignment: PreferredAlignment,
    /// Span the whole viewport width.
    pub full_width: bool,
    /// Use all the space on the chosen side instead of the content height.
    pub full_height: bool,
    /// Position relative to the viewport instead of the scrolling document.
    pub fixed: bool,
}

/// Side of the activator the panel ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    /// Above the activator.
    Above,
    /// Below the activator.
    #[default]
    Below,
}

impl Side {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
        }
    }
}

/// Where the panel goes this render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayPlacement {
    /// Real geometry is not known yet; render at natural size.
    pub measuring: bool,
    /// Left edge of the panel.
    pub left: u16,
    /// Top edge of the panel.
    pub top: u16,
    /// Panel width.
    pub width: u16,
    /// Height the content wrapper should be fixed to.
    pub desired_height: u16,
    /// Chosen side.
    pub side: Side,
    /// Horizontal center of the activator, for the tip.
    pub activator_center_x: u16,
    /// Mirrors [`PlacementPreferences::fixed`].
    pub fixed: bool,
    /// Mirrors [`PlacementPreferences::full_width`].
    pub full_width: bool,
}

impl OverlayPlacement {
    /// Placement used before any geometry is known.
    pub fn measuring_at(activator: Rect) -> Self {
        Self {
            measuring: true,
            left: activator.x,
            top: activator.bottom(),
            width: activator.width,
            desired_height: 0,
            side: Side::Below,
            activator_center_x: activator.center_x(),
            fixed: false,
            full_width: false,
        }
    }

    /// Panel rectangle for a given rendered height.
    pub fn rect(&self, height: u16) -> Rect {
        Rect::new(self.left, self.top, self.width, height)
    }
}

/// Input to a geometry provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRequest {
    /// Activator bounds.
    pub activator: Rect,
    /// Visible area.
    pub viewport: Rect,
    /// Natural content size, or `None` on the measuring pass.
    pub content: Option<Size>,
    /// Caller preferences.
    pub preferences: PlacementPreferences,
}

/// Provider answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positioning {
    /// Render at this placement.
    Placed(OverlayPlacement),
    /// The activator scrolled out of view or cannot be placed against.
    ScrolledOut,
}

/// Computes panel placement from activator and viewport geometry.
pub trait GeometryProvider {
    /// Position the panel for this render.
    fn position(&mut self, request: &PlacementRequest) -> Positioning;
}

impl<F> GeometryProvider for F
where
    F: FnMut(&PlacementRequest) -> Positioning,
{
    fn position(&mut self, request: &PlacementRequest) -> Positioning {
        self(request)
    }
}

/// Anchors the panel above or below the activator with flip-on-overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnchoredGeometry {
    /// Rows between activator and panel.
    pub gap: u16,
}

impl AnchoredGeometry {
    /// Create a provider with no gap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gap between activator and panel.
    #[must_use]
    pub fn gap(mut self, gap: u16) -> Self {
        self.gap = gap;
        self
    }

    fn space(&self, side: Side, activator: Rect, viewport: Rect) -> u16 {
        match side {
            Side::Above => activator.y.saturating_sub(viewport.y),
            Side::Below => viewport.bottom().saturating_sub(activator.bottom()),
        }
        .saturating_sub(self.gap)
    }

    fn resolve_side(&self, request: &PlacementRequest, needed: u16) -> Side {
        let above = self.space(Side::Above, request.activator, request.viewport);
        let below = self.space(Side::Below, request.activator, request.viewport);
        let (primary, primary_space, flipped, flipped_space) =
            match request.preferences.preferred_position {
                PreferredPosition::Above => (Side::Above, above, Side::Below, below),
                PreferredPosition::Below => (Side::Below, below, Side::Above, above),
                PreferredPosition::MostSpace => {
                    return if above > below { Side::Above } else { Side::Below };
                }
            };

        if primary_space >= needed {
            return primary;
        }
        if flipped_space >= needed || flipped_space > primary_space {
            return flipped;
        }
        primary
    }
}

impl GeometryProvider for AnchoredGeometry {
    fn position(&mut self, request: &PlacementRequest) -> Positioning {
        let PlacementRequest {
            activator,
            viewport,
            content,
            preferences,
        } = *request;

        if !activator.intersects(&viewport) {
            return Positioning::ScrolledOut;
        }

        let natural = content.unwrap_or(Size::new(activator.width, 0));
        let width = if preferences.full_width {
            viewport.width
        } else {
            natural.width.min(viewport.width)
        };

        let side = self.resolve_side(request, natural.height.max(1));
        let space = self.space(side, activator, viewport);
        let desired_height = match content {
            None => 0,
            Some(_) if preferences.full_height => space,
            Some(size) => size.height.min(space),
        };

        let top = match side {
            Side::Below => activator.bottom().saturating_add(self.gap),
            Side::Above => activator
                .y
                .saturating_sub(self.gap)
                .saturating_sub(desired_height)
                .max(viewport.y),
        };

        let left = if preferences.full_width {
            viewport.x
        } else {
            let start = match preferences.preferred_alignment {
                PreferredAlignment::Left => activator.x,
                PreferredAlignment::Center => activator.center_x().saturating_sub(width / 2),
                PreferredAlignment::Right => activator.right().saturating_sub(width),
            };
            clamp_x(start, width, viewport)
        };

        Positioning::Placed(OverlayPlacement {
            measuring: content.is_none(),
            left,
            top,
            width,
            desired_height,
            side,
            activator_center_x: activator.center_x(),
            fixed: preferences.fixed,
            full_width: preferences.full_width,
        })
    }
}

/// Clamp x position so the panel doesn't overflow the viewport.
fn clamp_x(x: u16, width: u16, viewport: Rect) -> u16 {
    let vp_right = viewport.right();
    if x.saturating_add(width) > vp_right {
        vp_right.saturating_sub(width).max(viewport.x)
    } else {
        x.max(viewport.x)
    }
}
