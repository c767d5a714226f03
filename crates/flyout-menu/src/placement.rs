#![forbid(unsafe_code)]

//! Anchored, collision-aware positioning of floating surfaces.
//!
//! [`resolve`] places a surface of a measured [`Size`] against an anchor
//! rectangle inside a viewport:
//!
//! 1. Put it on the preferred [`Side`] at `side_offset` from the anchor.
//! 2. If it does not fit on that side, try the opposite side.
//! 3. If neither fits, keep whichever side has more room (ties keep the
//!    preferred side).
//! 4. Align it on the cross axis ([`Align`] plus `align_offset`).
//! 5. Clamp both axes into the viewport inset by `collision_padding` on
//!    every side. Padding that leaves no room is ignored.
//!
//! The result is always a usable position; [`PositionResult::fits`] reports
//! when the surface is larger than the viewport and had to be cut off.
//!
//! # Example
//!
//! ```
//! use flyout_menu::placement::{resolve, Placement, Side};
//! use flyout_menu::{Rect, Size};
//!
//! let viewport = Rect::from_size(80, 24);
//! let trigger = Rect::new(70, 22, 10, 1);
//! let pos = resolve(trigger, Size::new(20, 6), &Placement::below(), viewport);
//!
//! assert_eq!(pos.side, Side::Top);
//! assert!(pos.flipped);
//! assert_eq!(pos.x, 60);
//! ```

use flyout_core::{Point, Rect, Sides, Size};

/// Side of the anchor the surface is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Side {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl Side {
    /// The opposite side.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Whether the surface stacks above or below the anchor.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

/// Cross-axis alignment relative to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
}

/// Placement preferences for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct Placement {
    /// Preferred side of the anchor.
    pub side: Side,
    /// Cross-axis alignment.
    pub align: Align,
    /// Gap between anchor and surface along the placement axis.
    pub side_offset: u16,
    /// Shift along the cross axis, away from the aligned edge.
    pub align_offset: i16,
    /// Margin kept clear along the viewport edges.
    pub collision_padding: u16,
    /// Flip and clamp to stay inside the viewport.
    pub avoid_collisions: bool,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            side: Side::Bottom,
            align: Align::Start,
            side_offset: 0,
            align_offset: 0,
            collision_padding: 0,
            avoid_collisions: true,
        }
    }
}

impl Placement {
    /// Root menu default: below the trigger, start-aligned, 4 units away.
    #[must_use]
    pub fn below() -> Self {
        Self {
            side_offset: 4,
            ..Self::default()
        }
    }

    /// Submenu default: beside the trigger item, top edges aligned.
    #[must_use]
    pub fn beside(side: Side) -> Self {
        Self {
            side,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    #[must_use]
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    #[must_use]
    pub fn with_side_offset(mut self, offset: u16) -> Self {
        self.side_offset = offset;
        self
    }

    #[must_use]
    pub fn with_align_offset(mut self, offset: i16) -> Self {
        self.align_offset = offset;
        self
    }

    #[must_use]
    pub fn with_collision_padding(mut self, padding: u16) -> Self {
        self.collision_padding = padding;
        self
    }

    #[must_use]
    pub fn with_avoid_collisions(mut self, avoid: bool) -> Self {
        self.avoid_collisions = avoid;
        self
    }

    /// Mirror the horizontal side for right-to-left layouts.
    #[must_use]
    pub fn mirrored(mut self) -> Self {
        if !self.side.is_vertical() {
            self.side = self.side.flip();
        }
        self
    }
}

/// Resolved position of a floating surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionResult {
    pub x: u16,
    pub y: u16,
    /// The side actually used.
    pub side: Side,
    /// The side differs from the preferred one.
    pub flipped: bool,
    /// At least one axis was pulled back inside the viewport.
    pub clamped: bool,
    /// The surface lies entirely inside the viewport.
    pub fits: bool,
}

impl PositionResult {
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Surface bounds for a surface of `size`.
    #[must_use]
    pub const fn rect(&self, size: Size) -> Rect {
        Rect::at(self.origin(), size)
    }
}

/// Bounds in signed space so surfaces can be computed past the edges.
#[derive(Debug, Clone, Copy)]
struct Area {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl From<Rect> for Area {
    fn from(r: Rect) -> Self {
        Self {
            left: i32::from(r.x),
            top: i32::from(r.y),
            right: i32::from(r.x) + i32::from(r.width),
            bottom: i32::from(r.y) + i32::from(r.height),
        }
    }
}

/// Compute where a surface of `size` goes relative to `anchor`.
#[must_use]
pub fn resolve(anchor: Rect, size: Size, placement: &Placement, viewport: Rect) -> PositionResult {
    let anchor_area = Area::from(anchor);
    let full = Area::from(viewport);
    let padded = viewport.inner(Sides::all(placement.collision_padding));
    let bounds = if padded.is_empty() {
        full
    } else {
        Area::from(padded)
    };
    let offset = i32::from(placement.side_offset);

    let side = if placement.avoid_collisions {
        choose_side(placement.side, anchor_area, size, offset, bounds)
    } else {
        placement.side
    };

    let (mut x, mut y) = main_axis(side, anchor_area, size, offset);
    let cross = cross_axis(side, placement, anchor_area, size);
    if side.is_vertical() {
        x = cross;
    } else {
        y = cross;
    }

    let width = i32::from(size.width);
    let height = i32::from(size.height);
    let mut clamped = false;
    if placement.avoid_collisions {
        let cx = clamp_axis(x, width, bounds.left, bounds.right, full.left, full.right);
        let cy = clamp_axis(y, height, bounds.top, bounds.bottom, full.top, full.bottom);
        clamped = cx != x || cy != y;
        x = cx;
        y = cy;
    }

    let fits = x >= full.left && y >= full.top && x + width <= full.right && y + height <= full.bottom;
    let result = PositionResult {
        x: to_coord(x),
        y: to_coord(y),
        side,
        flipped: side != placement.side,
        clamped,
        fits,
    };

    #[cfg(feature = "tracing")]
    if result.flipped || result.clamped || !result.fits {
        tracing::debug!(
            message = "menu.placement",
            preferred = ?placement.side,
            side = ?result.side,
            flipped = result.flipped,
            clamped = result.clamped,
            fits = result.fits,
            x = result.x,
            y = result.y
        );
    }

    result
}

fn choose_side(preferred: Side, anchor: Area, size: Size, offset: i32, bounds: Area) -> Side {
    let needed = needed_space(preferred, size);
    let available = available_space(preferred, anchor, offset, bounds);
    if available >= needed {
        return preferred;
    }

    let flipped = preferred.flip();
    let flipped_available = available_space(flipped, anchor, offset, bounds);
    if flipped_available >= needed {
        return flipped;
    }

    if flipped_available > available {
        flipped
    } else {
        preferred
    }
}

fn needed_space(side: Side, size: Size) -> i32 {
    if side.is_vertical() {
        i32::from(size.height)
    } else {
        i32::from(size.width)
    }
}

fn available_space(side: Side, anchor: Area, offset: i32, bounds: Area) -> i32 {
    match side {
        Side::Bottom => bounds.bottom - anchor.bottom - offset,
        Side::Top => anchor.top - offset - bounds.top,
        Side::Right => bounds.right - anchor.right - offset,
        Side::Left => anchor.left - offset - bounds.left,
    }
}

fn main_axis(side: Side, anchor: Area, size: Size, offset: i32) -> (i32, i32) {
    let width = i32::from(size.width);
    let height = i32::from(size.height);
    match side {
        Side::Bottom => (anchor.left, anchor.bottom + offset),
        Side::Top => (anchor.left, anchor.top - offset - height),
        Side::Right => (anchor.right + offset, anchor.top),
        Side::Left => (anchor.left - offset - width, anchor.top),
    }
}

fn cross_axis(side: Side, placement: &Placement, anchor: Area, size: Size) -> i32 {
    let (start, end, extent) = if side.is_vertical() {
        (anchor.left, anchor.right, i32::from(size.width))
    } else {
        (anchor.top, anchor.bottom, i32::from(size.height))
    };
    let shift = i32::from(placement.align_offset);
    match placement.align {
        Align::Start => start + shift,
        Align::Center => start + (end - start - extent) / 2 + shift,
        Align::End => end - extent - shift,
    }
}

/// Clamp a span into `[lo, hi)`, falling back to the unpadded viewport when
/// the padded range is too small, and pinning to the leading edge when even
/// that is too small.
fn clamp_axis(pos: i32, extent: i32, lo: i32, hi: i32, full_lo: i32, full_hi: i32) -> i32 {
    if hi - lo >= extent {
        pos.clamp(lo, hi - extent)
    } else if full_hi - full_lo >= extent {
        pos.clamp(full_lo, full_hi - extent)
    } else {
        full_lo
    }
}

fn to_coord(v: i32) -> u16 {
    u16::try_from(v.max(0)).unwrap_or(u16::MAX)
}
