#![forbid(unsafe_code)]

//! Render boundary.
//!
//! [`MenuController::render_state`](crate::controller::MenuController::render_state)
//! produces a [`MenuView`]: a read-only snapshot of every open level in
//! stacking order, each with its entries in tree order. Renderers draw it
//! however they like and report what they measured back through
//! `report_surface_size` and `report_item_bounds`.

use flyout_core::{Rect, Size};
use unicode_width::UnicodeWidthStr;

use crate::controller::LevelPhase;
use crate::placement::PositionResult;
use crate::portal::SurfaceId;
use crate::tree::{LevelId, NodeId, NodeKind};

/// Selection mark shown next to checkable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indicator {
    #[default]
    None,
    Checkbox(bool),
    Radio(bool),
}

/// One displayed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView<'a> {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: &'a str,
    pub disabled: bool,
    pub highlighted: bool,
    pub indicator: Indicator,
    /// For submenu triggers: the submenu is currently open.
    pub submenu_open: bool,
}

/// One open floating surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelView<'a> {
    pub id: LevelId,
    pub surface: SurfaceId,
    pub phase: LevelPhase,
    /// `None` until a size has been reported for this surface.
    pub position: Option<PositionResult>,
    pub size: Option<Size>,
    /// 0 for the root menu.
    pub depth: usize,
    pub entries: Vec<EntryView<'a>>,
}

impl LevelView<'_> {
    /// Surface bounds, once positioned.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        Some(self.position?.rect(self.size?))
    }

    /// Natural size of this level in cells: one row per entry, wide enough
    /// for the longest label plus an indicator gutter and a submenu arrow.
    ///
    /// Terminal hosts can report this directly as the measured size.
    #[must_use]
    pub fn intrinsic_size(&self) -> Size {
        const GUTTER: usize = 2;
        const ARROW: usize = 2;
        let label = self
            .entries
            .iter()
            .map(|e| e.label.width())
            .max()
            .unwrap_or(0);
        let width = GUTTER + label + ARROW;
        Size::new(
            u16::try_from(width).unwrap_or(u16::MAX),
            u16::try_from(self.entries.len()).unwrap_or(u16::MAX),
        )
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<&EntryView<'_>> {
        self.entries.iter().find(|e| e.highlighted)
    }
}

/// Snapshot of the whole open menu tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuView<'a> {
    /// Open levels from the root outwards.
    pub levels: Vec<LevelView<'a>>,
}

impl<'a> MenuView<'a> {
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.levels.is_empty()
    }

    #[must_use]
    pub fn level(&self, id: LevelId) -> Option<&LevelView<'a>> {
        self.levels.iter().find(|l| l.id == id)
    }

    /// The innermost open level.
    #[must_use]
    pub fn deepest(&self) -> Option<&LevelView<'a>> {
        self.levels.last()
    }
}
