#![forbid(unsafe_code)]

//! Portal boundary: where floating surfaces are mounted.
//!
//! The controller never assumes a surface lives anywhere in particular. It
//! hands each opened level to a [`Portal`] together with its stacking
//! context and takes it back on close. Mount and unmount are always paired,
//! and a child is always unmounted before its parent.

use std::fmt;

use crate::tree::LevelId;

/// Handle of one mounted floating surface.
///
/// Handles are never reused within one controller, so a late size report for
/// a closed surface can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Stacking information for a mounted surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackingContext {
    /// Nesting depth: 0 for the root menu, 1 for its submenus, ...
    pub depth: usize,
    /// Surface this one must stack above.
    pub parent: Option<SurfaceId>,
}

/// Receives mount/unmount requests from the controller.
pub trait Portal {
    fn mount(&mut self, surface: SurfaceId, level: LevelId, stacking: StackingContext);
    fn unmount(&mut self, surface: SurfaceId);
}

/// A portal that discards every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPortal;

impl Portal for NullPortal {
    fn mount(&mut self, _surface: SurfaceId, _level: LevelId, _stacking: StackingContext) {}
    fn unmount(&mut self, _surface: SurfaceId) {}
}

/// One recorded portal call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalOp {
    Mount {
        surface: SurfaceId,
        level: LevelId,
        stacking: StackingContext,
    },
    Unmount {
        surface: SurfaceId,
    },
}

/// A portal that records every call and tracks what is mounted.
///
/// Useful for hosts that apply mounts in a batch after each event, and for
/// tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingPortal {
    ops: Vec<PortalOp>,
    mounted: Vec<(SurfaceId, LevelId)>,
}

impl RecordingPortal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls so far, in order.
    #[must_use]
    pub fn ops(&self) -> &[PortalOp] {
        &self.ops
    }

    /// Take the recorded calls, leaving the mounted set intact.
    pub fn drain_ops(&mut self) -> Vec<PortalOp> {
        std::mem::take(&mut self.ops)
    }

    /// Currently mounted surfaces in mount order.
    #[must_use]
    pub fn mounted(&self) -> &[(SurfaceId, LevelId)] {
        &self.mounted
    }

    #[must_use]
    pub fn is_mounted(&self, surface: SurfaceId) -> bool {
        self.mounted.iter().any(|(s, _)| *s == surface)
    }
}

impl Portal for RecordingPortal {
    fn mount(&mut self, surface: SurfaceId, level: LevelId, stacking: StackingContext) {
        self.ops.push(PortalOp::Mount {
            surface,
            level,
            stacking,
        });
        self.mounted.push((surface, level));
    }

    fn unmount(&mut self, surface: SurfaceId) {
        self.ops.push(PortalOp::Unmount { surface });
        self.mounted.retain(|(s, _)| *s != surface);
    }
}

impl<P: Portal + ?Sized> Portal for &mut P {
    fn mount(&mut self, surface: SurfaceId, level: LevelId, stacking: StackingContext) {
        (**self).mount(surface, level, stacking);
    }

    fn unmount(&mut self, surface: SurfaceId) {
        (**self).unmount(surface);
    }
}

impl<P: Portal + ?Sized> Portal for Box<P> {
    fn mount(&mut self, surface: SurfaceId, level: LevelId, stacking: StackingContext) {
        (**self).mount(surface, level, stacking);
    }

    fn unmount(&mut self, surface: SurfaceId) {
        (**self).unmount(surface);
    }
}
