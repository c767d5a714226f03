#![forbid(unsafe_code)]

//! Virtual focus and the menu focus trap.
//!
//! Platform focus stays wherever the host put it (usually the trigger).
//! While a menu is open the coordinator holds the single *focus target*: the
//! highlighted node of the active level. Engaging the trap records where
//! focus came from so it can be handed back on full close.

use crate::tree::NodeId;

/// Where platform focus was when the trap engaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FocusOrigin {
    /// The menu's own trigger.
    #[default]
    Trigger,
    /// Some other host element, identified by the host.
    Element(u64),
}

/// Focus change events emitted by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    FocusGained { id: NodeId },
    FocusLost { id: NodeId },
    FocusMoved { from: NodeId, to: NodeId },
}

/// Active focus trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTrap {
    pub return_focus: FocusOrigin,
}

/// Holds the focus target and the trap of an open menu.
#[derive(Debug, Default)]
pub struct FocusCoordinator {
    current: Option<NodeId>,
    trap: Option<FocusTrap>,
    last_event: Option<FocusEvent>,
}

impl FocusCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current focus target.
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    #[must_use]
    pub fn is_focused(&self, id: NodeId) -> bool {
        self.current == Some(id)
    }

    /// Engage the trap, remembering `origin`. A trap that is already engaged
    /// keeps its original return target.
    pub fn push_trap(&mut self, origin: FocusOrigin) {
        if self.trap.is_none() {
            self.trap = Some(FocusTrap {
                return_focus: origin,
            });
        }
    }

    /// Release the trap and clear the target. Returns the recorded origin.
    pub fn pop_trap(&mut self) -> Option<FocusOrigin> {
        let trap = self.trap.take()?;
        self.blur();
        Some(trap.return_focus)
    }

    #[must_use]
    pub fn is_trapped(&self) -> bool {
        self.trap.is_some()
    }

    /// Move the target to `id`. Returns the previous target.
    pub fn focus(&mut self, id: NodeId) -> Option<NodeId> {
        let prev = self.current;
        if prev == Some(id) {
            return prev;
        }
        self.current = Some(id);
        self.last_event = Some(match prev {
            Some(from) => FocusEvent::FocusMoved { from, to: id },
            None => FocusEvent::FocusGained { id },
        });
        prev
    }

    /// Clear the target. Returns the previous target.
    pub fn blur(&mut self) -> Option<NodeId> {
        let prev = self.current.take();
        if let Some(id) = prev {
            self.last_event = Some(FocusEvent::FocusLost { id });
        }
        prev
    }

    /// Set or clear the target in one call.
    pub fn set(&mut self, id: Option<NodeId>) {
        match id {
            Some(id) => {
                self.focus(id);
            }
            None => {
                self.blur();
            }
        }
    }

    /// Get the last focus event.
    #[must_use]
    pub fn focus_event(&self) -> Option<&FocusEvent> {
        self.last_event.as_ref()
    }

    /// Take and clear the last focus event.
    pub fn take_focus_event(&mut self) -> Option<FocusEvent> {
        self.last_event.take()
    }
}
