#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! Hosts translate whatever their platform delivers (terminal escape
//! sequences, window-system callbacks, DOM events) into these types before
//! handing them to a menu controller.
//!
//! # Design Notes
//!
//! - Mouse coordinates are 0-indexed in viewport space
//! - `KeyEventKind` defaults to `Press` when the platform cannot distinguish
//! - `Modifiers` use bitflags for easy combination

use bitflags::bitflags;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A mouse event.
    Mouse(MouseEvent),

    /// The viewport was resized.
    Resize {
        /// New viewport width.
        width: u16,
        /// New viewport height.
        height: u16,
    },

    /// Host window focus gained (`true`) or lost (`false`).
    Focus(bool),
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Press or auto-repeat; releases are ignored by navigation.
    #[must_use]
    pub const fn is_press(&self) -> bool {
        matches!(self.kind, KeyEventKind::Press | KeyEventKind::Repeat)
    }

    /// The printable character carried by this key, if any.
    ///
    /// Keys chorded with Ctrl, Alt or Super are shortcuts, not text, and
    /// return `None`. Shift is allowed.
    #[must_use]
    pub fn printable_char(&self) -> Option<char> {
        if self
            .modifiers
            .intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::SUPER)
        {
            return None;
        }
        match self.code {
            KeyCode::Char(c) if !c.is_control() => Some(c),
            _ => None,
        }
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key. Space arrives as `Char(' ')`.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Escape key.
    Escape,
    /// Backspace key.
    Backspace,
    /// Tab key.
    Tab,
    /// Shift+Tab (back-tab).
    BackTab,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page Up key.
    PageUp,
    /// Page Down key.
    PageDown,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// The type of mouse event.
    pub kind: MouseEventKind,

    /// X coordinate (0-indexed).
    pub x: u16,

    /// Y coordinate (0-indexed).
    pub y: u16,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a new mouse event.
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Get the position as a tuple.
    #[must_use]
    pub const fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }
}

/// The type of mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Mouse button pressed down.
    Down(MouseButton),

    /// Mouse button released.
    Up(MouseButton),

    /// Mouse dragged while button held.
    Drag(MouseButton),

    /// Mouse moved (no button pressed).
    Moved,
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button.
    Left,

    /// Right mouse button.
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_is_char() {
        let event = KeyEvent::new(KeyCode::Char('q'));
        assert!(event.is_char('q'));
        assert!(!event.is_char('x'));
    }

    #[test]
    fn printable_char_rejects_shortcuts() {
        assert_eq!(KeyEvent::new(KeyCode::Char('s')).printable_char(), Some('s'));
        assert_eq!(
            KeyEvent::new(KeyCode::Char('S'))
                .with_modifiers(Modifiers::SHIFT)
                .printable_char(),
            Some('S')
        );
        assert_eq!(
            KeyEvent::new(KeyCode::Char('s'))
                .with_modifiers(Modifiers::CTRL)
                .printable_char(),
            None
        );
        assert_eq!(KeyEvent::new(KeyCode::Enter).printable_char(), None);
        assert_eq!(KeyEvent::new(KeyCode::Char('\u{7}')).printable_char(), None);
    }

    #[test]
    fn release_is_not_press() {
        let press = KeyEvent::new(KeyCode::Down);
        assert!(press.is_press());
        assert!(press.with_kind(KeyEventKind::Repeat).is_press());
        assert!(!press.with_kind(KeyEventKind::Release).is_press());
    }

    #[test]
    fn mouse_event_position() {
        let event = MouseEvent::new(MouseEventKind::Down(MouseButton::Left), 10, 20);
        assert_eq!(event.position(), (10, 20));
    }

    #[test]
    fn modifiers_default() {
        assert_eq!(Modifiers::default(), Modifiers::NONE);
    }
}
