#![forbid(unsafe_code)]

//! Hierarchical floating menu engine.
//!
//! The engine behind a "trigger + floating content + nested submenus +
//! checkbox/radio items" dropdown menu, independent of how it is drawn:
//!
//! - [`tree`]: the declared menu content, validated once at construction.
//! - [`controller`]: the state machine that opens, closes, navigates and
//!   activates.
//! - [`placement`]: anchored, collision-aware positioning.
//! - [`focus`]: virtual focus and the focus trap.
//! - [`selection`]: checkbox and radio state.
//! - [`typeahead`] and [`timer`]: type-ahead search and the deadline queue
//!   behind hover-open and type-ahead reset.
//! - [`portal`] and [`render`]: the boundaries towards whatever mounts and
//!   draws the surfaces.
//!
//! # Feature Flags
//!
//! - `config`: load [`MenuConfig`](config::MenuConfig) from TOML or JSON.
//! - `tracing`: structured `tracing` events for opens, closes, activations,
//!   placement flips and ignored input.

pub mod config;
pub mod controller;
pub mod error;
pub mod focus;
pub mod placement;
pub mod portal;
pub mod render;
pub mod selection;
pub mod timer;
pub mod tree;
pub mod typeahead;

pub use config::{Direction, MenuConfig};
pub use controller::{
    EventResult, InitialHighlight, LevelPhase, MenuController, MenuEvent, MenuLevel,
};
pub use error::{ConfigError, TreeError};
pub use flyout_core::{Point, Rect, Sides, Size};
pub use tree::{LevelId, MenuTree, NodeDecl, NodeId, NodeKind, RadioGroupId};
pub use web_time::{Duration, Instant};

/// Everything a host needs to drive a menu.
pub mod prelude {
    pub use crate::config::{Direction, MenuConfig};
    pub use crate::controller::{
        EventResult, InitialHighlight, LevelPhase, MenuController, MenuEvent,
    };
    pub use crate::focus::FocusOrigin;
    pub use crate::placement::{Align, Placement, PositionResult, Side};
    pub use crate::portal::{Portal, RecordingPortal, StackingContext, SurfaceId};
    pub use crate::render::{EntryView, Indicator, LevelView, MenuView};
    pub use crate::tree::{LevelId, MenuTree, NodeDecl, NodeId, NodeKind, RadioGroupId};
    pub use flyout_core::event::{
        Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent,
        MouseEventKind,
    };
    pub use flyout_core::{Rect, Size};
    pub use web_time::{Duration, Instant};
}
