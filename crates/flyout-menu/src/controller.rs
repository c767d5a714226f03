#![forbid(unsafe_code)]

//! The interaction controller.
//!
//! [`MenuController`] owns every piece of mutable menu state: which levels
//! are open, what each highlights, checkbox/radio state, the focus trap and
//! the pending timers. Hosts feed it input and drain [`MenuEvent`]s.
//!
//! # Open levels
//!
//! Sibling submenus are mutually exclusive, so the open levels always form a
//! single path from the root. The controller keeps them as that path:
//! opening a submenu truncates the path after its parent, and closing a level
//! truncates at that level, which closes all of its descendants and nothing
//! else.
//!
//! # Level lifecycle
//!
//! ```text
//! Closed ──open──▶ Opening ──positioned──▶ Open ──close──▶ Closing ──▶ Closed
//! ```
//!
//! A level is `Opening` from mount until its surface has a size (reported
//! through [`report_surface_size`](MenuController::report_surface_size), or
//! cached from an earlier opening of the same level) and a position. It is
//! `Closing` only while its surface is being unmounted.
//!
//! # Time
//!
//! Nothing here reads a clock. Every handler that can be affected by time
//! takes `now`, fires whatever timers are due first, and then handles its
//! input. Hosts that want timers to fire without input call
//! [`tick`](MenuController::tick) at [`next_deadline`](MenuController::next_deadline).
//!
//! # Keyboard vs. hover
//!
//! A key press cancels every pending hover-open timer, so a submenu the
//! pointer was about to open never opens underneath a keyboard interaction.

use ahash::AHashMap;
use flyout_core::event::{Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use flyout_core::{Rect, Size};
use web_time::Instant;

use crate::config::{Direction, MenuConfig};
use crate::focus::{FocusCoordinator, FocusEvent, FocusOrigin};
use crate::placement::{self, PositionResult};
use crate::portal::{NullPortal, Portal, StackingContext, SurfaceId};
use crate::render::{EntryView, Indicator, LevelView, MenuView};
use crate::selection::SelectionStore;
use crate::timer::TimerQueue;
use crate::tree::{LevelId, MenuNode, MenuTree, NodeId, NodeKind, RadioGroupId};
use crate::typeahead::{self, TypeAhead};

/// Phase of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelPhase {
    /// Mounted, waiting for a size and position.
    Opening,
    /// Positioned and interactive.
    Open,
    /// Being unmounted.
    Closing,
}

/// Which item to highlight when a level opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialHighlight {
    #[default]
    First,
    Last,
    None,
}

/// Whether the controller acted on an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Consumed,
    Ignored,
}

impl EventResult {
    #[must_use]
    pub const fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed)
    }

    fn from_bool(acted: bool) -> Self {
        if acted { Self::Consumed } else { Self::Ignored }
    }
}

/// Notifications for the host, drained with
/// [`drain_events`](MenuController::drain_events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEvent {
    /// The root menu opened or the whole tree closed.
    OpenChange { open: bool },
    /// A level finished opening: it has a position and is interactive.
    LevelOpened { level: LevelId, surface: SurfaceId },
    /// A level was unmounted.
    LevelClosed { level: LevelId, surface: SurfaceId },
    HighlightChange { level: LevelId, node: Option<NodeId> },
    /// A plain item was activated.
    Selected { node: NodeId },
    CheckedChange { node: NodeId, checked: bool },
    RadioChange { group: RadioGroupId, node: NodeId },
    /// The tree closed and platform focus should go back to `origin`.
    RestoreFocus { origin: FocusOrigin },
}

/// Scheduled work owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTimer {
    /// Open the submenu of `trigger`, which lives in `level`.
    HoverOpen { level: LevelId, trigger: NodeId },
    /// Clear the type-ahead buffer.
    TypeaheadReset,
}

/// One open level.
#[derive(Debug, Clone)]
pub struct MenuLevel {
    id: LevelId,
    phase: LevelPhase,
    highlighted: Option<NodeId>,
    surface: SurfaceId,
    size: Option<Size>,
    position: Option<PositionResult>,
    item_bounds: Vec<(NodeId, Rect)>,
}

impl MenuLevel {
    #[must_use]
    pub fn id(&self) -> LevelId {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlighted
    }

    #[must_use]
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    #[must_use]
    pub fn size(&self) -> Option<Size> {
        self.size
    }

    #[must_use]
    pub fn position(&self) -> Option<PositionResult> {
        self.position
    }

    /// Surface bounds, once positioned.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        Some(self.position?.rect(self.size?))
    }

    fn item_at(&self, x: u16, y: u16) -> Option<NodeId> {
        self.item_bounds
            .iter()
            .find(|(_, r)| r.contains(x, y))
            .map(|(id, _)| *id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nav {
    Next,
    Prev,
    First,
    Last,
}

/// The hierarchical menu state machine.
///
/// ```
/// use flyout_menu::prelude::*;
///
/// let tree = MenuTree::build(vec![
///     NodeDecl::item(1, "New"),
///     NodeDecl::item(2, "Open"),
/// ])
/// .unwrap();
/// let mut menu = MenuController::new(tree, MenuConfig::default());
/// menu.set_viewport(Rect::from_size(80, 24));
/// menu.set_trigger_bounds(Rect::new(0, 0, 6, 1));
/// menu.set_trigger_focused(true);
///
/// let now = Instant::now();
/// menu.handle_key(&KeyEvent::new(KeyCode::Enter), now);
/// assert_eq!(menu.highlighted(LevelId::Root), Some(NodeId::new(1)));
///
/// let surface = menu.level(LevelId::Root).unwrap().surface();
/// menu.report_surface_size(surface, Size::new(10, 2));
/// assert_eq!(menu.level(LevelId::Root).unwrap().phase(), LevelPhase::Open);
///
/// menu.handle_key(&KeyEvent::new(KeyCode::Down), now);
/// menu.handle_key(&KeyEvent::new(KeyCode::Enter), now);
/// assert!(!menu.is_open());
/// assert!(menu
///     .drain_events()
///     .contains(&MenuEvent::Selected { node: NodeId::new(2) }));
/// ```
#[derive(Debug)]
pub struct MenuController<P: Portal = NullPortal> {
    tree: MenuTree,
    config: MenuConfig,
    selection: SelectionStore,
    focus: FocusCoordinator,
    typeahead: TypeAhead,
    timers: TimerQueue<MenuTimer>,
    portal: P,
    open: Vec<MenuLevel>,
    /// Index into `open` of the level that receives keyboard input.
    active: usize,
    viewport: Rect,
    trigger_bounds: Rect,
    trigger_focused: bool,
    size_cache: AHashMap<LevelId, Size>,
    next_surface: u64,
    hovered: Option<NodeId>,
    events: Vec<MenuEvent>,
}

impl MenuController<NullPortal> {
    /// Create a controller whose surfaces are not mounted anywhere.
    #[must_use]
    pub fn new(tree: MenuTree, config: MenuConfig) -> Self {
        Self::with_portal(tree, config, NullPortal)
    }
}

impl<P: Portal> MenuController<P> {
    /// Create a controller that mounts surfaces through `portal`.
    pub fn with_portal(tree: MenuTree, config: MenuConfig, portal: P) -> Self {
        let selection = SelectionStore::from_tree(&tree);
        let typeahead = TypeAhead::new(config.typeahead_timeout());
        Self {
            tree,
            config,
            selection,
            focus: FocusCoordinator::new(),
            typeahead,
            timers: TimerQueue::new(),
            portal,
            open: Vec::new(),
            active: 0,
            viewport: Rect::default(),
            trigger_bounds: Rect::default(),
            trigger_focused: false,
            size_cache: AHashMap::new(),
            next_surface: 0,
            hovered: None,
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    #[must_use]
    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    #[must_use]
    pub fn portal(&self) -> &P {
        &self.portal
    }

    pub fn portal_mut(&mut self) -> &mut P {
        &mut self.portal
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.open.is_empty()
    }

    /// Open levels from the root outwards.
    #[must_use]
    pub fn open_levels(&self) -> &[MenuLevel] {
        &self.open
    }

    #[must_use]
    pub fn level(&self, id: LevelId) -> Option<&MenuLevel> {
        self.open.iter().find(|l| l.id == id)
    }

    #[must_use]
    pub fn is_level_open(&self, id: LevelId) -> bool {
        self.level_index(id).is_some()
    }

    #[must_use]
    pub fn highlighted(&self, id: LevelId) -> Option<NodeId> {
        self.level(id).and_then(MenuLevel::highlighted)
    }

    /// The node holding virtual focus.
    #[must_use]
    pub fn focus_target(&self) -> Option<NodeId> {
        self.focus.current()
    }

    /// The open level keyboard input is routed to: the one holding the
    /// focus target, else the deepest.
    #[must_use]
    pub fn active_level(&self) -> Option<LevelId> {
        self.active_index().map(|idx| self.open[idx].id)
    }

    /// Take the last focus change recorded by the focus coordinator.
    pub fn take_focus_event(&mut self) -> Option<FocusEvent> {
        self.focus.take_focus_event()
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Take all pending notifications.
    pub fn drain_events(&mut self) -> Vec<MenuEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Boundary inputs
    // ------------------------------------------------------------------

    /// Set the viewport and reposition every open level.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.reposition_from(0);
    }

    /// Set the root trigger's bounds and reposition every open level.
    pub fn set_trigger_bounds(&mut self, bounds: Rect) {
        self.trigger_bounds = bounds;
        self.reposition_from(0);
    }

    /// Whether platform focus is on the root trigger. Keyboard opening only
    /// happens while it is.
    pub fn set_trigger_focused(&mut self, focused: bool) {
        self.trigger_focused = focused;
    }

    /// Record the measured size of a surface. Returns `false` for surfaces
    /// that are no longer mounted.
    pub fn report_surface_size(&mut self, surface: SurfaceId, size: Size) -> bool {
        let Some(idx) = self.surface_index(surface) else {
            return false;
        };
        let level = &mut self.open[idx];
        level.size = Some(size);
        self.size_cache.insert(level.id, size);
        self.reposition_from(idx);
        true
    }

    /// Record where each item of a surface was drawn. Used for pointer hit
    /// testing and as the anchor of submenus.
    pub fn report_item_bounds(&mut self, surface: SurfaceId, bounds: &[(NodeId, Rect)]) -> bool {
        let Some(idx) = self.surface_index(surface) else {
            return false;
        };
        self.open[idx].item_bounds = bounds.to_vec();
        self.reposition_from(idx + 1);
        true
    }

    /// Snapshot of every open level for a renderer.
    #[must_use]
    pub fn render_state(&self) -> MenuView<'_> {
        let levels = self
            .open
            .iter()
            .enumerate()
            .map(|(depth, level)| LevelView {
                id: level.id,
                surface: level.surface,
                phase: level.phase,
                position: level.position,
                size: level.size,
                depth,
                entries: self
                    .tree
                    .level_entries(level.id)
                    .map(|node| self.entry_view(level, node))
                    .collect(),
            })
            .collect();
        MenuView { levels }
    }

    fn entry_view<'a>(&self, level: &MenuLevel, node: &'a MenuNode) -> EntryView<'a> {
        let id = node.id();
        let indicator = match node.kind() {
            NodeKind::CheckboxItem => Indicator::Checkbox(self.selection.is_checked(id)),
            NodeKind::RadioItem => Indicator::Radio(self.selection.is_radio_selected(id)),
            _ => Indicator::None,
        };
        EntryView {
            id,
            kind: node.kind(),
            label: node.label(),
            disabled: node.is_disabled(),
            highlighted: level.highlighted == Some(id),
            indicator,
            submenu_open: node.kind() == NodeKind::SubmenuTrigger
                && self.is_level_open(LevelId::Submenu(id)),
        }
    }

    // ------------------------------------------------------------------
    // Programmatic control
    // ------------------------------------------------------------------

    /// Open the root menu from the trigger, highlighting the first item.
    pub fn open(&mut self) -> bool {
        self.open_with(FocusOrigin::Trigger, InitialHighlight::First)
    }

    /// Open the root menu, recording where focus should return on close.
    pub fn open_with(&mut self, origin: FocusOrigin, initial: InitialHighlight) -> bool {
        if self.is_open() {
            return false;
        }
        self.focus.push_trap(origin);
        self.typeahead.reset();
        self.events.push(MenuEvent::OpenChange { open: true });
        self.push_level(LevelId::Root, initial);
        true
    }

    /// Close the whole tree and restore focus to where it came from.
    pub fn close(&mut self) -> bool {
        self.close_all(true)
    }

    /// Controlled open state.
    pub fn set_open(&mut self, open: bool) -> bool {
        if open { self.open() } else { self.close() }
    }

    /// Open the submenu of `trigger`, closing any open sibling submenu.
    ///
    /// The trigger's level must be open and the trigger enabled.
    pub fn open_submenu(&mut self, trigger: NodeId) -> bool {
        self.open_submenu_with(trigger, InitialHighlight::First)
    }

    /// Close `level` and everything nested beneath it. Closing the root
    /// closes the tree. Highlight returns to the level's trigger.
    pub fn close_level(&mut self, level: LevelId) -> bool {
        let Some(idx) = self.level_index(level) else {
            return false;
        };
        if idx == 0 {
            return self.close_all(true);
        }
        self.truncate_levels(idx);
        self.typeahead.reset();
        if let LevelId::Submenu(trigger) = level {
            self.set_highlight(idx - 1, Some(trigger));
        }
        true
    }

    /// Highlight `node`. Its level must be open and the node navigable.
    /// Submenus opened below the node's level are closed, unless they belong
    /// to `node` itself.
    pub fn highlight(&mut self, node: NodeId) -> bool {
        let Some(idx) = self.navigable_in_open_level(node) else {
            return false;
        };
        self.close_children_except(idx, node);
        self.set_highlight(idx, Some(node));
        true
    }

    /// Activate the highlighted node of the active level.
    pub fn activate(&mut self) -> EventResult {
        let Some(idx) = self.active_index() else {
            return EventResult::Ignored;
        };
        match self.open[idx].highlighted {
            Some(node) => self.activate_node(node),
            None => EventResult::Ignored,
        }
    }

    /// Activate `node` as if it were clicked or chosen with Enter.
    pub fn activate_node(&mut self, node: NodeId) -> EventResult {
        let Some(idx) = self.navigable_in_open_level(node) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(message = "menu.ignored", reason = "activate", node = node.get());
            return EventResult::Ignored;
        };
        let Some(menu_node) = self.tree.get(node) else {
            return EventResult::Ignored;
        };
        let kind = menu_node.kind();
        let close = menu_node
            .close_on_select()
            .unwrap_or(self.config.close_on_select);

        #[cfg(feature = "tracing")]
        tracing::debug!(message = "menu.activate", node = node.get(), kind = ?kind);

        match kind {
            NodeKind::SubmenuTrigger => {
                return EventResult::from_bool(self.open_submenu(node));
            }
            NodeKind::Item => self.events.push(MenuEvent::Selected { node }),
            NodeKind::CheckboxItem => {
                if let Some(checked) = self.selection.toggle_checked(node) {
                    self.events.push(MenuEvent::CheckedChange { node, checked });
                }
            }
            NodeKind::RadioItem => {
                if let Some(group) = self.selection.radio_group_of(node).cloned()
                    && self.selection.select_radio(&group, node)
                {
                    self.events.push(MenuEvent::RadioChange { group, node });
                }
            }
            NodeKind::Label | NodeKind::Separator | NodeKind::Group => {
                return EventResult::Ignored;
            }
        }

        if close {
            self.close_all(true);
        } else {
            self.close_children_except(idx, node);
            self.set_highlight(idx, Some(node));
        }
        EventResult::Consumed
    }

    /// Set a checkbox from outside. Emits `CheckedChange` when it changes.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> bool {
        let changed = self.selection.set_checked(node, checked);
        if changed {
            self.events.push(MenuEvent::CheckedChange { node, checked });
        }
        changed
    }

    /// Select a radio item from outside. Emits `RadioChange` when it changes.
    pub fn select_radio(&mut self, group: &RadioGroupId, node: NodeId) -> bool {
        let changed = self.selection.select_radio(group, node);
        if changed {
            self.events.push(MenuEvent::RadioChange {
                group: group.clone(),
                node,
            });
        }
        changed
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Route a canonical event.
    pub fn handle_event(&mut self, event: &Event, now: Instant) -> EventResult {
        match event {
            Event::Key(key) => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Resize { width, height } => {
                self.fire_due(now);
                self.set_viewport(Rect::from_size(*width, *height));
                EventResult::from_bool(self.is_open())
            }
            Event::Focus(false) => {
                self.fire_due(now);
                EventResult::from_bool(self.close_all(false))
            }
            Event::Focus(true) => {
                self.fire_due(now);
                EventResult::Ignored
            }
        }
    }

    /// Fire due timers without other input.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.fire_due(now)
    }

    /// Keyboard input.
    pub fn handle_key(&mut self, key: &KeyEvent, now: Instant) -> EventResult {
        // A key press supersedes pending hover intent, even one due this tick.
        if key.is_press() {
            self.cancel_hover_timers();
        }
        self.fire_due(now);
        if !key.is_press() {
            return EventResult::Ignored;
        }

        let Some(idx) = self.active_index() else {
            return self.handle_closed_key(key);
        };

        let searching = self.typeahead.is_active();
        if let Some(c) = key.printable_char()
            && (c != ' ' || searching)
        {
            self.typeahead_in(idx, c, now);
            return EventResult::Consumed;
        }

        let (forward, back) = match self.config.direction {
            Direction::Ltr => (KeyCode::Right, KeyCode::Left),
            Direction::Rtl => (KeyCode::Left, KeyCode::Right),
        };

        match key.code {
            KeyCode::Down => self.navigate(idx, Nav::Next),
            KeyCode::Up => self.navigate(idx, Nav::Prev),
            KeyCode::Home | KeyCode::PageUp => self.navigate(idx, Nav::First),
            KeyCode::End | KeyCode::PageDown => self.navigate(idx, Nav::Last),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let result = self.activate();
                if result.is_consumed() || !self.config.modal {
                    result
                } else {
                    EventResult::Consumed
                }
            }
            code if code == forward => {
                if let Some(node) = self.open[idx].highlighted
                    && self.tree.get(node).map(MenuNode::kind) == Some(NodeKind::SubmenuTrigger)
                {
                    self.open_submenu(node);
                }
                EventResult::Consumed
            }
            code if code == back => {
                if idx > 0 {
                    self.close_level(self.open[idx].id);
                }
                EventResult::Consumed
            }
            KeyCode::Escape => {
                let deepest = self.open.len() - 1;
                self.close_level(self.open[deepest].id);
                EventResult::Consumed
            }
            KeyCode::Tab | KeyCode::BackTab => {
                if self.config.modal {
                    EventResult::Consumed
                } else {
                    self.close_all(false);
                    EventResult::Ignored
                }
            }
            _ => EventResult::Consumed,
        }
    }

    fn handle_closed_key(&mut self, key: &KeyEvent) -> EventResult {
        if !self.trigger_focused {
            return EventResult::Ignored;
        }
        let initial = match key.code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Down => InitialHighlight::First,
            KeyCode::Up => InitialHighlight::Last,
            _ => return EventResult::Ignored,
        };
        EventResult::from_bool(self.open_with(FocusOrigin::Trigger, initial))
    }

    /// Raw pointer input, hit-tested against reported surface and item
    /// bounds.
    pub fn handle_mouse(&mut self, mouse: &MouseEvent, now: Instant) -> EventResult {
        let (x, y) = mouse.position();
        let hit = self.hit_test(x, y);
        match mouse.kind {
            MouseEventKind::Down(button) => {
                if hit.is_some() {
                    self.fire_due(now);
                    EventResult::Consumed
                } else if self.trigger_bounds.contains(x, y) {
                    if button == MouseButton::Left {
                        self.click_trigger(now)
                    } else {
                        self.fire_due(now);
                        EventResult::Ignored
                    }
                } else {
                    self.pointer_down_outside(now)
                }
            }
            MouseEventKind::Up(MouseButton::Left) => match hit {
                Some((_, Some(node))) => self.click_node(node, now),
                Some((_, None)) => {
                    self.fire_due(now);
                    EventResult::Consumed
                }
                None => {
                    self.fire_due(now);
                    EventResult::Ignored
                }
            },
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                let over = hit.and_then(|(_, node)| node);
                if over == self.hovered {
                    self.fire_due(now);
                    return EventResult::from_bool(hit.is_some());
                }
                if let Some(prev) = self.hovered {
                    self.pointer_leave(prev, now);
                }
                if let Some(node) = over {
                    self.pointer_enter(node, now);
                } else {
                    self.fire_due(now);
                }
                EventResult::from_bool(hit.is_some())
            }
            _ => {
                self.fire_due(now);
                EventResult::from_bool(hit.is_some())
            }
        }
    }

    /// The pointer entered `node`.
    pub fn pointer_enter(&mut self, node: NodeId, now: Instant) -> EventResult {
        self.fire_due(now);
        self.hovered = Some(node);
        let Some(idx) = self.navigable_in_open_level(node) else {
            return EventResult::Ignored;
        };
        let level = self.open[idx].id;
        self.timers.cancel_matching(
            |t| matches!(t, MenuTimer::HoverOpen { trigger, .. } if *trigger != node),
        );
        self.close_children_except(idx, node);
        self.set_highlight(idx, Some(node));

        let is_trigger =
            self.tree.get(node).map(MenuNode::kind) == Some(NodeKind::SubmenuTrigger);
        let pending = self
            .timers
            .any(|t| matches!(t, MenuTimer::HoverOpen { trigger, .. } if *trigger == node));
        if is_trigger && !pending && !self.is_level_open(LevelId::Submenu(node)) {
            let delay = self.config.hover_open_delay();
            if delay.is_zero() {
                self.open_submenu(node);
            } else {
                self.timers.schedule(
                    now + delay,
                    MenuTimer::HoverOpen {
                        level,
                        trigger: node,
                    },
                );
            }
        }
        EventResult::Consumed
    }

    /// The pointer left `node`. Cancels its pending hover-open.
    pub fn pointer_leave(&mut self, node: NodeId, now: Instant) -> EventResult {
        self.fire_due(now);
        if self.hovered == Some(node) {
            self.hovered = None;
        }
        let cancelled = self
            .timers
            .cancel_matching(|t| matches!(t, MenuTimer::HoverOpen { trigger, .. } if *trigger == node));
        EventResult::from_bool(cancelled > 0)
    }

    /// `node` was clicked.
    pub fn click_node(&mut self, node: NodeId, now: Instant) -> EventResult {
        self.fire_due(now);
        self.cancel_hover_timers();
        self.activate_node(node)
    }

    /// The root trigger was clicked: toggle.
    pub fn click_trigger(&mut self, now: Instant) -> EventResult {
        self.fire_due(now);
        let acted = if self.is_open() {
            self.close_all(true)
        } else {
            self.open_with(FocusOrigin::Trigger, InitialHighlight::First)
        };
        EventResult::from_bool(acted)
    }

    /// A pointer went down outside every open surface and the trigger.
    pub fn pointer_down_outside(&mut self, now: Instant) -> EventResult {
        self.fire_due(now);
        let restore = self.config.modal;
        EventResult::from_bool(self.close_all(restore))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn fire_due(&mut self, now: Instant) -> bool {
        let mut fired = false;
        while let Some(timer) = self.timers.pop_due(now) {
            fired = true;
            match timer {
                MenuTimer::HoverOpen { level, trigger } => {
                    if self.is_level_open(level) && self.hovered == Some(trigger) {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(message = "menu.hover_open", trigger = trigger.get());
                        self.open_submenu(trigger);
                    }
                }
                MenuTimer::TypeaheadReset => {
                    self.typeahead.expire(now);
                }
            }
        }
        fired
    }

    fn cancel_hover_timers(&mut self) {
        self.timers
            .cancel_matching(|t| matches!(t, MenuTimer::HoverOpen { .. }));
    }

    fn level_index(&self, id: LevelId) -> Option<usize> {
        self.open.iter().position(|l| l.id == id)
    }

    fn surface_index(&self, surface: SurfaceId) -> Option<usize> {
        self.open.iter().position(|l| l.surface == surface)
    }

    fn active_index(&self) -> Option<usize> {
        let deepest = self.open.len().checked_sub(1)?;
        Some(self.active.min(deepest))
    }

    /// Index of the open level holding `node`, if `node` can be navigated to.
    fn navigable_in_open_level(&self, node: NodeId) -> Option<usize> {
        let menu_node = self.tree.get(node)?;
        if !menu_node.is_navigable() {
            return None;
        }
        self.level_index(self.tree.level_of(node)?)
    }

    fn set_highlight(&mut self, idx: usize, node: Option<NodeId>) {
        let level = &mut self.open[idx];
        if level.highlighted != node {
            level.highlighted = node;
            self.events.push(MenuEvent::HighlightChange {
                level: level.id,
                node,
            });
        }
        if node.is_some() {
            self.active = idx;
            self.focus.set(node);
        }
    }

    /// Close levels nested below `idx`, keeping the submenu of `keep` open.
    fn close_children_except(&mut self, idx: usize, keep: NodeId) {
        let child = idx + 1;
        if child < self.open.len() && self.open[child].id != LevelId::Submenu(keep) {
            self.truncate_levels(child);
        }
    }

    fn open_submenu_with(&mut self, trigger: NodeId, initial: InitialHighlight) -> bool {
        let Some(idx) = self.navigable_in_open_level(trigger) else {
            return false;
        };
        if self.tree.get(trigger).map(MenuNode::kind) != Some(NodeKind::SubmenuTrigger) {
            return false;
        }
        let level = LevelId::Submenu(trigger);
        self.cancel_hover_timers();
        self.set_highlight(idx, Some(trigger));

        if self.open.get(idx + 1).map(|l| l.id) == Some(level) {
            // Already open: move into it.
            self.truncate_levels(idx + 2);
            self.active = idx + 1;
            let first = self.pick(level, initial);
            if first.is_some() {
                self.set_highlight(idx + 1, first);
            }
            return true;
        }

        self.truncate_levels(idx + 1);
        self.push_level(level, initial);
        true
    }

    fn pick(&self, level: LevelId, initial: InitialHighlight) -> Option<NodeId> {
        let items = self.tree.navigable(level);
        match initial {
            InitialHighlight::First => items.first().copied(),
            InitialHighlight::Last => items.last().copied(),
            InitialHighlight::None => None,
        }
    }

    fn push_level(&mut self, id: LevelId, initial: InitialHighlight) {
        let surface = SurfaceId(self.next_surface);
        self.next_surface += 1;
        let stacking = StackingContext {
            depth: self.open.len(),
            parent: self.open.last().map(|l| l.surface),
        };
        self.portal.mount(surface, id, stacking);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "menu.open",
            level = ?id,
            surface = surface.0,
            depth = stacking.depth
        );

        self.open.push(MenuLevel {
            id,
            phase: LevelPhase::Opening,
            highlighted: None,
            surface,
            size: self.size_cache.get(&id).copied(),
            position: None,
            item_bounds: Vec::new(),
        });
        self.typeahead.reset();
        let idx = self.open.len() - 1;
        self.active = idx;
        let first = self.pick(id, initial);
        self.set_highlight(idx, first);
        self.reposition_from(idx);
    }

    /// Close every level from `idx` outwards, deepest first.
    fn truncate_levels(&mut self, idx: usize) {
        if idx >= self.open.len() {
            return;
        }
        while self.open.len() > idx {
            let Some(mut level) = self.open.pop() else {
                break;
            };
            level.phase = LevelPhase::Closing;
            self.portal.unmount(level.surface);
            let closed = level.id;
            self.timers.cancel_matching(
                |t| matches!(t, MenuTimer::HoverOpen { level: owner, .. } if *owner == closed),
            );

            #[cfg(feature = "tracing")]
            tracing::debug!(message = "menu.close", level = ?closed, surface = level.surface.0);

            self.events.push(MenuEvent::LevelClosed {
                level: closed,
                surface: level.surface,
            });
        }
        self.active = self.active.min(self.open.len().saturating_sub(1));
        // Keep the focus target inside what is still open.
        if let Some(node) = self.focus.current()
            && self
                .tree
                .level_of(node)
                .is_none_or(|level| !self.is_level_open(level))
        {
            let fallback = self.open.last().and_then(|l| l.highlighted);
            self.focus.set(fallback);
        }
    }

    fn close_all(&mut self, restore: bool) -> bool {
        if self.open.is_empty() {
            return false;
        }
        self.truncate_levels(0);
        self.timers.clear();
        self.typeahead.reset();
        self.hovered = None;
        self.events.push(MenuEvent::OpenChange { open: false });
        if let Some(origin) = self.focus.pop_trap()
            && restore
        {
            self.events.push(MenuEvent::RestoreFocus { origin });
        }
        true
    }

    fn navigate(&mut self, idx: usize, nav: Nav) -> EventResult {
        let level = self.open[idx].id;
        let items = self.tree.navigable(level);
        if items.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(message = "menu.ignored", reason = "empty level", level = ?level);
            return EventResult::Ignored;
        }
        let last = items.len() - 1;
        let current = self.open[idx]
            .highlighted
            .and_then(|h| items.iter().position(|&n| n == h));
        let wrap = self.config.loop_navigation;
        let target = match (nav, current) {
            (Nav::First, _) | (Nav::Next, None) => 0,
            (Nav::Last, _) | (Nav::Prev, None) => last,
            (Nav::Next, Some(i)) if i == last => {
                if wrap {
                    0
                } else {
                    last
                }
            }
            (Nav::Next, Some(i)) => i + 1,
            (Nav::Prev, Some(0)) => {
                if wrap {
                    last
                } else {
                    0
                }
            }
            (Nav::Prev, Some(i)) => i - 1,
        };
        self.truncate_levels(idx + 1);
        self.set_highlight(idx, Some(items[target]));
        EventResult::Consumed
    }

    fn typeahead_in(&mut self, idx: usize, c: char, now: Instant) {
        let level = self.open[idx].id;
        let search = self.typeahead.push(c, now).to_owned();
        self.timers
            .cancel_matching(|t| matches!(t, MenuTimer::TypeaheadReset));
        if let Some(deadline) = self.typeahead.deadline() {
            self.timers.schedule(deadline, MenuTimer::TypeaheadReset);
        }

        let current = self.open[idx].highlighted;
        let found = typeahead::find_match(
            self.tree
                .level_entries(level)
                .filter(|n| n.is_navigable())
                .map(|n| (n.id(), n.text_value())),
            &search,
            current,
        );
        if let Some(node) = found {
            self.truncate_levels(idx + 1);
            self.set_highlight(idx, Some(node));
        }
    }

    fn reposition_from(&mut self, start: usize) {
        for idx in start..self.open.len() {
            self.position_level(idx);
        }
    }

    fn position_level(&mut self, idx: usize) {
        let Some(size) = self.open[idx].size else {
            return;
        };
        let Some(anchor) = self.anchor_rect(idx) else {
            return;
        };
        let placement = if idx == 0 {
            self.config.root_placement
        } else {
            self.config.effective_submenu_placement()
        };
        let position = placement::resolve(anchor, size, &placement, self.viewport);
        let level = &mut self.open[idx];
        level.position = Some(position);
        if level.phase == LevelPhase::Opening {
            level.phase = LevelPhase::Open;
            self.events.push(MenuEvent::LevelOpened {
                level: level.id,
                surface: level.surface,
            });
        }
    }

    /// Anchor of level `idx`: the root trigger, or the trigger item's bounds
    /// in the parent surface. Without reported item bounds the trigger row
    /// is estimated from its position among the parent's entries.
    fn anchor_rect(&self, idx: usize) -> Option<Rect> {
        let LevelId::Submenu(trigger) = self.open[idx].id else {
            return Some(self.trigger_bounds);
        };
        let parent = self.open.get(idx.checked_sub(1)?)?;
        if let Some((_, rect)) = parent.item_bounds.iter().find(|(id, _)| *id == trigger) {
            return Some(*rect);
        }
        let bounds = parent.bounds()?;
        let row = self
            .tree
            .level_entries(parent.id)
            .position(|n| n.id() == trigger)?;
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        Some(Rect::new(
            bounds.x,
            bounds.y.saturating_add(row),
            bounds.width,
            1,
        ))
    }

    /// Deepest open level under the point, and the item under it if any.
    fn hit_test(&self, x: u16, y: u16) -> Option<(usize, Option<NodeId>)> {
        self.open.iter().enumerate().rev().find_map(|(idx, level)| {
            let inside = level.bounds().is_some_and(|b| b.contains(x, y));
            inside.then(|| (idx, level.item_at(x, y)))
        })
    }
}
