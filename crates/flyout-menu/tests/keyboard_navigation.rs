#![forbid(unsafe_code)]

//! Keyboard contract of the menu controller.
//!
//! Proves that:
//! 1. Arrow navigation wraps, never lands on a disabled item and stays in
//!    the level it entered, even one with nothing to highlight
//! 2. Escape closes exactly the deepest of three open levels
//! 3. Type-ahead accumulates within the idle window and restarts after it
//! 4. Every key is trapped while the menu is open
//!
//! Run:
//!   cargo test -p flyout-menu --test keyboard_navigation

use flyout_menu::focus::FocusOrigin;
use flyout_menu::prelude::*;

fn id(n: u64) -> NodeId {
    NodeId::new(n)
}

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code))
}

fn opened(tree: MenuTree) -> MenuController {
    let mut menu = MenuController::new(tree, MenuConfig::default());
    menu.set_viewport(Rect::from_size(120, 40));
    menu.set_trigger_bounds(Rect::new(2, 1, 10, 1));
    menu.set_trigger_focused(true);
    assert!(
        menu.handle_event(&key(KeyCode::Down), Instant::now())
            .is_consumed()
    );
    menu
}

fn file_menu() -> MenuTree {
    MenuTree::build(vec![
        NodeDecl::label(100, "File"),
        NodeDecl::item(1, "New"),
        NodeDecl::item(2, "Open").disabled(true),
        NodeDecl::separator(101),
        NodeDecl::item(3, "Save"),
        NodeDecl::item(4, "Save As").disabled(true),
        NodeDecl::submenu(
            5,
            "Export",
            vec![
                NodeDecl::item(51, "PDF"),
                NodeDecl::submenu(
                    52,
                    "Image",
                    vec![NodeDecl::item(521, "PNG"), NodeDecl::item(522, "SVG")],
                ),
            ],
        ),
        NodeDecl::item(6, "Quit").disabled(true),
    ])
    .unwrap()
}

// ============================================================================
// 1. Wraparound
// ============================================================================

#[test]
fn arrow_down_cycles_enabled_items_only() {
    let mut menu = opened(file_menu());
    let enabled = [id(1), id(3), id(5)];
    let now = Instant::now();

    assert_eq!(menu.highlighted(LevelId::Root), Some(id(1)));
    for step in 1..=10 {
        menu.handle_event(&key(KeyCode::Down), now);
        let expected = enabled[step % enabled.len()];
        assert_eq!(
            menu.highlighted(LevelId::Root),
            Some(expected),
            "step {step}"
        );
    }
}

#[test]
fn arrow_up_wraps_to_last_enabled() {
    let mut menu = opened(file_menu());
    menu.handle_event(&key(KeyCode::Up), Instant::now());
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(5)));
}

#[test]
fn navigation_in_level_without_enabled_items_is_ignored() {
    let tree = MenuTree::build(vec![
        NodeDecl::label(1, "Nothing here"),
        NodeDecl::item(2, "Gone").disabled(true),
    ])
    .unwrap();
    let mut menu = opened(tree);
    assert!(menu.is_open());
    assert_eq!(menu.highlighted(LevelId::Root), None);
    assert_eq!(
        menu.handle_event(&key(KeyCode::Down), Instant::now()),
        EventResult::Ignored
    );
    assert_eq!(menu.focus_target(), None);
}

#[test]
fn arrows_stay_in_an_open_submenu_without_enabled_items() {
    let tree = MenuTree::build(vec![
        NodeDecl::submenu(1, "Recent", vec![NodeDecl::item(11, "None").disabled(true)]),
        NodeDecl::item(2, "Close"),
    ])
    .unwrap();
    let mut menu = opened(tree);
    let now = Instant::now();
    let recent = LevelId::Submenu(id(1));

    assert!(menu.handle_event(&key(KeyCode::Right), now).is_consumed());
    assert!(menu.is_level_open(recent));
    assert_eq!(menu.highlighted(recent), None);
    assert_eq!(menu.active_level(), Some(recent));

    // Down targets the empty submenu, not the root behind it.
    assert_eq!(menu.handle_event(&key(KeyCode::Down), now), EventResult::Ignored);
    assert!(menu.is_level_open(recent));
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(1)));

    assert!(menu.handle_event(&key(KeyCode::Left), now).is_consumed());
    assert!(!menu.is_level_open(recent));
    assert_eq!(menu.active_level(), Some(LevelId::Root));
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(1)));
}

// ============================================================================
// 2. Escape with three open levels
// ============================================================================

#[test]
fn escape_closes_only_the_deepest_of_three_levels() {
    let mut menu = opened(file_menu());
    let now = Instant::now();

    menu.handle_event(&key(KeyCode::End), now);
    menu.handle_event(&key(KeyCode::Right), now);
    menu.handle_event(&key(KeyCode::Down), now);
    menu.handle_event(&key(KeyCode::Enter), now);

    let export = LevelId::Submenu(id(5));
    let image = LevelId::Submenu(id(52));
    let open: Vec<LevelId> = menu.open_levels().iter().map(|l| l.id()).collect();
    assert_eq!(open, vec![LevelId::Root, export, image]);
    assert_eq!(menu.focus_target(), Some(id(521)));

    menu.drain_events();
    assert!(
        menu.handle_event(&key(KeyCode::Escape), now)
            .is_consumed()
    );

    assert!(menu.is_level_open(LevelId::Root));
    assert!(menu.is_level_open(export));
    assert!(!menu.is_level_open(image));
    assert_eq!(menu.highlighted(export), Some(id(52)));
    assert_eq!(menu.focus_target(), Some(id(52)));
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(5)));

    let events = menu.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        MenuEvent::LevelClosed { level, .. } if *level == image
    )));
    assert!(!events.contains(&MenuEvent::OpenChange { open: false }));
}

#[test]
fn escape_at_root_restores_focus_to_trigger() {
    let mut menu = opened(file_menu());
    menu.drain_events();
    menu.handle_event(&key(KeyCode::Escape), Instant::now());
    assert!(!menu.is_open());
    let events = menu.drain_events();
    assert_eq!(
        events.last(),
        Some(&MenuEvent::RestoreFocus {
            origin: FocusOrigin::Trigger
        })
    );
}

#[test]
fn reopening_after_escape_starts_fresh() {
    let mut menu = opened(file_menu());
    let now = Instant::now();
    menu.handle_event(&key(KeyCode::End), now);
    menu.handle_event(&key(KeyCode::Right), now);
    menu.handle_event(&key(KeyCode::Escape), now);
    menu.handle_event(&key(KeyCode::Escape), now);
    assert!(!menu.is_open());

    menu.handle_event(&key(KeyCode::Enter), now);
    assert_eq!(menu.open_levels().len(), 1);
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(1)));
}

// ============================================================================
// 3. Type-ahead
// ============================================================================

fn food_menu() -> MenuTree {
    MenuTree::build(vec![
        NodeDecl::item(1, "Apple"),
        NodeDecl::item(2, "Sandwich"),
        NodeDecl::item(3, "Salad"),
        NodeDecl::item(4, "Soup").disabled(true),
        NodeDecl::item(5, "Avocado"),
        NodeDecl::item(6, "Salsa").text_value("Dip"),
    ])
    .unwrap()
}

#[test]
fn typing_s_then_a_highlights_first_sa_item() {
    let mut menu = opened(food_menu());
    let t0 = Instant::now();
    menu.handle_event(&key(KeyCode::Char('s')), t0);
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(2)));
    menu.handle_event(&key(KeyCode::Char('a')), t0 + Duration::from_millis(300));
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(2)));
    menu.handle_event(&key(KeyCode::Char('l')), t0 + Duration::from_millis(600));
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(3)));
}

#[test]
fn idle_timeout_restarts_the_search() {
    let mut menu = opened(food_menu());
    let t0 = Instant::now();
    menu.handle_event(&key(KeyCode::Char('s')), t0);
    menu.handle_event(&key(KeyCode::Char('a')), t0 + Duration::from_millis(100));
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(2)));

    // The reset timer fires on its own when the host ticks.
    let reset_at = menu.next_deadline().expect("type-ahead reset scheduled");
    assert_eq!(reset_at, t0 + Duration::from_millis(1100));
    menu.tick(reset_at);

    menu.handle_event(&key(KeyCode::Char('a')), reset_at + Duration::from_millis(10));
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(5)));
}

#[test]
fn idle_timeout_applies_without_tick() {
    let mut menu = opened(food_menu());
    let t0 = Instant::now();
    menu.handle_event(&key(KeyCode::Char('s')), t0);
    menu.handle_event(&key(KeyCode::Char('a')), t0 + Duration::from_secs(5));
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(5)));
}

#[test]
fn repeated_letter_cycles_and_skips_disabled() {
    let mut menu = opened(food_menu());
    let t0 = Instant::now();
    let mut seen = Vec::new();
    for i in 0..3 {
        menu.handle_event(&key(KeyCode::Char('s')), t0 + Duration::from_millis(i * 50));
        seen.push(menu.highlighted(LevelId::Root));
    }
    assert_eq!(seen, vec![Some(id(2)), Some(id(3)), Some(id(2))]);
}

#[test]
fn type_ahead_uses_text_value() {
    let mut menu = opened(food_menu());
    menu.handle_event(&key(KeyCode::Char('D')), Instant::now());
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(6)));
}

// ============================================================================
// 4. Focus trap
// ============================================================================

#[test]
fn unrelated_keys_are_swallowed_while_open() {
    let mut menu = opened(file_menu());
    let now = Instant::now();
    for code in [KeyCode::Tab, KeyCode::BackTab, KeyCode::Backspace] {
        assert_eq!(menu.handle_event(&key(code), now), EventResult::Consumed);
    }
    let ctrl_s = Event::Key(KeyEvent::new(KeyCode::Char('s')).with_modifiers(Modifiers::CTRL));
    assert_eq!(menu.handle_event(&ctrl_s, now), EventResult::Consumed);
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(1)));
    assert!(menu.is_open());
}

#[test]
fn key_release_is_ignored() {
    let mut menu = opened(file_menu());
    let release = Event::Key(KeyEvent::new(KeyCode::Down).with_kind(KeyEventKind::Release));
    assert_eq!(
        menu.handle_event(&release, Instant::now()),
        EventResult::Ignored
    );
    assert_eq!(menu.highlighted(LevelId::Root), Some(id(1)));
}

#[test]
fn space_and_enter_activate() {
    let tree = MenuTree::build(vec![
        NodeDecl::checkbox(1, "Wrap lines"),
        NodeDecl::radio_group(
            2,
            "theme",
            vec![NodeDecl::radio(21, "Light"), NodeDecl::radio(22, "Dark")],
        ),
    ])
    .unwrap();
    let config = MenuConfig::default().with_close_on_select(false);
    let mut menu = MenuController::new(tree, config);
    menu.set_trigger_focused(true);
    let now = Instant::now();
    menu.handle_event(&key(KeyCode::Enter), now);

    menu.handle_event(&key(KeyCode::Char(' ')), now);
    assert!(menu.selection().is_checked(id(1)));
    menu.handle_event(&key(KeyCode::Down), now);
    menu.handle_event(&key(KeyCode::Enter), now);
    menu.handle_event(&key(KeyCode::Down), now);
    menu.handle_event(&key(KeyCode::Enter), now);
    assert!(menu.selection().is_radio_selected(id(22)));
    assert!(!menu.selection().is_radio_selected(id(21)));
    assert!(menu.is_open());

    let changes: Vec<MenuEvent> = menu
        .drain_events()
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                MenuEvent::CheckedChange { .. } | MenuEvent::RadioChange { .. }
            )
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            MenuEvent::CheckedChange {
                node: id(1),
                checked: true
            },
            MenuEvent::RadioChange {
                group: RadioGroupId::from("theme"),
                node: id(21)
            },
            MenuEvent::RadioChange {
                group: RadioGroupId::from("theme"),
                node: id(22)
            },
        ]
    );
}
