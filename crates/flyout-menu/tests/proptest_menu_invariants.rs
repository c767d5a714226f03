#![forbid(unsafe_code)]

//! Property-based invariant tests for the menu controller.
//!
//! Arbitrary sequences of keyboard, pointer, timer and programmatic input
//! are applied to a menu whose items are randomly disabled. After every step:
//!
//! 1. Open levels form a single path from the root: each submenu's trigger
//!    lives in the level before it and is highlighted there
//! 2. Highlights are always enabled, navigable items of their own level
//! 3. The focus target and the keyboard's active level are always open
//! 4. At most one radio item per group is selected
//! 5. The portal has exactly the open surfaces mounted
//! 6. A closed menu has no pending timers
//!
//! And per operation:
//!
//! 7. Closing a level leaves every ancestor level untouched
//! 8. Arrow navigation never lands on a disabled item
//!
//! Run:
//!   cargo test -p flyout-menu --test proptest_menu_invariants

use flyout_menu::prelude::*;
use proptest::prelude::*;

// ── Fixture ─────────────────────────────────────────────────────────────

/// Ids of every node a disabled flag can be applied to, in mask order.
const TOGGLEABLE: [u64; 14] = [1, 2, 3, 4, 41, 42, 421, 422, 43, 6, 71, 72, 8, 9];

/// Every node id in the tree, including separators and groups.
const ALL_IDS: [u64; 17] = [1, 2, 3, 4, 41, 42, 421, 422, 43, 5, 6, 7, 71, 72, 8, 81, 9];

fn tree(disabled: &[bool]) -> MenuTree {
    let off = |n: u64| {
        TOGGLEABLE
            .iter()
            .position(|&id| id == n)
            .is_some_and(|i| disabled[i])
    };
    MenuTree::build(vec![
        NodeDecl::item(1, "Back").disabled(off(1)),
        NodeDecl::item(2, "Forward").disabled(off(2)),
        NodeDecl::item(3, "Reload").disabled(off(3)),
        NodeDecl::submenu(
            4,
            "More Tools",
            vec![
                NodeDecl::item(41, "Save Page As").disabled(off(41)),
                NodeDecl::submenu(
                    42,
                    "Developer",
                    vec![
                        NodeDecl::item(421, "Inspect").disabled(off(421)),
                        NodeDecl::item(422, "Console").disabled(off(422)),
                    ],
                )
                .disabled(off(42)),
                NodeDecl::item(43, "Task Manager").disabled(off(43)),
            ],
        )
        .disabled(off(4)),
        NodeDecl::separator(5),
        NodeDecl::checkbox(6, "Show Bookmarks").disabled(off(6)),
        NodeDecl::radio_group(
            7,
            "person",
            vec![
                NodeDecl::radio(71, "Pedro").disabled(off(71)),
                NodeDecl::radio(72, "Colm").disabled(off(72)),
            ],
        ),
        NodeDecl::submenu(8, "Share", vec![NodeDecl::item(81, "Email")]).disabled(off(8)),
        NodeDecl::item(9, "Pin").keep_open().disabled(off(9)),
    ])
    .expect("fixture tree is valid")
}

// ── Strategies ──────────────────────────────────────────────────────────

/// Inputs a host can feed the controller.
#[derive(Debug, Clone)]
enum Op {
    Key(KeyCode),
    PointerEnter(u64),
    PointerLeave(u64),
    Click(u64),
    OpenSubmenu(u64),
    /// Close the open level at this depth, modulo the number open.
    CloseLevel(usize),
    Open,
    Close,
    OutsideClick,
    Blur,
    SelectRadio(u64),
    /// Advance the clock.
    Wait(u64),
}

fn key_strategy() -> impl Strategy<Value = KeyCode> {
    prop_oneof![
        Just(KeyCode::Up),
        Just(KeyCode::Down),
        Just(KeyCode::Left),
        Just(KeyCode::Right),
        Just(KeyCode::Home),
        Just(KeyCode::End),
        Just(KeyCode::Enter),
        Just(KeyCode::Escape),
        Just(KeyCode::Tab),
        Just(KeyCode::Char(' ')),
        prop::sample::select(vec!['b', 'r', 'm', 's', 'p', 'c', 'x']).prop_map(KeyCode::Char),
    ]
}

fn node_strategy() -> impl Strategy<Value = u64> {
    prop::sample::select(ALL_IDS.to_vec())
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => key_strategy().prop_map(Op::Key),
        2 => node_strategy().prop_map(Op::PointerEnter),
        1 => node_strategy().prop_map(Op::PointerLeave),
        1 => node_strategy().prop_map(Op::Click),
        1 => node_strategy().prop_map(Op::OpenSubmenu),
        1 => (0usize..4).prop_map(Op::CloseLevel),
        1 => Just(Op::Open),
        1 => Just(Op::Close),
        1 => Just(Op::OutsideClick),
        1 => Just(Op::Blur),
        1 => prop::sample::select(vec![71u64, 72]).prop_map(Op::SelectRadio),
        2 => (0u64..1500).prop_map(Op::Wait),
    ]
}

fn mask_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(prop::bool::weighted(0.3), TOGGLEABLE.len())
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..60)
}

// ── Harness ─────────────────────────────────────────────────────────────

fn controller(disabled: &[bool]) -> MenuController<RecordingPortal> {
    let mut menu =
        MenuController::with_portal(tree(disabled), MenuConfig::default(), RecordingPortal::new());
    menu.set_viewport(Rect::from_size(80, 24));
    menu.set_trigger_bounds(Rect::new(0, 0, 8, 1));
    menu.set_trigger_focused(true);
    menu
}

fn apply(menu: &mut MenuController<RecordingPortal>, op: &Op, now: &mut Instant) {
    match op {
        Op::Key(code) => {
            menu.handle_key(&KeyEvent::new(*code), *now);
        }
        Op::PointerEnter(n) => {
            menu.pointer_enter(NodeId::new(*n), *now);
        }
        Op::PointerLeave(n) => {
            menu.pointer_leave(NodeId::new(*n), *now);
        }
        Op::Click(n) => {
            menu.click_node(NodeId::new(*n), *now);
        }
        Op::OpenSubmenu(n) => {
            menu.open_submenu(NodeId::new(*n));
        }
        Op::CloseLevel(depth) => {
            let open = menu.open_levels();
            if !open.is_empty() {
                let level = open[depth % open.len()].id();
                menu.close_level(level);
            }
        }
        Op::Open => {
            menu.open();
        }
        Op::Close => {
            menu.close();
        }
        Op::OutsideClick => {
            menu.pointer_down_outside(*now);
        }
        Op::Blur => {
            menu.handle_event(&Event::Focus(false), *now);
        }
        Op::SelectRadio(n) => {
            menu.select_radio(&RadioGroupId::from("person"), NodeId::new(*n));
        }
        Op::Wait(ms) => {
            *now += Duration::from_millis(*ms);
            menu.tick(*now);
        }
    }
}

fn check_invariants(menu: &MenuController<RecordingPortal>) -> Result<(), TestCaseError> {
    let tree = menu.tree();
    let open = menu.open_levels();

    // 1. Single path from the root.
    if let Some(first) = open.first() {
        prop_assert_eq!(first.id(), LevelId::Root);
    }
    for pair in open.windows(2) {
        let LevelId::Submenu(trigger) = pair[1].id() else {
            return Err(TestCaseError::fail("root level below another level"));
        };
        prop_assert_eq!(tree.level_of(trigger), Some(pair[0].id()));
        prop_assert_eq!(pair[0].highlighted(), Some(trigger));
    }

    // 2. Highlights are navigable members of their level.
    for level in open {
        if let Some(h) = level.highlighted() {
            let node = tree.get(h).expect("highlighted node exists");
            prop_assert!(node.is_navigable(), "highlighted {} is not navigable", h);
            prop_assert_eq!(tree.level_of(h), Some(level.id()));
        }
    }

    // 3. Focus lives in an open level.
    if let Some(focused) = menu.focus_target() {
        let level = tree.level_of(focused).expect("focused node has a level");
        prop_assert!(menu.is_level_open(level), "focus {} in closed level", focused);
    }
    if !menu.is_open() {
        prop_assert_eq!(menu.focus_target(), None);
    }
    match menu.active_level() {
        Some(level) => prop_assert!(menu.is_level_open(level), "active {:?} is closed", level),
        None => prop_assert!(!menu.is_open()),
    }

    // 4. Radio exclusivity.
    for group in tree.radio_groups() {
        let selected = group
            .members
            .iter()
            .filter(|&&m| menu.selection().is_radio_selected(m))
            .count();
        prop_assert!(selected <= 1, "{} radios selected in {}", selected, group.id);
        if let Some(sel) = menu.selection().selected_radio(&group.id) {
            prop_assert!(group.members.contains(&sel));
        }
    }

    // 5. Mounted surfaces match the open path.
    let mounted: Vec<SurfaceId> = menu.portal().mounted().iter().map(|(s, _)| *s).collect();
    let surfaces: Vec<SurfaceId> = open.iter().map(|l| l.surface()).collect();
    prop_assert_eq!(mounted, surfaces);

    // 6. Nothing scheduled while closed.
    if !menu.is_open() {
        prop_assert_eq!(menu.next_deadline(), None);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// 1-6. Structural invariants under arbitrary input
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn invariants_hold_after_every_step(
        disabled in mask_strategy(),
        ops in ops_strategy(),
    ) {
        let mut menu = controller(&disabled);
        let mut now = Instant::now();
        for op in &ops {
            apply(&mut menu, op, &mut now);
            check_invariants(&menu)?;
        }
    }

    #[test]
    fn same_input_same_state(
        disabled in mask_strategy(),
        ops in ops_strategy(),
    ) {
        let start = Instant::now();
        let mut a = controller(&disabled);
        let mut b = controller(&disabled);
        let (mut now_a, mut now_b) = (start, start);
        for op in &ops {
            apply(&mut a, op, &mut now_a);
            apply(&mut b, op, &mut now_b);
        }
        let path = |m: &MenuController<RecordingPortal>| -> Vec<(LevelId, Option<NodeId>)> {
            m.open_levels().iter().map(|l| (l.id(), l.highlighted())).collect()
        };
        prop_assert_eq!(path(&a), path(&b));
        prop_assert_eq!(a.drain_events(), b.drain_events());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 7. Cascade close never reaches ancestors
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn closing_a_level_keeps_its_ancestors(
        disabled in mask_strategy(),
        ops in ops_strategy(),
        depth in 1usize..4,
    ) {
        let mut menu = controller(&disabled);
        let mut now = Instant::now();
        for op in &ops {
            apply(&mut menu, op, &mut now);
        }
        let before: Vec<(LevelId, Option<NodeId>)> = menu
            .open_levels()
            .iter()
            .map(|l| (l.id(), l.highlighted()))
            .collect();
        prop_assume!(depth < before.len());

        prop_assert!(menu.close_level(before[depth].0));
        let after: Vec<(LevelId, Option<NodeId>)> = menu
            .open_levels()
            .iter()
            .map(|l| (l.id(), l.highlighted()))
            .collect();
        prop_assert_eq!(&after[..], &before[..depth]);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 8. Arrow navigation skips disabled items
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arrows_never_land_on_disabled(
        disabled in mask_strategy(),
        keys in prop::collection::vec(
            prop_oneof![Just(KeyCode::Up), Just(KeyCode::Down), Just(KeyCode::Home), Just(KeyCode::End)],
            1..40,
        ),
    ) {
        let mut menu = controller(&disabled);
        let now = Instant::now();
        menu.open();
        let enabled = menu.tree().navigable(LevelId::Root);
        for code in keys {
            menu.handle_key(&KeyEvent::new(code), now);
            match menu.highlighted(LevelId::Root) {
                Some(h) => prop_assert!(enabled.contains(&h)),
                None => prop_assert!(enabled.is_empty()),
            }
        }
    }
}
