#![no_main]

use arbitrary::Arbitrary;
use flyout_menu::prelude::*;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Input {
    Key(u8, bool),
    Char(char),
    Mouse(u8, u8, u8),
    Resize(u8, u8),
    Blur,
    SizeReport(u8, u8, u8),
    Wait(u16),
}

fn tree() -> MenuTree {
    MenuTree::build(vec![
        NodeDecl::item(1, "Undo"),
        NodeDecl::item(2, "Redo").disabled(true),
        NodeDecl::separator(3),
        NodeDecl::submenu(
            4,
            "Find",
            vec![
                NodeDecl::item(41, "Find..."),
                NodeDecl::submenu(42, "Recent", vec![NodeDecl::item(421, "foo")]),
            ],
        ),
        NodeDecl::checkbox(5, "Word wrap"),
        NodeDecl::radio_group(
            6,
            "eol",
            vec![NodeDecl::radio(61, "LF"), NodeDecl::radio(62, "CRLF")],
        ),
        NodeDecl::item(7, "Select All").keep_open(),
    ])
    .expect("static tree")
}

fn key_code(n: u8) -> KeyCode {
    match n % 12 {
        0 => KeyCode::Up,
        1 => KeyCode::Down,
        2 => KeyCode::Left,
        3 => KeyCode::Right,
        4 => KeyCode::Enter,
        5 => KeyCode::Escape,
        6 => KeyCode::Tab,
        7 => KeyCode::Home,
        8 => KeyCode::End,
        9 => KeyCode::PageUp,
        10 => KeyCode::Char(' '),
        _ => KeyCode::Backspace,
    }
}

fn mouse_kind(n: u8) -> MouseEventKind {
    match n % 4 {
        0 => MouseEventKind::Moved,
        1 => MouseEventKind::Down(MouseButton::Left),
        2 => MouseEventKind::Up(MouseButton::Left),
        _ => MouseEventKind::Down(MouseButton::Right),
    }
}

fuzz_target!(|inputs: Vec<Input>| {
    let mut menu = MenuController::with_portal(tree(), MenuConfig::default(), RecordingPortal::new());
    menu.set_viewport(Rect::from_size(80, 24));
    menu.set_trigger_bounds(Rect::new(0, 0, 6, 1));
    menu.set_trigger_focused(true);
    let mut now = Instant::now();

    for input in inputs.into_iter().take(256) {
        match input {
            Input::Key(code, release) => {
                let mut key = KeyEvent::new(key_code(code));
                if release {
                    key = key.with_kind(KeyEventKind::Release);
                }
                menu.handle_event(&Event::Key(key), now);
            }
            Input::Char(c) => {
                menu.handle_event(&Event::Key(KeyEvent::new(KeyCode::Char(c))), now);
            }
            Input::Mouse(kind, x, y) => {
                let event = MouseEvent::new(mouse_kind(kind), u16::from(x % 90), u16::from(y % 30));
                menu.handle_event(&Event::Mouse(event), now);
            }
            Input::Resize(w, h) => {
                menu.handle_event(
                    &Event::Resize {
                        width: u16::from(w),
                        height: u16::from(h),
                    },
                    now,
                );
            }
            Input::Blur => {
                menu.handle_event(&Event::Focus(false), now);
            }
            Input::SizeReport(depth, w, h) => {
                let levels = menu.open_levels();
                if !levels.is_empty() {
                    let surface = levels[usize::from(depth) % levels.len()].surface();
                    menu.report_surface_size(surface, Size::new(u16::from(w), u16::from(h)));
                }
            }
            Input::Wait(ms) => {
                now += Duration::from_millis(u64::from(ms));
                menu.tick(now);
            }
        }

        // Post-conditions that must always hold:
        let open = menu.open_levels();
        let mounted = menu.portal().mounted();
        assert_eq!(open.len(), mounted.len(), "mounted surfaces diverged");
        for pair in open.windows(2) {
            let LevelId::Submenu(trigger) = pair[1].id() else {
                panic!("root level nested");
            };
            assert_eq!(menu.tree().level_of(trigger), Some(pair[0].id()));
        }
        if let Some(focused) = menu.focus_target() {
            let level = menu.tree().level_of(focused).expect("focused node exists");
            assert!(menu.is_level_open(level), "focus escaped the open levels");
        }
        if !menu.is_open() {
            assert_eq!(menu.next_deadline(), None, "timer left behind");
        }
    }
});
