#![no_main]

use arbitrary::Arbitrary;
use flyout_menu::placement::{Align, Placement, Side, resolve};
use flyout_menu::{Rect, Size};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Case {
    anchor: (u16, u16, u16, u16),
    size: (u16, u16),
    viewport: (u16, u16, u16, u16),
    side: u8,
    align: u8,
    side_offset: u16,
    align_offset: i16,
    padding: u16,
    avoid: bool,
}

fuzz_target!(|case: Case| {
    let side = match case.side % 4 {
        0 => Side::Top,
        1 => Side::Bottom,
        2 => Side::Left,
        _ => Side::Right,
    };
    let align = match case.align % 3 {
        0 => Align::Start,
        1 => Align::Center,
        _ => Align::End,
    };
    let placement = Placement::default()
        .with_side(side)
        .with_align(align)
        .with_side_offset(case.side_offset)
        .with_align_offset(case.align_offset)
        .with_collision_padding(case.padding)
        .with_avoid_collisions(case.avoid);
    let (ax, ay, aw, ah) = case.anchor;
    let (vx, vy, vw, vh) = case.viewport;
    let anchor = Rect::new(ax, ay, aw, ah);
    let viewport = Rect::new(vx, vy, vw, vh);
    let size = Size::new(case.size.0, case.size.1);

    let pos = resolve(anchor, size, &placement, viewport);

    // Post-conditions that must always hold:
    if pos.fits {
        assert!(pos.x >= viewport.x && pos.y >= viewport.y);
        assert!(u32::from(pos.x) + u32::from(size.width) <= u32::from(viewport.x) + u32::from(viewport.width));
        assert!(u32::from(pos.y) + u32::from(size.height) <= u32::from(viewport.y) + u32::from(viewport.height));
    }
    if !case.avoid {
        assert_eq!(pos.side, side);
        assert!(!pos.clamped);
    }
    assert_eq!(pos.flipped, pos.side != side);
    if pos.flipped {
        assert_eq!(pos.side, side.flip());
    }
});
