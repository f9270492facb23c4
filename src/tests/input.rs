use approx::assert_abs_diff_eq;
use smithay::input::keyboard::Keysym;
use smithay::utils::{Point, Rectangle, Size};
use strata_config::Modifiers;

use super::fixture::keycode;
use super::sink::SinkEvent;
use super::Fixture;
use crate::backend::BackendEvent;
use crate::cursor::CursorImage;
use crate::handlers::ToplevelHandler;
use crate::input::drag_grab::GrabMode;
use crate::input::{ButtonState, InputEvent, KeyState, BTN_LEFT, BTN_RIGHT};

#[test]
fn click_focuses_then_mod_drag_moves() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);
    let (b, _) = f.add_window_at(150, 120, 200, 100);
    assert_eq!(f.strata().layout.focus_id(), Some(b));

    // Only A is under this point.
    f.move_pointer_to(120., 110.);
    f.sink.take();

    f.button(BTN_LEFT, ButtonState::Pressed);
    assert_eq!(f.strata().layout.focus_id(), Some(a));
    assert_eq!(f.strata().layout.window_under(Point::new(200., 150.)), Some(a));
    assert!(f.strata().grab.is_none());
    assert_eq!(
        f.sink.take_non_motion(),
        vec![
            SinkEvent::PointerButton(a, BTN_LEFT, ButtonState::Pressed),
            SinkEvent::KeyboardLeave(b),
            SinkEvent::KeyboardEnter(a, vec![]),
        ]
    );

    f.button(BTN_LEFT, ButtonState::Released);
    assert_eq!(
        f.sink.take_non_motion(),
        vec![SinkEvent::PointerButton(a, BTN_LEFT, ButtonState::Released)]
    );

    f.press(Keysym::Super_L);
    f.button(BTN_LEFT, ButtonState::Pressed);
    let grab = f.strata().grab.clone().unwrap();
    assert_eq!(grab.window(), a);
    assert_eq!(grab.mode(), GrabMode::Move);
    assert_eq!(f.strata().cursor_manager.cursor_image(), CursorImage::Move);
    assert_abs_diff_eq!(f.strata().layout.window(a).unwrap().opacity(), 0.8);

    f.move_pointer_to(400., 300.);
    assert_eq!(
        f.strata().layout.window(a).unwrap().geometry(),
        Rectangle::new(Point::new(300, 250), Size::new(200, 100))
    );

    f.button(BTN_LEFT, ButtonState::Released);
    assert!(f.strata().grab.is_none());
    assert_eq!(f.strata().cursor_manager.cursor_image(), CursorImage::Default);
    assert_abs_diff_eq!(f.strata().layout.window(a).unwrap().opacity(), 1.);

    // The client saw the mod key but none of the dragging.
    assert_eq!(
        f.sink.take_non_motion(),
        vec![SinkEvent::Key(
            a,
            keycode(Keysym::Super_L),
            KeyState::Pressed
        )]
    );
    assert_eq!(f.strata().seat.pointer_focus(), Some(a));
}

#[test]
fn releasing_mod_ends_drag() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);

    f.move_pointer_to(150., 150.);
    f.press(Keysym::Super_L);
    f.button(BTN_RIGHT, ButtonState::Pressed);
    assert_eq!(f.strata().grab.as_ref().unwrap().mode(), GrabMode::Resize);
    assert_eq!(f.strata().cursor_manager.cursor_image(), CursorImage::Resize);

    f.move_pointer_to(500., 400.);
    assert_eq!(
        f.strata().layout.window(a).unwrap().geometry(),
        Rectangle::new(Point::new(100, 100), Size::new(400, 300))
    );

    f.release(Keysym::Super_L);
    assert!(f.strata().grab.is_none());
    assert_abs_diff_eq!(f.strata().layout.window(a).unwrap().opacity(), 1.);

    // Motion no longer resizes.
    f.move_pointer_to(600., 600.);
    assert_eq!(
        f.strata().layout.window(a).unwrap().geometry().size,
        Size::new(400, 300)
    );
}

#[test]
fn other_buttons_do_not_start_drags() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);

    f.move_pointer_to(150., 150.);
    f.press(Keysym::Super_L);
    f.sink.take();
    f.button(0x112, ButtonState::Pressed);

    assert!(f.strata().grab.is_none());
    assert_eq!(f.strata().layout.focus_id(), Some(a));
    // Presses with the mod key held never reach clients.
    assert_eq!(f.sink.take_non_motion(), vec![]);
}

#[test]
fn fullscreen_windows_are_focused_but_not_dragged() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);
    let (b, _) = f.add_window_at(500, 500, 200, 100);
    f.strata().layout.set_fullscreen(a, true);
    assert_eq!(f.strata().layout.focus_id(), Some(b));

    f.move_pointer_to(10., 10.);
    f.press(Keysym::Super_L);
    f.button(BTN_LEFT, ButtonState::Pressed);

    assert_eq!(f.strata().layout.focus_id(), Some(a));
    assert!(f.strata().grab.is_none());
}

#[test]
fn clicking_empty_space_keeps_focus() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);

    f.move_pointer_to(1000., 1000.);
    f.sink.take();
    f.button(BTN_LEFT, ButtonState::Pressed);
    f.button(BTN_LEFT, ButtonState::Released);

    assert_eq!(f.strata().layout.focus_id(), Some(a));
    assert_eq!(f.sink.take_non_motion(), vec![]);
}

#[test]
fn binds_only_trigger_with_mod() {
    let mut f = Fixture::new();
    let (a, surface) = f.add_window_at(100, 100, 200, 100);
    f.sink.take();

    f.tap(Keysym::c);
    assert_eq!(surface.close_requests(), 0);
    assert_eq!(
        f.sink.take(),
        vec![
            SinkEvent::Key(a, keycode(Keysym::c), KeyState::Pressed),
            SinkEvent::Key(a, keycode(Keysym::c), KeyState::Released),
        ]
    );

    f.tap_with_mod(Keysym::c);
    assert_eq!(surface.close_requests(), 1);
    assert_eq!(
        f.sink.take(),
        vec![
            SinkEvent::Key(a, keycode(Keysym::Super_L), KeyState::Pressed),
            SinkEvent::Key(a, keycode(Keysym::Super_L), KeyState::Released),
        ]
    );

    // Keys without a bind are forwarded even with the mod key held.
    f.press(Keysym::Super_L);
    f.tap(Keysym::z);
    f.release(Keysym::Super_L);
    assert_eq!(
        f.sink.take(),
        vec![
            SinkEvent::Key(a, keycode(Keysym::Super_L), KeyState::Pressed),
            SinkEvent::Key(a, keycode(Keysym::z), KeyState::Pressed),
            SinkEvent::Key(a, keycode(Keysym::z), KeyState::Released),
            SinkEvent::Key(a, keycode(Keysym::Super_L), KeyState::Released),
        ]
    );
}

#[test]
fn bind_release_stays_suppressed_after_mod_release() {
    let mut f = Fixture::new();
    let (a, surface) = f.add_window_at(100, 100, 200, 100);
    f.sink.take();

    f.press(Keysym::Super_L);
    f.press(Keysym::c);
    f.release(Keysym::Super_L);
    f.release(Keysym::c);

    assert_eq!(surface.close_requests(), 1);
    assert_eq!(
        f.sink.take(),
        vec![
            SinkEvent::Key(a, keycode(Keysym::Super_L), KeyState::Pressed),
            SinkEvent::Key(a, keycode(Keysym::Super_L), KeyState::Released),
        ]
    );
    assert!(f.strata().suppressed_keys.is_empty());
}

#[test]
fn keyboard_enter_carries_held_keys() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);
    assert_eq!(f.sink.take_non_motion(), vec![SinkEvent::KeyboardEnter(a, vec![])]);

    f.press(Keysym::z);
    let (b, _) = f.add_window_at(300, 300, 200, 100);
    assert_eq!(
        f.sink.take_non_motion(),
        vec![
            SinkEvent::Key(a, keycode(Keysym::z), KeyState::Pressed),
            SinkEvent::KeyboardLeave(a),
            SinkEvent::KeyboardEnter(b, vec![keycode(Keysym::z)]),
        ]
    );

    f.release(Keysym::z);
    assert_eq!(
        f.sink.take_non_motion(),
        vec![SinkEvent::Key(b, keycode(Keysym::z), KeyState::Released)]
    );
}

#[test]
fn hide_and_show_all_binds() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);
    let (b, _) = f.add_window_at(150, 150, 200, 100);

    f.tap_with_mod(Keysym::h);
    assert!(f.strata().layout.window(b).unwrap().is_hidden());
    assert_eq!(f.strata().layout.focus_id(), Some(a));
    assert_eq!(f.strata().seat.keyboard_focus(), Some(a));

    f.tap_with_mod(Keysym::h);
    assert_eq!(f.strata().layout.focus_id(), None);
    assert_eq!(f.strata().seat.keyboard_focus(), None);

    // The window hidden last comes back on top.
    f.tap_with_mod(Keysym::a);
    let layout = &f.strata().layout;
    assert!(layout.window(a).unwrap().is_mapped());
    assert!(layout.window(b).unwrap().is_mapped());
    assert_eq!(layout.focus_id(), Some(a));
    assert_eq!(layout.window_under(Point::new(200., 175.)), Some(a));
}

#[test]
fn focus_previous_bind_cycles() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);
    let (b, _) = f.add_window_at(150, 150, 200, 100);

    f.tap_with_mod(Keysym::Tab);
    assert_eq!(f.strata().layout.focus_id(), Some(a));
    assert_eq!(f.strata().layout.window_under(Point::new(200., 175.)), Some(a));

    f.tap_with_mod(Keysym::Tab);
    assert_eq!(f.strata().layout.focus_id(), Some(b));
}

#[test]
fn fullscreen_bind_warps_pointer() {
    let mut f = Fixture::new();
    let (a, surface) = f.add_window_at(100, 100, 200, 100);

    f.tap_with_mod(Keysym::f);
    assert!(surface.is_fullscreen());
    assert_eq!(
        f.strata().layout.window(a).unwrap().geometry(),
        Rectangle::new(Point::new(0, 0), Size::new(1920, 1080))
    );
    assert_eq!(f.pointer_location(), Point::new(960., 540.));

    f.tap_with_mod(Keysym::f);
    assert!(!surface.is_fullscreen());
    assert_eq!(
        f.strata().layout.window(a).unwrap().geometry(),
        Rectangle::new(Point::new(100, 100), Size::new(200, 100))
    );
    assert_eq!(f.pointer_location(), Point::new(200., 150.));
}

#[test]
fn maximize_and_snap_binds() {
    let mut f = Fixture::new();
    let (a, surface) = f.add_window_at(100, 100, 200, 100);

    f.tap_with_mod(Keysym::m);
    assert!(surface.is_maximized());
    assert_eq!(
        f.strata().layout.window(a).unwrap().geometry(),
        Rectangle::new(Point::new(0, 0), Size::new(1920, 1080))
    );

    f.tap_with_mod(Keysym::Right);
    assert!(!surface.is_maximized());
    assert_eq!(
        f.strata().layout.window(a).unwrap().geometry(),
        Rectangle::new(Point::new(960, 0), Size::new(960, 1080))
    );

    f.tap_with_mod(Keysym::Left);
    assert_eq!(
        f.strata().layout.window(a).unwrap().geometry(),
        Rectangle::new(Point::new(0, 0), Size::new(960, 1080))
    );
}

#[test]
fn binds_without_focus_do_nothing() {
    let mut f = Fixture::new();

    f.tap_with_mod(Keysym::c);
    f.tap_with_mod(Keysym::f);
    f.tap_with_mod(Keysym::Left);

    assert_eq!(f.strata().layout.focus_id(), None);
    f.strata().layout.verify_invariants();
}

#[test]
fn quit_bind_stops_event_loop() {
    let mut f = Fixture::new();

    let sender = f.state.backend.headless().event_sender();
    for (keysym, state) in [
        (Keysym::Super_L, KeyState::Pressed),
        (Keysym::Escape, KeyState::Pressed),
    ] {
        let event = InputEvent::Keyboard {
            keycode: keycode(keysym),
            keysym,
            state,
            modifiers: strata_config::Modifiers::SUPER,
        };
        sender.send(BackendEvent::Input(event)).unwrap();
    }

    let mut iterations = 0;
    f.event_loop
        .run(std::time::Duration::ZERO, &mut f.state, |_| iterations += 1)
        .unwrap();
    assert_eq!(iterations, 1);
}

#[test]
fn pointer_stays_inside_layout() {
    let mut f = Fixture::new();
    assert_eq!(f.pointer_location(), Point::new(0., 0.));

    f.input(InputEvent::PointerMotion {
        delta: Point::new(-100., -100.),
    });
    assert_eq!(f.pointer_location(), Point::new(0., 0.));

    f.input(InputEvent::PointerMotion {
        delta: Point::new(5000., 5000.),
    });
    assert_eq!(f.pointer_location(), Point::new(1919., 1079.));

    f.input(InputEvent::PointerMotionAbsolute {
        fraction: Point::new(0.5, 0.25),
    });
    assert_eq!(f.pointer_location(), Point::new(960., 270.));
}

#[test]
fn pointer_motion_reaches_window_under() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);
    f.sink.take();

    f.move_pointer_to(150., 120.);
    f.move_pointer_to(10., 10.);
    assert_eq!(
        f.sink.take(),
        vec![
            SinkEvent::PointerMotion(Some((a, Point::new(50., 20.)))),
            SinkEvent::PointerMotion(None),
        ]
    );
}

#[test]
fn click_focus_applies_to_keys_in_same_dispatch() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);
    let (b, _) = f.add_window_at(500, 500, 200, 100);
    assert_eq!(f.strata().layout.focus_id(), Some(b));

    f.move_pointer_to(150., 150.);
    f.sink.take();

    let sender = f.state.backend.headless().event_sender();
    sender
        .send(BackendEvent::Input(InputEvent::PointerButton {
            button: BTN_LEFT,
            state: ButtonState::Pressed,
        }))
        .unwrap();
    sender
        .send(BackendEvent::Input(InputEvent::Keyboard {
            keycode: keycode(Keysym::x),
            keysym: Keysym::x,
            state: KeyState::Pressed,
            modifiers: Modifiers::empty(),
        }))
        .unwrap();
    f.dispatch();

    assert_eq!(
        f.sink.take_non_motion(),
        vec![
            SinkEvent::PointerButton(a, BTN_LEFT, ButtonState::Pressed),
            SinkEvent::KeyboardLeave(b),
            SinkEvent::KeyboardEnter(a, vec![]),
            SinkEvent::Key(a, keycode(Keysym::x), KeyState::Pressed),
        ]
    );
}

#[test]
fn keys_after_destroy_go_to_next_window() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);
    let (b, _) = f.add_window_at(500, 500, 200, 100);
    f.sink.take();

    f.state.toplevel_destroyed(b);
    f.press(Keysym::x);

    // The destroyed window gets no leave.
    assert_eq!(
        f.sink.take_non_motion(),
        vec![
            SinkEvent::KeyboardEnter(a, vec![]),
            SinkEvent::Key(a, keycode(Keysym::x), KeyState::Pressed),
        ]
    );
}

#[test]
fn button_release_after_mod_drag_is_not_forwarded() {
    let mut f = Fixture::new();
    let (a, _) = f.add_window_at(100, 100, 200, 100);

    f.move_pointer_to(150., 150.);
    f.press(Keysym::Super_L);
    f.button(BTN_LEFT, ButtonState::Pressed);
    assert!(f.strata().grab.is_some());

    f.release(Keysym::Super_L);
    assert!(f.strata().grab.is_none());
    f.sink.take();

    f.button(BTN_LEFT, ButtonState::Released);
    assert_eq!(f.strata().seat.pointer_focus(), Some(a));
    assert_eq!(f.sink.take_non_motion(), vec![]);

    // The next click reaches the client again.
    f.button(BTN_LEFT, ButtonState::Pressed);
    f.button(BTN_LEFT, ButtonState::Released);
    assert_eq!(
        f.sink.take_non_motion(),
        vec![
            SinkEvent::PointerButton(a, BTN_LEFT, ButtonState::Pressed),
            SinkEvent::PointerButton(a, BTN_LEFT, ButtonState::Released),
        ]
    );
}
