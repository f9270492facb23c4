use std::collections::HashSet;

use smithay::input::keyboard::{FilterResult, Keysym};
use smithay::utils::{Logical, Point};
use strata_config::{Action, Bind, ModKey, Modifiers};

use self::drag_grab::{DragGrab, GrabMode};
use crate::layout::SnapSide;
use crate::strata::State;
use crate::utils::center;
use crate::utils::spawning::{spawn, spawn_sh};
use crate::window::WindowId;

pub mod drag_grab;
pub mod seat;

pub const BTN_LEFT: u32 = 0x110;
pub const BTN_RIGHT: u32 = 0x111;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Released,
    Pressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Released,
    Pressed,
}

/// Input coming from the input backend, one event at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Relative pointer motion, in logical pixels.
    PointerMotion { delta: Point<f64, Logical> },
    /// Absolute pointer motion, as a fraction in `0..1` of the layout bounding box.
    PointerMotionAbsolute { fraction: Point<f64, Logical> },
    /// Pointer button with an evdev button code.
    PointerButton { button: u32, state: ButtonState },
    /// Key press or release.
    ///
    /// `keysym` is the keysym without modifiers applied, and `modifiers` are the modifiers active
    /// when the key was pressed.
    Keyboard {
        keycode: u32,
        keysym: Keysym,
        state: KeyState,
        modifiers: Modifiers,
    },
}

impl State {
    pub fn process_input_event(&mut self, event: InputEvent) {
        let _span = tracy_client::span!("process_input_event");

        match event {
            InputEvent::PointerMotion { delta } => self.on_pointer_motion(delta),
            InputEvent::PointerMotionAbsolute { fraction } => {
                self.on_pointer_motion_absolute(fraction)
            }
            InputEvent::PointerButton { button, state } => self.on_pointer_button(button, state),
            InputEvent::Keyboard {
                keycode,
                keysym,
                state,
                modifiers,
            } => self.on_keyboard(keycode, keysym, state, modifiers),
        }

        // Actions and clicks can move focus.
        self.update_keyboard_focus();
    }

    fn on_keyboard(&mut self, keycode: u32, keysym: Keysym, state: KeyState, modifiers: Modifiers) {
        let mod_key = self.strata.config.borrow().input.mod_key;
        let pressed = state == KeyState::Pressed;

        if mod_key.matches_keysym(keysym) {
            self.strata.mod_held = pressed;
            if !pressed {
                self.end_drag();
            }

            // Clients need the modifier to keep their own state consistent.
            self.strata.seat.key(keycode, state, modifiers);
            return;
        }

        let result = {
            let config = self.strata.config.borrow();
            should_intercept_key(
                &mut self.strata.suppressed_keys,
                &config.binds.0,
                mod_key,
                keycode,
                keysym,
                pressed,
                modifiers,
                self.strata.mod_held,
            )
        };

        match result {
            FilterResult::Forward => self.strata.seat.key(keycode, state, modifiers),
            FilterResult::Intercept(Some(bind)) => self.do_action(bind.action),
            FilterResult::Intercept(None) => (),
        }
    }

    pub fn do_action(&mut self, action: Action) {
        debug!("running action {action:?}");

        let focus = self.strata.layout.focus_id();

        match action {
            Action::Quit => {
                info!("quitting as requested");
                self.strata.stop_signal.stop();
            }
            Action::Spawn(command) => {
                spawn(command);
            }
            Action::SpawnSh(command) => {
                spawn_sh(command);
            }
            Action::CloseWindow => {
                if let Some(id) = focus {
                    self.strata.layout.close_window(id);
                }
            }
            Action::HideWindow => {
                if let Some(id) = focus {
                    self.end_drag_of(id);
                    self.strata.layout.hide_window(id);
                }
            }
            Action::ShowAllWindows => {
                self.strata.layout.show_all_windows();
            }
            Action::FocusPreviousWindow => {
                self.strata.layout.focus_previous_window();
            }
            Action::ToggleFullscreen => {
                if let Some(id) = focus {
                    self.end_drag_of(id);
                    if self.strata.layout.toggle_fullscreen(id) {
                        self.warp_pointer_to_window_center();
                    }
                }
            }
            Action::ToggleMaximize => {
                if let Some(id) = focus {
                    self.strata.layout.toggle_maximized(id);
                }
            }
            Action::SnapWindowLeft => {
                if let Some(id) = focus {
                    self.strata.layout.snap_window(id, SnapSide::Left);
                }
            }
            Action::SnapWindowRight => {
                if let Some(id) = focus {
                    self.strata.layout.snap_window(id, SnapSide::Right);
                }
            }
            Action::TogglePrimaryOutput => {
                self.strata.layout.toggle_primary_output();
                self.confine_pointer();
            }
        }
    }

    fn on_pointer_motion(&mut self, delta: Point<f64, Logical>) {
        let location = self.strata.seat.pointer_location() + delta;
        let location = self.strata.layout.outputs().closest_point(location);
        self.on_pointer_moved(location);
    }

    fn on_pointer_motion_absolute(&mut self, fraction: Point<f64, Logical>) {
        let Some(bounds) = self.strata.layout.union_bounds() else {
            return;
        };

        let bounds = bounds.to_f64();
        let location = Point::new(
            bounds.loc.x + fraction.x * bounds.size.w,
            bounds.loc.y + fraction.y * bounds.size.h,
        );
        let location = self.strata.layout.outputs().closest_point(location);
        self.on_pointer_moved(location);
    }

    fn on_pointer_moved(&mut self, location: Point<f64, Logical>) {
        if let Some(grab) = &self.strata.grab {
            // While a window is being dragged, no client has pointer focus.
            self.strata.seat.set_pointer_location(location);
            self.strata.seat.clear_pointer_focus();

            let ongoing =
                grab.motion(&mut self.strata.layout, &mut self.strata.cursor_manager, location);
            if !ongoing {
                self.end_drag();
            }
            return;
        }

        self.update_pointer_focus(location);
    }

    /// Sends the pointer location to the window under it.
    pub fn update_pointer_focus(&mut self, location: Point<f64, Logical>) {
        let focus = self.strata.layout.window_under(location).and_then(|id| {
            let window = self.strata.layout.window(id)?;
            Some((id, location - window.geometry().loc.to_f64()))
        });
        self.strata.seat.pointer_motion(location, focus);
    }

    fn on_pointer_button(&mut self, button: u32, state: ButtonState) {
        self.strata.seat.update_button(button, state);

        if let Some(grab) = &self.strata.grab {
            if state == ButtonState::Released {
                self.strata.seat.cancel_button(button);
                if grab.button() == button {
                    self.end_drag();
                }
            }
            return;
        }

        if state == ButtonState::Pressed {
            let location = self.strata.seat.pointer_location();
            let under = self.strata.layout.window_under(location);

            if self.strata.mod_held {
                // Presses with the mod key held belong to the window manager.
                if let Some(id) = under {
                    self.strata.layout.focus_window(id);

                    let mode = match button {
                        BTN_LEFT => Some(GrabMode::Move),
                        BTN_RIGHT => Some(GrabMode::Resize),
                        _ => None,
                    };
                    if let Some(mode) = mode {
                        self.start_drag(id, mode, button);
                    }
                }
                return;
            }

            if button == BTN_LEFT {
                if let Some(id) = under {
                    self.strata.layout.focus_window(id);
                }
            }
        }

        self.strata.seat.pointer_button(button, state);
    }

    /// Opens a drag session unless one is already open.
    pub fn start_drag(&mut self, window: WindowId, mode: GrabMode, button: u32) {
        if self.strata.grab.is_some() {
            debug!("{window:?}: a drag session is already open");
            return;
        }

        self.strata.grab = DragGrab::start(
            &mut self.strata.layout,
            &mut self.strata.cursor_manager,
            window,
            mode,
            button,
        );

        if self.strata.grab.is_some() {
            self.strata.seat.clear_pointer_focus();
        }
    }

    pub fn end_drag(&mut self) {
        if let Some(grab) = self.strata.grab.take() {
            grab.end(&mut self.strata.layout, &mut self.strata.cursor_manager);

            let location = self.strata.seat.pointer_location();
            self.update_pointer_focus(location);
        }
    }

    /// Ends the drag session if it targets this window.
    pub fn end_drag_of(&mut self, window: WindowId) {
        if self.strata.grab.as_ref().is_some_and(|g| g.window() == window) {
            self.end_drag();
        }
    }

    fn warp_pointer_to_window_center(&mut self) {
        let Some(window) = self.strata.layout.focus() else {
            return;
        };

        let center = center(window.geometry()).to_f64();
        self.update_pointer_focus(center);
    }

    /// Keeps the pointer inside the layout after the outputs changed.
    pub fn confine_pointer(&mut self) {
        let location = self.strata.seat.pointer_location();
        let confined = self.strata.layout.outputs().closest_point(location);
        if confined != location {
            self.on_pointer_moved(confined);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn should_intercept_key(
    suppressed_keys: &mut HashSet<u32>,
    bindings: &[Bind],
    mod_key: ModKey,
    keycode: u32,
    keysym: Keysym,
    pressed: bool,
    modifiers: Modifiers,
    mod_held: bool,
) -> FilterResult<Option<Bind>> {
    // Actions are only triggered on presses, release of the key
    // shouldn't try to intercept anything unless we have marked
    // the key to be suppressed.
    if !pressed && !suppressed_keys.contains(&keycode) {
        return FilterResult::Forward;
    }

    match (find_bind(bindings, mod_key, keysym, modifiers, mod_held), pressed) {
        (Some(bind), true) => {
            suppressed_keys.insert(keycode);
            FilterResult::Intercept(Some(bind))
        }
        (_, false) => {
            // By this point, we know that the key was suppressed on press. Even if we're now not
            // matching any bind, we should continue to suppress the release.
            suppressed_keys.remove(&keycode);
            FilterResult::Intercept(None)
        }
        (None, true) => FilterResult::Forward,
    }
}

fn find_bind<'a>(
    bindings: impl IntoIterator<Item = &'a Bind>,
    mod_key: ModKey,
    keysym: Keysym,
    modifiers: Modifiers,
    mod_held: bool,
) -> Option<Bind> {
    // Binds only apply while the mod key is held.
    if !mod_held {
        return None;
    }

    let modifiers = modifiers | mod_key.to_modifiers() | Modifiers::COMPOSITOR;

    for bind in bindings {
        if bind.key.keysym != keysym {
            continue;
        }

        let mut bind_modifiers = bind.key.modifiers;
        if bind_modifiers.contains(Modifiers::COMPOSITOR) {
            bind_modifiers |= mod_key.to_modifiers();
        } else if bind_modifiers.contains(mod_key.to_modifiers()) {
            bind_modifiers |= Modifiers::COMPOSITOR;
        }

        if bind_modifiers == modifiers {
            return Some(bind.clone());
        }
    }

    None
}
