use smithay::utils::{Logical, Point};
use strata_config::Modifiers;

use super::{ButtonState, KeyState};
use crate::window::WindowId;

/// Delivers input to client surfaces.
///
/// Implemented by the protocol side, which knows how to reach the client behind a window.
pub trait InputSink {
    /// The window got keyboard focus while `keys` were held down.
    fn keyboard_enter(&mut self, window: WindowId, keys: &[u32], modifiers: Modifiers);

    fn keyboard_leave(&mut self, window: WindowId);

    fn key(&mut self, window: WindowId, keycode: u32, state: KeyState, modifiers: Modifiers);

    /// Pointer moved to `location`, relative to the window origin.
    ///
    /// `None` means that the pointer is not over any window.
    fn pointer_motion(&mut self, focus: Option<(WindowId, Point<f64, Logical>)>);

    fn pointer_button(&mut self, window: WindowId, button: u32, state: ButtonState);
}

/// Sink that drops everything, for running without clients.
#[derive(Debug, Default)]
pub struct NullSink;

impl InputSink for NullSink {
    fn keyboard_enter(&mut self, window: WindowId, _keys: &[u32], _modifiers: Modifiers) {
        trace!("{window:?}: keyboard enter");
    }

    fn keyboard_leave(&mut self, window: WindowId) {
        trace!("{window:?}: keyboard leave");
    }

    fn key(&mut self, _window: WindowId, _keycode: u32, _state: KeyState, _modifiers: Modifiers) {}

    fn pointer_motion(&mut self, _focus: Option<(WindowId, Point<f64, Logical>)>) {}

    fn pointer_button(&mut self, _window: WindowId, _button: u32, _state: ButtonState) {}
}

/// Keyboard and pointer state of the single seat.
pub struct Seat {
    name: String,
    sink: Box<dyn InputSink>,
    /// Keys forwarded to clients and not yet released.
    pressed_keys: Vec<u32>,
    pressed_buttons: Vec<u32>,
    /// Buttons whose press was forwarded to a client and not yet released.
    forwarded_buttons: Vec<u32>,
    modifiers: Modifiers,
    keyboard_focus: Option<WindowId>,
    pointer_focus: Option<WindowId>,
    pointer_location: Point<f64, Logical>,
}

impl Seat {
    pub fn new(name: String, sink: Box<dyn InputSink>) -> Self {
        Self {
            name,
            sink,
            pressed_keys: Vec::new(),
            pressed_buttons: Vec::new(),
            forwarded_buttons: Vec::new(),
            modifiers: Modifiers::empty(),
            keyboard_focus: None,
            pointer_focus: None,
            pointer_location: Point::new(0., 0.),
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn InputSink>) {
        self.sink = sink;
    }

    pub fn keyboard_focus(&self) -> Option<WindowId> {
        self.keyboard_focus
    }

    pub fn pointer_focus(&self) -> Option<WindowId> {
        self.pointer_focus
    }

    pub fn pointer_location(&self) -> Point<f64, Logical> {
        self.pointer_location
    }

    /// The first button among those currently held.
    pub fn first_pressed_button(&self) -> Option<u32> {
        self.pressed_buttons.first().copied()
    }

    pub fn set_keyboard_focus(&mut self, focus: Option<WindowId>) {
        if self.keyboard_focus == focus {
            return;
        }

        if let Some(prev) = self.keyboard_focus.take() {
            self.sink.keyboard_leave(prev);
        }

        if let Some(window) = focus {
            self.sink
                .keyboard_enter(window, &self.pressed_keys, self.modifiers);
        }

        self.keyboard_focus = focus;
    }

    /// Updates the keyboard state and forwards the key to the focused window.
    pub fn key(&mut self, keycode: u32, state: KeyState, modifiers: Modifiers) {
        self.modifiers = modifiers;

        match state {
            KeyState::Pressed => {
                if !self.pressed_keys.contains(&keycode) {
                    self.pressed_keys.push(keycode);
                }
            }
            KeyState::Released => {
                if !self.pressed_keys.contains(&keycode) {
                    // The press never reached a client.
                    return;
                }
                self.pressed_keys.retain(|key| *key != keycode);
            }
        }

        if let Some(window) = self.keyboard_focus {
            self.sink.key(window, keycode, state, modifiers);
        }
    }

    /// Remembers the pointer location without notifying any client.
    pub fn set_pointer_location(&mut self, location: Point<f64, Logical>) {
        self.pointer_location = location;
    }

    /// Moves the pointer, `focus` being the window under it with the window-local location.
    pub fn pointer_motion(&mut self, location: Point<f64, Logical>, focus: Option<(WindowId, Point<f64, Logical>)>) {
        self.pointer_location = location;
        self.pointer_focus = focus.map(|(window, _)| window);
        self.sink.pointer_motion(focus);
    }

    /// Drops pointer focus, for example while a drag session owns the pointer.
    pub fn clear_pointer_focus(&mut self) {
        if self.pointer_focus.take().is_some() {
            self.sink.pointer_motion(None);
        }
    }

    /// Tracks the button state without forwarding it to any client.
    pub fn update_button(&mut self, button: u32, state: ButtonState) {
        match state {
            ButtonState::Pressed => {
                if !self.pressed_buttons.contains(&button) {
                    self.pressed_buttons.push(button);
                }
            }
            ButtonState::Released => self.pressed_buttons.retain(|b| *b != button),
        }
    }

    /// Forwards the button to the window under the pointer.
    ///
    /// Releases are dropped unless the matching press was forwarded.
    pub fn pointer_button(&mut self, button: u32, state: ButtonState) {
        let Some(window) = self.pointer_focus else {
            return;
        };

        match state {
            ButtonState::Pressed => {
                if !self.forwarded_buttons.contains(&button) {
                    self.forwarded_buttons.push(button);
                }
            }
            ButtonState::Released => {
                if !self.forwarded_buttons.contains(&button) {
                    trace!("dropping release of button {button} that no client saw pressed");
                    return;
                }
                self.forwarded_buttons.retain(|b| *b != button);
            }
        }

        self.sink.pointer_button(window, button, state);
    }

    /// Makes sure that the release of the button does not reach any client.
    pub fn cancel_button(&mut self, button: u32) {
        self.forwarded_buttons.retain(|b| *b != button);
    }

    /// Forgets a window that no longer exists.
    ///
    /// Nothing is sent to the window since its client is gone.
    pub fn window_destroyed(&mut self, window: WindowId) {
        if self.keyboard_focus == Some(window) {
            self.keyboard_focus = None;
        }
        if self.pointer_focus == Some(window) {
            self.pointer_focus = None;
            self.forwarded_buttons.clear();
        }
    }
}

impl std::fmt::Debug for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seat")
            .field("name", &self.name)
            .field("pressed_keys", &self.pressed_keys)
            .field("pressed_buttons", &self.pressed_buttons)
            .field("forwarded_buttons", &self.forwarded_buttons)
            .field("modifiers", &self.modifiers)
            .field("keyboard_focus", &self.keyboard_focus)
            .field("pointer_focus", &self.pointer_focus)
            .field("pointer_location", &self.pointer_location)
            .finish_non_exhaustive()
    }
}
