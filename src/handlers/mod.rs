//! Reactions to requests coming from clients.
//!
//! Every protocol family translates its own requests into calls of [`ToplevelHandler`].

use smithay::utils::{Logical, Rectangle, Serial};

use crate::input::drag_grab::GrabMode;
use crate::strata::State;
use crate::window::{ToplevelSurface, WindowId};

pub trait ToplevelHandler {
    /// A client created a toplevel. It is invisible until the client maps it.
    ///
    /// Returns `None` if the window could not be registered.
    fn new_toplevel(&mut self, surface: Box<dyn ToplevelSurface>) -> Option<WindowId>;

    fn map_toplevel(&mut self, window: WindowId);

    fn unmap_toplevel(&mut self, window: WindowId);

    /// The client committed its surface.
    ///
    /// `acked` is the last configure serial the client acknowledged, if its protocol family has
    /// serials.
    fn commit(&mut self, window: WindowId, acked: Option<Serial>);

    fn toplevel_destroyed(&mut self, window: WindowId);

    /// The client asked to be moved interactively, usually after a press on its title bar.
    fn move_request(&mut self, window: WindowId);

    /// The client asked to be resized interactively.
    fn resize_request(&mut self, window: WindowId);

    /// The client asked for a specific geometry, as X11 clients do.
    fn configure_request(&mut self, window: WindowId, geometry: Rectangle<i32, Logical>);

    fn maximize_request(&mut self, window: WindowId, maximized: bool);

    fn fullscreen_request(&mut self, window: WindowId, fullscreen: bool);
}

impl ToplevelHandler for State {
    fn new_toplevel(&mut self, surface: Box<dyn ToplevelSurface>) -> Option<WindowId> {
        let title = surface.title();
        let id = self.strata.layout.add_window(surface)?;
        debug!("{id:?}: new toplevel {title:?}");
        self.update_keyboard_focus();
        Some(id)
    }

    fn map_toplevel(&mut self, window: WindowId) {
        let cursor = self.strata.seat.pointer_location();
        if self.strata.layout.map_window(window, cursor) {
            // The new window may now be under the pointer.
            self.update_pointer_focus(cursor);
        }
        self.update_keyboard_focus();
    }

    fn unmap_toplevel(&mut self, window: WindowId) {
        self.end_drag_of(window);
        if self.strata.layout.unmap_window(window) {
            let cursor = self.strata.seat.pointer_location();
            self.update_pointer_focus(cursor);
        }
        self.update_keyboard_focus();
    }

    fn commit(&mut self, window: WindowId, acked: Option<Serial>) {
        let _span = tracy_client::span!("ToplevelHandler::commit");

        if self.strata.layout.on_commit(window, acked) {
            trace!("{window:?}: configure acknowledged");
        }
        self.update_keyboard_focus();
    }

    fn toplevel_destroyed(&mut self, window: WindowId) {
        self.end_drag_of(window);
        self.strata.seat.window_destroyed(window);

        if self.strata.layout.remove_window(window).is_some() {
            let cursor = self.strata.seat.pointer_location();
            self.update_pointer_focus(cursor);
        }
        self.update_keyboard_focus();
    }

    fn move_request(&mut self, window: WindowId) {
        self.start_client_drag(window, GrabMode::Move);
        self.update_keyboard_focus();
    }

    fn resize_request(&mut self, window: WindowId) {
        self.start_client_drag(window, GrabMode::Resize);
        self.update_keyboard_focus();
    }

    fn configure_request(&mut self, window: WindowId, geometry: Rectangle<i32, Logical>) {
        match self.strata.layout.window(window) {
            None => warn!("{window:?}: configure request for unknown window"),
            // Maximized and fullscreen windows keep their geometry.
            Some(win) if win.is_maximized() || win.is_fullscreen() => {
                debug!("{window:?}: ignoring configure request");
            }
            Some(_) => {
                self.strata.layout.move_resize_window(window, geometry);
            }
        }
        self.update_keyboard_focus();
    }

    fn maximize_request(&mut self, window: WindowId, maximized: bool) {
        self.end_drag_of(window);
        self.strata.layout.set_maximized(window, maximized);
        self.update_keyboard_focus();
    }

    fn fullscreen_request(&mut self, window: WindowId, fullscreen: bool) {
        self.end_drag_of(window);
        self.strata.layout.set_fullscreen(window, fullscreen);
        self.update_keyboard_focus();
    }
}

impl State {
    /// Opens a drag session on behalf of a client.
    ///
    /// Only the focused window can start one, and only while a pointer button is held.
    fn start_client_drag(&mut self, window: WindowId, mode: GrabMode) {
        if self.strata.layout.focus_id() != Some(window) {
            debug!("{window:?}: ignoring {mode:?} request from unfocused window");
            return;
        }

        let Some(button) = self.strata.seat.first_pressed_button() else {
            debug!("{window:?}: ignoring {mode:?} request without a pressed button");
            return;
        };

        self.start_drag(window, mode, button);
    }
}
