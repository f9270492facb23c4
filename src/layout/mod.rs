//! Window layout logic.
//!
//! Strata is a stacking window manager. Windows float freely over a horizontal strip of outputs
//! and overlap each other in stacking order.
//!
//! The layout keeps the following invariants:
//!
//! 1. At most one window is focused, and only the focused window is activated.
//! 2. The focused window is mapped.
//! 3. Window locations stay inside the bounding box of the enabled outputs. Geometry operations
//!    clamp the full window rectangle into it; windows larger than the bounding box are pinned to
//!    its top-left corner.
//! 4. Mapped windows come before unmapped windows in the stacking order.
//!
//! When there are no enabled outputs, nothing is clamped.
//!
//! Geometry changes may need to be acknowledged by the client before they become visible, see
//! [`Window::on_commit()`]. Until then, the pending geometry is used for everything. A client that
//! never acknowledges keeps its pending geometry indefinitely.

use smithay::utils::{Logical, Point, Rectangle, Serial, Size};

use crate::utils::clamp_preferring_min;
use crate::window::{ToplevelSurface, Window, WindowId};

pub mod output;
pub mod stack;


use self::output::OutputLayout;
use self::stack::WindowStack;

/// Half of an output to snap a window to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapSide {
    Left,
    Right,
}

/// Window to draw, in back-to-front order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderElement {
    pub id: WindowId,
    pub geometry: Rectangle<i32, Logical>,
    pub alpha: f32,
    /// Every surface of the window, in layout coordinates.
    pub surfaces: Vec<Rectangle<i32, Logical>>,
}

#[derive(Debug, Default)]
pub struct Layout {
    outputs: OutputLayout,
    windows: WindowStack,
    /// Window with keyboard focus.
    focus: Option<WindowId>,
    /// Windows in the order they were focused, most recent first.
    recent: Vec<WindowId>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> &OutputLayout {
        &self.outputs
    }

    pub fn windows(&self) -> &WindowStack {
        &self.windows
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    pub fn focus_id(&self) -> Option<WindowId> {
        self.focus
    }

    pub fn focus(&self) -> Option<&Window> {
        self.focus.and_then(|id| self.windows.get(id))
    }

    pub fn union_bounds(&self) -> Option<Rectangle<i32, Logical>> {
        self.outputs.union_bounds()
    }

    pub fn add_output(&mut self, name: String, size: Size<i32, Logical>) {
        let changed = self.outputs.add_output(name, size);
        self.on_outputs_changed(changed);
    }

    pub fn remove_output(&mut self, name: &str) {
        let changed = self.outputs.remove_output(name);
        self.on_outputs_changed(changed);
    }

    pub fn set_output_enabled(&mut self, name: &str, enabled: bool) {
        let changed = self.outputs.set_enabled(name, enabled);
        self.on_outputs_changed(changed);
    }

    pub fn set_primary_output(&mut self, name: Option<String>) {
        let changed = self.outputs.set_primary(name);
        self.on_outputs_changed(changed);
    }

    pub fn toggle_primary_output(&mut self) {
        let changed = self.outputs.toggle_primary();
        self.on_outputs_changed(changed);
    }

    fn on_outputs_changed(&mut self, changed: bool) {
        if changed {
            self.revalidate_windows();
        }
    }

    /// Moves windows that ended up outside of the layout to its origin.
    fn revalidate_windows(&mut self) {
        let _span = tracy_client::span!("Layout::revalidate_windows");

        let Some(bounds) = self.outputs.union_bounds() else {
            return;
        };

        for window in self.windows.windows_mut() {
            let loc = window.geometry().loc;
            if !bounds.contains(loc) {
                debug!("{:?}: outside of the layout, moving to {:?}", window.id(), bounds.loc);
                window.set_location(bounds.loc);
            }
        }
    }

    /// Starts managing a new client window. It stays invisible until mapped.
    pub fn add_window(&mut self, surface: Box<dyn ToplevelSurface>) -> Option<WindowId> {
        self.windows.add(surface)
    }

    /// Shows a window in front of every other window and focuses it.
    ///
    /// On the first map, the window is placed at its preferred location if it has one, otherwise
    /// it is centered on `cursor`.
    pub fn map_window(&mut self, id: WindowId, cursor: Point<f64, Logical>) -> bool {
        let Some(window) = self.windows.get(id) else {
            warn!("{id:?}: mapping unknown window");
            return false;
        };

        if !window.is_placed() {
            match window.surface().preferred_location() {
                Some(loc) => self.move_window(id, loc),
                None => self.center_window_at(id, cursor.to_i32_floor()),
            };
        }

        self.windows.map(id);
        self.activate_window(id);
        true
    }

    /// Hides a window on behalf of its client.
    pub fn unmap_window(&mut self, id: WindowId) -> bool {
        if !self.windows.unmap(id) {
            return false;
        }
        self.focus_next_if_lost(id);
        true
    }

    /// Hides a window on behalf of the user. It can be brought back with
    /// [`Layout::show_all_windows()`].
    pub fn hide_window(&mut self, id: WindowId) -> bool {
        if self.windows.get(id).is_some_and(|w| !w.is_mapped()) {
            return false;
        }

        if !self.windows.hide(id) {
            return false;
        }
        self.focus_next_if_lost(id);
        true
    }

    /// Maps every hidden window back, preserving their relative stacking order.
    pub fn show_all_windows(&mut self) {
        let hidden: Vec<_> = self
            .windows
            .windows()
            .rev()
            .filter(|w| w.is_hidden())
            .map(|w| w.id())
            .collect();

        if hidden.is_empty() {
            return;
        }

        for id in hidden {
            self.windows.map(id);
        }

        if let Some(id) = self.windows.focus_candidate().map(|w| w.id()) {
            self.activate_window(id);
        }
    }

    /// Stops managing a window.
    pub fn remove_window(&mut self, id: WindowId) -> Option<Window> {
        let mut next_focus = None;
        if self.focus == Some(id) {
            next_focus = self
                .windows
                .mapped()
                .find(|w| w.id() != id)
                .map(|w| w.id());
        }

        let window = self.windows.remove(id)?;
        self.recent.retain(|recent| *recent != id);

        if self.focus == Some(id) {
            self.focus = None;
            if let Some(next) = next_focus {
                self.activate_window(next);
            }
        }

        Some(window)
    }

    /// Moves focus to the topmost mapped window if `id` is focused but no longer mapped.
    fn focus_next_if_lost(&mut self, id: WindowId) {
        if self.focus != Some(id) {
            return;
        }

        match self.windows.focus_candidate().map(|w| w.id()) {
            Some(next) => {
                self.activate_window(next);
            }
            None => self.clear_focus(),
        }
    }

    pub fn raise_window(&mut self, id: WindowId) -> bool {
        self.windows.raise(id)
    }

    /// Gives keyboard focus and activation to the window.
    ///
    /// Does nothing if the window is already focused.
    pub fn activate_window(&mut self, id: WindowId) -> bool {
        if self.focus == Some(id) {
            return true;
        }

        match self.windows.get(id) {
            Some(window) if window.is_mapped() => (),
            Some(_) => {
                debug!("{id:?}: not focusing unmapped window");
                return false;
            }
            None => {
                warn!("{id:?}: focusing unknown window");
                return false;
            }
        }

        if let Some(prev) = self.focus.take() {
            if let Some(window) = self.windows.get_mut(prev) {
                window.set_activated(false);
            }
        }

        if let Some(window) = self.windows.get_mut(id) {
            window.set_activated(true);
        }

        trace!("{id:?}: focused");
        self.focus = Some(id);
        self.recent.retain(|recent| *recent != id);
        self.recent.insert(0, id);
        true
    }

    /// Raises and focuses the window.
    pub fn focus_window(&mut self, id: WindowId) -> bool {
        self.raise_window(id) && self.activate_window(id)
    }

    pub fn clear_focus(&mut self) {
        if let Some(prev) = self.focus.take() {
            if let Some(window) = self.windows.get_mut(prev) {
                window.set_activated(false);
            }
        }
    }

    /// Focuses the most recently used window other than the focused one.
    ///
    /// Fullscreen windows are skipped.
    pub fn focus_previous_window(&mut self) -> bool {
        let next = self.recent.iter().copied().find(|id| {
            Some(*id) != self.focus
                && self
                    .windows
                    .get(*id)
                    .is_some_and(|w| w.is_mapped() && !w.is_fullscreen())
        });

        match next {
            Some(id) => self.focus_window(id),
            None => false,
        }
    }

    /// Frontmost mapped window accepting input at the point.
    pub fn window_under(&self, point: Point<f64, Logical>) -> Option<WindowId> {
        self.windows.window_under(point).map(|w| w.id())
    }

    /// Clamps a location so that a window of this size stays inside the layout.
    fn clamp_location(&self, loc: Point<i32, Logical>, size: Size<i32, Logical>) -> Point<i32, Logical> {
        let Some(bounds) = self.outputs.union_bounds() else {
            return loc;
        };

        Point::new(
            clamp_preferring_min(loc.x, bounds.loc.x, bounds.loc.x + bounds.size.w - size.w.max(1)),
            clamp_preferring_min(loc.y, bounds.loc.y, bounds.loc.y + bounds.size.h - size.h.max(1)),
        )
    }

    pub fn move_window(&mut self, id: WindowId, loc: Point<i32, Logical>) -> bool {
        let Some(window) = self.windows.get(id) else {
            warn!("{id:?}: moving unknown window");
            return false;
        };

        let loc = self.clamp_location(loc, window.geometry().size);
        if let Some(window) = self.windows.get_mut(id) {
            window.set_location(loc);
        }
        true
    }

    /// Resizes the window, keeping its location.
    ///
    /// The size is cut so that the window does not extend past the right and bottom edges of the
    /// layout.
    pub fn resize_window(&mut self, id: WindowId, size: Size<i32, Logical>) -> bool {
        let Some(window) = self.windows.get(id) else {
            warn!("{id:?}: resizing unknown window");
            return false;
        };

        let loc = window.geometry().loc;
        let mut size = size;
        if let Some(bounds) = self.outputs.union_bounds() {
            size.w = size.w.min(bounds.loc.x + bounds.size.w - loc.x);
            size.h = size.h.min(bounds.loc.y + bounds.size.h - loc.y);
        }
        let size = Size::new(size.w.max(1), size.h.max(1));

        if let Some(window) = self.windows.get_mut(id) {
            window.configure(Rectangle::new(loc, size));
        }
        true
    }

    /// Moves and resizes the window in one step.
    ///
    /// The size is limited to the layout size first, then the location is clamped as for
    /// [`Layout::move_window()`].
    pub fn move_resize_window(&mut self, id: WindowId, geometry: Rectangle<i32, Logical>) -> bool {
        if self.windows.get(id).is_none() {
            warn!("{id:?}: configuring unknown window");
            return false;
        }

        let mut size = geometry.size;
        if let Some(bounds) = self.outputs.union_bounds() {
            size.w = size.w.min(bounds.size.w);
            size.h = size.h.min(bounds.size.h);
        }
        let size = Size::new(size.w.max(1), size.h.max(1));
        let loc = self.clamp_location(geometry.loc, size);

        if let Some(window) = self.windows.get_mut(id) {
            window.configure(Rectangle::new(loc, size));
        }
        true
    }

    /// Centers the window on the point, keeping it inside the layout.
    pub fn center_window_at(&mut self, id: WindowId, point: Point<i32, Logical>) -> bool {
        let Some(window) = self.windows.get(id) else {
            warn!("{id:?}: centering unknown window");
            return false;
        };

        let loc = point - window.geometry().size.downscale(2).to_point();
        self.move_window(id, loc)
    }

    /// Rectangle of the output that the window belongs to.
    fn output_geometry_for(&self, window: &Window) -> Option<Rectangle<i32, Logical>> {
        self.outputs
            .output_for_point(window.geometry().loc)
            .and_then(|o| o.geometry())
    }

    pub fn set_maximized(&mut self, id: WindowId, maximized: bool) -> bool {
        let Some(window) = self.windows.get(id) else {
            warn!("{id:?}: maximizing unknown window");
            return false;
        };

        if window.is_maximized() == maximized {
            return true;
        }

        if maximized {
            let Some(target) = self.output_geometry_for(window) else {
                debug!("{id:?}: no output to maximize on");
                return false;
            };

            let Some(window) = self.windows.get_mut(id) else {
                return false;
            };

            if window.is_fullscreen() {
                // Keep the windowed restore point from before going fullscreen.
                window.set_fullscreen_flag(false);
                window.surface_mut().set_fullscreen(false);
            } else {
                window.set_saved_geometry(Some(window.geometry()));
            }

            window.configure(target);
            window.surface_mut().set_maximized(true);
            window.set_maximized_flag(true);
        } else {
            let Some(window) = self.windows.get_mut(id) else {
                return false;
            };

            window.set_maximized_flag(false);
            window.surface_mut().set_maximized(false);
            self.restore_saved_geometry(id);
        }

        true
    }

    pub fn set_fullscreen(&mut self, id: WindowId, fullscreen: bool) -> bool {
        let Some(window) = self.windows.get(id) else {
            warn!("{id:?}: fullscreening unknown window");
            return false;
        };

        if window.is_fullscreen() == fullscreen {
            return true;
        }

        if fullscreen {
            let Some(target) = self.output_geometry_for(window) else {
                debug!("{id:?}: no output to fullscreen on");
                return false;
            };

            let Some(window) = self.windows.get_mut(id) else {
                return false;
            };

            if window.is_maximized() {
                // Keep the windowed restore point from before maximizing.
                window.set_maximized_flag(false);
                window.surface_mut().set_maximized(false);
            } else {
                window.set_saved_geometry(Some(window.geometry()));
            }

            window.configure(target);
            window.surface_mut().set_fullscreen(true);
            window.set_fullscreen_flag(true);
        } else {
            let Some(window) = self.windows.get_mut(id) else {
                return false;
            };

            window.set_fullscreen_flag(false);
            window.surface_mut().set_fullscreen(false);
            self.restore_saved_geometry(id);
        }

        true
    }

    /// Puts the window back where it was before maximizing or going fullscreen.
    ///
    /// If the outputs changed in the meantime and the saved location is no longer inside the
    /// layout, the window goes to the layout origin.
    fn restore_saved_geometry(&mut self, id: WindowId) {
        let bounds = self.outputs.union_bounds();
        let Some(window) = self.windows.get_mut(id) else {
            return;
        };
        let Some(mut saved) = window.saved_geometry() else {
            return;
        };

        if let Some(bounds) = bounds {
            if !bounds.contains(saved.loc) {
                saved.loc = bounds.loc;
            }
        }

        window.set_saved_geometry(None);
        window.configure(saved);
    }

    pub fn toggle_maximized(&mut self, id: WindowId) -> bool {
        match self.windows.get(id) {
            Some(window) if window.is_fullscreen() => {
                debug!("{id:?}: not toggling maximize of fullscreen window");
                false
            }
            Some(window) => {
                let maximized = window.is_maximized();
                self.set_maximized(id, !maximized)
            }
            None => false,
        }
    }

    pub fn toggle_fullscreen(&mut self, id: WindowId) -> bool {
        match self.windows.get(id) {
            Some(window) => {
                let fullscreen = window.is_fullscreen();
                self.set_fullscreen(id, !fullscreen)
            }
            None => false,
        }
    }

    /// Leaves maximized state without restoring the saved geometry.
    ///
    /// Used when the user starts moving or resizing the window by hand.
    pub fn unmaximize_in_place(&mut self, id: WindowId) {
        if let Some(window) = self.windows.get_mut(id) {
            if window.is_maximized() {
                window.set_maximized_flag(false);
                window.surface_mut().set_maximized(false);
                window.set_saved_geometry(None);
            }
        }
    }

    /// Fits the window into the left or right half of its output.
    pub fn snap_window(&mut self, id: WindowId, side: SnapSide) -> bool {
        let Some(window) = self.windows.get(id) else {
            warn!("{id:?}: snapping unknown window");
            return false;
        };

        if window.is_fullscreen() {
            debug!("{id:?}: not snapping fullscreen window");
            return false;
        }

        let Some(output) = self.output_geometry_for(window) else {
            return false;
        };

        let left = output.size.w / 2;
        let target = match side {
            SnapSide::Left => Rectangle::new(output.loc, Size::new(left, output.size.h)),
            SnapSide::Right => Rectangle::new(
                output.loc + Point::new(left, 0),
                Size::new(output.size.w - left, output.size.h),
            ),
        };

        self.unmaximize_in_place(id);
        self.move_resize_window(id, target)
    }

    pub fn set_window_opacity(&mut self, id: WindowId, opacity: f32) {
        if let Some(window) = self.windows.get_mut(id) {
            window.set_opacity(opacity);
        }
    }

    pub fn close_window(&mut self, id: WindowId) {
        match self.windows.get_mut(id) {
            Some(window) => window.close(),
            None => warn!("{id:?}: closing unknown window"),
        }
    }

    /// Processes a surface commit of the window.
    pub fn on_commit(&mut self, id: WindowId, acked: Option<Serial>) -> bool {
        match self.windows.get_mut(id) {
            Some(window) => window.on_commit(acked),
            None => {
                warn!("{id:?}: commit for unknown window");
                false
            }
        }
    }

    /// Mapped windows to draw, back to front.
    pub fn render_elements(&self) -> Vec<RenderElement> {
        let _span = tracy_client::span!("Layout::render_elements");

        self.windows
            .mapped()
            .rev()
            .map(|window| RenderElement {
                id: window.id(),
                geometry: window.geometry(),
                alpha: window.opacity(),
                surfaces: window.surface_rects(),
            })
            .collect()
    }

    #[cfg(test)]
    pub fn verify_invariants(&self) {
        self.outputs.verify_invariants();
        self.windows.verify_invariants();

        if let Some(id) = self.focus {
            let window = self
                .windows
                .get(id)
                .expect("focused window must be managed");
            assert!(window.is_mapped(), "focused window must be mapped");
        }

        for window in self.windows.windows() {
            assert_eq!(
                window.is_activated(),
                self.focus == Some(window.id()),
                "only the focused window must be activated"
            );
            assert!(
                !(window.is_maximized() && window.is_fullscreen()),
                "maximized and fullscreen are mutually exclusive"
            );
            if window.is_maximized() || window.is_fullscreen() {
                assert!(window.saved_geometry().is_some());
            }
        }

        for id in &self.recent {
            assert!(
                self.windows.get(*id).is_some(),
                "focus history must only contain managed windows"
            );
        }

        if let Some(bounds) = self.outputs.union_bounds() {
            for window in self.windows.windows().filter(|w| w.is_placed()) {
                assert!(
                    bounds.contains(window.geometry().loc),
                    "window location must be inside the layout: {window:?}, {bounds:?}"
                );
            }
        }
    }
}
