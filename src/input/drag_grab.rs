use smithay::utils::{Logical, Point, Size};

use crate::cursor::{CursorImage, CursorManager};
use crate::layout::Layout;
use crate::window::WindowId;

/// Opacity of a window while it is being dragged.
const DRAG_OPACITY: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabMode {
    Move,
    Resize,
}

impl GrabMode {
    fn cursor_image(self) -> CursorImage {
        match self {
            GrabMode::Move => CursorImage::Move,
            GrabMode::Resize => CursorImage::Resize,
        }
    }
}

/// An interactive move or resize of one window with the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragGrab {
    window: WindowId,
    mode: GrabMode,
    button: u32,
}

impl DragGrab {
    /// Starts dragging the window, returning `None` if it cannot be dragged.
    ///
    /// Fullscreen windows are never dragged.
    pub fn start(
        layout: &mut Layout,
        cursor: &mut CursorManager,
        window: WindowId,
        mode: GrabMode,
        button: u32,
    ) -> Option<Self> {
        let Some(win) = layout.window(window) else {
            warn!("{window:?}: dragging unknown window");
            return None;
        };

        if !win.is_mapped() || win.is_fullscreen() {
            debug!("{window:?}: not dragging");
            return None;
        }

        debug!("{window:?}: starting {mode:?} grab with button {button:#x}");
        layout.set_window_opacity(window, DRAG_OPACITY);
        cursor.set_cursor_image(mode.cursor_image());

        Some(Self {
            window,
            mode,
            button,
        })
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    #[cfg(test)]
    pub fn mode(&self) -> GrabMode {
        self.mode
    }

    pub fn button(&self) -> u32 {
        self.button
    }

    /// Applies a pointer motion to the dragged window.
    ///
    /// Returns `false` if the window is gone and the grab should end.
    pub fn motion(
        &self,
        layout: &mut Layout,
        cursor: &mut CursorManager,
        location: Point<f64, Logical>,
    ) -> bool {
        let _span = tracy_client::span!("DragGrab::motion");

        let Some(window) = layout.window(self.window) else {
            return false;
        };
        if !window.is_mapped() {
            return false;
        }

        let pointer = location.to_i32_floor();
        let origin = window.geometry().loc;

        // Moving or resizing by hand ends the maximized state.
        layout.unmaximize_in_place(self.window);

        match self.mode {
            GrabMode::Move => {
                layout.center_window_at(self.window, pointer);
            }
            GrabMode::Resize => {
                let size = pointer - origin;
                layout.resize_window(self.window, Size::new(size.x.max(1), size.y.max(1)));
            }
        }

        cursor.set_cursor_image(self.mode.cursor_image());
        true
    }

    /// Ends the grab, restoring the window and the cursor.
    pub fn end(self, layout: &mut Layout, cursor: &mut CursorManager) {
        debug!("{:?}: ending {:?} grab", self.window, self.mode);
        layout.set_window_opacity(self.window, 1.);
        cursor.set_cursor_image(CursorImage::Default);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use smithay::utils::Rectangle;

    use super::*;
    use crate::tests::surface::TestSurface;

    fn layout_with_window() -> (Layout, WindowId, TestSurface) {
        let mut layout = Layout::new();
        layout.add_output(String::from("headless-1"), Size::new(1920, 1080));

        let surface = TestSurface::immediate(Size::new(200, 100));
        surface.set_preferred_location(Some(Point::new(100, 100)));
        let id = layout.add_window(surface.boxed()).unwrap();
        layout.map_window(id, Point::new(0., 0.));
        (layout, id, surface)
    }

    #[test]
    fn move_centers_window_on_pointer() {
        let (mut layout, id, _surface) = layout_with_window();
        let mut cursor = CursorManager::new();

        let grab = DragGrab::start(&mut layout, &mut cursor, id, GrabMode::Move, 0x110).unwrap();
        assert_eq!(cursor.cursor_image(), CursorImage::Move);
        assert_abs_diff_eq!(layout.window(id).unwrap().opacity(), DRAG_OPACITY);

        assert!(grab.motion(&mut layout, &mut cursor, Point::new(500.5, 400.)));
        assert_eq!(
            layout.window(id).unwrap().geometry(),
            Rectangle::new(Point::new(400, 350), Size::new(200, 100))
        );

        grab.end(&mut layout, &mut cursor);
        assert_eq!(cursor.cursor_image(), CursorImage::Default);
        assert_abs_diff_eq!(layout.window(id).unwrap().opacity(), 1.);
    }

    #[test]
    fn resize_follows_pointer_from_origin() {
        let (mut layout, id, _surface) = layout_with_window();
        let mut cursor = CursorManager::new();

        let grab = DragGrab::start(&mut layout, &mut cursor, id, GrabMode::Resize, 0x111).unwrap();
        assert_eq!(cursor.cursor_image(), CursorImage::Resize);

        grab.motion(&mut layout, &mut cursor, Point::new(400., 250.));
        assert_eq!(
            layout.window(id).unwrap().geometry(),
            Rectangle::new(Point::new(100, 100), Size::new(300, 150))
        );

        // Pointer above and left of the origin.
        grab.motion(&mut layout, &mut cursor, Point::new(50., 50.));
        assert_eq!(layout.window(id).unwrap().geometry().size, Size::new(1, 1));
    }

    #[test]
    fn dragging_unmaximizes() {
        let (mut layout, id, surface) = layout_with_window();
        let mut cursor = CursorManager::new();
        layout.set_maximized(id, true);
        assert!(surface.is_maximized());

        let grab = DragGrab::start(&mut layout, &mut cursor, id, GrabMode::Move, 0x110).unwrap();
        grab.motion(&mut layout, &mut cursor, Point::new(960., 540.));

        let window = layout.window(id).unwrap();
        assert!(!window.is_maximized());
        assert!(window.saved_geometry().is_none());
        assert!(!surface.is_maximized());
    }

    #[test]
    fn fullscreen_windows_are_not_dragged() {
        let (mut layout, id, _surface) = layout_with_window();
        let mut cursor = CursorManager::new();
        layout.set_fullscreen(id, true);

        assert!(DragGrab::start(&mut layout, &mut cursor, id, GrabMode::Move, 0x110).is_none());
        assert_eq!(cursor.cursor_image(), CursorImage::Default);
        assert_abs_diff_eq!(layout.window(id).unwrap().opacity(), 1.);
    }

    #[test]
    fn grab_ends_when_window_goes_away() {
        let (mut layout, id, _surface) = layout_with_window();
        let mut cursor = CursorManager::new();

        let grab = DragGrab::start(&mut layout, &mut cursor, id, GrabMode::Move, 0x110).unwrap();
        layout.remove_window(id);
        assert!(!grab.motion(&mut layout, &mut cursor, Point::new(10., 10.)));
    }
}
