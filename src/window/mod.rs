use std::fmt;

use smithay::utils::{Logical, Point, Rectangle, Serial, Size};

use crate::utils::id::IdCounter;

static WINDOW_ID_COUNTER: IdCounter = IdCounter::new();

/// Unique identifier of a managed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u32);

impl WindowId {
    pub fn next() -> WindowId {
        WindowId(WINDOW_ID_COUNTER.next())
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// A surface drawn as part of a window, relative to the window origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsurfaceInfo {
    pub offset: Point<i32, Logical>,
    pub size: Size<i32, Logical>,
}

/// Operations that every client protocol family must provide for its toplevel surfaces.
///
/// The window manager only talks to clients through this trait and never needs to know which
/// protocol backs a given window.
pub trait ToplevelSurface {
    /// Asks the client to close the window.
    fn close(&mut self);

    /// Informs the client about the new window location.
    ///
    /// Only protocol families where clients know their absolute position (X11) need to do
    /// anything here.
    fn move_to(&mut self, loc: Point<i32, Logical>) {
        let _ = loc;
    }

    /// Requests the client to resize its window.
    ///
    /// Returns the serial of the configure when the client has to acknowledge the new size
    /// before it becomes visible, or `None` when the request takes effect right away.
    fn request_size(&mut self, size: Size<i32, Logical>) -> Option<Serial>;

    fn set_activated(&mut self, activated: bool);

    fn set_maximized(&mut self, maximized: bool);

    fn set_fullscreen(&mut self, fullscreen: bool);

    /// Size of the most recently committed window geometry.
    fn size(&self) -> Size<i32, Logical>;

    /// Whether the window accepts input at this point, relative to the window origin.
    fn is_in_input_region(&self, point: Point<f64, Logical>) -> bool {
        let _ = point;
        true
    }

    /// Visits every surface drawn for this window, the main surface included.
    fn for_each_surface(&self, f: &mut dyn FnMut(SubsurfaceInfo)) {
        f(SubsurfaceInfo {
            offset: Point::new(0, 0),
            size: self.size(),
        });
    }

    /// Location the client asked to be placed at, if its protocol allows that.
    fn preferred_location(&self) -> Option<Point<i32, Logical>> {
        None
    }

    fn title(&self) -> Option<String> {
        None
    }
}

/// Geometry that becomes current once the client acknowledges `serial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConfigure {
    pub geometry: Rectangle<i32, Logical>,
    pub serial: Serial,
}

/// A client toplevel managed by the window manager.
pub struct Window {
    id: WindowId,
    surface: Box<dyn ToplevelSurface>,

    /// Authoritative location in layout coordinates.
    loc: Point<i32, Logical>,

    mapped: bool,
    /// Unmapped by the window manager rather than by the client.
    hidden: bool,
    /// Whether the window received its initial placement.
    placed: bool,

    is_activated: bool,
    is_maximized: bool,
    is_fullscreen: bool,
    /// Geometry to restore when leaving maximized or fullscreen.
    saved_geometry: Option<Rectangle<i32, Logical>>,

    pending: Option<PendingConfigure>,
    last_serial: Option<Serial>,

    opacity: f32,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("title", &self.surface.title())
            .field("geometry", &self.geometry())
            .field("mapped", &self.mapped)
            .field("hidden", &self.hidden)
            .field("is_activated", &self.is_activated)
            .field("is_maximized", &self.is_maximized)
            .field("is_fullscreen", &self.is_fullscreen)
            .field("pending", &self.pending)
            .finish()
    }
}

impl Window {
    pub fn new(surface: Box<dyn ToplevelSurface>) -> Self {
        let loc = surface.preferred_location().unwrap_or_default();
        Self {
            id: WindowId::next(),
            surface,
            loc,
            mapped: false,
            hidden: false,
            placed: false,
            is_activated: false,
            is_maximized: false,
            is_fullscreen: false,
            saved_geometry: None,
            pending: None,
            last_serial: None,
            opacity: 1.,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn surface(&self) -> &dyn ToplevelSurface {
        &*self.surface
    }

    pub fn surface_mut(&mut self) -> &mut dyn ToplevelSurface {
        &mut *self.surface
    }

    /// Location that is current for the client, ignoring any pending configure.
    pub fn loc(&self) -> Point<i32, Logical> {
        self.loc
    }

    /// Geometry to use for hit-testing and rendering.
    ///
    /// While a configure is pending, this is the pending geometry.
    pub fn geometry(&self) -> Rectangle<i32, Logical> {
        match &self.pending {
            Some(pending) => pending.geometry,
            None => Rectangle::new(self.loc, self.surface.size()),
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn is_activated(&self) -> bool {
        self.is_activated
    }

    pub fn is_maximized(&self) -> bool {
        self.is_maximized
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn saved_geometry(&self) -> Option<Rectangle<i32, Logical>> {
        self.saved_geometry
    }

    pub fn pending(&self) -> Option<&PendingConfigure> {
        self.pending.as_ref()
    }

    pub fn last_serial(&self) -> Option<Serial> {
        self.last_serial
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0., 1.);
    }

    pub(crate) fn set_mapped(&mut self, mapped: bool) {
        self.mapped = mapped;
        self.hidden = false;
        if mapped {
            self.placed = true;
        }
    }

    pub(crate) fn set_hidden(&mut self) {
        self.mapped = false;
        self.hidden = true;
    }

    pub(crate) fn set_activated(&mut self, activated: bool) {
        if self.is_activated != activated {
            self.is_activated = activated;
            self.surface.set_activated(activated);
        }
    }

    pub(crate) fn set_maximized_flag(&mut self, maximized: bool) {
        self.is_maximized = maximized;
    }

    pub(crate) fn set_fullscreen_flag(&mut self, fullscreen: bool) {
        self.is_fullscreen = fullscreen;
    }

    pub(crate) fn set_saved_geometry(&mut self, geometry: Option<Rectangle<i32, Logical>>) {
        self.saved_geometry = geometry;
    }

    /// Moves the window without changing its size.
    ///
    /// A pending configure moves along, so that the window does not jump back once the client
    /// acknowledges it.
    pub(crate) fn set_location(&mut self, loc: Point<i32, Logical>) {
        self.loc = loc;
        if let Some(pending) = &mut self.pending {
            pending.geometry.loc = loc;
        }
        self.surface.move_to(loc);
    }

    /// Moves and resizes the window to an already clamped geometry.
    pub(crate) fn configure(&mut self, geometry: Rectangle<i32, Logical>) {
        let serial = self.surface.request_size(geometry.size);
        self.surface.move_to(geometry.loc);

        match serial {
            Some(serial) => self.set_pending(geometry, serial),
            None => {
                if let Some(pending) = &mut self.pending {
                    pending.geometry = geometry;
                } else {
                    self.loc = geometry.loc;
                }
            }
        }
    }

    fn set_pending(&mut self, geometry: Rectangle<i32, Logical>, serial: Serial) {
        let serial = match self.last_serial {
            Some(last) if !serial.is_no_older_than(&last) => {
                warn!(
                    "{:?}: configure serial {serial:?} is older than {last:?}, keeping the newer one",
                    self.id
                );
                last
            }
            _ => serial,
        };

        trace!("{:?}: pending configure {geometry:?} with {serial:?}", self.id);
        self.last_serial = Some(serial);
        self.pending = Some(PendingConfigure { geometry, serial });
    }

    /// Processes a surface commit.
    ///
    /// `acked` is the latest configure serial acknowledged by the client, or `None` for protocol
    /// families without serials, in which case every outstanding configure counts as acknowledged.
    ///
    /// Returns whether a pending configure was applied.
    pub fn on_commit(&mut self, acked: Option<Serial>) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };

        if let Some(acked) = acked {
            if !acked.is_no_older_than(&pending.serial) {
                return false;
            }
        }

        trace!("{:?}: applying configure {:?}", self.id, pending.serial);
        self.loc = pending.geometry.loc;
        self.pending = None;
        true
    }

    /// Whether the window accepts input at this point in layout coordinates.
    pub fn accepts_input_at(&self, point: Point<f64, Logical>) -> bool {
        let geo = self.geometry();
        geo.to_f64().contains(point)
            && self
                .surface
                .is_in_input_region(point - geo.loc.to_f64())
    }

    /// Rectangles of every surface drawn for this window, in layout coordinates.
    pub fn surface_rects(&self) -> Vec<Rectangle<i32, Logical>> {
        let loc = self.geometry().loc;
        let mut rects = Vec::new();
        self.surface.for_each_surface(&mut |info| {
            rects.push(Rectangle::new(loc + info.offset, info.size));
        });
        rects
    }

    pub fn close(&mut self) {
        debug!("{:?}: requesting close", self.id);
        self.surface.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::surface::TestSurface;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn window_ids_are_unique() {
        assert_ne!(WindowId::next(), WindowId::next());
    }

    #[test]
    fn pending_geometry_until_acked() {
        let surface = TestSurface::with_serials(Size::new(100, 100));
        let mut window = Window::new(Box::new(surface.clone()));

        window.configure(rect(10, 20, 300, 200));
        let serial = window.pending().unwrap().serial;
        assert_eq!(window.geometry(), rect(10, 20, 300, 200));
        assert_eq!(window.loc(), Point::new(0, 0));

        // An older ack does not apply the configure.
        assert!(!window.on_commit(Some(Serial::from(u32::from(serial) - 1))));
        assert_eq!(window.geometry(), rect(10, 20, 300, 200));

        surface.ack_and_commit();
        assert!(window.on_commit(Some(serial)));
        assert!(window.pending().is_none());
        assert_eq!(window.geometry(), rect(10, 20, 300, 200));
    }

    #[test]
    fn commit_without_serial_acks_everything() {
        let surface = TestSurface::with_serials(Size::new(100, 100));
        let mut window = Window::new(Box::new(surface.clone()));

        window.configure(rect(10, 20, 300, 200));
        window.configure(rect(30, 40, 300, 200));
        surface.ack_and_commit();
        assert!(window.on_commit(None));
        assert_eq!(window.loc(), Point::new(30, 40));
    }

    #[test]
    fn move_during_pending_configure_moves_both() {
        let surface = TestSurface::with_serials(Size::new(100, 100));
        let mut window = Window::new(Box::new(surface.clone()));

        window.configure(rect(10, 20, 300, 200));
        window.set_location(Point::new(50, 60));
        assert_eq!(window.loc(), Point::new(50, 60));
        assert_eq!(window.geometry(), rect(50, 60, 300, 200));

        surface.ack_and_commit();
        window.on_commit(None);
        assert_eq!(window.geometry(), rect(50, 60, 300, 200));
    }

    #[test]
    fn immediate_configure_applies_location() {
        let surface = TestSurface::immediate(Size::new(100, 100));
        let mut window = Window::new(Box::new(surface.clone()));

        window.configure(rect(10, 20, 300, 200));
        assert!(window.pending().is_none());
        assert_eq!(window.geometry(), rect(10, 20, 300, 200));
        assert_eq!(surface.location(), Point::new(10, 20));
    }

    #[test]
    fn older_serial_does_not_replace_newer() {
        let surface = TestSurface::with_serials(Size::new(100, 100));
        let mut window = Window::new(Box::new(surface.clone()));

        window.configure(rect(0, 0, 200, 200));
        let first = window.pending().unwrap().serial;

        surface.rewind_serials(10);
        window.configure(rect(0, 0, 300, 300));

        let pending = window.pending().unwrap();
        assert_eq!(pending.serial, first);
        assert_eq!(pending.geometry, rect(0, 0, 300, 300));
    }

    #[test]
    fn surface_rects_follow_geometry() {
        let surface = TestSurface::immediate(Size::new(100, 50));
        surface.add_subsurface(Point::new(10, -5), Size::new(20, 5));
        let mut window = Window::new(Box::new(surface));
        window.set_location(Point::new(100, 100));

        assert_eq!(
            window.surface_rects(),
            vec![rect(100, 100, 100, 50), rect(110, 95, 20, 5)]
        );
    }

    #[test]
    fn input_region_is_respected() {
        let surface = TestSurface::immediate(Size::new(100, 100));
        surface.set_input_region(Some(Rectangle::new(Point::new(0, 0), Size::new(50, 50))));
        let window = Window::new(Box::new(surface));

        assert!(window.accepts_input_at(Point::new(10., 10.)));
        assert!(!window.accepts_input_at(Point::new(60., 60.)));
        assert!(!window.accepts_input_at(Point::new(150., 10.)));
    }
}
