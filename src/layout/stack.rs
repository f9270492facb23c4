use smithay::utils::{Logical, Point};

use crate::window::{ToplevelSurface, Window, WindowId};

/// Every managed window, in stacking order.
///
/// Index 0 is the frontmost window. Mapped windows always come before unmapped ones, so
/// remapping windows restores them in the order they were unmapped in.
#[derive(Debug, Default)]
pub struct WindowStack {
    windows: Vec<Window>,
}

impl WindowStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts managing a new, unmapped window.
    ///
    /// Returns `None` if there is no memory to track the window; the surface is dropped then.
    pub fn add(&mut self, surface: Box<dyn ToplevelSurface>) -> Option<WindowId> {
        if let Err(err) = self.windows.try_reserve(1) {
            warn!("dropping new window: {err}");
            return None;
        }

        let window = Window::new(surface);
        let id = window.id();
        debug!("{id:?}: created");
        self.windows.push(window);
        Some(id)
    }

    pub fn idx_of(&self, id: WindowId) -> Option<usize> {
        self.windows.iter().position(|w| w.id() == id)
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.iter().find(|w| w.id() == id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    /// All windows, front to back.
    pub fn windows(&self) -> impl DoubleEndedIterator<Item = &Window> + '_ {
        self.windows.iter()
    }

    pub fn windows_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Window> + '_ {
        self.windows.iter_mut()
    }

    /// Mapped windows, front to back.
    pub fn mapped(&self) -> impl DoubleEndedIterator<Item = &Window> + '_ {
        self.windows.iter().filter(|w| w.is_mapped())
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Marks the window mapped and puts it in front of every other window.
    pub fn map(&mut self, id: WindowId) -> bool {
        let Some(idx) = self.idx_of(id) else {
            warn!("{id:?}: mapping unknown window");
            return false;
        };

        let mut window = self.windows.remove(idx);
        window.set_mapped(true);
        self.windows.insert(0, window);
        true
    }

    /// Marks the window unmapped and puts it right behind the backmost mapped window.
    pub fn unmap(&mut self, id: WindowId) -> bool {
        self.unmap_with(id, |w| w.set_mapped(false))
    }

    /// Unmaps the window on behalf of the window manager rather than the client.
    pub fn hide(&mut self, id: WindowId) -> bool {
        self.unmap_with(id, Window::set_hidden)
    }

    fn unmap_with(&mut self, id: WindowId, f: impl FnOnce(&mut Window)) -> bool {
        let Some(idx) = self.idx_of(id) else {
            warn!("{id:?}: unmapping unknown window");
            return false;
        };

        let mut window = self.windows.remove(idx);
        f(&mut window);

        let insert_idx = self
            .windows
            .iter()
            .rposition(|w| w.is_mapped())
            .map_or(0, |idx| idx + 1);
        self.windows.insert(insert_idx, window);
        true
    }

    /// Stops managing the window.
    pub fn remove(&mut self, id: WindowId) -> Option<Window> {
        let Some(idx) = self.idx_of(id) else {
            warn!("{id:?}: removing unknown window");
            return None;
        };

        debug!("{id:?}: destroyed");
        Some(self.windows.remove(idx))
    }

    /// Moves a mapped window to the front without touching focus.
    pub fn raise(&mut self, id: WindowId) -> bool {
        let Some(idx) = self.idx_of(id) else {
            warn!("{id:?}: raising unknown window");
            return false;
        };

        if !self.windows[idx].is_mapped() {
            debug!("{id:?}: not raising unmapped window");
            return false;
        }

        if idx != 0 {
            let window = self.windows.remove(idx);
            self.windows.insert(0, window);
        }
        true
    }

    /// Frontmost mapped window.
    pub fn focus_candidate(&self) -> Option<&Window> {
        self.mapped().next()
    }

    /// Backmost mapped window.
    pub fn last_mapped(&self) -> Option<&Window> {
        self.mapped().next_back()
    }

    /// Frontmost mapped window that accepts input at this point.
    pub fn window_under(&self, point: Point<f64, Logical>) -> Option<&Window> {
        self.mapped().find(|w| w.accepts_input_at(point))
    }

    #[cfg(test)]
    pub fn verify_invariants(&self) {
        let first_unmapped = self
            .windows
            .iter()
            .position(|w| !w.is_mapped())
            .unwrap_or(self.windows.len());
        assert!(
            self.windows[first_unmapped..].iter().all(|w| !w.is_mapped()),
            "mapped windows must come before unmapped ones"
        );

        let mut ids = std::collections::HashSet::new();
        for window in &self.windows {
            assert!(ids.insert(window.id()), "window ids must be unique");
            if window.is_hidden() {
                assert!(!window.is_mapped());
            }
        }
    }
}
