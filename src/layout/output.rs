//! Output placement.
//!
//! Enabled outputs are laid out as a horizontal strip with their top edges at y = 0. Placement is
//! recomputed from scratch on every change: outputs are walked in reverse registry order, each one
//! placed right after the previous. The primary output sits first in the registry, so it always
//! ends up rightmost.

use smithay::utils::{Logical, Point, Rectangle, Size};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    name: String,
    size: Size<i32, Logical>,
    enabled: bool,
    /// Location in the layout, present while the output is enabled.
    loc: Option<Point<i32, Logical>>,
}

impl Output {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> Size<i32, Logical> {
        self.size
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Rectangle in layout coordinates, if the output is part of the layout.
    pub fn geometry(&self) -> Option<Rectangle<i32, Logical>> {
        self.loc.map(|loc| Rectangle::new(loc, self.size))
    }
}

#[derive(Debug, Default)]
pub struct OutputLayout {
    /// Registry order, primary output first.
    outputs: Vec<Output>,
    /// Name of the output that should be pinned rightmost.
    primary: Option<String>,
}

impl OutputLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> + '_ {
        self.outputs.iter()
    }

    pub fn find(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Output> {
        self.outputs.iter_mut().find(|o| o.name == name)
    }

    /// Adds an output, or updates the size of an existing one with the same name.
    ///
    /// Returns whether the placement changed.
    pub fn add_output(&mut self, name: String, size: Size<i32, Logical>) -> bool {
        if let Some(output) = self.find_mut(&name) {
            debug!("output {name} changed size to {size:?}");
            output.size = size;
        } else {
            debug!("adding output {name} with size {size:?}");
            self.outputs.push(Output {
                name,
                size,
                enabled: true,
                loc: None,
            });
        }

        self.reposition()
    }

    /// Removes an output from the registry.
    ///
    /// Returns whether the placement changed.
    pub fn remove_output(&mut self, name: &str) -> bool {
        let Some(idx) = self.outputs.iter().position(|o| o.name == name) else {
            warn!("removing unknown output {name}");
            return false;
        };

        debug!("removing output {name}");
        self.outputs.remove(idx);
        self.reposition()
    }

    /// Enables or disables an output, keeping it in the registry.
    ///
    /// Returns whether the placement changed.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let Some(output) = self.find_mut(name) else {
            warn!("setting enabled state of unknown output {name}");
            return false;
        };

        if output.enabled == enabled {
            return false;
        }

        debug!("output {name}: enabled = {enabled}");
        output.enabled = enabled;
        self.reposition()
    }

    /// Sets the name of the output that should be placed rightmost.
    ///
    /// Returns whether the placement changed.
    pub fn set_primary(&mut self, name: Option<String>) -> bool {
        if self.primary == name {
            return false;
        }

        self.primary = name;
        self.reposition()
    }

    /// Name of the primary output: the configured one if connected, otherwise the first one.
    pub fn primary_name(&self) -> Option<&str> {
        self.outputs.first().map(|o| o.name.as_str())
    }

    /// Flips the enabled state of the primary output.
    ///
    /// Refuses to disable the last enabled output. Returns whether the placement changed.
    pub fn toggle_primary(&mut self) -> bool {
        let Some(primary) = self.outputs.first() else {
            return false;
        };

        let enable = !primary.enabled;
        if !enable && self.outputs.iter().filter(|o| o.enabled).count() == 1 {
            debug!("not disabling {}: it is the last enabled output", primary.name);
            return false;
        }

        let name = primary.name.clone();
        self.set_enabled(&name, enable)
    }

    /// Recomputes output placement.
    ///
    /// Returns whether any output moved, appeared or disappeared.
    fn reposition(&mut self) -> bool {
        let _span = tracy_client::span!("OutputLayout::reposition");

        let before: Vec<_> = self.outputs.iter().map(|o| o.geometry()).collect();

        if let Some(primary) = &self.primary {
            if let Some(idx) = self.outputs.iter().position(|o| &o.name == primary) {
                let output = self.outputs.remove(idx);
                self.outputs.insert(0, output);
            }
        }

        for output in &mut self.outputs {
            if output.enabled {
                output.loc.get_or_insert_with(Point::default);
            } else {
                output.loc = None;
            }
        }

        let mut x = 0;
        for output in self.outputs.iter_mut().rev() {
            if let Some(loc) = &mut output.loc {
                *loc = Point::new(x, 0);
                x += output.size.w;
            }
        }

        let after: Vec<_> = self.outputs.iter().map(|o| o.geometry()).collect();
        if before == after {
            return false;
        }

        for output in &self.outputs {
            match output.geometry() {
                Some(geo) => debug!("putting output {} at {:?}", output.name, geo.loc),
                None => debug!("output {} is disabled", output.name),
            }
        }

        true
    }

    /// Bounding box of all enabled outputs, or `None` when there are none.
    pub fn union_bounds(&self) -> Option<Rectangle<i32, Logical>> {
        self.outputs
            .iter()
            .filter_map(|o| o.geometry())
            .reduce(|a, b| a.merge(b))
    }

    pub fn output_geometry(&self, name: &str) -> Option<Rectangle<i32, Logical>> {
        self.find(name)?.geometry()
    }

    /// Enabled output containing the point.
    pub fn output_at(&self, point: Point<f64, Logical>) -> Option<&Output> {
        self.outputs.iter().find(|o| {
            o.geometry()
                .is_some_and(|geo| geo.to_f64().contains(point))
        })
    }

    /// Output that a window at this location belongs to.
    ///
    /// Falls back to the first enabled output when the location is outside of every output.
    pub fn output_for_point(&self, point: Point<i32, Logical>) -> Option<&Output> {
        self.output_at(point.to_f64())
            .or_else(|| self.outputs.iter().find(|o| o.loc.is_some()))
    }

    /// Closest point to `point` that lies on an enabled output.
    ///
    /// Returns `point` unchanged if there are no enabled outputs.
    pub fn closest_point(&self, point: Point<f64, Logical>) -> Point<f64, Logical> {
        let mut closest = None;
        let mut closest_dist = f64::INFINITY;

        for geo in self.outputs.iter().filter_map(|o| o.geometry()) {
            let geo = geo.to_f64();
            let x = point.x.clamp(geo.loc.x, geo.loc.x + geo.size.w - 1.);
            let y = point.y.clamp(geo.loc.y, geo.loc.y + geo.size.h - 1.);
            let dist = (x - point.x).powi(2) + (y - point.y).powi(2);
            if dist < closest_dist {
                closest_dist = dist;
                closest = Some(Point::new(x, y));
            }
        }

        closest.unwrap_or(point)
    }

    #[cfg(test)]
    pub fn verify_invariants(&self) {
        let mut names = std::collections::HashSet::new();
        for output in &self.outputs {
            assert!(names.insert(&output.name), "output names must be unique");
            assert_eq!(
                output.enabled,
                output.loc.is_some(),
                "exactly the enabled outputs must be placed"
            );
            assert!(!output.size.is_empty(), "output size must be positive");
        }

        let placed: Vec<_> = self.outputs.iter().filter_map(|o| o.geometry()).collect();
        for (i, a) in placed.iter().enumerate() {
            assert_eq!(a.loc.y, 0);
            for b in &placed[i + 1..] {
                assert!(!a.overlaps(*b), "enabled outputs must not overlap");
            }
        }

        if let Some(primary) = &self.primary {
            if let Some(output) = self.find(primary) {
                assert_eq!(self.outputs[0].name, output.name, "primary must come first");
            }
        }
    }
}
