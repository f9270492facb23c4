use smithay::utils::{Logical, Size};

use crate::input::InputEvent;
use crate::strata::Strata;

pub mod headless;
pub use headless::Headless;

/// Event coming from the hardware side.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    OutputAdded { name: String, size: Size<i32, Logical> },
    OutputRemoved { name: String },
    Input(InputEvent),
}

pub enum Backend {
    Headless(Headless),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderResult {
    /// The frame was submitted.
    Submitted,
    /// Nothing changed since the last frame.
    Skipped,
}

impl Backend {
    pub fn init(&mut self, strata: &mut Strata) {
        match self {
            Backend::Headless(headless) => headless.init(strata),
        }
    }

    pub fn seat_name(&self) -> String {
        match self {
            Backend::Headless(headless) => headless.seat_name(),
        }
    }

    pub fn render(&mut self, strata: &mut Strata) -> RenderResult {
        match self {
            Backend::Headless(headless) => headless.render(strata),
        }
    }

    pub fn headless(&mut self) -> &mut Headless {
        match self {
            Backend::Headless(headless) => headless,
        }
    }
}
