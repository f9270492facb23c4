//! Headless backend.
//!
//! Outputs come from the config, and every other hardware event is injected through the
//! [`BackendEvent`] channel. Frames are kept in memory instead of being drawn.

use std::cell::RefCell;
use std::rc::Rc;

use calloop::channel::Sender;
use smithay::utils::{Logical, Size};
use strata_config::Config;

use super::{BackendEvent, RenderResult};
use crate::layout::RenderElement;
use crate::strata::Strata;

const FALLBACK_OUTPUT_SIZE: (i32, i32) = (1920, 1080);

pub struct Headless {
    config: Rc<RefCell<Config>>,
    sender: Sender<BackendEvent>,
    last_frame: Vec<RenderElement>,
    frame_count: u64,
}

impl Headless {
    pub fn new(config: Rc<RefCell<Config>>, sender: Sender<BackendEvent>) -> Self {
        Self {
            config,
            sender,
            last_frame: Vec::new(),
            frame_count: 0,
        }
    }

    /// Adds the outputs with a mode in the config, or a single fallback output.
    pub fn init(&mut self, strata: &mut Strata) {
        let outputs: Vec<_> = self
            .config
            .borrow()
            .outputs
            .0
            .iter()
            .filter_map(|output| {
                let mode = output.mode?;
                let size = Size::new(i32::from(mode.width), i32::from(mode.height));
                Some((output.name.clone(), size))
            })
            .collect();

        if outputs.is_empty() {
            self.add_output(strata, 1, Size::from(FALLBACK_OUTPUT_SIZE));
            return;
        }

        for (name, size) in outputs {
            strata.add_output(name, size);
        }
    }

    pub fn add_output(&mut self, strata: &mut Strata, n: u8, size: Size<i32, Logical>) {
        strata.add_output(format!("headless-{n}"), size);
    }

    pub fn seat_name(&self) -> String {
        "headless".to_owned()
    }

    /// Handle for injecting hardware events into the event loop.
    pub fn event_sender(&self) -> Sender<BackendEvent> {
        self.sender.clone()
    }

    pub fn render(&mut self, strata: &mut Strata) -> RenderResult {
        let _span = tracy_client::span!("Headless::render");

        let elements = strata.layout.render_elements();
        if self.frame_count > 0 && elements == self.last_frame {
            return RenderResult::Skipped;
        }

        self.last_frame = elements;
        self.frame_count += 1;
        RenderResult::Submitted
    }

    /// The elements of the last submitted frame, back to front.
    pub fn last_frame(&self) -> &[RenderElement] {
        &self.last_frame
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
