use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use anyhow::Context;
use calloop::channel::{self, Channel};
use calloop::{LoopHandle, LoopSignal};
use smithay::utils::{Logical, Size};
use strata_config::Config;

use crate::backend::{Backend, BackendEvent, Headless};
use crate::cursor::CursorManager;
use crate::input::drag_grab::DragGrab;
use crate::input::seat::{InputSink, NullSink, Seat};
use crate::layout::Layout;

/// Everything the window manager knows about the session.
pub struct Strata {
    pub config: Rc<RefCell<Config>>,

    pub event_loop: LoopHandle<'static, State>,
    pub stop_signal: LoopSignal,

    pub layout: Layout,
    pub seat: Seat,
    pub cursor_manager: CursorManager,

    /// Whether the configured mod key is held down.
    pub mod_held: bool,
    /// Keys that triggered a bind and whose release must not reach clients.
    pub suppressed_keys: HashSet<u32>,
    /// The interactive move or resize in progress, if any.
    pub grab: Option<DragGrab>,
}

pub struct State {
    pub backend: Backend,
    pub strata: Strata,
}

impl State {
    pub fn new(
        config: Config,
        event_loop: LoopHandle<'static, State>,
        stop_signal: LoopSignal,
    ) -> anyhow::Result<Self> {
        let _span = tracy_client::span!("State::new");

        let config = Rc::new(RefCell::new(config));

        let (sender, channel) = channel::channel();
        insert_backend_events(&event_loop, channel)?;

        let mut backend = Backend::Headless(Headless::new(config.clone(), sender));

        let mut strata = Strata::new(config, event_loop, stop_signal, &backend);
        backend.init(&mut strata);
        strata.confine_pointer_to_layout();

        Ok(Self { backend, strata })
    }

    /// Runs the periodic work after events have been processed.
    pub fn refresh(&mut self) {
        let _span = tracy_client::span!("State::refresh");

        self.update_keyboard_focus();
    }

    pub fn refresh_and_render(&mut self) {
        let _span = tracy_client::span!("State::refresh_and_render");

        self.refresh();
        self.backend.render(&mut self.strata);
    }

    /// Tells the seat about the window holding keyboard focus.
    pub fn update_keyboard_focus(&mut self) {
        let focus = self.strata.layout.focus_id();
        if self.strata.seat.keyboard_focus() != focus {
            trace!(
                "keyboard focus changed from {:?} to {focus:?}",
                self.strata.seat.keyboard_focus()
            );
            self.strata.seat.set_keyboard_focus(focus);
        }
    }

    pub fn process_backend_event(&mut self, event: BackendEvent) {
        let _span = tracy_client::span!("State::process_backend_event");

        match event {
            BackendEvent::OutputAdded { name, size } => {
                self.strata.add_output(name, size);
                self.confine_pointer();
            }
            BackendEvent::OutputRemoved { name } => {
                self.strata.remove_output(&name);
                self.confine_pointer();
            }
            BackendEvent::Input(event) => self.process_input_event(event),
        }
    }

    /// Replaces the collaborator that delivers input to clients.
    pub fn set_input_sink(&mut self, sink: Box<dyn InputSink>) {
        self.strata.seat.set_sink(sink);
    }
}

fn insert_backend_events(
    event_loop: &LoopHandle<'static, State>,
    channel: Channel<BackendEvent>,
) -> anyhow::Result<()> {
    event_loop
        .insert_source(channel, |event, _, state| match event {
            channel::Event::Msg(event) => state.process_backend_event(event),
            channel::Event::Closed => (),
        })
        .map_err(|err| err.error)
        .context("error inserting the backend event source")?;
    Ok(())
}

impl Strata {
    pub fn new(
        config: Rc<RefCell<Config>>,
        event_loop: LoopHandle<'static, State>,
        stop_signal: LoopSignal,
        backend: &Backend,
    ) -> Self {
        let _span = tracy_client::span!("Strata::new");

        let mut layout = Layout::new();
        layout.set_primary_output(config.borrow().primary_output.clone());

        let seat = Seat::new(backend.seat_name(), Box::new(NullSink));

        Self {
            config,
            event_loop,
            stop_signal,
            layout,
            seat,
            cursor_manager: CursorManager::new(),
            mod_held: false,
            suppressed_keys: HashSet::new(),
            grab: None,
        }
    }

    /// Adds an output, honoring its configuration.
    pub fn add_output(&mut self, name: String, size: Size<i32, Logical>) {
        let off = self
            .config
            .borrow()
            .outputs
            .find(&name)
            .is_some_and(|output| output.off);

        info!("adding output {name}: {size:?}");
        self.layout.add_output(name.clone(), size);

        if off {
            debug!("output {name} is turned off in the config");
            self.layout.set_output_enabled(&name, false);
        }
    }

    pub fn remove_output(&mut self, name: &str) {
        info!("removing output {name}");
        self.layout.remove_output(name);
    }

    /// Moves the pointer inside the layout without notifying clients.
    fn confine_pointer_to_layout(&mut self) {
        let location = self.seat.pointer_location();
        let confined = self.layout.outputs().closest_point(location);
        self.seat.set_pointer_location(confined);
    }
}
