use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::PanelConfig;
use crate::debounce::Debouncer;
use crate::error::PanelError;
use crate::gpio::{Access, Direction, EdgeDetect, GpioBackend, Level, Line, Wake};
use crate::mode::{ButtonId, Mode};

struct Button<B: GpioBackend> {
    line: Line<B>,
    id: ButtonId,
    debounce: Debouncer,
}

impl<B: GpioBackend> Button<B> {
    fn new(line: Line<B>, id: ButtonId, window: Duration) -> Self {
        Button {
            line,
            id,
            debounce: Debouncer::new(window),
        }
    }

    fn pin(&self) -> u32 {
        self.line.pin()
    }
}

struct Lamp<B: GpioBackend> {
    line: Line<B>,
    level: Option<Level>, // last level written, None before the first write
}

impl<B: GpioBackend> Lamp<B> {
    fn new(line: Line<B>) -> Self {
        Lamp { line, level: None }
    }

    fn set(&mut self, level: Level) -> Result<(), PanelError> {
        if self.level == Some(level) {
            return Ok(());
        }
        self.line.write(level)?;
        self.level = Some(level);
        Ok(())
    }
}

/// Outcome of one event-loop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Shutdown,
}

/// The whole control panel: three buttons, two lamps, one mode. Owns every
/// exported line, so dropping the panel releases the pin table no matter how
/// the loop ended.
pub struct Panel<B: GpioBackend> {
    backend: Arc<B>,
    buttons: [Button<B>; 3], // fixed scan order: start, pause, stop
    red: Lamp<B>,
    green: Lamp<B>,
    mode: Mode,
}

impl<B: GpioBackend> Panel<B> {
    /// Bring up the five lines phase by phase: export everything, then set
    /// directions, then arm edge detection on the buttons, then open the
    /// value handles, and finally sync the lamps to the initial mode. Any
    /// failure aborts bring-up; lines exported so far are released on drop.
    pub fn new(config: &PanelConfig, backend: Arc<B>) -> Result<Self, PanelError> {
        let start = Line::export(backend.clone(), config.start_pin)?;
        let pause = Line::export(backend.clone(), config.pause_pin)?;
        let stop = Line::export(backend.clone(), config.stop_pin)?;
        let red = Line::export(backend.clone(), config.red_pin)?;
        let green = Line::export(backend.clone(), config.green_pin)?;

        for line in [&start, &pause, &stop] {
            line.set_direction(Direction::In)?;
        }
        for line in [&red, &green] {
            line.set_direction(Direction::Out)?;
        }

        // buttons idle high and pull the line low when pressed
        for line in [&start, &pause, &stop] {
            line.arm_edge_detection(EdgeDetect::Falling)?;
        }

        for line in [&start, &pause, &stop] {
            line.open_value(Access::Read)?;
        }
        for line in [&red, &green] {
            line.open_value(Access::Write)?;
        }

        let mut panel = Panel {
            backend,
            buttons: [
                Button::new(start, ButtonId::Start, config.debounce),
                Button::new(pause, ButtonId::Pause, config.debounce),
                Button::new(stop, ButtonId::Stop, config.debounce),
            ],
            red: Lamp::new(red),
            green: Lamp::new(green),
            mode: Mode::default(),
        };
        panel.apply_lamps()?;
        Ok(panel)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Drive the event loop until the backend reports shutdown.
    pub fn run(&mut self) {
        info!("panel ready, mode {:?}", self.mode);
        while self.step() == Step::Continue {}
        info!("panel loop exiting");
    }

    /// One wait-and-dispatch cycle.
    pub fn step(&mut self) -> Step {
        // reposition every cursor first, or a stale readiness condition
        // would wake the next wait immediately
        for button in &self.buttons {
            if let Err(e) = button.line.rewind() {
                warn!("{:?}: rewind failed: {e}", button.id);
            }
        }

        let pins = self.buttons.each_ref().map(|b| b.pin());
        let wake = match self.backend.wait_ready(&pins) {
            Ok(wake) => wake,
            Err(e) => {
                warn!("wait failed: {e}");
                return Step::Continue;
            }
        };
        let ready = match wake {
            Wake::Shutdown => {
                info!("shutdown requested");
                return Step::Shutdown;
            }
            Wake::Ready(ready) => ready,
        };

        let now = Instant::now();
        for i in 0..self.buttons.len() {
            if !ready.contains(&self.buttons[i].pin()) {
                continue;
            }
            let id = self.buttons[i].id;
            let accepted = self.buttons[i].debounce.accept(now);
            // read even a suppressed edge, so its readiness condition is
            // acknowledged before the next wait
            if let Err(e) = self.buttons[i].line.read() {
                warn!("{id:?}: value read failed: {e}");
                continue;
            }
            if accepted {
                self.commit(id);
            } else {
                debug!("{id:?}: edge inside quiet window ignored");
            }
        }
        Step::Continue
    }

    fn commit(&mut self, id: ButtonId) {
        let next = self.mode.on_press(id);
        if next == self.mode {
            debug!("{id:?} pressed, already {:?}", self.mode);
            return;
        }
        info!("{id:?} pressed: {:?} -> {next:?}", self.mode);
        self.mode = next;
        if let Err(e) = self.apply_lamps() {
            warn!("lamp update failed: {e}");
        }
    }

    fn apply_lamps(&mut self) -> Result<(), PanelError> {
        let target = self.mode.lamp_state();
        // lamps going dark are written before lamps going lit, so the pair
        // is never on together, not even between two writes
        if target.red == Level::Low {
            self.red.set(Level::Low)?;
        }
        if target.green == Level::Low {
            self.green.set(Level::Low)?;
        }
        if target.red == Level::High {
            self.red.set(Level::High)?;
        }
        if target.green == Level::High {
            self.green.set(Level::High)?;
        }
        Ok(())
    }
}
