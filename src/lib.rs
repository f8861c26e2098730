mod backend;
mod config;
mod debounce;
mod error;
mod gpio;
mod mode;
mod panel;

pub use config::{
    DEBOUNCE_WINDOW, GREEN_LAMP_PIN, PAUSE_PIN, PanelConfig, RED_LAMP_PIN, START_PIN, STOP_PIN,
};
pub use debounce::Debouncer;
pub use error::PanelError;
pub use gpio::{Access, Direction, EdgeDetect, GpioBackend, Level, Line, Wake};
pub use mode::{ButtonId, LampState, Mode};
pub use panel::{Panel, Step};

#[cfg(feature = "hardware-gpio")]
pub use backend::SysfsBackend;
pub use backend::{MockGpioBackend, MockOp};
