use crate::gpio::Level;

/// Operating mode of the panel. This is the sole semantic output of the
/// driver; the lamp levels are derived from it, never the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Stopped,
    Running,
    Paused,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Stopped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Start,
    Pause,
    Stop,
}

/// Target levels for the two indicator lamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampState {
    pub red: Level,
    pub green: Level,
}

impl Mode {
    /// Transition taken for a debounced press. The table is total and the
    /// destination depends only on the button, so a press in the matching
    /// mode is a no-op.
    pub fn on_press(self, button: ButtonId) -> Mode {
        match button {
            ButtonId::Start => Mode::Running,
            ButtonId::Pause => Mode::Paused,
            ButtonId::Stop => Mode::Stopped,
        }
    }

    pub fn lamp_state(self) -> LampState {
        match self {
            Mode::Stopped => LampState {
                red: Level::Low,
                green: Level::Low,
            },
            Mode::Running => LampState {
                red: Level::Low,
                green: Level::High,
            },
            Mode::Paused => LampState {
                red: Level::High,
                green: Level::Low,
            },
        }
    }
}
