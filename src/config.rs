use std::time::Duration;

pub const START_PIN: u32 = 10;
pub const PAUSE_PIN: u32 = 22;
pub const STOP_PIN: u32 = 27;
pub const RED_LAMP_PIN: u32 = 24;
pub const GREEN_LAMP_PIN: u32 = 23;

/// Quiet window after an accepted press during which further edges on the
/// same button are treated as contact bounce.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub start_pin: u32,
    pub pause_pin: u32,
    pub stop_pin: u32,
    pub red_pin: u32,
    pub green_pin: u32,
    pub debounce: Duration,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            start_pin: START_PIN,
            pause_pin: PAUSE_PIN,
            stop_pin: STOP_PIN,
            red_pin: RED_LAMP_PIN,
            green_pin: GREEN_LAMP_PIN,
            debounce: DEBOUNCE_WINDOW,
        }
    }
}
