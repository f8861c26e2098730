use std::sync::Arc;

use log::warn;

use crate::error::PanelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Keyword accepted by a sysfs `direction` file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDetect {
    None,
    Rising,
    Falling,
    Both,
}

impl Default for EdgeDetect {
    fn default() -> Self {
        EdgeDetect::None
    }
}

impl EdgeDetect {
    /// Keyword accepted by a sysfs `edge` file.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeDetect::None => "none",
            EdgeDetect::Rising => "rising",
            EdgeDetect::Falling => "falling",
            EdgeDetect::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// ASCII byte a sysfs `value` file carries for this level.
    pub fn as_bytes(&self) -> &'static [u8; 1] {
        match self {
            Level::Low => b"0",
            Level::High => b"1",
        }
    }

    pub fn from_ascii(byte: u8) -> Option<Level> {
        match byte {
            b'0' => Some(Level::Low),
            b'1' => Some(Level::High),
            _ => None,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        matches!(level, Level::High)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Outcome of one multiplexed wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wake {
    /// Pins with a pending priority-readiness condition, listed in the order
    /// they were registered for the wait.
    Ready(Vec<u32>),
    /// The cancellation descriptor fired; the caller should leave its loop.
    Shutdown,
}

pub trait GpioBackend: Send + Sync {
    fn export(&self, pin: u32) -> Result<(), PanelError>;
    fn unexport(&self, pin: u32) -> Result<(), PanelError>;
    fn set_direction(&self, pin: u32, direction: Direction) -> Result<(), PanelError>;
    fn set_edge(&self, pin: u32, edge: EdgeDetect) -> Result<(), PanelError>;
    fn open_value(&self, pin: u32, access: Access) -> Result<(), PanelError>;
    fn close_value(&self, pin: u32);
    fn rewind(&self, pin: u32) -> Result<(), PanelError>;
    fn read_value(&self, pin: u32) -> Result<Level, PanelError>;
    fn write_value(&self, pin: u32, level: Level) -> Result<(), PanelError>;
    /// Block until one of `pins` reports priority readiness or shutdown is
    /// requested.
    fn wait_ready(&self, pins: &[u32]) -> Result<Wake, PanelError>;
    /// Wake a blocked `wait_ready` and make it report `Wake::Shutdown`.
    /// Callable from any thread, signal handlers included.
    fn request_shutdown(&self);
}

/// An exported pin. Dropping it closes the value handle and releases the
/// export, so every setup path that bails out still leaves the pin table
/// clean.
pub struct Line<B: GpioBackend> {
    pin: u32,
    backend: Arc<B>,
}

impl<B: GpioBackend> Line<B> {
    pub fn export(backend: Arc<B>, pin: u32) -> Result<Self, PanelError> {
        backend.export(pin)?;
        Ok(Line { pin, backend })
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn set_direction(&self, direction: Direction) -> Result<(), PanelError> {
        self.backend.set_direction(self.pin, direction)
    }

    pub fn arm_edge_detection(&self, edge: EdgeDetect) -> Result<(), PanelError> {
        self.backend.set_edge(self.pin, edge)
    }

    pub fn open_value(&self, access: Access) -> Result<(), PanelError> {
        self.backend.open_value(self.pin, access)
    }

    /// Reposition the value cursor to the start of the pseudo-file. Required
    /// before every read and before re-registering the line for a wait.
    pub fn rewind(&self) -> Result<(), PanelError> {
        self.backend.rewind(self.pin)
    }

    pub fn read(&self) -> Result<Level, PanelError> {
        self.backend.rewind(self.pin)?;
        self.backend.read_value(self.pin)
    }

    pub fn write(&self, level: Level) -> Result<(), PanelError> {
        self.backend.write_value(self.pin, level)
    }
}

impl<B: GpioBackend> Drop for Line<B> {
    fn drop(&mut self) {
        self.backend.close_value(self.pin);
        if let Err(e) = self.backend.unexport(self.pin) {
            warn!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sysfs_keywords_match_kernel_contract() {
        assert_eq!(Direction::In.as_str(), "in");
        assert_eq!(Direction::Out.as_str(), "out");
        assert_eq!(EdgeDetect::None.as_str(), "none");
        assert_eq!(EdgeDetect::Rising.as_str(), "rising");
        assert_eq!(EdgeDetect::Falling.as_str(), "falling");
        assert_eq!(EdgeDetect::Both.as_str(), "both");
        assert_eq!(EdgeDetect::default(), EdgeDetect::None);
    }

    #[test]
    fn levels_map_to_value_bytes() {
        assert_eq!(Level::Low.as_bytes(), b"0");
        assert_eq!(Level::High.as_bytes(), b"1");
        assert_eq!(Level::from_ascii(b'0'), Some(Level::Low));
        assert_eq!(Level::from_ascii(b'1'), Some(Level::High));
        assert_eq!(Level::from_ascii(b'\n'), None);
        assert_eq!(Level::from(true), Level::High);
        assert!(!bool::from(Level::Low));
    }
}
