use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("failed to export pin {pin}: {source}")]
    Export { pin: u32, source: io::Error },
    #[error("failed to set direction on pin {pin}: {source}")]
    Direction { pin: u32, source: io::Error },
    #[error("failed to arm edge detection on pin {pin}: {source}")]
    Edge { pin: u32, source: io::Error },
    #[error("failed to open value file for pin {pin}: {source}")]
    Open { pin: u32, source: io::Error },
    #[error("failed to unexport pin {pin}: {source}")]
    Unexport { pin: u32, source: io::Error },
    #[error("value I/O failed on pin {pin}: {source}")]
    Value { pin: u32, source: io::Error },
    #[error("multiplexed wait failed: {source}")]
    Wait { source: io::Error },
    #[error("GPIO error: {0}")]
    Gpio(String),
}

impl PanelError {
    /// Process exit code when the error aborts bring-up.
    pub fn exit_code(&self) -> u8 {
        match self {
            PanelError::Export { .. } => 1,
            PanelError::Direction { .. } => 2,
            PanelError::Edge { .. } => 3,
            PanelError::Open { .. }
            | PanelError::Unexport { .. }
            | PanelError::Value { .. }
            | PanelError::Wait { .. }
            | PanelError::Gpio(_) => 4,
        }
    }
}
