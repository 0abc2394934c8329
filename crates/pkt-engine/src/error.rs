//! Error types for the capture engine

use pkt_capture::CaptureError;
use thiserror::Error;

/// Errors that can occur while starting or driving a capture session
#[derive(Debug, Error)]
pub enum EngineError {
    /// Capture backend error
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Device index outside the device list
    #[error("device index {index} out of range ({count} devices)")]
    InvalidDevice { index: usize, count: usize },
}

impl EngineError {
    /// Whether the process should exit instead of starting the loop
    pub fn is_startup_fatal(&self) -> bool {
        match self {
            EngineError::Capture(e) => e.is_startup_fatal(),
            EngineError::InvalidDevice { .. } => true,
        }
    }
}
