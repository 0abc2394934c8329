//! Error types for frame decoding

use thiserror::Error;

/// Errors that can occur while decoding a frame
///
/// Malformed network-layer headers are not errors; they are reported as an
/// [`Anomaly`](crate::Anomaly) on the produced record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame is too short to carry an Ethernet header
    #[error("runt frame: {captured} bytes captured, need at least {needed}")]
    RuntFrame { captured: usize, needed: usize },
}
