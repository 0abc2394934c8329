//! Error types for packet capture

use thiserror::Error;

/// Errors that can occur while opening or reading a capture source
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Device enumeration failed
    #[error("failed to enumerate capture devices: {0}")]
    EnumerationFailed(String),

    /// Enumeration succeeded but returned nothing
    #[error("no capture devices found")]
    NoDevices,

    /// Failed to open a capture source
    #[error("failed to open {device}: {reason}")]
    OpenFailed { device: String, reason: String },

    /// Source does not deliver Ethernet frames
    #[error("{device} does not provide Ethernet headers (link type {link_type})")]
    UnsupportedLinkType { device: String, link_type: u32 },

    /// Reading from an open source failed
    #[error("capture read error: {0}")]
    ReadFailed(String),

    /// Capture file format error
    #[error("capture file error: {0}")]
    File(#[from] pcap_file::PcapError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Whether this error should stop the program before capture starts
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            CaptureError::EnumerationFailed(_)
                | CaptureError::NoDevices
                | CaptureError::OpenFailed { .. }
                | CaptureError::UnsupportedLinkType { .. }
        )
    }
}
