//! Packet source contract
//!
//! A [`PacketSource`] opens devices; the [`CaptureHandle`] it returns hands
//! out frames in bounded, non-blocking batches. Dropping a handle closes it.

use pkt_decode::FrameMeta;

use crate::device::DeviceDescriptor;
use crate::error::CaptureError;

/// DLT number for Ethernet (DLT_EN10MB)
pub const DLT_EN10MB: u32 = 1;

/// Default snapshot length
pub const DEFAULT_SNAPLEN: u32 = 65535;

/// Link-layer header type of an open source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    /// Ethernet II / 802.3 framing
    Ethernet,
    /// Any other DLT
    Other(u32),
}

impl LinkType {
    /// Map a DLT number
    pub fn from_dlt(dlt: u32) -> Self {
        if dlt == DLT_EN10MB {
            LinkType::Ethernet
        } else {
            LinkType::Other(dlt)
        }
    }

    /// DLT number for this link type
    pub fn dlt(&self) -> u32 {
        match self {
            LinkType::Ethernet => DLT_EN10MB,
            LinkType::Other(dlt) => *dlt,
        }
    }

    /// Whether frames start with an Ethernet header
    pub fn is_ethernet(&self) -> bool {
        matches!(self, LinkType::Ethernet)
    }
}

/// One captured frame with its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Captured bytes (at most `meta.captured_len`)
    pub data: Vec<u8>,
    /// Lengths and arrival time
    pub meta: FrameMeta,
}

impl Frame {
    /// Create a frame
    pub fn new(data: Vec<u8>, meta: FrameMeta) -> Self {
        Self { data, meta }
    }

    /// A fully captured frame arriving now
    pub fn complete(data: Vec<u8>) -> Self {
        let meta = FrameMeta::complete(data.len());
        Self { data, meta }
    }
}

/// Result of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// Zero or more frames were delivered; more may follow
    Ready,
    /// The source has no more frames and never will (end of a capture file)
    Exhausted,
}

/// An open capture
pub trait CaptureHandle {
    /// Link-layer type of delivered frames
    fn link_type(&self) -> LinkType;

    /// Snapshot length the handle was opened with
    fn snaplen(&self) -> u32;

    /// Append up to `max_batch` waiting frames to `out` without blocking
    fn poll(&mut self, max_batch: usize, out: &mut Vec<Frame>) -> Result<PollStatus, CaptureError>;
}

/// Something that can open devices for capture
pub trait PacketSource {
    /// Handle type produced by [`PacketSource::open`]
    type Handle: CaptureHandle;

    /// Open a device for capture
    fn open(&mut self, device: &DeviceDescriptor) -> Result<Self::Handle, CaptureError>;
}

/// Open a device and insist on Ethernet framing
///
/// The handle is dropped (closed) when the link type is wrong.
pub fn open_ethernet<S: PacketSource>(
    source: &mut S,
    device: &DeviceDescriptor,
) -> Result<S::Handle, CaptureError> {
    let handle = source.open(device)?;
    let link_type = handle.link_type();
    if !link_type.is_ethernet() {
        return Err(CaptureError::UnsupportedLinkType {
            device: device.name.clone(),
            link_type: link_type.dlt(),
        });
    }
    Ok(handle)
}
