//! Packet Capture Adapters
//!
//! This crate sits between the dashboard engine and the capture backends:
//!
//! - [`PacketSource`] / [`CaptureHandle`]: open a device, poll frames in
//!   bounded non-blocking batches, close on drop
//! - [`DumpSink`]: write raw frames to a pcap file
//! - [`DeviceDirectory`]: list devices with human-readable descriptions
//!
//! Backends:
//!
//! - [`ReplaySource`]: classic pcap files, pure Rust
//! - `LiveSource` (feature `live`): network interfaces through libpcap
//!
//! # Example
//!
//! ```rust,no_run
//! use pkt_capture::{CaptureHandle, DeviceDirectory, PacketSource, ReplaySource};
//!
//! let path = std::path::Path::new("capture.pcap");
//! let devices = ReplaySource::directory(path).enumerate().unwrap();
//! let mut handle = ReplaySource::new().open(&devices[0]).unwrap();
//!
//! let mut frames = Vec::new();
//! handle.poll(64, &mut frames).unwrap();
//! println!("read {} frames", frames.len());
//! ```

pub mod device;
pub mod dump;
pub mod error;
#[cfg(feature = "live")]
pub mod live;
pub mod replay;
pub mod source;

pub use device::{DeviceDescriptor, DeviceDirectory, StaticDirectory, NO_DESCRIPTION};
pub use dump::{DumpSink, PcapDumpSink};
pub use error::CaptureError;
#[cfg(feature = "live")]
pub use live::{LiveDirectory, LiveHandle, LiveSource};
pub use replay::{ReplayHandle, ReplaySource};
pub use source::{
    open_ethernet, CaptureHandle, Frame, LinkType, PacketSource, PollStatus, DEFAULT_SNAPLEN,
    DLT_EN10MB,
};
