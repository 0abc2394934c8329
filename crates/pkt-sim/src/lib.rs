//! Packet Capture Simulation Library
//!
//! This crate provides capture devices that need no network access or
//! privileges, for tests and for demo runs of the dashboard:
//!
//! - **FrameBuilder**: wire-accurate Ethernet frames, malformed ones included
//! - **VirtualDevice**: a named device whose frame queue can be fed at any time
//! - **SimulatedSource**: opens virtual devices through the normal capture traits
//! - **TrafficGenerator**: repeatable synthetic traffic
//!
//! # Example
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use pkt_capture::{CaptureHandle, PacketSource};
//! use pkt_sim::{FrameBuilder, SimulatedSource, VirtualDeviceConfig};
//!
//! let mut source = SimulatedSource::new();
//! let device = source.add_device(VirtualDeviceConfig::ethernet("eth0"));
//! let mut handle = source.open(&device.descriptor()).unwrap();
//!
//! device.inject(FrameBuilder::udp(Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST).frame());
//!
//! let mut frames = Vec::new();
//! handle.poll(64, &mut frames).unwrap();
//! assert_eq!(frames.len(), 1);
//! ```

pub mod device;
pub mod frame;
pub mod traffic;

pub use device::{SimulatedHandle, SimulatedSource, VirtualDevice, VirtualDeviceConfig};
pub use frame::FrameBuilder;
pub use traffic::{TrafficConfig, TrafficGenerator};
