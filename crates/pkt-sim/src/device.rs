//! Simulated capture devices
//!
//! A [`VirtualDevice`] owns a frame queue that tests (or the traffic
//! generator) feed. [`SimulatedSource`] opens devices by name and hands out
//! handles that drain the same queue, so frames injected after the engine
//! has opened a device are still delivered.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use pkt_capture::{
    CaptureError, CaptureHandle, DeviceDescriptor, DeviceDirectory, Frame, LinkType,
    PacketSource, PollStatus, DEFAULT_SNAPLEN,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::traffic::{TrafficConfig, TrafficGenerator};

/// Configuration for a virtual device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualDeviceConfig {
    /// Interface name
    pub name: String,
    /// Description shown in the device picker
    pub description: String,
    /// DLT number reported on open
    pub dlt: u32,
    /// Refuse to open with this reason
    pub open_error: Option<String>,
    /// Report exhaustion once the queue is empty
    pub finite: bool,
    /// Generate traffic on every poll
    pub traffic: Option<TrafficConfig>,
}

impl VirtualDeviceConfig {
    /// An Ethernet device that only delivers injected frames
    pub fn ethernet(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "Simulated Ethernet".to_string(),
            dlt: pkt_capture::DLT_EN10MB,
            open_error: None,
            finite: false,
            traffic: None,
        }
    }
}

#[derive(Debug, Default)]
struct DeviceState {
    queue: VecDeque<Frame>,
    opens: usize,
}

/// A simulated interface
#[derive(Debug, Clone)]
pub struct VirtualDevice {
    config: VirtualDeviceConfig,
    state: Arc<Mutex<DeviceState>>,
}

impl VirtualDevice {
    /// Create a device from configuration
    pub fn new(config: VirtualDeviceConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(DeviceState::default())),
        }
    }

    /// Interface name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Descriptor for the device picker
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor::new(&self.config.name, &self.config.description)
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a frame for delivery
    pub fn inject(&self, frame: Frame) {
        self.lock().queue.push_back(frame);
    }

    /// Queue several frames
    pub fn inject_all(&self, frames: impl IntoIterator<Item = Frame>) {
        self.lock().queue.extend(frames);
    }

    /// Frames not yet delivered
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of times the device was opened
    pub fn open_count(&self) -> usize {
        self.lock().opens
    }
}

/// Opens virtual devices
#[derive(Debug, Clone, Default)]
pub struct SimulatedSource {
    devices: Vec<VirtualDevice>,
}

impl SimulatedSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo setup: one busy Ethernet device, one quiet one, one that is not Ethernet
    pub fn demo() -> Self {
        let mut busy = VirtualDeviceConfig::ethernet("sim0");
        busy.description = "Simulated LAN".to_string();
        busy.traffic = Some(TrafficConfig::default());

        let mut quiet = VirtualDeviceConfig::ethernet("sim1");
        quiet.description = "Simulated quiet link".to_string();
        quiet.traffic = Some(TrafficConfig {
            seed: 42,
            frames_per_poll: 1,
            malformed_percent: 0,
        });

        let mut tunnel = VirtualDeviceConfig::ethernet("simtun0");
        tunnel.description = "Simulated tunnel (raw IP)".to_string();
        tunnel.dlt = 12;

        let mut source = Self::new();
        source.add_device(busy);
        source.add_device(quiet);
        source.add_device(tunnel);
        source
    }

    /// Add a device, returning a handle for injecting frames
    pub fn add_device(&mut self, config: VirtualDeviceConfig) -> VirtualDevice {
        let device = VirtualDevice::new(config);
        self.devices.push(device.clone());
        device
    }

    /// Look up a device by name
    pub fn device(&self, name: &str) -> Option<&VirtualDevice> {
        self.devices.iter().find(|d| d.name() == name)
    }
}

impl DeviceDirectory for SimulatedSource {
    fn list(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        Ok(self.devices.iter().map(VirtualDevice::descriptor).collect())
    }
}

impl PacketSource for SimulatedSource {
    type Handle = SimulatedHandle;

    fn open(&mut self, descriptor: &DeviceDescriptor) -> Result<SimulatedHandle, CaptureError> {
        let device = self
            .device(&descriptor.name)
            .cloned()
            .ok_or_else(|| CaptureError::OpenFailed {
                device: descriptor.name.clone(),
                reason: "no such device".to_string(),
            })?;

        if let Some(reason) = &device.config.open_error {
            return Err(CaptureError::OpenFailed {
                device: descriptor.name.clone(),
                reason: reason.clone(),
            });
        }

        device.lock().opens += 1;
        info!("Opened simulated device {}", descriptor.name);

        Ok(SimulatedHandle {
            link_type: LinkType::from_dlt(device.config.dlt),
            generator: device.config.traffic.map(TrafficGenerator::new),
            finite: device.config.finite,
            device,
        })
    }
}

/// An open virtual device
#[derive(Debug)]
pub struct SimulatedHandle {
    device: VirtualDevice,
    link_type: LinkType,
    generator: Option<TrafficGenerator>,
    finite: bool,
}

impl CaptureHandle for SimulatedHandle {
    fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn snaplen(&self) -> u32 {
        DEFAULT_SNAPLEN
    }

    fn poll(&mut self, max_batch: usize, out: &mut Vec<Frame>) -> Result<PollStatus, CaptureError> {
        if let Some(generator) = self.generator.as_mut() {
            let frames: Vec<_> = (0..generator.frames_per_poll())
                .map(|_| Frame::complete(generator.next_frame()))
                .collect();
            self.device.inject_all(frames);
        }

        let mut state = self.device.lock();
        let take = max_batch.min(state.queue.len());
        out.extend(state.queue.drain(..take));

        if self.finite && state.queue.is_empty() {
            debug!("Simulated device {} exhausted", self.device.name());
            return Ok(PollStatus::Exhausted);
        }
        Ok(PollStatus::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameBuilder;
    use pkt_capture::open_ethernet;
    use std::net::Ipv4Addr;

    fn tcp_frame() -> Frame {
        FrameBuilder::tcp(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)).frame()
    }

    #[test]
    fn test_injected_frames_delivered_in_batches() {
        let mut source = SimulatedSource::new();
        let device = source.add_device(VirtualDeviceConfig::ethernet("eth0"));
        let mut handle = source.open(&device.descriptor()).unwrap();

        device.inject_all((0..5).map(|_| tcp_frame()));

        let mut out = Vec::new();
        assert_eq!(handle.poll(3, &mut out).unwrap(), PollStatus::Ready);
        assert_eq!(out.len(), 3);
        handle.poll(3, &mut out).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(device.pending(), 0);
    }

    #[test]
    fn test_finite_device_exhausts() {
        let mut source = SimulatedSource::new();
        let mut config = VirtualDeviceConfig::ethernet("eth0");
        config.finite = true;
        let device = source.add_device(config);
        device.inject(tcp_frame());

        let mut handle = source.open(&device.descriptor()).unwrap();
        let mut out = Vec::new();
        assert_eq!(handle.poll(8, &mut out).unwrap(), PollStatus::Exhausted);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_open_errors() {
        let mut source = SimulatedSource::new();
        let mut config = VirtualDeviceConfig::ethernet("eth9");
        config.open_error = Some("permission denied".to_string());
        let broken = source.add_device(config);

        assert!(matches!(
            source.open(&broken.descriptor()),
            Err(CaptureError::OpenFailed { .. })
        ));
        assert!(source
            .open(&DeviceDescriptor::new("missing", ""))
            .is_err());
    }

    #[test]
    fn test_demo_devices() {
        let mut source = SimulatedSource::demo();
        let devices = source.enumerate().unwrap();
        assert_eq!(devices.len(), 3);

        let mut handle = open_ethernet(&mut source, &devices[0]).unwrap();
        let mut out = Vec::new();
        handle.poll(64, &mut out).unwrap();
        assert_eq!(out.len(), TrafficConfig::default().frames_per_poll);

        assert!(matches!(
            open_ethernet(&mut source, &devices[2]),
            Err(CaptureError::UnsupportedLinkType { link_type: 12, .. })
        ));
    }
}
