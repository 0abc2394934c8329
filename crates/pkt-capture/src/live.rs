//! Live capture through libpcap

use std::time::{Duration, SystemTime};

use pcap::{Active, Capture, Device};
use pkt_decode::FrameMeta;
use tracing::{debug, info};

use crate::device::{describe, DeviceDescriptor, DeviceDirectory};
use crate::error::CaptureError;
use crate::source::{CaptureHandle, Frame, LinkType, PacketSource, PollStatus, DEFAULT_SNAPLEN};

/// Lists interfaces known to libpcap
#[derive(Debug, Clone, Default)]
pub struct LiveDirectory;

impl LiveDirectory {
    /// Create a directory backed by libpcap
    pub fn new() -> Self {
        Self
    }
}

impl DeviceDirectory for LiveDirectory {
    fn list(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        let devices =
            Device::list().map_err(|e| CaptureError::EnumerationFailed(e.to_string()))?;

        Ok(devices
            .into_iter()
            .map(|d| {
                let description = describe(&d.name, d.desc.as_deref());
                DeviceDescriptor::new(d.name, description)
            })
            .collect())
    }
}

/// Opens interfaces in promiscuous, non-blocking mode
#[derive(Debug, Clone)]
pub struct LiveSource {
    snaplen: u32,
    read_timeout: Duration,
}

impl LiveSource {
    /// Create a live source with the given snapshot length
    pub fn new(snaplen: u32) -> Self {
        Self {
            snaplen,
            read_timeout: Duration::from_millis(1),
        }
    }
}

impl Default for LiveSource {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPLEN)
    }
}

impl PacketSource for LiveSource {
    type Handle = LiveHandle;

    fn open(&mut self, device: &DeviceDescriptor) -> Result<LiveHandle, CaptureError> {
        let open_failed = |e: pcap::Error| CaptureError::OpenFailed {
            device: device.name.clone(),
            reason: e.to_string(),
        };

        let snaplen = i32::try_from(self.snaplen).unwrap_or(i32::MAX);
        let timeout = i32::try_from(self.read_timeout.as_millis()).unwrap_or(i32::MAX);

        let capture = Capture::from_device(device.name.as_str())
            .map_err(open_failed)?
            .promisc(true)
            .snaplen(snaplen)
            .timeout(timeout)
            .open()
            .map_err(open_failed)?
            .setnonblock()
            .map_err(open_failed)?;

        let link_type = LinkType::from_dlt(u32::try_from(capture.get_datalink().0).unwrap_or(0));
        info!("Opened {} for live capture", device.name);

        Ok(LiveHandle {
            capture,
            link_type,
            snaplen: self.snaplen,
        })
    }
}

/// An open live capture
pub struct LiveHandle {
    capture: Capture<Active>,
    link_type: LinkType,
    snaplen: u32,
}

impl CaptureHandle for LiveHandle {
    fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn snaplen(&self) -> u32 {
        self.snaplen
    }

    fn poll(&mut self, max_batch: usize, out: &mut Vec<Frame>) -> Result<PollStatus, CaptureError> {
        for _ in 0..max_batch {
            match self.capture.next_packet() {
                Ok(packet) => {
                    let secs = u64::try_from(packet.header.ts.tv_sec).unwrap_or(0);
                    let micros = u64::try_from(packet.header.ts.tv_usec).unwrap_or(0);
                    let arrival = SystemTime::UNIX_EPOCH
                        + Duration::from_secs(secs)
                        + Duration::from_micros(micros);
                    let meta = FrameMeta::new(packet.header.caplen, packet.header.len, arrival);
                    out.push(Frame::new(packet.data.to_vec(), meta));
                }
                Err(pcap::Error::TimeoutExpired) => break,
                Err(pcap::Error::NoMorePackets) => {
                    debug!("Live capture ended");
                    return Ok(PollStatus::Exhausted);
                }
                Err(e) => return Err(CaptureError::ReadFailed(e.to_string())),
            }
        }
        Ok(PollStatus::Ready)
    }
}
