//! Capture file replay
//!
//! Reads classic pcap files through `pcap-file`, so replay works without
//! libpcap. A replayed file is a device whose name is the file path.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, SystemTime};

use pcap_file::pcap::PcapReader;
use pkt_decode::FrameMeta;
use tracing::{debug, info};

use crate::device::{DeviceDescriptor, StaticDirectory};
use crate::error::CaptureError;
use crate::source::{CaptureHandle, Frame, LinkType, PacketSource, PollStatus};

/// Description shown for replayed files
pub const CAPTURE_FILE_DESCRIPTION: &str = "Capture file";

/// Opens capture files for replay
#[derive(Debug, Clone, Default)]
pub struct ReplaySource;

impl ReplaySource {
    /// Create a replay source
    pub fn new() -> Self {
        Self
    }

    /// Device list holding just the given file
    pub fn directory(path: &Path) -> StaticDirectory {
        StaticDirectory::new(vec![DeviceDescriptor::new(
            path.display().to_string(),
            CAPTURE_FILE_DESCRIPTION,
        )])
    }
}

impl PacketSource for ReplaySource {
    type Handle = ReplayHandle;

    fn open(&mut self, device: &DeviceDescriptor) -> Result<ReplayHandle, CaptureError> {
        let open_failed = |reason: String| CaptureError::OpenFailed {
            device: device.name.clone(),
            reason,
        };

        let file = File::open(&device.name).map_err(|e| open_failed(e.to_string()))?;
        let reader = PcapReader::new(BufReader::new(file)).map_err(|e| open_failed(e.to_string()))?;
        let header = reader.header();

        info!(
            "Replaying {} (link type {}, snaplen {})",
            device.name,
            u32::from(header.datalink),
            header.snaplen
        );

        Ok(ReplayHandle {
            reader: Some(reader),
            link_type: LinkType::from_dlt(u32::from(header.datalink)),
            snaplen: header.snaplen,
        })
    }
}

/// An open capture file
pub struct ReplayHandle {
    /// `None` once the file has been read to the end
    reader: Option<PcapReader<BufReader<File>>>,
    link_type: LinkType,
    snaplen: u32,
}

impl CaptureHandle for ReplayHandle {
    fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn snaplen(&self) -> u32 {
        self.snaplen
    }

    fn poll(&mut self, max_batch: usize, out: &mut Vec<Frame>) -> Result<PollStatus, CaptureError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(PollStatus::Exhausted);
        };

        for _ in 0..max_batch {
            match reader.next_packet() {
                Some(Ok(packet)) => {
                    let data = packet.data.into_owned();
                    let captured_len = u32::try_from(data.len()).unwrap_or(u32::MAX);
                    let arrival = SystemTime::UNIX_EPOCH + packet.timestamp;
                    out.push(Frame::new(
                        data,
                        FrameMeta::new(captured_len, packet.orig_len, arrival),
                    ));
                }
                Some(Err(e)) => {
                    self.reader = None;
                    return Err(e.into());
                }
                None => {
                    debug!("Capture file exhausted");
                    self.reader = None;
                    return Ok(PollStatus::Exhausted);
                }
            }
        }

        Ok(PollStatus::Ready)
    }
}

/// Arrival time of a frame as an offset from the Unix epoch
pub(crate) fn since_epoch(time: SystemTime) -> Duration {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}
