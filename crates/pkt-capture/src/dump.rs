//! Capture dump sink
//!
//! Raw frames are written to a classic pcap file as they are delivered. The
//! file header takes the link type and snapshot length of the handle the
//! frames come from.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use pcap_file::DataLink;
use tracing::debug;

use crate::error::CaptureError;
use crate::replay::since_epoch;
use crate::source::{CaptureHandle, Frame};

/// Destination for raw captured frames
pub trait DumpSink {
    /// Write one frame
    fn write(&mut self, frame: &Frame) -> Result<(), CaptureError>;

    /// Flush and close; later writes are ignored
    fn close(&mut self) -> Result<(), CaptureError>;
}

/// Pcap file sink
pub struct PcapDumpSink {
    path: PathBuf,
    snaplen: u32,
    writer: Option<PcapWriter<BufWriter<File>>>,
    frames_written: u64,
}

impl PcapDumpSink {
    /// Create (truncating) a dump file for frames from `handle`
    pub fn create<H: CaptureHandle + ?Sized>(path: &Path, handle: &H) -> Result<Self, CaptureError> {
        let header = PcapHeader {
            snaplen: handle.snaplen(),
            datalink: DataLink::from(handle.link_type().dlt()),
            ..Default::default()
        };

        let file = File::create(path)?;
        let writer = PcapWriter::with_header(BufWriter::new(file), header)?;
        debug!("Opened dump file {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            snaplen: handle.snaplen(),
            writer: Some(writer),
            frames_written: 0,
        })
    }

    /// Path of the dump file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frames written so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl DumpSink for PcapDumpSink {
    fn write(&mut self, frame: &Frame) -> Result<(), CaptureError> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        let keep = frame
            .data
            .len()
            .min(frame.meta.captured_len as usize)
            .min(self.snaplen as usize);
        let data = &frame.data[..keep];
        let orig_len = frame.meta.declared_len.max(keep as u32);

        writer.write_packet(&PcapPacket::new(
            since_epoch(frame.meta.arrival),
            orig_len,
            data,
        ))?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        if let Some(writer) = self.writer.take() {
            writer.into_writer().flush()?;
            debug!(
                "Closed dump file {} ({} frames)",
                self.path.display(),
                self.frames_written
            );
        }
        Ok(())
    }
}

impl Drop for PcapDumpSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!("Dump file flush on drop failed: {}", e);
        }
    }
}
