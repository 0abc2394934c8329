//! Integration tests for capture files
//!
//! These tests write frames through the dump sink and read them back through
//! the replay source:
//! - Dump file header carries the handle's link type and snaplen
//! - Frames survive the round trip with their lengths and timestamps
//! - Replay delivers bounded batches and then reports exhaustion
//! - Bad files fail to open instead of panicking

use std::io::Write;
use std::time::{Duration, SystemTime};

use pkt_capture::{
    open_ethernet, CaptureError, CaptureHandle, DeviceDescriptor, DeviceDirectory, DumpSink, Frame,
    LinkType, PacketSource, PcapDumpSink, PollStatus, ReplaySource,
};
use pkt_decode::FrameMeta;

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Handle stand-in that only describes a link
    pub struct LinkOnly {
        pub link_type: LinkType,
        pub snaplen: u32,
    }

    impl CaptureHandle for LinkOnly {
        fn link_type(&self) -> LinkType {
            self.link_type
        }

        fn snaplen(&self) -> u32 {
            self.snaplen
        }

        fn poll(&mut self, _: usize, _: &mut Vec<Frame>) -> Result<PollStatus, CaptureError> {
            Ok(PollStatus::Exhausted)
        }
    }

    pub fn ethernet_link() -> LinkOnly {
        LinkOnly {
            link_type: LinkType::Ethernet,
            snaplen: 65535,
        }
    }

    /// A frame of `len` bytes with a recognizable fill pattern
    pub fn frame(len: usize, secs: u64) -> Frame {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let arrival = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
        Frame::new(data, FrameMeta::new(len as u32, len as u32, arrival))
    }

    /// Write frames to a fresh dump file and return its path
    pub fn write_dump(dir: &tempfile::TempDir, handle: &LinkOnly, frames: &[Frame]) -> std::path::PathBuf {
        let path = dir.path().join("capture.pcap");
        let mut sink = PcapDumpSink::create(&path, handle).unwrap();
        for frame in frames {
            sink.write(frame).unwrap();
        }
        sink.close().unwrap();
        path
    }

    /// Drain a handle completely
    pub fn drain<H: CaptureHandle>(handle: &mut H, batch: usize) -> (Vec<Frame>, usize) {
        let mut frames = Vec::new();
        let mut polls = 0;
        loop {
            polls += 1;
            let before = frames.len();
            let status = handle.poll(batch, &mut frames).unwrap();
            assert!(frames.len() - before <= batch);
            if status == PollStatus::Exhausted {
                return (frames, polls);
            }
        }
    }
}

use helpers::*;

// ============================================================================
// Round Trip
// ============================================================================

mod round_trip_tests {
    use super::*;

    #[test]
    fn test_dumped_frames_replay() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<_> = (0..5).map(|i| frame(60 + i * 10, 1_700_000_000 + i as u64)).collect();
        let path = write_dump(&dir, &ethernet_link(), &frames);

        let devices = ReplaySource::directory(&path).enumerate().unwrap();
        let mut handle = open_ethernet(&mut ReplaySource::new(), &devices[0]).unwrap();
        assert_eq!(handle.snaplen(), 65535);

        let (replayed, _) = drain(&mut handle, 64);
        assert_eq!(replayed.len(), 5);
        for (original, copy) in frames.iter().zip(&replayed) {
            assert_eq!(copy.data, original.data);
            assert_eq!(copy.meta.declared_len, original.meta.declared_len);
            assert_eq!(copy.meta.arrival, original.meta.arrival);
        }
    }

    #[test]
    fn test_truncated_frame_keeps_wire_length() {
        let dir = tempfile::tempdir().unwrap();
        let arrival = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let short = Frame::new(vec![0xAA; 40], FrameMeta::new(40, 1500, arrival));
        let path = write_dump(&dir, &ethernet_link(), &[short]);

        let device = DeviceDescriptor::new(path.display().to_string(), "file");
        let mut handle = ReplaySource::new().open(&device).unwrap();
        let (replayed, _) = drain(&mut handle, 1);

        assert_eq!(replayed[0].meta.captured_len, 40);
        assert_eq!(replayed[0].meta.declared_len, 1500);
    }

    #[test]
    fn test_frames_clipped_to_snaplen() {
        let dir = tempfile::tempdir().unwrap();
        let handle = LinkOnly {
            link_type: LinkType::Ethernet,
            snaplen: 96,
        };
        let path = write_dump(&dir, &handle, &[frame(200, 1)]);

        let device = DeviceDescriptor::new(path.display().to_string(), "file");
        let mut replay = ReplaySource::new().open(&device).unwrap();
        let (replayed, _) = drain(&mut replay, 8);

        assert_eq!(replayed[0].data.len(), 96);
        assert_eq!(replayed[0].meta.declared_len, 200);
    }

    #[test]
    fn test_sink_reopen_truncates() {
        let dir = tempfile::tempdir().unwrap();
        write_dump(&dir, &ethernet_link(), &[frame(60, 1), frame(60, 2)]);
        let path = write_dump(&dir, &ethernet_link(), &[frame(60, 3)]);

        let device = DeviceDescriptor::new(path.display().to_string(), "file");
        let mut handle = ReplaySource::new().open(&device).unwrap();
        let (replayed, _) = drain(&mut handle, 8);
        assert_eq!(replayed.len(), 1);
    }
}

// ============================================================================
// Replay Behavior
// ============================================================================

mod replay_tests {
    use super::*;

    #[test]
    fn test_batches_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<_> = (0..10).map(|i| frame(64, i)).collect();
        let path = write_dump(&dir, &ethernet_link(), &frames);

        let device = DeviceDescriptor::new(path.display().to_string(), "file");
        let mut handle = ReplaySource::new().open(&device).unwrap();
        let (replayed, polls) = drain(&mut handle, 3);

        assert_eq!(replayed.len(), 10);
        // 3 + 3 + 3 + 1, and the last poll sees the end of file
        assert_eq!(polls, 4);

        // Stays exhausted
        let mut more = Vec::new();
        assert_eq!(handle.poll(3, &mut more).unwrap(), PollStatus::Exhausted);
        assert!(more.is_empty());
    }

    #[test]
    fn test_non_ethernet_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let raw_ip = LinkOnly {
            link_type: LinkType::Other(101),
            snaplen: 65535,
        };
        let path = write_dump(&dir, &raw_ip, &[frame(40, 1)]);

        let device = DeviceDescriptor::new(path.display().to_string(), "file");
        let err = open_ethernet(&mut ReplaySource::new(), &device).err().unwrap();
        assert!(matches!(
            err,
            CaptureError::UnsupportedLinkType { link_type: 101, .. }
        ));
        assert!(err.is_startup_fatal());
    }

    #[test]
    fn test_missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let device = DeviceDescriptor::new(dir.path().join("nope.pcap").display().to_string(), "file");
        let err = ReplaySource::new().open(&device).err().unwrap();
        assert!(matches!(err, CaptureError::OpenFailed { .. }));
    }

    #[test]
    fn test_garbage_file_fails_to_open() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a pcap file").unwrap();
        file.flush().unwrap();

        let device = DeviceDescriptor::new(file.path().display().to_string(), "file");
        assert!(ReplaySource::new().open(&device).is_err());
    }
}
