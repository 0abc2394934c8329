//! Decoded packet summary records

use std::time::SystemTime;

use crate::display::format_timestamp;
use crate::ProtocolClass;

/// Why a record was flagged invalid
///
/// A flagged record is still counted and displayed; the flag only tells the
/// reader that its classification is best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Anomaly {
    /// IPv4 header length field below the 20-byte minimum
    BadHeaderLength {
        /// Header length in bytes as declared by the IHL nibble
        declared: usize,
    },
    /// Captured bytes end before the fixed network header does
    TruncatedHeader {
        /// Bytes the fixed header requires
        needed: usize,
        /// Bytes actually captured after the Ethernet header
        captured: usize,
    },
    /// EtherType and IP version nibble disagree
    VersionMismatch {
        /// Version found in the header
        version: u8,
    },
}

impl Anomaly {
    /// Short description for status display
    pub fn describe(&self) -> String {
        match self {
            Anomaly::BadHeaderLength { declared } => {
                format!("bad header length ({} bytes)", declared)
            }
            Anomaly::TruncatedHeader { needed, captured } => {
                format!("truncated header ({}/{} bytes)", captured, needed)
            }
            Anomaly::VersionMismatch { version } => format!("unexpected IP version {}", version),
        }
    }
}

/// One decoded packet, ready for display
///
/// Records are created once by the decoder and only ever handed out by
/// shared reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryRecord {
    /// Wall-clock time the frame was decoded
    pub captured_at: SystemTime,
    /// Source address (IP, or MAC for non-IP frames)
    pub source: String,
    /// Destination address (IP, or MAC for non-IP frames)
    pub destination: String,
    /// Protocol class
    pub protocol: ProtocolClass,
    /// Length of the frame on the wire
    pub length: u32,
    /// Bytes from the transport header on (hex mode only)
    pub payload: Option<Vec<u8>>,
    /// Set when the network header was malformed
    pub anomaly: Option<Anomaly>,
}

impl SummaryRecord {
    /// Whether the record decoded without anomalies
    pub fn is_valid(&self) -> bool {
        self.anomaly.is_none()
    }

    /// Timestamp as `HH:MM:SS.mmm` local time
    pub fn timestamp_display(&self) -> String {
        format_timestamp(self.captured_at)
    }

    /// Number of payload bytes retained
    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(anomaly: Option<Anomaly>) -> SummaryRecord {
        SummaryRecord {
            captured_at: SystemTime::now(),
            source: "10.0.0.1".into(),
            destination: "10.0.0.2".into(),
            protocol: ProtocolClass::Tcp,
            length: 60,
            payload: None,
            anomaly,
        }
    }

    #[test]
    fn test_validity() {
        assert!(record(None).is_valid());
        assert!(!record(Some(Anomaly::BadHeaderLength { declared: 12 })).is_valid());
    }

    #[test]
    fn test_anomaly_description() {
        assert_eq!(
            Anomaly::BadHeaderLength { declared: 12 }.describe(),
            "bad header length (12 bytes)"
        );
        assert_eq!(
            Anomaly::TruncatedHeader {
                needed: 20,
                captured: 6
            }
            .describe(),
            "truncated header (6/20 bytes)"
        );
    }

    #[test]
    fn test_payload_len() {
        let mut r = record(None);
        assert_eq!(r.payload_len(), 0);
        r.payload = Some(vec![1, 2, 3]);
        assert_eq!(r.payload_len(), 3);
    }
}
