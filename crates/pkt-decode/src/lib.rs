//! Packet Decoding Library
//!
//! This crate turns raw link-layer frames into display-ready
//! [`SummaryRecord`]s for the traffic dashboard:
//!
//! - **Ethernet**: fixed 14-byte header, EtherType dispatch
//! - **IPv4**: addresses, protocol field, header length from the IHL nibble
//! - **IPv6**: addresses and next-header field from the fixed 40-byte header
//!
//! # Architecture
//!
//! Decoding is a pure function over an owned or borrowed byte buffer. Every
//! header field is read at a fixed offset with bounds-checked slicing, so a
//! truncated capture can never cause a read past the captured bytes.
//!
//! Malformed network headers do not fail the decode: the record is still
//! produced with a best-effort classification and an [`Anomaly`] attached.
//! Only frames too short to hold an Ethernet header are rejected.
//!
//! # Example
//!
//! ```rust
//! use std::time::SystemTime;
//! use pkt_decode::{decode, DecodeOptions, FrameMeta, ProtocolClass};
//!
//! let mut frame = vec![0u8; 14 + 20];
//! frame[12..14].copy_from_slice(&[0x08, 0x00]); // IPv4
//! frame[14] = 0x45; // version 4, IHL 5
//! frame[23] = 17; // UDP
//!
//! let meta = FrameMeta::new(frame.len() as u32, frame.len() as u32, SystemTime::now());
//! let record = decode(&frame, &meta, DecodeOptions::default()).unwrap();
//! assert_eq!(record.protocol, ProtocolClass::Udp);
//! assert!(record.payload.is_none());
//! ```

pub mod decoder;
pub mod display;
pub mod error;
pub mod ethernet;
pub mod ip;
pub mod record;

pub use decoder::{decode, decode_at, DecodeOptions, FrameMeta};
pub use error::DecodeError;
pub use record::{Anomaly, SummaryRecord};

/// IP protocol number for ICMP
pub const IPPROTO_ICMP: u8 = 1;
/// IP protocol number for TCP
pub const IPPROTO_TCP: u8 = 6;
/// IP protocol number for UDP
pub const IPPROTO_UDP: u8 = 17;
/// IPv6 next-header value for ICMPv6
pub const IPPROTO_ICMPV6: u8 = 58;

/// Protocol class a decoded frame is counted and displayed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolClass {
    /// Transmission Control Protocol
    Tcp,
    /// User Datagram Protocol
    Udp,
    /// ICMP (v4 or v6)
    Icmp,
    /// Anything else, including non-IP frames
    Other,
}

impl ProtocolClass {
    /// All classes, in display order
    pub const ALL: [ProtocolClass; 4] = [
        ProtocolClass::Tcp,
        ProtocolClass::Udp,
        ProtocolClass::Icmp,
        ProtocolClass::Other,
    ];

    /// Classify an IP protocol / IPv6 next-header number
    pub fn from_ip_protocol(proto: u8) -> Self {
        match proto {
            IPPROTO_TCP => ProtocolClass::Tcp,
            IPPROTO_UDP => ProtocolClass::Udp,
            IPPROTO_ICMP | IPPROTO_ICMPV6 => ProtocolClass::Icmp,
            _ => ProtocolClass::Other,
        }
    }

    /// Short column label used in the packet table
    pub fn label(&self) -> &'static str {
        match self {
            ProtocolClass::Tcp => "TCP",
            ProtocolClass::Udp => "UDP",
            ProtocolClass::Icmp => "ICMP",
            ProtocolClass::Other => "OTH",
        }
    }
}

impl std::fmt::Display for ProtocolClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_classification() {
        assert_eq!(ProtocolClass::from_ip_protocol(6), ProtocolClass::Tcp);
        assert_eq!(ProtocolClass::from_ip_protocol(17), ProtocolClass::Udp);
        assert_eq!(ProtocolClass::from_ip_protocol(1), ProtocolClass::Icmp);
        assert_eq!(ProtocolClass::from_ip_protocol(58), ProtocolClass::Icmp);
        assert_eq!(ProtocolClass::from_ip_protocol(47), ProtocolClass::Other);
    }

    #[test]
    fn test_labels() {
        let labels: Vec<_> = ProtocolClass::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["TCP", "UDP", "ICMP", "OTH"]);
        assert_eq!(ProtocolClass::Icmp.to_string(), "ICMP");
    }
}
