//! Frame decoder
//!
//! Converts one captured Ethernet frame into a [`SummaryRecord`]. Decoding is
//! stateless: the same bytes, metadata and options always produce the same
//! record (apart from the wall-clock timestamp, which `decode_at` takes
//! explicitly).

use std::time::SystemTime;

use tracing::trace;

use crate::error::DecodeError;
use crate::ethernet::{
    format_mac, EthernetHeader, ETHERNET_HEADER_LEN, ETHERTYPE_IPV4, ETHERTYPE_IPV6,
};
use crate::ip::{Ipv4Fields, Ipv6Fields, IPV4_MIN_HEADER_LEN, IPV6_HEADER_LEN};
use crate::record::{Anomaly, SummaryRecord};
use crate::ProtocolClass;

/// Placeholder for an address that was not captured
const UNKNOWN_ADDRESS: &str = "?";

/// Capture metadata delivered alongside each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMeta {
    /// Bytes actually captured (may be less than the wire length)
    pub captured_len: u32,
    /// Length of the frame on the wire
    pub declared_len: u32,
    /// Arrival time reported by the capture source
    pub arrival: SystemTime,
}

impl FrameMeta {
    /// Create frame metadata
    pub fn new(captured_len: u32, declared_len: u32, arrival: SystemTime) -> Self {
        Self {
            captured_len,
            declared_len,
            arrival,
        }
    }

    /// Metadata for a fully captured frame of `len` bytes arriving now
    pub fn complete(len: usize) -> Self {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        Self::new(len, len, SystemTime::now())
    }
}

/// Per-session decoding options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Copy payload bytes into the record (hex-dump mode)
    pub capture_payload: bool,
}

impl DecodeOptions {
    /// Options with payload capture switched on or off
    pub fn with_payload(capture_payload: bool) -> Self {
        Self { capture_payload }
    }
}

/// Network-layer summary before payload handling
struct NetworkSummary {
    source: String,
    destination: String,
    protocol: ProtocolClass,
    /// Offset of the transport header relative to the network header
    transport_offset: usize,
    anomaly: Option<Anomaly>,
}

/// Decode a frame, stamping the record with the current wall-clock time
pub fn decode(
    frame: &[u8],
    meta: &FrameMeta,
    options: DecodeOptions,
) -> Result<SummaryRecord, DecodeError> {
    decode_at(frame, meta, options, SystemTime::now())
}

/// Decode a frame, stamping the record with `now`
pub fn decode_at(
    frame: &[u8],
    meta: &FrameMeta,
    options: DecodeOptions,
    now: SystemTime,
) -> Result<SummaryRecord, DecodeError> {
    // Never look past what the source says it captured
    let captured_len = frame.len().min(meta.captured_len as usize);
    let captured = &frame[..captured_len];

    let eth = EthernetHeader::parse(captured).ok_or(DecodeError::RuntFrame {
        captured: captured_len,
        needed: ETHERNET_HEADER_LEN,
    })?;
    let network = &captured[ETHERNET_HEADER_LEN..];

    let summary = match eth.ether_type() {
        ETHERTYPE_IPV4 => decode_ipv4(network),
        ETHERTYPE_IPV6 => decode_ipv6(network),
        _ => NetworkSummary {
            source: format_mac(&eth.source()),
            destination: format_mac(&eth.destination()),
            protocol: ProtocolClass::Other,
            transport_offset: 0,
            anomaly: None,
        },
    };

    if let Some(anomaly) = &summary.anomaly {
        trace!("Frame flagged: {}", anomaly.describe());
    }

    let payload = options.capture_payload.then(|| {
        network
            .get(summary.transport_offset..)
            .map(<[u8]>::to_vec)
            .unwrap_or_default()
    });

    Ok(SummaryRecord {
        captured_at: now,
        source: summary.source,
        destination: summary.destination,
        protocol: summary.protocol,
        length: meta.declared_len,
        payload,
        anomaly: summary.anomaly,
    })
}

fn address_or_unknown<A: ToString>(addr: Option<A>) -> String {
    addr.map_or_else(|| UNKNOWN_ADDRESS.to_string(), |a| a.to_string())
}

fn decode_ipv4(network: &[u8]) -> NetworkSummary {
    let ip = Ipv4Fields::new(network);
    let header_len = ip.header_len().unwrap_or(0);

    let anomaly = if ip.captured_len() > 0 && header_len < IPV4_MIN_HEADER_LEN {
        Some(Anomaly::BadHeaderLength {
            declared: header_len,
        })
    } else if ip.captured_len() < IPV4_MIN_HEADER_LEN {
        Some(Anomaly::TruncatedHeader {
            needed: IPV4_MIN_HEADER_LEN,
            captured: ip.captured_len(),
        })
    } else {
        match ip.version() {
            Some(4) => None,
            Some(version) => Some(Anomaly::VersionMismatch { version }),
            None => None,
        }
    };

    NetworkSummary {
        source: address_or_unknown(ip.source()),
        destination: address_or_unknown(ip.destination()),
        protocol: ip
            .protocol()
            .map_or(ProtocolClass::Other, ProtocolClass::from_ip_protocol),
        transport_offset: header_len,
        anomaly,
    }
}

fn decode_ipv6(network: &[u8]) -> NetworkSummary {
    let ip = Ipv6Fields::new(network);

    let anomaly = if ip.captured_len() < IPV6_HEADER_LEN {
        Some(Anomaly::TruncatedHeader {
            needed: IPV6_HEADER_LEN,
            captured: ip.captured_len(),
        })
    } else {
        match ip.version() {
            Some(6) | None => None,
            Some(version) => Some(Anomaly::VersionMismatch { version }),
        }
    };

    NetworkSummary {
        source: address_or_unknown(ip.source()),
        destination: address_or_unknown(ip.destination()),
        protocol: ip
            .next_header()
            .map_or(ProtocolClass::Other, ProtocolClass::from_ip_protocol),
        transport_offset: IPV6_HEADER_LEN,
        anomaly,
    }
}
