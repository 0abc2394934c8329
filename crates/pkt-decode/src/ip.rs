//! IPv4 / IPv6 fixed-offset field extraction
//!
//! Both views wrap whatever bytes were captured after the Ethernet header.
//! Every accessor returns `None` when the field lies beyond the captured
//! bytes instead of reading past the buffer.
//!
//! # IPv4 layout (fixed part)
//! - byte 0: version (high nibble), IHL in 32-bit words (low nibble)
//! - bytes 2..4: total length
//! - byte 9: protocol
//! - bytes 12..16 / 16..20: source / destination address
//!
//! # IPv6 layout
//! - byte 0: version (high nibble)
//! - byte 6: next header
//! - bytes 8..24 / 24..40: source / destination address

use std::net::{Ipv4Addr, Ipv6Addr};

/// Smallest valid IPv4 header (IHL = 5)
pub const IPV4_MIN_HEADER_LEN: usize = 20;

/// Fixed IPv6 header length
pub const IPV6_HEADER_LEN: usize = 40;

const IHL_MASK: u8 = 0x0F;
const VERSION_SHIFT: u8 = 4;

/// Read a fixed-size array at `offset`, if fully captured
fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Option<[u8; N]> {
    bytes.get(offset..offset + N)?.try_into().ok()
}

/// Field view over a (possibly truncated) IPv4 header
#[derive(Debug, Clone, Copy)]
pub struct Ipv4Fields<'a> {
    bytes: &'a [u8],
}

impl<'a> Ipv4Fields<'a> {
    /// Wrap the bytes starting at the network-layer offset
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Number of bytes available to this view
    pub fn captured_len(&self) -> usize {
        self.bytes.len()
    }

    /// IP version nibble
    pub fn version(&self) -> Option<u8> {
        self.bytes.first().map(|b| b >> VERSION_SHIFT)
    }

    /// Declared header length in bytes (IHL × 4)
    pub fn header_len(&self) -> Option<usize> {
        self.bytes.first().map(|b| usize::from(b & IHL_MASK) * 4)
    }

    /// Total length field
    pub fn total_len(&self) -> Option<u16> {
        read_array::<2>(self.bytes, 2).map(u16::from_be_bytes)
    }

    /// Protocol field
    pub fn protocol(&self) -> Option<u8> {
        self.bytes.get(9).copied()
    }

    /// Source address
    pub fn source(&self) -> Option<Ipv4Addr> {
        read_array::<4>(self.bytes, 12).map(Ipv4Addr::from)
    }

    /// Destination address
    pub fn destination(&self) -> Option<Ipv4Addr> {
        read_array::<4>(self.bytes, 16).map(Ipv4Addr::from)
    }
}

/// Field view over a (possibly truncated) IPv6 fixed header
#[derive(Debug, Clone, Copy)]
pub struct Ipv6Fields<'a> {
    bytes: &'a [u8],
}

impl<'a> Ipv6Fields<'a> {
    /// Wrap the bytes starting at the network-layer offset
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Number of bytes available to this view
    pub fn captured_len(&self) -> usize {
        self.bytes.len()
    }

    /// IP version nibble
    pub fn version(&self) -> Option<u8> {
        self.bytes.first().map(|b| b >> VERSION_SHIFT)
    }

    /// Next-header field
    pub fn next_header(&self) -> Option<u8> {
        self.bytes.get(6).copied()
    }

    /// Source address
    pub fn source(&self) -> Option<Ipv6Addr> {
        read_array::<16>(self.bytes, 8).map(Ipv6Addr::from)
    }

    /// Destination address
    pub fn destination(&self) -> Option<Ipv6Addr> {
        read_array::<16>(self.bytes, 24).map(Ipv6Addr::from)
    }
}
