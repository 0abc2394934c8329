//! Ethernet II header fields
//!
//! # Format
//! - bytes 0..6: destination MAC
//! - bytes 6..12: source MAC
//! - bytes 12..14: EtherType (big endian)

/// Length of an Ethernet II header without a VLAN tag
pub const ETHERNET_HEADER_LEN: usize = 14;

/// EtherType for IPv4
pub const ETHERTYPE_IPV4: u16 = 0x0800;
/// EtherType for ARP
pub const ETHERTYPE_ARP: u16 = 0x0806;
/// EtherType for IPv6
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

const MAC_LEN: usize = 6;

/// Borrowed view over an Ethernet II header
#[derive(Debug, Clone, Copy)]
pub struct EthernetHeader<'a> {
    bytes: &'a [u8; ETHERNET_HEADER_LEN],
}

impl<'a> EthernetHeader<'a> {
    /// View the start of `frame` as an Ethernet header
    ///
    /// Returns `None` if the frame is shorter than the header.
    pub fn parse(frame: &'a [u8]) -> Option<Self> {
        let bytes = frame.get(..ETHERNET_HEADER_LEN)?.try_into().ok()?;
        Some(Self { bytes })
    }

    /// Destination MAC address
    pub fn destination(&self) -> [u8; MAC_LEN] {
        let mut mac = [0u8; MAC_LEN];
        mac.copy_from_slice(&self.bytes[..MAC_LEN]);
        mac
    }

    /// Source MAC address
    pub fn source(&self) -> [u8; MAC_LEN] {
        let mut mac = [0u8; MAC_LEN];
        mac.copy_from_slice(&self.bytes[MAC_LEN..2 * MAC_LEN]);
        mac
    }

    /// EtherType field
    pub fn ether_type(&self) -> u16 {
        u16::from_be_bytes([self.bytes[12], self.bytes[13]])
    }
}

/// Format a MAC address as `aa:bb:cc:dd:ee:ff`
pub fn format_mac(mac: &[u8; MAC_LEN]) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_fields() {
        let frame = [
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // dst
            0x00, 0x1b, 0x21, 0x3a, 0x4f, 0x5e, // src
            0x08, 0x06, // ARP
            0x00, 0x01,
        ];
        let eth = EthernetHeader::parse(&frame).unwrap();

        assert_eq!(eth.ether_type(), ETHERTYPE_ARP);
        assert_eq!(format_mac(&eth.destination()), "ff:ff:ff:ff:ff:ff");
        assert_eq!(format_mac(&eth.source()), "00:1b:21:3a:4f:5e");
    }

    #[test]
    fn test_parse_short_frame() {
        assert!(EthernetHeader::parse(&[0u8; 13]).is_none());
        assert!(EthernetHeader::parse(&[]).is_none());
    }
}
