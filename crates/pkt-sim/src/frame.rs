//! Ethernet frame builder
//!
//! Produces wire-accurate Ethernet frames carrying IPv4, IPv6 or non-IP
//! payloads, including deliberately malformed IPv4 headers.

use std::net::{Ipv4Addr, Ipv6Addr};

use pkt_capture::Frame;
use pkt_decode::ethernet::{ETHERTYPE_ARP, ETHERTYPE_IPV4, ETHERTYPE_IPV6};
use pkt_decode::{IPPROTO_ICMP, IPPROTO_TCP, IPPROTO_UDP};

const IPV4_FIXED_LEN: usize = 20;
const ARP_BODY_LEN: usize = 28;

#[derive(Debug, Clone)]
enum Network {
    Ipv4 {
        source: Ipv4Addr,
        destination: Ipv4Addr,
        protocol: u8,
        /// Header length in 32-bit words
        ihl: u8,
        version: u8,
    },
    Ipv6 {
        source: Ipv6Addr,
        destination: Ipv6Addr,
        next_header: u8,
    },
    Raw {
        ether_type: u16,
    },
}

/// Builds one Ethernet frame
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    source_mac: [u8; 6],
    destination_mac: [u8; 6],
    network: Network,
    payload: Vec<u8>,
}

impl FrameBuilder {
    fn with_network(network: Network) -> Self {
        Self {
            source_mac: [0x02, 0x00, 0x00, 0x00, 0x00, 0x01],
            destination_mac: [0x02, 0x00, 0x00, 0x00, 0x00, 0x02],
            network,
            payload: Vec::new(),
        }
    }

    /// IPv4 frame with the given protocol number and a 20-byte header
    pub fn ipv4(source: Ipv4Addr, destination: Ipv4Addr, protocol: u8) -> Self {
        Self::with_network(Network::Ipv4 {
            source,
            destination,
            protocol,
            ihl: 5,
            version: 4,
        })
    }

    /// IPv4 TCP frame
    pub fn tcp(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self::ipv4(source, destination, IPPROTO_TCP)
    }

    /// IPv4 UDP frame
    pub fn udp(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self::ipv4(source, destination, IPPROTO_UDP)
    }

    /// IPv4 ICMP frame
    pub fn icmp(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self::ipv4(source, destination, IPPROTO_ICMP)
    }

    /// IPv6 frame with the given next-header value
    pub fn ipv6(source: Ipv6Addr, destination: Ipv6Addr, next_header: u8) -> Self {
        Self::with_network(Network::Ipv6 {
            source,
            destination,
            next_header,
        })
    }

    /// ARP request (non-IP)
    pub fn arp() -> Self {
        let mut builder = Self::with_network(Network::Raw {
            ether_type: ETHERTYPE_ARP,
        });
        builder.destination_mac = [0xff; 6];
        builder.payload = vec![0; ARP_BODY_LEN];
        builder
    }

    /// Set the IPv4 IHL nibble (header length in 32-bit words)
    ///
    /// Values below 5 are malformed; the fixed 20 bytes are still emitted so
    /// the addresses remain readable.
    pub fn with_ihl(mut self, ihl: u8) -> Self {
        if let Network::Ipv4 { ihl: current, .. } = &mut self.network {
            *current = ihl & 0x0F;
        }
        self
    }

    /// Set the IPv4 version nibble
    pub fn with_version(mut self, version: u8) -> Self {
        if let Network::Ipv4 {
            version: current, ..
        } = &mut self.network
        {
            *current = version & 0x0F;
        }
        self
    }

    /// Set the bytes following the network header
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Set source and destination MAC addresses
    pub fn with_macs(mut self, source: [u8; 6], destination: [u8; 6]) -> Self {
        self.source_mac = source;
        self.destination_mac = destination;
        self
    }

    /// Encode the frame
    pub fn build(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(14 + 60 + self.payload.len());
        frame.extend_from_slice(&self.destination_mac);
        frame.extend_from_slice(&self.source_mac);

        match &self.network {
            Network::Ipv4 {
                source,
                destination,
                protocol,
                ihl,
                version,
            } => {
                frame.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
                let header_len = (usize::from(*ihl) * 4).max(IPV4_FIXED_LEN);
                let total = (header_len + self.payload.len()).min(usize::from(u16::MAX)) as u16;

                frame.push((version << 4) | ihl);
                frame.push(0);
                frame.extend_from_slice(&total.to_be_bytes());
                frame.extend_from_slice(&[0x00, 0x01, 0x40, 0x00]); // id, DF
                frame.extend_from_slice(&[64, *protocol, 0, 0]); // TTL, protocol, checksum
                frame.extend_from_slice(&source.octets());
                frame.extend_from_slice(&destination.octets());
                frame.resize(frame.len() + header_len - IPV4_FIXED_LEN, 0); // options
            }
            Network::Ipv6 {
                source,
                destination,
                next_header,
            } => {
                frame.extend_from_slice(&ETHERTYPE_IPV6.to_be_bytes());
                let payload_len = self.payload.len().min(usize::from(u16::MAX)) as u16;

                frame.extend_from_slice(&[0x60, 0, 0, 0]);
                frame.extend_from_slice(&payload_len.to_be_bytes());
                frame.push(*next_header);
                frame.push(64); // hop limit
                frame.extend_from_slice(&source.octets());
                frame.extend_from_slice(&destination.octets());
            }
            Network::Raw { ether_type } => {
                frame.extend_from_slice(&ether_type.to_be_bytes());
            }
        }

        frame.extend_from_slice(&self.payload);
        frame
    }

    /// Encode as a fully captured frame arriving now
    pub fn frame(&self) -> Frame {
        Frame::complete(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkt_decode::{decode, Anomaly, DecodeOptions, FrameMeta, ProtocolClass};

    fn decode_frame(bytes: &[u8]) -> pkt_decode::SummaryRecord {
        decode(
            bytes,
            &FrameMeta::complete(bytes.len()),
            DecodeOptions::with_payload(true),
        )
        .unwrap()
    }

    #[test]
    fn test_tcp_frame_decodes() {
        let bytes = FrameBuilder::tcp(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2))
            .with_payload(vec![7; 20])
            .build();
        assert_eq!(bytes.len(), 14 + 20 + 20);

        let record = decode_frame(&bytes);
        assert_eq!(record.protocol, ProtocolClass::Tcp);
        assert_eq!(record.source, "10.0.0.1");
        assert_eq!(record.payload, Some(vec![7; 20]));
        assert!(record.is_valid());
    }

    #[test]
    fn test_bad_ihl_still_has_addresses() {
        let bytes = FrameBuilder::udp(Ipv4Addr::new(1, 2, 3, 4), Ipv4Addr::new(5, 6, 7, 8))
            .with_ihl(3)
            .build();
        let record = decode_frame(&bytes);

        assert_eq!(record.anomaly, Some(Anomaly::BadHeaderLength { declared: 12 }));
        assert_eq!(record.destination, "5.6.7.8");
    }

    #[test]
    fn test_ipv4_options_extend_header() {
        let bytes = FrameBuilder::icmp(Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST)
            .with_ihl(6)
            .with_payload(vec![1, 2])
            .build();
        assert_eq!(bytes.len(), 14 + 24 + 2);
        assert_eq!(decode_frame(&bytes).payload, Some(vec![1, 2]));
    }

    #[test]
    fn test_ipv6_and_arp() {
        let v6 = FrameBuilder::ipv6(Ipv6Addr::LOCALHOST, Ipv6Addr::LOCALHOST, 58).build();
        assert_eq!(decode_frame(&v6).protocol, ProtocolClass::Icmp);

        let arp = decode_frame(&FrameBuilder::arp().build());
        assert_eq!(arp.protocol, ProtocolClass::Other);
        assert_eq!(arp.destination, "ff:ff:ff:ff:ff:ff");
    }
}
