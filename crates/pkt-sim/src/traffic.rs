//! Synthetic traffic generator
//!
//! Produces a repeatable mix of TCP, UDP, ICMP and ARP frames between a small
//! pool of hosts. The sequence depends only on the seed.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::frame::FrameBuilder;

/// Traffic generator settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Seed for the frame sequence
    pub seed: u64,
    /// Frames generated per poll
    pub frames_per_poll: usize,
    /// Percentage of frames with a malformed IPv4 header
    pub malformed_percent: u8,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            frames_per_poll: 3,
            malformed_percent: 1,
        }
    }
}

/// Deterministic frame generator
#[derive(Debug, Clone)]
pub struct TrafficGenerator {
    config: TrafficConfig,
    state: u64,
}

impl TrafficGenerator {
    /// Create a generator
    pub fn new(config: TrafficConfig) -> Self {
        Self {
            config,
            // xorshift must not start at zero
            state: config.seed.max(1),
        }
    }

    /// Frames generated per poll
    pub fn frames_per_poll(&self) -> usize {
        self.config.frames_per_poll
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n.max(1)
    }

    fn host(&mut self) -> Ipv4Addr {
        Ipv4Addr::new(192, 168, 1, 2 + self.below(20) as u8)
    }

    /// Build the next frame
    pub fn next_frame(&mut self) -> Vec<u8> {
        let source = self.host();
        let destination = self.host();
        let payload_len = self.below(1200) as usize;
        let payload = vec![0x5A; payload_len];

        let builder = match self.below(100) {
            0..=54 => FrameBuilder::tcp(source, destination),
            55..=84 => FrameBuilder::udp(source, destination),
            85..=94 => FrameBuilder::icmp(source, destination),
            _ => return FrameBuilder::arp().build(),
        };

        let builder = if self.below(100) < u64::from(self.config.malformed_percent) {
            builder.with_ihl(3)
        } else {
            builder
        };

        builder.with_payload(payload).build()
    }
}
