//! Traffic counters and rate sampling
//!
//! [`Counters`] are independent atomics so a renderer on another thread can
//! read them without going through the capture loop. Fields may be skewed
//! against each other for an instant; nothing relies on cross-field
//! consistency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use pkt_decode::{ProtocolClass, SummaryRecord};
use serde::{Deserialize, Serialize};

/// Running per-session counters
#[derive(Debug, Default)]
pub struct Counters {
    total: AtomicU64,
    tcp: AtomicU64,
    udp: AtomicU64,
    icmp: AtomicU64,
    other: AtomicU64,
    bytes: AtomicU64,
}

/// Point-in-time copy of [`Counters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub total: u64,
    pub tcp: u64,
    pub udp: u64,
    pub icmp: u64,
    pub other: u64,
    pub bytes: u64,
}

impl CounterSnapshot {
    /// Count for one protocol class
    pub fn class(&self, class: ProtocolClass) -> u64 {
        match class {
            ProtocolClass::Tcp => self.tcp,
            ProtocolClass::Udp => self.udp,
            ProtocolClass::Icmp => self.icmp,
            ProtocolClass::Other => self.other,
        }
    }
}

impl Counters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    fn class_counter(&self, class: ProtocolClass) -> &AtomicU64 {
        match class {
            ProtocolClass::Tcp => &self.tcp,
            ProtocolClass::Udp => &self.udp,
            ProtocolClass::Icmp => &self.icmp,
            ProtocolClass::Other => &self.other,
        }
    }

    /// Count one decoded record
    pub fn record(&self, record: &SummaryRecord) {
        self.class_counter(record.protocol)
            .fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
        self.bytes
            .fetch_add(u64::from(record.length), Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total: self.total.load(Ordering::Relaxed),
            tcp: self.tcp.load(Ordering::Relaxed),
            udp: self.udp.load(Ordering::Relaxed),
            icmp: self.icmp.load(Ordering::Relaxed),
            other: self.other.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }

    /// Reset everything to zero
    pub fn clear(&self) {
        for counter in [
            &self.total,
            &self.tcp,
            &self.udp,
            &self.icmp,
            &self.other,
            &self.bytes,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Rates derived from two counter samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rates {
    pub bytes_per_sec: u64,
    pub packets_per_sec: u64,
}

/// Samples the counters on a fixed wall-clock interval
///
/// The rate reflects the last whole interval, not packet arrival, so it
/// stays stable under bursty capture.
#[derive(Debug, Clone)]
pub struct RateSampler {
    interval: Duration,
    last_tick: Instant,
    last_bytes: u64,
    last_packets: u64,
    rates: Rates,
}

impl RateSampler {
    /// Create a sampler starting its first interval at `now`
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            last_tick: now,
            last_bytes: 0,
            last_packets: 0,
            rates: Rates::default(),
        }
    }

    /// Take a sample if an interval has elapsed; returns whether it did
    pub fn sample(&mut self, now: Instant, counters: &CounterSnapshot) -> bool {
        let elapsed = now.saturating_duration_since(self.last_tick);
        if elapsed < self.interval {
            return false;
        }

        let secs = elapsed.as_secs_f64();
        let per_sec = |delta: u64| (delta as f64 / secs).round() as u64;

        self.rates = Rates {
            bytes_per_sec: per_sec(counters.bytes.saturating_sub(self.last_bytes)),
            packets_per_sec: per_sec(counters.total.saturating_sub(self.last_packets)),
        };

        self.last_tick = now;
        self.last_bytes = counters.bytes;
        self.last_packets = counters.total;
        true
    }

    /// Latest rates
    pub fn rates(&self) -> Rates {
        self.rates
    }

    /// Restart from zeroed counters
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(self.interval, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn record(protocol: ProtocolClass, length: u32) -> SummaryRecord {
        SummaryRecord {
            captured_at: SystemTime::now(),
            source: "a".into(),
            destination: "b".into(),
            protocol,
            length,
            payload: None,
            anomaly: None,
        }
    }

    #[test]
    fn test_record_counts_class_total_and_bytes() {
        let counters = Counters::new();
        counters.record(&record(ProtocolClass::Tcp, 100));
        counters.record(&record(ProtocolClass::Tcp, 50));
        counters.record(&record(ProtocolClass::Icmp, 98));

        let snap = counters.snapshot();
        assert_eq!(snap.total, 3);
        assert_eq!(snap.tcp, 2);
        assert_eq!(snap.icmp, 1);
        assert_eq!(snap.udp, 0);
        assert_eq!(snap.bytes, 248);
        assert_eq!(snap.class(ProtocolClass::Tcp), 2);
    }

    #[test]
    fn test_clear() {
        let counters = Counters::new();
        counters.record(&record(ProtocolClass::Other, 60));
        counters.clear();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn test_rate_sampled_per_interval() {
        let start = Instant::now();
        let mut sampler = RateSampler::new(Duration::from_secs(1), start);
        let mut snap = CounterSnapshot {
            bytes: 500,
            total: 5,
            ..Default::default()
        };

        // Not yet due
        assert!(!sampler.sample(start + Duration::from_millis(400), &snap));
        assert_eq!(sampler.rates(), Rates::default());

        assert!(sampler.sample(start + Duration::from_secs(1), &snap));
        assert_eq!(sampler.rates().bytes_per_sec, 500);
        assert_eq!(sampler.rates().packets_per_sec, 5);

        snap.bytes = 800;
        snap.total = 8;
        assert!(sampler.sample(start + Duration::from_secs(2), &snap));
        assert_eq!(sampler.rates().bytes_per_sec, 300);
        assert_eq!(sampler.rates().packets_per_sec, 3);
    }

    #[test]
    fn test_late_sample_scaled_to_interval() {
        let start = Instant::now();
        let mut sampler = RateSampler::new(Duration::from_secs(1), start);
        let snap = CounterSnapshot {
            bytes: 2000,
            ..Default::default()
        };
        assert!(sampler.sample(start + Duration::from_secs(2), &snap));
        assert_eq!(sampler.rates().bytes_per_sec, 1000);
    }

    #[test]
    fn test_reset() {
        let start = Instant::now();
        let mut sampler = RateSampler::new(Duration::from_secs(1), start);
        let snap = CounterSnapshot {
            bytes: 100,
            ..Default::default()
        };
        sampler.sample(start + Duration::from_secs(1), &snap);
        sampler.reset(start + Duration::from_secs(1));
        assert_eq!(sampler.rates(), Rates::default());
    }
}
