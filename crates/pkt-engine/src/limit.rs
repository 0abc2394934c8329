//! Capture-limit policy
//!
//! At most one limit is active. Evaluation is a pure predicate over the
//! counters (and the clock, for time limits), so once a limit is hit it stays
//! hit while the counters only grow.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::stats::CounterSnapshot;

/// What a limit counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitKind {
    Packets,
    Bytes,
    Seconds,
}

impl LimitKind {
    /// All kinds, in popup order
    pub const ALL: [LimitKind; 3] = [LimitKind::Packets, LimitKind::Bytes, LimitKind::Seconds];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            LimitKind::Packets => "Packets",
            LimitKind::Bytes => "Bytes",
            LimitKind::Seconds => "Seconds",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The active stop condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureLimit {
    #[default]
    None,
    Packets {
        target: u64,
    },
    Bytes {
        target: u64,
    },
    Seconds {
        target: u64,
        started_at: Instant,
    },
}

/// How far a limit has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitProgress {
    pub kind: LimitKind,
    pub current: u64,
    pub target: u64,
}

impl CaptureLimit {
    /// Replace the limit, stamping `now` as the origin of a time limit
    pub fn set_at(&mut self, kind: LimitKind, target: u64, now: Instant) {
        *self = match kind {
            LimitKind::Packets => CaptureLimit::Packets { target },
            LimitKind::Bytes => CaptureLimit::Bytes { target },
            LimitKind::Seconds => CaptureLimit::Seconds {
                target,
                started_at: now,
            },
        };
    }

    /// Replace the limit, starting a time limit now
    pub fn set(&mut self, kind: LimitKind, target: u64) {
        self.set_at(kind, target, Instant::now());
    }

    /// Remove the limit
    pub fn clear(&mut self) {
        *self = CaptureLimit::None;
    }

    /// Whether a limit is set
    pub fn is_active(&self) -> bool {
        !matches!(self, CaptureLimit::None)
    }

    /// Whether the limit has been reached at `now`
    pub fn hit_at(&self, counters: &CounterSnapshot, now: Instant) -> bool {
        match *self {
            CaptureLimit::None => false,
            CaptureLimit::Packets { target } => counters.total >= target,
            CaptureLimit::Bytes { target } => counters.bytes >= target,
            CaptureLimit::Seconds { target, started_at } => {
                now.saturating_duration_since(started_at) >= Duration::from_secs(target)
            }
        }
    }

    /// Whether the limit has been reached
    pub fn hit(&self, counters: &CounterSnapshot) -> bool {
        self.hit_at(counters, Instant::now())
    }

    /// Progress toward the target, if a limit is set
    pub fn progress_at(&self, counters: &CounterSnapshot, now: Instant) -> Option<LimitProgress> {
        let (kind, current, target) = match *self {
            CaptureLimit::None => return None,
            CaptureLimit::Packets { target } => (LimitKind::Packets, counters.total, target),
            CaptureLimit::Bytes { target } => (LimitKind::Bytes, counters.bytes, target),
            CaptureLimit::Seconds { target, started_at } => (
                LimitKind::Seconds,
                now.saturating_duration_since(started_at).as_secs(),
                target,
            ),
        };
        Some(LimitProgress {
            kind,
            current: current.min(target),
            target,
        })
    }
}
