//! Engine configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Capture engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Records kept in the history store
    pub history_capacity: usize,
    /// Maximum frames pulled from the source per iteration
    pub batch_size: usize,
    /// Pause between iterations (ms)
    pub idle_wait_ms: u64,
    /// Rate sampling interval (ms)
    pub rate_interval_ms: u64,
    /// Snapshot length for live capture
    pub snaplen: u32,
    /// Start with payload capture and the hex pane on
    pub show_hex: bool,
    /// Write raw frames to this pcap file
    pub dump_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            batch_size: 64,
            idle_wait_ms: 35,
            rate_interval_ms: 1000,
            snaplen: 65535,
            show_hex: false,
            dump_path: None,
        }
    }
}

impl EngineConfig {
    /// Pause between iterations
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    /// Rate sampling interval
    pub fn rate_interval(&self) -> Duration {
        Duration::from_millis(self.rate_interval_ms)
    }
}
