//! Session state
//!
//! Everything one capture session owns: history, counters, rate sampler,
//! limit, selection and mode flags. The capture loop is the only writer.
//! Only the counters are shared, through an `Arc`, so they can be read from
//! another thread.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use pkt_capture::DeviceDescriptor;
use pkt_decode::{DecodeOptions, SummaryRecord};
use serde::{Deserialize, Serialize};

use crate::command::Popup;
use crate::config::EngineConfig;
use crate::history::HistoryStore;
use crate::limit::{CaptureLimit, LimitKind, LimitProgress};
use crate::selection::Selection;
use crate::stats::{CounterSnapshot, Counters, RateSampler, Rates};

/// Capture loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl CaptureState {
    /// Whether the loop should keep iterating
    pub fn is_active(&self) -> bool {
        matches!(self, CaptureState::Running | CaptureState::Paused)
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Operator quit
    Quit,
    /// The capture limit was reached
    LimitReached(LimitKind),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Quit => write!(f, "quit"),
            StopReason::LimitReached(kind) => {
                write!(f, "{} limit reached", kind.label().to_lowercase())
            }
        }
    }
}

/// State of one capture session
#[derive(Debug)]
pub struct Session {
    history: HistoryStore,
    counters: Arc<Counters>,
    rate: RateSampler,
    limit: CaptureLimit,
    selection: Selection,
    state: CaptureState,
    show_hex: bool,
    popup: Option<Popup>,
    decode_failures: u64,
    source_exhausted: bool,
}

impl Session {
    /// Create an idle session
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            history: HistoryStore::new(config.history_capacity),
            counters: Arc::new(Counters::new()),
            rate: RateSampler::new(config.rate_interval(), Instant::now()),
            limit: CaptureLimit::None,
            selection: Selection::new(),
            state: CaptureState::Idle,
            show_hex: config.show_hex,
            popup: None,
            decode_failures: 0,
            source_exhausted: false,
        }
    }

    /// Store and count one record, keeping the selection on the same row
    pub fn ingest(&mut self, record: SummaryRecord) {
        self.counters.record(&record);
        self.history.append(record);
        self.selection.on_append(self.history.len());
    }

    /// Count a frame that could not be decoded
    pub fn record_decode_failure(&mut self) {
        self.decode_failures += 1;
    }

    /// Empty the history, zero the counters and reset the selection and limit
    pub fn clear(&mut self, now: Instant) {
        self.history.clear();
        self.counters.clear();
        self.rate.reset(now);
        self.selection.reset();
        self.limit.clear();
        self.decode_failures = 0;
        self.source_exhausted = false;
    }

    /// Sample rates if the interval has elapsed
    pub fn sample_rate(&mut self, now: Instant) {
        let counters = self.counters.snapshot();
        self.rate.sample(now, &counters);
    }

    /// History store
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Shared counters
    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }

    /// Current counter values
    pub fn counter_snapshot(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Current rates
    pub fn rates(&self) -> Rates {
        self.rate.rates()
    }

    /// Active limit
    pub fn limit(&self) -> &CaptureLimit {
        &self.limit
    }

    /// Mutable limit
    pub fn limit_mut(&mut self) -> &mut CaptureLimit {
        &mut self.limit
    }

    /// Selection
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Mutable selection
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Loop state
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Set the loop state
    pub fn set_state(&mut self, state: CaptureState) {
        self.state = state;
    }

    /// Whether payloads are captured and the hex pane shown
    pub fn show_hex(&self) -> bool {
        self.show_hex
    }

    /// Toggle hex mode; affects records decoded from now on
    pub fn toggle_hex(&mut self) {
        self.show_hex = !self.show_hex;
    }

    /// Decoder options for the current mode
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::with_payload(self.show_hex)
    }

    /// Open popup
    pub fn popup(&self) -> Option<Popup> {
        self.popup
    }

    /// Open or close a popup
    pub fn set_popup(&mut self, popup: Option<Popup>) {
        self.popup = popup;
    }

    /// Frames shorter than an Ethernet header
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures
    }

    /// Whether the source reported it has no more frames
    pub fn source_exhausted(&self) -> bool {
        self.source_exhausted
    }

    /// Mark the source exhausted
    pub fn mark_source_exhausted(&mut self) {
        self.source_exhausted = true;
    }
}

/// Read-only view handed to the renderer each iteration
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub history: &'a HistoryStore,
    pub counters: CounterSnapshot,
    pub rates: Rates,
    pub selection: Selection,
    pub state: CaptureState,
    pub show_hex: bool,
    pub popup: Option<Popup>,
    pub devices: &'a [DeviceDescriptor],
    pub current_device: usize,
    pub limit: Option<LimitProgress>,
    pub decode_failures: u64,
    pub source_exhausted: bool,
    pub recording: bool,
}

impl<'a> Snapshot<'a> {
    /// Rows in the viewport, newest first
    pub fn visible_records(
        &self,
        rows: usize,
    ) -> impl Iterator<Item = &'a SummaryRecord> + Clone + 'a {
        self.history
            .view_newest_first(self.selection.first_visible(), rows)
    }

    /// The selected record
    pub fn selected_record(&self) -> Option<&'a SummaryRecord> {
        self.history.get_newest(self.selection.selected())
    }

    /// The device being captured
    pub fn device(&self) -> Option<&'a DeviceDescriptor> {
        self.devices.get(self.current_device)
    }

    /// Whether ingestion is paused
    pub fn is_paused(&self) -> bool {
        self.state == CaptureState::Paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkt_decode::ProtocolClass;
    use std::time::SystemTime;

    fn record(length: u32) -> SummaryRecord {
        SummaryRecord {
            captured_at: SystemTime::now(),
            source: "10.0.0.1".into(),
            destination: "10.0.0.2".into(),
            protocol: ProtocolClass::Tcp,
            length,
            payload: None,
            anomaly: None,
        }
    }

    #[test]
    fn test_ingest_updates_store_counters_and_selection() {
        let mut session = Session::new(&EngineConfig::default());
        session.ingest(record(60));
        session.ingest(record(60));
        let len = session.history().len();
        session.selection_mut().down(len);

        session.ingest(record(100));
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.counter_snapshot().bytes, 220);
        assert_eq!(session.selection().selected(), 2);
    }

    #[test]
    fn test_clear_twice_same_as_once() {
        let mut session = Session::new(&EngineConfig::default());
        session.ingest(record(60));
        session.limit_mut().set(LimitKind::Packets, 3);
        session.record_decode_failure();

        let now = Instant::now();
        session.clear(now);
        let counters = session.counter_snapshot();
        session.clear(now);

        assert!(session.history().is_empty());
        assert_eq!(session.counter_snapshot(), counters);
        assert_eq!(counters, CounterSnapshot::default());
        assert_eq!(session.selection(), Selection::new());
        assert!(!session.limit().is_active());
        assert_eq!(session.decode_failures(), 0);
    }

    #[test]
    fn test_shared_counters_follow_session() {
        let mut session = Session::new(&EngineConfig::default());
        let shared = session.counters();
        session.ingest(record(60));
        assert_eq!(shared.snapshot().total, 1);
    }

    #[test]
    fn test_hex_mode_drives_decode_options() {
        let mut session = Session::new(&EngineConfig::default());
        assert!(!session.decode_options().capture_payload);
        session.toggle_hex();
        assert!(session.decode_options().capture_payload);
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::Quit.to_string(), "quit");
        assert_eq!(
            StopReason::LimitReached(LimitKind::Packets).to_string(),
            "packets limit reached"
        );
    }
}
