//! Capture loop
//!
//! One iteration: pull a bounded batch from the source, decode and store it,
//! sample rates, evaluate the limit, apply at most one command, reconcile the
//! viewport and render. [`CaptureEngine::run`] repeats this with a short
//! fixed pause until the session stops.

use std::fmt;
use std::thread;
use std::time::Instant;

use pkt_capture::{
    open_ethernet, CaptureError, CaptureHandle, DeviceDescriptor, DumpSink, Frame, PacketSource,
    PcapDumpSink, PollStatus,
};
use pkt_decode::decode;
use tracing::{debug, info, warn};

use crate::command::{Command, Direction, Popup};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::frontend::{CommandInput, Renderer};
use crate::limit::{CaptureLimit, LimitKind};
use crate::session::{CaptureState, Session, Snapshot, StopReason};
use crate::stats::CounterSnapshot;

/// Totals reported when a session ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
    pub reason: StopReason,
    pub device: String,
    pub counters: CounterSnapshot,
    pub decode_failures: u64,
}

impl fmt::Display for CaptureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Capture finished ({}). Packets: {}  Bytes: {}",
            self.reason, self.counters.total, self.counters.bytes
        )
    }
}

/// Drives one capture source through the session state
pub struct CaptureEngine<S: PacketSource> {
    config: EngineConfig,
    source: S,
    devices: Vec<DeviceDescriptor>,
    current_device: usize,
    handle: Option<S::Handle>,
    sink: Option<Box<dyn DumpSink>>,
    session: Session,
    batch: Vec<Frame>,
    stop_reason: Option<StopReason>,
}

impl<S: PacketSource> CaptureEngine<S> {
    /// Open `devices[device_index]` and start a running session
    ///
    /// Fails if the list is empty, the index is out of range, the device
    /// cannot be opened, or it does not deliver Ethernet frames.
    pub fn start(
        config: EngineConfig,
        mut source: S,
        devices: Vec<DeviceDescriptor>,
        device_index: usize,
    ) -> Result<Self, EngineError> {
        if devices.is_empty() {
            return Err(CaptureError::NoDevices.into());
        }
        let device = devices
            .get(device_index)
            .ok_or(EngineError::InvalidDevice {
                index: device_index,
                count: devices.len(),
            })?;
        let handle = open_ethernet(&mut source, device)?;

        let session = Session::new(&config);
        let batch = Vec::with_capacity(config.batch_size);
        let mut engine = Self {
            config,
            source,
            devices,
            current_device: device_index,
            handle: Some(handle),
            sink: None,
            session,
            batch,
            stop_reason: None,
        };
        engine.begin_session();
        Ok(engine)
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Device list
    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    /// The device being captured
    pub fn current_device(&self) -> &DeviceDescriptor {
        &self.devices[self.current_device]
    }

    /// Why the session stopped, once it has
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Whether frames are being written to a dump file
    pub fn is_recording(&self) -> bool {
        self.sink.is_some()
    }

    /// Read-only view for rendering
    pub fn snapshot(&self) -> Snapshot<'_> {
        let counters = self.session.counter_snapshot();
        Snapshot {
            history: self.session.history(),
            counters,
            rates: self.session.rates(),
            selection: self.session.selection(),
            state: self.session.state(),
            show_hex: self.session.show_hex(),
            popup: self.session.popup(),
            devices: &self.devices,
            current_device: self.current_device,
            limit: self.session.limit().progress_at(&counters, Instant::now()),
            decode_failures: self.session.decode_failures(),
            source_exhausted: self.session.source_exhausted(),
            recording: self.sink.is_some(),
        }
    }

    /// Run until quit or the limit is reached
    pub fn run<F: Renderer + CommandInput>(mut self, frontend: &mut F) -> CaptureSummary {
        let idle_wait = self.config.idle_wait();
        while self.session.state().is_active() {
            self.step(frontend);
            if self.session.state().is_active() {
                thread::sleep(idle_wait);
            }
        }
        self.summary()
    }

    /// One loop iteration without the idle pause
    pub fn step<F: Renderer + CommandInput>(&mut self, frontend: &mut F) {
        if !self.session.state().is_active() {
            return;
        }

        self.poll_source();

        let now = Instant::now();
        self.session.sample_rate(now);
        if let Some(kind) = self.limit_hit(now) {
            self.stop(StopReason::LimitReached(kind));
        }

        if let Some(command) = frontend.poll_command() {
            self.apply(command);
        }

        let rows = frontend.visible_rows(self.session.show_hex());
        self.session.selection_mut().reconcile(rows);
        frontend.render(&self.snapshot());
    }

    /// Apply one operator command
    ///
    /// Commands arriving after the session stopped are ignored.
    pub fn apply(&mut self, command: Command) {
        if !self.session.state().is_active() {
            return;
        }

        match command {
            Command::TogglePause => {
                let next = match self.session.state() {
                    CaptureState::Paused => CaptureState::Running,
                    _ => CaptureState::Paused,
                };
                self.session.set_state(next);
                info!(source = "Capture", "Capture {:?}", next);
            }
            Command::ToggleHex => {
                self.session.toggle_hex();
                debug!("Hex mode {}", self.session.show_hex());
            }
            Command::SwitchDevice(index) => {
                self.session.set_popup(None);
                self.switch_device(index);
            }
            Command::SetLimit(kind, target) => {
                self.session.set_popup(None);
                self.session.limit_mut().set(kind, target);
                info!(source = "Limit", "Stopping after {} {}", target, kind.label().to_lowercase());
            }
            Command::Navigate(direction) => {
                let len = self.session.history().len();
                let selection = self.session.selection_mut();
                match direction {
                    Direction::Up => selection.up(),
                    Direction::Down => selection.down(len),
                    Direction::Newest => selection.newest(),
                }
            }
            Command::OpenDevicePopup => self.session.set_popup(Some(Popup::DevicePicker)),
            Command::OpenLimitPopup => self.session.set_popup(Some(Popup::LimitEntry)),
            Command::ClosePopup => self.session.set_popup(None),
            Command::Quit => self.stop(StopReason::Quit),
        }
    }

    /// Stop the session, closing the dump sink and the source
    pub fn stop(&mut self, reason: StopReason) {
        if self.session.state() == CaptureState::Stopped {
            return;
        }
        self.session.set_state(CaptureState::Stopped);
        self.session.set_popup(None);
        self.stop_reason = Some(reason);
        self.close_sink();
        self.handle = None;
        info!(source = "Capture", "Capture stopped: {}", reason);
    }

    /// Totals for the end-of-run report
    pub fn summary(&self) -> CaptureSummary {
        CaptureSummary {
            reason: self.stop_reason.unwrap_or(StopReason::Quit),
            device: self.current_device().name.clone(),
            counters: self.session.counter_snapshot(),
            decode_failures: self.session.decode_failures(),
        }
    }

    /// Idle → Running on the current handle
    fn begin_session(&mut self) {
        self.session.clear(Instant::now());
        self.open_sink();
        self.session.set_state(CaptureState::Running);

        let device = &self.devices[self.current_device];
        info!(
            source = "Capture",
            "Capturing on {} ({})", device.name, device.description
        );
    }

    fn open_sink(&mut self) {
        self.close_sink();

        let (Some(path), Some(handle)) = (self.config.dump_path.as_ref(), self.handle.as_ref())
        else {
            return;
        };

        match PcapDumpSink::create(path, handle) {
            Ok(sink) => {
                info!(source = "DumpSink", "Recording to {}", path.display());
                self.sink = Some(Box::new(sink));
            }
            Err(e) => {
                warn!(
                    source = "DumpSink",
                    "Not recording: cannot open {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }

    fn close_sink(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.close() {
                warn!(source = "DumpSink", "Failed to flush dump file: {}", e);
            }
        }
    }

    fn switch_device(&mut self, index: usize) {
        let Some(device) = self.devices.get(index) else {
            warn!(source = "Capture", "No device at index {}", index);
            return;
        };

        match open_ethernet(&mut self.source, device) {
            Ok(handle) => {
                info!(source = "Capture", "Switching to {}", device.name);
                self.close_sink();
                self.handle = Some(handle);
                self.current_device = index;
                self.begin_session();
            }
            Err(e) => {
                warn!(
                    source = "Capture",
                    "Staying on {}: {}", self.devices[self.current_device].name, e
                );
            }
        }
    }

    /// Which limit is hit, if any
    fn limit_hit(&self, now: Instant) -> Option<LimitKind> {
        let limit = self.session.limit();
        if !limit.hit_at(&self.session.counter_snapshot(), now) {
            return None;
        }
        match limit {
            CaptureLimit::None => None,
            CaptureLimit::Packets { .. } => Some(LimitKind::Packets),
            CaptureLimit::Bytes { .. } => Some(LimitKind::Bytes),
            CaptureLimit::Seconds { .. } => Some(LimitKind::Seconds),
        }
    }

    fn poll_source(&mut self) {
        if self.session.source_exhausted() {
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        let mut batch = std::mem::take(&mut self.batch);
        batch.clear();

        let status = handle.poll(self.config.batch_size, &mut batch);

        let now = Instant::now();
        for frame in &batch {
            self.ingest_frame(frame, now);
        }
        self.batch = batch;

        match status {
            Ok(PollStatus::Ready) => {}
            Ok(PollStatus::Exhausted) => {
                info!(source = "Capture", "Source has no more frames");
                self.session.mark_source_exhausted();
            }
            Err(e) => {
                warn!(source = "Capture", "Capture read failed: {}", e);
                self.session.mark_source_exhausted();
            }
        }
    }

    fn ingest_frame(&mut self, frame: &Frame, now: Instant) {
        // Paused frames and frames past the limit are drained but not kept
        if self.session.state() == CaptureState::Paused
            || self.limit_hit(now).is_some()
        {
            return;
        }

        self.write_dump(frame);

        match decode(&frame.data, &frame.meta, self.session.decode_options()) {
            Ok(record) => self.session.ingest(record),
            Err(e) => {
                debug!("Dropped frame: {}", e);
                self.session.record_decode_failure();
            }
        }
    }

    fn write_dump(&mut self, frame: &Frame) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(e) = sink.write(frame) {
            warn!(source = "DumpSink", "Recording stopped: {}", e);
            self.sink = None;
        }
    }
}

impl<S: PacketSource> Drop for CaptureEngine<S> {
    fn drop(&mut self) {
        self.close_sink();
    }
}
