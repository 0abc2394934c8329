//! Traffic Dashboard Engine
//!
//! This crate holds the capture loop and the state it drives:
//!
//! - **HistoryStore**: fixed-capacity record buffer with FIFO eviction and a
//!   newest-first view
//! - **Counters / RateSampler**: per-protocol totals readable from any thread,
//!   and byte/packet rates sampled on a fixed interval
//! - **CaptureLimit**: stop after a packet count, byte count or elapsed time
//! - **Selection**: selected row and viewport, kept on the same record as new
//!   rows arrive
//! - **CaptureEngine**: the single driver tying a packet source to a frontend
//!
//! # Architecture
//!
//! The engine owns a [`Session`] and is its only writer. Frontends implement
//! [`Renderer`] and [`CommandInput`]; the engine calls them synchronously once
//! per iteration, so the renderer never sees the history mid-update. Device
//! switches and limit changes arrive as [`Command`]s and are applied between
//! batches, never while frames are being stored.
//!
//! # Example
//!
//! ```rust
//! use pkt_engine::{CaptureEngine, Command, CommandInput, EngineConfig, Renderer, Snapshot};
//! use pkt_sim::{SimulatedSource, VirtualDeviceConfig};
//! use pkt_capture::DeviceDirectory;
//!
//! struct Headless;
//!
//! impl Renderer for Headless {
//!     fn visible_rows(&self, _show_hex: bool) -> usize { 20 }
//!     fn render(&mut self, snapshot: &Snapshot<'_>) {
//!         println!("{} packets", snapshot.counters.total);
//!     }
//! }
//!
//! impl CommandInput for Headless {
//!     fn poll_command(&mut self) -> Option<Command> { Some(Command::Quit) }
//! }
//!
//! let mut source = SimulatedSource::new();
//! source.add_device(VirtualDeviceConfig::ethernet("eth0"));
//! let devices = source.enumerate().unwrap();
//!
//! let engine = CaptureEngine::start(EngineConfig::default(), source, devices, 0).unwrap();
//! let summary = engine.run(&mut Headless);
//! println!("{}", summary);
//! ```

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod frontend;
pub mod history;
pub mod limit;
pub mod selection;
pub mod session;
pub mod stats;

pub use command::{Command, Direction, Popup};
pub use config::EngineConfig;
pub use engine::{CaptureEngine, CaptureSummary};
pub use error::EngineError;
pub use frontend::{CommandInput, Renderer};
pub use history::{HistoryStore, DEFAULT_HISTORY_CAPACITY};
pub use limit::{CaptureLimit, LimitKind, LimitProgress};
pub use selection::Selection;
pub use session::{CaptureState, Session, Snapshot, StopReason};
pub use stats::{CounterSnapshot, Counters, RateSampler, Rates};
