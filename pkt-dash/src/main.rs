//! pktdash: live network traffic dashboard
//!
//! Captures Ethernet frames from an interface (or replays a pcap file, or
//! generates synthetic traffic) and shows per-protocol totals, rates and a
//! scrolling packet table in the terminal.

mod app;
mod diagnostics_layer;
mod input;
mod settings;
mod ui;

use std::fs::File;
use std::io::{self, stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::cursor::Show;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use pkt_capture::{DeviceDescriptor, DeviceDirectory, PacketSource, ReplaySource};
use pkt_engine::{CaptureEngine, CaptureSummary, Command, EngineConfig, LimitKind};
use pkt_sim::SimulatedSource;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::Dashboard;
use diagnostics_layer::{DiagnosticEvent, DiagnosticsLayer};
use input::TerminalKeys;
use settings::Settings;

const DEFAULT_LOG_FILTER: &str =
    "pktdash=info,pkt_engine=info,pkt_capture=info,pkt_decode=warn,pkt_sim=info";

/// pktdash: live network traffic dashboard
#[derive(Parser, Debug)]
#[command(name = "pktdash")]
#[command(version)]
#[command(about = "Live network traffic dashboard", long_about = None)]
struct Cli {
    /// Interface to capture on
    #[arg(short = 'i', long)]
    device: Option<String>,

    /// Replay a pcap capture file instead of a live interface
    #[arg(short = 'r', long, conflicts_with = "simulate")]
    read: Option<PathBuf>,

    /// Record captured frames to a pcap file
    #[arg(short = 'w', long)]
    write: Option<PathBuf>,

    /// Packets kept in the table history
    #[arg(long)]
    history: Option<usize>,

    /// Start with payload capture and the hex pane on
    #[arg(long)]
    hex: bool,

    /// Stop after this many packets
    #[arg(long, group = "limit")]
    limit_packets: Option<u64>,

    /// Stop after this many bytes
    #[arg(long, group = "limit")]
    limit_bytes: Option<u64>,

    /// Stop after this many seconds
    #[arg(long, group = "limit")]
    limit_seconds: Option<u64>,

    /// Capture from simulated interfaces with synthetic traffic
    #[arg(long)]
    simulate: bool,

    /// Print the available devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Save the effective settings as the new defaults
    #[arg(long)]
    save_settings: bool,
}

impl Cli {
    /// Command-line values take precedence over saved settings
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(history) = self.history {
            settings.history_size = history;
        }
        if self.hex {
            settings.show_hex = true;
        }
        if let Some(path) = &self.write {
            settings.dump_path = Some(path.clone());
        }
        if let Some(device) = &self.device {
            settings.default_device = Some(device.clone());
        }
    }

    fn limit(&self) -> Option<(LimitKind, u64)> {
        self.limit_packets
            .map(|n| (LimitKind::Packets, n))
            .or_else(|| self.limit_bytes.map(|n| (LimitKind::Bytes, n)))
            .or_else(|| self.limit_seconds.map(|n| (LimitKind::Seconds, n)))
    }
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(Some(summary)) => println!("{}", summary),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<Option<CaptureSummary>> {
    let mut settings = Settings::load();
    cli.apply_to(&mut settings);
    if cli.save_settings {
        let path = settings.save().map_err(anyhow::Error::msg)?;
        println!("Saved settings to {}", path.display());
    }

    let diagnostics = init_logging(cli.log_file.as_deref())?;
    info!("Starting pktdash");

    let config = settings.engine_config();

    if let Some(path) = &cli.read {
        let devices = ReplaySource::directory(path).enumerate()?;
        launch(&cli, config, ReplaySource::new(), devices, None, diagnostics)
    } else if cli.simulate {
        let source = SimulatedSource::demo();
        let devices = source.enumerate()?;
        let wanted = cli.device.as_deref();
        launch(&cli, config, source, devices, wanted, diagnostics)
    } else {
        run_live(&cli, config, settings.default_device.as_deref(), diagnostics)
    }
}

#[cfg(feature = "live")]
fn run_live(
    cli: &Cli,
    config: EngineConfig,
    wanted: Option<&str>,
    diagnostics: Receiver<DiagnosticEvent>,
) -> Result<Option<CaptureSummary>> {
    use pkt_capture::{LiveDirectory, LiveSource};

    let devices = LiveDirectory::new()
        .enumerate()
        .context("Cannot list capture devices")?;
    let source = LiveSource::new(config.snaplen);
    launch(cli, config, source, devices, wanted, diagnostics)
}

#[cfg(not(feature = "live"))]
fn run_live(
    _cli: &Cli,
    _config: EngineConfig,
    _wanted: Option<&str>,
    _diagnostics: Receiver<DiagnosticEvent>,
) -> Result<Option<CaptureSummary>> {
    bail!("Built without live capture support; use --read FILE or --simulate")
}

/// Install the tracing subscriber
///
/// The terminal belongs to the dashboard, so formatted logs only go to a file
/// when one is given. Warnings and errors are always forwarded to the status
/// line through the returned channel.
fn init_logging(log_file: Option<&Path>) -> Result<Receiver<DiagnosticEvent>> {
    let (diag_tx, diag_rx) = mpsc::channel::<DiagnosticEvent>();

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(file_layer)
        .with(DiagnosticsLayer::new(diag_tx))
        .init();

    Ok(diag_rx)
}

/// Index of the named device, or the first device when no name is given
fn select_device(devices: &[DeviceDescriptor], wanted: Option<&str>) -> Result<usize> {
    match wanted {
        None => Ok(0),
        Some(name) => match devices.iter().position(|d| d.name == name) {
            Some(index) => Ok(index),
            None => bail!("No capture device named '{}' (see --list-devices)", name),
        },
    }
}

fn print_devices(devices: &[DeviceDescriptor]) {
    for (index, device) in devices.iter().enumerate() {
        println!("{:>3}  {:<16} {}", index, device.name, device.description);
    }
}

/// Raw mode and the alternate screen, undone when dropped
struct TerminalGuard<W: Write> {
    out: W,
    active: bool,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(out: W) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut guard = Self { out, active: true };
        guard.out.execute(EnterAlternateScreen)?;
        Ok(guard)
    }

    /// Run every restore step and report the first failure
    fn restore(&mut self) -> io::Result<()> {
        if !std::mem::replace(&mut self.active, false) {
            return Ok(());
        }
        let raw = disable_raw_mode();
        let screen = self.out.execute(LeaveAlternateScreen).map(|_| ());
        let cursor = self.out.execute(Show).map(|_| ());
        raw.and(screen).and(cursor)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Start the engine, run the dashboard until the session ends, restore the terminal
fn launch<S: PacketSource>(
    cli: &Cli,
    config: EngineConfig,
    source: S,
    devices: Vec<DeviceDescriptor>,
    wanted: Option<&str>,
    diagnostics: Receiver<DiagnosticEvent>,
) -> Result<Option<CaptureSummary>> {
    if cli.list_devices {
        print_devices(&devices);
        return Ok(None);
    }

    let index = select_device(&devices, wanted)?;
    let name = devices
        .get(index)
        .map(|d| d.name.clone())
        .unwrap_or_default();
    let mut engine = CaptureEngine::start(config, source, devices, index)
        .with_context(|| format!("Cannot start capture on {}", name))?;
    if let Some((kind, target)) = cli.limit() {
        engine.apply(Command::SetLimit(kind, target));
    }

    let mut guard = TerminalGuard::enter(stdout())?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut dashboard = Dashboard::new(terminal, TerminalKeys, diagnostics);

    let summary = engine.run(&mut dashboard);
    let restored = guard.restore();

    if let Some(err) = dashboard.take_error() {
        return Err(err).context("Terminal error");
    }
    restored.context("Cannot restore terminal")?;
    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pktdash").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_overrides_settings() {
        let cli = parse(&["-i", "en0", "--history", "200", "--hex", "-w", "out.pcap"]);
        let mut settings = Settings::default();
        cli.apply_to(&mut settings);

        assert_eq!(settings.default_device.as_deref(), Some("en0"));
        assert_eq!(settings.history_size, 200);
        assert!(settings.show_hex);
        assert_eq!(settings.dump_path, Some(PathBuf::from("out.pcap")));
    }

    #[test]
    fn test_cli_keeps_settings_when_absent() {
        let cli = parse(&[]);
        let mut settings = Settings {
            show_hex: true,
            default_device: Some("eth1".into()),
            ..Settings::default()
        };
        let before = settings.clone();
        cli.apply_to(&mut settings);
        assert_eq!(settings, before);
    }

    #[test]
    fn test_limit_flags() {
        assert_eq!(parse(&[]).limit(), None);
        assert_eq!(
            parse(&["--limit-bytes", "4096"]).limit(),
            Some((LimitKind::Bytes, 4096))
        );
        assert_eq!(
            parse(&["--limit-seconds", "30"]).limit(),
            Some((LimitKind::Seconds, 30))
        );
    }

    #[test]
    fn test_limit_flags_conflict() {
        let result = Cli::try_parse_from(["pktdash", "--limit-packets", "5", "--limit-bytes", "10"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_conflicts_with_simulate() {
        let result = Cli::try_parse_from(["pktdash", "--read", "a.pcap", "--simulate"]);
        assert!(result.is_err());
    }

    const LEAVE_ALTERNATE_SCREEN: &str = "\x1b[?1049l";
    const SHOW_CURSOR: &str = "\x1b[?25h";

    #[test]
    fn test_terminal_guard_restores_on_drop() {
        let mut out = Vec::new();
        {
            let _guard = TerminalGuard {
                out: &mut out,
                active: true,
            };
        }
        let written = String::from_utf8(out).unwrap();
        assert_eq!(written.matches(LEAVE_ALTERNATE_SCREEN).count(), 1);
        assert!(written.contains(SHOW_CURSOR));
    }

    #[test]
    fn test_terminal_guard_restores_once() {
        let mut out = Vec::new();
        {
            let mut guard = TerminalGuard {
                out: &mut out,
                active: true,
            };
            guard.restore().unwrap();
            guard.restore().unwrap();
        }
        let written = String::from_utf8(out).unwrap();
        assert_eq!(written.matches(LEAVE_ALTERNATE_SCREEN).count(), 1);
        assert_eq!(written.matches(SHOW_CURSOR).count(), 1);
    }

    #[test]
    fn test_select_device() {
        let devices = vec![
            DeviceDescriptor::new("eth0", "Wi-Fi/Ethernet"),
            DeviceDescriptor::new("lo", "Loopback Interface"),
        ];
        assert_eq!(select_device(&devices, None).unwrap(), 0);
        assert_eq!(select_device(&devices, Some("lo")).unwrap(), 1);
        let err = select_device(&devices, Some("wlan9")).unwrap_err();
        assert!(err.to_string().contains("wlan9"));
    }
}
