//! Capture device enumeration and descriptions
//!
//! Descriptions come from, in order: the system's hardware-port listing
//! (macOS only), the capture library, a table of well-known interface names,
//! and finally a fixed placeholder.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CaptureError;

/// Description used when nothing better is known
pub const NO_DESCRIPTION: &str = "(No description)";

/// A capture device as shown in the device picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Interface name (e.g. en0, eth0) or capture file path
    pub name: String,
    /// Human-readable description
    pub description: String,
}

impl DeviceDescriptor {
    /// Create a descriptor
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Something that can list capture devices
pub trait DeviceDirectory {
    /// List devices, possibly empty
    fn list(&self) -> Result<Vec<DeviceDescriptor>, CaptureError>;

    /// List devices, failing with [`CaptureError::NoDevices`] when there are none
    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        info!("Enumerating capture devices...");
        let devices = self.list()?;
        if devices.is_empty() {
            info!("No capture devices found");
            return Err(CaptureError::NoDevices);
        }
        info!("Found {} capture device(s)", devices.len());
        for device in &devices {
            debug!("  {} - {}", device.name, device.description);
        }
        Ok(devices)
    }
}

/// A fixed device list (capture files, simulated devices)
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    devices: Vec<DeviceDescriptor>,
}

impl StaticDirectory {
    /// Directory over the given devices
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self { devices }
    }
}

impl DeviceDirectory for StaticDirectory {
    fn list(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        Ok(self.devices.clone())
    }
}

/// Description for a well-known interface name
pub fn known_interface_description(name: &str) -> Option<&'static str> {
    let exact = match name {
        "lo" | "lo0" => Some("Loopback Interface"),
        "awdl0" => Some("Apple Wireless Direct Link"),
        "llw0" => Some("Low-Latency WAN"),
        "bridge0" => Some("Bridge Interface"),
        "stf0" => Some("6to4 Tunnel"),
        "ap1" => Some("Access Point"),
        _ => None,
    };
    if exact.is_some() {
        return exact;
    }

    const PREFIXES: [(&str, &str); 8] = [
        ("gif", "Generic Tunnel"),
        ("p2p", "Peer-to-Peer"),
        ("en", "Wi-Fi/Ethernet"),
        ("eth", "Ethernet"),
        ("wl", "Wireless"),
        ("utun", "User Tunneling"),
        ("anpi", "Apple Network Protocol"),
        ("vmenet", "VM Network"),
    ];
    PREFIXES
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, desc)| *desc)
}

/// Parse `networksetup -listallhardwareports` output into device → port name
pub fn parse_hardware_ports(output: &str) -> HashMap<String, String> {
    let mut ports = HashMap::new();
    let mut current_port: Option<&str> = None;

    for line in output.lines().map(str::trim) {
        if let Some(port) = line.strip_prefix("Hardware Port:") {
            current_port = Some(port.trim());
        } else if let Some(device) = line.strip_prefix("Device:") {
            if let Some(port) = current_port.take() {
                ports.insert(device.trim().to_string(), port.to_string());
            }
        }
    }

    ports
}

#[cfg(target_os = "macos")]
fn query_hardware_ports() -> HashMap<String, String> {
    match std::process::Command::new("networksetup")
        .arg("-listallhardwareports")
        .output()
    {
        Ok(output) if output.status.success() => {
            parse_hardware_ports(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            debug!("networksetup exited with {}", output.status);
            HashMap::new()
        }
        Err(e) => {
            debug!("networksetup unavailable: {}", e);
            HashMap::new()
        }
    }
}

#[cfg(not(target_os = "macos"))]
fn query_hardware_ports() -> HashMap<String, String> {
    HashMap::new()
}

fn hardware_ports() -> &'static HashMap<String, String> {
    static PORTS: OnceLock<HashMap<String, String>> = OnceLock::new();
    PORTS.get_or_init(query_hardware_ports)
}

/// Pick a description from the available sources
pub fn resolve_description(
    name: &str,
    system: &HashMap<String, String>,
    library: Option<&str>,
) -> String {
    if let Some(port) = system.get(name) {
        return port.clone();
    }
    if let Some(desc) = library.filter(|d| !d.trim().is_empty()) {
        return desc.to_string();
    }
    known_interface_description(name)
        .unwrap_or(NO_DESCRIPTION)
        .to_string()
}

/// Describe an interface using the system listing (cached) and built-in names
pub fn describe(name: &str, library: Option<&str>) -> String {
    resolve_description(name, hardware_ports(), library)
}
