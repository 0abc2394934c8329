//! Application settings

use std::path::{Path, PathBuf};

use pkt_engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Records kept in the packet table history
    pub history_size: usize,
    /// Frames pulled from the capture source per iteration
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between capture iterations in milliseconds
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,
    /// Interface to open when none is given on the command line
    #[serde(default)]
    pub default_device: Option<String>,
    /// Start with the hex pane on
    #[serde(default)]
    pub show_hex: bool,
    /// Record captured frames to this file
    #[serde(default)]
    pub dump_path: Option<PathBuf>,
}

fn default_batch_size() -> usize {
    64
}

fn default_idle_wait_ms() -> u64 {
    35
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_size: 1000,
            batch_size: default_batch_size(),
            idle_wait_ms: default_idle_wait_ms(),
            default_device: None,
            show_hex: false,
            dump_path: None,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for pktdash
    /// Uses $XDG_CONFIG_HOME/pktdash, falls back to ~/.config/pktdash
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("pktdash"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("pktdash"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a file; missing or unreadable files give defaults
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<PathBuf, String> {
        let path =
            Self::settings_path().ok_or_else(|| "Could not determine settings path".to_string())?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }

    /// Engine configuration for these settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            history_capacity: self.history_size,
            batch_size: self.batch_size,
            idle_wait_ms: self.idle_wait_ms,
            show_hex: self.show_hex,
            dump_path: self.dump_path.clone(),
            ..EngineConfig::default()
        }
    }
}
