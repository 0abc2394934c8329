//! Operator commands
//!
//! Frontends turn key presses (and confirmed popups) into at most one
//! [`Command`] per loop iteration.

use serde::{Deserialize, Serialize};

use crate::limit::LimitKind;

/// Navigation direction in the packet table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Toward newer rows
    Up,
    /// Toward older rows
    Down,
    /// Back to the newest row
    Newest,
}

/// Popup shown over the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Popup {
    DevicePicker,
    LimitEntry,
}

/// A single operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Pause or resume ingestion
    TogglePause,
    /// Turn payload capture and the hex pane on or off
    ToggleHex,
    /// Switch to the device at this index in the device list
    SwitchDevice(usize),
    /// Replace the capture limit
    SetLimit(LimitKind, u64),
    /// Move the selection
    Navigate(Direction),
    /// Show the device picker
    OpenDevicePopup,
    /// Show the limit form
    OpenLimitPopup,
    /// Close any popup without acting
    ClosePopup,
    /// End the session
    Quit,
}
