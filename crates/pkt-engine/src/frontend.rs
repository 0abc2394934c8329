//! Renderer and command-input boundaries
//!
//! The capture loop drives both synchronously: it polls at most one command
//! and renders once per iteration. Layout belongs to the renderer; the loop
//! only asks how many table rows fit.

use crate::command::Command;
use crate::session::Snapshot;

/// Draws the dashboard
pub trait Renderer {
    /// Table rows that fit the layout for the given hex mode
    fn visible_rows(&self, show_hex: bool) -> usize;

    /// Draw one frame
    fn render(&mut self, snapshot: &Snapshot<'_>);
}

/// Produces operator commands
pub trait CommandInput {
    /// The next pending command, if any; never blocks
    fn poll_command(&mut self) -> Option<Command>;
}
