//! Terminal frontend for the capture engine
//!
//! Implements the engine's renderer and command-input boundaries on top of a
//! ratatui terminal. Terminal I/O errors end the session: the error is kept
//! and the next poll returns `Quit`.

use std::io;
use std::sync::mpsc::Receiver;

use pkt_engine::{Command, CommandInput, Popup, Renderer, Snapshot};
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tracing::debug;

use crate::diagnostics_layer::DiagnosticEvent;
use crate::input::{InputContext, InputState, KeySource};
use crate::ui;

/// The dashboard frontend
pub struct Dashboard<B: Backend, K: KeySource> {
    terminal: Terminal<B>,
    keys: K,
    input: InputState,
    diagnostics: Receiver<DiagnosticEvent>,
    status: Option<DiagnosticEvent>,
    popup: Option<Popup>,
    current_device: usize,
    device_count: usize,
    error: Option<io::Error>,
}

impl<B: Backend, K: KeySource> Dashboard<B, K> {
    /// Create a dashboard drawing to `terminal` and reading keys from `keys`
    pub fn new(terminal: Terminal<B>, keys: K, diagnostics: Receiver<DiagnosticEvent>) -> Self {
        Self {
            terminal,
            keys,
            input: InputState::new(),
            diagnostics,
            status: None,
            popup: None,
            current_device: 0,
            device_count: 0,
            error: None,
        }
    }

    /// Terminal error that ended the session, if any
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn context(&self) -> InputContext {
        InputContext {
            popup: self.popup,
            current_device: self.current_device,
            device_count: self.device_count,
        }
    }

    fn fail(&mut self, err: io::Error) {
        debug!("Terminal error: {}", err);
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

impl<B: Backend, K: KeySource> Renderer for Dashboard<B, K> {
    fn visible_rows(&self, show_hex: bool) -> usize {
        self.terminal
            .size()
            .map(|size| {
                let area = Rect::new(0, 0, size.width, size.height);
                ui::table_rows(ui::layout(area, show_hex).table)
            })
            .unwrap_or(1)
    }

    fn render(&mut self, snapshot: &Snapshot<'_>) {
        if let Some(event) = self.diagnostics.try_iter().last() {
            self.status = Some(event);
        }
        self.popup = snapshot.popup;
        self.current_device = snapshot.current_device;
        self.device_count = snapshot.devices.len();

        let Self {
            terminal,
            input,
            status,
            ..
        } = self;
        let result = terminal
            .draw(|f| {
                ui::draw(f, snapshot, input, status.as_ref());
            })
            .map(|_| ());

        if let Err(err) = result {
            self.fail(err);
        }
    }
}

impl<B: Backend, K: KeySource> CommandInput for Dashboard<B, K> {
    fn poll_command(&mut self) -> Option<Command> {
        if self.error.is_some() {
            return Some(Command::Quit);
        }

        loop {
            match self.keys.next_key() {
                Ok(Some(key)) => {
                    let context = self.context();
                    if let Some(command) = self.input.map_key(key, context) {
                        return Some(command);
                    }
                }
                Ok(None) => return None,
                Err(err) => {
                    self.fail(err);
                    return Some(Command::Quit);
                }
            }
        }
    }
}
