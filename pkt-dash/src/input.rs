//! Keyboard input
//!
//! Maps key presses to engine commands. While a popup is open the keys drive
//! the popup form instead, and only a confirmed form or Esc produces a
//! command.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pkt_engine::{Command, Direction, LimitKind, Popup};

/// Digits accepted in the limit form; keeps the target within `u64`
const MAX_LIMIT_DIGITS: usize = 18;

/// Source of key presses
pub trait KeySource {
    /// Next pending key event, if any; never blocks
    fn next_key(&mut self) -> io::Result<Option<KeyEvent>>;
}

/// Reads keys from the terminal through crossterm
#[derive(Debug, Default)]
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<Option<KeyEvent>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}

/// What the key mapper needs to know about the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputContext {
    /// Popup currently shown
    pub popup: Option<Popup>,
    /// Index of the device being captured
    pub current_device: usize,
    /// Number of devices in the picker
    pub device_count: usize,
}

/// Form state behind the popups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    device_cursor: usize,
    limit_kind: usize,
    digits: String,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlighted row in the device picker
    pub fn device_cursor(&self) -> usize {
        self.device_cursor
    }

    /// Kind selected in the limit form
    pub fn limit_kind(&self) -> LimitKind {
        LimitKind::ALL[self.limit_kind % LimitKind::ALL.len()]
    }

    /// Digits typed into the limit form
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Translate one key event into at most one command
    ///
    /// Raw mode swallows SIGINT, so Ctrl-C quits from any state. Other
    /// control chords are ignored.
    pub fn map_key(&mut self, key: KeyEvent, context: InputContext) -> Option<Command> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Quit),
                _ => None,
            };
        }

        match context.popup {
            Some(Popup::DevicePicker) => self.device_key(key.code, context.device_count),
            Some(Popup::LimitEntry) => self.limit_key(key.code),
            None => self.dashboard_key(key.code, context),
        }
    }

    fn dashboard_key(&mut self, code: KeyCode, context: InputContext) -> Option<Command> {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::TogglePause),
            KeyCode::Char('h') | KeyCode::Char('H') => Some(Command::ToggleHex),
            KeyCode::Char('d') | KeyCode::Char('D') => {
                self.device_cursor = context.current_device;
                Some(Command::OpenDevicePopup)
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.limit_kind = 0;
                self.digits.clear();
                Some(Command::OpenLimitPopup)
            }
            KeyCode::Up => Some(Command::Navigate(Direction::Up)),
            KeyCode::Down => Some(Command::Navigate(Direction::Down)),
            KeyCode::Home => Some(Command::Navigate(Direction::Newest)),
            _ => None,
        }
    }

    fn device_key(&mut self, code: KeyCode, device_count: usize) -> Option<Command> {
        match code {
            KeyCode::Up => {
                self.device_cursor = self.device_cursor.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                if self.device_cursor + 1 < device_count {
                    self.device_cursor += 1;
                }
                None
            }
            KeyCode::Enter if self.device_cursor < device_count => {
                Some(Command::SwitchDevice(self.device_cursor))
            }
            KeyCode::Esc => Some(Command::ClosePopup),
            _ => None,
        }
    }

    fn limit_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Up => {
                self.limit_kind = self.limit_kind.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                if self.limit_kind + 1 < LimitKind::ALL.len() {
                    self.limit_kind += 1;
                }
                None
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.digits.len() < MAX_LIMIT_DIGITS {
                    self.digits.push(c);
                }
                None
            }
            KeyCode::Backspace => {
                self.digits.pop();
                None
            }
            KeyCode::Enter => {
                let target = self.digits.parse::<u64>().ok()?;
                Some(Command::SetLimit(self.limit_kind(), target))
            }
            KeyCode::Esc => Some(Command::ClosePopup),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn context(popup: Option<Popup>) -> InputContext {
        InputContext {
            popup,
            current_device: 1,
            device_count: 3,
        }
    }

    fn type_keys(state: &mut InputState, popup: Popup, codes: &[KeyCode]) -> Vec<Command> {
        codes
            .iter()
            .filter_map(|&code| state.map_key(press(code), context(Some(popup))))
            .collect()
    }

    #[test]
    fn test_dashboard_bindings() {
        let mut state = InputState::new();
        let ctx = context(None);
        let cases = [
            (KeyCode::Char('q'), Some(Command::Quit)),
            (KeyCode::Char('p'), Some(Command::TogglePause)),
            (KeyCode::Char('h'), Some(Command::ToggleHex)),
            (KeyCode::Char('d'), Some(Command::OpenDevicePopup)),
            (KeyCode::Char('c'), Some(Command::OpenLimitPopup)),
            (KeyCode::Up, Some(Command::Navigate(Direction::Up))),
            (KeyCode::Down, Some(Command::Navigate(Direction::Down))),
            (KeyCode::Home, Some(Command::Navigate(Direction::Newest))),
            (KeyCode::Char('x'), None),
        ];
        for (code, expected) in cases {
            assert_eq!(state.map_key(press(code), ctx), expected, "{:?}", code);
        }
    }

    #[test]
    fn test_ctrl_c_quits_from_any_state() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for popup in [None, Some(Popup::DevicePicker), Some(Popup::LimitEntry)] {
            let mut state = InputState::new();
            assert_eq!(state.map_key(ctrl_c, context(popup)), Some(Command::Quit), "{:?}", popup);
        }
    }

    #[test]
    fn test_control_chords_do_not_trigger_bindings() {
        let mut state = InputState::new();
        for c in ['d', 'p', 'h', 'q'] {
            let key = KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
            assert_eq!(state.map_key(key, context(None)), None, "Ctrl-{}", c);
        }

        let key = KeyEvent::new(KeyCode::Char('7'), KeyModifiers::CONTROL);
        state.map_key(key, context(Some(Popup::LimitEntry)));
        assert_eq!(state.digits(), "");
    }

    #[test]
    fn test_shifted_keys_still_bound() {
        let mut state = InputState::new();
        let key = KeyEvent::new(KeyCode::Char('Q'), KeyModifiers::SHIFT);
        assert_eq!(state.map_key(key, context(None)), Some(Command::Quit));
    }

    #[test]
    fn test_key_release_ignored() {
        let mut state = InputState::new();
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert_eq!(state.map_key(key, context(None)), None);
    }

    #[test]
    fn test_device_picker_starts_on_current_device() {
        let mut state = InputState::new();
        state.map_key(press(KeyCode::Char('d')), context(None));
        assert_eq!(state.device_cursor(), 1);

        let commands = type_keys(
            &mut state,
            Popup::DevicePicker,
            &[KeyCode::Down, KeyCode::Down, KeyCode::Enter],
        );
        assert_eq!(commands, vec![Command::SwitchDevice(2)]);
    }

    #[test]
    fn test_device_picker_cursor_stays_in_range() {
        let mut state = InputState::new();
        let commands = type_keys(
            &mut state,
            Popup::DevicePicker,
            &[KeyCode::Up, KeyCode::Up, KeyCode::Enter],
        );
        assert_eq!(commands, vec![Command::SwitchDevice(0)]);
    }

    #[test]
    fn test_popup_keys_do_not_leak() {
        let mut state = InputState::new();
        let commands = type_keys(
            &mut state,
            Popup::DevicePicker,
            &[KeyCode::Char('q'), KeyCode::Char('p'), KeyCode::Esc],
        );
        assert_eq!(commands, vec![Command::ClosePopup]);
    }

    #[test]
    fn test_limit_form_entry() {
        let mut state = InputState::new();
        state.map_key(press(KeyCode::Char('c')), context(None));

        let commands = type_keys(
            &mut state,
            Popup::LimitEntry,
            &[
                KeyCode::Down,
                KeyCode::Char('1'),
                KeyCode::Char('2'),
                KeyCode::Char('9'),
                KeyCode::Backspace,
                KeyCode::Char('a'),
                KeyCode::Char('8'),
                KeyCode::Enter,
            ],
        );
        assert_eq!(commands, vec![Command::SetLimit(LimitKind::Bytes, 128)]);
    }

    #[test]
    fn test_limit_form_requires_a_digit() {
        let mut state = InputState::new();
        let commands = type_keys(&mut state, Popup::LimitEntry, &[KeyCode::Enter]);
        assert!(commands.is_empty());

        let commands = type_keys(&mut state, Popup::LimitEntry, &[KeyCode::Esc]);
        assert_eq!(commands, vec![Command::ClosePopup]);
    }

    #[test]
    fn test_reopening_limit_form_clears_it() {
        let mut state = InputState::new();
        type_keys(
            &mut state,
            Popup::LimitEntry,
            &[KeyCode::Down, KeyCode::Down, KeyCode::Char('7')],
        );
        assert_eq!(state.limit_kind(), LimitKind::Seconds);

        state.map_key(press(KeyCode::Char('c')), context(None));
        assert_eq!(state.limit_kind(), LimitKind::Packets);
        assert_eq!(state.digits(), "");
    }

    #[test]
    fn test_limit_digits_capped() {
        let mut state = InputState::new();
        let keys = vec![KeyCode::Char('9'); 30];
        type_keys(&mut state, Popup::LimitEntry, &keys);
        assert_eq!(state.digits().len(), MAX_LIMIT_DIGITS);

        let commands = type_keys(&mut state, Popup::LimitEntry, &[KeyCode::Enter]);
        assert_eq!(
            commands,
            vec![Command::SetLimit(LimitKind::Packets, 999_999_999_999_999_999)]
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn confirmed_limit_matches_typed_digits(value in 1u64..1_000_000_000_000, kind in 0usize..3) {
                let mut state = InputState::new();
                let mut keys = vec![KeyCode::Down; kind];
                keys.extend(value.to_string().chars().map(KeyCode::Char));
                keys.push(KeyCode::Enter);

                let commands = type_keys(&mut state, Popup::LimitEntry, &keys);
                prop_assert_eq!(commands, vec![Command::SetLimit(LimitKind::ALL[kind], value)]);
            }
        }
    }
}
