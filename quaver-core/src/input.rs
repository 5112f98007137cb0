use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};

use crate::error::Error;

/// Control keys recognized during playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    TogglePause,
    Stop,
}

/// Capability interface for non-blocking key input during playback.  The
/// playback state machine never depends on which backend sits behind it.
pub trait InputSource {
    /// Prepares the backend for a playback session, e.g. switches the
    /// terminal into raw mode.
    fn begin_session(&mut self) -> Result<(), Error>;

    /// Waits up to `timeout` for a pending key press.  Unrecognized keys
    /// are reported as `None`.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<ControlKey>, Error>;

    /// Restores the backend after a playback session.
    fn end_session(&mut self);
}

/// Terminal-backed input source reading single key presses in raw mode.
pub struct TerminalInput {
    raw: bool,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self { raw: false }
    }
}

impl InputSource for TerminalInput {
    fn begin_session(&mut self) -> Result<(), Error> {
        terminal::enable_raw_mode()?;
        self.raw = true;
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<ControlKey>, Error> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(control_key(key)),
            _ => Ok(None),
        }
    }

    fn end_session(&mut self) {
        if self.raw {
            if let Err(err) = terminal::disable_raw_mode() {
                log::warn!("failed to restore terminal mode: {}", err);
            }
            self.raw = false;
        }
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        self.end_session();
    }
}

/// Raw mode swallows the interrupt signal, so Ctrl-C maps to an orderly
/// stop instead of a dead key.
fn control_key(key: KeyEvent) -> Option<ControlKey> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ControlKey::Stop)
        }
        KeyCode::Char('p') | KeyCode::Char('P') => Some(ControlKey::TogglePause),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(ControlKey::Stop),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_pause_and_stop_keys() {
        let pause = KeyEvent::new(KeyCode::Char('p'), KeyModifiers::NONE);
        let pause_upper = KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT);
        let stop = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE);
        let interrupt = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert_eq!(control_key(pause), Some(ControlKey::TogglePause));
        assert_eq!(control_key(pause_upper), Some(ControlKey::TogglePause));
        assert_eq!(control_key(stop), Some(ControlKey::Stop));
        assert_eq!(control_key(interrupt), Some(ControlKey::Stop));
    }

    #[test]
    fn ignores_unrelated_keys() {
        let other = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);

        assert_eq!(control_key(other), None);
        assert_eq!(control_key(plain_c), None);
    }
}
