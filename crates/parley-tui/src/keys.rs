//! Keyboard input source.

use std::future::Future;

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind};
use futures::StreamExt;
use parley_app::KeyInput;

use crate::SurfaceError;

/// Source of key presses for the input loop.
pub trait KeySource: Send {
    /// Next key press. `None` means the source is exhausted.
    fn next_key(&mut self) -> impl Future<Output = Result<Option<KeyInput>, SurfaceError>> + Send;
}

/// Key presses from the terminal.
pub struct TerminalKeys {
    events: EventStream,
}

impl TerminalKeys {
    /// Start reading terminal events.
    pub fn new() -> Self {
        Self { events: EventStream::new() }
    }
}

impl Default for TerminalKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for TerminalKeys {
    async fn next_key(&mut self) -> Result<Option<KeyInput>, SurfaceError> {
        while let Some(event) = self.events.next().await {
            if let Event::Key(key) = event?
                && key.kind == KeyEventKind::Press
                && let Some(input) = convert_key(key.code)
            {
                return Ok(Some(input));
            }
        }
        Ok(None)
    }
}

/// Convert a crossterm key code to [`KeyInput`]. Unbound keys map to `None`.
fn convert_key(code: KeyCode) -> Option<KeyInput> {
    match code {
        // Some terminals send DEL or BS as a plain character.
        KeyCode::Backspace | KeyCode::Char('\u{7f}' | '\u{8}') => Some(KeyInput::Backspace),
        KeyCode::Char(c) if !c.is_control() => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Esc => Some(KeyInput::Esc),
        _ => None,
    }
}
