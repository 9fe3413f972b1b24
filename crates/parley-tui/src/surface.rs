//! Terminal surface.
//!
//! The render loop paints through the [`Surface`] trait: cells are written
//! into a pending frame and become visible only on [`Surface::flush`].
//!
//! - [`TerminalSurface`]: raw-mode terminal on the alternate screen; frames
//!   are ratatui buffers, presented as a diff through the crossterm backend
//! - [`GridSurface`]: headless character grid for tests

use std::{
    io::{self, Stdout, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

use crossterm::{
    ExecutableCommand,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    buffer::Buffer,
    layout::{Position, Rect},
    style::Color,
};
use thiserror::Error;

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Something the render loop can paint on.
pub trait Surface {
    /// Size as `(columns, rows)`.
    fn size(&self) -> (u16, u16);

    /// Write one cell of the pending frame. Out-of-bounds writes are ignored.
    fn set_cell(&mut self, x: u16, y: u16, ch: char, fg: Color, bg: Color);

    /// Where the cursor is shown after the next flush.
    fn set_cursor(&mut self, x: u16, y: u16);

    /// Present the pending frame in one step.
    ///
    /// # Errors
    ///
    /// - `SurfaceError::Io` if writing to the terminal fails
    fn flush(&mut self) -> Result<(), SurfaceError>;
}

/// The real terminal.
///
/// Raw mode and the alternate screen are entered on construction and left on
/// drop.
pub struct TerminalSurface {
    backend: CrosstermBackend<Stdout>,
    screen: Buffer,
    presented: Buffer,
    cursor: (u16, u16),
}

impl TerminalSurface {
    /// Take over the terminal.
    ///
    /// # Errors
    ///
    /// - `SurfaceError::Io` if the terminal cannot be queried or switched
    ///   into raw mode
    pub fn new() -> Result<Self, SurfaceError> {
        let (cols, rows) = crossterm::terminal::size()?;
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        SCREEN_TAKEN.store(true, Ordering::SeqCst);

        let mut backend = CrosstermBackend::new(stdout());
        backend.clear()?;

        let area = Rect::new(0, 0, cols, rows);
        Ok(Self {
            backend,
            screen: Buffer::empty(area),
            presented: Buffer::empty(area),
            cursor: (0, 0),
        })
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> (u16, u16) {
        (self.screen.area.width, self.screen.area.height)
    }

    fn set_cell(&mut self, x: u16, y: u16, ch: char, fg: Color, bg: Color) {
        if let Some(cell) = self.screen.cell_mut(Position::new(x, y)) {
            cell.set_char(ch).set_fg(fg).set_bg(bg);
        }
    }

    fn set_cursor(&mut self, x: u16, y: u16) {
        self.cursor = (x, y);
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        let updates = self.presented.diff(&self.screen);
        self.backend.draw(updates.into_iter())?;
        self.presented.clone_from(&self.screen);

        let (x, y) = self.cursor;
        self.backend.set_cursor_position(Position::new(x, y))?;
        self.backend.show_cursor()?;
        Backend::flush(&mut self.backend)?;
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
        SCREEN_TAKEN.store(false, Ordering::SeqCst);
    }
}

/// Set while a [`TerminalSurface`] owns the alternate screen.
static SCREEN_TAKEN: AtomicBool = AtomicBool::new(false);

/// Whether the terminal currently shows the UI; anything written to stderr
/// now would land on top of it.
pub(crate) fn screen_taken() -> bool {
    SCREEN_TAKEN.load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn set_screen_taken(taken: bool) {
    SCREEN_TAKEN.store(taken, Ordering::SeqCst);
}

/// Headless surface recording what would be on screen.
///
/// Writes land in a pending grid; [`GridSurface::row`] and
/// [`GridSurface::cursor`] report the last flushed state.
#[derive(Debug, Clone)]
pub struct GridSurface {
    width: u16,
    height: u16,
    pending: Vec<char>,
    presented: Vec<char>,
    pending_cursor: (u16, u16),
    cursor: (u16, u16),
    flushes: usize,
}

impl GridSurface {
    /// Blank grid of `width` x `height` cells.
    pub fn new(width: u16, height: u16) -> Self {
        let cells = vec![' '; usize::from(width) * usize::from(height)];
        Self {
            width,
            height,
            pending: cells.clone(),
            presented: cells,
            pending_cursor: (0, 0),
            cursor: (0, 0),
            flushes: 0,
        }
    }

    /// Presented contents of row `y`, trailing blanks trimmed.
    pub fn row(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = usize::from(y) * usize::from(self.width);
        let row: String = self.presented[start..start + usize::from(self.width)].iter().collect();
        row.trim_end().to_string()
    }

    /// Presented rows `top..top + count`.
    pub fn rows(&self, top: u16, count: u16) -> Vec<String> {
        (top..top.saturating_add(count)).map(|y| self.row(y)).collect()
    }

    /// Presented cursor position.
    pub fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    /// Number of flushes so far.
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Surface for GridSurface {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn set_cell(&mut self, x: u16, y: u16, ch: char, _fg: Color, _bg: Color) {
        if x < self.width && y < self.height {
            self.pending[usize::from(y) * usize::from(self.width) + usize::from(x)] = ch;
        }
    }

    fn set_cursor(&mut self, x: u16, y: u16) {
        self.pending_cursor = (x, y);
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        self.presented.clone_from(&self.pending);
        self.cursor = self.pending_cursor;
        self.flushes += 1;
        Ok(())
    }
}
