//! Screen layout.
//!
//! The terminal is split into three horizontal bands: the local viewport at
//! the top (echo history plus the prompt), a one-row divider, and the remote
//! viewport below it. The layout is computed once at startup.

use thiserror::Error;

/// Layout errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Terminal cannot fit both viewports and the divider.
    #[error("terminal too small: {cols}x{rows}, need at least {min_cols}x{min_rows}")]
    TooSmall {
        /// Terminal columns.
        cols: u16,
        /// Terminal rows.
        rows: u16,
        /// Minimum columns.
        min_cols: u16,
        /// Minimum rows.
        min_rows: u16,
    },
}

/// Fixed viewport geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    width: u16,
    local_height: u16,
    remote_height: u16,
}

impl Geometry {
    /// Fewest terminal rows that fit one local row, the divider and one remote
    /// row.
    pub const MIN_ROWS: u16 = 3;

    /// Fewest terminal columns accepted.
    pub const MIN_COLS: u16 = 2;

    /// Split a `cols` x `rows` terminal.
    ///
    /// # Errors
    ///
    /// - `GeometryError::TooSmall` below [`Self::MIN_COLS`] x [`Self::MIN_ROWS`]
    pub fn from_terminal(cols: u16, rows: u16) -> Result<Self, GeometryError> {
        if cols < Self::MIN_COLS || rows < Self::MIN_ROWS {
            return Err(GeometryError::TooSmall {
                cols,
                rows,
                min_cols: Self::MIN_COLS,
                min_rows: Self::MIN_ROWS,
            });
        }
        let usable = rows - 1;
        let local_height = usable / 2;
        Ok(Self { width: cols, local_height, remote_height: usable - local_height })
    }

    /// Columns per row.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Rows in the local viewport.
    pub fn local_height(&self) -> u16 {
        self.local_height
    }

    /// Rows in the remote viewport.
    pub fn remote_height(&self) -> u16 {
        self.remote_height
    }

    /// Last row of the local viewport.
    pub fn local_bottom(&self) -> u16 {
        self.local_height - 1
    }

    /// Row holding the divider.
    pub fn divider_row(&self) -> u16 {
        self.local_height
    }

    /// First row of the remote viewport.
    pub fn remote_top(&self) -> u16 {
        self.local_height + 1
    }

    /// Physical rows occupied by `chars` characters at this width.
    ///
    /// An empty line still occupies one row.
    pub fn rows_for(&self, chars: usize) -> usize {
        wrapped_rows(chars, self.width)
    }
}

/// Physical rows occupied by `chars` characters at `width` columns.
pub(crate) fn wrapped_rows(chars: usize, width: u16) -> usize {
    let width = usize::from(width.max(1));
    chars.div_ceil(width).max(1)
}
