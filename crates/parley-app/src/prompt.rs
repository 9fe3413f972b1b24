//! Prompt buffer.
//!
//! The prompt starts on its anchor row and grows downward as the input wraps.
//! `line` is the row the cursor is on; it always equals the anchor plus the
//! number of full rows typed (`count / width`) and never drops below the
//! anchor. Cursor coordinates are recomputed from `count` on every call.

/// In-progress input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuffer {
    buffer: Vec<char>,
    count: usize,
    line: u16,
    anchor: u16,
    width: u16,
}

impl PromptBuffer {
    /// Empty prompt anchored at `anchor`, wrapping every `width` columns.
    pub fn new(width: u16, anchor: u16) -> Self {
        Self { buffer: Vec::new(), count: 0, line: anchor, anchor, width: width.max(1) }
    }

    /// Full rows covered by the current input; the cursor's offset below the
    /// anchor.
    pub fn wrapped_rows(&self) -> usize {
        self.count / usize::from(self.width)
    }

    /// Append `ch` at the cursor.
    ///
    /// `rows_before` is [`Self::wrapped_rows`] as observed before the key was
    /// handled; if the append wraps past it, `line` moves down one row.
    pub fn append(&mut self, ch: char, rows_before: usize) {
        self.buffer.push(ch);
        self.count = self.buffer.len();
        if self.wrapped_rows() > rows_before {
            self.line = self.line.saturating_add(1);
        }
    }

    /// Remove the last character, if any.
    ///
    /// If the removal drops below `rows_before`, `line` moves up one row,
    /// never above the anchor.
    pub fn remove_last(&mut self, rows_before: usize) -> Option<char> {
        let removed = self.buffer.pop()?;
        self.count = self.buffer.len();
        if self.wrapped_rows() < rows_before && self.line > self.anchor {
            self.line -= 1;
        }
        Some(removed)
    }

    /// Clear the input. `line` is left for [`Self::advance`] to settle.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.count = 0;
    }

    /// Move the anchor down `rows` rows, clamped to `bottom`, and put the
    /// cursor line on it.
    pub fn advance(&mut self, rows: usize, bottom: u16) {
        let rows = u16::try_from(rows).unwrap_or(u16::MAX);
        self.anchor = self.anchor.saturating_add(rows).min(bottom);
        self.line = self.anchor;
    }

    /// Cursor position as `(column, row)`.
    pub fn cursor(&self) -> (u16, u16) {
        let column = (self.count % usize::from(self.width)) as u16;
        (column, self.line)
    }

    /// Characters typed so far.
    pub fn chars(&self) -> &[char] {
        &self.buffer
    }

    /// Input as a string.
    pub fn text(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Cursor offset, which is also the input length.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Row the cursor is on.
    pub fn line(&self) -> u16 {
        self.line
    }

    /// Row the prompt starts on.
    pub fn anchor(&self) -> u16 {
        self.anchor
    }

    /// Columns per row.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Whether nothing has been typed.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
