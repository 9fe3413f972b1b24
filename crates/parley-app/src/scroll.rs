//! Scroll buffer.
//!
//! Append-only log of conversation entries with physical row accounting.
//! An entry is rendered as an optional `<source> ` prefix followed by its
//! text, wrapped every `width` columns; it always occupies at least one row.
//!
//! Rows are addressed from the oldest retained row (row 0). When a capacity
//! is set, the oldest entries are evicted once it is exceeded; [`count`]
//! keeps reporting every entry ever added.
//!
//! [`count`]: ScrollBuffer::count

use std::collections::VecDeque;

use crate::geometry::wrapped_rows;

/// One logged line of conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    source: Option<String>,
    text: Vec<char>,
}

impl Entry {
    /// Nickname the entry came from; `None` for local echo and notices.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Entry text without the source prefix.
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    /// Characters as displayed, source prefix included.
    fn display(&self) -> Vec<char> {
        match &self.source {
            Some(source) => source.chars().chain([' ']).chain(self.text.iter().copied()).collect(),
            None => self.text.clone(),
        }
    }

    fn display_len(&self) -> usize {
        self.source.as_ref().map_or(0, |s| s.chars().count() + 1) + self.text.len()
    }
}

/// Append-only log rendered through a scrolling window.
#[derive(Debug, Clone)]
pub struct ScrollBuffer {
    width: u16,
    capacity: Option<usize>,
    entries: VecDeque<Entry>,
    added: u64,
    rows: usize,
}

impl ScrollBuffer {
    /// Unbounded buffer wrapping at `width` columns.
    pub fn new(width: u16) -> Self {
        Self::with_capacity(width, None)
    }

    /// Buffer keeping at most `capacity` entries (`None` keeps everything).
    pub fn with_capacity(width: u16, capacity: Option<usize>) -> Self {
        Self {
            width: width.max(1),
            capacity: capacity.map(|c| c.max(1)),
            entries: VecDeque::new(),
            added: 0,
            rows: 0,
        }
    }

    /// Append an entry.
    pub fn add(&mut self, source: Option<String>, text: impl IntoIterator<Item = char>) {
        let entry = Entry { source, text: text.into_iter().collect() };
        self.rows += wrapped_rows(entry.display_len(), self.width);
        self.entries.push_back(entry);
        self.added += 1;

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                if let Some(evicted) = self.entries.pop_front() {
                    self.rows -= wrapped_rows(evicted.display_len(), self.width);
                }
            }
        }
    }

    /// Entries ever added, including evicted ones.
    pub fn count(&self) -> u64 {
        self.added
    }

    /// Entries currently retained.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Physical rows occupied by the retained entries.
    pub fn total_rows(&self) -> usize {
        self.rows
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Rows `top..=bottom`, clipped to what exists.
    pub fn window(&self, top: usize, bottom: usize) -> Vec<String> {
        let mut out = Vec::new();
        if top > bottom {
            return out;
        }
        let mut row = 0;
        for entry in &self.entries {
            let span = wrapped_rows(entry.display_len(), self.width);
            if row + span > top {
                let chars = entry.display();
                for (i, chunk) in self.chunks(&chars).enumerate() {
                    let at = row + i;
                    if at > bottom {
                        return out;
                    }
                    if at >= top {
                        out.push(chunk);
                    }
                }
            }
            row += span;
            if row > bottom {
                break;
            }
        }
        out
    }

    /// The last `height` rows, oldest first. Fewer if the buffer is short.
    pub fn tail(&self, height: usize) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(height);
        for entry in self.entries.iter().rev() {
            if out.len() >= height {
                break;
            }
            let chars = entry.display();
            let rows: Vec<String> = self.chunks(&chars).collect();
            for chunk in rows.into_iter().rev() {
                if out.len() >= height {
                    break;
                }
                out.push(chunk);
            }
        }
        out.reverse();
        out
    }

    fn chunks<'a>(&self, chars: &'a [char]) -> impl Iterator<Item = String> + 'a {
        let width = usize::from(self.width);
        let rows = wrapped_rows(chars.len(), self.width);
        (0..rows).map(move |i| chars.iter().skip(i * width).take(width).collect())
    }
}
