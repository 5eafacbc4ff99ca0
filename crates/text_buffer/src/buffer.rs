use std::fmt;
use std::mem;

use rope::{LineBreak, Rope, RopeError};
use tracing::trace;

use crate::config::BufferConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Splice the window back and open a new one at the given offset
    /// (the old window start when `None`).
    Reinitialize(Option<usize>),
    /// Splice the window back and leave no window open.
    Finalize,
}

/// A rope with a movable edit window.
///
/// While a window is open its code points live in `chunk` and the rope has a
/// hole at `chunk_start`. Caret edits only touch `chunk`; the rope is split
/// and re-linked when the window is committed or moved.
#[derive(Debug)]
pub struct TextBuffer {
    rope: Rope,
    chunk: Vec<char>,
    chunk_start: usize,
    chunk_offset: usize,
    open: bool,
    len: usize,
    config: BufferConfig,
}

impl TextBuffer {
    pub fn new(rope: Rope) -> Self {
        Self::with_config(rope, BufferConfig::default())
    }

    /// A window size of 0 is treated as 1.
    pub fn with_config(rope: Rope, mut config: BufferConfig) -> Self {
        config.window_size = config.window_size.max(1);
        let len = rope.len();
        Self {
            rope,
            chunk: Vec::new(),
            chunk_start: 0,
            chunk_offset: 0,
            open: false,
            len,
            config,
        }
    }

    /// Length of the document, window included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// The underlying rope. While a window is open it is missing the window's
    /// code points.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn chunk(&self) -> &[char] {
        &self.chunk
    }

    pub fn chunk_start(&self) -> usize {
        self.chunk_start
    }

    pub fn chunk_offset(&self) -> usize {
        self.chunk_offset
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Absolute caret position.
    pub fn cursor(&self) -> usize {
        self.chunk_start + self.chunk_offset
    }

    /// Opens a window of up to `window_size` code points at `offset` with the
    /// caret at its start. An already open window is committed first.
    pub fn initialize(&mut self, offset: usize) -> Result<()> {
        if self.open {
            self.commit(CommitMode::Finalize)?;
        }
        let len = self.rope.len();
        if offset > len {
            return Err(RopeError::IndexOutOfBounds { index: offset, len }.into());
        }
        self.open_at(offset, offset)
    }

    fn open_at(&mut self, start: usize, cursor: usize) -> Result<()> {
        debug_assert!(!self.open);
        let take = self
            .config
            .window_size
            .min(self.rope.len().saturating_sub(start));
        let window = self.rope.remove(start, take)?;
        self.chunk = window.to_chars();
        self.chunk_start = start;
        self.chunk_offset = cursor.saturating_sub(start).min(self.chunk.len());
        self.open = true;
        trace!(start, cursor, len = self.chunk.len(), "opened edit window");
        self.check_len();
        Ok(())
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.open {
            return Ok(());
        }
        let cursor = self.cursor();
        self.open_at(cursor, cursor)
    }

    /// Inserts `c` at the caret and moves the caret past it.
    pub fn insert(&mut self, c: char) -> Result<()> {
        self.ensure_open()?;
        self.chunk.insert(self.chunk_offset, c);
        self.chunk_offset += 1;
        self.len += 1;

        let at_tail = self.chunk_start + self.chunk.len() == self.len;
        let full = if at_tail {
            self.chunk.len() >= self.config.window_size
        } else {
            // typing near the window start must not grow it without bound
            self.chunk_offset == self.chunk.len()
                || self.chunk.len() >= self.config.window_size.saturating_mul(2)
        };
        if full {
            let cursor = self.cursor();
            self.commit(CommitMode::Reinitialize(Some(cursor)))?;
        }
        self.check_len();
        Ok(())
    }

    pub fn insert_str(&mut self, s: &str) -> Result<()> {
        for c in s.chars() {
            self.insert(c)?;
        }
        Ok(())
    }

    /// Deletes the code point after (`Forward`) or before (`Backward`) the
    /// caret. Returns `None` at the edge of the document.
    pub fn remove(&mut self, direction: Direction) -> Result<Option<char>> {
        let cursor = self.cursor();
        match direction {
            Direction::Forward => {
                if cursor == self.len {
                    return Ok(None);
                }
                if !self.open || self.chunk_offset == self.chunk.len() {
                    self.close()?;
                    self.open_at(cursor, cursor)?;
                }
                if self.chunk_offset == self.chunk.len() {
                    return Ok(None);
                }
                let removed = self.chunk.remove(self.chunk_offset);
                self.len -= 1;
                self.check_len();
                Ok(Some(removed))
            }
            Direction::Backward => {
                if cursor == 0 {
                    return Ok(None);
                }
                if !self.open || self.chunk_offset == 0 {
                    self.close()?;
                    let start = cursor.saturating_sub(self.config.window_size);
                    self.open_at(start, cursor)?;
                }
                if self.chunk_offset == 0 {
                    return Ok(None);
                }
                self.chunk_offset -= 1;
                let removed = self.chunk.remove(self.chunk_offset);
                self.len -= 1;
                self.check_len();
                Ok(Some(removed))
            }
        }
    }

    /// Splices the window back into the rope.
    pub fn commit(&mut self, mode: CommitMode) -> Result<()> {
        let start = self.chunk_start;
        self.close()?;
        match mode {
            CommitMode::Reinitialize(offset) => self.initialize(offset.unwrap_or(start)),
            CommitMode::Finalize => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        let len = self.rope.len();
        if self.chunk_start > len {
            return Err(RopeError::IndexOutOfBounds {
                index: self.chunk_start,
                len,
            }
            .into());
        }
        let cursor = self.cursor();
        let chunk = mem::take(&mut self.chunk);
        let committed = chunk.len();
        self.rope.insert(self.chunk_start, chunk)?;
        trace!(start = self.chunk_start, committed, "committed edit window");

        self.open = false;
        self.chunk_start = cursor;
        self.chunk_offset = 0;
        self.check_len();
        Ok(())
    }

    /// Moves the caret. Inside the open window this is free; anywhere else
    /// the window is committed and the next edit opens a new one.
    pub fn set_cursor(&mut self, pos: usize) -> Result<()> {
        if pos > self.len {
            return Err(RopeError::IndexOutOfBounds {
                index: pos,
                len: self.len,
            }
            .into());
        }
        if self.open && (self.chunk_start..=self.chunk_start + self.chunk.len()).contains(&pos) {
            self.chunk_offset = pos - self.chunk_start;
            return Ok(());
        }
        self.close()?;
        self.chunk_start = pos;
        Ok(())
    }

    /// Code point at `pos` of the document, window included.
    pub fn char_at(&self, pos: usize) -> Result<char> {
        if pos >= self.len {
            return Err(RopeError::IndexOutOfBounds {
                index: pos,
                len: self.len,
            }
            .into());
        }
        let (window_start, window_end) = self.window_range();
        let c = if pos < window_start {
            self.rope.at(pos)?
        } else if pos < window_end {
            self.chunk[pos - window_start]
        } else {
            self.rope.at(pos - self.chunk.len())?
        };
        Ok(c)
    }

    /// `len` code points starting at `start`, window included.
    pub fn substring(&self, start: usize, len: usize) -> Result<Vec<char>> {
        let end = match start.checked_add(len) {
            Some(end) if end <= self.len => end,
            _ => {
                return Err(RopeError::IndexOutOfBounds {
                    index: start.max(start.saturating_add(len)),
                    len: self.len,
                }
                .into());
            }
        };
        let (window_start, window_end) = self.window_range();
        let mut out = Vec::with_capacity(len);
        if start < window_start {
            let until = end.min(window_start);
            out.extend(self.rope.substring(start, until - start)?);
        }
        if start < window_end && end > window_start {
            let from = start.max(window_start) - window_start;
            let until = end.min(window_end) - window_start;
            out.extend_from_slice(&self.chunk[from..until]);
        }
        if end > window_end {
            let from = start.max(window_end);
            out.extend(self.rope.substring(from - self.chunk.len(), end - from)?);
        }
        Ok(out)
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        let (window_start, _) = self.window_range();
        self.rope
            .chars()
            .take(window_start)
            .chain(self.chunk.iter().copied())
            .chain(self.rope.chars().skip(window_start))
    }

    pub fn text(&self) -> String {
        self.chars().collect()
    }

    /// Line breaks of the whole document. Commits the window first.
    pub fn line_breaks(&mut self) -> Result<Vec<LineBreak>> {
        self.close()?;
        Ok(self.rope.line_breaks())
    }

    /// Inserts `data` at `offset` straight into the rope and places the caret
    /// after it.
    pub fn insert_bulk(&mut self, offset: usize, data: impl Into<Rope>) -> Result<()> {
        if offset > self.len {
            return Err(RopeError::IndexOutOfBounds {
                index: offset,
                len: self.len,
            }
            .into());
        }
        self.close()?;
        let data: Rope = data.into();
        let inserted = data.len();
        self.rope.insert(offset, data)?;
        self.len += inserted;
        self.chunk_start = offset + inserted;
        self.check_len();
        Ok(())
    }

    /// Removes `len` code points at `start` and returns them as a rope.
    pub fn cut(&mut self, start: usize, len: usize) -> Result<Rope> {
        self.close()?;
        let removed = self.rope.remove(start, len)?;
        self.len -= removed.len();
        let cursor = self.chunk_start;
        if cursor > start {
            self.chunk_start = start.max(cursor.saturating_sub(removed.len()));
        }
        self.check_len();
        Ok(removed)
    }

    /// Commits the window and rebalances the rope.
    pub fn balance(&mut self) -> Result<()> {
        self.close()?;
        self.rope.balance();
        Ok(())
    }

    pub fn into_rope(mut self) -> Result<Rope> {
        self.close()?;
        Ok(self.rope)
    }

    fn window_range(&self) -> (usize, usize) {
        if self.open {
            (self.chunk_start, self.chunk_start + self.chunk.len())
        } else {
            (self.rope.len(), self.rope.len())
        }
    }

    fn check_len(&self) {
        debug_assert_eq!(self.len, self.rope.len() + self.chunk.len());
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new(Rope::new())
    }
}

impl From<Rope> for TextBuffer {
    fn from(rope: Rope) -> Self {
        Self::new(rope)
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for c in self.chars() {
            f.write_char(c)?;
        }
        Ok(())
    }
}
