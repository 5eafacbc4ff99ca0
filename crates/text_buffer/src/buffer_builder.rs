use rope::{LineBreak, LineBreakIndex, Rope};
use tracing::debug;

use crate::buffer::TextBuffer;
use crate::config::BufferConfig;

/// Appends decoded pieces to a rope and keeps the line-break index current
/// as they arrive.
#[derive(Default, Debug)]
pub struct TextBufferBuilder {
    rope: Rope,
    line_breaks: LineBreakIndex,
    config: BufferConfig,
}

impl TextBufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BufferConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Accept a chunk of text (may include multiple lines).
    pub fn accept_chunk(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        self.accept(Rope::from(chunk));
    }

    /// Accept a piece of already decoded code points.
    pub fn accept_chars(&mut self, chars: Vec<char>) {
        if chars.is_empty() {
            return;
        }
        self.accept(Rope::from(chars));
    }

    fn accept(&mut self, piece: Rope) {
        self.line_breaks.extend(piece.len(), &piece.line_breaks());
        self.rope.append(piece);
        debug_assert_eq!(self.line_breaks.covered_len(), self.rope.len());
    }

    pub fn len(&self) -> usize {
        self.rope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.is_empty()
    }

    /// Breaks of everything accepted so far. A CR at the end of one piece and
    /// an LF at the start of the next are already a single entry.
    pub fn line_breaks(&self) -> &[LineBreak] {
        self.line_breaks.breaks()
    }

    /// Finish building and return a `TextBuffer`.
    pub fn finish(mut self) -> TextBuffer {
        let depth = self.rope.depth();
        self.rope.balance();
        debug!(
            len = self.rope.len(),
            lines = self.line_breaks.breaks().len() + 1,
            depth_before = depth,
            depth_after = self.rope.depth(),
            "built text buffer"
        );
        TextBuffer::with_config(self.rope, self.config)
    }
}
