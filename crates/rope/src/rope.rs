//! A binary rope over code points with an incremental line-break index.
//!
//! The tree is strictly owned: every branch owns its two children and keeps
//! the length of its left subtree as its weight. Edits split the tree along a
//! single path and re-link the pieces; rebalancing is explicit
//! ([`Rope::balance`]) so that edit cost stays predictable.

mod balance;
mod error;
mod linebreak;
mod node;

pub use balance::{build_fib_list, fib};
pub use error::RopeError;
pub use linebreak::{LineBreak, LineBreakIndex, LineBreakKind};
pub use node::MAX_LEAF_LEN;

use node::Node;
use std::fmt::{self, Write};
use tracing::debug;

#[derive(Debug, Default)]
pub struct Rope {
    root: Option<Box<Node>>,
}

impl Rope {
    pub fn new() -> Self {
        Rope { root: None }
    }

    pub fn len(&self) -> usize {
        self.root.as_deref().map_or(0, Node::len)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Depth of the tree, 0 for an empty rope or a single leaf.
    pub fn depth(&self) -> usize {
        self.root.as_deref().map_or(0, Node::depth)
    }

    /// Returns the code point at `index`.
    pub fn at(&self, index: usize) -> Result<char, RopeError> {
        self.root
            .as_deref()
            .and_then(|root| root.char_at(index))
            .ok_or_else(|| RopeError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
    }

    /// Returns `len` code points starting at `start`.
    pub fn substring(&self, start: usize, len: usize) -> Result<Vec<char>, RopeError> {
        self.check_range(start, len)?;
        let mut buf = Vec::with_capacity(len);
        if let Some(root) = &self.root {
            root.write_range(start, len, &mut buf);
        }
        Ok(buf)
    }

    /// Materializes the whole sequence.
    pub fn to_chars(&self) -> Vec<char> {
        self.root.as_deref().map(Node::to_chars).unwrap_or_default()
    }

    /// Inserts `data` so that it starts at `index`. Accepts another rope
    /// (such as a piece returned by [`Rope::remove`]), a `&str`, a `String`
    /// or a code-point buffer.
    pub fn insert(&mut self, index: usize, data: impl Into<Rope>) -> Result<(), RopeError> {
        let len = self.len();
        if index > len {
            return Err(RopeError::IndexOutOfBounds { index, len });
        }
        let mut data: Rope = data.into();
        let Some(piece) = data.root.take() else {
            return Ok(());
        };
        let (before, after) = match self.root.take() {
            Some(root) => node::split_at(root, index),
            None => (None, None),
        };
        self.root = Node::concat(Node::concat(before, Some(piece)), after);
        Ok(())
    }

    pub fn append(&mut self, data: impl Into<Rope>) {
        let mut data: Rope = data.into();
        let piece = data.root.take();
        self.root = Node::concat(self.root.take(), piece);
    }

    /// Removes `len` code points starting at `start` and hands the detached
    /// piece back to the caller.
    pub fn remove(&mut self, start: usize, len: usize) -> Result<Rope, RopeError> {
        self.check_range(start, len)?;
        if len == 0 {
            return Ok(Rope::new());
        }
        if start == 0 && len == self.len() {
            return Ok(Rope {
                root: self.root.take(),
            });
        }
        let Some(root) = self.root.take() else {
            return Ok(Rope::new());
        };

        let (first, rest) = node::split_at(root, start);
        let (removed, after) = match rest {
            Some(rest) => node::split_at(rest, len),
            None => (None, None),
        };
        self.root = Node::concat(first, after);
        Ok(Rope { root: removed })
    }

    /// Splits the rope at `index`: `self` keeps `[0, index)` and the rest is
    /// returned.
    pub fn split_off(&mut self, index: usize) -> Result<Rope, RopeError> {
        let len = self.len();
        if index > len {
            return Err(RopeError::IndexOutOfBounds { index, len });
        }
        let Some(root) = self.root.take() else {
            return Ok(Rope::new());
        };
        let (left, right) = node::split_at(root, index);
        self.root = left;
        Ok(Rope { root: right })
    }

    /// A rope of depth `d` is balanced when its length is at least
    /// `fib(d + 2)`.
    pub fn is_balanced(&self) -> bool {
        match &self.root {
            Some(root) => balance::is_balanced(root.len(), root.depth()),
            None => true,
        }
    }

    pub fn balance(&mut self) {
        if self.is_balanced() {
            return;
        }
        let Some(root) = self.root.take() else {
            return;
        };
        let depth_before = root.depth();
        self.root = balance::rebalance(root);
        debug!(
            len = self.len(),
            depth_before,
            depth_after = self.depth(),
            "rebalanced rope"
        );
    }

    /// Absolute offsets of every line break; CR+LF is reported once, at the LF.
    pub fn line_breaks(&self) -> Vec<LineBreak> {
        self.root
            .as_deref()
            .map(Node::line_breaks)
            .unwrap_or_default()
    }

    /// Breaks of the last leaf only. Tells an incremental reader whether the
    /// rope currently ends in a bare CR.
    pub fn last_line_breaks(&self) -> Vec<LineBreak> {
        self.root
            .as_deref()
            .map(Node::last_line_breaks)
            .unwrap_or_default()
    }

    pub fn line_count(&self) -> usize {
        self.line_breaks().len() + 1
    }

    /// Iterates over the leaf fragments in order.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            leaves: self.root.as_deref().map(Node::leaves),
        }
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.chunks().flat_map(|chunk| chunk.iter().copied())
    }

    fn check_range(&self, start: usize, len: usize) -> Result<(), RopeError> {
        let rope_len = self.len();
        match start.checked_add(len) {
            Some(end) if end <= rope_len => Ok(()),
            _ => Err(RopeError::IndexOutOfBounds {
                index: if start > rope_len {
                    start
                } else {
                    start.saturating_add(len)
                },
                len: rope_len,
            }),
        }
    }
}

impl Drop for Rope {
    fn drop(&mut self) {
        if let Some(root) = self.root.take() {
            node::dismantle(root);
        }
    }
}

impl Clone for Rope {
    fn clone(&self) -> Self {
        let leaves = self
            .chunks()
            .filter_map(|chunk| Node::leaf(chunk.to_vec()))
            .collect();
        Rope {
            root: Node::from_nodes(leaves),
        }
    }
}

pub struct Chunks<'a> {
    leaves: Option<node::Leaves<'a>>,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [char];

    fn next(&mut self) -> Option<Self::Item> {
        self.leaves.as_mut()?.next().map(|leaf| leaf.as_slice())
    }
}

impl From<&str> for Rope {
    fn from(text: &str) -> Self {
        Rope {
            root: Node::from_str(text),
        }
    }
}

impl From<String> for Rope {
    fn from(text: String) -> Self {
        Rope::from(text.as_str())
    }
}

impl From<&[char]> for Rope {
    fn from(chars: &[char]) -> Self {
        Rope {
            root: Node::from_chars(chars),
        }
    }
}

impl From<Vec<char>> for Rope {
    fn from(chars: Vec<char>) -> Self {
        if chars.len() <= MAX_LEAF_LEN {
            return Rope {
                root: Node::leaf(chars),
            };
        }
        Rope::from(chars.as_slice())
    }
}

impl FromIterator<char> for Rope {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Rope::from(iter.into_iter().collect::<Vec<char>>())
    }
}

impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars() {
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl PartialEq for Rope {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.chars().eq(other.chars())
    }
}

impl Eq for Rope {}

impl PartialEq<str> for Rope {
    fn eq(&self, other: &str) -> bool {
        self.chars().eq(other.chars())
    }
}

impl PartialEq<&str> for Rope {
    fn eq(&self, other: &&str) -> bool {
        self.chars().eq(other.chars())
    }
}

impl PartialEq<String> for Rope {
    fn eq(&self, other: &String) -> bool {
        self.chars().eq(other.chars())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world() {
        let hello_rope = Rope::from("Hello world!");
        let hello_string = String::from("Hello world!");
        assert_eq!(hello_rope.to_string(), hello_string);
    }

    #[test]
    fn hello_not_the_same() {
        let hello_rope = Rope::from("Hello rope!");
        assert_ne!(hello_rope, "Hello word!");
    }

    #[test]
    fn empty_rope() {
        let rope = Rope::from("");
        assert_eq!(rope.len(), 0);
        assert_eq!(rope.to_string(), "");
        assert!(rope.is_balanced());
        assert!(rope.line_breaks().is_empty());
        assert!(rope.to_chars().is_empty());
        assert_eq!(rope.line_count(), 1);
    }

    #[test]
    fn at_and_bounds() {
        let rope = Rope::from("héllo");
        assert_eq!(rope.at(1), Ok('é'));
        assert_eq!(
            rope.at(5),
            Err(RopeError::IndexOutOfBounds { index: 5, len: 5 })
        );
        assert!(Rope::new().at(0).is_err());
    }

    #[test]
    fn substring_bounds() {
        let rope = Rope::from("0123456789");
        assert_eq!(rope.substring(2, 3).unwrap(), vec!['2', '3', '4']);
        assert_eq!(rope.substring(10, 0).unwrap(), Vec::<char>::new());
        assert!(rope.substring(11, 0).is_err());
        assert!(rope.substring(8, 3).is_err());
        assert!(rope.substring(1, usize::MAX).is_err());
    }

    #[test]
    fn insert_in_middle() {
        let mut rope = Rope::from("hello world");
        rope.insert(5, " there").unwrap();
        assert_eq!(rope, "hello there world");
        assert_eq!(rope.len(), 17);
    }

    #[test]
    fn insert_at_beginning() {
        let mut rope = Rope::from("world!");
        rope.insert(0, "Hello ").unwrap();
        assert_eq!(rope.to_string(), "Hello world!");
    }

    #[test]
    fn insert_at_end() {
        let mut rope = Rope::from("Hello");
        rope.insert(5, " world!").unwrap();
        assert_eq!(rope.to_string(), "Hello world!");
    }

    #[test]
    fn insert_into_empty() {
        let mut rope = Rope::new();
        rope.insert(0, "abc").unwrap();
        assert_eq!(rope, "abc");
    }

    #[test]
    fn insert_out_of_bounds_leaves_rope_untouched() {
        let mut rope = Rope::from("abc");
        assert_eq!(
            rope.insert(4, "x"),
            Err(RopeError::IndexOutOfBounds { index: 4, len: 3 })
        );
        assert_eq!(rope, "abc");
    }

    #[test]
    fn remove_returns_piece() {
        let mut rope = Rope::from("0123456789");
        let removed = rope.remove(3, 4).unwrap();
        assert_eq!(removed.to_string(), "3456");
        assert_eq!(rope.to_string(), "0126789");
    }

    #[test]
    fn remove_everything_detaches_root() {
        let mut rope = Rope::from("some text that spans a few leaves");
        let depth = rope.depth();
        let removed = rope.remove(0, rope.len()).unwrap();
        assert!(rope.is_empty());
        assert_eq!(removed.depth(), depth);
        assert_eq!(removed, "some text that spans a few leaves");
    }

    #[test]
    fn remove_out_of_bounds() {
        let mut rope = Rope::from("abc");
        assert!(rope.remove(2, 2).is_err());
        assert!(rope.remove(4, 0).is_err());
        assert_eq!(rope, "abc");
        assert!(rope.remove(3, 0).unwrap().is_empty());
    }

    #[test]
    fn remove_then_insert_back() {
        let text = "the quick brown fox jumps over the lazy dog";
        let mut rope = Rope::from(text);
        let piece = rope.remove(10, 9).unwrap();
        assert_eq!(piece, "brown fox");
        rope.insert(10, piece).unwrap();
        assert_eq!(rope, text);
    }

    #[test]
    fn delete_then_insert() {
        let mut rope = Rope::from("Hello beautiful world!");
        rope.remove(6, 15).unwrap();
        rope.insert(6, "world").unwrap();
        assert_eq!(rope.to_string(), "Hello world!");
    }

    #[test]
    fn split_off_and_append() {
        let mut rope = Rope::from("left|right");
        let right = rope.split_off(5).unwrap();
        assert_eq!(rope, "left|");
        assert_eq!(right, "right");
        rope.append(right);
        assert_eq!(rope, "left|right");
        assert!(rope.split_off(11).is_err());
    }

    #[test]
    fn equality_ignores_shape() {
        let mut built = Rope::new();
        for c in "same content".chars() {
            built.append(c.to_string());
        }
        let flat = Rope::from("same content");
        assert_ne!(built.depth(), flat.depth());
        assert_eq!(built, flat);
        assert_ne!(built, Rope::from("same contents"));
    }

    #[test]
    fn clone_is_deep_and_equal() {
        let mut rope = Rope::from("clone me please");
        let copy = rope.clone();
        rope.remove(0, 6).unwrap();
        assert_eq!(copy, "clone me please");
        assert_eq!(rope, "me please");
    }

    #[test]
    fn line_breaks_lf() {
        let rope = Rope::from("line1\nline2\nline3");
        let offsets: Vec<_> = rope.line_breaks().iter().map(|b| b.offset).collect();
        assert_eq!(offsets, vec![5, 11]);
        assert_eq!(rope.line_count(), 3);
    }

    #[test]
    fn line_breaks_crlf_and_cr() {
        let crlf = Rope::from("a\r\nb");
        assert_eq!(
            crlf.line_breaks(),
            vec![LineBreak::new(2, LineBreakKind::CrLf)]
        );
        let cr = Rope::from("a\rb");
        assert_eq!(cr.line_breaks(), vec![LineBreak::new(1, LineBreakKind::Cr)]);
        let lf = Rope::from("a\nb");
        assert_eq!(lf.line_breaks(), vec![LineBreak::new(1, LineBreakKind::Lf)]);
    }

    #[test]
    fn line_breaks_across_appended_chunks() {
        let mut rope = Rope::new();
        rope.append("first\r");
        assert_eq!(
            rope.last_line_breaks(),
            vec![LineBreak::new(5, LineBreakKind::Cr)]
        );
        rope.append("\nsecond");
        assert_eq!(
            rope.line_breaks(),
            vec![LineBreak::new(6, LineBreakKind::CrLf)]
        );
    }

    #[test]
    fn streamed_appends_balance() {
        let mut rope = Rope::new();
        let mut expected = String::new();
        for i in 0..1000 {
            let c = char::from(b'a' + (i % 26) as u8);
            rope.append(c.to_string());
            expected.push(c);
        }
        assert!(!rope.is_balanced());
        rope.balance();
        assert!(rope.is_balanced());
        assert_eq!(rope, expected);
    }

    #[test]
    fn balance_on_balanced_rope_keeps_content() {
        let mut rope = Rope::from("already balanced text");
        assert!(rope.is_balanced());
        rope.balance();
        assert_eq!(rope, "already balanced text");
    }

    #[test]
    fn chunks_cover_rope() {
        let rope = Rope::from("chunks are leaf fragments");
        let joined: String = rope.chunks().flatten().collect();
        assert_eq!(joined, "chunks are leaf fragments");
        assert!(rope.chunks().all(|chunk| !chunk.is_empty()));
        assert_eq!(Rope::new().chunks().count(), 0);
    }

    #[test]
    fn error_message() {
        let err = Rope::from("ab").at(7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "index 7 is out of bounds for a rope of length 2"
        );
    }
}
