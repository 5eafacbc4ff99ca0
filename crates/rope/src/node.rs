use std::cmp;
use unicode_segmentation::UnicodeSegmentation;

use crate::linebreak::{self, LineBreak, LineBreakIndex};

/// Upper bound on the fragment length of leaves built from bulk text.
pub const MAX_LEAF_LEN: usize = if cfg!(test) { 8 } else { 1024 };

/// A strictly owned binary tree node. The empty sequence is represented by
/// the absence of a node, so leaves are never empty and branches always have
/// both children.
#[derive(Debug)]
pub enum Node {
    Branch(Branch),
    Leaf(Leaf),
}

#[derive(Debug)]
pub struct Branch {
    // length of `left`
    weight: usize,
    left: Box<Node>,
    right: Box<Node>,
}

#[derive(Debug, Clone)]
pub struct Leaf {
    fragment: Vec<char>,
    line_breaks: Vec<LineBreak>,
}

impl Leaf {
    fn new(fragment: Vec<char>) -> Self {
        debug_assert!(!fragment.is_empty(), "leaves must not be empty");
        let line_breaks = linebreak::scan(&fragment);
        Leaf {
            fragment,
            line_breaks,
        }
    }

    pub fn as_slice(&self) -> &[char] {
        &self.fragment
    }

    pub fn len(&self) -> usize {
        self.fragment.len()
    }

    fn split_at(mut self, index: usize) -> (Option<Box<Node>>, Option<Box<Node>>) {
        if index == 0 {
            return (None, Some(Box::new(Node::Leaf(self))));
        }
        if index >= self.len() {
            return (Some(Box::new(Node::Leaf(self))), None);
        }
        let right = self.fragment.split_off(index);
        (Node::leaf(self.fragment), Node::leaf(right))
    }
}

impl Node {
    /// Builds a single leaf; `None` for an empty fragment.
    pub fn leaf(fragment: Vec<char>) -> Option<Box<Node>> {
        (!fragment.is_empty()).then(|| Box::new(Node::Leaf(Leaf::new(fragment))))
    }

    pub fn branch(left: Box<Node>, right: Box<Node>) -> Box<Node> {
        Box::new(Node::Branch(Branch {
            weight: left.len(),
            left,
            right,
        }))
    }

    /// Joins two optional subtrees; an absent side yields the other one as is.
    pub fn concat(left: Option<Box<Node>>, right: Option<Box<Node>>) -> Option<Box<Node>> {
        match (left, right) {
            (Some(left), Some(right)) => Some(Self::branch(left, right)),
            (left, None) => left,
            (None, right) => right,
        }
    }

    /// Builds a tree from `text`, cutting leaves at grapheme cluster
    /// boundaries so that a CR+LF pair always lands in one leaf.
    pub fn from_str(text: &str) -> Option<Box<Node>> {
        Self::from_nodes(Self::split_text_to_leaves(text))
    }

    pub fn from_chars(chars: &[char]) -> Option<Box<Node>> {
        Self::from_nodes(Self::split_chars_to_leaves(chars))
    }

    pub fn split_text_to_leaves(text: &str) -> Vec<Box<Node>> {
        let mut leaves = Vec::new();
        let mut fragment: Vec<char> = Vec::with_capacity(MAX_LEAF_LEN);

        for grapheme in text.graphemes(true) {
            let grapheme_len = grapheme.chars().count();
            if !fragment.is_empty() && fragment.len() + grapheme_len > MAX_LEAF_LEN {
                leaves.extend(Self::leaf(std::mem::take(&mut fragment)));
            }
            fragment.extend(grapheme.chars());
        }
        leaves.extend(Self::leaf(fragment));
        leaves
    }

    pub fn split_chars_to_leaves(chars: &[char]) -> Vec<Box<Node>> {
        let mut leaves = Vec::with_capacity(chars.len().div_ceil(MAX_LEAF_LEN));
        let mut start = 0;

        while start < chars.len() {
            let mut end = cmp::min(start + MAX_LEAF_LEN, chars.len());
            if end < chars.len() && chars[end - 1] == '\r' && chars[end] == '\n' {
                end += 1;
            }
            leaves.extend(Self::leaf(chars[start..end].to_vec()));
            start = end;
        }
        leaves
    }

    /// Pairs nodes level by level until a single root is left.
    pub fn from_nodes(mut nodes: Vec<Box<Node>>) -> Option<Box<Node>> {
        while nodes.len() > 1 {
            let mut parents = Vec::with_capacity(nodes.len().div_ceil(2));
            let mut children = nodes.into_iter();
            while let Some(left) = children.next() {
                match children.next() {
                    Some(right) => parents.push(Self::branch(left, right)),
                    None => parents.push(left),
                }
            }
            nodes = parents;
        }
        nodes.pop()
    }

    #[cfg(test)]
    pub fn is_leaf(&self) -> bool {
        match self {
            Self::Branch(_) => false,
            Self::Leaf(_) => true,
        }
    }

    pub fn len(&self) -> usize {
        let mut len = 0;
        let mut node = self;
        loop {
            match node {
                Self::Leaf(leaf) => return len + leaf.len(),
                Self::Branch(branch) => {
                    len += branch.weight;
                    node = &branch.right;
                }
            }
        }
    }

    /// 0 for a leaf, `1 + max(depth(left), depth(right))` for a branch.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                Self::Leaf(_) => deepest = cmp::max(deepest, depth),
                Self::Branch(branch) => {
                    stack.push((&*branch.left, depth + 1));
                    stack.push((&*branch.right, depth + 1));
                }
            }
        }
        deepest
    }

    pub fn char_at(&self, mut index: usize) -> Option<char> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf(leaf) => return leaf.fragment.get(index).copied(),
                Self::Branch(branch) => {
                    if index < branch.weight {
                        node = &branch.left;
                    } else {
                        index -= branch.weight;
                        node = &branch.right;
                    }
                }
            }
        }
    }

    /// Appends `[start, start + len)` to `buf`. The range must lie within
    /// the node; a leaf only ever contributes its intersecting slice.
    pub fn write_range(&self, start: usize, len: usize, buf: &mut Vec<char>) {
        if len == 0 {
            return;
        }
        let end = start + len;
        let mut stack = vec![(self, 0)];

        while let Some((node, node_start)) = stack.pop() {
            match node {
                Self::Leaf(leaf) => {
                    let from = cmp::min(start.saturating_sub(node_start), leaf.len());
                    let to = cmp::min(end - node_start, leaf.len());
                    buf.extend_from_slice(&leaf.fragment[from..to]);
                }
                Self::Branch(branch) => {
                    let mid = node_start + branch.weight;
                    if end > mid {
                        stack.push((&*branch.right, mid));
                    }
                    if start < mid {
                        stack.push((&*branch.left, node_start));
                    }
                }
            }
        }
    }

    pub fn write_to(&self, buf: &mut Vec<char>) {
        for leaf in self.leaves() {
            buf.extend_from_slice(&leaf.fragment);
        }
    }

    pub fn to_chars(&self) -> Vec<char> {
        let mut buf = Vec::with_capacity(self.len());
        self.write_to(&mut buf);
        buf
    }

    /// Preorder walk over the leaves, left to right.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }

    /// Absolute line breaks of the whole subtree.
    pub fn line_breaks(&self) -> Vec<LineBreak> {
        let mut index = LineBreakIndex::new();
        for leaf in self.leaves() {
            index.extend(leaf.len(), &leaf.line_breaks);
        }
        index.into_breaks()
    }

    /// Line breaks of the rightmost leaf only, as absolute offsets.
    pub fn last_line_breaks(&self) -> Vec<LineBreak> {
        let mut offset = 0;
        let mut node = self;
        loop {
            match node {
                Self::Leaf(leaf) => {
                    return leaf.line_breaks.iter().map(|b| b.shifted(offset)).collect();
                }
                Self::Branch(branch) => {
                    offset += branch.weight;
                    node = &branch.right;
                }
            }
        }
    }

    /// Checks the weight invariant of every branch. Debug helper.
    #[cfg(test)]
    pub fn check_weights(&self) -> Result<(), String> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Self::Branch(branch) = node {
                let left_len = branch.left.len();
                if branch.weight != left_len {
                    return Err(format!(
                        "branch weight {} does not match left length {left_len}",
                        branch.weight
                    ));
                }
                stack.push(&branch.left);
                stack.push(&branch.right);
            }
        }
        Ok(())
    }
}

/// Splits `node` at `index`, consuming it. Concatenating the two halves
/// reproduces the original sequence; an empty half is `None`.
///
/// The descent follows the single root-to-leaf path, parking the untouched
/// sibling of every visited branch; the halves are then rebuilt bottom-up.
pub fn split_at(node: Box<Node>, mut index: usize) -> (Option<Box<Node>>, Option<Box<Node>>) {
    enum Parked {
        Left(Box<Node>),
        Right(Box<Node>),
    }

    let mut path = Vec::new();
    let mut node = node;
    let (mut left, mut right) = loop {
        match *node {
            Node::Leaf(leaf) => break leaf.split_at(index),
            Node::Branch(Branch {
                weight,
                left,
                right,
            }) => {
                if index == weight {
                    break (Some(left), Some(right));
                }
                if index < weight {
                    path.push(Parked::Right(right));
                    node = left;
                } else {
                    index -= weight;
                    path.push(Parked::Left(left));
                    node = right;
                }
            }
        }
    };

    while let Some(parked) = path.pop() {
        match parked {
            Parked::Right(sibling) => right = Node::concat(right, Some(sibling)),
            Parked::Left(sibling) => left = Node::concat(Some(sibling), left),
        }
    }
    (left, right)
}

/// Consumes the tree and returns its leaves in order.
pub fn into_leaves(root: Box<Node>) -> Vec<Box<Node>> {
    let mut leaves = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match *node {
            Node::Leaf(leaf) => leaves.push(Box::new(Node::Leaf(leaf))),
            Node::Branch(Branch { left, right, .. }) => {
                stack.push(right);
                stack.push(left);
            }
        }
    }
    leaves
}

/// Drops a tree without recursing on its depth.
pub fn dismantle(root: Box<Node>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Node::Branch(Branch { left, right, .. }) = *node {
            stack.push(left);
            stack.push(right);
        }
    }
}

pub struct Leaves<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Leaf;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf(leaf) => return Some(leaf),
                Node::Branch(branch) => {
                    self.stack.push(&branch.right);
                    self.stack.push(&branch.left);
                }
            }
        }
        None
    }
}
