//! Fibonacci helpers and slot-based rebalancing.

use tracing::debug;

use crate::node::{self, Node};

/// The `n`th Fibonacci number (`fib(0) == 0`, `fib(1) == 1`), saturating at
/// `usize::MAX`.
pub fn fib(n: usize) -> usize {
    let (mut a, mut b) = (0usize, 1usize);
    for _ in 0..n {
        if a == usize::MAX {
            break;
        }
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}

/// Lower bounds of the rebalancing intervals up to `len`: entry `i` is
/// `F(i + 2)` and stands for the interval `[F(i + 2), F(i + 3))`. The last
/// interval is open ended so that it covers `len` itself.
pub fn build_fib_list(len: usize) -> Vec<usize> {
    let mut list = Vec::new();
    let (mut current, mut next) = (1usize, 2usize);
    while current <= len {
        list.push(current);
        match current.checked_add(next) {
            Some(after) => {
                current = next;
                next = after;
            }
            None => break,
        }
    }
    list
}

/// `len >= F(depth + 2)`.
pub fn is_balanced(len: usize, depth: usize) -> bool {
    len >= fib(depth.saturating_add(2))
}

fn slot_for(bounds: &[usize], len: usize) -> usize {
    bounds
        .partition_point(|&lower| lower <= len)
        .saturating_sub(1)
}

/// Rebuilds `root` from its leaves.
///
/// Every leaf is merged with the occupied slots below its own interval and
/// then carried upward while the slot it belongs to is taken. Occupied slots
/// always hold text in decreasing index order, so the final join prepends
/// each slot to what has been joined so far.
pub fn rebalance(root: Box<Node>) -> Option<Box<Node>> {
    let len = root.len();
    let bounds = build_fib_list(len);
    let mut slots: Vec<Option<Box<Node>>> = Vec::new();
    slots.resize_with(bounds.len(), || None);

    let leaves = node::into_leaves(root);
    let leaf_count = leaves.len();

    for leaf in leaves {
        let leaf_len = leaf.len();
        debug_assert_ne!(leaf_len, 0, "empty leaf in a rope");

        let mut slot = slot_for(&bounds, leaf_len);
        let mut acc = None;
        for lower in &mut slots[..slot] {
            acc = Node::concat(lower.take(), acc);
        }
        let mut acc = match Node::concat(acc, Some(leaf)) {
            Some(acc) => acc,
            None => continue,
        };

        loop {
            let target = slot_for(&bounds, acc.len());
            let mut merged = false;
            for occupied in &mut slots[slot..=target] {
                if let Some(earlier) = occupied.take() {
                    acc = Node::branch(earlier, acc);
                    merged = true;
                }
            }
            if !merged {
                slots[target] = Some(acc);
                break;
            }
            slot = target;
        }
    }

    let mut joined = None;
    for slot in slots {
        joined = Node::concat(slot, joined);
    }
    let joined = joined?;
    if is_balanced(joined.len(), joined.depth()) {
        return Some(joined);
    }

    // uneven leaf lengths can leave the slot join too deep
    debug!(leaf_count, depth = joined.depth(), "falling back to even halving");
    Node::from_nodes(node::into_leaves(joined))
}
