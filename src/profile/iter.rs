//! Depth-bounded, repeatable traversal of a profile tree.
//!
//! The iterator keeps an explicit LIFO stack of pending frames instead of
//! recursing, so profiled call stacks tens of thousands of frames deep
//! cannot exhaust the call stack. The traversal is lazy, depth-first,
//! pre-order, and re-derivable: `ProfileTree::iter` always starts from
//! scratch.
//!
//! Protocol: `next_child` advances to the next unvisited child at the
//! current level, `at` reads it, `step_into` descends into it, `step_up`
//! signals completion at the current level. The first visited node is the
//! implicit root itself (location ID 0).

use crate::profile::tree::{ProfileTree, TreeNode};

struct IterFrame<'a> {
    children: &'a [TreeNode],
    /// Index of the currently selected child; `None` before the first
    /// `next_child` at this level.
    child: Option<usize>,
}

/// Explicit-stack depth-first iterator over a profile tree.
pub struct TreeIterator<'a> {
    stack: Vec<IterFrame<'a>>,
}

impl<'a> TreeIterator<'a> {
    pub(crate) fn new(tree: &'a ProfileTree) -> Self {
        // A virtual top-level frame whose single child is the root makes
        // the root itself the first visited node.
        Self {
            stack: vec![IterFrame {
                children: std::slice::from_ref(tree.root()),
                child: None,
            }],
        }
    }

    /// True while any traversal frame remains.
    pub fn has_more(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Advance to the next unvisited child at the current level. Returns
    /// false when the level is exhausted.
    pub fn next_child(&mut self) -> bool {
        match self.stack.last_mut() {
            Some(frame) => {
                let next = frame
                    .child
                    .map_or(0, |c| c + 1)
                    .min(frame.children.len());
                frame.child = Some(next);
                next < frame.children.len()
            }
            None => false,
        }
    }

    /// The child selected by the last successful `next_child`.
    pub fn at(&self) -> Option<&'a TreeNode> {
        let frame = self.stack.last()?;
        frame.children.get(frame.child?)
    }

    /// Descend into the child selected by the last successful
    /// `next_child`. Returns false if no child is selected.
    pub fn step_into(&mut self) -> bool {
        let selected = match self.at() {
            Some(node) => node,
            None => return false,
        };
        self.stack.push(IterFrame {
            children: selected.children(),
            child: None,
        });
        true
    }

    /// Signal completion at the current level and ascend.
    pub fn step_up(&mut self) {
        self.stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tree::Sample;

    /// Drive the full protocol and record every visited (id, cum) pair in
    /// pre-order.
    fn walk(tree: &ProfileTree) -> Vec<(u64, i64)> {
        let mut it = tree.iter();
        let mut visited = Vec::new();
        while it.has_more() {
            if it.next_child() {
                if let Some(node) = it.at() {
                    visited.push((node.location_id(), node.cum()));
                }
                it.step_into();
                continue;
            }
            it.step_up();
        }
        visited
    }

    #[test]
    fn test_preorder_traversal() {
        let mut tree = ProfileTree::new();
        tree.insert(&Sample::new(2, vec![2, 1]));
        tree.insert(&Sample::new(1, vec![5, 3, 2, 1]));
        tree.insert(&Sample::new(3, vec![4, 3, 2, 1]));

        assert_eq!(
            walk(&tree),
            vec![(0, 6), (1, 6), (2, 6), (3, 4), (4, 3), (5, 1)]
        );
    }

    #[test]
    fn test_traversal_is_repeatable() {
        let mut tree = ProfileTree::new();
        tree.insert(&Sample::new(1, vec![4, 2, 1]));
        tree.insert(&Sample::new(2, vec![3, 1]));

        assert_eq!(walk(&tree), walk(&tree));
    }

    #[test]
    fn test_empty_tree_visits_only_root() {
        let tree = ProfileTree::new();
        assert_eq!(walk(&tree), vec![(0, 0)]);
    }

    #[test]
    fn test_at_before_next_child_is_none() {
        let tree = ProfileTree::new();
        let it = tree.iter();
        assert!(it.at().is_none());
    }

    #[test]
    fn test_deep_stack_does_not_recurse() {
        // A pathological stack depth that would overflow a recursive walk.
        let stack: Vec<u64> = (1..=50_000).collect();
        let mut tree = ProfileTree::new();
        tree.insert(&Sample::new(1, stack));

        let visited = walk(&tree);
        assert_eq!(visited.len(), 50_001);
        assert_eq!(visited[0], (0, 1));
        assert_eq!(visited[50_000], (1, 1));
    }
}
