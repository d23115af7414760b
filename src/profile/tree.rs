//! Location-ID-keyed profile tree built from stack samples.
//!
//! A `ProfileTree` accumulates samples into a call tree whose nodes are
//! keyed by location ID and carry cumulative values. The tree is the unit
//! everything else operates on: iteration, merging, and flamegraph
//! generation.

use crate::profile::iter::TreeIterator;
use crate::utils::config::ROOT_LOCATION_ID;

/// One stack-trace sample: a signed value plus the stack's location IDs
/// ordered leaf-first (index 0 is the innermost frame, the last index is
/// the outermost). Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    value: i64,
    location_ids: Vec<u64>,
}

impl Sample {
    pub fn new(value: i64, location_ids: Vec<u64>) -> Self {
        Self {
            value,
            location_ids,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// Location IDs ordered leaf-first.
    pub fn location_ids(&self) -> &[u64] {
        &self.location_ids
    }
}

/// A single node of a profile tree.
///
/// Children are kept sorted by location ID so that traversal order is
/// deterministic and repeated walks of an unmutated tree are identical.
#[derive(Debug)]
pub struct TreeNode {
    location_id: u64,
    cum: i64,
    children: Vec<TreeNode>,
}

impl TreeNode {
    pub(crate) fn new(location_id: u64) -> Self {
        Self {
            location_id,
            cum: 0,
            children: Vec::new(),
        }
    }

    pub(crate) fn with(location_id: u64, cum: i64, children: Vec<TreeNode>) -> Self {
        Self {
            location_id,
            cum,
            children,
        }
    }

    pub fn location_id(&self) -> u64 {
        self.location_id
    }

    /// Cumulative value: total sample value attributed to this node,
    /// inclusive of all descendants.
    pub fn cum(&self) -> i64 {
        self.cum
    }

    /// Children ordered by location ID.
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Find or create the child keyed by `location_id`, keeping the child
    /// list sorted.
    fn child_mut(&mut self, location_id: u64) -> &mut TreeNode {
        match self
            .children
            .binary_search_by_key(&location_id, |c| c.location_id)
        {
            Ok(idx) => &mut self.children[idx],
            Err(idx) => {
                self.children.insert(idx, TreeNode::new(location_id));
                &mut self.children[idx]
            }
        }
    }

    /// Append an already-ordered child. The caller is responsible for
    /// keeping the list sorted by location ID.
    pub(crate) fn push_child(&mut self, child: TreeNode) {
        self.children.push(child);
    }
}

impl Drop for TreeNode {
    // Deep profiled stacks would overflow the recursive drop glue, so
    // drain descendants iteratively.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl Clone for TreeNode {
    // Derived clone glue recurses as deep as the profiled stacks; rebuild
    // the copy from a reverse pre-order pass instead.
    fn clone(&self) -> Self {
        let mut order: Vec<&TreeNode> = Vec::new();
        let mut work: Vec<&TreeNode> = vec![self];
        while let Some(node) = work.pop() {
            order.push(node);
            work.extend(node.children.iter());
        }

        // Walking `order` backwards, a node's cloned children are always
        // the newest `children.len()` finished subtrees, in order.
        let mut built: Vec<TreeNode> = Vec::new();
        for node in order.into_iter().rev() {
            let at = built.len() - node.children.len();
            let children = built.split_off(at);
            built.push(TreeNode::with(node.location_id, node.cum, children));
        }
        match built.pop() {
            Some(root) => root,
            None => TreeNode::new(self.location_id),
        }
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        let mut work = vec![(self, other)];
        while let Some((a, b)) = work.pop() {
            if a.location_id != b.location_id
                || a.cum != b.cum
                || a.children.len() != b.children.len()
            {
                return false;
            }
            work.extend(a.children.iter().zip(b.children.iter()));
        }
        true
    }
}

impl Eq for TreeNode {}

/// The ID-keyed call tree built by repeated sample insertion.
///
/// Exclusively owned by whoever builds it; insertion is not thread-safe
/// and must be externally serialized. Concurrent readers of an unmutated
/// tree are always safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileTree {
    root: TreeNode,
}

impl ProfileTree {
    pub fn new() -> Self {
        Self {
            root: TreeNode::new(ROOT_LOCATION_ID),
        }
    }

    pub(crate) fn from_root(root: TreeNode) -> Self {
        Self { root }
    }

    /// The implicit root node. Its cumulative value equals the sum of all
    /// inserted sample values.
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Total value across all inserted samples.
    pub fn total(&self) -> i64 {
        self.root.cum
    }

    /// Insert a sample, walking its stack from the outermost frame toward
    /// the leaf and adding the sample value at every visited node,
    /// creating missing children along the way.
    ///
    /// Never fails. Insertion order across calls does not affect the
    /// resulting tree: values are commutative sums and child creation is
    /// idempotent by location ID.
    pub fn insert(&mut self, sample: &Sample) {
        self.root.cum += sample.value;
        let mut cur = &mut self.root;
        for &location_id in sample.location_ids.iter().rev() {
            cur = cur.child_mut(location_id);
            cur.cum += sample.value;
        }
    }

    /// Start a fresh depth-first traversal. Repeated calls on an unmutated
    /// tree produce identical sequences.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }
}

impl Default for ProfileTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cum_of(tree: &ProfileTree, path: &[u64]) -> i64 {
        let mut cur = tree.root();
        for id in path {
            cur = cur
                .children()
                .iter()
                .find(|c| c.location_id() == *id)
                .unwrap();
        }
        cur.cum()
    }

    #[test]
    fn test_insert_accumulates_along_stack() {
        let mut tree = ProfileTree::new();
        tree.insert(&Sample::new(2, vec![2, 1]));
        tree.insert(&Sample::new(1, vec![5, 3, 2, 1]));
        tree.insert(&Sample::new(3, vec![4, 3, 2, 1]));

        assert_eq!(tree.total(), 6);
        assert_eq!(cum_of(&tree, &[1]), 6);
        assert_eq!(cum_of(&tree, &[1, 2]), 6);
        assert_eq!(cum_of(&tree, &[1, 2, 3]), 4);
        assert_eq!(cum_of(&tree, &[1, 2, 3, 4]), 3);
        assert_eq!(cum_of(&tree, &[1, 2, 3, 5]), 1);
    }

    #[test]
    fn test_insert_order_independence() {
        let samples = vec![
            Sample::new(2, vec![2, 1]),
            Sample::new(1, vec![5, 3, 2, 1]),
            Sample::new(3, vec![4, 3, 2, 1]),
            Sample::new(4, vec![1]),
        ];

        let mut forward = ProfileTree::new();
        for s in &samples {
            forward.insert(s);
        }

        let mut backward = ProfileTree::new();
        for s in samples.iter().rev() {
            backward.insert(s);
        }

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_children_sorted_by_location_id() {
        let mut tree = ProfileTree::new();
        tree.insert(&Sample::new(1, vec![9]));
        tree.insert(&Sample::new(1, vec![3]));
        tree.insert(&Sample::new(1, vec![7]));

        let ids: Vec<u64> = tree
            .root()
            .children()
            .iter()
            .map(|c| c.location_id())
            .collect();
        assert_eq!(ids, vec![3, 7, 9]);
    }

    #[test]
    fn test_deep_tree_clone_and_compare() {
        // Clone and equality must survive the same stack depths insertion
        // and iteration do.
        let stack: Vec<u64> = (1..=50_000).collect();
        let mut tree = ProfileTree::new();
        tree.insert(&Sample::new(1, stack));

        let copy = tree.clone();
        assert!(copy == tree);
        assert_eq!(copy.total(), 1);

        let mut other = tree.clone();
        other.insert(&Sample::new(1, vec![1]));
        assert!(other != tree);
    }

    #[test]
    fn test_empty_stack_only_bumps_root() {
        let mut tree = ProfileTree::new();
        tree.insert(&Sample::new(5, vec![]));
        assert_eq!(tree.total(), 5);
        assert!(tree.root().children().is_empty());
    }
}
