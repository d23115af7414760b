//! Combining several profile trees into one aggregate tree.
//!
//! The merge operates purely on the already-built trees: it walks every
//! input level by level in lock-step over the sorted location IDs, sums
//! cumulative values where an ID appears in more than one input, and
//! copies one-sided subtrees unchanged. Inputs are never mutated.

use crate::profile::tree::{ProfileTree, TreeNode};
use crate::utils::config::ROOT_LOCATION_ID;
use log::debug;
use std::collections::BTreeMap;

/// Pending merge position: the output node's location ID plus the input
/// nodes sharing that position.
struct MergeItem<'a> {
    location_id: u64,
    sources: Vec<&'a TreeNode>,
}

/// Partially built output node waiting for `remaining` child subtrees.
struct BuildFrame {
    node: TreeNode,
    remaining: usize,
}

/// Merge profile trees into a new aggregate tree.
///
/// Equivalent to inserting every sample that produced each input into a
/// single empty tree, without access to the original samples. The
/// operation is associative and commutative; merging a tree with itself
/// doubles every cumulative value while preserving structure.
pub fn merge_trees(trees: &[&ProfileTree]) -> ProfileTree {
    debug!("Merging {} profile trees", trees.len());

    let roots: Vec<&TreeNode> = trees.iter().map(|t| t.root()).collect();
    ProfileTree::from_root(merge_nodes(ROOT_LOCATION_ID, roots))
}

/// Iterative lock-step merge. Explicit work and build stacks keep deep
/// inputs off the call stack.
fn merge_nodes(location_id: u64, sources: Vec<&TreeNode>) -> TreeNode {
    let mut work = vec![MergeItem {
        location_id,
        sources,
    }];
    let mut build: Vec<BuildFrame> = Vec::new();
    let mut finished = None;

    while let Some(item) = work.pop() {
        let cum = item.sources.iter().map(|n| n.cum()).sum();
        let groups = group_children(&item.sources);
        let node = TreeNode::with(item.location_id, cum, Vec::with_capacity(groups.len()));

        if groups.is_empty() {
            finished = complete(&mut build, node);
        } else {
            build.push(BuildFrame {
                node,
                remaining: groups.len(),
            });
            // Reversed so the work stack pops children in ascending
            // location ID order.
            for (child_id, group) in groups.into_iter().rev() {
                work.push(MergeItem {
                    location_id: child_id,
                    sources: group,
                });
            }
        }
    }

    finished.unwrap_or_else(|| TreeNode::new(location_id))
}

/// Attach a finished subtree to its parent, unwinding every parent that
/// just received its last child. Returns the final tree once the build
/// stack empties.
fn complete(build: &mut Vec<BuildFrame>, node: TreeNode) -> Option<TreeNode> {
    let mut node = node;
    loop {
        match build.last_mut() {
            Some(frame) => {
                frame.node.push_child(node);
                frame.remaining -= 1;
                if frame.remaining > 0 {
                    return None;
                }
                match build.pop() {
                    Some(done) => node = done.node,
                    None => return None,
                }
            }
            None => return Some(node),
        }
    }
}

/// Group the children of all source nodes by location ID, ordered by ID.
fn group_children<'a>(sources: &[&'a TreeNode]) -> BTreeMap<u64, Vec<&'a TreeNode>> {
    let mut groups: BTreeMap<u64, Vec<&'a TreeNode>> = BTreeMap::new();
    for source in sources {
        for child in source.children() {
            groups.entry(child.location_id()).or_default().push(child);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tree::Sample;

    fn tree_of(samples: &[Sample]) -> ProfileTree {
        let mut tree = ProfileTree::new();
        for s in samples {
            tree.insert(s);
        }
        tree
    }

    #[test]
    fn test_merge_equals_union_insert() {
        let a = tree_of(&[Sample::new(2, vec![2, 1]), Sample::new(1, vec![5, 3, 2, 1])]);
        let b = tree_of(&[Sample::new(3, vec![4, 3, 2, 1])]);

        let direct = tree_of(&[
            Sample::new(2, vec![2, 1]),
            Sample::new(1, vec![5, 3, 2, 1]),
            Sample::new(3, vec![4, 3, 2, 1]),
        ]);

        assert_eq!(merge_trees(&[&a, &b]), direct);
    }

    #[test]
    fn test_merge_commutative() {
        let a = tree_of(&[Sample::new(2, vec![2, 1]), Sample::new(7, vec![6, 1])]);
        let b = tree_of(&[Sample::new(3, vec![4, 3, 2, 1]), Sample::new(1, vec![9])]);

        assert_eq!(merge_trees(&[&a, &b]), merge_trees(&[&b, &a]));
    }

    #[test]
    fn test_merge_associative() {
        let a = tree_of(&[Sample::new(2, vec![2, 1])]);
        let b = tree_of(&[Sample::new(3, vec![4, 3, 2, 1])]);
        let c = tree_of(&[Sample::new(5, vec![2, 1]), Sample::new(1, vec![8, 7])]);

        let left = merge_trees(&[&merge_trees(&[&a, &b]), &c]);
        let right = merge_trees(&[&a, &merge_trees(&[&b, &c])]);
        assert_eq!(left, right);
        assert_eq!(left, merge_trees(&[&a, &b, &c]));
    }

    #[test]
    fn test_self_merge_doubles_values() {
        let a = tree_of(&[Sample::new(2, vec![2, 1]), Sample::new(1, vec![5, 3, 2, 1])]);
        let doubled = tree_of(&[Sample::new(4, vec![2, 1]), Sample::new(2, vec![5, 3, 2, 1])]);

        assert_eq!(merge_trees(&[&a, &a]), doubled);
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let a = tree_of(&[Sample::new(2, vec![2, 1])]);
        let b = tree_of(&[Sample::new(3, vec![3, 1])]);
        let a_before = a.clone();
        let b_before = b.clone();

        let _ = merge_trees(&[&a, &b]);
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn test_merge_no_inputs_is_empty() {
        let merged = merge_trees(&[]);
        assert_eq!(merged.total(), 0);
        assert!(merged.root().children().is_empty());
    }
}
