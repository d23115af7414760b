//! Collapsing same-named sibling display nodes regardless of call site.
//!
//! The call-site-precise tree from the generator keeps one branch per
//! location ID. Callers wanting a "flat by function" view merge sibling
//! nodes whose display names are identical, recursively.

use crate::flamegraph::generator::FlameNode;
use std::collections::HashMap;

/// Partially built output node waiting for `remaining` merged child
/// groups.
struct BuildFrame {
    node: FlameNode,
    remaining: usize,
}

/// Merge sibling nodes sharing a display name, recursively, into a new
/// display tree.
///
/// A merged node takes the name and fully-qualified name of the group's
/// first-encountered sibling and the sum of the group's cumulative
/// values; the group's children are concatenated and merged by the same
/// rule. First-seen order across the original sibling sequence determines
/// the output ordering. The input tree is left intact, and applying the
/// transform to its own output yields the same tree.
pub fn aggregate_by_function_name(node: &FlameNode) -> FlameNode {
    merge_groups(
        FlameNode::new(node.name.clone(), node.full_name.clone(), node.cum),
        group_by_name(node.children.iter().collect()),
    )
}

/// Iterative group merge. Explicit work and build stacks keep deep trees
/// off the call stack, like the profile tree merge.
fn merge_groups(root: FlameNode, groups: Vec<Vec<&FlameNode>>) -> FlameNode {
    let mut work = groups;
    let mut build = vec![BuildFrame {
        node: root,
        remaining: work.len(),
    }];
    // Reversed so the work stack pops groups in first-seen order.
    work.reverse();

    while let Some(group) = work.pop() {
        let first = group[0];
        let node = FlameNode::new(
            first.name.clone(),
            first.full_name.clone(),
            group.iter().map(|n| n.cum).sum(),
        );
        let combined: Vec<&FlameNode> = group.iter().flat_map(|n| n.children.iter()).collect();
        let child_groups = group_by_name(combined);

        if child_groups.is_empty() {
            complete(&mut build, node);
        } else {
            build.push(BuildFrame {
                node,
                remaining: child_groups.len(),
            });
            for child_group in child_groups.into_iter().rev() {
                work.push(child_group);
            }
        }
    }

    match build.pop() {
        Some(frame) => frame.node,
        None => FlameNode::new("", "", 0),
    }
}

/// Attach a finished merged subtree to its parent, unwinding every parent
/// that just received its last group. The bottom frame is the output root
/// and is never popped here.
fn complete(build: &mut Vec<BuildFrame>, node: FlameNode) {
    let mut node = node;
    loop {
        let frame = match build.last_mut() {
            Some(frame) => frame,
            None => return,
        };
        frame.node.children.push(node);
        frame.remaining -= 1;
        if frame.remaining > 0 || build.len() == 1 {
            return;
        }
        match build.pop() {
            Some(done) => node = done.node,
            None => return,
        }
    }
}

/// Group siblings by name with first-seen order preserved.
fn group_by_name(nodes: Vec<&FlameNode>) -> Vec<Vec<&FlameNode>> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&FlameNode>> = HashMap::new();
    for node in nodes {
        let name = node.name.as_str();
        if !groups.contains_key(name) {
            order.push(name);
        }
        groups.entry(name).or_default().push(node);
    }
    order
        .into_iter()
        .filter_map(|name| groups.remove(name))
        .collect()
}
