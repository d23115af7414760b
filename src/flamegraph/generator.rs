//! Resolving a profile tree into a display tree of named nodes.
//!
//! The builder walks a `TreeIterator` with an explicit `TreeStack` of
//! partially built nodes and resolves every location ID through a
//! `LocationResolver`. A location carrying several inlined lines expands
//! into a straight-line chain of display nodes, outermost first, all
//! sharing the source node's cumulative value.

use crate::metastore::{LocationLine, LocationResolver};
use crate::profile::TreeIterator;
use crate::utils::config::{ROOT_LOCATION_ID, ROOT_NODE_NAME};
use crate::utils::error::FlamegraphError;
use log::debug;

/// Resolved, human-facing flamegraph node. Built fresh per query and
/// owned by the caller.
#[derive(Debug)]
pub struct FlameNode {
    /// Short display name, `"<function> :<line>"`.
    pub name: String,

    /// Fully-qualified name; empty for the synthetic root.
    pub full_name: String,

    /// Cumulative value, inclusive of all children.
    pub cum: i64,

    /// Children in the source tree's traversal order.
    pub children: Vec<FlameNode>,
}

impl FlameNode {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>, cum: i64) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            cum,
            children: Vec::new(),
        }
    }

    fn root() -> Self {
        Self::new(ROOT_NODE_NAME, "", 0)
    }
}

impl Drop for FlameNode {
    // Same depth concern as the profile tree: drop descendants
    // iteratively.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl Clone for FlameNode {
    // Derived clone glue recurses per tree level; rebuild the copy from a
    // reverse pre-order pass instead.
    fn clone(&self) -> Self {
        let mut order: Vec<&FlameNode> = Vec::new();
        let mut work: Vec<&FlameNode> = vec![self];
        while let Some(node) = work.pop() {
            order.push(node);
            work.extend(node.children.iter());
        }

        // Walking `order` backwards, a node's cloned children are always
        // the newest `children.len()` finished subtrees, in order.
        let mut built: Vec<FlameNode> = Vec::new();
        for node in order.into_iter().rev() {
            let at = built.len() - node.children.len();
            let children = built.split_off(at);
            let mut cloned = FlameNode::new(node.name.clone(), node.full_name.clone(), node.cum);
            cloned.children = children;
            built.push(cloned);
        }
        match built.pop() {
            Some(root) => root,
            None => FlameNode::new(self.name.clone(), self.full_name.clone(), self.cum),
        }
    }
}

impl PartialEq for FlameNode {
    fn eq(&self, other: &Self) -> bool {
        let mut work = vec![(self, other)];
        while let Some((a, b)) = work.pop() {
            if a.name != b.name
                || a.full_name != b.full_name
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

impl Eq for FlameNode {}

/// One in-progress entry on the build stack: the outermost node of an
/// inline-expanded chain plus the chain's length, so children can be
/// attached under the innermost node.
#[derive(Debug)]
pub struct TreeStackEntry {
    node: FlameNode,
    chain_len: usize,
}

impl TreeStackEntry {
    pub fn new(node: FlameNode, chain_len: usize) -> Self {
        Self { node, chain_len }
    }

    pub fn node(&self) -> &FlameNode {
        &self.node
    }

    pub fn into_node(self) -> FlameNode {
        self.node
    }

    /// The innermost node of this entry's inline chain. Interior chain
    /// nodes have exactly one child by construction.
    fn innermost_mut(&mut self) -> &mut FlameNode {
        let mut cur = &mut self.node;
        for _ in 1..self.chain_len {
            cur = &mut cur.children[0];
        }
        cur
    }
}

/// Explicit LIFO stack of partially built flamegraph nodes.
#[derive(Debug, Default)]
pub struct TreeStack {
    entries: Vec<TreeStackEntry>,
}

impl TreeStack {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: TreeStackEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<TreeStackEntry> {
        self.entries.pop()
    }

    pub fn peek_mut(&mut self) -> Option<&mut TreeStackEntry> {
        self.entries.last_mut()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

/// Expand a location's resolved lines into a straight-line chain of
/// display nodes.
///
/// Lines are ordered innermost first; the returned node is the outermost
/// end of the chain and every chained node carries `cum`. The second
/// return value is the chain length.
pub fn lines_to_flame_nodes(lines: &[LocationLine], cum: i64) -> (FlameNode, usize) {
    let mut outer: Option<FlameNode> = None;
    for line in lines {
        let name = format!("{} :{}", line.function, line.line);
        let mut node = FlameNode::new(name.clone(), name, cum);
        if let Some(inner) = outer.take() {
            node.children.push(inner);
        }
        outer = Some(node);
    }
    match outer {
        Some(node) => (node, lines.len()),
        // A location with no line info still has to account for its
        // value.
        None => (FlameNode::new("?? :0", "?? :0", cum), 1),
    }
}

/// Build a display tree from a profile tree traversal.
///
/// The synthetic root node is named "root" and carries the tree's total
/// value. Duplicate-looking display names stay as distinct branches here;
/// collapsing them is the job of `aggregate_by_function_name`.
///
/// # Errors
/// * `FlamegraphError::Resolve` - a location ID could not be resolved;
///   no partial tree is returned
pub fn generate_flamegraph<R: LocationResolver + ?Sized>(
    resolver: &R,
    mut it: TreeIterator<'_>,
) -> Result<FlameNode, FlamegraphError> {
    let mut stack = TreeStack::new();
    stack.push(TreeStackEntry::new(FlameNode::root(), 1));
    let mut resolved = 0usize;

    while it.has_more() {
        if it.next_child() {
            let child = match it.at() {
                Some(node) => node,
                None => break,
            };

            if child.location_id() == ROOT_LOCATION_ID {
                // The implicit root carries the total of all samples.
                if let Some(entry) = stack.peek_mut() {
                    entry.node.cum = child.cum();
                }
                it.step_into();
                continue;
            }

            let lines = resolver.resolve(child.location_id())?;
            let (node, chain_len) = lines_to_flame_nodes(&lines, child.cum());
            stack.push(TreeStackEntry::new(node, chain_len));
            resolved += 1;
            it.step_into();
            continue;
        }

        it.step_up();
        if stack.size() > 1 {
            if let Some(finished) = stack.pop() {
                if let Some(parent) = stack.peek_mut() {
                    parent.innermost_mut().children.push(finished.node);
                }
            }
        }
    }

    debug!("Resolved {} profile tree nodes", resolved);
    match stack.pop() {
        Some(entry) => Ok(entry.into_node()),
        None => Ok(FlameNode::root()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_chain() {
        let (node, len) = lines_to_flame_nodes(&[LocationLine::new("main", 12)], 4);
        assert_eq!(len, 1);
        assert_eq!(node.name, "main :12");
        assert_eq!(node.full_name, "main :12");
        assert_eq!(node.cum, 4);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_empty_lines_fall_back_to_placeholder() {
        let (node, len) = lines_to_flame_nodes(&[], 3);
        assert_eq!(len, 1);
        assert_eq!(node.name, "?? :0");
        assert_eq!(node.cum, 3);
    }

    #[test]
    fn test_deep_chain_clone_and_compare() {
        let mut node = FlameNode::new("leaf :0", "leaf :0", 1);
        for depth in 0..50_000 {
            let name = format!("f{} :0", depth);
            let mut outer = FlameNode::new(name.clone(), name, 1);
            outer.children.push(node);
            node = outer;
        }

        let copy = node.clone();
        assert!(copy == node);

        let mut other = node.clone();
        other.children.push(FlameNode::new("extra :0", "extra :0", 1));
        assert!(other != node);
    }
}
