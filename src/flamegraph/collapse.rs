//! Collapsed-stack rendering of a display tree.
//!
//! Collapsed stacks are the interchange format of most flamegraph
//! tooling. Format: "parent;child;grandchild weight", one line per stack
//! with a positive self weight.

use crate::flamegraph::generator::FlameNode;
use crate::utils::error::OutputError;
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Render a display tree as collapsed stack lines.
///
/// The synthetic root node is omitted from paths. Each emitted line
/// carries a node's self weight: its cumulative value minus the sum of
/// its children's. Nodes without self weight produce no line of their
/// own.
pub fn collapse_flamegraph(root: &FlameNode) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack: Vec<(&FlameNode, String)> = root
        .children
        .iter()
        .rev()
        .map(|child| (child, child.name.clone()))
        .collect();

    while let Some((node, path)) = stack.pop() {
        let child_sum: i64 = node.children.iter().map(|c| c.cum).sum();
        let self_weight = node.cum - child_sum;
        if self_weight > 0 {
            lines.push(format!("{} {}", path, self_weight));
        }
        for child in node.children.iter().rev() {
            stack.push((child, format!("{};{}", path, child.name)));
        }
    }

    debug!("Collapsed {} stack lines", lines.len());
    lines
}

/// Write collapsed stacks to a file, one line each.
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
pub fn write_collapsed(root: &FlameNode, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);
    for line in collapse_flamegraph(root) {
        writeln!(writer, "{}", line).map_err(OutputError::WriteFailed)?;
    }
    writer.flush().map_err(OutputError::WriteFailed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, cum: i64, children: Vec<FlameNode>) -> FlameNode {
        FlameNode {
            name: name.to_string(),
            full_name: name.to_string(),
            cum,
            children,
        }
    }

    #[test]
    fn test_collapse_emits_self_weights() {
        let root = node(
            "root",
            6,
            vec![node(
                "a :0",
                6,
                vec![node("b :0", 4, vec![]), node("c :0", 1, vec![])],
            )],
        );

        assert_eq!(
            collapse_flamegraph(&root),
            vec![
                "a :0 1".to_string(),
                "a :0;b :0 4".to_string(),
                "a :0;c :0 1".to_string(),
            ]
        );
    }

    #[test]
    fn test_collapse_to_file() {
        let root = node("root", 2, vec![node("a :0", 2, vec![])]);
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        write_collapsed(&root, temp_file.path()).unwrap();

        let contents = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(contents, "a :0 2\n");
    }
}
