//! JSON flamegraph output writer.
//!
//! Writes display trees to JSON files with proper formatting. Trees are
//! stored as a flat, pre-ordered list of parent-indexed records rather
//! than nested objects: serde's derived glue recurses per nesting level
//! and `serde_json` caps reader nesting at 128, neither of which survives
//! real profile depths.

use crate::flamegraph::generator::FlameNode;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// One on-disk flamegraph node. `parent` is the index of the parent
/// record; the first record is the root and carries no parent. Records
/// are pre-ordered, so every parent index precedes its children.
#[derive(Debug, Serialize, Deserialize)]
struct FlatNode {
    name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    full_name: String,

    cum: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<usize>,
}

/// Write a flamegraph to a JSON file.
///
/// # Arguments
/// * `root` - Display tree to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_flamegraph(root: &FlameNode, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing flamegraph to: {}", output_path.display());

    validate_output_path(output_path)?;

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &flatten(root)).map_err(OutputError::SerializationFailed)?;

    Ok(())
}

/// Read a flamegraph back from a JSON file.
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error
/// * `OutputError::SerializationFailed` - JSON parse error
/// * `OutputError::MalformedFile` - record list is empty or a parent
///   index does not precede its child
pub fn read_flamegraph(input_path: impl AsRef<Path>) -> Result<FlameNode, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading flamegraph from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let flat: Vec<FlatNode> =
        serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    unflatten(flat)
}

/// Pre-order flatten, parent indices pointing backwards.
fn flatten(root: &FlameNode) -> Vec<FlatNode> {
    let mut flat: Vec<FlatNode> = Vec::new();
    let mut work: Vec<(&FlameNode, Option<usize>)> = vec![(root, None)];
    while let Some((node, parent)) = work.pop() {
        let idx = flat.len();
        flat.push(FlatNode {
            name: node.name.clone(),
            full_name: node.full_name.clone(),
            cum: node.cum,
            parent,
        });
        // Reversed so siblings are emitted in their tree order.
        for child in node.children.iter().rev() {
            work.push((child, Some(idx)));
        }
    }
    flat
}

/// Rebuild the tree bottom-up. Children carry higher indices than their
/// parent, so a reverse index walk sees every subtree finished before the
/// node that owns it.
fn unflatten(flat: Vec<FlatNode>) -> Result<FlameNode, OutputError> {
    if flat.is_empty() {
        return Err(OutputError::MalformedFile("no records".to_string()));
    }

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    for (idx, record) in flat.iter().enumerate() {
        match record.parent {
            None if idx == 0 => {}
            Some(parent) if parent < idx => children_of[parent].push(idx),
            _ => {
                return Err(OutputError::MalformedFile(format!(
                    "record {} has an invalid parent",
                    idx
                )))
            }
        }
    }

    let mut built: Vec<Option<FlameNode>> = flat
        .into_iter()
        .map(|record| {
            Some(FlameNode {
                name: record.name,
                full_name: record.full_name,
                cum: record.cum,
                children: Vec::new(),
            })
        })
        .collect();

    for idx in (0..built.len()).rev() {
        let mut children = Vec::with_capacity(children_of[idx].len());
        for &child_idx in &children_of[idx] {
            if let Some(child) = built[child_idx].take() {
                children.push(child);
            }
        }
        if let Some(node) = built[idx].as_mut() {
            node.children = children;
        }
    }

    built
        .first_mut()
        .and_then(|root| root.take())
        .ok_or_else(|| OutputError::MalformedFile("no root record".to_string()))
}

/// Validate that the output path is writable
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
