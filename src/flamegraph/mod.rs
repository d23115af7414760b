//! Flamegraph building and aggregation over profile trees.
//!
//! This module transforms profile trees into:
//! - Display trees of named nodes (for flamegraph rendering)
//! - Function-name-aggregated views (call-site-insensitive)
//! - Collapsed stack lines (for external flamegraph tooling)

pub mod aggregate;
pub mod collapse;
pub mod generator;

// Re-export main types and functions
pub use aggregate::aggregate_by_function_name;
pub use collapse::{collapse_flamegraph, write_collapsed};
pub use generator::{generate_flamegraph, FlameNode, TreeStack, TreeStackEntry};
