//! Output writers for generated flamegraphs.

pub mod json;

// Re-export main functions
pub use json::{read_flamegraph, write_flamegraph};
