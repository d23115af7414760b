//! Profile trees, traversal, merging, and per-label-set time series.

pub mod iter;
pub mod merge;
pub mod series;
pub mod tree;

// Re-export main types and functions
pub use iter::TreeIterator;
pub use merge::merge_trees;
pub use series::{LabelSet, MemSeries, Profile, SeriesIterator};
pub use tree::{ProfileTree, Sample, TreeNode};
