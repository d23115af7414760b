//! Constants shared across the crate.

/// Location ID reserved for the implicit root of every profile tree.
/// Resolvers never see it; the flamegraph builder special-cases it.
pub const ROOT_LOCATION_ID: u64 = 0;

/// Display name of the implicit root node in generated flamegraphs.
pub const ROOT_NODE_NAME: &str = "root";

/// Object name of the per-build metadata record, stored under
/// `<build_id>/metadata` in the bucket.
pub const METADATA_OBJECT_NAME: &str = "metadata";
