//! Flamestore library
//!
//! In-memory representation and aggregation engine for a continuous
//! profiling backend: raw stack-trace samples become mergeable,
//! queryable call trees which render as flamegraphs.

pub mod debuginfo;
pub mod flamegraph;
pub mod metastore;
pub mod output;
pub mod profile;
pub mod utils;
