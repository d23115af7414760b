//! Debug-info upload metadata bookkeeping.
//!
//! Sibling of the profile core: tracks, per build ID, whether debug info
//! has been uploaded to object storage.

pub mod bucket;
pub mod metadata;

// Re-export main types
pub use bucket::{Bucket, InMemoryBucket};
pub use metadata::{MetadataState, MetadataStore};
