//! Error types for the entire crate.
//!
//! We use `thiserror` for library-style errors with custom types;
//! callers compose them with their own application-level error handling.

use thiserror::Error;

/// Errors that can occur while resolving location IDs to source lines
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("unknown location ID: {0}")]
    UnknownLocation(u64),

    #[error("location store failure: {0}")]
    Storage(String),
}

/// Errors that can occur while appending to a profile series
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SeriesError {
    #[error("out-of-order append: timestamp {got} is not after {last}")]
    OutOfOrder { got: i64, last: i64 },

    #[error("label set does not match the series label set")]
    LabelMismatch,
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("failed to resolve location: {0}")]
    Resolve(#[from] ResolveError),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Malformed flamegraph file: {0}")]
    MalformedFile(String),
}

/// Errors that can occur during object storage access
#[derive(Error, Debug)]
pub enum BucketError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object storage failure: {0}")]
    Io(String),
}

/// Errors that can occur in the debug-info metadata state protocol
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("debug info metadata should exist")]
    ShouldExist,

    #[error("debug info metadata state should be uploading")]
    ExpectedStateUploading,

    #[error("malformed metadata record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("object storage failure: {0}")]
    Bucket(#[from] BucketError),
}
