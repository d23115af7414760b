//! Upload state tracking for debug info, persisted as small JSON records.
//!
//! One record per build ID at `<build_id>/metadata`. The protocol is best
//! effort and expects a single logical uploader: duplicate `UPLOADING`
//! and duplicate `UPLOADED` requests are benign races and treated as
//! no-ops rather than locked against.

use crate::debuginfo::bucket::Bucket;
use crate::utils::config::METADATA_OBJECT_NAME;
use crate::utils::error::{BucketError, MetadataError};
use chrono::Utc;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upload state of one build's debug info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataState {
    /// There is no metadata record. An older uploader may have pushed
    /// the debug info files without recording metadata.
    #[serde(rename = "METADATA_STATE_EMPTY")]
    Empty,

    /// The debug info file is being uploaded.
    #[serde(rename = "METADATA_STATE_UPLOADING")]
    Uploading,

    /// The debug info file is fully uploaded.
    #[serde(rename = "METADATA_STATE_UPLOADED")]
    Uploaded,
}

impl fmt::Display for MetadataState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetadataState::Empty => "METADATA_STATE_EMPTY",
            MetadataState::Uploading => "METADATA_STATE_UPLOADING",
            MetadataState::Uploaded => "METADATA_STATE_UPLOADED",
        };
        f.write_str(s)
    }
}

/// Stored metadata record, serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetadataRecord {
    state: MetadataState,
    #[serde(default)]
    started_upload_at: i64,
    #[serde(default)]
    finished_upload_at: i64,
}

/// Tracks per-build upload state in an object store.
#[derive(Debug)]
pub struct MetadataStore<B> {
    bucket: B,
}

impl<B: Bucket> MetadataStore<B> {
    pub fn new(bucket: B) -> Self {
        Self { bucket }
    }

    /// Record that an upload for `build_id` has started.
    ///
    /// A record that already exists is left untouched: two uploaders
    /// starting concurrently is an expected race, not an error.
    pub fn mark_uploading(&self, build_id: &str) -> Result<(), MetadataError> {
        debug!("Attempting state update to uploading for {}", build_id);

        match self.bucket.get(&metadata_object_path(build_id)) {
            Ok(_) => {
                info!("Metadata record already exists for {}", build_id);
                return Ok(());
            }
            Err(BucketError::NotFound(_)) => {}
            Err(err) => {
                error!("Unexpected object storage error: {}", err);
                return Err(err.into());
            }
        }

        let record = MetadataRecord {
            state: MetadataState::Uploading,
            started_upload_at: Utc::now().timestamp(),
            finished_upload_at: 0,
        };
        self.write_record(build_id, &record)
    }

    /// Record that the upload for `build_id` has finished.
    ///
    /// A record already in the uploaded state is a no-op: a racing
    /// uploader may have finished first.
    ///
    /// # Errors
    /// * `MetadataError::ShouldExist` - no record was ever created
    /// * `MetadataError::ExpectedStateUploading` - the record is in a
    ///   state other than uploading
    pub fn mark_uploaded(&self, build_id: &str) -> Result<(), MetadataError> {
        debug!("Attempting state update to uploaded for {}", build_id);

        let raw = match self.bucket.get(&metadata_object_path(build_id)) {
            Ok(raw) => raw,
            Err(BucketError::NotFound(_)) => {
                error!("Expected metadata record for {}", build_id);
                return Err(MetadataError::ShouldExist);
            }
            Err(err) => return Err(err.into()),
        };

        let mut record: MetadataRecord = serde_json::from_slice(&raw)?;

        if record.state == MetadataState::Uploaded {
            return Ok(());
        }
        if record.state != MetadataState::Uploading {
            return Err(MetadataError::ExpectedStateUploading);
        }

        record.state = MetadataState::Uploaded;
        record.finished_upload_at = Utc::now().timestamp();
        self.write_record(build_id, &record)
    }

    /// Current upload state for `build_id`. An absent record yields
    /// `Empty` with no error; other storage failures are propagated.
    pub fn fetch(&self, build_id: &str) -> Result<MetadataState, MetadataError> {
        let raw = match self.bucket.get(&metadata_object_path(build_id)) {
            Ok(raw) => raw,
            Err(BucketError::NotFound(_)) => return Ok(MetadataState::Empty),
            Err(err) => return Err(err.into()),
        };

        let record: MetadataRecord = serde_json::from_slice(&raw)?;
        Ok(record.state)
    }

    fn write_record(&self, build_id: &str, record: &MetadataRecord) -> Result<(), MetadataError> {
        let data = serde_json::to_vec_pretty(record)?;
        self.bucket.upload(&metadata_object_path(build_id), &data)?;
        Ok(())
    }
}

fn metadata_object_path(build_id: &str) -> String {
    format!("{}/{}", build_id, METADATA_OBJECT_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_as_protocol_strings() {
        let json = serde_json::to_string(&MetadataState::Uploading).unwrap();
        assert_eq!(json, "\"METADATA_STATE_UPLOADING\"");

        let state: MetadataState =
            serde_json::from_str("\"METADATA_STATE_UPLOADED\"").unwrap();
        assert_eq!(state, MetadataState::Uploaded);
    }

    #[test]
    fn test_record_round_trip() {
        let record = MetadataRecord {
            state: MetadataState::Uploading,
            started_upload_at: 1700000000,
            finished_upload_at: 0,
        };
        let data = serde_json::to_vec_pretty(&record).unwrap();
        let back: MetadataRecord = serde_json::from_slice(&data).unwrap();
        assert_eq!(back.state, MetadataState::Uploading);
        assert_eq!(back.started_upload_at, 1700000000);
    }

    #[test]
    fn test_metadata_object_path() {
        assert_eq!(metadata_object_path("abc123"), "abc123/metadata");
    }
}
