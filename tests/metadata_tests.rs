use flamestore::debuginfo::{Bucket, InMemoryBucket, MetadataState, MetadataStore};
use flamestore::utils::MetadataError;

#[test]
fn test_fetch_never_seen_build_is_empty() {
    let store = MetadataStore::new(InMemoryBucket::new());
    let state = store.fetch("never-seen").unwrap();
    assert_eq!(state, MetadataState::Empty);
}

#[test]
fn test_uploaded_without_record_should_exist() {
    let store = MetadataStore::new(InMemoryBucket::new());
    let err = store.mark_uploaded("build-1").unwrap_err();
    assert!(matches!(err, MetadataError::ShouldExist));
}

#[test]
fn test_uploading_twice_is_a_noop() {
    let store = MetadataStore::new(InMemoryBucket::new());

    store.mark_uploading("build-1").unwrap();
    store.mark_uploading("build-1").unwrap();

    assert_eq!(store.fetch("build-1").unwrap(), MetadataState::Uploading);
}

#[test]
fn test_upload_lifecycle() {
    let store = MetadataStore::new(InMemoryBucket::new());

    store.mark_uploading("build-1").unwrap();
    assert_eq!(store.fetch("build-1").unwrap(), MetadataState::Uploading);

    store.mark_uploaded("build-1").unwrap();
    assert_eq!(store.fetch("build-1").unwrap(), MetadataState::Uploaded);

    // A racing uploader finishing second is tolerated.
    store.mark_uploaded("build-1").unwrap();
    assert_eq!(store.fetch("build-1").unwrap(), MetadataState::Uploaded);
}

#[test]
fn test_uploaded_over_non_uploading_record_fails() {
    let bucket = InMemoryBucket::new();
    // A record that claims to be empty, written out of band.
    bucket
        .upload(
            "build-1/metadata",
            br#"{"state":"METADATA_STATE_EMPTY","started_upload_at":0,"finished_upload_at":0}"#,
        )
        .unwrap();

    let store = MetadataStore::new(bucket);
    let err = store.mark_uploaded("build-1").unwrap_err();
    assert!(matches!(err, MetadataError::ExpectedStateUploading));
}

#[test]
fn test_builds_are_independent() {
    let store = MetadataStore::new(InMemoryBucket::new());

    store.mark_uploading("build-a").unwrap();
    assert_eq!(store.fetch("build-a").unwrap(), MetadataState::Uploading);
    assert_eq!(store.fetch("build-b").unwrap(), MetadataState::Empty);
}

#[test]
fn test_malformed_record_is_an_error() {
    let bucket = InMemoryBucket::new();
    bucket.upload("build-1/metadata", b"not json").unwrap();

    let store = MetadataStore::new(bucket);
    assert!(matches!(
        store.fetch("build-1"),
        Err(MetadataError::Malformed(_))
    ));
}
