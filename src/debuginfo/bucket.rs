//! Minimal object-storage seam used by the metadata store.

use crate::utils::error::BucketError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Object storage capability: flat key to bytes.
pub trait Bucket {
    /// Fetch an object. `BucketError::NotFound` when the key is absent;
    /// any other error is a backing-store failure.
    fn get(&self, path: &str) -> Result<Vec<u8>, BucketError>;

    /// Create or overwrite an object.
    fn upload(&self, path: &str, data: &[u8]) -> Result<(), BucketError>;
}

/// In-memory bucket for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryBucket {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Bucket for InMemoryBucket {
    fn get(&self, path: &str) -> Result<Vec<u8>, BucketError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| BucketError::Io("bucket lock poisoned".to_string()))?;
        objects
            .get(path)
            .cloned()
            .ok_or_else(|| BucketError::NotFound(path.to_string()))
    }

    fn upload(&self, path: &str, data: &[u8]) -> Result<(), BucketError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| BucketError::Io("bucket lock poisoned".to_string()))?;
        objects.insert(path.to_string(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_is_not_found() {
        let bucket = InMemoryBucket::new();
        assert!(matches!(
            bucket.get("nope"),
            Err(BucketError::NotFound(_))
        ));
    }

    #[test]
    fn test_upload_then_get() {
        let bucket = InMemoryBucket::new();
        bucket.upload("a/b", b"data").unwrap();
        assert_eq!(bucket.get("a/b").unwrap(), b"data");
        assert_eq!(bucket.len(), 1);
    }

    #[test]
    fn test_upload_overwrites() {
        let bucket = InMemoryBucket::new();
        bucket.upload("k", b"one").unwrap();
        bucket.upload("k", b"two").unwrap();
        assert_eq!(bucket.get("k").unwrap(), b"two");
        assert_eq!(bucket.len(), 1);
    }
}
