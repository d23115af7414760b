//! Location resolution: mapping numeric location IDs to source lines.
//!
//! The profile tree stores nothing but location IDs; turning them into
//! human-readable flamegraph nodes requires a `LocationResolver`. A
//! location resolves to one or more lines, ordered innermost to
//! outermost, when calls were inlined into a single physical location.

use crate::utils::error::ResolveError;
use std::collections::HashMap;

/// One resolved source line: a function name and a line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationLine {
    pub function: String,
    pub line: i64,
}

impl LocationLine {
    pub fn new(function: impl Into<String>, line: i64) -> Self {
        Self {
            function: function.into(),
            line,
        }
    }
}

/// Capability consumed by the flamegraph builder: resolve a location ID
/// into its inlined source lines.
pub trait LocationResolver {
    /// Resolve `location_id` into its lines, ordered innermost first.
    ///
    /// # Errors
    /// * `ResolveError::UnknownLocation` - the ID is not known
    /// * `ResolveError::Storage` - the backing store failed
    fn resolve(&self, location_id: u64) -> Result<Vec<LocationLine>, ResolveError>;
}

/// In-memory location store, used by ingestion pipelines and tests.
#[derive(Debug)]
pub struct InMemoryMetaStore {
    locations: HashMap<u64, Vec<LocationLine>>,
    next_id: u64,
}

impl InMemoryMetaStore {
    pub fn new() -> Self {
        Self {
            locations: HashMap::new(),
            // ID 0 is the implicit tree root.
            next_id: 1,
        }
    }

    /// Register lines under a fresh location ID.
    pub fn add_location(&mut self, lines: Vec<LocationLine>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.locations.insert(id, lines);
        id
    }

    /// Register lines under an explicit location ID.
    pub fn set_location(&mut self, location_id: u64, lines: Vec<LocationLine>) {
        self.next_id = self.next_id.max(location_id.saturating_add(1));
        self.locations.insert(location_id, lines);
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Default for InMemoryMetaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationResolver for InMemoryMetaStore {
    fn resolve(&self, location_id: u64) -> Result<Vec<LocationLine>, ResolveError> {
        self.locations
            .get(&location_id)
            .cloned()
            .ok_or(ResolveError::UnknownLocation(location_id))
    }
}
