//! Append-only, time-ordered profile series for one label set.
//!
//! A `MemSeries` holds the profiles of a single label set in append
//! order. Timestamps must strictly increase across appends; an
//! out-of-order append fails without mutating the series. `Append` is not
//! internally synchronized; multiple producers must be serialized by the
//! caller.

use crate::profile::merge::merge_trees;
use crate::profile::tree::ProfileTree;
use crate::utils::error::SeriesError;
use log::debug;
use std::collections::BTreeMap;

/// A sorted name → value label mapping identifying one series.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSet {
    labels: BTreeMap<String, String>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a label set from name/value pairs; later duplicates win.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let labels = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self { labels }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// One sampling instant: a profile tree plus its label set and logical
/// timestamp. Once wrapped into a profile and published, the tree should
/// be treated as immutable.
#[derive(Debug, Clone)]
pub struct Profile {
    labels: LabelSet,
    timestamp: i64,
    tree: ProfileTree,
}

impl Profile {
    pub fn new(labels: LabelSet, timestamp: i64, tree: ProfileTree) -> Self {
        Self {
            labels,
            timestamp,
            tree,
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn tree(&self) -> &ProfileTree {
        &self.tree
    }

    /// Merge two same-label-set profiles into one. The merged profile
    /// carries the later timestamp and behaves like any other profile to
    /// downstream consumers.
    pub fn merge_with(&self, other: &Profile) -> Result<Profile, SeriesError> {
        if self.labels != other.labels {
            return Err(SeriesError::LabelMismatch);
        }
        Ok(Profile {
            labels: self.labels.clone(),
            timestamp: self.timestamp.max(other.timestamp),
            tree: merge_trees(&[&self.tree, &other.tree]),
        })
    }
}

/// Append-only in-memory series of profiles sharing one label set.
#[derive(Debug, Clone, Default)]
pub struct MemSeries {
    labels: LabelSet,
    profiles: Vec<Profile>,
}

impl MemSeries {
    pub fn new(labels: LabelSet) -> Self {
        Self {
            labels,
            profiles: Vec::new(),
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Timestamp of the most recently appended profile.
    pub fn last_timestamp(&self) -> Option<i64> {
        self.profiles.last().map(|p| p.timestamp)
    }

    /// Append a profile.
    ///
    /// Rejected before any mutation if the profile's label set differs
    /// from the series' or its timestamp is not strictly greater than the
    /// last appended profile's.
    pub fn append(&mut self, profile: Profile) -> Result<(), SeriesError> {
        if profile.labels != self.labels {
            return Err(SeriesError::LabelMismatch);
        }
        if let Some(last) = self.last_timestamp() {
            if profile.timestamp <= last {
                return Err(SeriesError::OutOfOrder {
                    got: profile.timestamp,
                    last,
                });
            }
        }

        debug!(
            "Appending profile at timestamp {} (series length {})",
            profile.timestamp,
            self.profiles.len() + 1
        );
        self.profiles.push(profile);
        Ok(())
    }

    /// Fresh forward-only iterator over the whole series, in append
    /// order. Each call starts from the beginning.
    pub fn iterator(&self) -> SeriesIterator<'_> {
        SeriesIterator {
            profiles: &self.profiles,
            pos: None,
        }
    }

    /// Iterator over the profiles with `min <= timestamp <= max`.
    pub fn range(&self, min: i64, max: i64) -> SeriesIterator<'_> {
        let start = self.profiles.partition_point(|p| p.timestamp < min);
        let end = self.profiles.partition_point(|p| p.timestamp <= max);
        SeriesIterator {
            profiles: &self.profiles[start..end.max(start)],
            pos: None,
        }
    }
}

/// Forward-only cursor over a series. `at` yields the current profile
/// only after a successful `next`; the iterator is not restartable.
pub struct SeriesIterator<'a> {
    profiles: &'a [Profile],
    pos: Option<usize>,
}

impl<'a> SeriesIterator<'a> {
    /// Advance and report whether a further profile exists.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        let next = self.pos.map_or(0, |p| p + 1).min(self.profiles.len());
        self.pos = Some(next);
        next < self.profiles.len()
    }

    /// The profile selected by the last successful `next`.
    pub fn at(&self) -> Option<&'a Profile> {
        self.profiles.get(self.pos?)
    }
}
