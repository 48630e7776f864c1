use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tag key that marks a resource as schedule-managed.
pub const SCHEDULE_TAG_KEY: &str = "Schedule";

/// Tag key the autoscaling coordinator uses to record which processes it
/// suspended, so a later start run can restore the group's prior posture
/// without any state of its own.
pub const SUSPENSION_MARKER_TAG_KEY: &str = "lightsout:suspended";

/// Read-only set of tags attached to a resource at discovery time.
///
/// Keys are unique; the map is ordered so serialized output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    /// Empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a tag value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the tag key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Value of the schedule tag, if present.
    pub fn schedule_value(&self) -> Option<&str> {
        self.get(SCHEDULE_TAG_KEY)
    }

    /// Insert a tag, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
