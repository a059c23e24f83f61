use serde::{Deserialize, Serialize};

use super::key::Key;

/// A materialized key/value pair in a basement.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LeafEntry {
    /// Entry key.
    pub key: Key,
    /// Committed value bytes.
    #[serde(default, with = "hex")]
    pub value: Vec<u8>,
}

impl LeafEntry {
    /// Creates an entry.
    pub fn new(key: impl Into<Key>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Leaf-level partition holding entries in comparator order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Basement {
    entries: Vec<LeafEntry>,
}

impl Basement {
    /// Wraps entries as stored; no ordering is imposed here.
    pub fn new(entries: Vec<LeafEntry>) -> Self {
        Self { entries }
    }

    /// Builds a basement whose values mirror the keys.
    pub fn from_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let entries = keys
            .into_iter()
            .map(|key| {
                let key = key.into();
                let value = key.as_bytes().to_vec();
                LeafEntry { key, value }
            })
            .collect();
        Self { entries }
    }

    /// Entries in stored order.
    pub fn entries(&self) -> &[LeafEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true for an empty basement.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
