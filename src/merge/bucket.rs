use crate::log::{ExtraInfo, RawRecord};

use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Canonical record for one entity after folding all of its raw records.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub entity: String,
    pub other_info: Option<ExtraInfo>,
    pub related_entities: Option<Value>,
    /// Top-level fields of the first record, kept as logged.
    pub rest: ExtraInfo,
}

impl From<RawRecord> for MergedRecord {
    fn from(raw: RawRecord) -> Self {
        Self {
            entity: raw.entity,
            other_info: raw.other_info,
            related_entities: raw.related_entities,
            rest: raw.rest,
        }
    }
}

impl MergedRecord {
    /// Shallow last-write-wins merge of a later record's extra info.
    ///
    /// Nested values are replaced wholesale. If the canonical record had no
    /// extra info yet, the incoming object becomes it.
    pub fn absorb(&mut self, incoming: Option<ExtraInfo>) {
        let Some(incoming) = incoming else {
            return;
        };
        match self.other_info.as_mut() {
            Some(existing) => existing.extend(incoming),
            None => self.other_info = Some(incoming),
        }
    }
}

/// Identifier -> canonical record for one entity kind.
#[derive(Debug, Clone)]
pub struct Bucket<K> {
    records: BTreeMap<K, MergedRecord>,
}

impl<K> Default for Bucket<K> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<K: Ord> Bucket<K> {
    /// The first record for `key` becomes the scaffold; later ones only
    /// contribute their extra info.
    pub fn merge(&mut self, key: K, raw: RawRecord) {
        match self.records.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(raw.into());
            }
            Entry::Occupied(mut slot) => slot.get_mut().absorb(raw.other_info),
        }
    }

    pub fn get(&self, key: &K) -> Option<&MergedRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut MergedRecord> {
        self.records.values_mut()
    }
}

impl<K> IntoIterator for Bucket<K> {
    type Item = (K, MergedRecord);
    type IntoIter = std::collections::btree_map::IntoIter<K, MergedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
