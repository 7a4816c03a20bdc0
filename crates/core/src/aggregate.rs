use crate::record::{fold_key, Record};
use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;

/// Case-insensitive tally of named counts.
///
/// Entries keep first-insertion order, and the stored name is the casing that was
/// seen first. Lookup goes through an index keyed by the uppercased name.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    entries: Vec<Record>,
    index: HashMap<String, usize>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `record` to the tally.
    ///
    /// Sums into an existing entry with the same case-insensitive name, otherwise
    /// appends a new entry that keeps the record's casing.
    pub fn merge(&mut self, record: Record) {
        let key = record.fold_key();
        if let Some(&slot) = self.index.get(&key) {
            self.entries[slot].count = self.entries[slot].count.saturating_add(record.count);
            return;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(record);
    }

    /// Merge every entry of `other`, in its order.
    pub fn fold(&mut self, other: Aggregate) {
        if self.is_empty() {
            *self = other;
            return;
        }
        for record in other.entries {
            self.merge(record);
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Record> {
        self.index
            .get(&fold_key(name))
            .map(|&slot| &self.entries[slot])
    }

    pub fn count_of(&self, name: &str) -> Option<i64> {
        self.get(name).map(|record| record.count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum over all entries.
    pub fn total(&self) -> i64 {
        self.entries
            .iter()
            .fold(0i64, |acc, record| acc.saturating_add(record.count))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.entries
    }

    pub fn into_records(self) -> Vec<Record> {
        self.entries
    }
}

impl Extend<Record> for Aggregate {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        for record in iter {
            self.merge(record);
        }
    }
}

impl FromIterator<Record> for Aggregate {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut aggregate = Aggregate::new();
        aggregate.extend(iter);
        aggregate
    }
}

impl IntoIterator for Aggregate {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Aggregate {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Aggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}
