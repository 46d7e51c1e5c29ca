use std::collections::BTreeMap;

use time::OffsetDateTime;

/// One historical snapshot of a sample's cross section.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub value: f64,
    pub updated_at: OffsetDateTime,
    pub source: String,
    pub comment: String,
    pub uncertainty: Option<f64>,
}

impl HistoryEntry {
    /// A value of exactly 0.0 marks a record as invalidated. This is a domain rule of
    /// the database, not a tolerance check, so the comparison stays exact.
    pub fn is_invalidated(&self) -> bool {
        self.value == 0.0
    }
}

/// Per-sample histories, newest entry first. Samples without history are never stored.
#[derive(Clone, Debug, Default)]
pub struct HistorySet {
    entries: BTreeMap<String, Vec<HistoryEntry>>,
}

impl HistorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample's history. Entries are put in `updated_at` descending order; ties
    /// keep the order they were given in. Empty histories are dropped.
    pub fn insert(&mut self, key: impl Into<String>, mut history: Vec<HistoryEntry>) {
        if history.is_empty() {
            return;
        }
        history.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.entries.insert(key.into(), history);
    }

    pub fn get(&self, key: &str) -> Option<&[HistoryEntry]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Samples in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[HistoryEntry])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<HistoryEntry>)> for HistorySet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<HistoryEntry>)>>(iter: I) -> Self {
        let mut set = HistorySet::new();
        for (key, history) in iter {
            set.insert(key, history);
        }
        set
    }
}
