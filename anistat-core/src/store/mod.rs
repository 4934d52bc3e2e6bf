//! Entry store: the merged, immutable table of catalog entries and user progress.
//!
//! Built once per analysis from already-fetched records; every later stage
//! borrows from it and nothing mutates it.

mod merge;

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::types::{Entry, EntryId};

pub use merge::{BuildOptions, localized_title};

/// One row per catalog entry, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct EntryTable {
    entries: Vec<Entry>,
    index: HashMap<EntryId, usize>,
}

impl EntryTable {
    /// Wrap already-merged entries. Rows are re-ordered by id.
    pub(crate) fn from_entries(mut entries: Vec<Entry>) -> Self {
        entries.sort_by_key(|e| e.id);
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
        Self { entries, index }
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.index.get(&id).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries the user has any progress record for.
    pub fn tracked(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|e| e.user_watched_episodes.is_some() || e.user_score.is_some())
    }
}

impl<'a> IntoIterator for &'a EntryTable {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Serializes as a plain array of entries, for bulk export.
impl Serialize for EntryTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_and_order() {
        let table = EntryTable::from_entries(vec![
            Entry::new(30, "c"),
            Entry::new(10, "a"),
            Entry::new(20, "b"),
        ]);
        assert_eq!(table.len(), 3);
        let ids: Vec<u64> = table.ids().map(|id| id.0).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(table.get(EntryId(20)).unwrap().title, "b");
        assert!(table.get(EntryId(99)).is_none());
        assert!(table.contains(EntryId(30)));
    }

    #[test]
    fn export_as_json_array() {
        let mut entry = Entry::new(1, "Frieren");
        entry.episode_avg_duration = Some(std::time::Duration::from_secs(1440));
        let table = EntryTable::from_entries(vec![entry]);
        let json = serde_json::to_value(&table).unwrap();
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 1);
        assert_eq!(rows[0]["episode_avg_duration"], 1440);
        assert!(rows[0]["user_watched_episodes"].is_null());
    }

    #[test]
    fn tracked_filters_untouched_rows() {
        let mut watched = Entry::new(1, "a");
        watched.user_watched_episodes = Some(0);
        let table = EntryTable::from_entries(vec![watched, Entry::new(2, "b")]);
        let tracked: Vec<_> = table.tracked().map(|e| e.id).collect();
        assert_eq!(tracked, vec![EntryId(1)]);
    }
}
