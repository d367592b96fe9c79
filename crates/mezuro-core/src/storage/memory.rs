//! # In-memory Record Storage
//!
//! `BTreeMap` tables holding postcard-encoded records.

use super::{Record, RecordStore, decode, encode, not_found};
use crate::MezuroError;
use std::collections::BTreeMap;

/// Volatile store. Every table is a `BTreeMap<u64, bytes>`, so listing is
/// always in key order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: BTreeMap<&'static str, BTreeMap<u64, Vec<u8>>>,
    sequences: BTreeMap<&'static str, u64>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn table<R: Record>(&self) -> Option<&BTreeMap<u64, Vec<u8>>> {
        self.tables.get(R::TABLE)
    }

    fn table_mut<R: Record>(&mut self) -> &mut BTreeMap<u64, Vec<u8>> {
        self.tables.entry(R::TABLE).or_default()
    }
}

impl RecordStore for MemoryStore {
    fn prepare<R: Record>(&mut self) -> Result<(), MezuroError> {
        self.table_mut::<R>();
        Ok(())
    }

    fn insert<R: Record>(&mut self, mut record: R) -> Result<R, MezuroError> {
        let next = self.sequences.get(R::TABLE).copied().unwrap_or(1);
        record.set_key(next);
        let bytes = encode(&record)?;
        self.table_mut::<R>().insert(next, bytes);
        self.sequences.insert(R::TABLE, next.saturating_add(1));
        Ok(record)
    }

    fn get<R: Record>(&self, key: u64) -> Result<Option<R>, MezuroError> {
        self.table::<R>()
            .and_then(|t| t.get(&key))
            .map(|bytes| decode(bytes))
            .transpose()
    }

    fn update<R: Record>(&mut self, record: &R) -> Result<(), MezuroError> {
        let key = record.key();
        let bytes = encode(record)?;
        match self.table_mut::<R>().get_mut(&key) {
            Some(slot) => {
                *slot = bytes;
                Ok(())
            }
            None => Err(not_found::<R>(key)),
        }
    }

    fn remove<R: Record>(&mut self, key: u64) -> Result<bool, MezuroError> {
        Ok(self.table_mut::<R>().remove(&key).is_some())
    }

    fn remove_with_children<P: Record, C: Record>(
        &mut self,
        key: u64,
        children: &[u64],
    ) -> Result<bool, MezuroError> {
        let existed = self.table_mut::<P>().remove(&key).is_some();
        let table = self.table_mut::<C>();
        for child in children {
            table.remove(child);
        }
        Ok(existed)
    }

    fn list<R: Record>(&self) -> Result<Vec<R>, MezuroError> {
        self.table::<R>()
            .map(|t| t.values().map(|bytes| decode(bytes)).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn count<R: Record>(&self) -> Result<usize, MezuroError> {
        Ok(self.table::<R>().map_or(0, BTreeMap::len))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Reading, ReadingGroup, ReadingGroupId, ReadingId, UserId};

    fn group(name: &str) -> ReadingGroup {
        ReadingGroup {
            id: ReadingGroupId(0),
            name: name.to_string(),
            description: String::new(),
            owner: UserId(1),
        }
    }

    #[test]
    fn keys_start_at_one_and_increase() {
        let mut store = MemoryStore::new();
        let a = store.insert(group("a")).expect("insert");
        let b = store.insert(group("b")).expect("insert");
        assert_eq!(a.id, ReadingGroupId(1));
        assert_eq!(b.id, ReadingGroupId(2));
    }

    #[test]
    fn keys_are_not_reused_after_remove() {
        let mut store = MemoryStore::new();
        let a = store.insert(group("a")).expect("insert");
        assert!(store.remove::<ReadingGroup>(a.id.0).expect("remove"));
        let b = store.insert(group("b")).expect("insert");
        assert_eq!(b.id, ReadingGroupId(2));
    }

    #[test]
    fn update_unknown_key_is_not_found() {
        let mut store = MemoryStore::new();
        let mut g = group("ghost");
        g.id = ReadingGroupId(42);
        let result = store.update(&g);
        assert!(matches!(
            result,
            Err(MezuroError::NotFound {
                kind: "ReadingGroup",
                id: 42
            })
        ));
    }

    #[test]
    fn list_on_unprepared_table_is_empty() {
        let store = MemoryStore::new();
        let groups: Vec<ReadingGroup> = store.list().expect("list");
        assert!(groups.is_empty());
        assert_eq!(store.count::<ReadingGroup>().expect("count"), 0);
    }

    #[test]
    fn remove_with_children_clears_both_tables() {
        let mut store = MemoryStore::new();
        let parent = store.insert(group("parent")).expect("insert");
        let child = store
            .insert(Reading {
                id: ReadingId(0),
                reading_group_id: parent.id,
                label: "Good".to_string(),
                grade: 10.0,
                color: "33dd33".to_string(),
            })
            .expect("insert");

        let existed = store
            .remove_with_children::<ReadingGroup, Reading>(parent.id.0, &[child.id.0])
            .expect("remove");
        assert!(existed);
        assert_eq!(store.count::<ReadingGroup>().expect("count"), 0);
        assert_eq!(store.count::<Reading>().expect("count"), 0);
    }
}
