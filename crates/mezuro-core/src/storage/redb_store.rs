//! # redb-backed Record Storage
//!
//! A disk-backed record store using the redb embedded database:
//! - ACID transactions (one write transaction per mutation, cascades included)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Each record type gets its own `u64 -> bytes` table. Key sequences live in
//! a shared `metadata` table under `next_id:<table>`.

use super::{Record, RecordStore, decode, encode, not_found};
use crate::MezuroError;
use crate::primitives::SEQUENCE_PREFIX;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::fmt;
use std::path::Path;

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

fn table_of<R: Record>() -> TableDefinition<'static, u64, &'static [u8]> {
    TableDefinition::new(R::TABLE)
}

fn storage_error(e: impl fmt::Display) -> MezuroError {
    MezuroError::Storage(e.to_string())
}

/// A disk-backed record store using redb.
pub struct RedbStore {
    db: Database,
}

impl fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MezuroError> {
        let db = Database::create(path.as_ref()).map_err(storage_error)?;

        let write_txn = db.begin_write().map_err(storage_error)?;
        let _ = write_txn.open_table(METADATA).map_err(storage_error)?;
        write_txn.commit().map_err(storage_error)?;

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<bool, MezuroError> {
        self.db.compact().map_err(storage_error)
    }
}

impl RecordStore for RedbStore {
    fn prepare<R: Record>(&mut self) -> Result<(), MezuroError> {
        let write_txn = self.db.begin_write().map_err(storage_error)?;
        let _ = write_txn
            .open_table(table_of::<R>())
            .map_err(storage_error)?;
        write_txn.commit().map_err(storage_error)
    }

    fn insert<R: Record>(&mut self, mut record: R) -> Result<R, MezuroError> {
        let sequence_key = format!("{}{}", SEQUENCE_PREFIX, R::TABLE);
        let write_txn = self.db.begin_write().map_err(storage_error)?;
        {
            let mut table = write_txn
                .open_table(table_of::<R>())
                .map_err(storage_error)?;
            let mut meta = write_txn.open_table(METADATA).map_err(storage_error)?;

            let next = meta
                .get(sequence_key.as_str())
                .map_err(storage_error)?
                .map(|v| v.value())
                .unwrap_or(1);

            record.set_key(next);
            let bytes = encode(&record)?;
            table
                .insert(next, bytes.as_slice())
                .map_err(storage_error)?;
            meta.insert(sequence_key.as_str(), next.saturating_add(1))
                .map_err(storage_error)?;
        }
        write_txn.commit().map_err(storage_error)?;
        Ok(record)
    }

    fn get<R: Record>(&self, key: u64) -> Result<Option<R>, MezuroError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let table = read_txn
            .open_table(table_of::<R>())
            .map_err(storage_error)?;
        let Some(guard) = table.get(key).map_err(storage_error)? else {
            return Ok(None);
        };
        decode(guard.value()).map(Some)
    }

    fn update<R: Record>(&mut self, record: &R) -> Result<(), MezuroError> {
        let key = record.key();
        let bytes = encode(record)?;
        let write_txn = self.db.begin_write().map_err(storage_error)?;
        {
            let mut table = write_txn
                .open_table(table_of::<R>())
                .map_err(storage_error)?;
            let exists = table.get(key).map_err(storage_error)?.is_some();
            if !exists {
                return Err(not_found::<R>(key));
            }
            table
                .insert(key, bytes.as_slice())
                .map_err(storage_error)?;
        }
        write_txn.commit().map_err(storage_error)
    }

    fn remove<R: Record>(&mut self, key: u64) -> Result<bool, MezuroError> {
        let write_txn = self.db.begin_write().map_err(storage_error)?;
        let existed;
        {
            let mut table = write_txn
                .open_table(table_of::<R>())
                .map_err(storage_error)?;
            existed = table.remove(key).map_err(storage_error)?.is_some();
        }
        write_txn.commit().map_err(storage_error)?;
        Ok(existed)
    }

    fn remove_with_children<P: Record, C: Record>(
        &mut self,
        key: u64,
        children: &[u64],
    ) -> Result<bool, MezuroError> {
        let write_txn = self.db.begin_write().map_err(storage_error)?;
        let existed;
        {
            let mut parents = write_txn
                .open_table(table_of::<P>())
                .map_err(storage_error)?;
            existed = parents.remove(key).map_err(storage_error)?.is_some();

            let mut table = write_txn
                .open_table(table_of::<C>())
                .map_err(storage_error)?;
            for &child in children {
                table.remove(child).map_err(storage_error)?;
            }
        }
        write_txn.commit().map_err(storage_error)?;
        Ok(existed)
    }

    fn list<R: Record>(&self) -> Result<Vec<R>, MezuroError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let table = read_txn
            .open_table(table_of::<R>())
            .map_err(storage_error)?;
        let mut records = Vec::new();
        for entry in table.iter().map_err(storage_error)? {
            let (_, value) = entry.map_err(storage_error)?;
            records.push(decode(value.value())?);
        }
        Ok(records)
    }

    fn count<R: Record>(&self) -> Result<usize, MezuroError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let table = read_txn
            .open_table(table_of::<R>())
            .map_err(storage_error)?;
        Ok(table.len().map_err(storage_error)? as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================
