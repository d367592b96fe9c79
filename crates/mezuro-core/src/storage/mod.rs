//! # Record Storage
//!
//! The `RecordStore` trait and its two implementations:
//! - `MemoryStore`: `BTreeMap` tables (fast, volatile)
//! - `RedbStore`: redb tables on disk (ACID, persistent)
//!
//! Records are encoded with postcard in both stores, so a record that
//! round-trips through one store round-trips through the other.
//!
//! Keys start at 1 and are never reused within a table.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::{
    KalibroConfiguration, KalibroConfigurationId, MetricConfiguration, MetricConfigurationId,
    MezuroError, MezuroRange, MezuroRangeId, Reading, ReadingGroup, ReadingGroupId, ReadingId,
    User, UserId,
};
use serde::{Serialize, de::DeserializeOwned};

// =============================================================================
// RECORD TRAIT
// =============================================================================

/// A storable record: one table, one `u64` key.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Table name in the store.
    const TABLE: &'static str;
    /// Human-readable kind used in `NotFound` errors.
    const KIND: &'static str;

    /// The record's key.
    fn key(&self) -> u64;

    /// Overwrite the record's key (used when the store assigns one).
    fn set_key(&mut self, key: u64);
}

macro_rules! impl_record {
    ($ty:ty, $id:ident, $table:literal, $kind:literal) => {
        impl Record for $ty {
            const TABLE: &'static str = $table;
            const KIND: &'static str = $kind;

            fn key(&self) -> u64 {
                self.id.0
            }

            fn set_key(&mut self, key: u64) {
                self.id = $id(key);
            }
        }
    };
}

impl_record!(User, UserId, "users", "User");
impl_record!(
    KalibroConfiguration,
    KalibroConfigurationId,
    "kalibro_configurations",
    "KalibroConfiguration"
);
impl_record!(ReadingGroup, ReadingGroupId, "reading_groups", "ReadingGroup");
impl_record!(Reading, ReadingId, "readings", "Reading");
impl_record!(
    MetricConfiguration,
    MetricConfigurationId,
    "metric_configurations",
    "MetricConfiguration"
);
impl_record!(MezuroRange, MezuroRangeId, "mezuro_ranges", "MezuroRange");

// =============================================================================
// RECORDSTORE TRAIT
// =============================================================================

/// Table-per-record storage.
///
/// All fallible operations return `Result<T, MezuroError>` so in-memory and
/// persistent stores are interchangeable.
pub trait RecordStore {
    /// Make sure the table for `R` exists.
    fn prepare<R: Record>(&mut self) -> Result<(), MezuroError>;

    /// Store a new record under the next free key. Returns the stored record.
    fn insert<R: Record>(&mut self, record: R) -> Result<R, MezuroError>;

    /// Fetch a record by key.
    fn get<R: Record>(&self, key: u64) -> Result<Option<R>, MezuroError>;

    /// Replace an existing record. `NotFound` if the key is unknown.
    fn update<R: Record>(&mut self, record: &R) -> Result<(), MezuroError>;

    /// Remove a record. Returns whether it existed.
    fn remove<R: Record>(&mut self, key: u64) -> Result<bool, MezuroError>;

    /// Remove parent `key` together with the `children` keys of table `C`,
    /// all or nothing. Returns whether the parent existed.
    fn remove_with_children<P: Record, C: Record>(
        &mut self,
        key: u64,
        children: &[u64],
    ) -> Result<bool, MezuroError>;

    /// All records of a table, in key order.
    fn list<R: Record>(&self) -> Result<Vec<R>, MezuroError>;

    /// Number of records in a table.
    fn count<R: Record>(&self) -> Result<usize, MezuroError>;
}

// =============================================================================
// ENCODING HELPERS
// =============================================================================

pub(crate) fn encode<R: Record>(record: &R) -> Result<Vec<u8>, MezuroError> {
    postcard::to_allocvec(record).map_err(|e| MezuroError::Serialization(e.to_string()))
}

pub(crate) fn decode<R: Record>(bytes: &[u8]) -> Result<R, MezuroError> {
    postcard::from_bytes(bytes).map_err(|e| MezuroError::Serialization(e.to_string()))
}

pub(crate) fn not_found<R: Record>(key: u64) -> MezuroError {
    MezuroError::NotFound {
        kind: R::KIND,
        id: key,
    }
}
