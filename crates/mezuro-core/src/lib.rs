//! # mezuro-core
//!
//! The catalog behind the Mezuro metric configuration service.
//!
//! A kalibro configuration owns metric configurations; a metric
//! configuration references a reading group and owns numeric ranges, each
//! of which maps an interval of metric values to a reading of that group.
//!
//! ## Layout
//!
//! - `types`: identifiers, records and the error type
//! - `validation`: the rules a record must satisfy before it is saved
//! - `storage`: record stores (in-memory `BTreeMap`, or redb on disk)
//! - `catalog`: the high-level operations used by the app layer
//! - `ownership`: ownership predicates used to gate mutations
//!
//! ## Architectural Constraints
//!
//! - No async and no network dependencies
//! - Deterministic listing order (records come back sorted by id)
//! - Never panics on bad input; every failure is a `MezuroError`

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod ownership;
pub mod primitives;
pub mod storage;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AggregationForm, Bound, FieldError, KalibroConfiguration, KalibroConfigurationId, Metric,
    MetricCollector, MetricConfiguration, MetricConfigurationId, MetricKind, MezuroError,
    MezuroRange, MezuroRangeId, Reading, ReadingGroup, ReadingGroupId, ReadingId, User, UserId,
};

// =============================================================================
// RE-EXPORTS: Catalog & Storage
// =============================================================================

pub use catalog::{
    Catalog, CatalogCounts, MetricConfigurationChanges, NewKalibroConfiguration,
    NewMetricConfiguration, NewMezuroRange, NewReading, NewReadingGroup, RangeChanges,
    token_digest, token_matches,
};
pub use ownership::{kalibro_configuration_owner, metric_configuration_owner, reading_group_owner};
pub use storage::{MemoryStore, Record, RecordStore, RedbStore};
