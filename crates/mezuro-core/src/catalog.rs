//! # Catalog Module
//!
//! The high-level operations behind the HTTP controllers and the CLI:
//! users, kalibro configurations, reading groups and readings, metric
//! configurations and their ranges.
//!
//! Every create/update runs the matching validator from `validation`
//! first; an invalid record is never written. Destroying a metric
//! configuration also destroys its ranges.
//!
//! ## Storage Backends
//!
//! - `InMemory`: `MemoryStore` (fast, volatile)
//! - `Persistent`: `RedbStore` (disk-backed, ACID)

use crate::storage::{MemoryStore, Record, RecordStore, RedbStore};
use crate::validation;
use crate::{
    AggregationForm, Bound, KalibroConfiguration, KalibroConfigurationId, Metric,
    MetricConfiguration, MetricConfigurationId, MezuroError, MezuroRange, MezuroRangeId, Reading,
    ReadingGroup, ReadingGroupId, ReadingId, User, UserId,
};
use std::path::Path;
use subtle::ConstantTimeEq;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a Catalog.
#[derive(Debug)]
enum StorageBackend {
    /// In-memory tables (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed tables using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl RecordStore for StorageBackend {
    fn prepare<R: Record>(&mut self) -> Result<(), MezuroError> {
        match self {
            Self::InMemory(s) => s.prepare::<R>(),
            Self::Persistent(s) => s.prepare::<R>(),
        }
    }

    fn insert<R: Record>(&mut self, record: R) -> Result<R, MezuroError> {
        match self {
            Self::InMemory(s) => s.insert(record),
            Self::Persistent(s) => s.insert(record),
        }
    }

    fn get<R: Record>(&self, key: u64) -> Result<Option<R>, MezuroError> {
        match self {
            Self::InMemory(s) => s.get(key),
            Self::Persistent(s) => s.get(key),
        }
    }

    fn update<R: Record>(&mut self, record: &R) -> Result<(), MezuroError> {
        match self {
            Self::InMemory(s) => s.update(record),
            Self::Persistent(s) => s.update(record),
        }
    }

    fn remove<R: Record>(&mut self, key: u64) -> Result<bool, MezuroError> {
        match self {
            Self::InMemory(s) => s.remove::<R>(key),
            Self::Persistent(s) => s.remove::<R>(key),
        }
    }

    fn remove_with_children<P: Record, C: Record>(
        &mut self,
        key: u64,
        children: &[u64],
    ) -> Result<bool, MezuroError> {
        match self {
            Self::InMemory(s) => s.remove_with_children::<P, C>(key, children),
            Self::Persistent(s) => s.remove_with_children::<P, C>(key, children),
        }
    }

    fn list<R: Record>(&self) -> Result<Vec<R>, MezuroError> {
        match self {
            Self::InMemory(s) => s.list(),
            Self::Persistent(s) => s.list(),
        }
    }

    fn count<R: Record>(&self) -> Result<usize, MezuroError> {
        match self {
            Self::InMemory(s) => s.count::<R>(),
            Self::Persistent(s) => s.count::<R>(),
        }
    }
}

// =============================================================================
// INPUT STRUCTURES
// =============================================================================

/// Fields of a new kalibro configuration.
#[derive(Debug, Clone)]
pub struct NewKalibroConfiguration {
    pub name: String,
    pub description: String,
    pub owner: UserId,
    pub public: bool,
}

/// Fields of a new reading group.
#[derive(Debug, Clone)]
pub struct NewReadingGroup {
    pub name: String,
    pub description: String,
    pub owner: UserId,
}

/// Fields of a new reading.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub reading_group_id: ReadingGroupId,
    pub label: String,
    pub grade: f64,
    pub color: String,
}

/// Fields of a new metric configuration. The metric comes from a collector.
#[derive(Debug, Clone)]
pub struct NewMetricConfiguration {
    pub kalibro_configuration_id: KalibroConfigurationId,
    pub reading_group_id: ReadingGroupId,
    pub metric: Metric,
    pub weight: f64,
    pub aggregation_form: AggregationForm,
}

/// Editable fields of a metric configuration; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct MetricConfigurationChanges {
    pub reading_group_id: Option<ReadingGroupId>,
    pub weight: Option<f64>,
    pub aggregation_form: Option<AggregationForm>,
}

/// Fields of a new range.
#[derive(Debug, Clone)]
pub struct NewMezuroRange {
    pub metric_configuration_id: MetricConfigurationId,
    pub reading_id: ReadingId,
    pub beginning: Bound,
    pub end: Bound,
    pub comments: String,
}

/// Editable fields of a range; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct RangeChanges {
    pub reading_id: Option<ReadingId>,
    pub beginning: Option<Bound>,
    pub end: Option<Bound>,
    pub comments: Option<String>,
}

/// Record counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogCounts {
    pub users: usize,
    pub kalibro_configurations: usize,
    pub reading_groups: usize,
    pub readings: usize,
    pub metric_configurations: usize,
    pub mezuro_ranges: usize,
}

/// BLAKE3 hex digest of a user token.
#[must_use]
pub fn token_digest(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

/// Whether `token` is the one `user` was issued.
///
/// Both digests are 64 hex characters, so `ct_eq` always runs over the
/// same number of bytes.
#[must_use]
pub fn token_matches(user: &User, token: &str) -> bool {
    token_digest(token)
        .as_bytes()
        .ct_eq(user.token_digest.as_bytes())
        .into()
}

// =============================================================================
// CATALOG
// =============================================================================

/// The Mezuro catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    backend: StorageBackend,
}

impl Catalog {
    /// Create an empty in-memory catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) a persistent catalog at `path`.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, MezuroError> {
        let mut catalog = Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        };
        catalog.prepare_tables()?;
        Ok(catalog)
    }

    fn prepare_tables(&mut self) -> Result<(), MezuroError> {
        self.backend.prepare::<User>()?;
        self.backend.prepare::<KalibroConfiguration>()?;
        self.backend.prepare::<ReadingGroup>()?;
        self.backend.prepare::<Reading>()?;
        self.backend.prepare::<MetricConfiguration>()?;
        self.backend.prepare::<MezuroRange>()
    }

    /// Compact the database file (persistent backend only).
    pub fn compact(&mut self) -> Result<bool, MezuroError> {
        match &mut self.backend {
            StorageBackend::InMemory(_) => Ok(false),
            StorageBackend::Persistent(store) => store.compact(),
        }
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// Register a user. Returns the user and the freshly generated token;
    /// only the token's digest is stored.
    pub fn create_user(
        &mut self,
        name: &str,
        email: &str,
    ) -> Result<(User, String), MezuroError> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let candidate = User {
            id: UserId(0),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            token_digest: token_digest(&token),
        };
        let others: Vec<User> = self.backend.list()?;
        validation::validate_user(&candidate, &others)?;
        let user = self.backend.insert(candidate)?;
        Ok((user, token))
    }

    pub fn user(&self, id: UserId) -> Result<Option<User>, MezuroError> {
        self.backend.get(id.0)
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>, MezuroError> {
        let users: Vec<User> = self.backend.list()?;
        Ok(users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim())))
    }

    /// Resolve a session/API token to its user.
    pub fn authenticate(&self, token: &str) -> Result<Option<User>, MezuroError> {
        if token.is_empty() {
            return Ok(None);
        }
        let users: Vec<User> = self.backend.list()?;
        Ok(users.into_iter().find(|u| token_matches(u, token)))
    }

    // =========================================================================
    // KALIBRO CONFIGURATIONS
    // =========================================================================

    pub fn create_kalibro_configuration(
        &mut self,
        new: NewKalibroConfiguration,
    ) -> Result<KalibroConfiguration, MezuroError> {
        let candidate = KalibroConfiguration {
            id: KalibroConfigurationId(0),
            name: new.name,
            description: new.description,
            owner: new.owner,
            public: new.public,
        };
        let owner_exists = self.user(new.owner)?.is_some();
        validation::validate_kalibro_configuration(&candidate, owner_exists)?;
        self.backend.insert(candidate)
    }

    pub fn kalibro_configuration(
        &self,
        id: KalibroConfigurationId,
    ) -> Result<Option<KalibroConfiguration>, MezuroError> {
        self.backend.get(id.0)
    }

    pub fn kalibro_configurations(&self) -> Result<Vec<KalibroConfiguration>, MezuroError> {
        self.backend.list()
    }

    // =========================================================================
    // READING GROUPS & READINGS
    // =========================================================================

    pub fn create_reading_group(
        &mut self,
        new: NewReadingGroup,
    ) -> Result<ReadingGroup, MezuroError> {
        let candidate = ReadingGroup {
            id: ReadingGroupId(0),
            name: new.name,
            description: new.description,
            owner: new.owner,
        };
        let owner_exists = self.user(new.owner)?.is_some();
        validation::validate_reading_group(&candidate, owner_exists)?;
        self.backend.insert(candidate)
    }

    pub fn reading_group(&self, id: ReadingGroupId) -> Result<Option<ReadingGroup>, MezuroError> {
        self.backend.get(id.0)
    }

    pub fn reading_groups(&self) -> Result<Vec<ReadingGroup>, MezuroError> {
        self.backend.list()
    }

    pub fn create_reading(&mut self, new: NewReading) -> Result<Reading, MezuroError> {
        let candidate = Reading {
            id: ReadingId(0),
            reading_group_id: new.reading_group_id,
            label: new.label,
            grade: new.grade,
            color: new.color.trim_start_matches('#').to_ascii_lowercase(),
        };
        let group_exists = self.reading_group(new.reading_group_id)?.is_some();
        let siblings = self.readings_of(new.reading_group_id)?;
        validation::validate_reading(&candidate, group_exists, &siblings)?;
        self.backend.insert(candidate)
    }

    pub fn reading(&self, id: ReadingId) -> Result<Option<Reading>, MezuroError> {
        self.backend.get(id.0)
    }

    /// Readings of a group, best grade first.
    pub fn readings_of(&self, group: ReadingGroupId) -> Result<Vec<Reading>, MezuroError> {
        let mut readings: Vec<Reading> = self
            .backend
            .list::<Reading>()?
            .into_iter()
            .filter(|r| r.reading_group_id == group)
            .collect();
        readings.sort_by(|a, b| b.grade.total_cmp(&a.grade));
        Ok(readings)
    }

    // =========================================================================
    // METRIC CONFIGURATIONS
    // =========================================================================

    pub fn create_metric_configuration(
        &mut self,
        new: NewMetricConfiguration,
    ) -> Result<MetricConfiguration, MezuroError> {
        let candidate = MetricConfiguration {
            id: MetricConfigurationId(0),
            kalibro_configuration_id: new.kalibro_configuration_id,
            reading_group_id: new.reading_group_id,
            metric: new.metric,
            weight: new.weight,
            aggregation_form: new.aggregation_form,
        };
        self.check_metric_configuration(&candidate)?;
        self.backend.insert(candidate)
    }

    pub fn metric_configuration(
        &self,
        id: MetricConfigurationId,
    ) -> Result<Option<MetricConfiguration>, MezuroError> {
        self.backend.get(id.0)
    }

    pub fn metric_configurations_of(
        &self,
        configuration: KalibroConfigurationId,
    ) -> Result<Vec<MetricConfiguration>, MezuroError> {
        Ok(self
            .backend
            .list::<MetricConfiguration>()?
            .into_iter()
            .filter(|mc| mc.kalibro_configuration_id == configuration)
            .collect())
    }

    /// Apply `changes` and store the result. On `Invalid` the stored record
    /// is left as it was.
    pub fn update_metric_configuration(
        &mut self,
        id: MetricConfigurationId,
        changes: MetricConfigurationChanges,
    ) -> Result<MetricConfiguration, MezuroError> {
        let mut updated = self
            .metric_configuration(id)?
            .ok_or_else(|| crate::storage::not_found::<MetricConfiguration>(id.0))?;
        if let Some(group) = changes.reading_group_id {
            updated.reading_group_id = group;
        }
        if let Some(weight) = changes.weight {
            updated.weight = weight;
        }
        if let Some(form) = changes.aggregation_form {
            updated.aggregation_form = form;
        }
        self.check_metric_configuration(&updated)?;
        self.backend.update(&updated)?;
        Ok(updated)
    }

    /// Destroy a metric configuration and every range attached to it.
    pub fn destroy_metric_configuration(
        &mut self,
        id: MetricConfigurationId,
    ) -> Result<(), MezuroError> {
        let orphans: Vec<u64> = self.kalibro_ranges(id)?.iter().map(|r| r.id.0).collect();
        let existed = self
            .backend
            .remove_with_children::<MetricConfiguration, MezuroRange>(id.0, &orphans)?;
        if !existed {
            return Err(crate::storage::not_found::<MetricConfiguration>(id.0));
        }
        Ok(())
    }

    fn check_metric_configuration(
        &self,
        candidate: &MetricConfiguration,
    ) -> Result<(), MezuroError> {
        let configuration_exists = self
            .kalibro_configuration(candidate.kalibro_configuration_id)?
            .is_some();
        let group_exists = self.reading_group(candidate.reading_group_id)?.is_some();
        let siblings = self.metric_configurations_of(candidate.kalibro_configuration_id)?;
        validation::validate_metric_configuration(
            candidate,
            configuration_exists,
            group_exists,
            &siblings,
        )
    }

    // =========================================================================
    // RANGES
    // =========================================================================

    pub fn create_range(&mut self, new: NewMezuroRange) -> Result<MezuroRange, MezuroError> {
        let candidate = MezuroRange {
            id: MezuroRangeId(0),
            metric_configuration_id: new.metric_configuration_id,
            reading_id: new.reading_id,
            beginning: new.beginning,
            end: new.end,
            comments: new.comments,
        };
        self.check_range(&candidate)?;
        self.backend.insert(candidate)
    }

    pub fn range(&self, id: MezuroRangeId) -> Result<Option<MezuroRange>, MezuroError> {
        self.backend.get(id.0)
    }

    /// Ranges of a metric configuration, ordered by beginning.
    pub fn kalibro_ranges(
        &self,
        metric_configuration: MetricConfigurationId,
    ) -> Result<Vec<MezuroRange>, MezuroError> {
        let mut ranges: Vec<MezuroRange> = self
            .backend
            .list::<MezuroRange>()?
            .into_iter()
            .filter(|r| r.metric_configuration_id == metric_configuration)
            .collect();
        ranges.sort_by(|a, b| a.beginning.value().total_cmp(&b.beginning.value()));
        Ok(ranges)
    }

    /// Apply `changes` and store the result. On `Invalid` the stored record
    /// is left as it was.
    pub fn update_range(
        &mut self,
        id: MezuroRangeId,
        changes: RangeChanges,
    ) -> Result<MezuroRange, MezuroError> {
        let mut updated = self
            .range(id)?
            .ok_or_else(|| crate::storage::not_found::<MezuroRange>(id.0))?;
        if let Some(reading) = changes.reading_id {
            updated.reading_id = reading;
        }
        if let Some(beginning) = changes.beginning {
            updated.beginning = beginning;
        }
        if let Some(end) = changes.end {
            updated.end = end;
        }
        if let Some(comments) = changes.comments {
            updated.comments = comments;
        }
        self.check_range(&updated)?;
        self.backend.update(&updated)?;
        Ok(updated)
    }

    pub fn destroy_range(&mut self, id: MezuroRangeId) -> Result<(), MezuroError> {
        if self.backend.remove::<MezuroRange>(id.0)? {
            Ok(())
        } else {
            Err(crate::storage::not_found::<MezuroRange>(id.0))
        }
    }

    fn check_range(&self, candidate: &MezuroRange) -> Result<(), MezuroError> {
        let metric_configuration = self.metric_configuration(candidate.metric_configuration_id)?;
        let reading = self.reading(candidate.reading_id)?;
        let siblings = self.kalibro_ranges(candidate.metric_configuration_id)?;
        validation::validate_range(
            candidate,
            metric_configuration.as_ref(),
            reading.as_ref(),
            &siblings,
        )
    }

    // =========================================================================
    // STATISTICS
    // =========================================================================

    pub fn counts(&self) -> Result<CatalogCounts, MezuroError> {
        Ok(CatalogCounts {
            users: self.backend.count::<User>()?,
            kalibro_configurations: self.backend.count::<KalibroConfiguration>()?,
            reading_groups: self.backend.count::<ReadingGroup>()?,
            readings: self.backend.count::<Reading>()?,
            metric_configurations: self.backend.count::<MetricConfiguration>()?,
            mezuro_ranges: self.backend.count::<MezuroRange>()?,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricKind;

    struct Fixture {
        catalog: Catalog,
        owner: User,
        configuration: KalibroConfiguration,
        group: ReadingGroup,
        good: Reading,
        bad: Reading,
    }

    fn loc() -> Metric {
        Metric {
            name: "Lines of Code".to_string(),
            code: "loc".to_string(),
            scope: "CLASS".to_string(),
            kind: MetricKind::Native,
            description: String::new(),
            languages: vec!["C".to_string()],
            metric_collector_name: "Analizo".to_string(),
            script: None,
        }
    }

    fn fixture() -> Fixture {
        fixture_in(Catalog::new())
    }

    fn fixture_in(mut catalog: Catalog) -> Fixture {
        let (owner, _) = catalog
            .create_user("Owner", "owner@example.org")
            .expect("user");
        let configuration = catalog
            .create_kalibro_configuration(NewKalibroConfiguration {
                name: "Java".to_string(),
                description: String::new(),
                owner: owner.id,
                public: true,
            })
            .expect("configuration");
        let group = catalog
            .create_reading_group(NewReadingGroup {
                name: "Scholar".to_string(),
                description: String::new(),
                owner: owner.id,
            })
            .expect("group");
        let good = catalog
            .create_reading(NewReading {
                reading_group_id: group.id,
                label: "Good".to_string(),
                grade: 10.0,
                color: "#33DD33".to_string(),
            })
            .expect("good");
        let bad = catalog
            .create_reading(NewReading {
                reading_group_id: group.id,
                label: "Bad".to_string(),
                grade: 0.0,
                color: "dd3333".to_string(),
            })
            .expect("bad");
        Fixture {
            catalog,
            owner,
            configuration,
            group,
            good,
            bad,
        }
    }

    fn new_metric_configuration(f: &Fixture) -> NewMetricConfiguration {
        NewMetricConfiguration {
            kalibro_configuration_id: f.configuration.id,
            reading_group_id: f.group.id,
            metric: loc(),
            weight: 2.0,
            aggregation_form: AggregationForm::Mean,
        }
    }

    #[test]
    fn authenticate_by_token() {
        let mut catalog = Catalog::new();
        let (user, token) = catalog.create_user("Ana", "ana@example.org").expect("user");
        assert_eq!(token.len(), 32);
        assert_eq!(catalog.authenticate(&token).expect("auth"), Some(user));
        assert_eq!(catalog.authenticate("wrong").expect("auth"), None);
        assert_eq!(catalog.authenticate("").expect("auth"), None);
    }

    #[test]
    fn token_comparison() {
        let user = User {
            id: UserId(1),
            name: "Ana".to_string(),
            email: "ana@example.org".to_string(),
            token_digest: token_digest("secret"),
        };
        assert!(token_matches(&user, "secret"));
        assert!(!token_matches(&user, "secreT"));
        assert!(!token_matches(&user, ""));
    }

    #[test]
    fn readings_color_normalized_and_ordered_by_grade() {
        let f = fixture();
        assert_eq!(f.good.color, "33dd33");
        let readings = f.catalog.readings_of(f.group.id).expect("readings");
        assert_eq!(readings, vec![f.good.clone(), f.bad.clone()]);
        assert_eq!(f.owner.id, UserId(1));
    }

    #[test]
    fn metric_configuration_lifecycle() {
        let mut f = fixture();
        let new = new_metric_configuration(&f);
        let mc = f.catalog.create_metric_configuration(new).expect("create");
        assert_eq!(
            f.catalog
                .metric_configurations_of(f.configuration.id)
                .expect("list"),
            vec![mc.clone()]
        );

        let updated = f
            .catalog
            .update_metric_configuration(
                mc.id,
                MetricConfigurationChanges {
                    weight: Some(3.5),
                    aggregation_form: Some(AggregationForm::Maximum),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(updated.weight, 3.5);
        assert_eq!(updated.aggregation_form, AggregationForm::Maximum);

        let rejected = f.catalog.update_metric_configuration(
            mc.id,
            MetricConfigurationChanges {
                weight: Some(0.0),
                ..Default::default()
            },
        );
        assert!(matches!(rejected, Err(MezuroError::Invalid(_))));
        let stored = f.catalog.metric_configuration(mc.id).expect("get");
        assert_eq!(stored.map(|m| m.weight), Some(3.5));
    }

    #[test]
    fn duplicate_metric_in_configuration_rejected() {
        let mut f = fixture();
        f.catalog
            .create_metric_configuration(new_metric_configuration(&f))
            .expect("first");
        let second = f
            .catalog
            .create_metric_configuration(new_metric_configuration(&f));
        assert!(matches!(second, Err(MezuroError::Invalid(_))));
    }

    #[test]
    fn destroy_cascades_to_ranges() {
        check_destroy_cascades(fixture());
    }

    #[test]
    fn destroy_cascades_to_ranges_on_redb() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let catalog = Catalog::with_redb(dir.path().join("cascade.redb")).expect("open");
        check_destroy_cascades(fixture_in(catalog));
    }

    fn check_destroy_cascades(mut f: Fixture) {
        let mc = f
            .catalog
            .create_metric_configuration(new_metric_configuration(&f))
            .expect("create");
        for (beginning, end, reading) in [
            (Bound::NEG_INFINITY, Bound::new(10.0), f.good.id),
            (Bound::new(10.0), Bound::INFINITY, f.bad.id),
        ] {
            f.catalog
                .create_range(NewMezuroRange {
                    metric_configuration_id: mc.id,
                    reading_id: reading,
                    beginning,
                    end,
                    comments: String::new(),
                })
                .expect("range");
        }
        assert_eq!(f.catalog.counts().expect("counts").mezuro_ranges, 2);

        f.catalog
            .destroy_metric_configuration(mc.id)
            .expect("destroy");
        let counts = f.catalog.counts().expect("counts");
        assert_eq!(counts.metric_configurations, 0);
        assert_eq!(counts.mezuro_ranges, 0);

        assert!(matches!(
            f.catalog.destroy_metric_configuration(mc.id),
            Err(MezuroError::NotFound { .. })
        ));
    }

    #[test]
    fn ranges_sorted_and_updates_validated() {
        let mut f = fixture();
        let mc = f
            .catalog
            .create_metric_configuration(new_metric_configuration(&f))
            .expect("create");
        let high = f
            .catalog
            .create_range(NewMezuroRange {
                metric_configuration_id: mc.id,
                reading_id: f.bad.id,
                beginning: Bound::new(10.0),
                end: Bound::INFINITY,
                comments: "too long".to_string(),
            })
            .expect("high");
        let low = f
            .catalog
            .create_range(NewMezuroRange {
                metric_configuration_id: mc.id,
                reading_id: f.good.id,
                beginning: Bound::new(0.0),
                end: Bound::new(10.0),
                comments: String::new(),
            })
            .expect("low");
        let ordered = f.catalog.kalibro_ranges(mc.id).expect("ranges");
        assert_eq!(ordered, vec![low.clone(), high.clone()]);

        let overlap = f.catalog.update_range(
            low.id,
            RangeChanges {
                end: Some(Bound::new(20.0)),
                ..Default::default()
            },
        );
        assert!(matches!(overlap, Err(MezuroError::Invalid(_))));

        let widened = f
            .catalog
            .update_range(
                low.id,
                RangeChanges {
                    beginning: Some(Bound::NEG_INFINITY),
                    ..Default::default()
                },
            )
            .expect("widen");
        assert_eq!(widened.beginning, Bound::NEG_INFINITY);

        f.catalog.destroy_range(high.id).expect("destroy");
        assert!(f.catalog.range(high.id).expect("get").is_none());
    }

    #[test]
    fn persistent_catalog_survives_reopen() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("mezuro.redb");
        let token = {
            let mut catalog = Catalog::with_redb(&path).expect("open");
            let (_, token) = catalog
                .create_user("Persisted", "p@example.org")
                .expect("user");
            token
        };
        let catalog = Catalog::with_redb(&path).expect("reopen");
        let user = catalog.authenticate(&token).expect("auth").expect("user");
        assert_eq!(user.email, "p@example.org");
    }
}
