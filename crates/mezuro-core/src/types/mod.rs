//! # Core Type Definitions
//!
//! This module contains all records of the Mezuro catalog:
//! - Identifiers (`UserId`, `KalibroConfigurationId`, `MetricConfigurationId`, ...)
//! - Owned records (`KalibroConfiguration`, `ReadingGroup`, `Reading`)
//! - Nested records (`MetricConfiguration`, `MezuroRange`)
//! - Remote values (`Metric`, `MetricCollector`)
//! - Error types (`MezuroError`, `FieldError`)
//!
//! ## Bounds
//!
//! Range limits are `f64` values that may be infinite. JSON cannot carry
//! infinities, so `Bound` writes them as the strings `"-INF"` and `"INF"`
//! in human-readable formats and as raw floats everywhere else.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a signed-up user.
    UserId
);
record_id!(
    /// Identifier of a kalibro configuration.
    KalibroConfigurationId
);
record_id!(
    /// Identifier of a metric configuration.
    MetricConfigurationId
);
record_id!(
    /// Identifier of a range attached to a metric configuration.
    MezuroRangeId
);
record_id!(
    /// Identifier of a reading group.
    ReadingGroupId
);
record_id!(
    /// Identifier of a reading inside a reading group.
    ReadingId
);

// =============================================================================
// USER
// =============================================================================

/// A user that can sign in and own configurations.
///
/// Only the BLAKE3 digest of the user's token is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub token_digest: String,
}

// =============================================================================
// KALIBRO CONFIGURATION
// =============================================================================

/// A named code-quality configuration owning a set of metric configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KalibroConfiguration {
    pub id: KalibroConfigurationId,
    pub name: String,
    pub description: String,
    pub owner: UserId,
    pub public: bool,
}

// =============================================================================
// READINGS
// =============================================================================

/// A named collection of readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingGroup {
    pub id: ReadingGroupId,
    pub name: String,
    pub description: String,
    pub owner: UserId,
}

/// A qualitative label ("Good", "Regular", ...) with a grade and a color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: ReadingId,
    pub reading_group_id: ReadingGroupId,
    pub label: String,
    pub grade: f64,
    /// Six hex digits, no leading `#`.
    pub color: String,
}

// =============================================================================
// METRICS (remote values)
// =============================================================================

/// Whether a metric is computed by a collector or scripted from other metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MetricKind {
    #[default]
    #[serde(rename = "NativeMetricSnapshot", alias = "NativeMetric")]
    Native,
    #[serde(rename = "CompoundMetricSnapshot", alias = "CompoundMetric")]
    Compound,
}

/// A metric as described by a metric collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub code: String,
    #[serde(deserialize_with = "deserialize_scope")]
    pub scope: String,
    #[serde(rename = "type", default)]
    pub kind: MetricKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub metric_collector_name: String,
    #[serde(default)]
    pub script: Option<String>,
}

/// Collector services describe scopes either as `"CLASS"` or as
/// `{"type": "CLASS"}`.
fn deserialize_scope<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScopeRepr {
        Name(String),
        Object {
            #[serde(rename = "type")]
            kind: String,
        },
    }

    if !deserializer.is_human_readable() {
        return String::deserialize(deserializer);
    }
    Ok(match ScopeRepr::deserialize(deserializer)? {
        ScopeRepr::Name(name) | ScopeRepr::Object { kind: name } => name,
    })
}

/// A tool that computes metrics, keyed by metric code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCollector {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub supported_metrics: BTreeMap<String, Metric>,
}

impl MetricCollector {
    /// Find a supported metric by its display name.
    ///
    /// The returned metric carries this collector's name.
    pub fn metric(&self, name: &str) -> Option<Metric> {
        self.supported_metrics
            .values()
            .find(|m| m.name == name)
            .map(|m| Metric {
                metric_collector_name: self.name.clone(),
                ..m.clone()
            })
    }
}

// =============================================================================
// METRIC CONFIGURATION
// =============================================================================

/// How metric results of child modules are folded into the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationForm {
    #[default]
    Mean,
    Median,
    Maximum,
    Minimum,
    Count,
    Sum,
    StandardDeviation,
}

impl AggregationForm {
    /// Every form, in the order forms offer them.
    pub const ALL: [Self; 7] = [
        Self::Mean,
        Self::Median,
        Self::Maximum,
        Self::Minimum,
        Self::Count,
        Self::Sum,
        Self::StandardDeviation,
    ];
}

/// A metric attached to a kalibro configuration with a weight, an
/// aggregation form and the reading group its ranges draw from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfiguration {
    pub id: MetricConfigurationId,
    pub kalibro_configuration_id: KalibroConfigurationId,
    pub reading_group_id: ReadingGroupId,
    pub metric: Metric,
    pub weight: f64,
    pub aggregation_form: AggregationForm,
}

// =============================================================================
// RANGE BOUNDS
// =============================================================================

/// One end of a range. May be `-INF` or `INF`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Bound(f64);

impl Bound {
    pub const NEG_INFINITY: Self = Self(f64::NEG_INFINITY);
    pub const INFINITY: Self = Self(f64::INFINITY);

    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == f64::INFINITY {
            f.write_str("INF")
        } else if self.0 == f64::NEG_INFINITY {
            f.write_str("-INF")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Bound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "INF" | "+INF" | "INFINITY" | "+INFINITY" => Ok(Self::INFINITY),
            "-INF" | "-INFINITY" => Ok(Self::NEG_INFINITY),
            _ => match trimmed.parse::<f64>() {
                Ok(v) if !v.is_nan() => Ok(Self(v)),
                _ => Err(format!("'{}' is not a number", trimmed)),
            },
        }
    }
}

impl Serialize for Bound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() && !self.is_finite() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

struct BoundVisitor;

impl Visitor<'_> for BoundVisitor {
    type Value = Bound;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, \"-INF\" or \"INF\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Bound, E> {
        if v.is_nan() {
            return Err(E::custom("NaN is not a valid bound"));
        }
        Ok(Bound(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Bound, E> {
        Ok(Bound(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Bound, E> {
        Ok(Bound(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Bound, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Bound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(BoundVisitor)
        } else {
            deserializer.deserialize_f64(BoundVisitor)
        }
    }
}

// =============================================================================
// MEZURO RANGE
// =============================================================================

/// A half-open interval `[beginning, end)` of metric values mapped to a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MezuroRange {
    pub id: MezuroRangeId,
    pub metric_configuration_id: MetricConfigurationId,
    pub reading_id: ReadingId,
    pub beginning: Bound,
    pub end: Bound,
    pub comments: String,
}

impl MezuroRange {
    /// Whether this range shares any value with `other`.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.beginning.value() < other.end.value() && other.beginning.value() < self.end.value()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// A validation message attached to one field of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Errors that can occur in the Mezuro catalog.
///
/// - `Invalid` is the "save returned false" case; callers re-render forms with it
/// - The catalog never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum MezuroError {
    /// The requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },

    /// The record failed validation and was not saved.
    #[error("Validation failed: {}", join_field_errors(.0))]
    Invalid(Vec<FieldError>),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MezuroError {
    /// Field errors carried by an `Invalid` error, empty for anything else.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn range(beginning: f64, end: f64) -> MezuroRange {
        MezuroRange {
            id: MezuroRangeId(0),
            metric_configuration_id: MetricConfigurationId(1),
            reading_id: ReadingId(1),
            beginning: Bound::new(beginning),
            end: Bound::new(end),
            comments: String::new(),
        }
    }

    #[test]
    fn bound_parses_infinities() {
        assert_eq!("INF".parse::<Bound>(), Ok(Bound::INFINITY));
        assert_eq!("-INF".parse::<Bound>(), Ok(Bound::NEG_INFINITY));
        assert_eq!(" -inf ".parse::<Bound>(), Ok(Bound::NEG_INFINITY));
        assert_eq!("2.5".parse::<Bound>(), Ok(Bound::new(2.5)));
    }

    #[test]
    fn bound_rejects_garbage_and_nan() {
        assert!("abc".parse::<Bound>().is_err());
        assert!("NaN".parse::<Bound>().is_err());
    }

    #[test]
    fn bound_display_round_trips_infinities() {
        assert_eq!(Bound::INFINITY.to_string(), "INF");
        assert_eq!(Bound::NEG_INFINITY.to_string(), "-INF");
        assert_eq!(Bound::new(3.0).to_string(), "3");
    }

    #[test]
    fn bound_survives_postcard() {
        let bytes = postcard::to_allocvec(&Bound::NEG_INFINITY).expect("encode");
        let back: Bound = postcard::from_bytes(&bytes).expect("decode");
        assert_eq!(back, Bound::NEG_INFINITY);
    }

    #[test]
    fn range_is_half_open() {
        let r = range(0.0, 10.0);
        assert!(r.overlaps(&range(9.99, 20.0)));
        assert!(!r.overlaps(&range(10.0, 20.0)));
        assert!(!range(-5.0, 0.0).overlaps(&r));
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        assert!(!range(0.0, 10.0).overlaps(&range(10.0, 20.0)));
        assert!(range(0.0, 10.0).overlaps(&range(5.0, 20.0)));
        assert!(range(f64::NEG_INFINITY, 0.0).overlaps(&range(-1.0, 1.0)));
    }

    #[test]
    fn collector_metric_lookup_by_name() {
        let mut supported = BTreeMap::new();
        supported.insert(
            "loc".to_string(),
            Metric {
                name: "Lines of Code".to_string(),
                code: "loc".to_string(),
                scope: "CLASS".to_string(),
                kind: MetricKind::Native,
                description: String::new(),
                languages: vec!["C".to_string()],
                metric_collector_name: String::new(),
                script: None,
            },
        );
        let collector = MetricCollector {
            name: "Analizo".to_string(),
            description: String::new(),
            supported_metrics: supported,
        };

        let metric = collector.metric("Lines of Code").expect("metric");
        assert_eq!(metric.code, "loc");
        assert_eq!(metric.metric_collector_name, "Analizo");
        assert!(collector.metric("Cyclomatic Complexity").is_none());
    }

    #[test]
    fn invalid_error_lists_fields() {
        let err = MezuroError::Invalid(vec![
            FieldError::new("weight", "must be greater than 0"),
            FieldError::new("metric.code", "has already been taken"),
        ]);
        assert_eq!(err.field_errors().len(), 2);
        assert!(err.to_string().contains("weight must be greater than 0"));
    }

    #[test]
    fn metric_scope_accepts_object_form() {
        let json = r#"{"name":"Lines of Code","code":"loc","scope":{"type":"CLASS"},"type":"NativeMetricSnapshot"}"#;
        let metric: Metric = serde_json::from_str(json).expect("decode");
        assert_eq!(metric.scope, "CLASS");
        assert_eq!(metric.kind, MetricKind::Native);

        let bytes = postcard::to_allocvec(&metric).expect("encode");
        let back: Metric = postcard::from_bytes(&bytes).expect("decode");
        assert_eq!(back, metric);
    }
}
