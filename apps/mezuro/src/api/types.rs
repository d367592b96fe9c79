//! # API Types
//!
//! Request parameter shapes for the HTTP API. Form fields may arrive as
//! JSON numbers or as strings (`"2.5"`, `"-INF"`); an empty string means
//! the field was left blank.

use mezuro_core::primitives::DEFAULT_WEIGHT;
use mezuro_core::{
    AggregationForm, Bound, FieldError, KalibroConfigurationId, Metric,
    MetricConfigurationChanges, MetricConfigurationId, MezuroError, NewMetricConfiguration,
    NewMezuroRange, RangeChanges, ReadingGroupId, ReadingId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

const BLANK: &str = "can't be blank";
const NOT_A_NUMBER: &str = "is not a number";
const NOT_IN_LIST: &str = "is not included in the list";

// =============================================================================
// FORM FIELDS
// =============================================================================

/// One submitted form field.
///
/// A field left out of the request is `Absent`; one sent as `""` or `null`
/// is `Blank`. Text that does not parse is kept verbatim in `Invalid` so
/// the re-rendered form can show it.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField<T> {
    Absent,
    Blank,
    Invalid(String),
    Value(T),
}

impl<T> Default for FormField<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> FormField<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<T: DeserializeOwned> FormField<T> {
    fn from_raw(raw: Value) -> Self {
        match raw {
            Value::Null => Self::Blank,
            Value::String(text) => {
                let trimmed = text.trim().to_string();
                if trimmed.is_empty() {
                    return Self::Blank;
                }
                let parsed = serde_json::from_value::<T>(Value::String(trimmed.clone()))
                    .ok()
                    .or_else(|| serde_json::from_str::<T>(&trimmed).ok());
                match parsed {
                    Some(value) => Self::Value(value),
                    None => Self::Invalid(text),
                }
            }
            other => match serde_json::from_value::<T>(other.clone()) {
                Ok(value) => Self::Value(value),
                Err(_) => Self::Invalid(other.to_string()),
            },
        }
    }
}

impl<T: Clone> FormField<T> {
    /// A field a new record cannot do without.
    fn required(&self, field: &str, invalid: &str, errors: &mut Vec<FieldError>) -> Option<T> {
        match self {
            Self::Value(value) => Some(value.clone()),
            Self::Absent | Self::Blank => {
                errors.push(FieldError::new(field, BLANK));
                None
            }
            Self::Invalid(_) => {
                errors.push(FieldError::new(field, invalid));
                None
            }
        }
    }

    /// A field that keeps its stored value when left out.
    fn optional(&self, field: &str, invalid: &str, errors: &mut Vec<FieldError>) -> Option<T> {
        match self {
            Self::Absent => None,
            _ => self.required(field, invalid, errors),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for FormField<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_raw)
    }
}

impl<T: Serialize> Serialize for FormField<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Invalid(text) => serializer.serialize_str(text),
            Self::Absent | Self::Blank => serializer.serialize_none(),
        }
    }
}

fn finish<T>(value: Option<T>, errors: Vec<FieldError>) -> Result<T, MezuroError> {
    match value {
        Some(value) if errors.is_empty() => Ok(value),
        _ => Err(MezuroError::Invalid(errors)),
    }
}

// =============================================================================
// METRIC CONFIGURATIONS
// =============================================================================

/// Which metric of which collector a new metric configuration is for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSelection {
    #[serde(default)]
    pub metric_collector_name: String,
    #[serde(default)]
    pub metric_name: String,
}

/// The `metric_configuration` form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricConfigurationParams {
    #[serde(default, skip_serializing_if = "FormField::is_absent")]
    pub reading_group_id: FormField<u64>,
    #[serde(default, skip_serializing_if = "FormField::is_absent")]
    pub weight: FormField<f64>,
    #[serde(default, skip_serializing_if = "FormField::is_absent")]
    pub aggregation_form: FormField<AggregationForm>,
}

impl MetricConfigurationParams {
    /// The form `new` starts from.
    pub fn blank() -> Self {
        Self {
            reading_group_id: FormField::Absent,
            weight: FormField::Value(DEFAULT_WEIGHT),
            aggregation_form: FormField::Value(AggregationForm::default()),
        }
    }

    /// Fields of a new metric configuration, or the form errors.
    pub fn build(
        &self,
        kalibro_configuration_id: KalibroConfigurationId,
        metric: Metric,
    ) -> Result<NewMetricConfiguration, MezuroError> {
        let mut errors = Vec::new();
        let group = self
            .reading_group_id
            .required("reading_group_id", NOT_A_NUMBER, &mut errors);
        let weight = self.weight.required("weight", NOT_A_NUMBER, &mut errors);
        let form = self
            .aggregation_form
            .optional("aggregation_form", NOT_IN_LIST, &mut errors)
            .unwrap_or_default();

        let fields = group.zip(weight).map(|(group, weight)| NewMetricConfiguration {
            kalibro_configuration_id,
            reading_group_id: ReadingGroupId(group),
            metric,
            weight,
            aggregation_form: form,
        });
        finish(fields, errors)
    }

    /// Submitted changes; absent fields keep their stored values.
    pub fn changes(&self) -> Result<MetricConfigurationChanges, MezuroError> {
        let mut errors = Vec::new();
        let changes = MetricConfigurationChanges {
            reading_group_id: self
                .reading_group_id
                .optional("reading_group_id", NOT_A_NUMBER, &mut errors)
                .map(ReadingGroupId),
            weight: self.weight.optional("weight", NOT_A_NUMBER, &mut errors),
            aggregation_form: self
                .aggregation_form
                .optional("aggregation_form", NOT_IN_LIST, &mut errors),
        };
        finish(Some(changes), errors)
    }
}

/// `POST .../metric_configurations`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMetricConfigurationRequest {
    #[serde(default)]
    pub metric_configuration: MetricConfigurationParams,
    #[serde(flatten)]
    pub selection: MetricSelection,
}

/// `PUT .../metric_configurations/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMetricConfigurationRequest {
    #[serde(default)]
    pub metric_configuration: MetricConfigurationParams,
}

// =============================================================================
// RANGES
// =============================================================================

/// The `mezuro_range` form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MezuroRangeParams {
    #[serde(default, skip_serializing_if = "FormField::is_absent")]
    pub reading_id: FormField<u64>,
    #[serde(default, skip_serializing_if = "FormField::is_absent")]
    pub beginning: FormField<Bound>,
    #[serde(default, skip_serializing_if = "FormField::is_absent")]
    pub end: FormField<Bound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl MezuroRangeParams {
    /// Fields of a new range, or the form errors.
    pub fn build(
        &self,
        metric_configuration_id: MetricConfigurationId,
    ) -> Result<NewMezuroRange, MezuroError> {
        let mut errors = Vec::new();
        let reading = self
            .reading_id
            .required("reading_id", NOT_A_NUMBER, &mut errors);
        let beginning = self
            .beginning
            .required("beginning", NOT_A_NUMBER, &mut errors);
        let end = self.end.required("end", NOT_A_NUMBER, &mut errors);

        let fields = match (reading, beginning, end) {
            (Some(reading), Some(beginning), Some(end)) => Some(NewMezuroRange {
                metric_configuration_id,
                reading_id: ReadingId(reading),
                beginning,
                end,
                comments: self.comments.clone().unwrap_or_default(),
            }),
            _ => None,
        };
        finish(fields, errors)
    }

    /// Submitted changes; absent fields keep their stored values.
    pub fn changes(&self) -> Result<RangeChanges, MezuroError> {
        let mut errors = Vec::new();
        let changes = RangeChanges {
            reading_id: self
                .reading_id
                .optional("reading_id", NOT_A_NUMBER, &mut errors)
                .map(ReadingId),
            beginning: self
                .beginning
                .optional("beginning", NOT_A_NUMBER, &mut errors),
            end: self.end.optional("end", NOT_A_NUMBER, &mut errors),
            comments: self.comments.clone(),
        };
        finish(Some(changes), errors)
    }
}

/// `POST`/`PUT` bodies of range actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MezuroRangeRequest {
    #[serde(default)]
    pub mezuro_range: MezuroRangeParams,
}

// =============================================================================
// KALIBRO CONFIGURATIONS & SESSIONS
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KalibroConfigurationParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub public: bool,
}

/// `POST /kalibro_configurations`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateKalibroConfigurationRequest {
    #[serde(default)]
    pub kalibro_configuration: KalibroConfigurationParams,
}

/// `POST /users/sign_in`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub token: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
