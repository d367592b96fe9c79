//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use mezuro::api::flash::Flash;
use mezuro::api::types::{
    CreateKalibroConfigurationRequest, CreateMetricConfigurationRequest, FormField,
    HealthResponse, MezuroRangeRequest, SignInRequest, UpdateMetricConfigurationRequest,
};
use mezuro::api::{ErrorResponse, ViewResponse};
use mezuro_core::{
    AggregationForm, Bound, FieldError, KalibroConfigurationId, Metric, MetricKind, MezuroError,
    ReadingGroupId,
};

fn analizo_loc() -> Metric {
    Metric {
        name: "Lines of Code".to_string(),
        code: "loc".to_string(),
        scope: "CLASS".to_string(),
        kind: MetricKind::Native,
        description: String::new(),
        languages: vec!["JAVA".to_string()],
        metric_collector_name: "Analizo".to_string(),
        script: None,
    }
}

/// Names of the fields a form error reports, in order.
fn error_fields(err: Option<MezuroError>) -> Vec<String> {
    match err {
        Some(MezuroError::Invalid(errors)) => errors.into_iter().map(|e| e.field).collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.3.0".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.3.0\""));
}

// =============================================================================
// METRIC CONFIGURATION REQUEST TESTS
// =============================================================================

#[test]
fn test_create_metric_configuration_request_from_form_strings() {
    let json = r#"{
        "metric_collector_name": "Analizo",
        "metric_name": "Lines of Code",
        "metric_configuration": {
            "reading_group_id": "3",
            "weight": "2.5",
            "aggregation_form": "STANDARD_DEVIATION"
        }
    }"#;
    let request: CreateMetricConfigurationRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.selection.metric_collector_name, "Analizo");
    assert_eq!(request.selection.metric_name, "Lines of Code");
    let params = request.metric_configuration;
    assert_eq!(params.reading_group_id, FormField::Value(3));
    assert_eq!(params.weight, FormField::Value(2.5));
    assert_eq!(
        params.aggregation_form,
        FormField::Value(AggregationForm::StandardDeviation)
    );

    let new = params
        .build(KalibroConfigurationId(1), analizo_loc())
        .unwrap();
    assert_eq!(new.reading_group_id, ReadingGroupId(3));
    assert_eq!(new.weight, 2.5);
}

#[test]
fn test_create_metric_configuration_request_blank_fields() {
    let json = r#"{"metric_configuration":{"reading_group_id":"","weight":" "}}"#;
    let request: CreateMetricConfigurationRequest = serde_json::from_str(json).unwrap();

    let result = request
        .metric_configuration
        .build(KalibroConfigurationId(1), analizo_loc());
    assert_eq!(
        error_fields(result.err()),
        vec!["reading_group_id", "weight"]
    );
    assert!(request.selection.metric_name.is_empty());
}

#[test]
fn test_update_metric_configuration_request_partial() {
    let json = r#"{"metric_configuration":{"weight":4}}"#;
    let request: UpdateMetricConfigurationRequest = serde_json::from_str(json).unwrap();

    let changes = request.metric_configuration.changes().unwrap();
    assert_eq!(changes.weight, Some(4.0));
    assert!(changes.reading_group_id.is_none());
    assert!(changes.aggregation_form.is_none());
}

#[test]
fn test_unknown_aggregation_form_is_a_field_error() {
    let json = r#"{"metric_configuration":{"aggregation_form":"AVERAGE"}}"#;
    let request: UpdateMetricConfigurationRequest = serde_json::from_str(json).unwrap();

    assert_eq!(
        request.metric_configuration.aggregation_form,
        FormField::Invalid("AVERAGE".to_string())
    );
    let result = request.metric_configuration.changes();
    assert_eq!(error_fields(result.err()), vec!["aggregation_form"]);
}

#[test]
fn test_non_numeric_weight_is_not_a_number() {
    let json = r#"{"metric_configuration":{"reading_group_id":1,"weight":"heavy"}}"#;
    let request: UpdateMetricConfigurationRequest = serde_json::from_str(json).unwrap();

    let result = request.metric_configuration.changes();
    assert!(matches!(
        result,
        Err(MezuroError::Invalid(ref errors))
            if errors == &vec![FieldError::new("weight", "is not a number")]
    ));
}

// =============================================================================
// RANGE REQUEST TESTS
// =============================================================================

#[test]
fn test_range_request_with_infinite_bounds() {
    let json = r#"{"mezuro_range":{"reading_id":"7","beginning":"-INF","end":"INF","comments":"all"}}"#;
    let request: MezuroRangeRequest = serde_json::from_str(json).unwrap();

    let params = request.mezuro_range;
    assert_eq!(params.reading_id, FormField::Value(7));
    assert_eq!(params.beginning, FormField::Value(Bound::NEG_INFINITY));
    assert_eq!(params.end, FormField::Value(Bound::INFINITY));
    assert_eq!(params.comments.as_deref(), Some("all"));
}

#[test]
fn test_range_request_numeric_bounds() {
    let json = r#"{"mezuro_range":{"reading_id":1,"beginning":-2.5,"end":"10"}}"#;
    let request: MezuroRangeRequest = serde_json::from_str(json).unwrap();

    let changes = request.mezuro_range.changes().unwrap();
    assert_eq!(changes.beginning, Some(Bound::new(-2.5)));
    assert_eq!(changes.end, Some(Bound::new(10.0)));
    assert!(changes.comments.is_none());
}

#[test]
fn test_range_request_garbage_bound_is_a_field_error() {
    let json = r#"{"mezuro_range":{"beginning":"low"}}"#;
    let request: MezuroRangeRequest = serde_json::from_str(json).unwrap();

    assert_eq!(
        request.mezuro_range.beginning,
        FormField::Invalid("low".to_string())
    );
    let result = request.mezuro_range.changes();
    assert_eq!(error_fields(result.err()), vec!["beginning"]);
}

#[test]
fn test_range_request_blank_end_on_update() {
    let json = r#"{"mezuro_range":{"end":""}}"#;
    let request: MezuroRangeRequest = serde_json::from_str(json).unwrap();

    let result = request.mezuro_range.changes();
    assert_eq!(error_fields(result.err()), vec!["end"]);
}

#[test]
fn test_range_params_serialize_infinity_as_text() {
    let json = r#"{"mezuro_range":{"beginning":"-INF","end":3}}"#;
    let request: MezuroRangeRequest = serde_json::from_str(json).unwrap();

    let out = serde_json::to_value(&request.mezuro_range).unwrap();
    assert_eq!(out["beginning"], "-INF");
    assert_eq!(out["end"], 3.0);
}

// =============================================================================
// KALIBRO CONFIGURATION & SESSION TESTS
// =============================================================================

#[test]
fn test_create_kalibro_configuration_defaults() {
    let json = r#"{"kalibro_configuration":{"name":"Java"}}"#;
    let request: CreateKalibroConfigurationRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.kalibro_configuration.name, "Java");
    assert!(request.kalibro_configuration.description.is_empty());
    assert!(!request.kalibro_configuration.public);
}

#[test]
fn test_sign_in_request_requires_both_fields() {
    let ok: SignInRequest =
        serde_json::from_str(r#"{"email":"ana@example.org","token":"abc"}"#).unwrap();
    assert_eq!(ok.email, "ana@example.org");

    let missing: Result<SignInRequest, _> = serde_json::from_str(r#"{"email":"a@b"}"#);
    assert!(missing.is_err());
}

// =============================================================================
// VIEW & ERROR RESPONSE TESTS
// =============================================================================

#[test]
fn test_view_response_roundtrip() {
    let json = r#"{
        "template": "metric_configurations/show",
        "flash": {"notice": "Metric Configuration was successfully created."},
        "locals": {"metric_configuration": {"id": 1}}
    }"#;
    let view: ViewResponse = serde_json::from_str(json).unwrap();

    assert_eq!(view.template, "metric_configurations/show");
    assert_eq!(
        view.flash,
        Flash {
            notice: Some("Metric Configuration was successfully created.".to_string()),
            alert: None,
        }
    );
    assert_eq!(view.locals["metric_configuration"]["id"], 1);

    let out = serde_json::to_string(&view).unwrap();
    assert!(!out.contains("alert"));
}

#[test]
fn test_error_response_omits_empty_field_errors() {
    let plain = ErrorResponse {
        error: "Range not found: 9".to_string(),
        errors: Vec::new(),
    };
    let json = serde_json::to_string(&plain).unwrap();
    assert_eq!(json, r#"{"error":"Range not found: 9"}"#);

    let invalid = ErrorResponse {
        error: "Validation failed".to_string(),
        errors: vec![FieldError::new("weight", "must be greater than 0")],
    };
    let json = serde_json::to_string(&invalid).unwrap();
    assert!(json.contains("\"field\":\"weight\""));
    assert!(json.contains("\"message\":\"must be greater than 0\""));
}
