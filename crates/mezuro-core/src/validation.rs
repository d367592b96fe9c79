//! # Record Validation
//!
//! The rules a record must pass before the catalog stores it. Each
//! validator collects every failing field (not just the first) and returns
//! `MezuroError::Invalid` with the full list, so a form can show them all.
//!
//! Validators are pure: the catalog looks up whatever context they need
//! (parents, siblings) and passes it in.

use crate::primitives::{
    MAX_COMMENTS_LENGTH, MAX_DESCRIPTION_LENGTH, MAX_LABEL_LENGTH, MAX_NAME_LENGTH,
};
use crate::{
    FieldError, KalibroConfiguration, MetricConfiguration, MezuroError, MezuroRange, Reading,
    ReadingGroup, User,
};

const BLANK: &str = "can't be blank";

fn finish(errors: Vec<FieldError>) -> Result<(), MezuroError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(MezuroError::Invalid(errors))
    }
}

fn check_text(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: &str,
    max: usize,
    required: bool,
) {
    if required && value.trim().is_empty() {
        errors.push(FieldError::new(field, BLANK));
    } else if value.len() > max {
        errors.push(FieldError::new(
            field,
            format!("is too long (maximum is {} characters)", max),
        ));
    }
}

// =============================================================================
// USERS
// =============================================================================

/// A user needs a name and a unique, plausible email address.
pub fn validate_user(user: &User, others: &[User]) -> Result<(), MezuroError> {
    let mut errors = Vec::new();
    check_text(&mut errors, "name", &user.name, MAX_NAME_LENGTH, true);
    check_text(&mut errors, "email", &user.email, MAX_NAME_LENGTH, true);

    if !user.email.trim().is_empty() && !user.email.contains('@') {
        errors.push(FieldError::new("email", "is invalid"));
    }
    if others
        .iter()
        .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
    {
        errors.push(FieldError::new("email", "has already been taken"));
    }
    finish(errors)
}

// =============================================================================
// KALIBRO CONFIGURATIONS
// =============================================================================

pub fn validate_kalibro_configuration(
    configuration: &KalibroConfiguration,
    owner_exists: bool,
) -> Result<(), MezuroError> {
    let mut errors = Vec::new();
    check_text(&mut errors, "name", &configuration.name, MAX_NAME_LENGTH, true);
    check_text(
        &mut errors,
        "description",
        &configuration.description,
        MAX_DESCRIPTION_LENGTH,
        false,
    );
    if !owner_exists {
        errors.push(FieldError::new("owner", "does not exist"));
    }
    finish(errors)
}

// =============================================================================
// READINGS
// =============================================================================

pub fn validate_reading_group(
    group: &ReadingGroup,
    owner_exists: bool,
) -> Result<(), MezuroError> {
    let mut errors = Vec::new();
    check_text(&mut errors, "name", &group.name, MAX_NAME_LENGTH, true);
    check_text(
        &mut errors,
        "description",
        &group.description,
        MAX_DESCRIPTION_LENGTH,
        false,
    );
    if !owner_exists {
        errors.push(FieldError::new("owner", "does not exist"));
    }
    finish(errors)
}

/// Readings need a label, a finite grade and a six-digit hex color.
pub fn validate_reading(
    reading: &Reading,
    group_exists: bool,
    siblings: &[Reading],
) -> Result<(), MezuroError> {
    let mut errors = Vec::new();
    check_text(&mut errors, "label", &reading.label, MAX_LABEL_LENGTH, true);

    if !reading.grade.is_finite() {
        errors.push(FieldError::new("grade", "must be a finite number"));
    }
    if !is_hex_color(&reading.color) {
        errors.push(FieldError::new("color", "must be six hexadecimal digits"));
    }
    if !group_exists {
        errors.push(FieldError::new("reading_group_id", "does not exist"));
    }
    if siblings
        .iter()
        .any(|r| r.id != reading.id && r.label == reading.label)
    {
        errors.push(FieldError::new("label", "has already been taken"));
    }
    finish(errors)
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 6 && color.chars().all(|c| c.is_ascii_hexdigit())
}

// =============================================================================
// METRIC CONFIGURATIONS
// =============================================================================

/// Weight must be positive, the metric must be identified, both parents
/// must exist and the metric code must be unique within the configuration.
///
/// `siblings` are the other metric configurations of the same kalibro
/// configuration; the candidate itself may be among them.
pub fn validate_metric_configuration(
    candidate: &MetricConfiguration,
    configuration_exists: bool,
    reading_group_exists: bool,
    siblings: &[MetricConfiguration],
) -> Result<(), MezuroError> {
    let mut errors = Vec::new();

    if !candidate.weight.is_finite() || candidate.weight <= 0.0 {
        errors.push(FieldError::new("weight", "must be greater than 0"));
    }
    check_text(
        &mut errors,
        "metric.name",
        &candidate.metric.name,
        MAX_NAME_LENGTH,
        true,
    );
    check_text(
        &mut errors,
        "metric.code",
        &candidate.metric.code,
        MAX_NAME_LENGTH,
        true,
    );
    if !configuration_exists {
        errors.push(FieldError::new("kalibro_configuration_id", "does not exist"));
    }
    if !reading_group_exists {
        errors.push(FieldError::new("reading_group_id", "does not exist"));
    }
    if !candidate.metric.code.is_empty()
        && siblings.iter().any(|mc| {
            mc.id != candidate.id
                && mc.kalibro_configuration_id == candidate.kalibro_configuration_id
                && mc.metric.code == candidate.metric.code
        })
    {
        errors.push(FieldError::new("metric.code", "has already been taken"));
    }
    finish(errors)
}

// =============================================================================
// RANGES
// =============================================================================

/// `beginning < end`, the reading must come from the metric configuration's
/// reading group, and the range may not overlap its siblings.
///
/// `reading` is the looked-up reading (if any); `siblings` are the other
/// ranges of the same metric configuration.
pub fn validate_range(
    candidate: &MezuroRange,
    metric_configuration: Option<&MetricConfiguration>,
    reading: Option<&Reading>,
    siblings: &[MezuroRange],
) -> Result<(), MezuroError> {
    let mut errors = Vec::new();

    if !(candidate.beginning.value() < candidate.end.value()) {
        errors.push(FieldError::new("beginning", "must be less than end"));
    }
    check_text(
        &mut errors,
        "comments",
        &candidate.comments,
        MAX_COMMENTS_LENGTH,
        false,
    );

    match (metric_configuration, reading) {
        (None, _) => errors.push(FieldError::new("metric_configuration_id", "does not exist")),
        (Some(_), None) => errors.push(FieldError::new("reading_id", BLANK)),
        (Some(mc), Some(r)) if r.reading_group_id != mc.reading_group_id => {
            errors.push(FieldError::new(
                "reading_id",
                "must belong to the metric configuration's reading group",
            ));
        }
        _ => {}
    }

    if siblings.iter().any(|other| {
        other.id != candidate.id
            && other.metric_configuration_id == candidate.metric_configuration_id
            && other.overlaps(candidate)
    }) {
        errors.push(FieldError::new("beginning", "overlaps an existing range"));
    }
    finish(errors)
}

// =============================================================================
// TESTS
// =============================================================================
