//! # Mezuro Ranges Controller
//!
//! Nested under a metric configuration. Every action requires the
//! metric configuration's owner.

use super::{authenticate_user, metric_configuration_owner, with_submitted};
use crate::api::auth::CurrentUser;
use crate::api::flash::IncomingFlash;
use crate::api::types::{MezuroRangeParams, MezuroRangeRequest};
use crate::api::views::{ActionResult, ApiError, Redirection, View};
use crate::api::{AppState, paths};
use axum::Json;
use axum::extract::{Path, State};
use mezuro_core::{
    Catalog, FieldError, KalibroConfigurationId, MetricConfiguration, MetricConfigurationId,
    MezuroError, MezuroRange, MezuroRangeId,
};
use serde_json::{Value, json};

pub const CREATED: &str = "Range was successfully created.";
pub const UPDATED: &str = "Range was successfully updated.";

const NEW: &str = "mezuro_ranges/new";
const EDIT: &str = "mezuro_ranges/edit";

/// `GET .../mezuro_ranges/new`
pub async fn new(
    State(state): State<AppState>,
    current: CurrentUser,
    flash: IncomingFlash,
    Path((kid, mid)): Path<(u64, u64)>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let (kid, mid) = (KalibroConfigurationId(kid), MetricConfigurationId(mid));
    let catalog = state.catalog.read().await;
    metric_configuration_owner(&catalog, &user, kid, mid)?;

    let locals = new_locals(&catalog, kid, mid, &MezuroRangeParams::default(), &[])?;
    Ok(View::new(NEW, locals).with_flash(flash).into())
}

/// `POST .../mezuro_ranges`
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((kid, mid)): Path<(u64, u64)>,
    Json(request): Json<MezuroRangeRequest>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let (kid, mid) = (KalibroConfigurationId(kid), MetricConfigurationId(mid));
    let mut catalog = state.catalog.write().await;
    metric_configuration_owner(&catalog, &user, kid, mid)?;

    let params = request.mezuro_range;
    let saved = params.build(mid).and_then(|new| catalog.create_range(new));

    match saved {
        Ok(range) => {
            tracing::info!(
                mezuro_range = %range.id,
                metric_configuration = %mid,
                "Range created [{}, {})",
                range.beginning,
                range.end
            );
            Ok(
                Redirection::to(paths::kalibro_configuration_metric_configuration_path(kid, mid))
                    .notice(CREATED)
                    .into(),
            )
        }
        Err(MezuroError::Invalid(errors)) => {
            let locals = new_locals(&catalog, kid, mid, &params, &errors)?;
            Ok(View::new(NEW, locals).unprocessable().into())
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET .../mezuro_ranges/{id}/edit`
pub async fn edit(
    State(state): State<AppState>,
    current: CurrentUser,
    flash: IncomingFlash,
    Path((kid, mid, id)): Path<(u64, u64, u64)>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let (kid, mid) = (KalibroConfigurationId(kid), MetricConfigurationId(mid));
    let catalog = state.catalog.read().await;
    metric_configuration_owner(&catalog, &user, kid, mid)?;

    let range = find_under(&catalog, mid, MezuroRangeId(id))?;
    let locals = edit_locals(&catalog, kid, &range, json!(range), &[])?;
    Ok(View::new(EDIT, locals).with_flash(flash).into())
}

/// `PUT|PATCH|POST .../mezuro_ranges/{id}`
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((kid, mid, id)): Path<(u64, u64, u64)>,
    Json(request): Json<MezuroRangeRequest>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let (kid, mid) = (KalibroConfigurationId(kid), MetricConfigurationId(mid));
    let mut catalog = state.catalog.write().await;
    metric_configuration_owner(&catalog, &user, kid, mid)?;

    let params = request.mezuro_range;
    let stored = find_under(&catalog, mid, MezuroRangeId(id))?;
    let updated = params
        .changes()
        .and_then(|changes| catalog.update_range(stored.id, changes));

    match updated {
        Ok(range) => {
            tracing::info!(mezuro_range = %range.id, "Range updated");
            Ok(
                Redirection::to(paths::kalibro_configuration_metric_configuration_path(kid, mid))
                    .notice(UPDATED)
                    .into(),
            )
        }
        Err(MezuroError::Invalid(errors)) => {
            let submitted = with_submitted(&stored, &params);
            let locals = edit_locals(&catalog, kid, &stored, submitted, &errors)?;
            Ok(View::new(EDIT, locals).unprocessable().into())
        }
        Err(e) => Err(e.into()),
    }
}

/// `DELETE .../mezuro_ranges/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((kid, mid, id)): Path<(u64, u64, u64)>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let (kid, mid) = (KalibroConfigurationId(kid), MetricConfigurationId(mid));
    let mut catalog = state.catalog.write().await;
    metric_configuration_owner(&catalog, &user, kid, mid)?;

    let range = find_under(&catalog, mid, MezuroRangeId(id))?;
    catalog.destroy_range(range.id)?;
    tracing::info!(mezuro_range = %range.id, "Range destroyed");
    Ok(Redirection::to(paths::kalibro_configuration_metric_configuration_path(kid, mid)).into())
}

// =============================================================================
// HELPERS
// =============================================================================

fn find_under(
    catalog: &Catalog,
    mid: MetricConfigurationId,
    id: MezuroRangeId,
) -> Result<MezuroRange, ApiError> {
    catalog
        .range(id)?
        .filter(|r| r.metric_configuration_id == mid)
        .ok_or_else(|| ApiError::not_found(format!("Range not found: {id}")))
}

fn metric_configuration(
    catalog: &Catalog,
    mid: MetricConfigurationId,
) -> Result<MetricConfiguration, ApiError> {
    catalog
        .metric_configuration(mid)?
        .ok_or_else(|| ApiError::not_found(format!("Metric Configuration not found: {mid}")))
}

fn new_locals(
    catalog: &Catalog,
    kid: KalibroConfigurationId,
    mid: MetricConfigurationId,
    form: &MezuroRangeParams,
    errors: &[FieldError],
) -> Result<Value, ApiError> {
    let mc = metric_configuration(catalog, mid)?;
    Ok(json!({
        "kalibro_configuration_id": kid,
        "metric_configuration": mc,
        "mezuro_range": form,
        "readings": catalog.readings_of(mc.reading_group_id)?,
        "errors": errors,
    }))
}

fn edit_locals(
    catalog: &Catalog,
    kid: KalibroConfigurationId,
    range: &MezuroRange,
    form: Value,
    errors: &[FieldError],
) -> Result<Value, ApiError> {
    let mc = metric_configuration(catalog, range.metric_configuration_id)?;
    Ok(json!({
        "kalibro_configuration_id": kid,
        "metric_configuration_id": mc.id,
        "mezuro_range": form,
        "readings": catalog.readings_of(mc.reading_group_id)?,
        "errors": errors,
    }))
}
