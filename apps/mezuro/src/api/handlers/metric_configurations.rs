//! # Metric Configurations Controller
//!
//! Nested under `/kalibro_configurations/{kalibro_configuration_id}`.
//! `choose_metric`, `new` and `create` need the kalibro configuration's
//! owner; `edit`, `update` and `destroy` need the metric configuration's
//! owner; `show` is public.

use super::{
    authenticate_user, kalibro_configuration_owner, metric_configuration_owner, with_submitted,
};
use crate::api::auth::CurrentUser;
use crate::api::flash::IncomingFlash;
use crate::api::types::{
    CreateMetricConfigurationRequest, MetricConfigurationParams, MetricSelection,
    UpdateMetricConfigurationRequest,
};
use crate::api::views::{ActionResult, ApiError, Halt, Redirection, View};
use crate::api::{AppState, paths};
use axum::Json;
use axum::extract::{Path, Query, State};
use mezuro_core::{
    AggregationForm, Catalog, FieldError, KalibroConfigurationId, Metric, MetricConfiguration,
    MetricConfigurationId, MezuroError,
};
use serde_json::{Value, json};

pub const CREATED: &str = "Metric Configuration was successfully created.";
pub const UPDATED: &str = "Metric Configuration was successfully updated.";

const CHOOSE_METRIC: &str = "metric_configurations/choose_metric";
const NEW: &str = "metric_configurations/new";
const SHOW: &str = "metric_configurations/show";
const EDIT: &str = "metric_configurations/edit";

// =============================================================================
// ACTIONS
// =============================================================================

/// `GET .../metric_configurations/choose_metric`
pub async fn choose_metric(
    State(state): State<AppState>,
    current: CurrentUser,
    flash: IncomingFlash,
    Path(kid): Path<u64>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let kid = KalibroConfigurationId(kid);
    kalibro_configuration_owner(&*state.catalog.read().await, &user, kid)?;

    let metric_collectors = state.collectors.all().await?;
    Ok(View::new(
        CHOOSE_METRIC,
        json!({
            "kalibro_configuration_id": kid,
            "metric_collectors": metric_collectors,
        }),
    )
    .with_flash(flash)
    .into())
}

/// `GET .../metric_configurations/new?metric_collector_name=..&metric_name=..`
pub async fn new(
    State(state): State<AppState>,
    current: CurrentUser,
    flash: IncomingFlash,
    Path(kid): Path<u64>,
    Query(selection): Query<MetricSelection>,
) -> ActionResult {
    render_new(&state, current, flash, KalibroConfigurationId(kid), &selection).await
}

/// `POST .../metric_configurations/new` with the selection in the body, as
/// the choose_metric form submits it.
pub async fn new_with_selection(
    State(state): State<AppState>,
    current: CurrentUser,
    flash: IncomingFlash,
    Path(kid): Path<u64>,
    Json(selection): Json<MetricSelection>,
) -> ActionResult {
    render_new(&state, current, flash, KalibroConfigurationId(kid), &selection).await
}

/// `POST .../metric_configurations`
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(kid): Path<u64>,
    Json(request): Json<CreateMetricConfigurationRequest>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let kid = KalibroConfigurationId(kid);
    kalibro_configuration_owner(&*state.catalog.read().await, &user, kid)?;

    let metric = find_metric(&state, &request.selection).await?;
    let params = request.metric_configuration;

    let mut catalog = state.catalog.write().await;
    // The collector lookup ran without the lock; check again under the write guard.
    kalibro_configuration_owner(&catalog, &user, kid)?;
    let saved = params
        .build(kid, metric.clone())
        .and_then(|new| catalog.create_metric_configuration(new));

    match saved {
        Ok(mc) => {
            tracing::info!(
                metric_configuration = %mc.id,
                kalibro_configuration = %kid,
                metric = %mc.metric.code,
                "Metric configuration created"
            );
            Ok(Redirection::to(paths::kalibro_configuration_path(kid))
                .notice(CREATED)
                .into())
        }
        Err(MezuroError::Invalid(errors)) => {
            let locals = form_locals(&catalog, kid, &metric, &params, &errors)?;
            Ok(View::new(NEW, locals).unprocessable().into())
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET .../metric_configurations/{id}`
pub async fn show(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Path((kid, id)): Path<(u64, u64)>,
) -> ActionResult {
    let kid = KalibroConfigurationId(kid);
    let catalog = state.catalog.read().await;
    let mc = find_under(&catalog, kid, MetricConfigurationId(id))?;

    let reading_group = catalog.reading_group(mc.reading_group_id)?;
    let mezuro_ranges = catalog
        .kalibro_ranges(mc.id)?
        .into_iter()
        .map(|range| {
            let reading = catalog.reading(range.reading_id)?;
            Ok(json!({ "mezuro_range": range, "reading": reading }))
        })
        .collect::<Result<Vec<Value>, MezuroError>>()?;

    Ok(View::new(
        SHOW,
        json!({
            "kalibro_configuration_id": kid,
            "metric_configuration": mc,
            "reading_group": reading_group,
            "mezuro_ranges": mezuro_ranges,
        }),
    )
    .with_flash(flash)
    .into())
}

/// `GET .../metric_configurations/{id}/edit`
pub async fn edit(
    State(state): State<AppState>,
    current: CurrentUser,
    flash: IncomingFlash,
    Path((kid, id)): Path<(u64, u64)>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let (kid, id) = (KalibroConfigurationId(kid), MetricConfigurationId(id));
    let catalog = state.catalog.read().await;
    metric_configuration_owner(&catalog, &user, kid, id)?;

    let mc = find_under(&catalog, kid, id)?;
    Ok(View::new(EDIT, edit_locals(&catalog, kid, json!(mc), &[])?)
        .with_flash(flash)
        .into())
}

/// `PUT|PATCH|POST .../metric_configurations/{id}`
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((kid, id)): Path<(u64, u64)>,
    Json(request): Json<UpdateMetricConfigurationRequest>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let (kid, id) = (KalibroConfigurationId(kid), MetricConfigurationId(id));
    let mut catalog = state.catalog.write().await;
    metric_configuration_owner(&catalog, &user, kid, id)?;

    let params = request.metric_configuration;
    let updated = params
        .changes()
        .and_then(|changes| catalog.update_metric_configuration(id, changes));

    match updated {
        Ok(mc) => {
            tracing::info!(metric_configuration = %mc.id, "Metric configuration updated");
            Ok(Redirection::to(paths::kalibro_configuration_path(kid))
                .notice(UPDATED)
                .into())
        }
        Err(MezuroError::Invalid(errors)) => {
            let stored = find_under(&catalog, kid, id)?;
            let submitted = with_submitted(&stored, &params);
            let locals = edit_locals(&catalog, kid, submitted, &errors)?;
            Ok(View::new(EDIT, locals).unprocessable().into())
        }
        Err(e) => Err(e.into()),
    }
}

/// `DELETE .../metric_configurations/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((kid, id)): Path<(u64, u64)>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let (kid, id) = (KalibroConfigurationId(kid), MetricConfigurationId(id));
    let mut catalog = state.catalog.write().await;
    metric_configuration_owner(&catalog, &user, kid, id)?;

    catalog.destroy_metric_configuration(id)?;
    tracing::info!(metric_configuration = %id, "Metric configuration destroyed");
    Ok(Redirection::to(paths::kalibro_configuration_path(kid)).into())
}

// =============================================================================
// HELPERS
// =============================================================================

async fn render_new(
    state: &AppState,
    current: CurrentUser,
    flash: IncomingFlash,
    kid: KalibroConfigurationId,
    selection: &MetricSelection,
) -> ActionResult {
    let user = authenticate_user(current)?;
    kalibro_configuration_owner(&*state.catalog.read().await, &user, kid)?;

    let metric = find_metric(state, selection).await?;
    let catalog = state.catalog.read().await;
    let locals = form_locals(
        &catalog,
        kid,
        &metric,
        &MetricConfigurationParams::blank(),
        &[],
    )?;
    Ok(View::new(NEW, locals).with_flash(flash).into())
}

async fn find_metric(state: &AppState, selection: &MetricSelection) -> Result<Metric, Halt> {
    let collector = state
        .collectors
        .find(&selection.metric_collector_name)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!(
                "Metric collector not found: {}",
                selection.metric_collector_name
            ))
        })?;
    collector.metric(&selection.metric_name).ok_or_else(|| {
        ApiError::not_found(format!(
            "Metric not found: {} ({})",
            selection.metric_name, selection.metric_collector_name
        ))
        .into()
    })
}

fn find_under(
    catalog: &Catalog,
    kid: KalibroConfigurationId,
    id: MetricConfigurationId,
) -> Result<MetricConfiguration, ApiError> {
    catalog
        .metric_configuration(id)?
        .filter(|mc| mc.kalibro_configuration_id == kid)
        .ok_or_else(|| ApiError::not_found(format!("Metric Configuration not found: {id}")))
}

fn form_locals(
    catalog: &Catalog,
    kid: KalibroConfigurationId,
    metric: &Metric,
    form: &MetricConfigurationParams,
    errors: &[FieldError],
) -> Result<Value, MezuroError> {
    Ok(json!({
        "kalibro_configuration_id": kid,
        "metric_collector_name": metric.metric_collector_name,
        "metric": metric,
        "metric_configuration": form,
        "reading_groups": catalog.reading_groups()?,
        "aggregation_forms": AggregationForm::ALL,
        "errors": errors,
    }))
}

fn edit_locals(
    catalog: &Catalog,
    kid: KalibroConfigurationId,
    mc: Value,
    errors: &[FieldError],
) -> Result<Value, MezuroError> {
    Ok(json!({
        "kalibro_configuration_id": kid,
        "metric_configuration": mc,
        "reading_groups": catalog.reading_groups()?,
        "aggregation_forms": AggregationForm::ALL,
        "errors": errors,
    }))
}
