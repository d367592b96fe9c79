//! Kalibro configurations: the parents every metric configuration hangs
//! from, and the landing page of redirects.

use super::authenticate_user;
use crate::api::auth::CurrentUser;
use crate::api::flash::IncomingFlash;
use crate::api::types::CreateKalibroConfigurationRequest;
use crate::api::views::{ActionResult, ApiError, Redirection, View};
use crate::api::{AppState, paths};
use axum::Json;
use axum::extract::{Path, State};
use mezuro_core::{KalibroConfigurationId, MezuroError, NewKalibroConfiguration};
use serde_json::json;

pub const CREATED: &str = "Kalibro Configuration was successfully created.";

/// `GET /kalibro_configurations`
pub async fn index(State(state): State<AppState>, flash: IncomingFlash) -> ActionResult {
    let kalibro_configurations = state.catalog.read().await.kalibro_configurations()?;
    Ok(View::new(
        "kalibro_configurations/index",
        json!({ "kalibro_configurations": kalibro_configurations }),
    )
    .with_flash(flash)
    .into())
}

/// `GET /kalibro_configurations/{id}`
pub async fn show(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Path(id): Path<u64>,
) -> ActionResult {
    let id = KalibroConfigurationId(id);
    let catalog = state.catalog.read().await;
    let configuration = catalog
        .kalibro_configuration(id)?
        .ok_or_else(|| ApiError::not_found(format!("Kalibro Configuration not found: {id}")))?;
    let metric_configurations = catalog.metric_configurations_of(id)?;
    Ok(View::new(
        "kalibro_configurations/show",
        json!({
            "kalibro_configuration": configuration,
            "metric_configurations": metric_configurations,
        }),
    )
    .with_flash(flash)
    .into())
}

/// `POST /kalibro_configurations`; the signed-in user becomes the owner.
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateKalibroConfigurationRequest>,
) -> ActionResult {
    let user = authenticate_user(current)?;
    let params = request.kalibro_configuration;

    let saved = state
        .catalog
        .write()
        .await
        .create_kalibro_configuration(NewKalibroConfiguration {
            name: params.name.trim().to_string(),
            description: params.description.clone(),
            owner: user.id,
            public: params.public,
        });

    match saved {
        Ok(configuration) => {
            tracing::info!(
                kalibro_configuration = %configuration.id,
                owner = %user.id,
                "Kalibro configuration created"
            );
            Ok(Redirection::to(paths::kalibro_configuration_path(configuration.id))
                .notice(CREATED)
                .into())
        }
        Err(MezuroError::Invalid(errors)) => Ok(View::new(
            "kalibro_configurations/new",
            json!({ "kalibro_configuration": params, "errors": errors }),
        )
        .unprocessable()
        .into()),
        Err(e) => Err(e.into()),
    }
}
