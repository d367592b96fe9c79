//! # Request Handlers
//!
//! One module per controller. Every action that changes something runs the
//! same filter chain before doing any work:
//!
//! 1. `authenticate_user`: anonymous requests go to the sign-in page
//! 2. an ownership filter: other users are sent back to the configuration list
//!
//! Ownership is checked before anything is looked up, so a request against
//! a missing record reads as "not allowed". Actions that write check it
//! under the same write guard they mutate with.

pub mod kalibro_configurations;
pub mod metric_configurations;
pub mod mezuro_ranges;
pub mod sessions;

use super::auth::CurrentUser;
use super::paths;
use super::types::HealthResponse;
use super::views::{Halt, Redirection};
use axum::Json;
use axum::response::IntoResponse;
use mezuro_core::{Catalog, KalibroConfigurationId, MetricConfigurationId, User, ownership};
use serde::Serialize;
use serde_json::Value;

pub const SIGN_IN_REQUIRED: &str = "You need to sign in or sign up before continuing.";
pub const NOT_ALLOWED: &str = "You're not allowed to do this operation";

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// FILTERS
// =============================================================================

/// The signed-in user, or a redirect to the sign-in page.
pub fn authenticate_user(current: CurrentUser) -> Result<User, Halt> {
    current.0.ok_or_else(|| {
        Redirection::to(paths::new_user_session_path())
            .alert(SIGN_IN_REQUIRED)
            .into()
    })
}

/// Continue only if `user` owns the kalibro configuration.
pub fn kalibro_configuration_owner(
    catalog: &Catalog,
    user: &User,
    configuration: KalibroConfigurationId,
) -> Result<(), Halt> {
    if ownership::kalibro_configuration_owner(catalog, user, configuration)? {
        Ok(())
    } else {
        Err(not_allowed(user, configuration))
    }
}

/// Continue only if the metric configuration sits under `configuration`
/// and `user` owns that configuration.
pub fn metric_configuration_owner(
    catalog: &Catalog,
    user: &User,
    configuration: KalibroConfigurationId,
    metric_configuration: MetricConfigurationId,
) -> Result<(), Halt> {
    if ownership::metric_configuration_owner(catalog, user, configuration, metric_configuration)? {
        Ok(())
    } else {
        Err(not_allowed(user, configuration))
    }
}

fn not_allowed(user: &User, configuration: KalibroConfigurationId) -> Halt {
    tracing::warn!(
        event = "ownership_failure",
        user = %user.id,
        kalibro_configuration = %configuration,
        "User is not the owner"
    );
    Redirection::to(paths::kalibro_configurations_with_id_path(configuration))
        .notice(NOT_ALLOWED)
        .into()
}

/// `record` as JSON with the submitted form fields laid over it, for
/// re-rendering an edit form.
pub fn with_submitted<R: Serialize, F: Serialize>(record: &R, form: &F) -> Value {
    let mut merged = serde_json::to_value(record).unwrap_or_default();
    if let (Value::Object(target), Ok(Value::Object(fields))) =
        (&mut merged, serde_json::to_value(form))
    {
        target.extend(fields);
    }
    merged
}
