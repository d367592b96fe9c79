//! Sign in and sign out.

use crate::api::cookies;
use crate::api::flash::IncomingFlash;
use crate::api::types::SignInRequest;
use crate::api::views::{ActionResult, Redirection, View};
use crate::api::{AppState, paths};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use mezuro_core::token_matches;
use serde_json::json;

pub const SIGNED_IN: &str = "Signed in successfully.";
pub const SIGNED_OUT: &str = "Signed out successfully.";
pub const INVALID_CREDENTIALS: &str = "Invalid email or token.";

const NEW: &str = "sessions/new";

/// `GET /users/sign_in`
pub async fn new(flash: IncomingFlash) -> ActionResult {
    Ok(View::new(NEW, json!({})).with_flash(flash).into())
}

/// `POST /users/sign_in` with `{email, token}`.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> ActionResult {
    let user = state.catalog.read().await.user_by_email(&request.email)?;
    match user.filter(|u| token_matches(u, &request.token)) {
        Some(user) => {
            tracing::info!(user = %user.id, "User signed in");
            Ok(Redirection::to(paths::kalibro_configurations_path())
                .notice(SIGNED_IN)
                .cookie(cookies::set(cookies::SESSION_COOKIE, &request.token))
                .into())
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_credentials",
                "Sign in failed"
            );
            Ok(View::new(NEW, json!({ "email": request.email }))
                .with_status(StatusCode::UNAUTHORIZED)
                .with_alert(INVALID_CREDENTIALS)
                .into())
        }
    }
}

/// `DELETE /users/sign_out`
pub async fn destroy() -> ActionResult {
    Ok(Redirection::to(paths::kalibro_configurations_path())
        .notice(SIGNED_OUT)
        .cookie(cookies::expire(cookies::SESSION_COOKIE))
        .into())
}
