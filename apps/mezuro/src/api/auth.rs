//! # Authentication
//!
//! Users authenticate with the token handed out when their account was
//! created. A request presents it either way:
//!
//! ```text
//! Authorization: Bearer <token>
//! Cookie: _mezuro_session=<token>
//! ```
//!
//! The cookie is set by `POST /users/sign_in`. Only the BLAKE3 digest of
//! a token is ever stored.

use super::AppState;
use super::cookies;
use super::views::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use mezuro_core::User;

/// Token presented by the request, header first.
pub fn presented_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    bearer.or_else(|| cookies::read(headers, cookies::SESSION_COOKIE))
}

/// The signed-in user, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = presented_token(&parts.headers) else {
            return Ok(Self(None));
        };
        let user = state.catalog.read().await.authenticate(&token)?;
        if user.is_none() {
            tracing::warn!(
                event = "auth_failure",
                reason = "unknown_token",
                "Authentication failed: unknown token"
            );
        }
        Ok(Self(user))
    }
}

// =============================================================================
// TESTS
// =============================================================================
