//! # Views and Outcomes
//!
//! A controller action ends in one of two ways:
//!
//! - `Render`: a JSON view model `{template, flash, locals}`
//! - `Redirect`: `303 See Other` with an optional flash for the next page
//!
//! `Halt` stops an action early, either with an outcome (a before-filter
//! redirect) or with an `ApiError`.

use super::cookies;
use super::flash::{Flash, IncomingFlash};
use crate::collector::CollectorError;
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use mezuro_core::{FieldError, MezuroError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// =============================================================================
// RENDERED VIEWS
// =============================================================================

/// Body of every rendered view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub template: String,
    #[serde(default)]
    pub flash: Flash,
    pub locals: Value,
}

/// A template with its locals.
#[derive(Debug, Clone)]
pub struct View {
    status: StatusCode,
    template: &'static str,
    locals: Value,
    flash: Flash,
}

impl View {
    pub fn new(template: &'static str, locals: Value) -> Self {
        Self {
            status: StatusCode::OK,
            template,
            locals,
            flash: Flash::default(),
        }
    }

    /// Show (and consume) the flash left by the previous redirect.
    #[must_use]
    pub fn with_flash(mut self, incoming: IncomingFlash) -> Self {
        self.flash = incoming.0;
        self
    }

    /// Re-render of a form whose submission failed validation.
    #[must_use]
    pub fn unprocessable(mut self) -> Self {
        self.status = StatusCode::UNPROCESSABLE_ENTITY;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_alert(mut self, alert: impl Into<String>) -> Self {
        self.flash.alert = Some(alert.into());
        self
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        let consumed = !self.flash.is_empty();
        let body = ViewResponse {
            template: self.template.to_string(),
            flash: self.flash,
            locals: self.locals,
        };
        let mut response = (self.status, Json(body)).into_response();
        if consumed {
            append_cookie(&mut response, &cookies::expire(cookies::FLASH_COOKIE));
        }
        response
    }
}

// =============================================================================
// REDIRECTS
// =============================================================================

/// A `303 See Other` to `location`.
#[derive(Debug, Clone)]
pub struct Redirection {
    location: String,
    flash: Flash,
    set_cookies: Vec<String>,
}

impl Redirection {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            flash: Flash::default(),
            set_cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn notice(mut self, message: impl Into<String>) -> Self {
        self.flash.notice = Some(message.into());
        self
    }

    #[must_use]
    pub fn alert(mut self, message: impl Into<String>) -> Self {
        self.flash.alert = Some(message.into());
        self
    }

    /// Attach an extra `Set-Cookie` header.
    #[must_use]
    pub fn cookie(mut self, set_cookie: String) -> Self {
        self.set_cookies.push(set_cookie);
        self
    }
}

impl IntoResponse for Redirection {
    fn into_response(self) -> Response {
        let mut response = StatusCode::SEE_OTHER.into_response();
        match HeaderValue::from_str(&self.location) {
            Ok(location) => {
                response.headers_mut().insert(header::LOCATION, location);
            }
            Err(e) => {
                tracing::error!("Unencodable redirect location '{}': {}", self.location, e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
        if !self.flash.is_empty() {
            append_cookie(
                &mut response,
                &cookies::set(cookies::FLASH_COOKIE, &self.flash.encode()),
            );
        }
        for cookie in &self.set_cookies {
            append_cookie(&mut response, cookie);
        }
        response
    }
}

fn append_cookie(response: &mut Response, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// How an action ended.
#[derive(Debug, Clone)]
pub enum Outcome {
    Render(View),
    Redirect(Redirection),
}

impl From<View> for Outcome {
    fn from(view: View) -> Self {
        Self::Render(view)
    }
}

impl From<Redirection> for Outcome {
    fn from(redirect: Redirection) -> Self {
        Self::Redirect(redirect)
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Self::Render(view) => view.into_response(),
            Self::Redirect(redirect) => redirect.into_response(),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// JSON body of error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// Failures that end a request without a view.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed")]
    Unprocessable(Vec<FieldError>),

    #[error("{0}")]
    Collector(#[from] CollectorError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl From<MezuroError> for ApiError {
    fn from(err: MezuroError) -> Self {
        match err {
            MezuroError::NotFound { .. } => Self::NotFound(err.to_string()),
            MezuroError::Invalid(errors) => Self::Unprocessable(errors),
            MezuroError::Storage(_) | MezuroError::Serialization(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Collector(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        }
        let error = self.to_string();
        let errors = match self {
            Self::Unprocessable(errors) => errors,
            _ => Vec::new(),
        };
        (status, Json(ErrorResponse { error, errors })).into_response()
    }
}

/// Early exit from an action.
#[derive(Debug)]
pub enum Halt {
    Outcome(Outcome),
    Error(ApiError),
}

impl From<Redirection> for Halt {
    fn from(redirect: Redirection) -> Self {
        Self::Outcome(Outcome::Redirect(redirect))
    }
}

impl From<ApiError> for Halt {
    fn from(err: ApiError) -> Self {
        Self::Error(err)
    }
}

impl From<MezuroError> for Halt {
    fn from(err: MezuroError) -> Self {
        Self::Error(err.into())
    }
}

impl From<CollectorError> for Halt {
    fn from(err: CollectorError) -> Self {
        Self::Error(err.into())
    }
}

impl IntoResponse for Halt {
    fn into_response(self) -> Response {
        match self {
            Self::Outcome(outcome) => outcome.into_response(),
            Self::Error(err) => err.into_response(),
        }
    }
}

/// Result of every controller action.
pub type ActionResult = Result<Outcome, Halt>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_sets_location_and_flash() {
        let response = Redirection::to("/kalibro_configurations/1")
            .notice("Metric Configuration was successfully created.")
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).map(|v| v.as_bytes()),
            Some(&b"/kalibro_configurations/1"[..])
        );
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(cookie.starts_with("_mezuro_flash="));
    }

    #[test]
    fn view_with_flash_clears_cookie() {
        let incoming = IncomingFlash(Flash {
            notice: Some("done".to_string()),
            alert: None,
        });
        let response = View::new("metric_configurations/show", Value::Null)
            .with_flash(incoming)
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::SET_COOKIE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|c| c.contains("Max-Age=0"))
        );
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            ApiError::not_found("x").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CollectorError::ConnectionFailed("x".to_string()))
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(MezuroError::Invalid(vec![])).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
