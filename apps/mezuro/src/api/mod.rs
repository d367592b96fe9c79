//! # Mezuro HTTP API Module
//!
//! Controllers for kalibro configurations, their metric configurations and
//! the ranges of each metric configuration, served with axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET|POST /users/sign_in`, `DELETE /users/sign_out` - Sessions
//! - `GET|POST /kalibro_configurations`, `GET /kalibro_configurations/{kid}`
//! - `/kalibro_configurations/{kid}/metric_configurations/...`
//!   - `GET choose_metric`, `GET|POST new`, `POST` (create)
//!   - `GET {id}`, `GET {id}/edit`, `PUT|PATCH|POST {id}`, `DELETE {id}`
//! - `/kalibro_configurations/{kid}/metric_configurations/{mid}/mezuro_ranges/...`
//!   - `GET new`, `POST` (create), `GET {id}/edit`, `PUT|PATCH|POST {id}`, `DELETE {id}`
//!
//! ## Security Configuration
//!
//! - `[security] cors_origins` / `MEZURO_CORS_ORIGINS`: allowed origins, or `*` (default: localhost only)
//! - `[security] rate_limit` / `MEZURO_RATE_LIMIT`: requests per second (default: 100, 0 to disable)
//! - `[security] secure_cookies`: every `Set-Cookie` gets the `Secure` attribute

pub mod auth;
pub mod cookies;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod paths;
pub mod types;
pub mod views;

pub use middleware::create_rate_limiter;
pub use views::{ActionResult, ApiError, ErrorResponse, Halt, Outcome, Redirection, View, ViewResponse};

use crate::collector::MetricCollectors;
use crate::config::SecurityConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use handlers::{kalibro_configurations, metric_configurations, mezuro_ranges, sessions};
use mezuro_core::Catalog;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The catalog. Mutations hold the write lock for validate-and-save.
    pub catalog: Arc<RwLock<Catalog>>,
    /// Where metric collector details come from.
    pub collectors: Arc<dyn MetricCollectors>,
}

impl AppState {
    #[must_use]
    pub fn new(catalog: Catalog, collectors: Arc<dyn MetricCollectors>) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            collectors,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer.
///
/// - `None`: localhost only
/// - `["*"]`: every origin
/// - otherwise: the listed origins
fn build_cors_layer(origins: Option<&[String]>) -> CorsLayer {
    match origins {
        Some([only]) if only == "*" => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", origin);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();
            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

const METRIC_CONFIGURATIONS: &str = "/kalibro_configurations/{kalibro_configuration_id}/metric_configurations";
const MEZURO_RANGES: &str = "/kalibro_configurations/{kalibro_configuration_id}/metric_configurations/{metric_configuration_id}/mezuro_ranges";

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit, secure
/// cookies, rate limit.
pub fn create_router(state: AppState, security: &SecurityConfig) -> Router {
    let cors = build_cors_layer(security.cors_origins.as_deref());

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/users/sign_in",
            get(sessions::new).post(sessions::create),
        )
        .route("/users/sign_out", axum::routing::delete(sessions::destroy))
        .route(
            "/kalibro_configurations",
            get(kalibro_configurations::index).post(kalibro_configurations::create),
        )
        .route(
            "/kalibro_configurations/{kalibro_configuration_id}",
            get(kalibro_configurations::show),
        )
        .route(METRIC_CONFIGURATIONS, post(metric_configurations::create))
        .route(
            &format!("{METRIC_CONFIGURATIONS}/choose_metric"),
            get(metric_configurations::choose_metric),
        )
        .route(
            &format!("{METRIC_CONFIGURATIONS}/new"),
            get(metric_configurations::new).post(metric_configurations::new_with_selection),
        )
        .route(
            &format!("{METRIC_CONFIGURATIONS}/{{metric_configuration_id}}"),
            get(metric_configurations::show)
                .put(metric_configurations::update)
                .patch(metric_configurations::update)
                .post(metric_configurations::update)
                .delete(metric_configurations::destroy),
        )
        .route(
            &format!("{METRIC_CONFIGURATIONS}/{{metric_configuration_id}}/edit"),
            get(metric_configurations::edit),
        )
        .route(MEZURO_RANGES, post(mezuro_ranges::create))
        .route(&format!("{MEZURO_RANGES}/new"), get(mezuro_ranges::new))
        .route(
            &format!("{MEZURO_RANGES}/{{id}}"),
            axum::routing::put(mezuro_ranges::update)
                .patch(mezuro_ranges::update)
                .post(mezuro_ranges::update)
                .delete(mezuro_ranges::destroy),
        )
        .route(
            &format!("{MEZURO_RANGES}/{{id}}/edit"),
            get(mezuro_ranges::edit),
        );

    if security.rate_limit > 0 {
        tracing::info!(
            "Rate limiting enabled: {} requests/second",
            security.rate_limit
        );
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(security.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    if security.secure_cookies {
        router = router.layer(axum_middleware::from_fn(
            middleware::secure_cookies_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve `state` on `addr` until the process is stopped.
pub async fn run_server(
    addr: &str,
    state: AppState,
    security: &SecurityConfig,
) -> std::io::Result<()> {
    let router = create_router(state, security);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Mezuro HTTP server listening on {}", addr);

    axum::serve(listener, router).await
}
