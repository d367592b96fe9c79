//! # Middleware Module
//!
//! Global request rate limiting. The limit comes from `[security]
//! rate_limit` (or `MEZURO_RATE_LIMIT`); `0` turns the limiter off.
//!
//! With `[security] secure_cookies` every cookie the API sets is marked
//! `Secure`, the session and the flash alike.

use super::cookies;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Default rate limit: 100 requests per second.
const DEFAULT_RPS: NonZeroU32 = match NonZeroU32::new(100) {
    Some(rps) => rps,
    None => NonZeroU32::MIN,
};

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a global limiter allowing `requests_per_second`.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Returns 429 Too Many Requests once the limiter runs dry.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
        }
    }
}

/// Adds `Secure` to every `Set-Cookie` header of the response.
pub async fn secure_cookies_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let marked: Vec<HeaderValue> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| HeaderValue::from_str(&cookies::secure(value)).ok())
        .collect();
    if !marked.is_empty() {
        let headers = response.headers_mut();
        headers.remove(header::SET_COOKIE);
        for value in marked {
            headers.append(header::SET_COOKIE, value);
        }
    }
    response
}
