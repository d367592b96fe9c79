//! # Flash Messages
//!
//! A redirect may carry a `notice` or an `alert` for the next page. The
//! messages travel in the `_mezuro_flash` cookie (base64 of a small JSON
//! object) and are cleared by the first view that renders them.

use super::cookies;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Messages shown once on the next rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

impl Flash {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notice.is_none() && self.alert.is_none()
    }

    /// Cookie-safe encoding.
    #[must_use]
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Inverse of `encode`. Garbage decodes to an empty flash.
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        URL_SAFE_NO_PAD
            .decode(raw)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }
}

/// The flash left by the previous response, if any.
#[derive(Debug, Clone, Default)]
pub struct IncomingFlash(pub Flash);

impl<S: Send + Sync> FromRequestParts<S> for IncomingFlash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            cookies::read(&parts.headers, cookies::FLASH_COOKIE)
                .map(|raw| Flash::decode(&raw))
                .unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_survives_cookie_round_trip() {
        let flash = Flash {
            notice: Some("Range was successfully created.".to_string()),
            alert: None,
        };
        let encoded = flash.encode();
        assert!(!encoded.contains(';'));
        assert!(!encoded.contains('='));
        assert_eq!(Flash::decode(&encoded), flash);
    }

    #[test]
    fn garbage_is_an_empty_flash() {
        assert!(Flash::decode("%%%not-base64").is_empty());
        assert!(Flash::decode(&URL_SAFE_NO_PAD.encode(b"[1,2]")).is_empty());
    }
}
