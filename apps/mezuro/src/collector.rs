//! # Metric Collectors
//!
//! Metric collectors (Analizo, MetricFu, Radon, ...) describe the metrics
//! a metric configuration can be built from. They live in an external
//! processor service; this module is the seam to it.
//!
//! - `ProcessorClient` asks a processor service over HTTP
//! - `StaticCollectors` serves a fixed list read from the config file

use crate::config::CollectorsConfig;
use async_trait::async_trait;
use mezuro_core::MetricCollector;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from the collector layer.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Cannot reach the processor service.
    #[error("Cannot connect to metric collector service at {0}")]
    ConnectionFailed(String),

    /// The service answered with an unexpected status.
    #[error("Metric collector service error ({0}): {1}")]
    ServerError(u16, String),

    /// The response body was not what we expected.
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Source of metric collector details.
#[async_trait]
pub trait MetricCollectors: Send + Sync {
    /// Every known collector, sorted by name.
    async fn all(&self) -> Result<Vec<MetricCollector>, CollectorError>;

    /// A collector by name, or `None` when the service does not know it.
    async fn find(&self, name: &str) -> Result<Option<MetricCollector>, CollectorError>;
}

/// Build the collector source described by the config.
pub fn from_config(config: &CollectorsConfig) -> Result<Arc<dyn MetricCollectors>, CollectorError> {
    match &config.processor_url {
        Some(url) => {
            tracing::info!("Metric collectors served by {}", url);
            Ok(Arc::new(ProcessorClient::new(
                url,
                Duration::from_secs(config.timeout_secs),
            )?))
        }
        None => {
            tracing::info!(
                "Using {} statically configured metric collector(s)",
                config.collectors.len()
            );
            Ok(Arc::new(StaticCollectors::new(config.collectors.clone())))
        }
    }
}

// =============================================================================
// STATIC LIST
// =============================================================================

/// A fixed set of collectors.
#[derive(Debug, Clone, Default)]
pub struct StaticCollectors {
    collectors: Vec<MetricCollector>,
}

impl StaticCollectors {
    pub fn new(mut collectors: Vec<MetricCollector>) -> Self {
        collectors.sort_by(|a, b| a.name.cmp(&b.name));
        Self { collectors }
    }
}

#[async_trait]
impl MetricCollectors for StaticCollectors {
    async fn all(&self) -> Result<Vec<MetricCollector>, CollectorError> {
        Ok(self.collectors.clone())
    }

    async fn find(&self, name: &str) -> Result<Option<MetricCollector>, CollectorError> {
        Ok(self.collectors.iter().find(|c| c.name == name).cloned())
    }
}

// =============================================================================
// PROCESSOR SERVICE
// =============================================================================

#[derive(Deserialize)]
struct CollectorList {
    metric_collector_details: Vec<MetricCollector>,
}

#[derive(Deserialize)]
struct CollectorDetails {
    metric_collector_details: MetricCollector,
}

/// HTTP client for a processor service exposing
/// `GET /metric_collector_details` and `POST /metric_collector_details/find`.
#[derive(Clone)]
pub struct ProcessorClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProcessorClient {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CollectorError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollectorError::ConnectionFailed(format!("{base_url}: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.http.request(method, &url)
    }

    /// Send a request and handle connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, CollectorError> {
        req.send()
            .await
            .map_err(|e| CollectorError::ConnectionFailed(format!("{}: {e}", self.base_url)))
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, CollectorError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CollectorError::ServerError(status.as_u16(), body));
        }
        resp.json::<T>()
            .await
            .map_err(|e| CollectorError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl MetricCollectors for ProcessorClient {
    async fn all(&self) -> Result<Vec<MetricCollector>, CollectorError> {
        let req = self.request(reqwest::Method::GET, "/metric_collector_details");
        let resp = self.send(req).await?;
        let mut list: CollectorList = Self::parse(resp).await?;
        list.metric_collector_details
            .sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list.metric_collector_details)
    }

    async fn find(&self, name: &str) -> Result<Option<MetricCollector>, CollectorError> {
        let req = self
            .request(reqwest::Method::POST, "/metric_collector_details/find")
            .json(&serde_json::json!({ "name": name }));
        let resp = self.send(req).await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            tracing::debug!("Metric collector '{}' unknown to processor", name);
            return Ok(None);
        }
        let details: CollectorDetails = Self::parse(resp).await?;
        Ok(Some(details.metric_collector_details))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(name: &str) -> MetricCollector {
        MetricCollector {
            name: name.to_string(),
            description: String::new(),
            supported_metrics: Default::default(),
        }
    }

    #[tokio::test]
    async fn static_collectors_are_sorted_and_searchable() {
        let source = StaticCollectors::new(vec![collector("Radon"), collector("Analizo")]);
        let names: Vec<String> = source
            .all()
            .await
            .expect("all")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Analizo", "Radon"]);
        assert!(source.find("Radon").await.expect("find").is_some());
        assert!(source.find("MetricFu").await.expect("find").is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client =
            ProcessorClient::new("http://processor.test/", Duration::from_secs(1)).expect("client");
        assert_eq!(client.base_url, "http://processor.test");
    }
}
