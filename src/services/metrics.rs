use crate::models::{BusinessProfileInput, MetricKey};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A sub-metric could not be measured
///
/// Never surfaced past the score engine, which substitutes a neutral default.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("metric provider unavailable: {0}")]
    Unavailable(String),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    #[error("{metric} timed out after {after_ms}ms")]
    Timeout { metric: MetricKey, after_ms: u128 },
}

/// Source of the ten ILA sub-metrics
///
/// Every method returns a value in 0-100. Website-derived metrics are only
/// requested when the business has a website, and listing completeness only
/// when it has a listing URL.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn traffic(&self, website: &str) -> Result<u8, MetricError>;
    async fn backlinks(&self, website: &str) -> Result<u8, MetricError>;
    async fn page_speed(&self, website: &str) -> Result<u8, MetricError>;
    async fn user_experience(&self, website: &str) -> Result<u8, MetricError>;
    async fn content_quality(&self, website: &str) -> Result<u8, MetricError>;
    async fn technical_seo(&self, website: &str) -> Result<u8, MetricError>;
    async fn listing_completeness(&self, listing_url: &str) -> Result<u8, MetricError>;
    async fn local_visibility(&self, profile: &BusinessProfileInput) -> Result<u8, MetricError>;
    async fn social_signals(&self, profile: &BusinessProfileInput) -> Result<u8, MetricError>;
    /// Higher means less competitive pressure
    async fn competitive_pressure(&self, profile: &BusinessProfileInput) -> Result<u8, MetricError>;
}

pub type DynMetricsProvider = Arc<dyn MetricsProvider>;

/// Returns the same value for every metric. Used offline and in demos.
#[derive(Debug, Clone, Copy)]
pub struct StaticMetricsProvider {
    value: u8,
}

impl StaticMetricsProvider {
    pub fn new(value: u8) -> Self {
        Self { value: value.min(100) }
    }
}

#[async_trait]
impl MetricsProvider for StaticMetricsProvider {
    async fn traffic(&self, _website: &str) -> Result<u8, MetricError> {
        Ok(self.value)
    }
    async fn backlinks(&self, _website: &str) -> Result<u8, MetricError> {
        Ok(self.value)
    }
    async fn page_speed(&self, _website: &str) -> Result<u8, MetricError> {
        Ok(self.value)
    }
    async fn user_experience(&self, _website: &str) -> Result<u8, MetricError> {
        Ok(self.value)
    }
    async fn content_quality(&self, _website: &str) -> Result<u8, MetricError> {
        Ok(self.value)
    }
    async fn technical_seo(&self, _website: &str) -> Result<u8, MetricError> {
        Ok(self.value)
    }
    async fn listing_completeness(&self, _listing_url: &str) -> Result<u8, MetricError> {
        Ok(self.value)
    }
    async fn local_visibility(&self, _profile: &BusinessProfileInput) -> Result<u8, MetricError> {
        Ok(self.value)
    }
    async fn social_signals(&self, _profile: &BusinessProfileInput) -> Result<u8, MetricError> {
        Ok(self.value)
    }
    async fn competitive_pressure(&self, _profile: &BusinessProfileInput) -> Result<u8, MetricError> {
        Ok(self.value)
    }
}

#[derive(Debug, Deserialize)]
struct MetricValue {
    value: f64,
}

/// Metrics gateway client
///
/// Queries `GET {base_url}/metrics/{metric}?target={target}`, which answers
/// `{"value": <0-100>}`. Successful lookups are kept in an in-memory TTL cache
/// keyed by metric and target.
pub struct HttpMetricsProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
    cache: moka::future::Cache<String, u8>,
}

impl HttpMetricsProvider {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        request_timeout: Duration,
        cache_capacity: u64,
        cache_ttl: Duration,
    ) -> Result<Self, MetricError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        let cache = moka::future::CacheBuilder::new(cache_capacity)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            base_url,
            api_key,
            client,
            cache,
        })
    }

    /// Number of cached lookups
    pub fn cached_entries(&self) -> u64 {
        self.cache.entry_count()
    }

    async fn fetch(&self, metric: MetricKey, target: &str) -> Result<u8, MetricError> {
        let cache_key = format!("{}:{}", metric, target);
        if let Some(value) = self.cache.get(&cache_key).await {
            tracing::trace!("Metric cache hit: {}", cache_key);
            return Ok(value);
        }

        let url = format!(
            "{}/metrics/{}?target={}",
            self.base_url.trim_end_matches('/'),
            metric,
            urlencoding::encode(target)
        );

        tracing::debug!("Fetching {} from: {}", metric, url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(MetricError::Unavailable(format!(
                "{} returned {}",
                metric,
                response.status()
            )));
        }

        let body: MetricValue = response
            .json()
            .await
            .map_err(|e| MetricError::InvalidResponse(format!("{}: {}", metric, e)))?;

        if !body.value.is_finite() {
            return Err(MetricError::InvalidResponse(format!(
                "{}: non-finite value",
                metric
            )));
        }

        let value = body.value.round().clamp(0.0, 100.0) as u8;
        self.cache.insert(cache_key, value).await;
        Ok(value)
    }
}

fn locality_target(profile: &BusinessProfileInput) -> String {
    format!("{}, {}", profile.name, profile.address)
}

#[async_trait]
impl MetricsProvider for HttpMetricsProvider {
    async fn traffic(&self, website: &str) -> Result<u8, MetricError> {
        self.fetch(MetricKey::Traffic, website).await
    }
    async fn backlinks(&self, website: &str) -> Result<u8, MetricError> {
        self.fetch(MetricKey::Backlinks, website).await
    }
    async fn page_speed(&self, website: &str) -> Result<u8, MetricError> {
        self.fetch(MetricKey::PageSpeed, website).await
    }
    async fn user_experience(&self, website: &str) -> Result<u8, MetricError> {
        self.fetch(MetricKey::Ux, website).await
    }
    async fn content_quality(&self, website: &str) -> Result<u8, MetricError> {
        self.fetch(MetricKey::ContentQuality, website).await
    }
    async fn technical_seo(&self, website: &str) -> Result<u8, MetricError> {
        self.fetch(MetricKey::TechnicalSeo, website).await
    }
    async fn listing_completeness(&self, listing_url: &str) -> Result<u8, MetricError> {
        self.fetch(MetricKey::ListingCompleteness, listing_url).await
    }
    async fn local_visibility(&self, profile: &BusinessProfileInput) -> Result<u8, MetricError> {
        self.fetch(MetricKey::LocalVisibility, &locality_target(profile)).await
    }
    async fn social_signals(&self, profile: &BusinessProfileInput) -> Result<u8, MetricError> {
        let target = profile.website.clone().unwrap_or_else(|| profile.name.clone());
        self.fetch(MetricKey::SocialSignals, &target).await
    }
    async fn competitive_pressure(&self, profile: &BusinessProfileInput) -> Result<u8, MetricError> {
        let target = format!("{}@{}", profile.sector, profile.address);
        self.fetch(MetricKey::CompetitivePressure, &target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: String) -> HttpMetricsProvider {
        HttpMetricsProvider::new(
            base_url,
            Some("test_key".to_string()),
            Duration::from_secs(5),
            100,
            Duration::from_secs(60),
        )
        .expect("client")
    }

    #[tokio::test]
    async fn test_fetches_and_caches_metric() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/metrics/traffic")
            .match_query(mockito::Matcher::UrlEncoded(
                "target".into(),
                "https://chezlou.example".into(),
            ))
            .match_header("authorization", "Bearer test_key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"value": 72.6}"#)
            .expect(1)
            .create_async()
            .await;

        let provider = provider(server.url());

        assert_eq!(provider.traffic("https://chezlou.example").await.unwrap(), 73);
        // Served from cache, so the mock is only hit once
        assert_eq!(provider.traffic("https://chezlou.example").await.unwrap(), 73);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_out_of_range_value_is_clamped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/metrics/pageSpeed")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"value": 180}"#)
            .create_async()
            .await;

        let provider = provider(server.url());
        assert_eq!(provider.page_speed("https://a.example").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/metrics/backlinks")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let provider = provider(server.url());
        let err = provider.backlinks("https://a.example").await.unwrap_err();
        assert!(matches!(err, MetricError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/metrics/localVisibility")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"score": 12}"#)
            .create_async()
            .await;

        let provider = provider(server.url());
        let input = BusinessProfileInput::new("Chez Lou", "restaurant", "12 rue Mont-Royal");
        let err = provider.local_visibility(&input).await.unwrap_err();
        assert!(matches!(err, MetricError::InvalidResponse(_)));
    }

    #[test]
    fn test_static_provider_clamps() {
        let provider = StaticMetricsProvider::new(200);
        let value = tokio_test::block_on(provider.traffic("https://a.example")).unwrap();
        assert_eq!(value, 100);
    }
}
