use crate::models::{BusinessProfileInput, MetricKey, ScoreMetrics, ScoreResult, Trend};
use crate::services::metrics::{DynMetricsProvider, MetricError};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, warn};

/// Substituted when a provider fails or times out
pub const NEUTRAL_METRIC_DEFAULT: u8 = 50;

/// Overall score above which the trend is `up`
pub const TREND_UP_THRESHOLD: u8 = 75;
/// Overall score below which the trend is `down`
pub const TREND_DOWN_THRESHOLD: u8 = 60;

/// Value used when the input needed to measure a metric is absent
///
/// A business without a website or listing gets low values for what those
/// would have measured, never the neutral default.
pub const fn missing_input_default(key: MetricKey) -> u8 {
    match key {
        MetricKey::Traffic => 10,
        MetricKey::Backlinks => 5,
        MetricKey::PageSpeed => 10,
        MetricKey::Ux => 10,
        MetricKey::ContentQuality => 10,
        MetricKey::TechnicalSeo => 10,
        MetricKey::ListingCompleteness => 10,
        // Always measurable from name, sector and address
        MetricKey::LocalVisibility | MetricKey::SocialSignals | MetricKey::CompetitivePressure => {
            NEUTRAL_METRIC_DEFAULT
        }
    }
}

/// Weighted sum of the ten metrics, rounded to 0-100
///
/// score = round(
///     traffic * 0.15 + backlinks * 0.12 + page_speed * 0.10 + ux * 0.08 +
///     listing_completeness * 0.20 + local_visibility * 0.15 +
///     content_quality * 0.08 + technical_seo * 0.07 +
///     social_signals * 0.03 + competitive_pressure * 0.02
/// )
pub fn weighted_overall(metrics: &ScoreMetrics) -> u8 {
    let total: f64 = MetricKey::ALL
        .iter()
        .map(|key| metrics.get(*key) as f64 * key.weight())
        .sum();

    total.round().clamp(0.0, 100.0) as u8
}

#[inline]
pub fn classify_trend(overall_score: u8) -> Trend {
    if overall_score > TREND_UP_THRESHOLD {
        Trend::Up
    } else if overall_score < TREND_DOWN_THRESHOLD {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Build a score result from already-collected metrics
pub fn score_from_metrics(metrics: ScoreMetrics, degraded_metrics: Vec<MetricKey>) -> ScoreResult {
    let overall_score = weighted_overall(&metrics);

    ScoreResult {
        overall_score,
        metrics,
        trend: classify_trend(overall_score),
        trend_percentage: None,
        computed_at: Utc::now(),
        degraded_metrics,
    }
}

/// Computes ILA scores from an injected metrics provider
///
/// A failing or slow provider never aborts the calculation: the affected
/// metric falls back to [`NEUTRAL_METRIC_DEFAULT`] and is listed in
/// `degraded_metrics`.
#[derive(Clone)]
pub struct ScoreEngine {
    provider: DynMetricsProvider,
    metric_timeout: Duration,
}

impl ScoreEngine {
    pub fn new(provider: DynMetricsProvider, metric_timeout: Duration) -> Self {
        Self {
            provider,
            metric_timeout,
        }
    }

    pub async fn compute_score(&self, profile: &BusinessProfileInput) -> ScoreResult {
        let mut metrics = ScoreMetrics::default();
        let mut degraded = Vec::new();

        // One metric at a time; a business never fans out to the providers
        for key in MetricKey::ALL {
            let value = match self.measure(key, profile).await {
                Ok(Some(value)) => value,
                Ok(None) => {
                    degraded.push(key);
                    missing_input_default(key)
                }
                Err(e) => {
                    warn!("Metric {} unavailable for {}: {}", key, profile.name, e);
                    degraded.push(key);
                    NEUTRAL_METRIC_DEFAULT
                }
            };
            metrics.set(key, value);
        }

        let result = score_from_metrics(metrics, degraded);
        debug!(
            "Scored {}: {} ({:?}, {} degraded metrics)",
            profile.name,
            result.overall_score,
            result.trend,
            result.degraded_metrics.len()
        );
        result
    }

    /// `Ok(None)` when the input the metric depends on is absent
    async fn measure(
        &self,
        key: MetricKey,
        profile: &BusinessProfileInput,
    ) -> Result<Option<u8>, MetricError> {
        let provider = &self.provider;
        let website = profile.website.as_deref();

        let request = match key {
            MetricKey::Traffic => website.map(|url| provider.traffic(url)),
            MetricKey::Backlinks => website.map(|url| provider.backlinks(url)),
            MetricKey::PageSpeed => website.map(|url| provider.page_speed(url)),
            MetricKey::Ux => website.map(|url| provider.user_experience(url)),
            MetricKey::ContentQuality => website.map(|url| provider.content_quality(url)),
            MetricKey::TechnicalSeo => website.map(|url| provider.technical_seo(url)),
            MetricKey::ListingCompleteness => profile
                .business_listing_url
                .as_deref()
                .map(|url| provider.listing_completeness(url)),
            MetricKey::LocalVisibility => Some(provider.local_visibility(profile)),
            MetricKey::SocialSignals => Some(provider.social_signals(profile)),
            MetricKey::CompetitivePressure => Some(provider.competitive_pressure(profile)),
        };

        let Some(request) = request else {
            return Ok(None);
        };

        match tokio::time::timeout(self.metric_timeout, request).await {
            Ok(result) => result.map(|value| Some(value.min(100))),
            Err(_) => Err(MetricError::Timeout {
                metric: key,
                after_ms: self.metric_timeout.as_millis(),
            }),
        }
    }
}
