// Service exports
pub mod language_model;
pub mod metrics;

pub use language_model::{DisabledTextGenerator, DynTextGenerator, OpenAiTextGenerator, TemplateTextGenerator, TextGenerationError, TextGenerator};
pub use metrics::{DynMetricsProvider, HttpMetricsProvider, MetricError, MetricsProvider, StaticMetricsProvider};

use crate::config::{ContentSettings, ScoringSettings};
use std::sync::Arc;
use std::time::Duration;

/// Build the metrics provider named by `settings.provider`
///
/// Unknown names fall back to the static provider with a warning.
pub fn build_metrics_provider(settings: &ScoringSettings) -> Result<DynMetricsProvider, MetricError> {
    match settings.provider.as_str() {
        "http" => {
            let endpoint = settings.endpoint.clone().ok_or_else(|| {
                MetricError::Unavailable("scoring.endpoint is required for the http provider".into())
            })?;
            let provider = HttpMetricsProvider::new(
                endpoint,
                settings.api_key.clone(),
                Duration::from_millis(settings.metric_timeout_ms),
                settings.cache_capacity,
                Duration::from_secs(settings.cache_ttl_secs),
            )?;
            Ok(Arc::new(provider))
        }
        "static" => Ok(Arc::new(StaticMetricsProvider::new(settings.static_value))),
        other => {
            tracing::warn!("Unknown metrics provider {:?}, using static values", other);
            Ok(Arc::new(StaticMetricsProvider::new(settings.static_value)))
        }
    }
}

/// Build the text generator named by `settings.provider`
///
/// Unknown names disable content generation rather than guessing.
pub fn build_text_generator(settings: &ContentSettings) -> Result<DynTextGenerator, TextGenerationError> {
    match settings.provider.as_str() {
        "openai" => {
            let generator = OpenAiTextGenerator::new(
                settings.endpoint.clone(),
                settings.api_key.clone().unwrap_or_default(),
                settings.model.clone(),
                Duration::from_secs(settings.timeout_secs),
            )?;
            Ok(Arc::new(generator))
        }
        "template" => Ok(Arc::new(TemplateTextGenerator)),
        "disabled" => Ok(Arc::new(DisabledTextGenerator)),
        other => {
            tracing::warn!("Unknown content provider {:?}, content generation disabled", other);
            Ok(Arc::new(DisabledTextGenerator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_provider_requires_endpoint() {
        let settings = ScoringSettings {
            provider: "http".to_string(),
            ..ScoringSettings::default()
        };
        assert!(build_metrics_provider(&settings).is_err());
    }

    #[test]
    fn test_openai_without_key_fails() {
        let settings = ContentSettings {
            provider: "openai".to_string(),
            ..ContentSettings::default()
        };
        assert!(matches!(
            build_text_generator(&settings),
            Err(TextGenerationError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_unknown_content_provider_is_disabled() {
        let settings = ContentSettings {
            provider: "gpt-magic".to_string(),
            ..ContentSettings::default()
        };
        let generator = build_text_generator(&settings).unwrap();
        assert_eq!(generator.provider_name(), "disabled");
    }
}
