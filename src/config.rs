use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::MatchWeights;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub content: ContentSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    /// "static" or "http"
    #[serde(default = "default_metrics_provider")]
    pub provider: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Value every metric takes with the static provider
    #[serde(default = "default_static_value")]
    pub static_value: u8,
    #[serde(default = "default_metric_timeout_ms")]
    pub metric_timeout_ms: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            provider: default_metrics_provider(),
            endpoint: None,
            api_key: None,
            static_value: default_static_value(),
            metric_timeout_ms: default_metric_timeout_ms(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_metrics_provider() -> String { "static".to_string() }
fn default_static_value() -> u8 { 50 }
fn default_metric_timeout_ms() -> u64 { 3000 }
fn default_cache_capacity() -> u64 { 1000 }
fn default_cache_ttl_secs() -> u64 { 3600 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default)]
    pub weights: MatchWeightsConfig,
    #[serde(default)]
    pub min_compatibility: u8,
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
    #[serde(default = "default_geo_radius_km")]
    pub geo_radius_km: f64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            weights: MatchWeightsConfig::default(),
            min_compatibility: 0,
            max_matches: default_max_matches(),
            geo_radius_km: default_geo_radius_km(),
        }
    }
}

fn default_max_matches() -> usize { 20 }
fn default_geo_radius_km() -> f64 { 50.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchWeightsConfig {
    #[serde(default = "default_score_proximity_weight")]
    pub score_proximity: f64,
    #[serde(default = "default_sector_weight")]
    pub sector: f64,
    #[serde(default = "default_geo_weight")]
    pub geo: f64,
}

impl Default for MatchWeightsConfig {
    fn default() -> Self {
        Self {
            score_proximity: default_score_proximity_weight(),
            sector: default_sector_weight(),
            geo: default_geo_weight(),
        }
    }
}

impl MatchWeightsConfig {
    pub fn to_match_weights(&self) -> MatchWeights {
        MatchWeights {
            score_proximity: self.score_proximity,
            sector: self.sector,
            geo: self.geo,
        }
    }
}

fn default_score_proximity_weight() -> f64 { 0.40 }
fn default_sector_weight() -> f64 { 0.35 }
fn default_geo_weight() -> f64 { 0.25 }

#[derive(Debug, Clone, Deserialize)]
pub struct ContentSettings {
    /// "openai", "template" or "disabled"
    #[serde(default = "default_content_provider")]
    pub provider: String,
    #[serde(default = "default_content_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_content_model")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default = "default_content_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_word_budget")]
    pub word_budget: usize,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            provider: default_content_provider(),
            endpoint: default_content_endpoint(),
            model: default_content_model(),
            api_key: None,
            timeout_secs: default_content_timeout_secs(),
            word_budget: default_word_budget(),
        }
    }
}

fn default_content_provider() -> String { "disabled".to_string() }
fn default_content_endpoint() -> String { crate::services::language_model::DEFAULT_OPENAI_ENDPOINT.to_string() }
fn default_content_model() -> String { crate::services::language_model::DEFAULT_OPENAI_MODEL.to_string() }
fn default_content_timeout_secs() -> u64 { 20 }
fn default_word_budget() -> usize { crate::core::content::DEFAULT_WORD_BUDGET }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ILA__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ILA__CONTENT__PROVIDER -> content.provider
            .add_source(
                Environment::with_prefix("ILA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("ILA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

/// Pick up provider credentials from their conventional variables
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let openai_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
    let metrics_key = env::var("ILA_METRICS_API_KEY").ok().filter(|k| !k.is_empty());

    let mut builder = Config::builder().add_source(settings);

    if let Some(key) = openai_key {
        builder = builder.set_default("content.api_key", key)?;
    }
    if let Some(key) = metrics_key {
        builder = builder.set_default("scoring.api_key", key)?;
    }

    builder.build()
}
