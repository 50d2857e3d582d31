use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::requests::BusinessProfileInput;

/// Geographic coordinates in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// The ten sub-metrics that make up an ILA score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    Traffic,
    Backlinks,
    PageSpeed,
    Ux,
    ListingCompleteness,
    LocalVisibility,
    ContentQuality,
    TechnicalSeo,
    SocialSignals,
    CompetitivePressure,
}

impl MetricKey {
    pub const ALL: [MetricKey; 10] = [
        MetricKey::Traffic,
        MetricKey::Backlinks,
        MetricKey::PageSpeed,
        MetricKey::Ux,
        MetricKey::ListingCompleteness,
        MetricKey::LocalVisibility,
        MetricKey::ContentQuality,
        MetricKey::TechnicalSeo,
        MetricKey::SocialSignals,
        MetricKey::CompetitivePressure,
    ];

    /// Fixed contribution of this metric to the overall score.
    /// The ten weights sum to 1.0.
    pub const fn weight(self) -> f64 {
        match self {
            MetricKey::Traffic => 0.15,
            MetricKey::Backlinks => 0.12,
            MetricKey::PageSpeed => 0.10,
            MetricKey::Ux => 0.08,
            MetricKey::ListingCompleteness => 0.20,
            MetricKey::LocalVisibility => 0.15,
            MetricKey::ContentQuality => 0.08,
            MetricKey::TechnicalSeo => 0.07,
            MetricKey::SocialSignals => 0.03,
            MetricKey::CompetitivePressure => 0.02,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MetricKey::Traffic => "traffic",
            MetricKey::Backlinks => "backlinks",
            MetricKey::PageSpeed => "pageSpeed",
            MetricKey::Ux => "ux",
            MetricKey::ListingCompleteness => "listingCompleteness",
            MetricKey::LocalVisibility => "localVisibility",
            MetricKey::ContentQuality => "contentQuality",
            MetricKey::TechnicalSeo => "technicalSeo",
            MetricKey::SocialSignals => "socialSignals",
            MetricKey::CompetitivePressure => "competitivePressure",
        }
    }

    /// Whether the metric can only be measured from a website
    pub const fn requires_website(self) -> bool {
        matches!(
            self,
            MetricKey::Traffic
                | MetricKey::Backlinks
                | MetricKey::PageSpeed
                | MetricKey::Ux
                | MetricKey::ContentQuality
                | MetricKey::TechnicalSeo
        )
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-shape set of sub-scores, each 0-100
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub traffic: u8,
    pub backlinks: u8,
    #[serde(rename = "pageSpeed")]
    pub page_speed: u8,
    pub ux: u8,
    #[serde(rename = "listingCompleteness")]
    pub listing_completeness: u8,
    #[serde(rename = "localVisibility")]
    pub local_visibility: u8,
    #[serde(rename = "contentQuality")]
    pub content_quality: u8,
    #[serde(rename = "technicalSeo")]
    pub technical_seo: u8,
    #[serde(rename = "socialSignals")]
    pub social_signals: u8,
    #[serde(rename = "competitivePressure")]
    pub competitive_pressure: u8,
}

impl ScoreMetrics {
    /// Every metric set to the same value
    pub fn uniform(value: u8) -> Self {
        let mut metrics = Self::default();
        for key in MetricKey::ALL {
            metrics.set(key, value);
        }
        metrics
    }

    pub fn get(&self, key: MetricKey) -> u8 {
        match key {
            MetricKey::Traffic => self.traffic,
            MetricKey::Backlinks => self.backlinks,
            MetricKey::PageSpeed => self.page_speed,
            MetricKey::Ux => self.ux,
            MetricKey::ListingCompleteness => self.listing_completeness,
            MetricKey::LocalVisibility => self.local_visibility,
            MetricKey::ContentQuality => self.content_quality,
            MetricKey::TechnicalSeo => self.technical_seo,
            MetricKey::SocialSignals => self.social_signals,
            MetricKey::CompetitivePressure => self.competitive_pressure,
        }
    }

    /// Set a metric, clamping to 100
    pub fn set(&mut self, key: MetricKey, value: u8) {
        let value = value.min(100);
        let slot = match key {
            MetricKey::Traffic => &mut self.traffic,
            MetricKey::Backlinks => &mut self.backlinks,
            MetricKey::PageSpeed => &mut self.page_speed,
            MetricKey::Ux => &mut self.ux,
            MetricKey::ListingCompleteness => &mut self.listing_completeness,
            MetricKey::LocalVisibility => &mut self.local_visibility,
            MetricKey::ContentQuality => &mut self.content_quality,
            MetricKey::TechnicalSeo => &mut self.technical_seo,
            MetricKey::SocialSignals => &mut self.social_signals,
            MetricKey::CompetitivePressure => &mut self.competitive_pressure,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Computed ILA score of a business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    #[serde(rename = "overallScore")]
    pub overall_score: u8,
    pub metrics: ScoreMetrics,
    pub trend: Trend,
    /// Always `None` for now: a real percentage needs a historical score
    /// series, which the registry does not keep.
    #[serde(rename = "trendPercentage")]
    pub trend_percentage: Option<f64>,
    #[serde(rename = "computedAt")]
    pub computed_at: DateTime<Utc>,
    /// Metrics whose value is a substituted default rather than a measurement
    #[serde(rename = "degradedMetrics", default)]
    pub degraded_metrics: Vec<MetricKey>,
}

/// A registered business with its computed score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub id: String,
    pub name: String,
    pub sector: String,
    pub address: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(rename = "businessListingUrl", default)]
    pub business_listing_url: Option<String>,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    pub score: ScoreResult,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl BusinessProfile {
    /// Assign an id to a scored input
    pub fn register(input: BusinessProfileInput, score: ScoreResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            sector: input.sector,
            address: input.address,
            website: input.website,
            business_listing_url: input.business_listing_url,
            coordinates: input.coordinates,
            score,
            created_at: Utc::now(),
        }
    }

    /// The descriptive attributes, as they were supplied at registration
    pub fn to_input(&self) -> BusinessProfileInput {
        BusinessProfileInput {
            name: self.name.clone(),
            sector: self.sector.clone(),
            address: self.address.clone(),
            website: self.website.clone(),
            business_listing_url: self.business_listing_url.clone(),
            coordinates: self.coordinates,
        }
    }

    pub fn overall_score(&self) -> u8 {
        self.score.overall_score
    }
}

/// Lifecycle of a match's generated content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    Computed,
    ContentRequested,
    ContentReady,
    ContentFailed,
}

/// Compatibility between two registered businesses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: String,
    #[serde(rename = "businessId")]
    pub business_id: String,
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
    pub compatibility: u8,
    pub synergies: Vec<String>,
    #[serde(default)]
    pub pitch: Option<String>,
    #[serde(rename = "callToAction", default)]
    pub call_to_action: Option<String>,
    #[serde(default)]
    pub locale: Option<Locale>,
    #[serde(rename = "contentProvider", default)]
    pub content_provider: Option<String>,
    pub status: MatchStatus,
    #[serde(rename = "contentError", default)]
    pub content_error: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl MatchResult {
    pub fn computed(
        business_id: &str,
        candidate_id: &str,
        compatibility: u8,
        synergies: Vec<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            candidate_id: candidate_id.to_string(),
            compatibility: compatibility.min(100),
            synergies,
            pitch: None,
            call_to_action: None,
            locale: None,
            content_provider: None,
            status: MatchStatus::Computed,
            content_error: None,
            created_at: Utc::now(),
        }
    }

    pub fn involves(&self, business_id: &str) -> bool {
        self.business_id == business_id || self.candidate_id == business_id
    }

    /// The other side of the match, seen from `business_id`
    pub fn counterpart_of(&self, business_id: &str) -> Option<&str> {
        if self.business_id == business_id {
            Some(&self.candidate_id)
        } else if self.candidate_id == business_id {
            Some(&self.business_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported locale: {0}")]
pub struct UnsupportedLocale(pub String);

/// Languages content can be generated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Fr,
    En,
    Es,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Fr, Locale::En, Locale::Es];

    pub const fn as_str(self) -> &'static str {
        match self {
            Locale::Fr => "fr",
            Locale::En => "en",
            Locale::Es => "es",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "fr" => Ok(Locale::Fr),
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            _ => Err(UnsupportedLocale(tag.to_string())),
        }
    }
}

/// Blend of the three compatibility factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub score_proximity: f64,
    pub sector: f64,
    pub geo: f64,
}

impl MatchWeights {
    pub fn sum(&self) -> f64 {
        self.score_proximity + self.sector + self.geo
    }

    /// Rescale so the weights sum to 1. Non-positive or non-finite weights
    /// fall back to the defaults.
    pub fn normalized(self) -> Self {
        let parts = [self.score_proximity, self.sector, self.geo];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) || self.sum() <= 0.0 {
            return Self::default();
        }
        let total = self.sum();
        Self {
            score_proximity: self.score_proximity / total,
            sector: self.sector / total,
            geo: self.geo / total,
        }
    }
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            score_proximity: 0.40,
            sector: 0.35,
            geo: 0.25,
        }
    }
}
