use serde::{Deserialize, Serialize};
use crate::models::domain::{BusinessProfile, MatchResult};

/// Export of the registry contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub businesses: Vec<BusinessProfile>,
    pub matches: Vec<MatchResult>,
    #[serde(rename = "exportedAt")]
    pub exported_at: chrono::DateTime<chrono::Utc>,
}

/// Generated pitch text for a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub pitch: String,
    #[serde(rename = "callToAction")]
    pub call_to_action: String,
    pub locale: crate::models::Locale,
    pub provider: String,
}
