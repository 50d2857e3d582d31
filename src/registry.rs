use crate::config::Settings;
use crate::core::{ContentError, ContentGenerator, MatchEngine, ScoreEngine};
use crate::models::{
    BusinessProfile, BusinessProfileInput, GeneratedContent, Locale, MatchResult, MatchStatus,
    RegistrySnapshot,
};
use crate::services::{
    build_metrics_provider, build_text_generator, MetricError, TextGenerationError,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use validator::ValidationErrors;

/// Errors surfaced by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("business not found: {0}")]
    BusinessNotFound(String),

    #[error("match not found: {0}")]
    MatchNotFound(String),

    #[error("invalid business profile: {0}")]
    InvalidInput(#[from] ValidationErrors),

    #[error("business {0} is already being rescored")]
    RescoreInProgress(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("metrics provider setup failed: {0}")]
    MetricsSetup(#[from] MetricError),

    #[error("text generator setup failed: {0}")]
    TextGenerationSetup(#[from] TextGenerationError),
}

#[derive(Default)]
struct RegistryState {
    businesses: HashMap<String, BusinessProfile>,
    business_order: Vec<String>,
    matches: HashMap<String, MatchResult>,
    match_order: Vec<String>,
}

impl RegistryState {
    fn business(&self, id: &str) -> Result<&BusinessProfile, RegistryError> {
        self.businesses
            .get(id)
            .ok_or_else(|| RegistryError::BusinessNotFound(id.to_string()))
    }

    fn insert_business(&mut self, profile: BusinessProfile) {
        if !self.businesses.contains_key(&profile.id) {
            self.business_order.push(profile.id.clone());
        }
        self.businesses.insert(profile.id.clone(), profile);
    }

    fn insert_matches(&mut self, matches: Vec<MatchResult>) {
        for m in matches {
            self.match_order.push(m.id.clone());
            self.matches.insert(m.id.clone(), m);
        }
    }

    fn remove_matches_involving(&mut self, business_id: &str) -> usize {
        let before = self.matches.len();
        self.matches.retain(|_, m| !m.involves(business_id));
        let matches = &self.matches;
        self.match_order.retain(|id| matches.contains_key(id));
        before - self.matches.len()
    }
}

/// In-memory collection of scored businesses and their matches
///
/// Constructed once per session and passed by reference. Network calls
/// (metrics, text generation) never run while the state lock is held; the
/// insert-and-match step of a registration runs under a single write lock,
/// so no reader ever sees a business without its matches.
pub struct RegistryStore {
    scorer: ScoreEngine,
    matcher: MatchEngine,
    content: ContentGenerator,
    content_timeout: Duration,
    state: RwLock<RegistryState>,
    rescoring: Mutex<HashSet<String>>,
}

/// Clears a business from the in-flight rescore set when dropped
struct RescoreGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    business_id: String,
}

impl Drop for RescoreGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        in_flight.remove(&self.business_id);
    }
}

/// Marks a match `ContentFailed` if a content request is dropped before
/// its outcome is stored
struct ContentRequestGuard<'a> {
    state: &'a RwLock<RegistryState>,
    match_id: &'a str,
    armed: bool,
}

impl ContentRequestGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ContentRequestGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Best effort: if the lock is busy the match stays `ContentRequested`,
        // which a later request overwrites.
        if let Ok(mut state) = self.state.try_write() {
            if let Some(stored) = state.matches.get_mut(self.match_id) {
                if stored.status == MatchStatus::ContentRequested {
                    stored.status = MatchStatus::ContentFailed;
                    stored.content_error = Some("content request cancelled".to_string());
                    warn!("Content request for match {} was cancelled", self.match_id);
                }
            }
        }
    }
}

impl RegistryStore {
    pub fn new(
        scorer: ScoreEngine,
        matcher: MatchEngine,
        content: ContentGenerator,
        content_timeout: Duration,
    ) -> Self {
        Self {
            scorer,
            matcher,
            content,
            content_timeout,
            state: RwLock::new(RegistryState::default()),
            rescoring: Mutex::new(HashSet::new()),
        }
    }

    /// Wire providers and engines from configuration
    pub fn from_settings(settings: &Settings) -> Result<Self, RegistryError> {
        let provider = build_metrics_provider(&settings.scoring)?;
        let text = build_text_generator(&settings.content)?;

        let scorer = ScoreEngine::new(
            provider,
            Duration::from_millis(settings.scoring.metric_timeout_ms),
        );
        let matcher = MatchEngine::new(
            settings.matching.weights.to_match_weights(),
            settings.matching.geo_radius_km,
            settings.matching.min_compatibility,
            settings.matching.max_matches,
        );
        let content = ContentGenerator::new(text, settings.content.word_budget);

        info!(
            "Registry initialized (metrics: {}, content: {}, match weights: {:?})",
            settings.scoring.provider,
            content.provider_name(),
            matcher.weights()
        );

        Ok(Self::new(
            scorer,
            matcher,
            content,
            Duration::from_secs(settings.content.timeout_secs),
        ))
    }

    /// Score a new business, store it and match it against the existing pool
    pub async fn add_business(
        &self,
        input: BusinessProfileInput,
    ) -> Result<BusinessProfile, RegistryError> {
        let input = input.normalized();
        input.check()?;

        let score = self.scorer.compute_score(&input).await;
        let profile = BusinessProfile::register(input, score);

        let mut state = self.state.write().await;
        let matches = self.matcher.find_matches(&profile, state.businesses.values());

        info!(
            "Registered business {} ({}) with ILA {} and {} matches",
            profile.id,
            profile.name,
            profile.overall_score(),
            matches.len()
        );

        state.insert_business(profile.clone());
        state.insert_matches(matches);

        Ok(profile)
    }

    pub async fn get_business(&self, business_id: &str) -> Result<BusinessProfile, RegistryError> {
        let state = self.state.read().await;
        state.business(business_id).cloned()
    }

    /// All businesses in registration order
    pub async fn list_businesses(&self) -> Vec<BusinessProfile> {
        let state = self.state.read().await;
        state
            .business_order
            .iter()
            .filter_map(|id| state.businesses.get(id).cloned())
            .collect()
    }

    /// Every match involving `business_id`, best first
    ///
    /// Ties are broken by ascending id of the other business.
    pub async fn get_matches(&self, business_id: &str) -> Result<Vec<MatchResult>, RegistryError> {
        let state = self.state.read().await;
        state.business(business_id)?;

        let mut matches: Vec<MatchResult> = state
            .matches
            .values()
            .filter(|m| m.involves(business_id))
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.compatibility.cmp(&a.compatibility).then_with(|| {
                a.counterpart_of(business_id)
                    .cmp(&b.counterpart_of(business_id))
            })
        });

        Ok(matches)
    }

    pub async fn get_match(&self, match_id: &str) -> Result<MatchResult, RegistryError> {
        let state = self.state.read().await;
        state
            .matches
            .get(match_id)
            .cloned()
            .ok_or_else(|| RegistryError::MatchNotFound(match_id.to_string()))
    }

    /// Generate pitch and call to action for a match with the configured timeout
    pub async fn request_content(
        &self,
        match_id: &str,
        locale: &str,
    ) -> Result<MatchResult, RegistryError> {
        self.request_content_with_timeout(match_id, locale, self.content_timeout)
            .await
    }

    /// Generate pitch and call to action for a match
    ///
    /// An unsupported locale fails before the match is touched. Any other
    /// failure, including hitting `timeout` or dropping the returned future,
    /// leaves the match in `ContentFailed` and can be retried.
    pub async fn request_content_with_timeout(
        &self,
        match_id: &str,
        locale: &str,
        timeout: Duration,
    ) -> Result<MatchResult, RegistryError> {
        let locale: Locale = locale.parse().map_err(ContentError::from)?;

        let (matched, source, candidate) = {
            let mut state = self.state.write().await;
            let matched = state
                .matches
                .get(match_id)
                .cloned()
                .ok_or_else(|| RegistryError::MatchNotFound(match_id.to_string()))?;
            let source = state.business(&matched.business_id)?.clone();
            let candidate = state.business(&matched.candidate_id)?.clone();

            if let Some(stored) = state.matches.get_mut(match_id) {
                stored.status = MatchStatus::ContentRequested;
            }
            (matched, source, candidate)
        };
        let mut guard = ContentRequestGuard {
            state: &self.state,
            match_id,
            armed: true,
        };

        let outcome = match tokio::time::timeout(
            timeout,
            self.content.generate(&matched, &source, &candidate, locale),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ContentError::Unavailable(format!(
                "timed out after {}ms",
                timeout.as_millis()
            ))),
        };

        let mut state = self.state.write().await;
        guard.disarm();
        // The match may have been replaced by a rescore in the meantime
        let stored = state
            .matches
            .get_mut(match_id)
            .ok_or_else(|| RegistryError::MatchNotFound(match_id.to_string()))?;

        match outcome {
            Ok(content) => {
                apply_content(stored, content);
                info!("Content ready for match {} ({})", match_id, locale);
                Ok(stored.clone())
            }
            Err(e) => {
                stored.status = MatchStatus::ContentFailed;
                stored.content_error = Some(e.to_string());
                warn!("Content generation failed for match {}: {}", match_id, e);
                Err(e.into())
            }
        }
    }

    /// Recompute a business' score and replace every match involving it
    pub async fn rescore_business(&self, business_id: &str) -> Result<BusinessProfile, RegistryError> {
        let _guard = self.begin_rescore(business_id)?;

        let input = {
            let state = self.state.read().await;
            state.business(business_id)?.to_input()
        };

        let score = self.scorer.compute_score(&input).await;

        let mut state = self.state.write().await;
        let profile = {
            let stored = state
                .businesses
                .get_mut(business_id)
                .ok_or_else(|| RegistryError::BusinessNotFound(business_id.to_string()))?;
            stored.score = score;
            stored.clone()
        };

        let removed = state.remove_matches_involving(business_id);
        let matches = self.matcher.find_matches(&profile, state.businesses.values());

        info!(
            "Rescored business {}: ILA {} ({} matches replaced by {})",
            business_id,
            profile.overall_score(),
            removed,
            matches.len()
        );

        state.insert_matches(matches);
        Ok(profile)
    }

    /// Every business and match, in insertion order
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.read().await;
        RegistrySnapshot {
            businesses: state
                .business_order
                .iter()
                .filter_map(|id| state.businesses.get(id).cloned())
                .collect(),
            matches: state
                .match_order
                .iter()
                .filter_map(|id| state.matches.get(id).cloned())
                .collect(),
            exported_at: chrono::Utc::now(),
        }
    }

    pub async fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot().await)
    }

    fn begin_rescore(&self, business_id: &str) -> Result<RescoreGuard<'_>, RegistryError> {
        let mut in_flight = self.rescoring.lock().unwrap_or_else(|p| p.into_inner());
        if !in_flight.insert(business_id.to_string()) {
            return Err(RegistryError::RescoreInProgress(business_id.to_string()));
        }
        Ok(RescoreGuard {
            in_flight: &self.rescoring,
            business_id: business_id.to_string(),
        })
    }
}

fn apply_content(stored: &mut MatchResult, content: GeneratedContent) {
    stored.pitch = Some(content.pitch);
    stored.call_to_action = Some(content.call_to_action);
    stored.locale = Some(content.locale);
    stored.content_provider = Some(content.provider);
    stored.content_error = None;
    stored.status = MatchStatus::ContentReady;
}
