use crate::core::{
    distance::{distance_between, proximity_score},
    sectors::{sector_relation, SectorRelation},
};
use crate::models::{BusinessProfile, MatchResult, MatchWeights};

/// Geo factor used when either business has no coordinates
pub const NEUTRAL_GEO_FACTOR: f64 = 0.5;

/// Score proximity at or above which "comparable maturity" is a synergy
const MATURITY_SYNERGY_THRESHOLD: f64 = 0.75;

/// The three factors behind a compatibility value, each in 0-1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchFactors {
    pub score_proximity: f64,
    pub sector: SectorRelation,
    /// Distance in km, when both sides have coordinates
    pub distance_km: Option<f64>,
    pub geo: f64,
}

/// Compatibility of one pair of businesses
#[derive(Debug, Clone, PartialEq)]
pub struct Compatibility {
    pub score: u8,
    pub synergies: Vec<String>,
    pub factors: MatchFactors,
}

/// Pairwise business matching
///
/// compatibility = round(100 * (
///     score_proximity * 0.40 +   # closer ILA scores = comparable maturity
///     sector          * 0.35 +   # complementary > unrelated > same sector
///     geo             * 0.25     # closer = higher, neutral without coordinates
/// ))
///
/// Symmetric in its two arguments and non-decreasing in each factor.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    weights: MatchWeights,
    geo_radius_km: f64,
    min_compatibility: u8,
    max_matches: usize,
}

impl MatchEngine {
    pub fn new(weights: MatchWeights, geo_radius_km: f64, min_compatibility: u8, max_matches: usize) -> Self {
        Self {
            weights: weights.normalized(),
            geo_radius_km,
            min_compatibility,
            max_matches,
        }
    }

    pub fn with_default_weights() -> Self {
        Self::new(MatchWeights::default(), 50.0, 0, 20)
    }

    pub fn weights(&self) -> MatchWeights {
        self.weights
    }

    /// Factor values for a pair. The pair is put in id order first so both
    /// argument orders run the exact same arithmetic.
    pub fn factors(&self, a: &BusinessProfile, b: &BusinessProfile) -> MatchFactors {
        let (first, second) = if a.id <= b.id { (a, b) } else { (b, a) };

        let gap = (first.overall_score() as f64 - second.overall_score() as f64).abs();
        let score_proximity = (1.0 - gap / 100.0).clamp(0.0, 1.0);

        let sector = sector_relation(&first.sector, &second.sector);

        let distance_km = match (&first.coordinates, &second.coordinates) {
            (Some(p), Some(q)) => Some(distance_between(p, q)),
            _ => None,
        };
        let geo = distance_km
            .map(|d| proximity_score(d, self.geo_radius_km))
            .unwrap_or(NEUTRAL_GEO_FACTOR);

        MatchFactors {
            score_proximity,
            sector,
            distance_km,
            geo,
        }
    }

    /// Blend factor values into a 0-100 compatibility
    pub fn blend(&self, factors: &MatchFactors) -> u8 {
        let raw = factors.score_proximity * self.weights.score_proximity
            + factors.sector.factor() * self.weights.sector
            + factors.geo * self.weights.geo;

        (raw * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Compatibility and synergies of `a` with `b`, worded from `a`'s side
    pub fn compatibility(&self, a: &BusinessProfile, b: &BusinessProfile) -> Compatibility {
        let factors = self.factors(a, b);
        let score = self.blend(&factors);

        let mut synergies = Vec::new();

        if factors.score_proximity >= MATURITY_SYNERGY_THRESHOLD {
            push_unique(
                &mut synergies,
                format!(
                    "Comparable digital maturity (ILA {} vs {})",
                    a.overall_score(),
                    b.overall_score()
                ),
            );
        }

        match factors.sector {
            SectorRelation::Complementary => push_unique(
                &mut synergies,
                format!("Complementary sectors: {} and {}", a.sector, b.sector),
            ),
            SectorRelation::Unrelated => {
                push_unique(&mut synergies, "Non-competing sectors".to_string())
            }
            SectorRelation::Same => {}
        }

        if let Some(distance) = factors.distance_km {
            if factors.geo >= 0.5 {
                push_unique(
                    &mut synergies,
                    format!("Nearby locations ({:.1} km apart)", distance),
                );
            }
        }

        Compatibility {
            score,
            synergies,
            factors,
        }
    }

    /// Rank every candidate in `pool` against `target`
    ///
    /// The target itself is skipped. Results are ordered by descending
    /// compatibility, then ascending candidate id.
    pub fn find_matches<'a, I>(&self, target: &BusinessProfile, pool: I) -> Vec<MatchResult>
    where
        I: IntoIterator<Item = &'a BusinessProfile>,
    {
        let mut ranked: Vec<(u8, &'a BusinessProfile, Vec<String>)> = pool
            .into_iter()
            .filter(|candidate| candidate.id != target.id)
            .filter_map(|candidate| {
                let compat = self.compatibility(target, candidate);
                if compat.score >= self.min_compatibility {
                    Some((compat.score, candidate, compat.synergies))
                } else {
                    None
                }
            })
            .collect();

        // Sort by compatibility (descending) and then by candidate id (ascending)
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        ranked.truncate(self.max_matches);

        tracing::debug!("Found {} matches for {}", ranked.len(), target.id);

        ranked
            .into_iter()
            .map(|(score, candidate, synergies)| {
                MatchResult::computed(&target.id, &candidate.id, score, synergies)
            })
            .collect()
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}
