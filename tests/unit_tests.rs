// Unit tests for ILA Match

use ila_match::core::{
    distance::{haversine_distance, proximity_score},
    matcher::MatchEngine,
    scoring::{classify_trend, score_from_metrics, weighted_overall},
    sectors::{sector_relation, SectorRelation},
};
use ila_match::models::{BusinessProfile, BusinessProfileInput, MetricKey, ScoreMetrics, Trend};

fn create_business(id: &str, sector: &str, score: u8, coords: Option<(f64, f64)>) -> BusinessProfile {
    let mut input = BusinessProfileInput::new(format!("Business {}", id), sector, "Montréal");
    if let Some((lat, lon)) = coords {
        input = input.with_coordinates(lat, lon);
    }
    let mut profile = BusinessProfile::register(
        input,
        score_from_metrics(ScoreMetrics::uniform(score), vec![]),
    );
    profile.id = id.to_string();
    profile
}

fn fixed_pool() -> Vec<BusinessProfile> {
    vec![
        create_business("a", "restaurant", 82, Some((45.5186, -73.5832))),
        create_business("b", "retail", 61, Some((45.5166, -73.5790))),
        create_business("c", "restaurant", 45, None),
        create_business("d", "Fitness", 73, Some((45.4215, -75.6972))),
        create_business("e", "health", 90, Some((45.5300, -73.5700))),
        create_business("f", "legal", 12, None),
    ]
}

#[test]
fn test_weights_sum_to_one() {
    let total: f64 = MetricKey::ALL.iter().map(|k| k.weight()).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_overall_score_always_in_range() {
    for value in [0u8, 1, 37, 50, 99, 100, 255] {
        let score = weighted_overall(&ScoreMetrics::uniform(value));
        assert!(score <= 100, "score {} out of range for {}", score, value);
    }
}

#[test]
fn test_overall_matches_weighted_sum() {
    let mut metrics = ScoreMetrics::uniform(40);
    metrics.set(MetricKey::ListingCompleteness, 90);
    metrics.set(MetricKey::Traffic, 70);

    let expected: f64 = MetricKey::ALL
        .iter()
        .map(|k| metrics.get(*k) as f64 * k.weight())
        .sum();

    assert_eq!(weighted_overall(&metrics), expected.round() as u8);
}

#[test]
fn test_trend_classification_over_full_range() {
    for score in 0..=100u8 {
        let trend = classify_trend(score);
        if score > 75 {
            assert_eq!(trend, Trend::Up, "score {}", score);
        } else if score < 60 {
            assert_eq!(trend, Trend::Down, "score {}", score);
        } else {
            assert_eq!(trend, Trend::Stable, "score {}", score);
        }
    }
}

#[test]
fn test_sector_relation_symmetric() {
    let sectors = ["restaurant", "retail", "health", "fitness", "legal", "Real Estate"];
    for a in sectors {
        for b in sectors {
            assert_eq!(sector_relation(a, b), sector_relation(b, a), "{} / {}", a, b);
        }
    }
    assert_eq!(sector_relation("real_estate", "Construction"), SectorRelation::Complementary);
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(45.5017, -73.5673, 45.5017, -73.5673);
    assert!(distance < 0.01);
}

#[test]
fn test_proximity_beyond_radius_is_zero() {
    // Montréal to Ottawa is ~165 km
    let distance = haversine_distance(45.5017, -73.5673, 45.4215, -75.6972);
    assert_eq!(proximity_score(distance, 50.0), 0.0);
}

#[test]
fn test_compatibility_symmetric_over_pool() {
    let engine = MatchEngine::with_default_weights();
    let pool = fixed_pool();

    for a in &pool {
        for b in &pool {
            if a.id == b.id {
                continue;
            }
            assert_eq!(
                engine.compatibility(a, b).score,
                engine.compatibility(b, a).score,
                "asymmetric for {} / {}",
                a.id,
                b.id
            );
        }
    }
}

#[test]
fn test_compatibility_bounded() {
    let engine = MatchEngine::with_default_weights();
    let pool = fixed_pool();

    for a in &pool {
        for b in &pool {
            assert!(engine.compatibility(a, b).score <= 100);
        }
    }
}

#[test]
fn test_closer_scores_never_lower_compatibility() {
    let engine = MatchEngine::with_default_weights();
    let target = create_business("a", "restaurant", 80, None);

    let mut previous = 0;
    // Candidate score moves towards the target's, everything else fixed
    for score in (0..=80u8).step_by(5) {
        let candidate = create_business("b", "retail", score, None);
        let compat = engine.compatibility(&target, &candidate).score;
        assert!(compat >= previous, "compatibility dropped at score {}", score);
        previous = compat;
    }
}

#[test]
fn test_closer_location_never_lowers_compatibility() {
    let engine = MatchEngine::with_default_weights();
    let target = create_business("a", "restaurant", 70, Some((45.5, -73.6)));

    let mut previous = 0;
    for offset in [0.6, 0.4, 0.2, 0.1, 0.05, 0.0] {
        let candidate = create_business("b", "retail", 70, Some((45.5 + offset, -73.6)));
        let compat = engine.compatibility(&target, &candidate).score;
        assert!(compat >= previous, "compatibility dropped at offset {}", offset);
        previous = compat;
    }
}

#[test]
fn test_find_matches_never_includes_target() {
    let engine = MatchEngine::with_default_weights();
    let pool = fixed_pool();

    for target in &pool {
        let matches = engine.find_matches(target, &pool);
        assert_eq!(matches.len(), pool.len() - 1);
        assert!(matches.iter().all(|m| m.candidate_id != target.id));
    }
}

#[test]
fn test_find_matches_deterministic_order() {
    let engine = MatchEngine::with_default_weights();
    let pool = fixed_pool();

    let first: Vec<(String, u8)> = engine
        .find_matches(&pool[0], &pool)
        .into_iter()
        .map(|m| (m.candidate_id, m.compatibility))
        .collect();

    for _ in 0..5 {
        let again: Vec<(String, u8)> = engine
            .find_matches(&pool[0], &pool)
            .into_iter()
            .map(|m| (m.candidate_id, m.compatibility))
            .collect();
        assert_eq!(first, again);
    }

    for pair in first.windows(2) {
        assert!(pair[0].1 > pair[1].1 || (pair[0].1 == pair[1].1 && pair[0].0 < pair[1].0));
    }
}

#[test]
fn test_synergies_deduplicated() {
    let engine = MatchEngine::with_default_weights();
    let pool = fixed_pool();

    for a in &pool {
        for m in engine.find_matches(a, &pool) {
            let mut seen = std::collections::HashSet::new();
            assert!(m.synergies.iter().all(|s| seen.insert(s.clone())));
        }
    }
}
