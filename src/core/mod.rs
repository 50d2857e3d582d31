// Core algorithm exports
pub mod content;
pub mod distance;
pub mod matcher;
pub mod scoring;
pub mod sectors;

pub use content::{ContentError, ContentGenerator, ContentPrompt};
pub use distance::{distance_between, haversine_distance, proximity_score};
pub use matcher::{Compatibility, MatchEngine, MatchFactors};
pub use scoring::{classify_trend, weighted_overall, ScoreEngine};
pub use sectors::{sector_relation, SectorRelation};
