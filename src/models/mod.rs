// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{BusinessProfile, GeoPoint, Locale, MatchResult, MatchStatus, MatchWeights, MetricKey, ScoreMetrics, ScoreResult, Trend, UnsupportedLocale};
pub use requests::BusinessProfileInput;
pub use responses::{GeneratedContent, RegistrySnapshot};
