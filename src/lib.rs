//! ILA Match - local intelligence scoring and business matching for the Iluma CRM
//!
//! Scores a business profile from ten weighted sub-metrics, ranks other
//! registered businesses by partnership compatibility and generates
//! localized pitch text for a match.

pub mod config;
pub mod core;
pub mod models;
pub mod registry;
pub mod services;

// Re-export commonly used types
pub use crate::core::{ContentError, ContentGenerator, MatchEngine, ScoreEngine};
pub use models::{BusinessProfile, BusinessProfileInput, Locale, MatchResult, MatchStatus, ScoreResult, Trend};
pub use registry::{RegistryError, RegistryStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        assert_eq!(crate::core::classify_trend(80), Trend::Up);
        assert_eq!("en".parse::<Locale>(), Ok(Locale::En));
    }
}
