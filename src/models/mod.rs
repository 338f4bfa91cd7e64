use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

mod film;
mod query;

pub use film::{Category, Film, FilmId, FilmSummary, Genre};
pub use query::{GenrePreferences, LanguageBucket, PeriodBucket, RecommendationRequest, UserQuery};

/// Per-signal scores of one film for one query
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Normalized semantic similarity, [0, 1]
    pub semantic: f64,
    /// Genre preference, [0, 1]
    pub genre: f64,
    /// Period match, [0, 1]
    pub period: f64,
    /// Language match, [0, 1]
    pub language: f64,
    /// Director/actor mention bonus, [0, 0.35]
    pub people_bonus: f64,
    /// Weighted blend plus bonus, clamped to [0, 1]
    #[serde(rename = "final")]
    pub final_score: f64,
}

/// A catalog film paired with its score breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult<'a> {
    pub film: &'a Film,
    pub breakdown: ScoreBreakdown,
}

impl RankedResult<'_> {
    pub fn final_score(&self) -> f64 {
        self.breakdown.final_score
    }
}

/// One recommended film as returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// 1-based position in the ranking
    pub rank: usize,
    pub film: FilmSummary,
    pub breakdown: ScoreBreakdown,
    pub final_score: f64,
    pub explanation: String,
}

/// Counters describing how much of the catalog was scored on real data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecommendationStats {
    /// Films scored (the whole catalog)
    pub considered: usize,
    /// Films whose category is outside the genre set
    pub unknown_category: usize,
    /// Films without a usable year
    pub unknown_year: usize,
    /// Films without a language tag
    pub unknown_language: usize,
    /// True when similarities fell back to neutral because embedding failed
    pub semantic_fallback: bool,
    /// Explanations replaced by the fallback sentence
    pub explanation_fallbacks: usize,
}

/// Response of the recommendation endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    /// Top-K recommendations, best first
    pub recommendations: Vec<Recommendation>,
    pub stats: RecommendationStats,
    /// Category label -> number of recommended films
    pub category_distribution: BTreeMap<String, usize>,
    /// Genre ratings submitted by the user
    pub genre_profile: BTreeMap<String, u8>,
    pub explainer: &'static str,
    pub generated_at: DateTime<Utc>,
}

/// Catalog statistics
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub films: usize,
    pub categories: Vec<String>,
    pub loaded_at: DateTime<Utc>,
}
