use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::{Film, ScoreBreakdown, UserQuery};

use super::features::{
    genre_score, language_score, people_bonus, period_score, PEOPLE_BONUS_CAP,
};
use super::normalize::{clamp, normalize};

/// Weights of the four blended signals. The people bonus is added unweighted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub semantic: f64,
    pub genre: f64,
    pub period: f64,
    pub language: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            semantic: 0.62,
            genre: 0.23,
            period: 0.07,
            language: 0.06,
        }
    }
}

impl Weights {
    pub const KEYS: [&'static str; 4] = ["semantic", "genre", "period", "language"];

    /// Builds weights from a signal-name mapping. Every key is required and
    /// unknown keys are rejected; values are not checked against any total.
    pub fn from_map(map: &HashMap<String, f64>) -> AppResult<Self> {
        if let Some(unknown) = map.keys().find(|k| !Self::KEYS.contains(&k.as_str())) {
            return Err(AppError::Config(format!("Unknown scoring weight: {}", unknown)));
        }

        let get = |key: &str| {
            map.get(key)
                .copied()
                .ok_or_else(|| AppError::Config(format!("Missing scoring weight: {}", key)))
        };

        Ok(Self {
            semantic: get("semantic")?,
            genre: get("genre")?,
            period: get("period")?,
            language: get("language")?,
        })
    }

    /// Parses `name=value` pairs separated by commas
    pub fn parse(overrides: &str) -> AppResult<Self> {
        let mut map = HashMap::new();
        for pair in overrides.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| AppError::Config(format!("Malformed scoring weight: {}", pair)))?;
            let value = value.trim().parse::<f64>().map_err(|e| {
                AppError::Config(format!("Invalid value for weight {}: {}", key.trim(), e))
            })?;
            map.insert(key.trim().to_string(), value);
        }
        Self::from_map(&map)
    }

    pub fn sum(&self) -> f64 {
        self.semantic + self.genre + self.period + self.language
    }
}

/// Scores one film against the user's query.
///
/// Sub-scores are clamped to their ranges before blending and the final score is
/// clamped to [0, 1]: the unweighted bonus can push the blend above 1.
pub fn aggregate(
    raw_similarity: f64,
    film: &Film,
    query: &UserQuery,
    weights: &Weights,
) -> ScoreBreakdown {
    let semantic = normalize(raw_similarity);
    let genre = clamp(genre_score(film.category.genre, &query.preferences), 0.0, 1.0);
    let period = clamp(period_score(query.period, film.year), 0.0, 1.0);
    let language = clamp(language_score(query.language, film.language_tag()), 0.0, 1.0);
    let bonus = clamp(
        people_bonus(&query.directors, &query.actors, film),
        0.0,
        PEOPLE_BONUS_CAP,
    );

    let blended = weights.semantic * semantic
        + weights.genre * genre
        + weights.period * period
        + weights.language * language;

    ScoreBreakdown {
        semantic,
        genre,
        period,
        language,
        people_bonus: bonus,
        final_score: clamp(blended + bonus, 0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Category, FilmId, Genre, GenrePreferences, LanguageBucket, PeriodBucket,
    };

    fn film() -> Film {
        Film {
            id: FilmId::Numeric(1),
            title: "Heat".to_string(),
            category: Category::from("Thriller".to_string()),
            description: "Un braqueur et un flic".to_string(),
            keywords: "braquage, Los Angeles".to_string(),
            year: Some(1995),
            language: Some("English".to_string()),
            director: Some("Michael Mann".to_string()),
            cast: Some("Al Pacino, Robert De Niro".to_string()),
        }
    }

    fn query() -> UserQuery {
        UserQuery {
            description: "braquage".to_string(),
            ambiance: "tendu".to_string(),
            directors: String::new(),
            actors: String::new(),
            period: PeriodBucket::EightiesNineties,
            language: LanguageBucket::English,
            preferences: GenrePreferences::new().with(Genre::Thriller, 5),
        }
    }

    #[test]
    fn test_default_weights_sum_close_to_one() {
        assert!((Weights::default().sum() - 0.98).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_blends_signals() {
        let breakdown = aggregate(0.0, &film(), &query(), &Weights::default());
        assert_eq!(breakdown.semantic, 0.5);
        assert_eq!(breakdown.genre, 1.0);
        assert_eq!(breakdown.period, 1.0);
        assert_eq!(breakdown.language, 1.0);
        assert_eq!(breakdown.people_bonus, 0.0);
        let expected = 0.62 * 0.5 + 0.23 + 0.07 + 0.06;
        assert!((breakdown.final_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_final_clamped_at_maximum() {
        let mut q = query();
        q.directors = "Michael Mann".to_string();
        q.actors = "Al Pacino".to_string();

        let breakdown = aggregate(1.0, &film(), &q, &Weights::default());
        assert_eq!(breakdown.people_bonus, PEOPLE_BONUS_CAP);
        assert_eq!(breakdown.final_score, 1.0);
    }

    #[test]
    fn test_final_clamped_with_drifting_weights() {
        let heavy = Weights {
            semantic: 3.0,
            genre: 2.0,
            period: 1.0,
            language: 1.0,
        };
        let breakdown = aggregate(0.9, &film(), &query(), &heavy);
        assert_eq!(breakdown.final_score, 1.0);

        let negative = Weights {
            semantic: -1.0,
            genre: -1.0,
            period: -1.0,
            language: -1.0,
        };
        let breakdown = aggregate(0.9, &film(), &query(), &negative);
        assert_eq!(breakdown.final_score, 0.0);
    }

    #[test]
    fn test_raw_similarity_out_of_range() {
        let breakdown = aggregate(1.7, &film(), &query(), &Weights::default());
        assert_eq!(breakdown.semantic, 1.0);
        assert!((0.0..=1.0).contains(&breakdown.final_score));
    }

    #[test]
    fn test_weights_from_map_requires_every_key() {
        let mut map: HashMap<String, f64> = Weights::KEYS
            .iter()
            .map(|k| (k.to_string(), 0.25))
            .collect();
        assert!(Weights::from_map(&map).is_ok());

        map.remove("period");
        assert!(matches!(Weights::from_map(&map), Err(AppError::Config(_))));
    }

    #[test]
    fn test_weights_from_map_rejects_unknown_key() {
        let mut map: HashMap<String, f64> = Weights::KEYS
            .iter()
            .map(|k| (k.to_string(), 0.25))
            .collect();
        map.insert("popularity".to_string(), 0.1);
        assert!(matches!(Weights::from_map(&map), Err(AppError::Config(_))));
    }

    #[test]
    fn test_weights_parse() {
        let weights = Weights::parse("semantic=0.5, genre=0.3,period=0.1 ,language=0.1").unwrap();
        assert_eq!(weights.semantic, 0.5);
        assert_eq!(weights.genre, 0.3);
        assert!(Weights::parse("semantic:0.5").is_err());
        assert!(Weights::parse("semantic=abc,genre=1,period=1,language=1").is_err());
    }
}
