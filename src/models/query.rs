use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

use super::Genre;

/// Release period selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PeriodBucket {
    #[default]
    #[serde(rename = "Peu importe")]
    NoPreference,
    #[serde(rename = "Classiques (avant 1980)")]
    Classics,
    #[serde(rename = "Années 80-90")]
    EightiesNineties,
    #[serde(rename = "Années 2000-2010")]
    TwoThousands,
    #[serde(rename = "Récents (2010+)")]
    Recent,
}

impl PeriodBucket {
    pub const ALL: [PeriodBucket; 5] = [
        PeriodBucket::NoPreference,
        PeriodBucket::Classics,
        PeriodBucket::EightiesNineties,
        PeriodBucket::TwoThousands,
        PeriodBucket::Recent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PeriodBucket::NoPreference => "Peu importe",
            PeriodBucket::Classics => "Classiques (avant 1980)",
            PeriodBucket::EightiesNineties => "Années 80-90",
            PeriodBucket::TwoThousands => "Années 2000-2010",
            PeriodBucket::Recent => "Récents (2010+)",
        }
    }
}

impl Display for PeriodBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PeriodBucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PeriodBucket::ALL
            .into_iter()
            .find(|b| b.label() == s.trim())
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown period: {}", s.trim())))
    }
}

/// Original language selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LanguageBucket {
    #[default]
    #[serde(rename = "Peu importe")]
    NoPreference,
    #[serde(rename = "Anglais")]
    English,
    #[serde(rename = "Français")]
    French,
    #[serde(rename = "Japonais (Animation)")]
    Japanese,
    #[serde(rename = "Autres")]
    Other,
}

impl LanguageBucket {
    pub const ALL: [LanguageBucket; 5] = [
        LanguageBucket::NoPreference,
        LanguageBucket::English,
        LanguageBucket::French,
        LanguageBucket::Japanese,
        LanguageBucket::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LanguageBucket::NoPreference => "Peu importe",
            LanguageBucket::English => "Anglais",
            LanguageBucket::French => "Français",
            LanguageBucket::Japanese => "Japonais (Animation)",
            LanguageBucket::Other => "Autres",
        }
    }
}

impl Display for LanguageBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LanguageBucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageBucket::ALL
            .into_iter()
            .find(|b| b.label() == s.trim())
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown language: {}", s.trim())))
    }
}

/// Likert ratings (1 to 5) per genre. Genres the user did not rate are absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenrePreferences(BTreeMap<Genre, u8>);

impl GenrePreferences {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a rating, rejecting values outside 1..=5
    pub fn rate(&mut self, genre: Genre, rating: i64) -> Result<(), AppError> {
        let rating = u8::try_from(rating)
            .ok()
            .filter(|r| (Self::MIN_RATING..=Self::MAX_RATING).contains(r))
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Rating for {} must be between {} and {}, got {}",
                    genre,
                    Self::MIN_RATING,
                    Self::MAX_RATING,
                    rating
                ))
            })?;
        self.0.insert(genre, rating);
        Ok(())
    }

    pub fn with(mut self, genre: Genre, rating: u8) -> Self {
        self.0.insert(genre, rating);
        self
    }

    pub fn get(&self, genre: Genre) -> Option<u8> {
        self.0.get(&genre).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ratings keyed by catalog label, in genre order
    pub fn profile(&self) -> BTreeMap<String, u8> {
        self.0
            .iter()
            .map(|(genre, rating)| (genre.label().to_string(), *rating))
            .collect()
    }
}

impl TryFrom<HashMap<String, i64>> for GenrePreferences {
    type Error = AppError;

    fn try_from(raw: HashMap<String, i64>) -> Result<Self, Self::Error> {
        let mut prefs = GenrePreferences::new();
        for (name, rating) in raw {
            let genre = name.parse::<Genre>()?;
            prefs.rate(genre, rating)?;
        }
        Ok(prefs)
    }
}

/// Raw questionnaire answers as sent by the client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "mood")]
    pub ambiance: String,
    #[serde(default, alias = "directors")]
    pub realisateurs: String,
    #[serde(default, alias = "actors")]
    pub acteurs: String,
    #[serde(default, alias = "period")]
    pub periode: PeriodBucket,
    #[serde(default, alias = "language")]
    pub langue: LanguageBucket,
    #[serde(default)]
    pub preferences: HashMap<String, i64>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Validated user query, built once per request
#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    pub description: String,
    pub ambiance: String,
    pub directors: String,
    pub actors: String,
    pub period: PeriodBucket,
    pub language: LanguageBucket,
    pub preferences: GenrePreferences,
}

impl UserQuery {
    /// Text sent to the similarity provider
    pub fn embedding_text(&self) -> String {
        [
            self.description.as_str(),
            self.ambiance.as_str(),
            self.directors.as_str(),
            self.actors.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl TryFrom<RecommendationRequest> for UserQuery {
    type Error = AppError;

    fn try_from(request: RecommendationRequest) -> Result<Self, Self::Error> {
        let description = request.description.trim().to_string();
        let ambiance = request.ambiance.trim().to_string();

        if description.is_empty() || ambiance.is_empty() {
            return Err(AppError::InvalidInput(
                "Both the film description and the desired ambiance are required".to_string(),
            ));
        }

        Ok(Self {
            description,
            ambiance,
            directors: request.realisateurs.trim().to_string(),
            actors: request.acteurs.trim().to_string(),
            period: request.periode,
            language: request.langue,
            preferences: GenrePreferences::try_from(request.preferences)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RecommendationRequest {
        RecommendationRequest {
            description: "  Un film plein de suspense ".to_string(),
            ambiance: "Sombre".to_string(),
            ..RecommendationRequest::default()
        }
    }

    #[test]
    fn test_period_bucket_labels_round_trip() {
        for bucket in PeriodBucket::ALL {
            assert_eq!(bucket.label().parse::<PeriodBucket>().unwrap(), bucket);
        }
        assert!("Années 70".parse::<PeriodBucket>().is_err());
    }

    #[test]
    fn test_language_bucket_serde() {
        let bucket: LanguageBucket = serde_json::from_str("\"Japonais (Animation)\"").unwrap();
        assert_eq!(bucket, LanguageBucket::Japanese);
        assert_eq!(serde_json::to_string(&LanguageBucket::Other).unwrap(), "\"Autres\"");
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let mut prefs = GenrePreferences::new();
        assert!(prefs.rate(Genre::Thriller, 0).is_err());
        assert!(prefs.rate(Genre::Thriller, 6).is_err());
        assert!(prefs.rate(Genre::Thriller, 5).is_ok());
        assert_eq!(prefs.get(Genre::Thriller), Some(5));
    }

    #[test]
    fn test_unknown_genre_rejected() {
        let raw = HashMap::from([("Western".to_string(), 3)]);
        assert!(matches!(
            GenrePreferences::try_from(raw),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_user_query_trims_and_defaults() {
        let query = UserQuery::try_from(request()).unwrap();
        assert_eq!(query.description, "Un film plein de suspense");
        assert_eq!(query.period, PeriodBucket::NoPreference);
        assert_eq!(query.language, LanguageBucket::NoPreference);
        assert!(query.preferences.is_empty());
    }

    #[test]
    fn test_missing_free_text_rejected() {
        let mut req = request();
        req.ambiance = "   ".to_string();
        assert!(matches!(
            UserQuery::try_from(req),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_embedding_text_skips_empty_parts() {
        let mut req = request();
        req.acteurs = "Alain Delon".to_string();
        let query = UserQuery::try_from(req).unwrap();
        assert_eq!(
            query.embedding_text(),
            "Un film plein de suspense Sombre Alain Delon"
        );
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{
            "description": "suspense",
            "ambiance": "sombre",
            "periode": "Années 80-90",
            "langue": "Anglais",
            "preferences": { "Thriller": 5, "Comédie": 1 }
        }"#;

        let req: RecommendationRequest = serde_json::from_str(json).unwrap();
        let query = UserQuery::try_from(req).unwrap();
        assert_eq!(query.period, PeriodBucket::EightiesNineties);
        assert_eq!(query.language, LanguageBucket::English);
        assert_eq!(query.preferences.get(Genre::Comedy), Some(1));
    }

    #[test]
    fn test_request_rejects_unknown_fields() {
        let json = r#"{ "description": "a", "ambiance": "b", "budget": 12 }"#;
        assert!(serde_json::from_str::<RecommendationRequest>(json).is_err());
    }
}
