use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// Identifier of a film in the catalog, numeric or textual depending on the source document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilmId {
    Numeric(u64),
    Text(String),
}

impl Display for FilmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilmId::Numeric(id) => write!(f, "{}", id),
            FilmId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// Fixed genre set shared by the catalog and the preference sliders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    Thriller,
    Romance,
    #[serde(rename = "Comédie")]
    Comedy,
    #[serde(rename = "Science-Fiction")]
    ScienceFiction,
    #[serde(rename = "Drame")]
    Drama,
    Action,
    #[serde(rename = "Horreur")]
    Horror,
    Animation,
}

impl Genre {
    pub const ALL: [Genre; 8] = [
        Genre::Thriller,
        Genre::Romance,
        Genre::Comedy,
        Genre::ScienceFiction,
        Genre::Drama,
        Genre::Action,
        Genre::Horror,
        Genre::Animation,
    ];

    /// Catalog label of the genre
    pub fn label(&self) -> &'static str {
        match self {
            Genre::Thriller => "Thriller",
            Genre::Romance => "Romance",
            Genre::Comedy => "Comédie",
            Genre::ScienceFiction => "Science-Fiction",
            Genre::Drama => "Drame",
            Genre::Action => "Action",
            Genre::Horror => "Horreur",
            Genre::Animation => "Animation",
        }
    }
}

impl Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Genre {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Genre::ALL
            .into_iter()
            .find(|g| g.label().to_lowercase() == wanted)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown genre: {}", s.trim())))
    }
}

/// Category as written in the catalog, with the genre it resolves to (if any)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Category {
    pub label: String,
    pub genre: Option<Genre>,
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        let genre = label.parse::<Genre>().ok();
        Self { label, genre }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Category::from)
    }
}

/// A film of the read-only catalog
///
/// Deserialization is lenient: keys follow the catalog document (`FilmID`,
/// `Film`, `Categorie`, `Description`, `Keywords`, `Annee`, `Langue`,
/// `Realisateur`, `Acteurs`) with English aliases, the first non-null key wins,
/// and bad optional values become empty or unknown. Only a missing id or title
/// rejects the film.
#[derive(Debug, Clone, PartialEq)]
pub struct Film {
    pub id: FilmId,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub keywords: String,
    pub year: Option<i32>,
    pub language: Option<String>,
    pub director: Option<String>,
    pub cast: Option<String>,
}

impl Film {
    /// Text compared against the user's query by the similarity provider
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.description, self.keywords)
            .trim()
            .to_string()
    }

    /// Language tag, `None` when missing or blank
    pub fn language_tag(&self) -> Option<&str> {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

impl TryFrom<Value> for Film {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(fields) = value else {
            return Err(AppError::Catalog("Film entry is not an object".to_string()));
        };

        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| fields.get(*key).filter(|v| !v.is_null()))
        };
        let text = |keys: &[&str]| first(keys).and_then(text_value);

        let id = first(&["FilmID", "id"])
            .ok_or_else(|| AppError::Catalog("Film without FilmID".to_string()))
            .and_then(|v| {
                FilmId::deserialize(v)
                    .map_err(|e| AppError::Catalog(format!("Invalid FilmID {}: {}", v, e)))
            })?;

        let title = text(&["Film", "title"])
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Catalog(format!("Film {} has no title", id)))?;

        Ok(Self {
            category: Category::from(text(&["Categorie", "category"]).unwrap_or_default()),
            description: text(&["Description", "description"]).unwrap_or_default(),
            keywords: first(&["Keywords", "keywords"])
                .map(keywords_value)
                .unwrap_or_default(),
            year: first(&["Annee", "Year", "year"]).and_then(|v| year_value(&id, v)),
            language: text(&["Langue", "Language", "language"]),
            director: text(&["Realisateur", "director"]),
            cast: text(&["Acteurs", "cast"]),
            id,
            title,
        })
    }
}

impl<'de> Deserialize<'de> for Film {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Film::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Strings as-is, numbers and booleans rendered; anything else is absent
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Keywords may be a single free-text string or a list of strings
fn keywords_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(text_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => text_value(other).unwrap_or_default(),
    }
}

/// Years may be numbers or numeric strings; anything else is an unknown year
fn year_value(id: &FilmId, value: &Value) -> Option<i32> {
    let year = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };

    if year.is_none() {
        tracing::warn!(film_id = %id, value = %value, "Unparsable film year, treating as unknown");
    }

    year
}

/// Film fields exposed to API clients
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilmSummary {
    pub id: FilmId,
    pub title: String,
    pub category: String,
    pub description: String,
    pub keywords: String,
    pub year: Option<i32>,
    pub language: Option<String>,
    pub director: Option<String>,
    pub cast: Option<String>,
}

impl From<&Film> for FilmSummary {
    fn from(film: &Film) -> Self {
        Self {
            id: film.id.clone(),
            title: film.title.clone(),
            category: film.category.label.clone(),
            description: film.description.clone(),
            keywords: film.keywords.clone(),
            year: film.year,
            language: film.language.clone(),
            director: film.director.clone(),
            cast: film.cast.clone(),
        }
    }
}
