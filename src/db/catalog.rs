use chrono::{DateTime, Utc};
use serde_json::Value;
use std::{collections::HashSet, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::{CatalogStats, Film},
};

/// Read-only film catalog, loaded once at startup
#[derive(Debug, Clone)]
pub struct Catalog {
    films: Vec<Film>,
    categories: Vec<String>,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            films: Vec::new(),
            categories: Vec::new(),
            loaded_at: Utc::now(),
        }
    }

    pub fn from_films(films: Vec<Film>, categories: Vec<String>) -> Self {
        let catalog = Self {
            films,
            categories,
            loaded_at: Utc::now(),
        };
        catalog.log_anomalies();
        catalog
    }

    /// Parses a catalog document.
    ///
    /// Only a document that is not a JSON object (or whose `films` is not a
    /// list) is an error. Individual films that cannot be read are skipped
    /// with a warning.
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| AppError::Catalog(format!("Malformed catalog document: {}", e)))?;
        let Value::Object(mut document) = document else {
            return Err(AppError::Catalog(
                "Catalog document is not an object".to_string(),
            ));
        };

        let entries = match document.remove("films") {
            Some(Value::Array(entries)) => entries,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(AppError::Catalog(
                    "Catalog `films` is not a list".to_string(),
                ))
            }
        };

        let films = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match Film::try_from(entry) {
                Ok(film) => Some(film),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping unreadable catalog film");
                    None
                }
            })
            .collect();

        let categories = ["blocs", "categories"]
            .iter()
            .find_map(|key| document.get(*key).and_then(Value::as_array))
            .map(|entries| entries.iter().filter_map(category_name).collect())
            .unwrap_or_default();

        Ok(Self::from_films(films, categories))
    }

    /// Loads the catalog from disk.
    ///
    /// Never fails: a missing or malformed file yields an empty catalog, which
    /// in turn yields empty rankings.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Catalog file unavailable, serving an empty catalog"
                );
                return Self::empty();
            }
        };

        match Self::from_json_str(&raw) {
            Ok(catalog) => {
                tracing::info!(
                    path = %path.display(),
                    films = catalog.len(),
                    categories = catalog.categories.len(),
                    "Catalog loaded"
                );
                catalog
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Catalog could not be parsed, serving an empty catalog"
                );
                Self::empty()
            }
        }
    }

    fn log_anomalies(&self) {
        let mut seen = HashSet::new();
        for film in &self.films {
            if !seen.insert(&film.id) {
                tracing::warn!(film_id = %film.id, "Duplicate film id in catalog");
            }
            if film.category.genre.is_none() {
                tracing::warn!(
                    film_id = %film.id,
                    category = %film.category.label,
                    "Film category outside the genre set, genre score will be neutral"
                );
            }
        }
    }

    /// Films in catalog order
    pub fn films(&self) -> &[Film] {
        &self.films
    }

    /// Category names declared by the document
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.films.len()
    }

    pub fn is_empty(&self) -> bool {
        self.films.is_empty()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            films: self.films.len(),
            categories: self.categories.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

/// Entry of the `blocs` list: a bare name or an object with a name
fn category_name(entry: &Value) -> Option<String> {
    match entry {
        Value::String(name) => Some(name.clone()),
        Value::Object(fields) => ["name", "nom", "Categorie"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}
