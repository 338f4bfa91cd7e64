/// Google Gemini explanation provider
///
/// Calls `models/{model}:generateContent` and joins the text parts of the first
/// candidate. An empty answer is an error so the caller falls back.
use crate::{
    error::{AppError, AppResult},
    models::{Film, UserQuery},
    services::providers::explanation::{truncate_explanation, ExplanationProvider},
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Clone)]
pub struct GeminiExplainer {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
    max_chars: usize,
}

impl GeminiExplainer {
    pub fn new(api_key: String, api_url: String, model: String, max_chars: usize) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            max_chars,
        }
    }

    fn build_prompt(&self, query: &UserQuery, film: &Film, final_score: f64) -> String {
        let preferences = query
            .preferences
            .profile()
            .iter()
            .map(|(genre, rating)| format!("{}: {}", genre, rating))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Tu es un assistant cinéma. Explique brièvement, en français, pourquoi ce film est recommandé.\n\
             Contraintes: 2 à 4 phrases, ton naturel, pas de spoilers, au plus {max} caractères.\n\n\
             Réponses utilisateur:\n\
             - Type recherché: {description}\n\
             - Ambiance: {ambiance}\n\
             - Réalisateurs aimés: {directors}\n\
             - Acteurs aimés: {actors}\n\
             - Période: {period}\n\
             - Langue: {language}\n\
             - Préférences de genres (1-5): {preferences}\n\n\
             Film recommandé:\n\
             - Titre: {title}\n\
             - Genre: {category}\n\
             - Description: {film_description}\n\
             - Mots-clés: {keywords}\n\n\
             Score final: {score:.2}",
            max = self.max_chars,
            description = query.description,
            ambiance = query.ambiance,
            directors = query.directors,
            actors = query.actors,
            period = query.period,
            language = query.language,
            preferences = preferences,
            title = film.title,
            category = film.category.label,
            film_description = film.description,
            keywords = film.keywords,
            score = final_score,
        )
    }

    fn extract_text(response: GenerateResponse) -> AppResult<String> {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::Explanation("Empty response from Gemini".to_string()));
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl ExplanationProvider for GeminiExplainer {
    async fn explain(&self, query: &UserQuery, film: &Film, final_score: f64) -> AppResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: self.build_prompt(query, film, final_score),
                }],
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Explanation(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = Self::extract_text(parsed)?;

        tracing::debug!(
            film_id = %film.id,
            chars = text.chars().count(),
            provider = "gemini",
            "Explanation generated"
        );

        Ok(truncate_explanation(&text, self.max_chars))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
