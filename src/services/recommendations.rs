use chrono::Utc;
use std::{collections::BTreeMap, sync::Arc, time::Duration};

use crate::{
    db::Catalog,
    error::{AppError, AppResult},
    models::{
        Film, FilmSummary, RankedResult, Recommendation, RecommendationRequest,
        RecommendationResponse, RecommendationStats, UserQuery,
    },
    services::{
        providers::explanation::{fallback_explanation, ExplanationProvider},
        ranker,
        scoring::{aggregate, Weights},
        similarity::SimilarityEngine,
    },
};

/// Recommendation pipeline
///
/// Similarities, scoring and ranking run first over the whole catalog; only the
/// top-K films are then handed to the explanation provider. Provider failures
/// degrade to neutral similarities and fallback explanations and never change
/// the ranking.
pub struct Recommender {
    catalog: Arc<Catalog>,
    similarity: Arc<SimilarityEngine>,
    explainer: Arc<dyn ExplanationProvider>,
    weights: Weights,
    default_top_k: usize,
    explanation_timeout: Duration,
}

impl Recommender {
    pub fn new(
        catalog: Arc<Catalog>,
        similarity: Arc<SimilarityEngine>,
        explainer: Arc<dyn ExplanationProvider>,
        weights: Weights,
        default_top_k: usize,
        explanation_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            similarity,
            explainer,
            weights,
            default_top_k,
            explanation_timeout,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn similarity(&self) -> &SimilarityEngine {
        &self.similarity
    }

    pub fn explainer_name(&self) -> &'static str {
        self.explainer.name()
    }

    pub async fn recommend(&self, request: RecommendationRequest) -> AppResult<RecommendationResponse> {
        let top_k = match request.top_k {
            Some(0) => {
                return Err(AppError::InvalidInput(
                    "top_k must be at least 1".to_string(),
                ))
            }
            Some(k) => k,
            None => self.default_top_k,
        };
        let query = UserQuery::try_from(request)?;
        let films = self.catalog.films();

        let mut stats = catalog_coverage(films);

        let similarities = match self.similarity.similarities(&query.embedding_text()).await {
            Ok(similarities) => similarities,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    provider = self.similarity.provider_name(),
                    "Similarity provider failed, using neutral similarities"
                );
                stats.semantic_fallback = true;
                vec![0.0; films.len()]
            }
        };

        let ranked = ranker::rank_top_k(
            score_candidates(films, &similarities, &query, &self.weights),
            top_k,
        );

        let explanations = self.explain_all(&query, &ranked).await;
        stats.explanation_fallbacks = explanations.iter().filter(|(_, fell_back)| *fell_back).count();

        let mut category_distribution = BTreeMap::new();
        for result in &ranked {
            *category_distribution
                .entry(result.film.category.label.clone())
                .or_insert(0) += 1;
        }

        let recommendations: Vec<Recommendation> = ranked
            .iter()
            .zip(explanations)
            .enumerate()
            .map(|(i, (result, (explanation, _)))| Recommendation {
                rank: i + 1,
                film: FilmSummary::from(result.film),
                breakdown: result.breakdown,
                final_score: result.final_score(),
                explanation,
            })
            .collect();

        tracing::info!(
            considered = stats.considered,
            returned = recommendations.len(),
            semantic_fallback = stats.semantic_fallback,
            explanation_fallbacks = stats.explanation_fallbacks,
            "Recommendations computed"
        );

        Ok(RecommendationResponse {
            recommendations,
            stats,
            category_distribution,
            genre_profile: query.preferences.profile(),
            explainer: self.explainer.name(),
            generated_at: Utc::now(),
        })
    }

    /// Explains every ranked film concurrently. Returns the text and whether it is the fallback.
    async fn explain_all(&self, query: &UserQuery, ranked: &[RankedResult<'_>]) -> Vec<(String, bool)> {
        let query = Arc::new(query.clone());
        let mut tasks = Vec::with_capacity(ranked.len());

        for result in ranked {
            let explainer = self.explainer.clone();
            let query = query.clone();
            let film = result.film.clone();
            let score = result.final_score();
            let timeout = self.explanation_timeout;

            let task = tokio::spawn(async move {
                tokio::time::timeout(timeout, explainer.explain(&query, &film, score)).await
            });
            tasks.push((task, result.film.id.clone(), score));
        }

        let mut explanations = Vec::with_capacity(tasks.len());
        for (task, film_id, score) in tasks {
            let explanation = match task.await {
                Ok(Ok(Ok(text))) => Some(text),
                Ok(Ok(Err(e))) => {
                    tracing::warn!(film_id = %film_id, error = %e, "Explanation failed, using fallback");
                    None
                }
                Ok(Err(_)) => {
                    tracing::warn!(
                        film_id = %film_id,
                        timeout_ms = self.explanation_timeout.as_millis() as u64,
                        "Explanation timed out, using fallback"
                    );
                    None
                }
                Err(e) => {
                    tracing::error!(film_id = %film_id, error = %e, "Explanation task join error");
                    None
                }
            };

            explanations.push(match explanation {
                Some(text) => (text, false),
                None => (fallback_explanation(score), true),
            });
        }

        explanations
    }
}

/// Scores every film against the query. `similarities` is in catalog order;
/// a missing entry counts as a raw similarity of 0.0.
pub fn score_candidates<'a>(
    films: &'a [Film],
    similarities: &[f64],
    query: &UserQuery,
    weights: &Weights,
) -> Vec<RankedResult<'a>> {
    films
        .iter()
        .enumerate()
        .map(|(i, film)| {
            let raw = similarities.get(i).copied().unwrap_or(0.0);
            let breakdown = aggregate(raw, film, query, weights);
            tracing::debug!(
                film_id = %film.id,
                raw_similarity = raw,
                final_score = breakdown.final_score,
                "Film scored"
            );
            RankedResult { film, breakdown }
        })
        .collect()
}

fn catalog_coverage(films: &[Film]) -> RecommendationStats {
    RecommendationStats {
        considered: films.len(),
        unknown_category: films.iter().filter(|f| f.category.genre.is_none()).count(),
        unknown_year: films.iter().filter(|f| f.year.is_none()).count(),
        unknown_language: films.iter().filter(|f| f.language_tag().is_none()).count(),
        ..RecommendationStats::default()
    }
}
