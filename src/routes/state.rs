use std::sync::Arc;

use crate::{
    config::{Config, EmbeddingBackend, ExplainerKind},
    db::Catalog,
    error::{AppError, AppResult},
    services::{
        providers::{
            embedding::{EmbeddingProvider, HashedEmbedder, RemoteEmbedder},
            explanation::{ExplanationProvider, GeminiExplainer, TemplateExplainer},
        },
        recommendations::Recommender,
        similarity::SimilarityEngine,
    },
};

/// Shared application state
pub struct AppState {
    pub recommender: Recommender,
}

impl AppState {
    pub fn new(recommender: Recommender) -> Self {
        Self { recommender }
    }

    /// Wires catalog, providers and scoring weights from configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let weights = config.weights()?;
        let catalog = Arc::new(Catalog::load(&config.catalog_path));

        let embedder = embedding_provider(config)?;
        let explainer = explanation_provider(config)?;

        tracing::info!(
            embedder = embedder.name(),
            explainer = explainer.name(),
            films = catalog.len(),
            "Providers configured"
        );

        let similarity = Arc::new(SimilarityEngine::new(embedder, catalog.clone()));
        let recommender = Recommender::new(
            catalog,
            similarity,
            explainer,
            weights,
            config.top_k.max(1),
            config.explanation_timeout(),
        );

        Ok(Self::new(recommender))
    }
}

fn embedding_provider(config: &Config) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.embedding_backend() {
        EmbeddingBackend::Hashed => Ok(Arc::new(HashedEmbedder::new(config.embedding_dimension)?)),
        EmbeddingBackend::Remote => {
            let url = config.embedding_url().ok_or_else(|| {
                AppError::Config("EMBEDDING_PROVIDER=remote requires EMBEDDING_API_URL".to_string())
            })?;
            Ok(Arc::new(RemoteEmbedder::new(
                url.to_string(),
                config.embedding_api_key.clone(),
                config.embedding_model.clone(),
                config.embedding_timeout(),
            )?))
        }
        EmbeddingBackend::Fastembed => fastembed_provider(config),
    }
}

#[cfg(feature = "fastembed")]
fn fastembed_provider(config: &Config) -> AppResult<Arc<dyn EmbeddingProvider>> {
    use crate::services::providers::embedding::FastEmbedder;

    Ok(Arc::new(FastEmbedder::new(
        &config.embedding_model,
        config.fastembed_cache_dir.clone(),
    )?))
}

#[cfg(not(feature = "fastembed"))]
fn fastembed_provider(_config: &Config) -> AppResult<Arc<dyn EmbeddingProvider>> {
    Err(AppError::Config(
        "EMBEDDING_PROVIDER=fastembed but reelrank was built without the fastembed feature"
            .to_string(),
    ))
}

fn explanation_provider(config: &Config) -> AppResult<Arc<dyn ExplanationProvider>> {
    match config.explainer_kind() {
        ExplainerKind::Template => Ok(Arc::new(TemplateExplainer::new(
            config.explanation_max_chars,
        ))),
        ExplainerKind::Gemini => {
            let key = config.gemini_key().ok_or_else(|| {
                AppError::Config("EXPLAINER=gemini requires GOOGLE_API_KEY".to_string())
            })?;
            Ok(Arc::new(GeminiExplainer::new(
                key.to_string(),
                config.gemini_api_url.clone(),
                config.gemini_model.clone(),
                config.explanation_max_chars,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "fastembed"))]
    #[test]
    fn test_defaults_use_offline_providers() {
        let config = Config {
            catalog_path: "/nonexistent/catalog.json".to_string(),
            ..Config::default()
        };

        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.recommender.explainer_name(), "template");
        assert_eq!(state.recommender.similarity().provider_name(), "hashed");
        assert!(state.recommender.catalog().is_empty());
    }

    #[test]
    fn test_remote_embedder_selected_by_url() {
        let config = Config {
            catalog_path: "/nonexistent/catalog.json".to_string(),
            embedding_api_url: Some("http://localhost:8080/v1".to_string()),
            ..Config::default()
        };

        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.recommender.similarity().provider_name(), "remote");
    }

    #[test]
    fn test_remote_without_url_is_config_error() {
        let config = Config {
            catalog_path: "/nonexistent/catalog.json".to_string(),
            embedding_provider: Some(EmbeddingBackend::Remote),
            ..Config::default()
        };

        assert!(matches!(
            AppState::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_explicit_hashed_overrides_url() {
        let config = Config {
            catalog_path: "/nonexistent/catalog.json".to_string(),
            embedding_provider: Some(EmbeddingBackend::Hashed),
            embedding_api_url: Some("http://localhost:8080/v1".to_string()),
            ..Config::default()
        };

        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.recommender.similarity().provider_name(), "hashed");
    }

    #[cfg(not(feature = "fastembed"))]
    #[test]
    fn test_fastembed_without_feature_is_config_error() {
        let config = Config {
            catalog_path: "/nonexistent/catalog.json".to_string(),
            embedding_provider: Some(EmbeddingBackend::Fastembed),
            ..Config::default()
        };

        assert!(matches!(
            AppState::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[cfg(feature = "fastembed")]
    #[test]
    fn test_fastembed_unknown_model_is_config_error() {
        let config = Config {
            catalog_path: "/nonexistent/catalog.json".to_string(),
            embedding_provider: Some(EmbeddingBackend::Fastembed),
            embedding_model: "text-embedding-3-small".to_string(),
            ..Config::default()
        };

        assert!(matches!(
            AppState::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_gemini_without_key_is_config_error() {
        let config = Config {
            catalog_path: "/nonexistent/catalog.json".to_string(),
            explainer: Some(ExplainerKind::Gemini),
            google_api_key: Some("  ".to_string()),
            ..Config::default()
        };

        assert!(matches!(
            AppState::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_incomplete_weights_fail_fast() {
        let config = Config {
            catalog_path: "/nonexistent/catalog.json".to_string(),
            scoring_weights: Some("semantic=0.7,genre=0.3".to_string()),
            ..Config::default()
        };

        assert!(matches!(
            AppState::from_config(&config),
            Err(AppError::Config(_))
        ));
    }
}
