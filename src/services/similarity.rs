use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    db::Catalog,
    error::{AppError, AppResult},
    services::providers::embedding::{cosine_similarity, EmbeddingProvider},
};

/// Raw query-to-film similarities over the catalog.
///
/// Catalog vectors are embedded once (at startup via [`init`](Self::init), or
/// lazily on the first query) and kept until [`shutdown`](Self::shutdown).
pub struct SimilarityEngine {
    provider: Arc<dyn EmbeddingProvider>,
    catalog: Arc<Catalog>,
    catalog_vectors: RwLock<Option<Arc<Vec<Vec<f32>>>>>,
}

impl SimilarityEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, catalog: Arc<Catalog>) -> Self {
        Self {
            provider,
            catalog,
            catalog_vectors: RwLock::new(None),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Embeds the catalog. Idempotent.
    pub async fn init(&self) -> AppResult<()> {
        self.catalog_vectors().await.map(|_| ())
    }

    /// Drops the cached catalog vectors
    pub async fn shutdown(&self) {
        self.catalog_vectors.write().await.take();
        tracing::info!(provider = self.provider.name(), "Similarity engine shut down");
    }

    pub async fn is_initialized(&self) -> bool {
        self.catalog_vectors.read().await.is_some()
    }

    /// One raw similarity per catalog film, in catalog order
    pub async fn similarities(&self, query_text: &str) -> AppResult<Vec<f64>> {
        if self.catalog.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.catalog_vectors().await?;
        let query = self.provider.embed(query_text).await?;

        Ok(vectors
            .iter()
            .map(|film| f64::from(cosine_similarity(&query, film)))
            .collect())
    }

    async fn catalog_vectors(&self) -> AppResult<Arc<Vec<Vec<f32>>>> {
        if let Some(vectors) = self.catalog_vectors.read().await.as_ref() {
            return Ok(vectors.clone());
        }

        let mut guard = self.catalog_vectors.write().await;
        // Another task may have embedded the catalog while we waited
        if let Some(vectors) = guard.as_ref() {
            return Ok(vectors.clone());
        }

        let texts: Vec<String> = self
            .catalog
            .films()
            .iter()
            .map(|film| film.embedding_text())
            .collect();

        let vectors = self.provider.embed_batch(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} vectors for {} films",
                vectors.len(),
                texts.len()
            )));
        }

        tracing::info!(
            provider = self.provider.name(),
            films = vectors.len(),
            "Catalog embedded"
        );

        let vectors = Arc::new(vectors);
        *guard = Some(vectors.clone());
        Ok(vectors)
    }
}
