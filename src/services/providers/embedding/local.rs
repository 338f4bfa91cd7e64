//! Local sentence-embedding model through fastembed.
//!
//! Runs `all-MiniLM-L6-v2` (or another supported model) on the CPU. The model
//! files are downloaded into the cache directory on first use.

use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    services::providers::embedding::EmbeddingProvider,
};

/// Maps a configured model name to a fastembed model and its vector size
pub fn resolve_model(name: &str) -> AppResult<(EmbeddingModel, usize)> {
    let key: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    match key.as_str() {
        "allminilml6v2" | "sentencetransformersallminilml6v2" => {
            Ok((EmbeddingModel::AllMiniLML6V2, 384))
        }
        "bgesmallenv15" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bgebaseenv15" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        "paraphrasemlminilml12v2" | "paraphrasemultilingualminilml12v2" => {
            Ok((EmbeddingModel::ParaphraseMLMiniLML12V2, 384))
        }
        _ => Err(AppError::Config(format!(
            "Unsupported local embedding model: {}",
            name
        ))),
    }
}

#[derive(Clone)]
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedder {
    /// Loads the model, downloading it into `cache_dir` when missing
    pub fn new(model_name: &str, cache_dir: Option<String>) -> AppResult<Self> {
        let (model, dimension) = resolve_model(model_name)?;

        let mut options = InitOptions::new(model);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(PathBuf::from(dir));
        }

        let embedding = TextEmbedding::try_new(options).map_err(|e| {
            AppError::Config(format!("Failed to initialize embedding model {}: {}", model_name, e))
        })?;

        tracing::info!(model = model_name, dimension, "Local embedding model loaded");

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            model_name: model_name.to_string(),
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FastEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("No embedding generated".to_string()))
    }

    /// Blank texts get a zero vector, which has no similarity to anything
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let (indices, inputs): (Vec<usize>, Vec<String>) = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| (i, text.clone()))
            .unzip();

        let mut vectors = vec![vec![0.0; self.dimension]; texts.len()];
        if inputs.is_empty() {
            return Ok(vectors);
        }

        let embedded = {
            let mut model = self.model.lock().await;
            model
                .embed(inputs, None)
                .map_err(|e| AppError::Embedding(format!("Embedding generation failed: {}", e)))?
        };

        if embedded.len() != indices.len() {
            return Err(AppError::Embedding(format!(
                "Model returned {} vectors for {} texts",
                embedded.len(),
                indices.len()
            )));
        }

        for (i, vector) in indices.into_iter().zip(embedded) {
            vectors[i] = vector;
        }
        Ok(vectors)
    }

    fn name(&self) -> &'static str {
        "fastembed"
    }
}
