//! Text embedding providers.
//!
//! The recommendation core only needs a raw similarity per catalog film; it never
//! looks at vector dimensionality. Providers turn text into vectors and
//! [`cosine_similarity`] compares them.

use crate::error::AppResult;

pub mod hashed;
#[cfg(feature = "fastembed")]
pub mod local;
pub mod remote;

pub use hashed::HashedEmbedder;
#[cfg(feature = "fastembed")]
pub use local::FastEmbedder;
pub use remote::RemoteEmbedder;

/// Trait for text embedding providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Embed several texts, preserving input order
    ///
    /// Default implementation embeds one text at a time. Providers can override
    /// for bulk endpoints.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for empty, zero-norm or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
