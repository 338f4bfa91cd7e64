use std::time::Duration;

use serde::Deserialize;

use crate::error::AppResult;
use crate::services::scoring::Weights;

/// Which explanation provider to wire into the recommendation pipeline
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExplainerKind {
    /// Deterministic templated sentence, no network
    Template,
    /// Google Gemini generative API
    Gemini,
}

/// Which embedding provider computes semantic similarity
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Offline hashed bag-of-words vectors
    Hashed,
    /// OpenAI-compatible embeddings endpoint
    Remote,
    /// Local sentence-embedding model, needs the `fastembed` feature
    Fastembed,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the JSON film catalog
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Number of recommendations returned when the request does not ask for a count
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Weight overrides, e.g. `semantic=0.6,genre=0.25,period=0.08,language=0.07`
    #[serde(default)]
    pub scoring_weights: Option<String>,

    /// Explicit explainer selection; inferred from the API key when absent
    #[serde(default)]
    pub explainer: Option<ExplainerKind>,

    /// Gemini API key, preferred over `gemini_api_key`
    #[serde(default)]
    pub google_api_key: Option<String>,

    /// Secondary Gemini API key variable
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini model identifier
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Maximum length of an explanation, in characters
    #[serde(default = "default_explanation_max_chars")]
    pub explanation_max_chars: usize,

    /// Per-item explanation timeout in milliseconds
    #[serde(default = "default_explanation_timeout_ms")]
    pub explanation_timeout_ms: u64,

    /// Explicit embedding provider; inferred from the other settings when absent
    #[serde(default)]
    pub embedding_provider: Option<EmbeddingBackend>,

    /// OpenAI-compatible embeddings endpoint
    #[serde(default)]
    pub embedding_api_url: Option<String>,

    /// Bearer token for the embeddings endpoint
    #[serde(default)]
    pub embedding_api_key: Option<String>,

    /// Embedding model name, sent to the remote endpoint or loaded by fastembed
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Request timeout for the embeddings endpoint, in milliseconds
    #[serde(default = "default_embedding_timeout_ms")]
    pub embedding_timeout_ms: u64,

    /// Download directory of the fastembed model files
    #[serde(default)]
    pub fastembed_cache_dir: Option<String>,

    /// Vector size of the local hashed embedder
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_catalog_path() -> String {
    "referentiel_films.json".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_explanation_max_chars() -> usize {
    420
}

fn default_explanation_timeout_ms() -> u64 {
    8000
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
    10000
}

fn default_embedding_dimension() -> usize {
    384
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            catalog_path: default_catalog_path(),
            top_k: default_top_k(),
            scoring_weights: None,
            explainer: None,
            google_api_key: None,
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            gemini_api_url: default_gemini_api_url(),
            explanation_max_chars: default_explanation_max_chars(),
            explanation_timeout_ms: default_explanation_timeout_ms(),
            embedding_provider: None,
            embedding_api_url: None,
            embedding_api_key: None,
            embedding_model: default_embedding_model(),
            embedding_timeout_ms: default_embedding_timeout_ms(),
            fastembed_cache_dir: None,
            embedding_dimension: default_embedding_dimension(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Scoring weights. An override string must name every signal.
    pub fn weights(&self) -> AppResult<Weights> {
        match &self.scoring_weights {
            Some(overrides) => Weights::parse(overrides),
            None => Ok(Weights::default()),
        }
    }

    /// Resolved explainer: explicit choice wins, otherwise Gemini when a key is set
    pub fn explainer_kind(&self) -> ExplainerKind {
        match self.explainer {
            Some(kind) => kind,
            None if self.gemini_key().is_some() => ExplainerKind::Gemini,
            None => ExplainerKind::Template,
        }
    }

    /// Non-empty Gemini API key, if any. `GOOGLE_API_KEY` wins over `GEMINI_API_KEY`.
    pub fn gemini_key(&self) -> Option<&str> {
        [&self.google_api_key, &self.gemini_api_key]
            .into_iter()
            .filter_map(|key| key.as_deref().map(str::trim))
            .find(|key| !key.is_empty())
    }

    pub fn explanation_timeout(&self) -> Duration {
        Duration::from_millis(self.explanation_timeout_ms)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    /// Non-empty embeddings endpoint URL, if any
    pub fn embedding_url(&self) -> Option<&str> {
        self.embedding_api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Resolved embedding provider.
    ///
    /// Explicit choice wins. Otherwise a configured endpoint selects the remote
    /// provider, then the local model when built with `fastembed`, then hashing.
    pub fn embedding_backend(&self) -> EmbeddingBackend {
        match self.embedding_provider {
            Some(backend) => backend,
            None if self.embedding_url().is_some() => EmbeddingBackend::Remote,
            None if cfg!(feature = "fastembed") => EmbeddingBackend::Fastembed,
            None => EmbeddingBackend::Hashed,
        }
    }
}
