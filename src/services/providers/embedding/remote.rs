/// OpenAI-compatible embeddings endpoint
///
/// POSTs `{ "model": ..., "input": [...] }` to `{api_url}/embeddings` and reads
/// `data[].embedding`, reordered by `data[].index`.
use crate::{
    error::{AppError, AppResult},
    services::providers::embedding::EmbeddingProvider,
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Clone)]
pub struct RemoteEmbedder {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl RemoteEmbedder {
    /// Every call to the endpoint is bounded by `timeout`
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    fn into_ordered_vectors(response: EmbeddingResponse, expected: usize) -> AppResult<Vec<Vec<f32>>> {
        if response.data.len() != expected {
            return Err(AppError::Embedding(format!(
                "Embedding API returned {} vectors for {} inputs",
                response.data.len(),
                expected
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for RemoteEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("No embedding generated".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.api_url);
        let mut request = self.http_client.post(&url).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "Embedding API returned status {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let vectors = Self::into_ordered_vectors(parsed, texts.len())?;

        tracing::debug!(
            inputs = texts.len(),
            model = %self.model,
            provider = "remote",
            "Embeddings fetched"
        );

        Ok(vectors)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_reordered_by_index() {
        let json = r#"{
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ],
            "model": "all-MiniLM-L6-v2"
        }"#;

        let response: EmbeddingResponse = serde_json::from_str(json).unwrap();
        let vectors = RemoteEmbedder::into_ordered_vectors(response, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_response_count_mismatch() {
        let json = r#"{ "data": [ { "index": 0, "embedding": [1.0] } ] }"#;
        let response: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            RemoteEmbedder::into_ordered_vectors(response, 3),
            Err(AppError::Embedding(_))
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let embedder = RemoteEmbedder::new(
            "http://localhost:8080/v1/".to_string(),
            None,
            "all-MiniLM-L6-v2".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(embedder.api_url, "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        let embedder = RemoteEmbedder::new(
            "http://test.local".to_string(),
            None,
            "all-MiniLM-L6-v2".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hung_endpoint_times_out() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let embedder = RemoteEmbedder::new(
            format!("http://{}", addr),
            None,
            "all-MiniLM-L6-v2".to_string(),
            Duration::from_millis(200),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let result = embedder.embed("un film").await;
        server.abort();

        assert!(matches!(result, Err(AppError::HttpClient(ref e)) if e.is_timeout()));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
