/// OpenAI-compatible embedding provider
///
/// Calls `POST {base_url}/embeddings` using reqwest. The requested dimension is
/// sent explicitly so text-embedding-3 models can be truncated to the index size.
/// Requires GAMEFINDER_EMBEDDING__OPENAI_API_KEY or embedding.openai_api_key in config.

use async_trait::async_trait;

use super::{EmbeddingError, EmbeddingProvider};

/// Request body for the Embeddings API
#[derive(serde::Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
    model: &'a str,
    dimensions: usize,
}

/// Response from the Embeddings API
#[derive(serde::Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

/// Single embedding result
#[derive(serde::Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// OpenAI-backed embedding provider.
///
/// Requires a valid API key: validated on construction, not at embed time.
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dim: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a new OpenAIEmbeddingProvider.
    ///
    /// # Arguments
    /// * `base_url` - API base URL (e.g., "https://api.openai.com/v1")
    /// * `api_key` - API key (must be non-empty)
    /// * `model` - Embedding model name
    /// * `dim` - Vector dimension of the target index
    ///
    /// # Errors
    /// Returns `EmbeddingError::NotConfigured` if api_key is empty.
    pub fn new(base_url: String, api_key: String, model: String, dim: usize) -> Result<Self, EmbeddingError> {
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::NotConfigured(
                "OpenAI API key is required when using the openai embedding provider. \
                 Set GAMEFINDER_EMBEDDING__OPENAI_API_KEY or embedding.openai_api_key in gamefinder.toml"
                    .to_string(),
            ));
        }

        Ok(OpenAIEmbeddingProvider {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            dim,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbedRequest {
            input: text,
            model: &self.model,
            dimensions: self.dim,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::Generation(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(EmbeddingError::Api {
                status,
                message: body,
            });
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Generation(format!("Failed to parse API response: {}", e)))?;

        embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::Generation("API returned empty embedding list".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let result = OpenAIEmbeddingProvider::new(
            "https://api.openai.com/v1".into(),
            "  ".into(),
            "text-embedding-3-large".into(),
            1024,
        );
        assert!(matches!(result, Err(EmbeddingError::NotConfigured(_))));
    }

    #[test]
    fn test_trims_base_url() {
        let provider = OpenAIEmbeddingProvider::new(
            "https://api.openai.com/v1/".into(),
            "sk-test".into(),
            "text-embedding-3-large".into(),
            1024,
        )
        .unwrap();
        assert_eq!(provider.base_url, "https://api.openai.com/v1");
        assert_eq!(provider.dimension(), 1024);
    }
}
