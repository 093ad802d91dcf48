/// Ollama tag extraction provider
///
/// Calls the Ollama /api/chat endpoint with a structured JSON output schema.
/// No API key required: designed for self-hosted Ollama deployments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{parse_tag_output, tag_schema, TagExtractionError, TagExtractor, TAG_SYSTEM_PROMPT};

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
    format: serde_json::Value,
}

#[derive(Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

/// Ollama-backed tag extractor.
pub struct OllamaTagExtractor {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaTagExtractor {
    /// Create a new OllamaTagExtractor.
    ///
    /// # Arguments
    /// * `base_url` - Ollama server base URL (e.g., "http://localhost:11434")
    /// * `model` - Model name (e.g., "llama3.2:3b")
    pub fn new(base_url: String, model: String) -> Self {
        OllamaTagExtractor {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[async_trait]
impl TagExtractor for OllamaTagExtractor {
    async fn extract_tags(&self, query: &str) -> Result<Vec<String>, TagExtractionError> {
        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![
                OllamaMessage {
                    role: "system".to_string(),
                    content: TAG_SYSTEM_PROMPT.to_string(),
                },
                OllamaMessage {
                    role: "user".to_string(),
                    content: query.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions { temperature: 0.1, num_predict: 100 },
            format: tag_schema(),
        };

        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TagExtractionError::Generation(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TagExtractionError::Api { status, message: body });
        }

        let chat_response: OllamaChatResponse = response.json().await.map_err(|e| {
            TagExtractionError::Generation(format!("Failed to parse Ollama response: {}", e))
        })?;

        parse_tag_output(&chat_response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
