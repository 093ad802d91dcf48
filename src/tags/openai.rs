/// OpenAI-compatible tag extraction provider
///
/// Calls any OpenAI-compatible Chat Completions API with json_object response format.
/// The base_url is configurable: Groq (default), OpenAI, or any compatible endpoint.
/// Requires an API key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{parse_tag_output, TagExtractionError, TagExtractor, TAG_SYSTEM_PROMPT};

// --- HTTP request/response structs ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

// --- Provider ---

/// OpenAI-compatible tag extraction provider.
pub struct OpenAITagExtractor {
    client: reqwest::Client,
    /// Configurable base URL: Groq, OpenAI and other compatible APIs
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAITagExtractor {
    /// Create a new OpenAITagExtractor.
    ///
    /// # Arguments
    /// * `base_url` - API base URL (e.g., "https://api.groq.com/openai/v1")
    /// * `api_key` - API key (must be non-empty)
    /// * `model` - Model name (e.g., "llama-3.1-8b-instant")
    ///
    /// # Errors
    /// Returns `TagExtractionError::NotConfigured` if api_key is empty.
    pub fn new(base_url: String, api_key: String, model: String) -> Result<Self, TagExtractionError> {
        if api_key.trim().is_empty() {
            return Err(TagExtractionError::NotConfigured(
                "API key is required when using the openai tag provider. \
                 Set GAMEFINDER_TAGS__OPENAI_API_KEY or tags.openai_api_key in gamefinder.toml"
                    .to_string(),
            ));
        }

        Ok(OpenAITagExtractor {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    fn build_request(&self, query: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: TAG_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: query.to_string(),
                },
            ],
            temperature: 0.1,
            max_tokens: 100,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        }
    }
}

#[async_trait]
impl TagExtractor for OpenAITagExtractor {
    async fn extract_tags(&self, query: &str) -> Result<Vec<String>, TagExtractionError> {
        let request = self.build_request(query);
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            TagExtractionError::Generation(format!("Failed to parse chat response: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                TagExtractionError::Generation("API returned empty choices list".to_string())
            })?;

        parse_tag_output(&content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let result = OpenAITagExtractor::new(
            "https://api.groq.com/openai/v1".into(),
            "".into(),
            "llama-3.1-8b-instant".into(),
        );
        assert!(matches!(result, Err(TagExtractionError::NotConfigured(_))));
    }

    #[test]
    fn test_request_shape() {
        let extractor = OpenAITagExtractor::new(
            "https://api.groq.com/openai/v1/".into(),
            "gsk-test".into(),
            "llama-3.1-8b-instant".into(),
        )
        .unwrap();
        let json = serde_json::to_value(extractor.build_request("Elden Ring")).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Elden Ring");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(extractor.base_url, "https://api.groq.com/openai/v1");
    }
}
