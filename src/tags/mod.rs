/// Intent-tag extraction trait and supporting types
///
/// Provides a pluggable interface for LLM-based tag extraction: a query is
/// turned into 5-8 short lowercase descriptors (genre, mood, mechanics).
/// Supports OpenAI-compatible APIs (Groq by default) and Ollama.
///
/// Extraction is a degraded signal: any failure (provider error, malformed
/// output, timeout) falls back to the naive tokenizer in `resolve_tags` and
/// never fails the ranking request.

pub mod ollama;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::fallback_tags;

/// Errors that can occur during tag extraction.
#[derive(Debug, Error)]
pub enum TagExtractionError {
    /// Inference or JSON parse failure
    #[error("Tag generation error: {0}")]
    Generation(String),

    /// API provider returned an HTTP error
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Provider not configured (e.g., missing API key or model)
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Extraction exceeded its latency budget (milliseconds)
    #[error("Tag extraction timed out after {0} ms")]
    Timeout(u64),
}

/// Core trait for LLM-backed intent-tag extraction.
///
/// Implementations must be Send + Sync to support use in async contexts
/// and across thread boundaries (e.g., Arc<dyn TagExtractor>).
#[async_trait]
pub trait TagExtractor: Send + Sync {
    /// Extract lowercase intent tags from a free-text query.
    async fn extract_tags(&self, query: &str) -> Result<Vec<String>, TagExtractionError>;

    /// Return the model name identifier used by this provider.
    fn model_name(&self) -> &str;
}

/// Where the tags of a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSource {
    Llm,
    Fallback,
}

/// System instructions for tag extraction.
pub const TAG_SYSTEM_PROMPT: &str = "Extract 5-8 relevant tags from the user query. \
     Tags describe genre, mood and mechanics. \
     If the user searches for a specific game title (e.g. 'Elden Ring'), return tags describing that game.\n\
     Return JSON: {\"tags\": [\"tag1\", ...]}";

/// JSON schema for tag output.
pub fn tag_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "tags": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 1,
                "maxItems": 8,
                "description": "Lowercase genre, mood or mechanic descriptors"
            }
        },
        "required": ["tags"]
    })
}

#[derive(Deserialize)]
struct TagOutput {
    #[serde(default)]
    tags: Vec<String>,
}

/// Parse model output `{"tags": [...]}` into trimmed lowercase tags.
///
/// Empty output is an error so the caller falls back to the tokenizer.
pub fn parse_tag_output(content: &str) -> Result<Vec<String>, TagExtractionError> {
    let output: TagOutput = serde_json::from_str(content).map_err(|e| {
        TagExtractionError::Generation(format!(
            "Failed to parse tag JSON from model output: {} (content: {})",
            e, content
        ))
    })?;

    let tags: Vec<String> = output
        .tags
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    if tags.is_empty() {
        return Err(TagExtractionError::Generation("LLM returned no tags".to_string()));
    }
    Ok(tags)
}

/// Resolve the tags for a query: the extractor under `timeout`, or the fallback
/// tokenizer when the extractor is absent, fails or is too slow.
pub async fn resolve_tags(
    extractor: Option<&dyn TagExtractor>,
    query: &str,
    timeout: Duration,
) -> (Vec<String>, TagSource) {
    let Some(extractor) = extractor else {
        return (fallback_tags(query), TagSource::Fallback);
    };

    let result = match tokio::time::timeout(timeout, extractor.extract_tags(query)).await {
        Ok(result) => result,
        Err(_) => Err(TagExtractionError::Timeout(timeout.as_millis() as u64)),
    };

    match result {
        Ok(tags) => (tags, TagSource::Llm),
        Err(e) => {
            tracing::warn!(
                model = extractor.model_name(),
                error = %e,
                "Tag extraction failed, using fallback tokenizer"
            );
            (fallback_tags(query), TagSource::Fallback)
        }
    }
}
