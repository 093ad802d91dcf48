/// Embedding provider trait and supporting types
///
/// Provides a pluggable interface for query embedding generation.
/// Supports local fastembed models (default, no API key) and OpenAI-compatible APIs.
///
/// Query vectors must be produced with the same model and prefix scheme the
/// index was built with, otherwise similarity scores are meaningless.

pub mod local;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// fastembed model initialization failure
    #[error("Model initialization error: {0}")]
    ModelInit(String),

    /// Embedding generation failure (inference error)
    #[error("Embedding generation error: {0}")]
    Generation(String),

    /// API provider returned an HTTP error
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Provider not configured (e.g., missing API key)
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Embedding call exceeded its latency budget (milliseconds)
    #[error("Embedding timed out after {0} ms")]
    Timeout(u64),

    /// Model returned a vector of unexpected length
    #[error("Embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Core trait for embedding text into fixed-dimension float vectors.
///
/// Implementations must be Send + Sync to support use in async contexts
/// and across thread boundaries (e.g., Arc<dyn EmbeddingProvider>).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for the given text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Return the model name identifier (e.g., "multilingual-e5-large").
    fn model_name(&self) -> &str;

    /// Return the dimension of the embedding vectors produced by this model.
    fn dimension(&self) -> usize;
}

/// Prefix the query with the retrieval marker the index was built for.
pub fn query_text(prefix: &str, query: &str) -> String {
    format!("{}{}", prefix, query)
}
