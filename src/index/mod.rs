/// Vector index trait and supporting types
///
/// The ANN index is an external collaborator: it receives a query vector and
/// returns scored matches with loosely typed metadata. Index construction and
/// ingestion happen elsewhere.
/// Supports Pinecone (REST data plane) and an in-memory snapshot backend.

pub mod memory;
pub mod pinecone;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur while querying the vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Transport-level failure (connection refused, DNS, TLS)
    #[error("Index request failed: {0}")]
    Request(String),

    /// Index returned an HTTP error
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body or snapshot could not be decoded
    #[error("Failed to decode index response: {0}")]
    Decode(String),

    /// Provider not configured (e.g., missing host or API key)
    #[error("Index not configured: {0}")]
    NotConfigured(String),

    /// Query vector does not match the index dimension
    #[error("Query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Query exceeded its latency budget (milliseconds)
    #[error("Index query timed out after {0} ms")]
    Timeout(u64),
}

/// One match returned by the index, before any parsing of its metadata.
///
/// Decoding never rejects a match for a bad `score` or `metadata`: a
/// null or non-numeric score becomes NaN and null or non-object metadata becomes
/// an empty map with `metadata_malformed` set, so only that candidate degrades.
/// Absent fields are not malformed.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "WireMatch")]
pub struct RawMatch {
    pub id: String,
    pub score: f64,
    pub metadata: Map<String, Value>,
    /// Metadata was present but not a JSON object
    pub metadata_malformed: bool,
}

impl RawMatch {
    pub fn new(id: impl Into<String>, score: f64, metadata: Map<String, Value>) -> Self {
        RawMatch { id: id.into(), score, metadata, metadata_malformed: false }
    }
}

#[derive(Deserialize)]
struct WireMatch {
    id: String,
    #[serde(default, deserialize_with = "present")]
    score: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    metadata: Option<Value>,
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only an absent field is `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl From<WireMatch> for RawMatch {
    fn from(wire: WireMatch) -> Self {
        let score = match wire.score {
            None => 0.0,
            Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
            Some(_) => f64::NAN,
        };
        let (metadata, metadata_malformed) = match wire.metadata {
            None => (Map::new(), false),
            Some(Value::Object(map)) => (map, false),
            Some(_) => (Map::new(), true),
        };
        RawMatch { id: wire.id, score, metadata, metadata_malformed }
    }
}

/// Core trait for approximate-nearest-neighbor lookups.
///
/// Implementations must be Send + Sync so one instance can be shared by all
/// concurrent requests (e.g., Arc<dyn VectorIndex>).
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` matches for `vector`, optionally inside `namespace`.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<RawMatch>, IndexError>;

    /// Short backend identifier for logs.
    fn name(&self) -> &str;
}
