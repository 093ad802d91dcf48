/// In-memory vector index
///
/// Exact cosine similarity over a snapshot of records held in memory.
/// Used for offline serving from an exported snapshot and as a deterministic
/// index in tests. Snapshot format: a JSON array of
/// `{"id", "values": [f32], "metadata": {...}, "namespace"?}`.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{IndexError, RawMatch, VectorIndex};

/// A stored vector with its metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub namespace: Option<String>,
}

pub struct InMemoryIndex {
    records: Vec<IndexRecord>,
}

impl InMemoryIndex {
    pub fn new(records: Vec<IndexRecord>) -> Self {
        InMemoryIndex { records }
    }

    /// Load a JSON snapshot file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            IndexError::NotConfigured(format!("Cannot read index snapshot {}: {}", path.display(), e))
        })?;
        let records: Vec<IndexRecord> = serde_json::from_str(&raw)
            .map_err(|e| IndexError::Decode(format!("{}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), records = records.len(), "Loaded in-memory index snapshot");
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<RawMatch>, IndexError> {
        let mut scored = Vec::new();
        for record in &self.records {
            if let (Some(wanted), Some(ns)) = (namespace, record.namespace.as_deref()) {
                if wanted != ns {
                    continue;
                }
            }
            if record.values.len() != vector.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: record.values.len(),
                    actual: vector.len(),
                });
            }
            scored.push(RawMatch::new(
                record.id.clone(),
                cosine_similarity(vector, &record.values),
                record.metadata.clone(),
            ));
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
