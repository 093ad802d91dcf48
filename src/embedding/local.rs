/// Local embedding provider using fastembed
///
/// Provides offline embedding generation using multilingual-e5-large (1024 dimensions),
/// the model the game index is built with. No API key required: model weights are
/// downloaded and cached locally on first use.
/// All CPU-bound fastembed calls are wrapped in spawn_blocking to avoid blocking async runtime.

use async_trait::async_trait;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task;

use super::{EmbeddingError, EmbeddingProvider};

/// Local embedding provider backed by fastembed.
///
/// fastembed is synchronous, so embed() uses spawn_blocking internally.
pub struct LocalEmbeddingProvider {
    model: Arc<Mutex<TextEmbedding>>,
    name: String,
    dim: usize,
}

/// Default weight cache: `<user cache dir>/gamefinder/models`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("gamefinder")
        .join("models")
}

impl LocalEmbeddingProvider {
    /// Create a new LocalEmbeddingProvider, downloading model weights if not cached.
    ///
    /// # Arguments
    /// * `cache_dir` - Directory to cache model weights (None: `default_cache_dir()`)
    pub async fn new(cache_dir: Option<&str>) -> Result<Self, EmbeddingError> {
        let cache_path = cache_dir.map(PathBuf::from).unwrap_or_else(default_cache_dir);

        let model = task::spawn_blocking(move || {
            std::fs::create_dir_all(&cache_path)
                .map_err(|e| EmbeddingError::ModelInit(format!("Failed to create cache dir: {}", e)))?;
            let options = TextInitOptions::new(EmbeddingModel::MultilingualE5Large)
                .with_cache_dir(cache_path)
                .with_show_download_progress(false);
            TextEmbedding::try_new(options).map_err(|e| EmbeddingError::ModelInit(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::ModelInit(e.to_string()))??;

        tracing::info!(model = "multilingual-e5-large", "Local embedding model ready");

        Ok(LocalEmbeddingProvider {
            model: Arc::new(Mutex::new(model)),
            name: "multilingual-e5-large".to_string(),
            dim: 1024,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();

        task::spawn_blocking(move || {
            let mut guard = model
                .lock()
                .map_err(|_| EmbeddingError::Generation("Embedding model lock poisoned".to_string()))?;
            let mut vectors = guard
                .embed(vec![text], None)
                .map_err(|e| EmbeddingError::Generation(e.to_string()))?;
            vectors
                .pop()
                .ok_or_else(|| EmbeddingError::Generation("Model returned no embedding".to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::Generation(e.to_string()))?
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
