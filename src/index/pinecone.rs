/// Pinecone vector index client
///
/// Calls the index data plane `POST {host}/query` with metadata included.
/// Requires the index host (from the Pinecone console) and an API key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{IndexError, RawMatch, VectorIndex};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

/// Pinecone-backed vector index.
pub struct PineconeIndex {
    client: reqwest::Client,
    host: String,
    api_key: String,
}

impl PineconeIndex {
    /// Create a new PineconeIndex.
    ///
    /// # Arguments
    /// * `host` - Index host; a missing scheme defaults to https
    /// * `api_key` - Pinecone API key (must be non-empty)
    ///
    /// # Errors
    /// Returns `IndexError::NotConfigured` if host or api_key is empty.
    pub fn new(host: String, api_key: String) -> Result<Self, IndexError> {
        if host.trim().is_empty() {
            return Err(IndexError::NotConfigured(
                "Pinecone index host is required. \
                 Set GAMEFINDER_INDEX__HOST or index.host in gamefinder.toml"
                    .to_string(),
            ));
        }
        if api_key.trim().is_empty() {
            return Err(IndexError::NotConfigured(
                "Pinecone API key is required. \
                 Set GAMEFINDER_INDEX__API_KEY or index.api_key in gamefinder.toml"
                    .to_string(),
            ));
        }

        Ok(PineconeIndex {
            client: reqwest::Client::new(),
            host: normalize_host(&host),
            api_key,
        })
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<RawMatch>, IndexError> {
        let request = QueryRequest {
            vector,
            top_k,
            namespace,
            include_metadata: true,
            include_values: false,
        };

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| IndexError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(IndexError::Api { status, message: body });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Decode(e.to_string()))?;

        Ok(body.matches)
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
