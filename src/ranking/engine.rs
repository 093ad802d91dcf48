/// The ranking engine: collaborator calls, per-candidate scoring and selection.
///
/// Request flow:
/// 1. Classify intent and resolve intent tags (LLM or fallback), expand with synonyms
/// 2. Embed the prefixed query (concurrently with step 1)
/// 3. Query the vector index for raw candidates
/// 4. Drop excluded ids, parse metadata, score each candidate independently
/// 5. Sort, deduplicate by title, truncate to top_k

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::scoring::{classify, CandidateScorer, Intent, Query, ScoredCandidate};
use super::select::select_top_k;
use crate::candidate::Candidate;
use crate::config::{Config, RankingConfig};
use crate::embedding::{query_text, EmbeddingError, EmbeddingProvider};
use crate::errors::GameFinderError;
use crate::index::{IndexError, RawMatch, VectorIndex};
use crate::tables::{NegativeTagTable, SynonymTable, TagSet};
use crate::tags::{resolve_tags, TagExtractor, TagSource};

/// Collaborator settings taken from `Config` at construction.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub namespace: Option<String>,
    pub candidate_count: usize,
    pub query_prefix: String,
    pub index_timeout: Duration,
    pub embedding_timeout: Duration,
    pub tag_timeout: Duration,
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        EngineOptions {
            namespace: config.index.namespace.clone(),
            candidate_count: config.index.candidate_count,
            query_prefix: config.embedding.query_prefix.clone(),
            index_timeout: Duration::from_millis(config.index.timeout_ms),
            embedding_timeout: Duration::from_millis(config.embedding.timeout_ms),
            tag_timeout: Duration::from_millis(config.tags.timeout_ms),
        }
    }
}

/// Query-side artifacts shared by every candidate of one request.
#[derive(Debug, Clone)]
pub struct QueryAnalysis {
    pub query: Query,
    pub intent: Intent,
    /// Tags as returned by the extractor or the fallback tokenizer
    pub raw_tags: Vec<String>,
    pub tag_source: TagSource,
    /// Normalized and synonym-expanded tags
    pub tags: TagSet,
}

/// Classify intent, resolve tags (extractor or fallback) and expand them.
///
/// Usable without an index or embedder, e.g. for tag diagnostics.
pub async fn analyze_query(
    query: &str,
    tagger: Option<&dyn TagExtractor>,
    synonyms: &SynonymTable,
    recommendation_min_words: usize,
    tag_timeout: Duration,
) -> QueryAnalysis {
    let intent = classify(query, recommendation_min_words);
    let (raw_tags, tag_source) = resolve_tags(tagger, query, tag_timeout).await;
    let tags = synonyms.expand(&TagSet::from_tags(&raw_tags));

    tracing::debug!(
        intent = ?intent,
        tag_source = ?tag_source,
        tags = ?tags.iter().take(5).collect::<Vec<_>>(),
        "Analyzed query"
    );

    QueryAnalysis {
        query: Query::new(query),
        intent,
        raw_tags,
        tag_source,
        tags,
    }
}

/// Hybrid re-ranker over an ANN index.
///
/// Construct once at startup and share (Arc) across requests; all state is read-only.
pub struct RankingEngine {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    tagger: Option<Arc<dyn TagExtractor>>,
    synonyms: SynonymTable,
    negatives: NegativeTagTable,
    ranking: RankingConfig,
    options: EngineOptions,
}

impl RankingEngine {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        tagger: Option<Arc<dyn TagExtractor>>,
        config: &Config,
    ) -> Self {
        RankingEngine {
            index,
            embedder,
            tagger,
            synonyms: SynonymTable::new(&config.tables.synonyms),
            negatives: NegativeTagTable::new(&config.tables.negatives, config.ranking.negative_penalty),
            ranking: config.ranking.clone(),
            options: EngineOptions::from_config(config),
        }
    }

    /// Rank games for a free-text query.
    ///
    /// `top_k` defaults to `RankingConfig.default_top_k`. Fails only when the
    /// query is blank or the embedding model / vector index fails; tag
    /// extraction and metadata problems only degrade the ranking.
    pub async fn rank(
        &self,
        query: &str,
        top_k: Option<usize>,
        exclude_ids: &HashSet<String>,
    ) -> Result<Vec<ScoredCandidate>, GameFinderError> {
        if query.trim().is_empty() {
            return Err(GameFinderError::validation("query", "Query cannot be empty"));
        }
        let top_k = top_k.unwrap_or(self.ranking.default_top_k);

        let (analysis, vector) = tokio::join!(self.analyze(query), self.embed_query(query));
        let vector = vector?;

        let matches = self.fetch_candidates(&vector).await?;
        let fetched = matches.len();

        let results = self.rerank(&analysis, matches, top_k, exclude_ids);

        tracing::info!(
            intent = ?analysis.intent,
            tag_source = ?analysis.tag_source,
            tags = analysis.tags.len(),
            fetched = fetched,
            excluded = exclude_ids.len(),
            returned = results.len(),
            "Ranked query"
        );

        Ok(results)
    }

    /// Derive intent and expanded intent tags for a query.
    pub async fn analyze(&self, query: &str) -> QueryAnalysis {
        analyze_query(
            query,
            self.tagger.as_deref(),
            &self.synonyms,
            self.ranking.recommendation_min_words,
            self.options.tag_timeout,
        )
        .await
    }

    /// Score, order and deduplicate raw matches. Pure: no collaborator calls.
    pub fn rerank(
        &self,
        analysis: &QueryAnalysis,
        matches: Vec<RawMatch>,
        top_k: usize,
        exclude_ids: &HashSet<String>,
    ) -> Vec<ScoredCandidate> {
        let scorer = CandidateScorer::new(
            &self.ranking,
            &self.negatives,
            &analysis.query,
            &analysis.tags,
            analysis.intent,
        );

        let scored: Vec<ScoredCandidate> = matches
            .into_iter()
            .filter(|m| !exclude_ids.contains(&m.id))
            .map(Candidate::from_match)
            .map(|candidate| scorer.score(candidate))
            .collect();

        select_top_k(scored, top_k)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbeddingError> {
        let text = query_text(&self.options.query_prefix, query);
        let timeout = self.options.embedding_timeout;

        let vector = tokio::time::timeout(timeout, self.embedder.embed(&text))
            .await
            .map_err(|_| EmbeddingError::Timeout(timeout.as_millis() as u64))??;

        let expected = self.embedder.dimension();
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch { expected, actual: vector.len() });
        }
        Ok(vector)
    }

    async fn fetch_candidates(&self, vector: &[f32]) -> Result<Vec<RawMatch>, IndexError> {
        let timeout = self.options.index_timeout;
        let query = self.index.query(
            vector,
            self.options.candidate_count,
            self.options.namespace.as_deref(),
        );

        tokio::time::timeout(timeout, query)
            .await
            .map_err(|_| IndexError::Timeout(timeout.as_millis() as u64))?
    }
}
