// End-to-end ranking tests with scripted collaborators.
//
// The embedder, index and tag extractor are in-process fakes so every score
// below is deterministic and can be checked against the scoring formulas.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use gamefinder::config::Config;
use gamefinder::embedding::{EmbeddingError, EmbeddingProvider};
use gamefinder::errors::GameFinderError;
use gamefinder::index::memory::{InMemoryIndex, IndexRecord};
use gamefinder::index::{IndexError, RawMatch, VectorIndex};
use gamefinder::ranking::{Intent, RankingEngine, ScoredCandidate};
use gamefinder::tags::{TagExtractionError, TagExtractor, TagSource};

// ---------------------------------------------------------------------------
// Scripted collaborators
// ---------------------------------------------------------------------------

struct FixedEmbedder {
    vector: Vec<f32>,
    dim: usize,
    delay: Option<Duration>,
    seen: Mutex<Vec<String>>,
}

impl FixedEmbedder {
    fn new(vector: Vec<f32>) -> Self {
        let dim = vector.len();
        FixedEmbedder { vector, dim, delay: None, seen: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.seen.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.vector.clone())
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

struct BrokenEmbedder;

#[async_trait]
impl EmbeddingProvider for BrokenEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Api { status: 503, message: "model offline".into() })
    }

    fn model_name(&self) -> &str {
        "broken"
    }

    fn dimension(&self) -> usize {
        2
    }
}

/// Returns a fixed list of matches and records how it was queried.
struct ScriptedIndex {
    matches: Vec<RawMatch>,
    seen: Mutex<Option<(usize, Option<String>)>>,
}

impl ScriptedIndex {
    fn new(matches: Vec<RawMatch>) -> Self {
        ScriptedIndex { matches, seen: Mutex::new(None) }
    }
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<RawMatch>, IndexError> {
        *self.seen.lock().unwrap() = Some((top_k, namespace.map(str::to_string)));
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct BrokenIndex;

#[async_trait]
impl VectorIndex for BrokenIndex {
    async fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _namespace: Option<&str>,
    ) -> Result<Vec<RawMatch>, IndexError> {
        Err(IndexError::Request("connection refused".into()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

struct ScriptedTagger(Result<Vec<&'static str>, u16>);

#[async_trait]
impl TagExtractor for ScriptedTagger {
    async fn extract_tags(&self, _query: &str) -> Result<Vec<String>, TagExtractionError> {
        match &self.0 {
            Ok(tags) => Ok(tags.iter().map(|t| t.to_string()).collect()),
            Err(status) => Err(TagExtractionError::Api { status: *status, message: "rate limited".into() }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn game(id: &str, title: &str, score: f64, metadata: Value) -> RawMatch {
    let mut metadata = metadata.as_object().cloned().unwrap_or_default();
    metadata.insert("title".to_string(), json!(title));
    RawMatch::new(id, score, metadata)
}

fn engine_with(
    matches: Vec<RawMatch>,
    tagger: Option<Arc<dyn TagExtractor>>,
    config: &Config,
) -> RankingEngine {
    RankingEngine::new(
        Arc::new(ScriptedIndex::new(matches)),
        Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
        tagger,
        config,
    )
}

fn debug_config() -> Config {
    let mut config = Config::default();
    config.ranking.debug_scoring = true;
    config
}

fn ids(results: &[ScoredCandidate]) -> Vec<&str> {
    results.iter().map(|r| r.candidate.id.as_str()).collect()
}

fn no_exclusions() -> HashSet<String> {
    HashSet::new()
}

// ---------------------------------------------------------------------------
// Ranking behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_exact_title_dominates_specific_query() {
    let matches = vec![
        game("374320", "Dark Souls III", 0.86, json!({"reviews": 1_000_000})),
        game("1245620", "ELDEN RING", 0.82, json!({"reviews": 500_000, "metacritic": 94})),
        game("2622380", "ELDEN RING NIGHTREIGN", 0.80, json!({"reviews": 50_000})),
    ];
    let engine = engine_with(matches, None, &debug_config());

    let results = engine.rank("Elden Ring", None, &no_exclusions()).await.unwrap();

    assert_eq!(ids(&results), vec!["1245620", "2622380", "374320"]);
    let top = results[0].breakdown.as_ref().unwrap();
    assert_eq!(top.title_score, 70.0);
    // 70*3 + 24*0.5 + log10(500001)*3*0.5
    assert!((results[0].final_score - 230.55).abs() < 0.01);
    assert_eq!(results[1].breakdown.as_ref().unwrap().title_score, 50.0);
}

#[tokio::test]
async fn test_recommendation_query_uses_expanded_tags() {
    let matches = vec![
        game(
            "782330",
            "DOOM Eternal",
            0.82,
            json!({"reviews": 500_000, "positive_ratio": 0.9, "tags": "FPS, Gore, Action"}),
        ),
        game(
            "413150",
            "Stardew Valley",
            0.80,
            json!({
                "reviews": 500_000,
                "positive_ratio": 0.98,
                "tags": "Farming Sim, Relaxing, Cute, Pixel Graphics",
                "genres": "Indie, RPG"
            }),
        ),
    ];
    let tagger: Arc<dyn TagExtractor> = Arc::new(ScriptedTagger(Ok(vec!["cozy", "farming", "cute"])));
    let engine = engine_with(matches, Some(tagger), &debug_config());
    let query = "relaxing cozy farming game with cute animals";

    let analysis = engine.analyze(query).await;
    assert_eq!(analysis.intent, Intent::Recommendation);
    assert_eq!(analysis.tag_source, TagSource::Llm);
    assert!(analysis.tags.contains("relaxing"));
    assert!(analysis.tags.contains("harvest"));

    let results = engine.rank(query, None, &no_exclusions()).await.unwrap();

    assert_eq!(ids(&results), vec!["413150", "782330"]);
    let stardew = results[0].breakdown.as_ref().unwrap();
    // farming, relaxing, cute
    assert_eq!(stardew.tag_hits, 3);
    assert_eq!(stardew.quality_multiplier, 1.2);
    assert_eq!(results[1].breakdown.as_ref().unwrap().tag_hits, 0);
    assert_eq!(results[1].breakdown.as_ref().unwrap().quality_multiplier, 1.0);
}

#[tokio::test]
async fn test_negative_signals_push_non_games_down() {
    let matches = vec![
        game(
            "714010",
            "Aim Lab",
            0.84,
            json!({"reviews": 100_000, "tags": "FPS, Training, Free to Play, Utility"}),
        ),
        game(
            "730",
            "Counter-Strike 2",
            0.84,
            json!({"reviews": 100_000, "tags": "FPS, Shooter, Competitive"}),
        ),
    ];
    let engine = engine_with(matches, None, &debug_config());

    let results = engine
        .rank("fun shooter game to practice my aim", None, &no_exclusions())
        .await
        .unwrap();

    assert_eq!(ids(&results), vec!["730", "714010"]);
    // training and software categories
    assert_eq!(results[1].breakdown.as_ref().unwrap().negative_penalty, -30.0);
    assert_eq!(results[0].breakdown.as_ref().unwrap().negative_penalty, 0.0);
}

#[tokio::test]
async fn test_duplicate_titles_collapse_to_best_score() {
    let matches = vec![
        game("620-dup", "PORTAL 2!", 0.80, json!({"reviews": 10})),
        game("620", "Portal 2", 0.85, json!({"reviews": 300_000})),
        game("400", "Portal", 0.83, json!({"reviews": 100_000})),
    ];
    let engine = engine_with(matches, None, &Config::default());

    let results = engine.rank("Portal 2", None, &no_exclusions()).await.unwrap();
    assert_eq!(ids(&results), vec!["620", "400"]);
    assert!(results.iter().all(|r| r.breakdown.is_none()));

    let exclude: HashSet<String> = ["620".to_string()].into_iter().collect();
    let results = engine.rank("Portal 2", None, &exclude).await.unwrap();
    assert_eq!(ids(&results), vec!["620-dup", "400"]);
}

#[tokio::test]
async fn test_top_k_defaults_to_twelve() {
    let matches: Vec<RawMatch> = (0..20)
        .map(|i| game(&i.to_string(), &format!("Game Number {}", i), 0.8, json!({"reviews": i * 100})))
        .collect();
    let engine = engine_with(matches, None, &Config::default());

    assert_eq!(engine.rank("space exploration", None, &no_exclusions()).await.unwrap().len(), 12);
    assert_eq!(engine.rank("space exploration", Some(3), &no_exclusions()).await.unwrap().len(), 3);
    assert!(engine.rank("space exploration", Some(0), &no_exclusions()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_results_sorted_descending() {
    let matches: Vec<RawMatch> = (0..30)
        .map(|i| {
            game(
                &i.to_string(),
                &format!("Title {}", i),
                0.70 + (i % 7) as f64 * 0.02,
                json!({"reviews": (i * 7919) % 100_000, "metacritic": (i * 13) % 100}),
            )
        })
        .collect();
    let engine = engine_with(matches, None, &Config::default());

    let results = engine
        .rank("open world fantasy adventure with dragons", Some(30), &no_exclusions())
        .await
        .unwrap();
    assert!(results.windows(2).all(|w| w[0].final_score >= w[1].final_score));
}

#[tokio::test]
async fn test_dirty_metadata_does_not_fail_request() {
    let matches = vec![
        game("1", "Broken Metadata", 0.8, json!({"reviews": "N/A", "metacritic": {"x": 1}, "price": "free"})),
        game("2", "", 0.79, json!({})),
    ];
    let engine = engine_with(matches, None, &Config::default());

    let results = engine.rank("anything", None, &no_exclusions()).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].candidate.reviews, 0);
    assert_eq!(results[1].candidate.title, "Unknown");
}

#[tokio::test]
async fn test_null_metadata_match_degrades_alone() {
    let broken: RawMatch =
        serde_json::from_str(r#"{"id": "1", "score": null, "metadata": null}"#).unwrap();
    let matches = vec![game("620", "Portal 2", 0.85, json!({"reviews": 300_000})), broken];
    let engine = engine_with(matches, None, &Config::default());

    let results = engine.rank("Portal 2", None, &no_exclusions()).await.unwrap();
    assert_eq!(ids(&results), vec!["620", "1"]);
    assert_eq!(results[1].candidate.title, "Unknown");
    assert_eq!(results[1].candidate.malformed_fields, vec!["metadata", "score"]);
}

#[tokio::test]
async fn test_queries_index_with_configured_candidate_count() {
    let index = Arc::new(ScriptedIndex::new(vec![game("1", "Hades", 0.8, json!({}))]));
    let embedder = Arc::new(FixedEmbedder::new(vec![1.0, 0.0]));
    let engine = RankingEngine::new(index.clone(), embedder.clone(), None, &Config::default());

    engine.rank("Hades", None, &no_exclusions()).await.unwrap();

    assert_eq!(*index.seen.lock().unwrap(), Some((200, Some("games".to_string()))));
    assert_eq!(*embedder.seen.lock().unwrap(), vec!["query: Hades".to_string()]);
}

#[tokio::test]
async fn test_with_in_memory_index() {
    let record = |id: &str, title: &str, values: Vec<f32>| IndexRecord {
        id: id.to_string(),
        values,
        metadata: json!({"title": title}).as_object().cloned().unwrap_or_default(),
        namespace: Some("games".to_string()),
    };
    let index = InMemoryIndex::new(vec![
        record("1", "Hollow Knight", vec![1.0, 0.0]),
        record("2", "Celeste", vec![0.6, 0.8]),
        record("3", "Ori and the Blind Forest", vec![0.0, 1.0]),
    ]);
    let engine = RankingEngine::new(
        Arc::new(index),
        Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
        None,
        &Config::default(),
    );

    let results = engine.rank("metroidvania", None, &no_exclusions()).await.unwrap();
    assert_eq!(ids(&results), vec!["1", "2", "3"]);
    assert!((results[0].candidate.similarity - 1.0).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_blank_query_is_rejected() {
    let engine = engine_with(vec![], None, &Config::default());
    let err = engine.rank("   ", None, &no_exclusions()).await.unwrap_err();
    assert!(matches!(err, GameFinderError::Validation { .. }));
}

#[tokio::test]
async fn test_embedding_failure_propagates() {
    let engine = RankingEngine::new(
        Arc::new(ScriptedIndex::new(vec![])),
        Arc::new(BrokenEmbedder),
        None,
        &Config::default(),
    );
    let err = engine.rank("Elden Ring", None, &no_exclusions()).await.unwrap_err();
    assert!(err.is_collaborator_failure());
}

#[tokio::test]
async fn test_embedding_timeout_propagates() {
    let mut config = Config::default();
    config.embedding.timeout_ms = 20;
    let mut embedder = FixedEmbedder::new(vec![1.0, 0.0]);
    embedder.delay = Some(Duration::from_secs(5));
    let engine = RankingEngine::new(Arc::new(ScriptedIndex::new(vec![])), Arc::new(embedder), None, &config);

    let err = engine.rank("Elden Ring", None, &no_exclusions()).await.unwrap_err();
    assert!(err.is_collaborator_failure());
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_embedding_dimension_mismatch_propagates() {
    let mut embedder = FixedEmbedder::new(vec![1.0, 0.0, 0.0]);
    embedder.dim = 2;
    let engine = RankingEngine::new(
        Arc::new(ScriptedIndex::new(vec![])),
        Arc::new(embedder),
        None,
        &Config::default(),
    );
    let err = engine.rank("Elden Ring", None, &no_exclusions()).await.unwrap_err();
    assert!(err.is_collaborator_failure());
}

#[tokio::test]
async fn test_index_failure_propagates() {
    let engine = RankingEngine::new(
        Arc::new(BrokenIndex),
        Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
        None,
        &Config::default(),
    );
    let err = engine.rank("Elden Ring", None, &no_exclusions()).await.unwrap_err();
    assert!(err.is_collaborator_failure());
    assert!(err.to_string().contains("vector index"));
}

#[tokio::test]
async fn test_tag_failure_falls_back_without_failing() {
    let matches = vec![game("1", "Stardew Valley", 0.8, json!({"tags": "Farming Sim, Relaxing"}))];
    let tagger: Arc<dyn TagExtractor> = Arc::new(ScriptedTagger(Err(429)));
    let engine = engine_with(matches, Some(tagger), &debug_config());
    let query = "relaxing farming game for long evenings";

    let analysis = engine.analyze(query).await;
    assert_eq!(analysis.tag_source, TagSource::Fallback);
    assert!(analysis.raw_tags.contains(&"farming".to_string()));

    let results = engine.rank(query, None, &no_exclusions()).await.unwrap();
    assert_eq!(results.len(), 1);
    // relaxing, farming
    assert_eq!(results[0].breakdown.as_ref().unwrap().tag_hits, 2);
}

#[tokio::test]
async fn test_serialized_result_shape() {
    let matches = vec![game("620", "Portal 2", 0.85, json!({"reviews": 300_000, "price": 9.99}))];
    let engine = engine_with(matches, None, &Config::default());

    let results = engine.rank("Portal 2", None, &no_exclusions()).await.unwrap();
    let value = serde_json::to_value(&results).unwrap();

    assert_eq!(value[0]["id"], "620");
    assert_eq!(value[0]["title"], "Portal 2");
    assert_eq!(value[0]["price"], 9.99);
    assert!(value[0]["final_score"].is_number());
    assert!(value[0].get("breakdown").is_none());
    assert!(value[0].get("malformed_fields").is_none());
}
