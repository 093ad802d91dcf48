/// Configuration management using figment
///
/// Loads configuration with this precedence (highest wins):
/// 1. Defaults (hardcoded)
/// 2. TOML file: gamefinder.toml (in working directory)
/// 3. Environment variables: prefixed GAMEFINDER_, nested keys split on `__`
///    (e.g., GAMEFINDER_INDEX__API_KEY=... or GAMEFINDER_RANKING__DEBUG_SCORING=true)

use std::collections::BTreeMap;

use figment::{
    Figment,
    providers::{Env, Format, Toml, Serialized},
};
use serde::{Deserialize, Serialize};
use crate::errors::GameFinderError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional file path for JSON log output (in addition to stderr)
    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub tags: TagsConfig,

    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub tables: TablesConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            log_file: None,
            index: IndexConfig::default(),
            embedding: EmbeddingConfig::default(),
            tags: TagsConfig::default(),
            ranking: RankingConfig::default(),
            tables: TablesConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, TOML file, and environment variables
    ///
    /// Environment variables override TOML file values.
    /// Example: GAMEFINDER_LOG_LEVEL=debug overrides log_level in gamefinder.toml
    pub fn load() -> Result<Config, GameFinderError> {
        Self::figment()
            .extract()
            .map_err(|e| GameFinderError::Config(format!("Failed to load config: {}", e)))
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("gamefinder.toml"))
            .merge(Env::prefixed("GAMEFINDER_").split("__"))
    }
}

/// Vector index (ANN collaborator) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// "pinecone" (REST data plane) or "memory" (JSON snapshot, brute-force cosine)
    pub provider: String,
    /// Pinecone index host, e.g. "https://steam-games-index-abc123.svc.us-east-1.pinecone.io"
    pub host: Option<String>,
    pub api_key: Option<String>,
    /// Namespace / partition queried inside the index
    pub namespace: Option<String>,
    /// Snapshot file for the memory provider
    pub snapshot_path: Option<String>,
    /// Number of raw candidates fetched before re-ranking
    pub candidate_count: usize,
    pub timeout_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            provider: "pinecone".to_string(),
            host: None,
            api_key: None,
            namespace: Some("games".to_string()),
            snapshot_path: None,
            candidate_count: 200,
            timeout_ms: 5_000,
        }
    }
}

/// Query embedding settings.
///
/// `query_prefix` must match the scheme the index vectors were built with
/// (E5 models: "query: " at search time, "passage: " at ingestion time).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// "local" (fastembed) or "openai" (any OpenAI-compatible /embeddings endpoint)
    pub provider: String,
    /// Model weight cache for the local provider; defaults to the user cache dir
    pub cache_dir: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub dimension: usize,
    pub query_prefix: String,
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            provider: "local".to_string(),
            cache_dir: None,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "text-embedding-3-large".to_string(),
            dimension: 1024,
            query_prefix: "query: ".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// LLM intent-tag extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// When false the fallback tokenizer is used for every query
    pub enabled: bool,
    /// "openai" (OpenAI-compatible, Groq by default) or "ollama"
    pub provider: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub timeout_ms: u64,
}

impl Default for TagsConfig {
    fn default() -> Self {
        TagsConfig {
            enabled: true,
            provider: "openai".to_string(),
            openai_base_url: "https://api.groq.com/openai/v1".to_string(),
            openai_api_key: None,
            openai_model: "llama-3.1-8b-instant".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2:3b".to_string(),
            timeout_ms: 3_000,
        }
    }
}

/// Every tunable constant of the hybrid scoring function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Bonus when the normalized query is a substring of the normalized title
    pub substring_bonus: f64,
    /// Fuzzy ratio (0-100) strictly above which `fuzzy_high_bonus` applies
    pub fuzzy_high_threshold: f64,
    pub fuzzy_high_bonus: f64,
    /// Fuzzy ratio (0-100) strictly above which `fuzzy_medium_bonus` applies
    pub fuzzy_medium_threshold: f64,
    pub fuzzy_medium_bonus: f64,

    /// popularity = log10(reviews + 1) * popularity_log_scale
    pub popularity_log_scale: f64,
    pub critic_score_threshold: f64,
    pub critic_multiplier: f64,
    pub positive_ratio_threshold: f64,
    pub positive_ratio_multiplier: f64,

    /// vector_score = (raw_similarity - similarity_offset) * similarity_scale
    pub similarity_offset: f64,
    pub similarity_scale: f64,

    pub specific_title_weight: f64,
    pub specific_vector_weight: f64,
    pub specific_popularity_weight: f64,

    pub recommendation_vector_weight: f64,
    pub recommendation_tag_weight: f64,
    pub recommendation_popularity_weight: f64,
    pub recommendation_quality_weight: f64,

    /// Added once per matching negative category (negative value)
    pub negative_penalty: f64,

    /// Queries with at least this many words are treated as recommendation requests
    pub recommendation_min_words: usize,
    pub default_top_k: usize,

    /// Populate ScoredCandidate.breakdown
    pub debug_scoring: bool,
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            substring_bonus: 40.0,
            fuzzy_high_threshold: 85.0,
            fuzzy_high_bonus: 30.0,
            fuzzy_medium_threshold: 60.0,
            fuzzy_medium_bonus: 10.0,
            popularity_log_scale: 3.0,
            critic_score_threshold: 85.0,
            critic_multiplier: 1.3,
            positive_ratio_threshold: 0.90,
            positive_ratio_multiplier: 1.2,
            similarity_offset: 0.7,
            similarity_scale: 200.0,
            specific_title_weight: 3.0,
            specific_vector_weight: 0.5,
            specific_popularity_weight: 0.5,
            recommendation_vector_weight: 1.5,
            recommendation_tag_weight: 5.0,
            recommendation_popularity_weight: 1.0,
            recommendation_quality_weight: 10.0,
            negative_penalty: -15.0,
            recommendation_min_words: 5,
            default_top_k: 12,
            debug_scoring: false,
        }
    }
}

/// Static synonym and negative-signal tables, keyed by canonical tag.
///
/// Values are normalized once when the engine is built (see `tables`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub synonyms: BTreeMap<String, Vec<String>>,
    pub negatives: BTreeMap<String, Vec<String>>,
}

const DEFAULT_SYNONYMS: &[(&str, &[&str])] = &[
    ("cozy", &["relaxing", "chill", "peaceful", "calm", "wholesome", "casual"]),
    ("farming", &["agriculture", "crops", "harvest", "farm", "garden"]),
    ("combat", &["shooter", "fighting", "battle", "fps", "action", "war"]),
    ("rpg", &["roleplay", "role-playing", "character customization", "story"]),
    ("survival", &["survive", "surviving", "scavenge", "crafting"]),
    ("cute", &["adorable", "kawaii", "charming"]),
    ("tactical", &["strategy", "strategic", "planning", "rts", "turn-based"]),
    ("fps", &["first-person shooter", "shooter", "gun", "military"]),
    ("horror", &["scary", "spooky", "zombie", "gore", "psychological"]),
];

const DEFAULT_NEGATIVES: &[(&str, &[&str])] = &[
    ("training", &["aim", "trainer", "practice", "training", "tutorial"]),
    ("software", &["benchmark", "utility", "software", "design"]),
    ("dlc", &["soundtrack", "artbook", "season pass", "expansion"]),
];

fn table_from(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(key, values)| {
            (key.to_string(), values.iter().map(|v| v.to_string()).collect())
        })
        .collect()
}

impl Default for TablesConfig {
    fn default() -> Self {
        TablesConfig {
            synonyms: table_from(DEFAULT_SYNONYMS),
            negatives: table_from(DEFAULT_NEGATIVES),
        }
    }
}

/// Conversational assistant settings (OpenAI-compatible chat API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Number of most recent history turns sent with each message
    pub history_window: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        AssistantConfig {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "llama-3.1-8b-instant".to_string(),
            history_window: 10,
            temperature: 0.7,
            max_tokens: 350,
        }
    }
}
