use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gamefinder::assistant::{ChatMessage, GameAssistant};
use gamefinder::config::Config;
use gamefinder::embedding::local::LocalEmbeddingProvider;
use gamefinder::embedding::openai::OpenAIEmbeddingProvider;
use gamefinder::embedding::EmbeddingProvider;
use gamefinder::index::memory::InMemoryIndex;
use gamefinder::index::pinecone::PineconeIndex;
use gamefinder::index::VectorIndex;
use gamefinder::logging;
use gamefinder::ranking::{analyze_query, RankingEngine};
use gamefinder::tables::SynonymTable;
use gamefinder::tags::ollama::OllamaTagExtractor;
use gamefinder::tags::openai::OpenAITagExtractor;
use gamefinder::tags::TagExtractor;

#[derive(Parser)]
#[command(name = "gamefinder", version, about = "Hybrid re-ranking search over a game vector index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank games for a free-text query and print them as JSON
    Search {
        query: String,
        /// Number of results (defaults to ranking.default_top_k)
        #[arg(long)]
        top_k: Option<usize>,
        /// Game id to leave out of the results; repeatable
        #[arg(long = "exclude")]
        exclude: Vec<String>,
        /// Attach the per-signal score breakdown to every result
        #[arg(long)]
        debug: bool,
    },
    /// Show the intent and expanded intent tags derived for a query
    Tags { query: String },
    /// Ask the game assistant a question
    Chat {
        message: String,
        /// JSON file holding prior turns: [{"role": "user", "content": "..."}]
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

/// Create the vector index based on configuration.
fn create_index(config: &Config) -> Result<Arc<dyn VectorIndex>> {
    match config.index.provider.as_str() {
        "memory" => {
            let path = config.index.snapshot_path.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "Snapshot path required when index provider is 'memory'. \
                     Set GAMEFINDER_INDEX__SNAPSHOT_PATH or index.snapshot_path in gamefinder.toml"
                )
            })?;
            Ok(Arc::new(InMemoryIndex::from_json_file(path)?))
        }
        "pinecone" => {
            let host = config.index.host.clone().unwrap_or_default();
            let api_key = config.index.api_key.clone().unwrap_or_default();
            Ok(Arc::new(PineconeIndex::new(host, api_key)?))
        }
        other => anyhow::bail!("Unknown index provider '{}' (expected 'pinecone' or 'memory')", other),
    }
}

/// Create the embedding provider based on configuration.
async fn create_embedding_provider(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.embedding.provider.as_str() {
        "openai" => {
            let api_key = config.embedding.openai_api_key.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "OpenAI API key required when embedding provider is 'openai'. \
                     Set GAMEFINDER_EMBEDDING__OPENAI_API_KEY or embedding.openai_api_key in gamefinder.toml"
                )
            })?;
            Ok(Arc::new(OpenAIEmbeddingProvider::new(
                config.embedding.openai_base_url.clone(),
                api_key,
                config.embedding.openai_model.clone(),
                config.embedding.dimension,
            )?))
        }
        "local" | _ => Ok(Arc::new(
            LocalEmbeddingProvider::new(config.embedding.cache_dir.as_deref()).await?,
        )),
    }
}

/// Create the tag extractor based on configuration.
///
/// Returns None when extraction is disabled or cannot be configured; ranking
/// then uses the fallback tokenizer for every query.
fn create_tag_extractor(config: &Config) -> Option<Arc<dyn TagExtractor>> {
    if !config.tags.enabled {
        return None;
    }
    match config.tags.provider.as_str() {
        "ollama" => Some(Arc::new(OllamaTagExtractor::new(
            config.tags.ollama_base_url.clone(),
            config.tags.ollama_model.clone(),
        ))),
        "openai" | _ => {
            let api_key = config.tags.openai_api_key.clone().unwrap_or_default();
            match OpenAITagExtractor::new(
                config.tags.openai_base_url.clone(),
                api_key,
                config.tags.openai_model.clone(),
            ) {
                Ok(extractor) => Some(Arc::new(extractor)),
                Err(e) => {
                    tracing::warn!(error = %e, "Tag extraction disabled, using fallback tags");
                    None
                }
            }
        }
    }
}

fn load_history(path: Option<&PathBuf>) -> Result<Vec<ChatMessage>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read chat history {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid chat history {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Config error (using defaults): {}", e);
        Config::default()
    });

    // stdout carries results only; all logs go to stderr
    logging::init_logging(&config);

    match cli.command {
        Commands::Search { query, top_k, exclude, debug } => {
            if debug {
                config.ranking.debug_scoring = true;
            }
            let index = create_index(&config)?;
            let embedder = create_embedding_provider(&config).await?;
            let tagger = create_tag_extractor(&config);
            tracing::info!(
                index = index.name(),
                embedding_model = embedder.model_name(),
                tagger = tagger.as_ref().map(|t| t.model_name()).unwrap_or("fallback"),
                "Ranking engine ready"
            );

            let engine = RankingEngine::new(index, embedder, tagger, &config);
            let exclude_ids: HashSet<String> = exclude.into_iter().collect();
            let results = engine.rank(&query, top_k, &exclude_ids).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Commands::Tags { query } => {
            let tagger = create_tag_extractor(&config);
            let synonyms = SynonymTable::new(&config.tables.synonyms);
            let analysis = analyze_query(
                &query,
                tagger.as_deref(),
                &synonyms,
                config.ranking.recommendation_min_words,
                Duration::from_millis(config.tags.timeout_ms),
            )
            .await;
            let output = serde_json::json!({
                "intent": analysis.intent,
                "tag_source": analysis.tag_source,
                "raw_tags": analysis.raw_tags,
                "tags": analysis.tags.iter().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Chat { message, history } => {
            let history = load_history(history.as_ref())?;
            let assistant = GameAssistant::new(&config.assistant)?;
            let answer = assistant.answer(&message, &history).await;
            println!("{}", answer);
        }
    }

    Ok(())
}
