pub mod engine;
pub mod scoring;
pub mod select;

// Re-export key types for convenience
pub use engine::{analyze_query, EngineOptions, QueryAnalysis, RankingEngine};
pub use scoring::{CandidateScorer, Intent, Query, ScoreBreakdown, ScoredCandidate, Signals};
pub use select::select_top_k;
