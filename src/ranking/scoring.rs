/// Hybrid scoring for game candidate re-ranking
///
/// The final score is a query-intent dependent weighted sum of independent signals:
///   1. Title    : substring + fuzzy match of the normalized query against the title
///   2. Vector   : rescaled ANN similarity
///   3. Popularity: log-scale review count
///   4. Quality  : tiered multiplier from critic score or positive ratio
///   5. Tags     : count of expanded intent tags present in the candidate's tags/genres
///   6. Negative : fixed penalty per matching "not a game" category
///
/// All scoring functions are pure. Every constant comes from `RankingConfig`.

use std::collections::HashSet;

use serde::Serialize;

use crate::candidate::Candidate;
use crate::config::RankingConfig;
use crate::normalize::{normalize_token, tokenize, word_count};
use crate::tables::{NegativeTagTable, TagSet};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Which weighting formula applies to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Looks like a title lookup: lexical matching dominates
    Specific,
    /// Open-ended request: similarity, tags and quality dominate
    Recommendation,
}

/// Query-side artifacts, derived once per request.
#[derive(Debug, Clone)]
pub struct Query {
    raw: String,
    normalized: String,
    tokens: HashSet<String>,
}

impl Query {
    pub fn new(raw: &str) -> Self {
        Query {
            raw: raw.to_string(),
            normalized: normalize_token(raw),
            tokens: tokenize(raw),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Compact alphanumeric-only form used for title matching.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn tokens(&self) -> &HashSet<String> {
        &self.tokens
    }
}

/// Raw signal values for one candidate before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub title: f64,
    pub vector: f64,
    pub popularity: f64,
    pub quality_multiplier: f64,
    pub tag_hits: usize,
    pub negative_penalty: f64,
}

/// Diagnostic breakdown of the signals behind a final score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub title_score: f64,
    /// Raw similarity from the index
    pub similarity: f64,
    /// Similarity after the affine rescale
    pub vector_score: f64,
    pub popularity: f64,
    pub quality_multiplier: f64,
    pub tag_hits: usize,
    pub negative_penalty: f64,
}

/// A candidate with its final score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Rounded to 2 decimals; higher is better
    pub final_score: f64,
    /// Populated only when RankingConfig.debug_scoring is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

// ---------------------------------------------------------------------------
// Pure scoring functions
// ---------------------------------------------------------------------------

/// Word-count heuristic: fewer than `recommendation_min_words` words is a title lookup.
///
/// Approximate by nature ("cozy farming game" counts as Specific).
pub fn classify(query: &str, recommendation_min_words: usize) -> Intent {
    if word_count(query) < recommendation_min_words {
        Intent::Specific
    } else {
        Intent::Recommendation
    }
}

/// Normalized InDel similarity on a 0-100 scale (100 for identical strings).
pub fn fuzzy_ratio(a: &str, b: &str) -> f64 {
    rapidfuzz::distance::indel::normalized_similarity(a.chars(), b.chars()) * 100.0
}

/// Substring bonus plus tiered fuzzy bonus between normalized query and title.
pub fn title_score(normalized_query: &str, normalized_title: &str, cfg: &RankingConfig) -> f64 {
    let mut score = 0.0;

    if normalized_title.contains(normalized_query) {
        score += cfg.substring_bonus;
    }

    let ratio = fuzzy_ratio(normalized_query, normalized_title);
    if ratio > cfg.fuzzy_high_threshold {
        score += cfg.fuzzy_high_bonus;
    } else if ratio > cfg.fuzzy_medium_threshold {
        score += cfg.fuzzy_medium_bonus;
    }

    score
}

/// log10(reviews + 1) * scale: 0 for no reviews, diminishing returns after.
pub fn popularity_score(review_count: u64, cfg: &RankingConfig) -> f64 {
    (review_count as f64 + 1.0).log10() * cfg.popularity_log_scale
}

/// Mutually exclusive quality tiers; the critic score check wins when both apply.
pub fn quality_multiplier(critic_score: f64, positive_ratio: f64, cfg: &RankingConfig) -> f64 {
    if critic_score > cfg.critic_score_threshold {
        cfg.critic_multiplier
    } else if positive_ratio > cfg.positive_ratio_threshold {
        cfg.positive_ratio_multiplier
    } else {
        1.0
    }
}

/// Spread the tightly clustered raw similarity onto a range comparable to the other signals.
pub fn vector_score(raw_similarity: f64, cfg: &RankingConfig) -> f64 {
    (raw_similarity - cfg.similarity_offset) * cfg.similarity_scale
}

/// Weighted combination of signals for the given intent.
pub fn compose(signals: &Signals, intent: Intent, cfg: &RankingConfig) -> f64 {
    match intent {
        Intent::Specific => {
            signals.title * cfg.specific_title_weight
                + signals.vector * cfg.specific_vector_weight
                + signals.popularity * cfg.specific_popularity_weight
                + signals.negative_penalty
        }
        Intent::Recommendation => {
            signals.vector * cfg.recommendation_vector_weight
                + signals.tag_hits as f64 * cfg.recommendation_tag_weight
                + signals.popularity * cfg.recommendation_popularity_weight
                + signals.quality_multiplier * cfg.recommendation_quality_weight
                + signals.negative_penalty
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// CandidateScorer
// ---------------------------------------------------------------------------

/// Scores candidates against precomputed query-side artifacts.
///
/// Holds only shared references, so one scorer can score any number of
/// candidates independently.
pub struct CandidateScorer<'a> {
    config: &'a RankingConfig,
    negatives: &'a NegativeTagTable,
    query: &'a Query,
    tags: &'a TagSet,
    intent: Intent,
}

impl<'a> CandidateScorer<'a> {
    pub fn new(
        config: &'a RankingConfig,
        negatives: &'a NegativeTagTable,
        query: &'a Query,
        tags: &'a TagSet,
        intent: Intent,
    ) -> Self {
        CandidateScorer { config, negatives, query, tags, intent }
    }

    /// Compute every signal for one candidate.
    pub fn signals(&self, candidate: &Candidate) -> Signals {
        let cfg = self.config;
        let token_set = tokenize(&candidate.tag_text());

        Signals {
            title: title_score(self.query.normalized(), &normalize_token(&candidate.title), cfg),
            vector: vector_score(candidate.similarity, cfg),
            popularity: popularity_score(candidate.reviews, cfg),
            quality_multiplier: quality_multiplier(
                candidate.critic_score as f64,
                candidate.positive_ratio,
                cfg,
            ),
            tag_hits: self.tags.overlap(&token_set),
            negative_penalty: self.negatives.penalty(&token_set),
        }
    }

    pub fn score(&self, candidate: Candidate) -> ScoredCandidate {
        let signals = self.signals(&candidate);
        let final_score = round2(compose(&signals, self.intent, self.config));

        let breakdown = if self.config.debug_scoring {
            Some(ScoreBreakdown {
                title_score: signals.title,
                similarity: candidate.similarity,
                vector_score: signals.vector,
                popularity: signals.popularity,
                quality_multiplier: signals.quality_multiplier,
                tag_hits: signals.tag_hits,
                negative_penalty: signals.negative_penalty,
            })
        } else {
            None
        };

        ScoredCandidate { candidate, final_score, breakdown }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
