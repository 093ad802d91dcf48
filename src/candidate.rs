/// Typed candidate records parsed from raw ANN matches.
///
/// Index metadata is loosely typed: numbers may arrive as JSON numbers or as
/// strings ("1234.0", "N/A"), lists as JSON arrays, bracketed literals or
/// comma-separated strings. All of that is resolved here, once, by total
/// functions. A field that cannot be parsed falls back to a safe default and
/// its name is recorded in `Candidate::malformed_fields`; parsing never fails.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::index::RawMatch;

const UNKNOWN_TITLE: &str = "Unknown";

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub price: f64,
    pub image: String,
    /// Raw similarity returned by the index (relative, collaborator-defined range)
    pub similarity: f64,
    pub reviews: u64,
    pub positive_ratio: f64,
    /// Critic (Metacritic) score, 0 when absent
    pub critic_score: u32,
    pub release_date: String,
    pub screenshots: Vec<String>,
    pub trailer: String,
    /// Metadata fields that were present but unparseable and replaced by defaults
    #[serde(skip)]
    pub malformed_fields: Vec<&'static str>,
}

impl Candidate {
    /// Parse a raw index match. Never fails; dirty fields degrade to defaults.
    pub fn from_match(raw: RawMatch) -> Self {
        let md = &raw.metadata;
        let mut malformed = Vec::new();
        if raw.metadata_malformed {
            malformed.push("metadata");
        }

        let reviews = number_field(md, "reviews", &mut malformed);
        let positive_ratio = number_field(md, "positive_ratio", &mut malformed);
        let critic_score = number_field(md, "metacritic", &mut malformed);
        let price = number_field(md, "price", &mut malformed);
        let screenshots = screenshots_field(md, &mut malformed);

        let title = text_field(md, "title");
        let title = if title.trim().is_empty() { UNKNOWN_TITLE.to_string() } else { title };

        let similarity = if raw.score.is_finite() {
            raw.score
        } else {
            malformed.push("score");
            0.0
        };

        if !malformed.is_empty() {
            tracing::debug!(
                id = %raw.id,
                fields = ?malformed,
                "Malformed candidate metadata replaced with defaults"
            );
        }

        Candidate {
            title,
            description: text_field(md, "description"),
            genres: split_list(&text_field(md, "genres")),
            tags: split_list(&text_field(md, "tags")),
            price: price.max(0.0),
            image: text_field(md, "image"),
            similarity,
            // int(float(x)) semantics: truncate toward zero, negatives clamp to 0
            reviews: reviews.max(0.0).trunc() as u64,
            positive_ratio: positive_ratio.max(0.0),
            critic_score: critic_score.max(0.0).trunc() as u32,
            release_date: text_field(md, "release_date"),
            screenshots,
            trailer: text_field(md, "trailer"),
            malformed_fields: malformed,
            id: raw.id,
        }
    }

    /// Free text used for tag overlap and negative signals: tags followed by genres.
    pub fn tag_text(&self) -> String {
        format!("{} {}", self.tags.join(", "), self.genres.join(", "))
    }
}

/// Split a comma-separated metadata string into trimmed, non-empty items.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// String form of a metadata field; numbers are rendered, everything else is empty.
fn text_field(md: &Map<String, Value>, key: &str) -> String {
    match md.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

/// Numeric metadata: JSON numbers or numeric strings. Absent/null is 0 without a
/// diagnostic; anything else unparseable is 0 and recorded as malformed.
fn number_field(md: &Map<String, Value>, key: &'static str, malformed: &mut Vec<&'static str>) -> f64 {
    let parsed = match md.get(key) {
        None | Some(Value::Null) => return 0.0,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return 0.0,
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => {
            malformed.push(key);
            0.0
        }
    }
}

/// Screenshot URLs from a JSON array, a bracketed list literal, or a
/// comma-separated string. Only `http`-prefixed entries are kept.
fn screenshots_field(md: &Map<String, Value>, malformed: &mut Vec<&'static str>) -> Vec<String> {
    let items: Vec<String> = match md.get("screenshots") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => parse_list_literal(s),
        Some(_) => {
            malformed.push("screenshots");
            Vec::new()
        }
    };

    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| s.starts_with("http"))
        .collect()
}

/// Parse `["a", "b"]`, `['a', 'b']` or `a, b`.
fn parse_list_literal(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
            return items;
        }
        let inner = trimmed.trim_start_matches('[').trim_end_matches(']');
        return inner
            .split(',')
            .map(|s| s.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    split_list(trimmed)
}
