/// Static synonym and negative-signal tables.
///
/// Both tables are built once from configuration and shared read-only by
/// every request. Keys and values are normalized at load time into
/// *phrases*: the normalized words of an entry joined by a single space
/// ("first-person shooter" -> "firstperson shooter"). A phrase matches a
/// candidate token set when every one of its words is in the set, so
/// multi-word entries stay comparable with tokens produced by
/// [`crate::normalize::tokenize`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::normalize::normalize_token;

/// Normalize a free-text tag into a phrase, or `None` when no word survives.
///
/// Word filtering matches `tokenize` (raw length > 2, non-empty after
/// normalization) so that a phrase can only contain matchable words.
pub fn normalize_phrase(s: &str) -> Option<String> {
    let words: Vec<String> = s
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(normalize_token)
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// True when every word of `phrase` appears in `tokens`.
pub fn phrase_matches(phrase: &str, tokens: &HashSet<String>) -> bool {
    let mut words = phrase.split(' ').peekable();
    words.peek().is_some() && words.all(|w| tokens.contains(w))
}

/// Set of normalized intent-tag phrases for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    phrases: BTreeSet<String>,
}

impl TagSet {
    /// Build from raw tags (LLM output or fallback tokenizer), normalizing each.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        TagSet {
            phrases: tags.iter().filter_map(|t| normalize_phrase(t.as_ref())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.contains(phrase)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(String::as_str)
    }

    pub fn is_superset(&self, other: &TagSet) -> bool {
        self.phrases.is_superset(&other.phrases)
    }

    /// Number of phrases present in a candidate's token set.
    pub fn overlap(&self, tokens: &HashSet<String>) -> usize {
        self.phrases.iter().filter(|p| phrase_matches(p, tokens)).count()
    }
}

/// `canonical tag -> [related phrase, ...]`, normalized at construction.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl SynonymTable {
    pub fn new(raw: &BTreeMap<String, Vec<String>>) -> Self {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, values) in raw {
            let Some(key) = normalize_phrase(key) else { continue };
            let slot = entries.entry(key).or_default();
            for phrase in values.iter().filter_map(|v| normalize_phrase(v)) {
                if !slot.contains(&phrase) {
                    slot.push(phrase);
                }
            }
        }
        SynonymTable { entries }
    }

    pub fn get(&self, tag: &str) -> Option<&[String]> {
        self.entries.get(tag).map(Vec::as_slice)
    }

    /// Single-pass expansion: union each input tag's synonym list into the set.
    ///
    /// The result is always a superset of `tags`.
    pub fn expand(&self, tags: &TagSet) -> TagSet {
        let mut phrases = tags.phrases.clone();
        for tag in &tags.phrases {
            if let Some(synonyms) = self.entries.get(tag) {
                phrases.extend(synonyms.iter().cloned());
            }
        }
        TagSet { phrases }
    }
}

/// Curated "not a game" indicator lists with a fixed per-category penalty.
#[derive(Debug, Clone)]
pub struct NegativeTagTable {
    categories: Vec<(String, Vec<String>)>,
    penalty: f64,
}

impl NegativeTagTable {
    pub fn new(raw: &BTreeMap<String, Vec<String>>, penalty: f64) -> Self {
        let categories = raw
            .iter()
            .map(|(name, values)| {
                (name.clone(), values.iter().filter_map(|v| normalize_phrase(v)).collect())
            })
            .collect();
        NegativeTagTable { categories, penalty }
    }

    /// Categories with at least one indicator present in `tokens`.
    pub fn matched_categories<'a>(&'a self, tokens: &HashSet<String>) -> Vec<&'a str> {
        self.categories
            .iter()
            .filter(|(_, indicators)| indicators.iter().any(|p| phrase_matches(p, tokens)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// One penalty per matching category; several hits in a category count once.
    pub fn penalty(&self, tokens: &HashSet<String>) -> f64 {
        self.matched_categories(tokens).len() as f64 * self.penalty
    }
}
