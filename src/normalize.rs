/// Text normalization shared by query-side and candidate-side matching.
///
/// Every comparison in the ranking pipeline goes through these functions so
/// that query tokens, candidate tag tokens and table entries agree on one
/// canonical form: lowercase ASCII alphanumerics only.

use std::collections::HashSet;

/// Raw whitespace-separated tokens must be longer than this to be kept.
const MIN_TOKEN_LEN: usize = 2;

/// Fallback tag words must be longer than this.
const MIN_FALLBACK_TAG_LEN: usize = 3;

/// Strip everything outside `[a-z0-9]` after case-folding.
///
/// Total: returns an empty string when nothing survives.
pub fn normalize_token(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Split on whitespace, drop raw tokens of length <= 2, normalize the rest.
///
/// Tokens that normalize to the empty string are discarded.
pub fn tokenize(s: &str) -> HashSet<String> {
    s.split_whitespace()
        .filter(|t| t.chars().count() > MIN_TOKEN_LEN)
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Naive tag extraction used when the LLM collaborator is unavailable:
/// lowercase words longer than 3 characters, in query order, deduplicated.
pub fn fallback_tags(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > MIN_FALLBACK_TAG_LEN)
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Number of whitespace-separated words.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token_strips_punctuation_and_case() {
        assert_eq!(normalize_token("Half-Life 2: Episode One"), "halflife2episodeone");
        assert_eq!(normalize_token("PORTAL 2"), "portal2");
    }

    #[test]
    fn test_normalize_token_empty_and_symbols() {
        assert_eq!(normalize_token(""), "");
        assert_eq!(normalize_token("!!! ---"), "");
    }

    #[test]
    fn test_normalize_token_drops_non_ascii() {
        assert_eq!(normalize_token("Pokémon"), "pokmon");
    }

    #[test]
    fn test_tokenize_filters_short_tokens() {
        let tokens = tokenize("an RPG of the Year");
        assert!(tokens.contains("rpg"));
        assert!(tokens.contains("the"));
        assert!(tokens.contains("year"));
        assert!(!tokens.contains("an"));
        assert!(!tokens.contains("of"));
    }

    #[test]
    fn test_tokenize_normalizes_commas() {
        let tokens = tokenize("Action, Adventure, Open World");
        assert!(tokens.contains("action"));
        assert!(tokens.contains("adventure"));
        assert!(tokens.contains("open"));
        assert!(tokens.contains("world"));
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_tokenize_drops_tokens_that_normalize_to_nothing() {
        assert!(tokenize("--- ...").is_empty());
    }

    #[test]
    fn test_fallback_tags() {
        assert_eq!(
            fallback_tags("Cozy farming game with cute animals"),
            vec!["cozy", "farming", "game", "with", "cute", "animals"]
        );
        assert!(fallback_tags("a an the").is_empty());
    }

    #[test]
    fn test_fallback_tags_dedup() {
        assert_eq!(fallback_tags("Zombie zombie ZOMBIE"), vec!["zombie"]);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("Elden Ring"), 2);
        assert_eq!(word_count("  cozy   farming game "), 3);
        assert_eq!(word_count(""), 0);
    }
}
