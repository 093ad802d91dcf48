/// Final ordering, title deduplication and truncation.

use std::collections::HashSet;

use super::scoring::ScoredCandidate;
use crate::normalize::normalize_token;

/// Sort by final score descending (stable: ties keep index order), keep the
/// first candidate per normalized title, stop after `k` unique titles.
///
/// Returning fewer than `k` items is not an error.
pub fn select_top_k(mut scored: Vec<ScoredCandidate>, k: usize) -> Vec<ScoredCandidate> {
    scored.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut seen_titles = HashSet::new();
    let mut unique = Vec::with_capacity(k.min(scored.len()));

    for hit in scored {
        if unique.len() >= k {
            break;
        }
        if seen_titles.insert(normalize_token(&hit.candidate.title)) {
            unique.push(hit);
        }
    }

    unique
}
