//! Ranking for disambiguation candidates.
//!
//! The term-lookup service returns standardized terms in its own order. The
//! session re-ranks them against the user's free-text description so the
//! closest term is the first choice offered, and de-duplicates entries that
//! differ only in case.

use strsim::jaro_winkler;

/// How many candidates are surfaced to the user at most.
pub const MAX_SUGGESTIONS: usize = 5;

/// Rank candidate terms by similarity to the user's description.
///
/// Returns at most [`MAX_SUGGESTIONS`] distinct terms, best match first.
/// Ties keep the service's original order. An empty candidate list ranks to
/// an empty list, which the caller degrades to a normal turn.
pub fn rank_suggestions(query: &str, candidates: &[String]) -> Vec<String> {
    let query_lower = query.to_lowercase();

    let mut seen: Vec<String> = Vec::new();
    let mut scored: Vec<(f64, usize, String)> = Vec::new();

    for (idx, term) in candidates.iter().enumerate() {
        let key = term.trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key.clone());
        scored.push((jaro_winkler(&query_lower, &key), idx, term.trim().to_string()));
    }

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });

    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, _, term)| term)
        .collect()
}
