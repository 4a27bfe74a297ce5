//! Query resolution across one or many provider snapshots.
//!
//! Results from every provider in scope are merged into a single ranking: all
//! exact matches across providers come before any prefix match, and so on.
//! Ties fall back to provider registration order, then item load order.

use crate::store::ScopedSnapshot;
use crate::types::Item;
use ahash::AHashSet;
use rapidfuzz::distance::jaro_winkler;

use super::scoring::{MatchQuery, Rank};
use super::tokenize::{normalize_query, query_words};

/// Minimum similarity for a registered provider to be reported as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A matched item awaiting the global sort.
struct Hit<'a> {
    rank: Rank,
    order: usize,
    position: usize,
    item: &'a Item,
}

/// Prepares a raw query string for matching.
pub(crate) fn prepare_query(text: &str) -> MatchQuery {
    let normalized = normalize_query(text);
    let words = query_words(&normalized)
        .into_iter()
        .map(str::to_string)
        .collect();
    MatchQuery::new(normalized, words)
}

/// Runs `text` against `snapshots` and returns the ranked, de-duplicated items.
///
/// An empty query lists every item in load order. `limit` truncates after
/// ranking and de-duplication.
pub fn search_snapshots(
    snapshots: &[ScopedSnapshot],
    text: &str,
    limit: Option<usize>,
) -> Vec<Item> {
    let query = prepare_query(text);
    let limit = limit.unwrap_or(usize::MAX);
    let mut seen: AHashSet<(usize, &str)> = AHashSet::new();

    if query.is_empty() {
        return snapshots
            .iter()
            .flat_map(|scoped| {
                scoped
                    .snapshot
                    .items
                    .iter()
                    .map(move |item| (scoped.order, item))
            })
            .filter(|(order, item)| seen.insert((*order, item.id.as_str())))
            .take(limit)
            .map(|(_, item)| item.clone())
            .collect();
    }

    let mut hits: Vec<Hit<'_>> = snapshots
        .iter()
        .flat_map(|scoped| {
            let items = &scoped.snapshot.items;
            scoped
                .snapshot
                .index
                .matches(&query)
                .map(move |(position, rank)| Hit {
                    rank,
                    order: scoped.order,
                    position,
                    item: &items[position],
                })
                .collect::<Vec<_>>()
        })
        .collect();

    hits.sort_unstable_by_key(|hit| (hit.rank, hit.order, hit.position));

    tracing::trace!(
        "Query '{}' matched {} items across {} providers",
        query.normalized,
        hits.len(),
        snapshots.len()
    );

    hits.into_iter()
        .filter(|hit| seen.insert((hit.order, hit.item.id.as_str())))
        .take(limit)
        .map(|hit| hit.item.clone())
        .collect()
}

/// Finds the registered provider name closest to `name`, if any is close enough.
pub(crate) fn suggest_provider<'a>(
    name: &str,
    registered: impl IntoIterator<Item = &'a str>,
) -> Option<(&'a str, f64)> {
    registered
        .into_iter()
        .map(|candidate| {
            (
                candidate,
                jaro_winkler::similarity(name.chars(), candidate.chars()),
            )
        })
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
}
