//! Per-provider search index over item titles and descriptions.

use crate::types::Item;

use super::scoring::{IndexedField, MatchQuery, Rank, rank_fields};
use super::tokenize::tokenize;

/// Tokenized fields of one item.
#[derive(Debug, Clone)]
struct IndexEntry {
    title: IndexedField,
    description: IndexedField,
}

/// A searchable index built from one provider's item list.
///
/// Entries are position-aligned with the items they were built from, so a
/// match's position doubles as its load-order tie-break key. The index is never
/// patched: a refresh builds a new one from the full item list.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
    token_count: usize,
}

impl SearchIndex {
    /// Builds an index over `items`. Pure and deterministic.
    pub fn build(items: &[Item]) -> Self {
        let start = std::time::Instant::now();

        let entries: Vec<IndexEntry> = items
            .iter()
            .map(|item| IndexEntry {
                title: IndexedField::new(tokenize(&item.title)),
                description: IndexedField::new(tokenize(&item.description)),
            })
            .collect();
        let token_count = entries
            .iter()
            .map(|entry| entry.title.text.tokens.len() + entry.description.text.tokens.len())
            .sum();

        tracing::debug!(
            "Built search index: {} items, {} tokens in {:?}",
            entries.len(),
            token_count,
            start.elapsed()
        );

        Self {
            entries,
            token_count,
        }
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of tokens across all indexed fields.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Ranks every matching item, yielding `(position, rank)` in position order.
    pub(crate) fn matches<'a>(
        &'a self,
        query: &'a MatchQuery,
    ) -> impl Iterator<Item = (usize, Rank)> + 'a {
        self.entries
            .iter()
            .enumerate()
            .filter_map(move |(position, entry)| {
                rank_fields(&entry.title, &entry.description, query).map(|rank| (position, rank))
            })
    }
}
