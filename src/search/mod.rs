//! Tiered search over context item titles and descriptions.
//!
//! This module provides tokenization, per-provider indexing, match tier
//! classification and the cross-provider query merge.

// Module declarations
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod tokenize;

// Public re-exports (used via lib.rs)
pub use index::SearchIndex;
pub use query::search_snapshots;
pub use scoring::{Field, Rank, Tier};

// Internal re-exports
pub(crate) use query::suggest_provider;
