//! Per-provider item storage with atomic snapshot swaps.
//!
//! Each registered provider owns one slot holding an immutable
//! [`ProviderSnapshot`]: its items, the index built from exactly those items,
//! and the load generation they came from. Writers replace the whole snapshot
//! under a short write lock; readers clone the `Arc` and never observe an item
//! list paired with an index from another generation.

use crate::search::SearchIndex;
use crate::types::Item;
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Items of one provider together with the index built from them.
#[derive(Debug, Default)]
pub struct ProviderSnapshot {
    /// Load generation this snapshot was produced by (0 = never loaded)
    pub generation: u64,
    /// Items in load order
    pub items: Vec<Item>,
    pub index: SearchIndex,
    /// Whether a load has completed for this provider
    pub loaded: bool,
}

impl ProviderSnapshot {
    /// Pairs `items` with a freshly built index.
    pub fn new(generation: u64, items: Vec<Item>) -> Self {
        let index = SearchIndex::build(&items);
        Self {
            generation,
            items,
            index,
            loaded: true,
        }
    }
}

/// A provider's snapshot tagged with its registration position.
#[derive(Debug, Clone)]
pub struct ScopedSnapshot {
    pub order: usize,
    pub snapshot: Arc<ProviderSnapshot>,
}

#[derive(Debug)]
struct ProviderSlot {
    name: String,
    snapshot: RwLock<Arc<ProviderSnapshot>>,
    /// Latest generation handed out by `begin`
    latest: AtomicU64,
}

/// Holds the current snapshot of every registered provider.
#[derive(Debug, Default)]
pub struct ItemStore {
    slots: Vec<ProviderSlot>,
    by_name: AHashMap<String, usize>,
}

impl ItemStore {
    /// Creates empty, unloaded slots for `names`, keeping their order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::default();
        for name in names {
            let name = name.into();
            if store.by_name.contains_key(&name) {
                continue;
            }
            store.by_name.insert(name.clone(), store.slots.len());
            store.slots.push(ProviderSlot {
                name,
                snapshot: RwLock::new(Arc::new(ProviderSnapshot::default())),
                latest: AtomicU64::new(0),
            });
        }
        store
    }

    fn slot(&self, name: &str) -> Option<&ProviderSlot> {
        self.by_name.get(name).map(|&order| &self.slots[order])
    }

    /// Current snapshot of a provider, or `None` if it is not registered.
    pub fn get(&self, name: &str) -> Option<Arc<ProviderSnapshot>> {
        self.slot(name).map(|slot| slot.snapshot.read().clone())
    }

    /// Registration position of a provider, used to order merged results.
    pub fn order(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Registered provider names in registration order.
    pub fn all_provider_names(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.name.clone()).collect()
    }

    /// Loaded snapshots with their registration position, in registration order.
    pub fn loaded_snapshots(&self) -> Vec<ScopedSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(order, slot)| Self::scoped(order, slot))
            .collect()
    }

    /// The loaded snapshot of a single provider, tagged for merging.
    pub fn loaded_snapshot(&self, name: &str) -> Option<ScopedSnapshot> {
        let order = self.order(name)?;
        Self::scoped(order, &self.slots[order])
    }

    fn scoped(order: usize, slot: &ProviderSlot) -> Option<ScopedSnapshot> {
        let snapshot = slot.snapshot.read().clone();
        snapshot
            .loaded
            .then_some(ScopedSnapshot { order, snapshot })
    }

    /// Starts a new load generation for a provider.
    ///
    /// Generations are handed out in increasing order. A result is only
    /// published if no newer generation has been published before it, so a
    /// newer load that fails never blocks an older one that succeeds.
    pub fn begin(&self, name: &str) -> Option<u64> {
        self.slot(name)
            .map(|slot| slot.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Replaces a provider's items and index as one unit.
    ///
    /// Returns `false` (leaving the current snapshot untouched) when the provider
    /// is unknown or a newer generation has already been published.
    pub fn set(&self, name: &str, snapshot: ProviderSnapshot) -> bool {
        let Some(slot) = self.slot(name) else {
            return false;
        };

        let mut current = slot.snapshot.write();
        if snapshot.generation <= current.generation {
            tracing::debug!(
                "Discarding stale snapshot for '{}' (generation {}, published {})",
                name,
                snapshot.generation,
                current.generation
            );
            return false;
        }

        *current = Arc::new(snapshot);
        true
    }

    /// Generation of the snapshot currently published for `name` (0 = none).
    pub fn published_generation(&self, name: &str) -> Option<u64> {
        self.slot(name).map(|slot| slot.snapshot.read().generation)
    }

    /// Whether a result of `generation` can no longer be published for `name`.
    pub fn is_stale(&self, name: &str, generation: u64) -> bool {
        self.published_generation(name)
            .is_none_or(|published| published >= generation)
    }
}
