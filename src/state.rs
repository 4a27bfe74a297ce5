//! Session state: loading providers, refreshing them and answering queries.
//!
//! [`ContextState`] is the central coordination point for:
//! - Fetching each provider's items from the host ([`ItemSource`])
//! - Publishing items + index snapshots into the [`ItemStore`]
//! - Tracking the initial load and per-provider fetch failures
//! - Answering synchronous queries against the latest snapshots
//!
//! Fetches suspend; queries never do. A session switch cancels in-flight
//! fetches and drops their results.

use crate::config::{LoaderOptions, ProviderConfig, SessionConfig};
use crate::error::FetchError;
use crate::host::ItemSource;
use crate::search::{search_snapshots, suggest_provider};
use crate::store::{ItemStore, ProviderSnapshot};
use crate::types::{Item, RawItem};
use ahash::{AHashMap, AHashSet};
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Summary of a `load_all` or `refresh` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Providers whose new snapshot was published
    pub loaded: Vec<String>,
    /// Providers left out because indexing is disabled (published empty)
    pub skipped: Vec<String>,
    /// Providers whose fetch failed; their previous snapshot is kept
    pub failed: Vec<String>,
    /// Providers whose result was dropped because a newer load or a session
    /// switch overtook it
    pub superseded: Vec<String>,
    /// Host records dropped as malformed or duplicate
    pub dropped_items: usize,
}

impl LoadReport {
    fn record(&mut self, name: &str, outcome: ProviderOutcome) {
        let name = name.to_string();
        match outcome {
            ProviderOutcome::Loaded { dropped } => {
                self.loaded.push(name);
                self.dropped_items += dropped;
            }
            ProviderOutcome::Failed => self.failed.push(name),
            ProviderOutcome::Superseded => self.superseded.push(name),
        }
    }
}

/// Load and failure status of a single provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub name: String,
    pub loaded: bool,
    pub item_count: usize,
    pub generation: u64,
    /// Most recent fetch failure, cleared by the next successful load
    pub failure: Option<FetchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProviderOutcome {
    Loaded { dropped: usize },
    Failed,
    Superseded,
}

/// Progress of the first fetch attempt of every in-scope provider.
#[derive(Debug, Default)]
struct InitialLoad {
    started: bool,
    outstanding: AHashSet<String>,
}

/// A fetch failure together with the load generation that produced it.
#[derive(Debug)]
struct RecordedFailure {
    generation: u64,
    error: FetchError,
}

/// Everything scoped to one workspace session.
#[derive(Debug)]
struct Session {
    config: SessionConfig,
    store: ItemStore,
    cancel: CancellationToken,
    initial: Mutex<InitialLoad>,
    initial_done: watch::Sender<bool>,
    failures: Mutex<AHashMap<String, RecordedFailure>>,
}

impl Session {
    fn new(config: SessionConfig, cancel: CancellationToken) -> Self {
        let store = ItemStore::new(config.submenu_providers().map(|p| p.title.clone()));
        let outstanding = config
            .submenu_providers()
            .filter(|p| config.is_in_scope(p))
            .map(|p| p.title.clone())
            .collect();

        Self {
            config,
            store,
            cancel,
            initial: Mutex::new(InitialLoad {
                started: false,
                outstanding,
            }),
            initial_done: watch::Sender::new(false),
            failures: Mutex::new(AHashMap::new()),
        }
    }

    fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.config.submenu_providers().find(|p| p.title == name)
    }

    /// Records a failed fetch unless a newer snapshot or failure already
    /// describes the provider.
    fn record_failure(&self, name: &str, generation: u64, error: FetchError) {
        let mut failures = self.failures.lock();
        if self.store.is_stale(name, generation)
            || failures
                .get(name)
                .is_some_and(|recorded| recorded.generation > generation)
        {
            return;
        }
        failures.insert(name.to_string(), RecordedFailure { generation, error });
    }

    /// Publishes `snapshot` and clears failures older than it.
    ///
    /// Runs under the failures lock so a concurrent `record_failure` either sees
    /// the new snapshot or has its record cleared here.
    fn publish_snapshot(&self, name: &str, snapshot: ProviderSnapshot) -> bool {
        let generation = snapshot.generation;
        let mut failures = self.failures.lock();
        if !self.store.set(name, snapshot) {
            return false;
        }
        if failures
            .get(name)
            .is_some_and(|recorded| recorded.generation < generation)
        {
            failures.remove(name);
        }
        true
    }

    /// Records that `name` finished its first fetch attempt, whatever the outcome.
    fn mark_attempted(&self, name: &str) {
        let mut initial = self.initial.lock();
        initial.outstanding.remove(name);
        self.complete_if_idle(&initial);
    }

    fn start_initial_load(&self) {
        self.initial.lock().started = true;
    }

    fn finish_initial_load(&self) {
        let initial = self.initial.lock();
        self.complete_if_idle(&initial);
    }

    fn complete_if_idle(&self, initial: &InitialLoad) {
        if initial.started && initial.outstanding.is_empty() && !*self.initial_done.borrow() {
            self.initial_done.send_replace(true);
            tracing::info!("Initial context provider load complete");
        }
    }
}

/// Shared state for context item loading and search.
pub struct ContextState {
    session: RwLock<Arc<Session>>,
    source: Arc<dyn ItemSource>,
    options: LoaderOptions,
    /// Parent of every session's cancellation token
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl std::fmt::Debug for ContextState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session();
        f.debug_struct("ContextState")
            .field("providers", &session.store.all_provider_names())
            .field("initial_load_complete", &*session.initial_done.borrow())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ContextState {
    /// Create a new ContextState for one session. Nothing is fetched until
    /// [`ContextState::load_all`] is called.
    pub fn new(config: SessionConfig, source: Arc<dyn ItemSource>, options: LoaderOptions) -> Self {
        let shutdown = CancellationToken::new();
        let session = Session::new(config, shutdown.child_token());
        Self {
            session: RwLock::new(Arc::new(session)),
            source,
            options,
            shutdown,
            tracker: TaskTracker::new(),
        }
    }

    fn session(&self) -> Arc<Session> {
        self.session.read().clone()
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Tracker owning background tasks spawned for this state.
    pub(crate) fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Cancelled once [`ContextState::shutdown`] is called.
    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Registered provider names in registration order.
    pub fn provider_names(&self) -> Vec<String> {
        self.session().store.all_provider_names()
    }

    /// True once every in-scope provider has finished its first fetch attempt.
    pub fn initial_load_complete(&self) -> bool {
        *self.session().initial_done.borrow()
    }

    /// Waits until the initial load of the current session completes.
    ///
    /// Returns `false` if the session was torn down first.
    pub async fn wait_initial_load(&self) -> bool {
        let mut done = self.session().initial_done.subscribe();
        done.wait_for(|complete| *complete).await.is_ok()
    }

    /// Fetches and indexes every registered provider concurrently.
    ///
    /// Providers that depend on indexing are published empty when indexing is
    /// disabled. Failures are recorded per provider and never abort the others.
    pub async fn load_all(&self) -> LoadReport {
        let session = self.session();
        let mut report = LoadReport::default();

        let mut in_scope = Vec::new();
        for provider in session.config.submenu_providers() {
            if session.config.is_in_scope(provider) {
                in_scope.push(provider.title.clone());
            } else if let Some(generation) = session.store.begin(&provider.title) {
                tracing::debug!(
                    "Skipping '{}': indexing is disabled for this session",
                    provider.title
                );
                session
                    .store
                    .set(&provider.title, ProviderSnapshot::new(generation, Vec::new()));
                report.skipped.push(provider.title.clone());
            }
        }

        tracing::info!(
            "Loading {} context providers ({} skipped)",
            in_scope.len(),
            report.skipped.len()
        );
        session.start_initial_load();

        let outcomes = join_all(
            in_scope
                .iter()
                .map(|name| self.load_provider(&session, name)),
        )
        .await;
        for (name, outcome) in in_scope.iter().zip(outcomes) {
            report.record(name, outcome);
        }

        session.finish_initial_load();
        report
    }

    /// Re-fetches exactly the named providers and swaps in their new snapshots.
    ///
    /// Unknown providers and providers excluded by the indexing setting are
    /// ignored. Queries keep seeing the previous snapshot until the swap.
    pub async fn refresh<I, S>(&self, names: I) -> LoadReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let session = self.session();
        let mut targets: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref();
            match session.provider(name) {
                Some(provider) if session.config.is_in_scope(provider) => {
                    if !targets.iter().any(|t| t == name) {
                        targets.push(name.to_string());
                    }
                }
                Some(_) => tracing::debug!("Not refreshing '{}': indexing is disabled", name),
                None => tracing::debug!("Not refreshing unknown provider '{}'", name),
            }
        }

        tracing::debug!("Refreshing context providers: {:?}", targets);
        let outcomes = join_all(targets.iter().map(|name| self.load_provider(&session, name))).await;

        let mut report = LoadReport::default();
        for (name, outcome) in targets.iter().zip(outcomes) {
            report.record(name, outcome);
        }
        report
    }

    /// Fetch, validate, index and publish one provider.
    async fn load_provider(&self, session: &Session, name: &str) -> ProviderOutcome {
        let Some(generation) = session.store.begin(name) else {
            return ProviderOutcome::Superseded;
        };

        let fetch = async {
            let request = self.source.load_submenu_items(name, None);
            match self.options.fetch_timeout {
                Some(after) => tokio::time::timeout(after, request).await.unwrap_or_else(|_| {
                    Err(FetchError::Timeout {
                        provider: name.to_string(),
                        after,
                    })
                }),
                None => request.await,
            }
        };

        let fetched = tokio::select! {
            biased;
            () = session.cancel.cancelled() => Err(FetchError::Cancelled {
                provider: name.to_string(),
            }),
            result = fetch => result,
        };

        let outcome = match fetched {
            Ok(raw) => self.publish(session, name, generation, raw),
            Err(FetchError::Cancelled { .. }) => {
                tracing::debug!("Abandoned fetch for '{}' (session ended)", name);
                ProviderOutcome::Superseded
            }
            Err(e) => {
                tracing::warn!("Failed to load context provider '{}': {}", name, e);
                session.record_failure(name, generation, e);
                ProviderOutcome::Failed
            }
        };

        session.mark_attempted(name);
        outcome
    }

    fn publish(
        &self,
        session: &Session,
        name: &str,
        generation: u64,
        raw: Vec<RawItem>,
    ) -> ProviderOutcome {
        if session.cancel.is_cancelled() || session.store.is_stale(name, generation) {
            return ProviderOutcome::Superseded;
        }

        let (items, dropped) = validate_items(name, raw);
        let start = std::time::Instant::now();
        let snapshot = ProviderSnapshot::new(generation, items);
        let item_count = snapshot.items.len();
        let token_count = snapshot.index.token_count();

        if !session.publish_snapshot(name, snapshot) {
            return ProviderOutcome::Superseded;
        }

        tracing::info!(
            "Indexed {} items for '{}' (generation {}, {} tokens) in {:?}",
            item_count,
            name,
            generation,
            token_count,
            start.elapsed()
        );
        ProviderOutcome::Loaded { dropped }
    }

    /// Ranked items for `query`, from one provider or all loaded providers.
    ///
    /// An unknown or not-yet-loaded provider yields an empty list.
    pub fn get_submenu_context_items(&self, provider: Option<&str>, query: &str) -> Vec<Item> {
        self.get_submenu_context_items_limited(provider, query, None)
    }

    /// Like [`ContextState::get_submenu_context_items`], truncated to `limit` results.
    pub fn get_submenu_context_items_limited(
        &self,
        provider: Option<&str>,
        query: &str,
        limit: Option<usize>,
    ) -> Vec<Item> {
        let session = self.session();

        let snapshots = match provider {
            None => session.store.loaded_snapshots(),
            Some(name) => match session.store.loaded_snapshot(name) {
                Some(scoped) => vec![scoped],
                None => {
                    if session.store.order(name).is_none() {
                        let names = session.store.all_provider_names();
                        match suggest_provider(name, names.iter().map(String::as_str)) {
                            Some((closest, score)) => tracing::debug!(
                                "Query for unknown provider '{}' (closest: '{}', {:.2})",
                                name,
                                closest,
                                score
                            ),
                            None => tracing::debug!("Query for unknown provider '{}'", name),
                        }
                    }
                    return Vec::new();
                }
            },
        };

        search_snapshots(&snapshots, query, limit)
    }

    /// Last recorded fetch failure per provider, in registration order.
    pub fn failures(&self) -> Vec<FetchError> {
        let session = self.session();
        let failures = session.failures.lock();
        session
            .store
            .all_provider_names()
            .iter()
            .filter_map(|name| failures.get(name).map(|recorded| recorded.error.clone()))
            .collect()
    }

    /// Load status of every registered provider, in registration order.
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        let session = self.session();
        let failures = session.failures.lock();
        session
            .store
            .all_provider_names()
            .into_iter()
            .filter_map(|name| {
                let snapshot = session.store.get(&name)?;
                Some(ProviderStatus {
                    loaded: snapshot.loaded,
                    item_count: snapshot.items.len(),
                    generation: snapshot.generation,
                    failure: failures.get(&name).map(|recorded| recorded.error.clone()),
                    name,
                })
            })
            .collect()
    }

    /// Tears down the current session and starts an empty one for `config`.
    ///
    /// In-flight fetches of the old session are cancelled and their results
    /// discarded. Call [`ContextState::load_all`] to populate the new session.
    pub fn switch_session(&self, config: SessionConfig) {
        let next = Arc::new(Session::new(config, self.shutdown.child_token()));
        let previous = std::mem::replace(&mut *self.session.write(), next);
        previous.cancel.cancel();
        tracing::info!("Context session switched, in-flight loads abandoned");
    }

    /// Cancels in-flight fetches and stops background workers.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

/// Converts host records into items, dropping malformed records and repeated ids.
fn validate_items(provider: &str, raw: Vec<RawItem>) -> (Vec<Item>, usize) {
    let total = raw.len();
    let mut seen = AHashSet::with_capacity(total);
    let mut items = Vec::with_capacity(total);

    for record in raw {
        match record.into_item(provider) {
            Ok(item) => {
                if seen.insert(item.id.clone()) {
                    items.push(item);
                } else {
                    tracing::warn!("Dropping duplicate item '{}' from '{}'", item.id, provider);
                }
            }
            Err(e) => tracing::warn!("Dropping item from '{}': {}", provider, e),
        }
    }

    let dropped = total - items.len();
    (items, dropped)
}
