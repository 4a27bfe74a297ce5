//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `workspace_items`: the six file items used across the search tests
//! - `source`: a [`MemorySource`] serving `workspace_items` for `file`
//! - `loaded_state`: a [`ContextState`] over `source` with `load_all` done

use context_index::{
    ContextState, Item, LoaderOptions, MemorySource, ProviderConfig, SessionConfig,
};
use rstest::fixture;
use std::sync::Arc;

/// Items served for the `file` provider, in load order.
#[fixture]
pub fn workspace_items() -> Vec<Item> {
    vec![
        file_item("/workspace/package.json", "package.json", "llm-info/package.json"),
        file_item("/workspace/fetch/package.json", "package.json", "fetch/package.json"),
        file_item(
            "/workspace/src/PosthogPageView.ts",
            "PosthogPageView.ts",
            "src/PosthogPageView.ts",
        ),
        file_item("/workspace/src/analytics.ts", "analytics.ts", "src/analytics.ts"),
        file_item("/workspace/src/Settings.tsx", "Settings.tsx", "src/Settings.tsx"),
        file_item("/workspace/src/SidePanel.tsx", "SidePanel.tsx", "src/SidePanel.tsx"),
    ]
}

#[fixture]
pub fn source(workspace_items: Vec<Item>) -> Arc<MemorySource> {
    let source = MemorySource::new();
    source.set_items("file", workspace_items);
    Arc::new(source)
}

/// A state with the `file` provider registered and loaded.
#[fixture]
pub async fn loaded_state(source: Arc<MemorySource>) -> ContextState {
    context_index::tracing::init(false);
    let state = state_for(source, vec![file_provider()]);
    state.load_all().await;
    state
}

#[allow(dead_code)]
pub fn file_item(id: &str, title: &str, description: &str) -> Item {
    Item::new(id, title, description, "file")
}

#[allow(dead_code)]
pub fn file_provider() -> ProviderConfig {
    ProviderConfig::submenu("file").depends_on_indexing(true)
}

#[allow(dead_code)] // Used across different integration test crates
pub fn state_for(source: Arc<MemorySource>, providers: Vec<ProviderConfig>) -> ContextState {
    ContextState::new(
        SessionConfig::new(providers),
        source,
        LoaderOptions::default(),
    )
}

/// Titles of `items`, in result order.
#[allow(dead_code)]
pub fn titles(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.title.as_str()).collect()
}

/// Descriptions of `items`, in result order.
#[allow(dead_code)]
pub fn descriptions(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.description.as_str()).collect()
}

/// Polls `condition` every 10ms for up to two seconds.
#[allow(dead_code)]
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    condition()
}
