mod common;

use ahash::AHashSet;
use assert2::check;
use common::{
    descriptions, file_item, file_provider, loaded_state, source, state_for, titles,
    workspace_items,
};
use context_index::{ContextState, Item, MemorySource, ProviderConfig};
use rstest::rstest;
use std::sync::Arc;

/// Test: Empty query returns every item in load order.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_query_browses_all(
    #[future] loaded_state: ContextState,
    workspace_items: Vec<Item>,
) {
    let state = loaded_state.await;

    let results = state.get_submenu_context_items(Some("file"), "");
    check!(results.len() == 6);
    check!(results == workspace_items);

    let whitespace = state.get_submenu_context_items(Some("file"), "   ");
    check!(whitespace == workspace_items);
}

/// Test: Exact title match keeps both package.json items in load order.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn exact_match_in_load_order(#[future] loaded_state: ContextState) {
    let state = loaded_state.await;

    let results = state.get_submenu_context_items(Some("file"), "package.json");
    check!(descriptions(&results) == vec!["llm-info/package.json", "fetch/package.json"]);
}

/// Test: Sub-word prefix finds the camelCase file and nothing else.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn camel_case_prefix(#[future] loaded_state: ContextState) {
    let state = loaded_state.await;

    let results = state.get_submenu_context_items(Some("file"), "Pos");
    check!(titles(&results) == vec!["PosthogPageView.ts"]);

    // "page" starts a camelCase sub-word of the same title
    let results = state.get_submenu_context_items(Some("file"), "page");
    check!(titles(&results)[0] == "PosthogPageView.ts");
}

/// Test: Misspelled query still finds package.json first.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fuzzy_typo(#[future] loaded_state: ContextState) {
    let state = loaded_state.await;

    let results = state.get_submenu_context_items(Some("file"), "pakage");
    check!(!results.is_empty());
    check!(results[0].title == "package.json");
}

/// Test: Single letter puts the two files whose title starts with it first.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn single_letter_title_start(#[future] loaded_state: ContextState) {
    let state = loaded_state.await;

    let results = state.get_submenu_context_items(Some("file"), "S");
    let top: AHashSet<&str> = titles(&results).into_iter().take(2).collect();
    check!(top == ["Settings.tsx", "SidePanel.tsx"].into_iter().collect::<AHashSet<_>>());
}

/// Test: Query matching nothing returns an empty list.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn no_match(#[future] loaded_state: ContextState) {
    let state = loaded_state.await;

    check!(state.get_submenu_context_items(Some("file"), "zzzzz").is_empty());
    check!(state.get_submenu_context_items(None, "zzzzz").is_empty());
}

/// Test: Path fragments only present in descriptions still match.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn description_only_match(#[future] loaded_state: ContextState) {
    let state = loaded_state.await;

    let results = state.get_submenu_context_items(Some("file"), "llm-info");
    check!(titles(&results) == vec!["package.json"]);
    check!(results[0].id == "/workspace/package.json");

    let results = state.get_submenu_context_items(Some("file"), "src/");
    check!(
        titles(&results)
            == vec![
                "PosthogPageView.ts",
                "analytics.ts",
                "Settings.tsx",
                "SidePanel.tsx"
            ]
    );
}

/// Test: Title matches rank above description-only matches of the same tier.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn title_outranks_description() {
    let source = MemorySource::new();
    source.set_items(
        "file",
        [
            file_item("/w/docs/readme.md", "readme.md", "docs/readme.md"),
            file_item("/w/docs.md", "docs.md", "docs.md"),
        ],
    );
    let state = state_for(Arc::new(source), vec![file_provider()]);
    state.load_all().await;

    let results = state.get_submenu_context_items(Some("file"), "docs");
    check!(titles(&results) == vec!["docs.md", "readme.md"]);
}

/// Test: Upper-case queries find titles whose lower-casing depends on context.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uppercase_greek_title_matches_itself() {
    let source = MemorySource::new();
    source.set_items(
        "file",
        [
            file_item("/w/ΟΔΟΣ", "ΟΔΟΣ", "ΟΔΟΣ"),
            file_item("/w/ΟΔΟΣ.md", "ΟΔΟΣ.md", "notes/ΟΔΟΣ.md"),
        ],
    );
    let state = state_for(Arc::new(source), vec![file_provider()]);
    state.load_all().await;

    let results = state.get_submenu_context_items(Some("file"), "ΟΔΟΣ");
    check!(titles(&results) == vec!["ΟΔΟΣ", "ΟΔΟΣ.md"]);
    check!(state.get_submenu_context_items(Some("file"), "οδοσ").len() == 2);
}

/// Test: Exact matches always precede fuzzy ones.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tiers_never_interleave() {
    let source = MemorySource::new();
    source.set_items(
        "file",
        [
            file_item("1", "s-e-t-u-p.sh", ""),
            file_item("2", "my-setup.sh", ""),
            file_item("3", "setup.py", ""),
        ],
    );
    let state = state_for(Arc::new(source), vec![file_provider()]);
    state.load_all().await;

    let results = state.get_submenu_context_items(Some("file"), "setup");
    check!(titles(&results) == vec!["setup.py", "my-setup.sh", "s-e-t-u-p.sh"]);
}

/// Test: Multi-word query matches token prefixes in order.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn multi_word_prefix(#[future] loaded_state: ContextState) {
    let state = loaded_state.await;

    let results = state.get_submenu_context_items(Some("file"), "side pan");
    check!(titles(&results)[0] == "SidePanel.tsx");
}

/// Test: Without a provider filter, tiers merge across providers.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn merges_across_providers(workspace_items: Vec<Item>) {
    let source = MemorySource::new();
    source.set_items("file", workspace_items);
    source.set_items(
        "folder",
        [
            Item::new("/workspace/src", "src", "", "folder"),
            Item::new("/workspace/settings", "settings", "", "folder"),
        ],
    );
    let state = state_for(
        Arc::new(source),
        vec![file_provider(), ProviderConfig::submenu("folder")],
    );
    state.load_all().await;

    // field-start title matches from both providers come first, file before folder
    let results = state.get_submenu_context_items(None, "settings");
    check!(results[0].title == "Settings.tsx");
    check!(results[1].title == "settings");
    check!(results[1].provider_title == "folder");

    let browse = state.get_submenu_context_items(None, "");
    check!(browse.len() == 8);
    check!(browse[6].provider_title == "folder");

    let only_folders = state.get_submenu_context_items(Some("folder"), "");
    check!(titles(&only_folders) == vec!["src", "settings"]);
}

/// Test: An item is never returned twice, even when both fields match.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn no_duplicates(#[future] loaded_state: ContextState) {
    let state = loaded_state.await;

    for query in ["", "s", "ts", "package", "src", "pakage"] {
        let results = state.get_submenu_context_items(None, query);
        let unique: AHashSet<(&str, &str)> = results
            .iter()
            .map(|item| (item.provider_title.as_str(), item.id.as_str()))
            .collect();
        check!(unique.len() == results.len(), "duplicates for {:?}", query);
    }
}

/// Test: Same query over the same snapshot always yields the same order.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ranking_is_stable(#[future] loaded_state: ContextState) {
    let state = loaded_state.await;

    let first = state.get_submenu_context_items(None, "ts");
    for _ in 0..5 {
        check!(state.get_submenu_context_items(None, "ts") == first);
    }
}

/// Test: Unknown providers and unloaded states yield empty lists.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_provider_is_empty(
    #[future] loaded_state: ContextState,
    source: Arc<MemorySource>,
) {
    let state = loaded_state.await;
    check!(state.get_submenu_context_items(Some("fiel"), "").is_empty());
    check!(state.get_submenu_context_items(Some("terminal"), "package").is_empty());

    let unloaded = state_for(source, vec![file_provider()]);
    check!(unloaded.get_submenu_context_items(Some("file"), "").is_empty());
    check!(unloaded.get_submenu_context_items(None, "package").is_empty());
}

/// Test: Limit truncates after ranking.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn limited_results(#[future] loaded_state: ContextState) {
    let state = loaded_state.await;

    let results = state.get_submenu_context_items_limited(None, "s", Some(2));
    check!(titles(&results) == vec!["Settings.tsx", "SidePanel.tsx"]);

    let browse = state.get_submenu_context_items_limited(Some("file"), "", Some(3));
    check!(browse.len() == 3);
}
