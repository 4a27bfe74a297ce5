//! Host boundary: where provider item lists come from.
//!
//! The host owns workspace access and answers one request per provider with a
//! full snapshot of that provider's items. This module defines the trait the
//! loader calls, the host's response envelope, and two sources: an in-memory one
//! for tests and embedding, and a directory of JSON files for the CLI.

use crate::error::FetchError;
use crate::types::RawItem;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use ahash::AHashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Supplies the full item list of a provider.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Loads every item of `provider`. `query_hint` is forwarded to hosts that
    /// can pre-filter; sources are free to ignore it.
    async fn load_submenu_items(
        &self,
        provider: &str,
        query_hint: Option<&str>,
    ) -> Result<Vec<RawItem>, FetchError>;
}

/// The host's reply to a `context/loadSubmenuItems` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HostResponse {
    Success { content: Vec<RawItem> },
    Error { error: String },
}

impl HostResponse {
    pub fn into_result(self, provider: &str) -> Result<Vec<RawItem>, FetchError> {
        match self {
            Self::Success { content } => Ok(content),
            Self::Error { error } => Err(FetchError::Host {
                provider: provider.to_string(),
                message: error,
            }),
        }
    }

    /// Decodes a response body: either the envelope or a bare item array.
    pub fn decode(provider: &str, body: &str) -> Result<Vec<RawItem>, FetchError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Body {
            Envelope(HostResponse),
            Items(Vec<RawItem>),
        }

        match serde_json::from_str::<Body>(body) {
            Ok(Body::Envelope(response)) => response.into_result(provider),
            Ok(Body::Items(items)) => Ok(items),
            Err(e) => Err(FetchError::Decode {
                provider: provider.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// In-process item source with swappable per-provider responses.
///
/// Counts requests per provider and can delay answers, which makes it suitable
/// for exercising refresh ordering and cancellation.
#[derive(Debug, Default)]
pub struct MemorySource {
    responses: Mutex<AHashMap<String, HostResponse>>,
    delays: Mutex<AHashMap<String, Duration>>,
    requests: Mutex<AHashMap<String, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `items` for `provider` from now on.
    pub fn set_items(&self, provider: &str, items: impl IntoIterator<Item = impl Into<RawItem>>) {
        let content = items.into_iter().map(Into::into).collect();
        self.responses
            .lock()
            .insert(provider.to_string(), HostResponse::Success { content });
    }

    /// Answers requests for `provider` with an error status from now on.
    pub fn set_error(&self, provider: &str, error: impl Into<String>) {
        self.responses.lock().insert(
            provider.to_string(),
            HostResponse::Error {
                error: error.into(),
            },
        );
    }

    /// Delays every answer for `provider` by `delay`.
    pub fn set_delay(&self, provider: &str, delay: Duration) {
        self.delays.lock().insert(provider.to_string(), delay);
    }

    /// Number of requests received for `provider`.
    pub fn request_count(&self, provider: &str) -> usize {
        self.requests.lock().get(provider).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ItemSource for MemorySource {
    async fn load_submenu_items(
        &self,
        provider: &str,
        _query_hint: Option<&str>,
    ) -> Result<Vec<RawItem>, FetchError> {
        *self.requests.lock().entry(provider.to_string()).or_insert(0) += 1;

        let delay = self.delays.lock().get(provider).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        // read the response after the delay so a swap during the wait is observed
        let response = self.responses.lock().get(provider).cloned();
        response
            .unwrap_or_else(|| HostResponse::Error {
                error: "Unknown provider".to_string(),
            })
            .into_result(provider)
    }
}

/// Reads `<dir>/<provider>.json` for each request.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ItemSource for JsonDirSource {
    async fn load_submenu_items(
        &self,
        provider: &str,
        _query_hint: Option<&str>,
    ) -> Result<Vec<RawItem>, FetchError> {
        let path = self.dir.join(format!("{}.json", provider));
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Host {
                provider: provider.to_string(),
                message: format!("{}: {}", path.display(), e),
            })?;

        HostResponse::decode(provider, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Item;
    use assert2::{check, let_assert};

    #[test]
    fn test_decode_envelope() {
        let items = HostResponse::decode(
            "file",
            r#"{"status":"success","content":[{"id":"a","title":"A"}]}"#,
        )
        .unwrap();
        check!(items.len() == 1);
        check!(items[0].id.as_deref() == Some("a"));
    }

    #[test]
    fn test_decode_error_status() {
        let result = HostResponse::decode("file", r#"{"status":"error","error":"Unknown method"}"#);
        check!(
            result
                == Err(FetchError::Host {
                    provider: "file".to_string(),
                    message: "Unknown method".to_string(),
                })
        );
    }

    #[test]
    fn test_decode_bare_array_and_garbage() {
        check!(HostResponse::decode("file", r#"[{"id":"a","title":"A"}]"#).is_ok());
        let_assert!(Err(FetchError::Decode { provider, .. }) = HostResponse::decode("file", "{"));
        check!(provider == "file");
    }

    #[tokio::test]
    async fn test_memory_source_counts_requests() {
        let source = MemorySource::new();
        source.set_items("file", [Item::new("a", "A", "", "file")]);

        check!(source.load_submenu_items("file", None).await.unwrap().len() == 1);
        check!(source.load_submenu_items("file", Some("a")).await.is_ok());
        let_assert!(Err(FetchError::Host { .. }) = source.load_submenu_items("symbol", None).await);

        check!(source.request_count("file") == 2);
        check!(source.request_count("symbol") == 1);
    }

    #[tokio::test]
    async fn test_json_dir_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("file.json"),
            r#"{"status":"success","content":[{"id":"a","title":"A","description":"src/a"}]}"#,
        )
        .unwrap();

        let source = JsonDirSource::new(dir.path());
        let items = source.load_submenu_items("file", None).await.unwrap();
        check!(items[0].description.as_deref() == Some("src/a"));

        let_assert!(Err(FetchError::Host { .. }) = source.load_submenu_items("folder", None).await);
    }
}
