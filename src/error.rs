//! Error handling types and utilities.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A specialized Result type for context-index plumbing.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods in the binary and config loading paths.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when fetching a provider's item list from the host fails.
///
/// None of these are fatal: the loader records the failure and keeps the
/// provider's last published snapshot (or an empty one).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The host answered with an error status.
    #[error("Host failed to load items for '{provider}': {message}")]
    Host { provider: String, message: String },
    /// The fetch did not complete within the configured timeout.
    #[error("Loading items for '{provider}' timed out after {after:?}")]
    Timeout { provider: String, after: Duration },
    /// The session was torn down while the fetch was in flight.
    #[error("Loading items for '{provider}' was cancelled")]
    Cancelled { provider: String },
    /// The host response could not be decoded.
    #[error("Failed to decode items for '{provider}': {message}")]
    Decode { provider: String, message: String },
}

impl FetchError {
    /// The provider the failed fetch was issued for.
    pub fn provider(&self) -> &str {
        match self {
            Self::Host { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Cancelled { provider }
            | Self::Decode { provider, .. } => provider,
        }
    }
}

/// A host record that cannot be indexed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("Item {id:?} is missing required field '{field}'")]
    Malformed {
        field: &'static str,
        id: Option<String>,
    },
}

/// Error returned when a session configuration cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Context provider '{0}' is declared more than once")]
    DuplicateProvider(String),
}
