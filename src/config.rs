//! Session configuration: which context providers exist and how they load.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use ahash::AHashSet;
use std::path::Path;
use std::time::Duration;

/// Default window used to merge bursts of change signals into one refresh.
const DEFAULT_REFRESH_COALESCE: Duration = Duration::from_millis(50);

/// How a context provider is surfaced by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Owns a browsable item list (files, folders, symbols, ...)
    #[default]
    Submenu,
    /// Resolved directly, no item list
    Normal,
    /// Takes free-form user input, no item list
    Query,
}

/// A registered context provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Provider name, also the tag carried by its items
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: ProviderKind,
    /// Skip this provider when indexing is disabled for the session
    #[serde(default)]
    pub depends_on_indexing: bool,
}

impl ProviderConfig {
    pub fn submenu(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: ProviderKind::Submenu,
            depends_on_indexing: false,
        }
    }

    pub fn depends_on_indexing(mut self, depends: bool) -> Self {
        self.depends_on_indexing = depends;
        self
    }
}

/// Configuration for one workspace session, loaded once at session start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default)]
    pub disable_indexing: bool,
    #[serde(default)]
    pub context_providers: Vec<ProviderConfig>,
}

impl SessionConfig {
    pub fn new(context_providers: Vec<ProviderConfig>) -> Self {
        Self {
            disable_indexing: false,
            context_providers,
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()
    }

    /// Load a config file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&raw),
            Some("json") => Self::from_json_str(&raw),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Providers that own item lists, in declaration order.
    pub fn submenu_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.context_providers
            .iter()
            .filter(|provider| provider.kind == ProviderKind::Submenu)
    }

    /// Whether a provider takes part in `load_all` under this session's settings.
    pub fn is_in_scope(&self, provider: &ProviderConfig) -> bool {
        !(self.disable_indexing && provider.depends_on_indexing)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let mut seen = AHashSet::new();
        for provider in &self.context_providers {
            if !seen.insert(provider.title.as_str()) {
                return Err(ConfigError::DuplicateProvider(provider.title.clone()));
            }
        }
        Ok(self)
    }
}

/// Runtime knobs for the provider loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Upper bound for a single host fetch; `None` leaves timing to the host.
    pub fetch_timeout: Option<Duration>,
    /// Change signals arriving within this window are refreshed together.
    pub refresh_coalesce: Duration,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: None,
            refresh_coalesce: DEFAULT_REFRESH_COALESCE,
        }
    }
}
