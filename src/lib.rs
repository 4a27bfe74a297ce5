pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod search;
pub mod state;
pub mod store;
pub mod tracing;
pub mod types;
pub mod worker;

pub use config::{LoaderOptions, ProviderConfig, ProviderKind, SessionConfig};
pub use error::{ConfigError, FetchError, ItemError, Result};
pub use host::{HostResponse, ItemSource, JsonDirSource, MemorySource};
pub use search::{SearchIndex, Tier};
pub use state::{ContextState, LoadReport, ProviderStatus};
pub use store::{ItemStore, ProviderSnapshot};
pub use types::{Item, RawItem};
pub use worker::{ChangeSignal, RefreshWorker, spawn_refresh_worker};
