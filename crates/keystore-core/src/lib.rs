//! Keystore Core
//!
//! Pluggable key/value secret stores behind one async contract.
//! A store is configured once and then used concurrently from any task.
//!
//! ## Stores
//!
//! - `credhub`: remote CredHub server over REST, values kept under a namespace
//! - `static`: fixed in-memory map, read-only
//!
//! ```rust,ignore
//! use keystore_core::{ConfigFile, CancellationToken, ConsoleLogger};
//!
//! let config = ConfigFile::load_user()?;
//! let store = config.keystore.connect(Arc::new(ConsoleLogger::new()))?;
//!
//! let cancel = CancellationToken::new();
//! store.create(&cancel, "my-key", b"my-value").await?;
//! let value = store.get(&cancel, "my-key").await?;
//! ```

pub mod types;
pub mod store;
pub mod credhub;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use types::CancellationToken;

pub use store::{
    KeyStore, StoreState, StoreError, StoreResult, KeyIter,
    StaticConfig, StaticKeyStore,
};

pub use credhub::{CredHubConfig, CredHubStore, HttpClient, HttpResponse, ReqwestHttpClient};

pub use config::{ConfigError, ConfigResult, ConfigFile, KeyStoreConfig};

pub use logging::{Logger, NoOpLogger, ConsoleLogger};
