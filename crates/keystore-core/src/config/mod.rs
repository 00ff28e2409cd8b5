//! Configuration file support
//!
//! A single YAML document selects and configures one key store:
//! - `credhub:` connects to a CredHub server (`CredHubConfig`)
//! - `static:` serves a fixed map (`StaticConfig`)

mod error;
mod file;

pub use error::{ConfigError, ConfigResult};
pub use file::{ConfigFile, KeyStoreConfig};
