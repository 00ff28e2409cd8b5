//! YAML configuration file
//!
//! ```yaml
//! keystore:
//!   credhub:
//!     base_url: https://credhub:8844
//!     namespace: /kes
//!     server_ca_cert_file_path: /etc/kes/credhub-ca.pem
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use crate::credhub::{CredHubConfig, CredHubStore};
use crate::logging::Logger;
use crate::store::{KeyStore, StaticConfig, StaticKeyStore, StoreResult};

/// Which store to use, with its settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStoreConfig {
    #[serde(rename = "credhub")]
    CredHub(CredHubConfig),
    Static(StaticConfig),
}

impl KeyStoreConfig {
    /// Build the configured store
    ///
    /// CredHub settings are validated and certificates loaded here.
    pub fn connect(&self, logger: Arc<dyn Logger>) -> StoreResult<Arc<dyn KeyStore>> {
        match self {
            KeyStoreConfig::CredHub(config) => {
                Ok(Arc::new(CredHubStore::connect(config.clone(), logger)?))
            }
            KeyStoreConfig::Static(config) => Ok(Arc::new(StaticKeyStore::new(config.clone()))),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Written as a one-key map (`credhub:` / `static:`), not a YAML `!tag`
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub keystore: KeyStoreConfig,
}

impl ConfigFile {
    /// Parse a configuration document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load the user-level config (`<config dir>/keystore/config.yaml`)
    pub fn load_user() -> ConfigResult<Self> {
        Self::load(Self::user_path())
    }

    /// Default per-user config location
    pub fn user_path() -> PathBuf {
        // XDG config directory (~/.config on Linux, ~/Library/Application Support on macOS)
        let config_dir = dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
        config_dir.join("keystore").join("config.yaml")
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
