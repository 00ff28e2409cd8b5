//! Fixed, read-only key store

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::iter::KeyIter;
use super::traits::{KeyStore, StoreError, StoreResult, StoreState};
use crate::types::CancellationToken;

/// Entries served by a `StaticKeyStore`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfig {
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

/// Key store over a fixed map supplied at construction
///
/// Reads are served from the map. Every mutation is rejected with
/// `StoreError::NotAllowed`, except that creating or deleting a key reports
/// `AlreadyExists` / `NotFound` first when that is the more precise answer.
///
/// # Example
///
/// ```
/// use keystore_core::store::{StaticConfig, StaticKeyStore};
///
/// let mut config = StaticConfig::default();
/// config.entries.insert("db-password".to_string(), "hunter2".to_string());
/// let store = StaticKeyStore::new(config);
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticKeyStore {
    entries: BTreeMap<String, String>,
}

impl StaticKeyStore {
    pub fn new(config: StaticConfig) -> Self {
        Self {
            entries: config.entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyStore for StaticKeyStore {
    fn name(&self) -> &str {
        "static"
    }

    async fn status(&self, _cancel: &CancellationToken) -> StoreResult<StoreState> {
        Ok(StoreState::default())
    }

    async fn create(
        &self,
        _cancel: &CancellationToken,
        key: &str,
        _value: &[u8],
    ) -> StoreResult<()> {
        if self.entries.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        Err(StoreError::not_allowed(key, "create"))
    }

    async fn set(&self, _cancel: &CancellationToken, key: &str, _value: &[u8]) -> StoreResult<()> {
        Err(StoreError::not_allowed(key, "set"))
    }

    async fn get(&self, _cancel: &CancellationToken, key: &str) -> StoreResult<Vec<u8>> {
        self.entries
            .get(key)
            .map(|value| value.as_bytes().to_vec())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, _cancel: &CancellationToken, key: &str) -> StoreResult<()> {
        if !self.entries.contains_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Err(StoreError::not_allowed(key, "delete"))
    }

    async fn list(&self, cancel: &CancellationToken) -> StoreResult<KeyIter> {
        let keys = self.entries.keys().cloned().collect();
        Ok(KeyIter::new(keys, cancel.clone()))
    }
}
