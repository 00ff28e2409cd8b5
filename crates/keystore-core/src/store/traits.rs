//! Core traits and types for key stores

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::iter::KeyIter;
use crate::types::CancellationToken;

/// Health information reported by `KeyStore::status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreState {
    /// Wall-clock time the backend took to answer the health check
    pub latency: Duration,
}

impl StoreState {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

/// Errors that can occur during key store operations
///
/// The set is closed: callers handle `NotFound` and `AlreadyExists` specially
/// and treat everything else as fatal for the call.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("key '{0}' does not exist")]
    NotFound(String),

    #[error("key '{0}' already exists")]
    AlreadyExists(String),

    #[error("{operation} of key '{key}' is not allowed by this store")]
    NotAllowed { key: String, operation: String },

    #[error("transport error: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    #[error("operation cancelled")]
    Cancelled,

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("failed to {operation} (status: {status} {status_text}, response: {body})")]
    Remote {
        operation: String,
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Create a not-allowed error
    pub fn not_allowed(key: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::NotAllowed {
            key: key.into(),
            operation: operation.into(),
        }
    }

    /// Create a remote error from an unexpected HTTP status
    pub fn remote(
        operation: impl Into<String>,
        status: u16,
        status_text: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::Remote {
            operation: operation.into(),
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// Network failures and cancellation
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Cancelled)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Arc::new(err))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(format!("malformed JSON: {}", err))
    }
}

impl From<crate::config::ConfigError> for StoreError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for key/value store implementations
///
/// Implementations:
/// - Remote CredHub service (`CredHubStore`)
/// - Fixed read-mostly map (`StaticKeyStore`)
///
/// Keys are scoped by the store itself (a CredHub store prefixes every key
/// with its namespace); callers only ever see bare keys.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Report backend health and the latency of the check
    async fn status(&self, cancel: &CancellationToken) -> StoreResult<StoreState>;

    /// Create an entry if and only if no entry for the key exists
    ///
    /// Returns `StoreError::AlreadyExists` if the key is present.
    async fn create(&self, cancel: &CancellationToken, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Write the value for a key, creating or overwriting it
    async fn set(&self, cancel: &CancellationToken, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Retrieve the value for a key
    ///
    /// Returns `StoreError::NotFound` if no such entry exists.
    async fn get(&self, cancel: &CancellationToken, key: &str) -> StoreResult<Vec<u8>>;

    /// Delete a key and its value
    ///
    /// Returns `StoreError::NotFound` if no such entry exists.
    async fn delete(&self, cancel: &CancellationToken, key: &str) -> StoreResult<()>;

    /// Snapshot the stored keys
    async fn list(&self, cancel: &CancellationToken) -> StoreResult<KeyIter>;

    /// Release resources held by the store
    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
