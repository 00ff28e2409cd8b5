//! CredHub-backed key store
//!
//! Maps the `KeyStore` contract onto CredHub `value` credentials stored
//! under a fixed namespace:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | status    | `GET /health` |
//! | get       | `GET /api/v1/data?current=true&name={ns}/{key}` |
//! | set       | `PUT /api/v1/data` |
//! | delete    | `DELETE /api/v1/data?name={ns}/{key}` |
//! | list      | `GET /api/v1/data?path={ns}/` |

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::client::{HttpClient, HttpResponse, ReqwestHttpClient};
use super::codec::{decode_value, encode_value};
use super::config::CredHubConfig;
use super::dedup::SingleFlight;
use crate::logging::Logger;
use crate::store::{KeyIter, KeyStore, StoreError, StoreResult, StoreState};
use crate::types::CancellationToken;
use crate::{log_debug, log_warn};

const DATA_PATH: &str = "/api/v1/data";
const HEALTH_PATH: &str = "/health";
const HEALTH_UP: &str = "UP";

#[derive(Serialize)]
struct SetValueRequest<'a> {
    name: String,
    #[serde(rename = "type")]
    kind: &'a str,
    value: String,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Deserialize)]
struct DataResponse {
    #[serde(default)]
    data: Vec<CredentialVersion>,
}

#[derive(Deserialize)]
struct CredentialVersion {
    value: String,
}

#[derive(Deserialize)]
struct FindResponse {
    #[serde(default)]
    credentials: Vec<CredentialName>,
}

#[derive(Deserialize)]
struct CredentialName {
    name: String,
}

/// Key store backed by a CredHub server
///
/// # Create semantics
///
/// CredHub has no conditional write, so `create` is a `get` followed by a
/// `set` when the key is absent. Concurrent `create` calls for the same key on
/// one store instance are collapsed into a single execution: one caller does
/// the read and write, the others receive its outcome (success is reported to
/// them as `AlreadyExists`). This is not a lock against other writers: a
/// concurrent `set`, or another process, can still write between the read and
/// the write.
///
/// A caller that joins an in-flight create waits for that execution to finish
/// even if its own token is cancelled; only the executing caller's token
/// aborts the requests.
pub struct CredHubStore {
    config: CredHubConfig,
    client: Arc<dyn HttpClient>,
    creates: SingleFlight<StoreResult<()>>,
    logger: Arc<dyn Logger>,
}

impl CredHubStore {
    /// Create a store over an existing HTTP client
    pub fn new(
        config: CredHubConfig,
        client: Arc<dyn HttpClient>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            config,
            client,
            creates: SingleFlight::new(),
            logger,
        }
    }

    /// Validate the config and connect over TLS
    pub fn connect(config: CredHubConfig, logger: Arc<dyn Logger>) -> StoreResult<Self> {
        let client = ReqwestHttpClient::new(&config, Arc::clone(&logger))?;
        Ok(Self::new(config, Arc::new(client), logger))
    }

    pub fn config(&self) -> &CredHubConfig {
        &self.config
    }

    fn credential_name(&self, key: &str) -> String {
        format!("{}/{}", self.config.namespace, key)
    }

    /// Turn an unexpected status into `StoreError::Remote`, keeping the body
    ///
    /// A body that cannot be read is reported as empty, unless the read was
    /// cancelled.
    async fn remote_error(
        &self,
        cancel: &CancellationToken,
        operation: &str,
        response: HttpResponse,
    ) -> StoreError {
        let status = response.status;
        let status_text = response.status_text.clone();
        let body = match response.text(cancel).await {
            Ok(body) => body,
            Err(StoreError::Cancelled) => return StoreError::Cancelled,
            Err(_) => String::new(),
        };
        log_warn!(self.logger, "credhub: failed to {} (status: {})", operation, status);
        StoreError::remote(operation, status, status_text, body)
    }

    /// Unconditionally write `value` under `key`
    async fn put(&self, cancel: &CancellationToken, key: &str, value: &[u8]) -> StoreResult<()> {
        let request = SetValueRequest {
            name: self.credential_name(key),
            kind: "value",
            value: encode_value(value, self.config.force_base64_values_encoding),
        };
        let payload = serde_json::to_vec(&request)?;

        let response = self
            .client
            .do_request(cancel, Method::PUT, DATA_PATH, Some(payload))
            .await?;
        if !response.is_success() {
            return Err(self.remote_error(cancel, "set entry", response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl KeyStore for CredHubStore {
    fn name(&self) -> &str {
        "credhub"
    }

    async fn status(&self, cancel: &CancellationToken) -> StoreResult<StoreState> {
        let started = Instant::now();
        let response = self
            .client
            .do_request(cancel, Method::GET, HEALTH_PATH, None)
            .await?;
        let state = StoreState::new(started.elapsed());

        if !response.is_success() {
            return Err(self.remote_error(cancel, "check health", response).await);
        }
        let (status, status_text) = (response.status, response.status_text.clone());
        let body = response.bytes(cancel).await?;
        let health: HealthResponse = serde_json::from_slice(&body)?;
        if health.status != HEALTH_UP {
            return Err(StoreError::remote(
                "check health",
                status,
                status_text,
                String::from_utf8_lossy(&body),
            ));
        }
        Ok(state)
    }

    async fn create(&self, cancel: &CancellationToken, key: &str, value: &[u8]) -> StoreResult<()> {
        let name = self.credential_name(key);
        log_debug!(self.logger, "credhub: create {}", name);

        let flight = self
            .creates
            .run(&name, || async {
                match self.get(cancel, key).await {
                    Ok(_) => Err(StoreError::AlreadyExists(key.to_string())),
                    Err(StoreError::NotFound(_)) => self.put(cancel, key, value).await,
                    Err(err) => Err(err),
                }
            })
            .await;

        match flight.value {
            // Another caller's create wrote the key.
            Ok(()) if flight.shared => Err(StoreError::AlreadyExists(key.to_string())),
            result => result,
        }
    }

    async fn set(&self, cancel: &CancellationToken, key: &str, value: &[u8]) -> StoreResult<()> {
        log_debug!(self.logger, "credhub: set {}", self.credential_name(key));
        self.put(cancel, key, value).await
    }

    async fn get(&self, cancel: &CancellationToken, key: &str) -> StoreResult<Vec<u8>> {
        let path = format!("{}?current=true&name={}", DATA_PATH, self.credential_name(key));
        let response = self.client.do_request(cancel, Method::GET, &path, None).await?;

        if response.is_not_found() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        if !response.is_success() {
            return Err(self.remote_error(cancel, "get entry", response).await);
        }

        let data: DataResponse = response.json(cancel).await?;
        match data.data.as_slice() {
            [] => Err(StoreError::NotFound(key.to_string())),
            [version] => decode_value(&version.value),
            versions => Err(StoreError::Protocol(format!(
                "received multiple entries ({}) for the same key '{}'",
                versions.len(),
                key
            ))),
        }
    }

    async fn delete(&self, cancel: &CancellationToken, key: &str) -> StoreResult<()> {
        let path = format!("{}?name={}", DATA_PATH, self.credential_name(key));
        log_debug!(self.logger, "credhub: delete {}", self.credential_name(key));
        let response = self.client.do_request(cancel, Method::DELETE, &path, None).await?;

        if response.is_not_found() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        if !response.is_success() {
            return Err(self.remote_error(cancel, "delete entry", response).await);
        }
        Ok(())
    }

    async fn list(&self, cancel: &CancellationToken) -> StoreResult<KeyIter> {
        let prefix = format!("{}/", self.config.namespace);
        let path = format!("{}?path={}", DATA_PATH, prefix);
        let response = self.client.do_request(cancel, Method::GET, &path, None).await?;

        if !response.is_success() {
            return Err(self.remote_error(cancel, "list entries", response).await);
        }

        let found: FindResponse = response.json(cancel).await?;
        let keys = found
            .credentials
            .into_iter()
            .map(|c| match c.name.strip_prefix(&prefix) {
                Some(key) => key.to_string(),
                None => c.name,
            })
            .collect();
        Ok(KeyIter::new(keys, cancel.clone()))
    }
}

impl std::fmt::Debug for CredHubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredHubStore")
            .field("base_url", &self.config.base_url)
            .field("namespace", &self.config.namespace)
            .field("creates", &self.creates)
            .finish()
    }
}
