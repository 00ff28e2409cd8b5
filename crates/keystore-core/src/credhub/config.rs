//! CredHub connection configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};

/// Connection settings for a CredHub server
///
/// Immutable once handed to `CredHubStore`; every key the store touches is
/// placed under `namespace`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredHubConfig {
    /// Base URL of the CredHub service, e.g. `https://credhub:8844`
    pub base_url: String,
    /// Namespace (credential path) all keys are stored under
    pub namespace: String,
    /// Present a client certificate to the server
    pub enable_mutual_tls: bool,
    pub client_cert_file_path: String,
    pub client_key_file_path: String,
    /// CA certificate used to verify the server
    pub server_ca_cert_file_path: String,
    /// Skip server certificate verification entirely
    pub server_insecure_skip_verify: bool,
    /// Store every value as `Base64:...`, even valid UTF-8
    pub force_base64_values_encoding: bool,
}

/// TLS material loaded by `CredHubConfig::validate`
#[derive(Default)]
pub struct Certs {
    pub server_ca_cert: Option<reqwest::Certificate>,
    pub client_identity: Option<reqwest::Identity>,
}

impl std::fmt::Debug for Certs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certs")
            .field("server_ca_cert", &self.server_ca_cert.is_some())
            .field("client_identity", &self.client_identity.is_some())
            .finish()
    }
}

impl CredHubConfig {
    pub fn new(base_url: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Check required fields and load the configured certificates
    pub fn validate(&self) -> ConfigResult<Certs> {
        let mut certs = Certs::default();
        if self.base_url.is_empty() {
            return Err(ConfigError::missing("base_url", "can't be empty"));
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::missing("namespace", "can't be empty"));
        }

        if !self.server_insecure_skip_verify {
            if self.server_ca_cert_file_path.is_empty() {
                return Err(ConfigError::missing(
                    "server_ca_cert_file_path",
                    "can't be empty when `server_insecure_skip_verify` is false",
                ));
            }
            let pem = read_pem_file(&self.server_ca_cert_file_path, "server_ca_cert_file_path")?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| ConfigError::certificate("server_ca_cert_file_path", e))?;
            certs.server_ca_cert = Some(cert);
        }

        if self.enable_mutual_tls {
            if self.client_cert_file_path.is_empty() || self.client_key_file_path.is_empty() {
                return Err(ConfigError::missing(
                    "client_cert_file_path",
                    "and `client_key_file_path` can't be empty when `enable_mutual_tls` is true",
                ));
            }
            let mut identity_pem =
                read_pem_file(&self.client_cert_file_path, "client_cert_file_path")?;
            reqwest::Certificate::from_pem(&identity_pem)
                .map_err(|e| ConfigError::certificate("client_cert_file_path", e))?;
            let key_pem = read_pem_file(&self.client_key_file_path, "client_key_file_path")?;
            identity_pem.push(b'\n');
            identity_pem.extend_from_slice(&key_pem);
            let identity = reqwest::Identity::from_pem(&identity_pem)
                .map_err(|e| ConfigError::certificate("client_key_file_path", e))?;
            certs.client_identity = Some(identity);
        }

        Ok(certs)
    }
}

/// Read a file and make sure it holds at least one PEM block
fn read_pem_file(path: impl AsRef<Path>, field: &str) -> ConfigResult<Vec<u8>> {
    let pem = fs::read(path.as_ref()).map_err(|e| ConfigError::Io {
        field: field.to_string(),
        source: e,
    })?;
    let text = String::from_utf8_lossy(&pem);
    let has_block = text
        .find("-----BEGIN ")
        .map(|start| text[start..].contains("-----END "))
        .unwrap_or(false);
    if !has_block {
        return Err(ConfigError::certificate(field, "no PEM block found"));
    }
    Ok(pem)
}
