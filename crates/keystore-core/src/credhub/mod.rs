//! CredHub key store
//!
//! Stores entries as CredHub `value` credentials under a configured namespace.
//!
//! - `codec`: byte values <-> JSON strings (`Base64:` escaping)
//! - `client`: the HTTP request executor the store talks through
//! - `dedup`: single-flight table that collapses concurrent creates
//! - `CredHubStore`: the `KeyStore` implementation
//!
//! ```rust,ignore
//! use keystore_core::credhub::{CredHubConfig, CredHubStore};
//!
//! let mut config = CredHubConfig::new("https://credhub:8844", "/kes");
//! config.server_ca_cert_file_path = "/etc/kes/credhub-ca.pem".into();
//! let store = CredHubStore::connect(config, logger)?;
//! store.create(&cancel, "my-key", b"secret").await?;
//! ```

pub mod codec;
mod client;
mod config;
mod dedup;
mod store;

pub use client::{BodyStream, HttpClient, HttpResponse, ReqwestHttpClient};
pub use codec::{decode_value, encode_value, BASE64_PREFIX};
pub use config::{Certs, CredHubConfig};
pub use dedup::{Flight, SingleFlight};
pub use store::CredHubStore;
