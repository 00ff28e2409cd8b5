//! Key store abstractions and the static-map implementation
//!
//! This module provides the uniform store contract:
//! - `KeyStore` trait implemented by every backend
//! - `KeyIter` snapshot returned by `list`
//! - `StoreError` classification shared by all backends
//! - `StaticKeyStore`, a fixed map that rejects mutation
//!
//! The remote CredHub backend lives in `crate::credhub`.

mod traits;
mod iter;
mod static_store;

pub use traits::{KeyStore, StoreState, StoreError, StoreResult};
pub use iter::KeyIter;
pub use static_store::{StaticConfig, StaticKeyStore};
