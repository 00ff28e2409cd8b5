//! Shared types used across stores

mod cancellation;

pub use cancellation::CancellationToken;
