//! Configuration layer for the DAC permissions reconciliation engine.
//!
//! Recognized options: `apiBaseUrl`, `authBaseUrl`, `authRealmName`,
//! `clientId`, `dacId`, `maxRequestLimit`, `maxRequestInterval`,
//! `defaultPageLimit`/`defaultPageOffset`, and `maxBatchSize`. Secrets
//! (identity credentials, the token-verification public key) are never
//! logged or serialized.

pub mod config;
pub mod error;
pub mod loader;

pub use config::*;
pub use error::ConfigLoadError;
pub use loader::ConfigLoader;
