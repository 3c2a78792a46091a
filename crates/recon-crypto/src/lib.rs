//! RS256 access-token verification for the reconciliation engine.

pub mod jwt;
pub mod keys;

pub use jwt::{verify, AccessClaims, JwtError};
pub use keys::{KeyError, VerifyingKey};
