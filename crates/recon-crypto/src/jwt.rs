//! Access-token verification (RS256), grounded on `auth-crypto::jwt`.

use crate::keys::{KeyError, VerifyingKey};
use jsonwebtoken::{decode, Algorithm, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token signature/claims verification failed: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
    #[error("key error: {0}")]
    Key(#[from] KeyError),
}

/// Minimal claim set the engine cares about: expiry only. The identity
/// host's tokens may carry additional claims (scope, client id, ...) that
/// this engine does not interpret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub exp: i64,
    pub iat: Option<i64>,
    pub sub: Option<String>,
}

/// Verifies an access token's RS256 signature and standard expiry claim
/// against a configured public key. Does not call out over the network;
/// the Token Manager (component A) decides whether `Expired` means
/// "refresh now".
pub fn verify(token: &str, key: &VerifyingKey) -> Result<AccessClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = true;
    // The identity host issues access tokens scoped to this engine's client
    // id; audience/issuer checks are left to the caller's deployment config
    // rather than hardcoded here, since they vary per DAC instance.
    validation.validate_aud = false;

    let decoding_key = key.decoding_key()?;

    match decode::<AccessClaims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(JwtError::Expired),
            _ => Err(JwtError::Invalid(e)),
        },
    }
}
