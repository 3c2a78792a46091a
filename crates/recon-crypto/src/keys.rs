//! Loading of the identity provider's RS256 public key

use jsonwebtoken::DecodingKey;
use secrecy::{ExposeSecret, Secret};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid public key format: {0}")]
    InvalidFormat(String),
}

/// Holds the PEM-encoded RSA public key used to verify access tokens issued
/// by the identity host. The engine never signs tokens itself, so unlike
/// the teacher's `KeyManager` there is no paired encoding key.
#[derive(Clone)]
pub struct VerifyingKey {
    pem: Secret<String>,
}

impl VerifyingKey {
    pub fn from_pem(pem: Secret<String>) -> Result<Self, KeyError> {
        // Validate eagerly so configuration errors surface at startup.
        DecodingKey::from_rsa_pem(pem.expose_secret().as_bytes())
            .map_err(|e| KeyError::InvalidFormat(e.to_string()))?;
        Ok(Self { pem })
    }

    pub fn decoding_key(&self) -> Result<DecodingKey, KeyError> {
        DecodingKey::from_rsa_pem(self.pem.expose_secret().as_bytes())
            .map_err(|e| KeyError::InvalidFormat(e.to_string()))
    }
}
