//! Token Manager (component A, spec §4.1).
//!
//! Maintains a single-slot cache of the access token with single-flight
//! fetch deduplication: concurrent `acquire()` callers while a fetch is in
//! flight all observe the result of that same fetch. Grounded on the same
//! guarded-slot-around-a-cached-credential shape as
//! `auth_core::services::token_service::TokenService`'s refresh path, swapped
//! from a blocking `RwLock` released before the network call to a
//! `tokio::sync::Mutex` held for the full duration of the fetch, so
//! single-flight falls out of lock contention instead of a separate
//! in-flight-future registry.

use crate::error::ReconcileError;
use recon_crypto::{verify, VerifyingKey};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
    #[allow(dead_code)]
    expires_in: Option<u64>,
    #[allow(dead_code)]
    refresh_token: Option<String>,
}

pub struct TokenManager {
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    username: Secret<String>,
    password: Secret<String>,
    verifying_key: VerifyingKey,
    /// Held for the full duration of a fetch, so concurrent `acquire()`
    /// callers serialize on lock acquisition rather than each issuing their
    /// own POST: the single-flight property falls out of mutual exclusion
    /// instead of an explicit in-flight-future registry.
    slot: Mutex<Option<Token>>,
}

impl TokenManager {
    pub fn new(
        http: reqwest::Client,
        auth_base_url: &str,
        realm_name: &str,
        client_id: String,
        username: Secret<String>,
        password: Secret<String>,
        verifying_key: VerifyingKey,
    ) -> Self {
        Self {
            http,
            token_endpoint: format!("{}/realms/{}/protocol/openid-connect/token", auth_base_url, realm_name),
            client_id,
            username,
            password,
            verifying_key,
            slot: Mutex::new(None),
        }
    }

    /// Returns a token that is *believed* valid (not known expired).
    ///
    /// Concurrent callers serialize on the slot mutex: whichever task wins
    /// the race fetches a fresh token while holding the lock, and every
    /// other caller blocks on lock acquisition rather than issuing its own
    /// POST. Once unblocked, a caller re-checks the now-populated slot
    /// instead of assuming it needs to fetch.
    pub async fn acquire(&self) -> Result<Token, ReconcileError> {
        let mut slot = self.slot.lock().await;

        if let Some(token) = &*slot {
            match verify(&token.access_token, &self.verifying_key) {
                Ok(_) => return Ok(token.clone()),
                Err(recon_crypto::JwtError::Expired) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "access token verification failed, forcing refresh");
                }
            }
        }

        let token = self.fetch().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Clears the cached token so the next `acquire` forces a fetch.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
    }

    async fn fetch(&self) -> Result<Token, ReconcileError> {
        let params = [
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("username", self.username.expose_secret().as_str()),
            ("password", self.password.expose_secret().as_str()),
        ];

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(ReconcileError::from)?;

        if !response.status().is_success() {
            return Err(ReconcileError::InvalidTokenResponse {
                reason: format!("identity host returned {}", response.status()),
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| ReconcileError::InvalidTokenResponse {
            reason: e.to_string(),
        })?;

        Ok(Token {
            access_token: body.access_token,
        })
    }
}
