//! Core configuration structures for the reconciliation engine

use secrecy::Secret;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Top-level configuration, assembled by [`crate::loader::ConfigLoader`].
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReconConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub dac: DacConfig,
    #[validate]
    pub store: StoreConfig,
    #[validate]
    pub rate_limit: RateLimitConfig,
    pub pagination: PaginationConfig,
    #[validate]
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

/// Connection to the authoritative local store of approved applications
/// (component C), mirroring `auth-config::DatabaseConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    #[serde(skip_serializing)]
    pub mysql_url: Secret<String>,
    #[validate(range(min = 1))]
    pub max_connections: Option<u32>,
}

/// Base URL and transport knobs for the external DAC platform (component B).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_seconds: Option<u64>,
}

/// Identity host configuration for the Token Manager (component A).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AuthConfig {
    pub base_url: String,
    pub realm_name: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub username: Secret<String>,
    #[serde(skip_serializing)]
    pub password: Secret<String>,
    /// PEM-encoded RSA public key used to verify the access token's signature.
    #[serde(skip_serializing)]
    pub token_verification_public_key: Secret<String>,
}

/// The DAC being reconciled and the grantor string embedded in requests.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DacConfig {
    pub dac_id: String,
    pub grantor_comment: String,
}

/// Shared throttle applied to every outbound call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct RateLimitConfig {
    #[validate(range(min = 1))]
    pub max_request_limit: u32,
    #[validate(range(min = 1))]
    pub max_request_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_request_limit: 3,
            max_request_interval_ms: 1000,
        }
    }
}

/// Dataset-permissions pagination step (Pass 2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page_limit: u32,
    pub default_page_offset: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_limit: 50,
            default_page_offset: 0,
        }
    }
}

/// Ceiling on any single mutation body (§4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct BatchConfig {
    #[validate(range(min = 1, max = 2000))]
    pub max_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
