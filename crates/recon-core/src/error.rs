//! Closed error taxonomy for the reconciliation engine (spec §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The cached access token failed signature/expiry verification; the
    /// Token Manager treats this as a transparent refresh trigger, never as
    /// a reconciliation-level failure.
    #[error("access token expired")]
    TokenExpired,

    /// The identity host's token response didn't match the expected shape.
    #[error("invalid token response from identity host: {reason}")]
    InvalidTokenResponse { reason: String },

    /// 400 from the API. Not retried; recorded as a per-item failure.
    #[error("bad request: {message}")]
    BadRequest { message: String },

    /// 404 from the API. Per-call: the referenced user/resource is
    /// unresolvable. Per-mutation: recorded as an item failure.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// 429. The shared throttle should normally prevent this; surfaced only
    /// if both the throttle and the single retry are exhausted.
    #[error("rate limited by upstream")]
    TooManyRequests,

    /// 504 or a transport-level connection reset.
    #[error("gateway timeout or connection reset: {message}")]
    GatewayTimeout { message: String },

    /// Any other 5xx, or an unclassified transport error.
    #[error("server error: {message}")]
    ServerError { message: String },

    /// Per-item JSON validation failure inside an array response. Recorded
    /// in the per-endpoint `failure[]` list; the call as a whole still
    /// succeeds.
    #[error("schema validation failed: {message}")]
    SchemaFailure { message: String },

    /// The only fatal condition: the DAC's dataset list could not be
    /// enumerated, so every later phase has nothing to scope itself by.
    #[error("failed to enumerate datasets for DAC: {message}")]
    FatalBootstrap { message: String },

    /// The authoritative local store could not be read at all (component C).
    #[error("approved-user store read failed: {0}")]
    StoreFailure(String),
}

impl ReconcileError {
    /// True for the classes the spec marks as single-shot retryable at the
    /// transport layer (429, 504, connection reset).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileError::TooManyRequests | ReconcileError::GatewayTimeout { .. }
        )
    }
}

impl From<reqwest::Error> for ReconcileError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            ReconcileError::GatewayTimeout {
                message: err.to_string(),
            }
        } else {
            ReconcileError::ServerError {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ReconcileError {
    fn from(err: serde_json::Error) -> Self {
        ReconcileError::SchemaFailure {
            message: err.to_string(),
        }
    }
}

impl From<sqlx::Error> for ReconcileError {
    fn from(err: sqlx::Error) -> Self {
        ReconcileError::StoreFailure(err.to_string())
    }
}
