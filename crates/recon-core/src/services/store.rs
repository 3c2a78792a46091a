//! The authoritative local store's read surface (component C depends on
//! this trait; `recon-db` provides the `sqlx`-backed implementation,
//! mirroring `auth_core::services::token_service::RefreshTokenStore`).

use crate::error::ReconcileError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One approved application as read from the authoritative store, before
/// projection to per-user `ApprovedUser` records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedApplication {
    pub app_id: String,
    pub expiry: DateTime<Utc>,
    pub applicant_email: String,
    pub collaborator_emails: Vec<String>,
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// All applications currently in the *approved* state.
    async fn list_approved_applications(&self) -> Result<Vec<ApprovedApplication>, ReconcileError>;
}
