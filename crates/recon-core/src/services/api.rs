//! The abstract surface the Reconciler, User Resolver, and Approved-User
//! Projection depend on. The concrete `reqwest`-backed implementation
//! (component B's transport, rate limiting, and 401/429/504 interception)
//! lives in the `recon-client` crate and implements this trait — the same
//! store-trait-in-core / implementation-in-adjacent-crate split the teacher
//! uses for `RefreshTokenStore`/`UserStore`.

use crate::error::ReconcileError;
use crate::models::{
    ApprovePermissionRequest, CreatedPermissionRequest, Dataset, PermissionRequest,
    PlatformUser, RevokePermissionRequest,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Per-item validation outcome for array endpoints (§4.2 "Array parsing
/// contract" and §9 "parseMany"): each element is validated independently
/// and placed in `success` or `failure`. Only transport-level or top-level
/// schema errors fail the call as a whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseOutcome<T> {
    pub success: Vec<T>,
    pub failure: Vec<String>,
}

impl<T> ParseOutcome<T> {
    pub fn len(&self) -> usize {
        self.success.len() + self.failure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.failure.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub num_granted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationOutcome {
    pub num_revoked: usize,
}

#[async_trait]
pub trait DacApiClient: Send + Sync {
    /// `GET /dacs/{dacId}/datasets`
    async fn list_datasets(&self, dac_id: &str) -> Result<ParseOutcome<Dataset>, ReconcileError>;

    /// `GET /users/{email}`
    async fn get_user_by_email(&self, email: &str) -> Result<PlatformUser, ReconcileError>;

    /// `GET /dacs/{dacId}/permissions?dataset_accession_id=...&limit=...&offset=...`
    async fn list_dataset_permissions(
        &self,
        dac_id: &str,
        dataset_accession_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ParseOutcome<crate::models::Permission>, ReconcileError>;

    /// `GET /permissions?user_id=...&limit=N`
    async fn list_user_permissions(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<ParseOutcome<crate::models::Permission>, ReconcileError>;

    /// `POST /requests`. `chunk.len()` must not exceed the configured
    /// `MaxBatch`; the client does not chunk on the caller's behalf.
    async fn create_permission_requests(
        &self,
        chunk: &[PermissionRequest],
    ) -> Result<ParseOutcome<CreatedPermissionRequest>, ReconcileError>;

    /// `PUT /requests`
    async fn approve_permission_requests(
        &self,
        chunk: &[ApprovePermissionRequest],
    ) -> Result<ApprovalOutcome, ReconcileError>;

    /// `DELETE /permissions`
    async fn revoke_permissions(
        &self,
        chunk: &[RevokePermissionRequest],
    ) -> Result<RevocationOutcome, ReconcileError>;
}
