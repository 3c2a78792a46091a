//! `--dry-run` wrapper: logs intended mutations instead of sending them.
//!
//! Reads pass straight through to the wrapped client so the two
//! reconciliation passes compute the same diffs a real run would; only the
//! three mutation endpoints are intercepted. Grounded on the
//! decorator-over-a-trait-object shape `auth_core::audit::TracingAuditLogger`
//! uses to stand in for a real audit sink.

use async_trait::async_trait;
use recon_core::{
    ApprovalOutcome, ApprovePermissionRequest, CreatedPermissionRequest, DacApiClient, Dataset,
    ParseOutcome, Permission, PermissionRequest, PlatformUser, ReconcileError, RevocationOutcome,
    RevokePermissionRequest,
};

pub struct DryRunClient<C> {
    inner: C,
}

impl<C> DryRunClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: DacApiClient> DacApiClient for DryRunClient<C> {
    async fn list_datasets(&self, dac_id: &str) -> Result<ParseOutcome<Dataset>, ReconcileError> {
        self.inner.list_datasets(dac_id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<PlatformUser, ReconcileError> {
        self.inner.get_user_by_email(email).await
    }

    async fn list_dataset_permissions(
        &self,
        dac_id: &str,
        dataset_accession_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ParseOutcome<Permission>, ReconcileError> {
        self.inner
            .list_dataset_permissions(dac_id, dataset_accession_id, limit, offset)
            .await
    }

    async fn list_user_permissions(&self, user_id: i64, limit: u32) -> Result<ParseOutcome<Permission>, ReconcileError> {
        self.inner.list_user_permissions(user_id, limit).await
    }

    async fn create_permission_requests(
        &self,
        chunk: &[PermissionRequest],
    ) -> Result<ParseOutcome<CreatedPermissionRequest>, ReconcileError> {
        tracing::info!(count = chunk.len(), "dry-run: would create permission requests");
        let success = chunk
            .iter()
            .enumerate()
            .map(|(i, r)| CreatedPermissionRequest {
                request_id: -(i as i64) - 1,
                username: r.username.clone(),
                dataset_accession_id: r.dataset_accession_id.clone(),
            })
            .collect();
        Ok(ParseOutcome { success, failure: vec![] })
    }

    async fn approve_permission_requests(&self, chunk: &[ApprovePermissionRequest]) -> Result<ApprovalOutcome, ReconcileError> {
        tracing::info!(count = chunk.len(), "dry-run: would approve permission requests");
        Ok(ApprovalOutcome { num_granted: chunk.len() })
    }

    async fn revoke_permissions(&self, chunk: &[RevokePermissionRequest]) -> Result<RevocationOutcome, ReconcileError> {
        tracing::info!(count = chunk.len(), "dry-run: would revoke permissions");
        Ok(RevocationOutcome { num_revoked: chunk.len() })
    }
}
