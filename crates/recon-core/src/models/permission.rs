//! Permission and permission-mutation models (spec §3).

use super::ids::{DacId, DatasetId, UserAccessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An existing grant on the platform. Immutable from the engine's
/// perspective: the engine only creates or revokes, never edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub permission_id: i64,
    pub username: String,
    pub user_accession_id: UserAccessionId,
    pub dataset_accession_id: DatasetId,
    pub dac_accession_id: DacId,
}

/// Construction-only record asking the platform for a grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub username: String,
    pub dataset_accession_id: DatasetId,
    pub request_data: PermissionRequestData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRequestData {
    pub comment: String,
}

/// Returned by the platform after `POST /requests` creates a pending
/// request; `request_id` is what `ApprovePermissionRequest` approves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedPermissionRequest {
    pub request_id: i64,
    pub username: String,
    pub dataset_accession_id: DatasetId,
}

/// Invariant: the platform permission expiry equals the local application
/// expiry that justified granting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovePermissionRequest {
    pub request_id: i64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokePermissionRequest {
    pub id: i64,
    pub reason: String,
}

/// The fixed reason string recorded on every revocation.
pub const REVOKE_REASON: &str = "DAC access has expired for this user";
