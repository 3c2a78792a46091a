//! Data model (spec §3).

pub mod dataset;
pub mod ids;
pub mod permission;
pub mod report;
pub mod user;

pub use dataset::Dataset;
pub use ids::{DacId, DatasetId, UserAccessionId};
pub use permission::{
    ApprovePermissionRequest, CreatedPermissionRequest, Permission, PermissionRequest,
    PermissionRequestData, RevokePermissionRequest, REVOKE_REASON,
};
pub use report::{
    CompletionStatus, CreationReport, JobReport, ReconciliationDetails, RevocationReport,
};
pub use user::{ApprovedUser, PlatformUser, ResolvedMap, ResolvedUser};
