//! User Resolver (component D, spec §4.4).
//!
//! Resolves each `ApprovedUser` to the platform's user record by email,
//! building the `ResolvedMap` keyed by the platform-reported `username`.
//! Per-user failures (`NotFound`, schema/server errors, or anything
//! unrecognized) are logged and the user is simply omitted — reconciliation
//! continues for everyone else. Ordering is immaterial.

use crate::error::ReconcileError;
use crate::models::{ApprovedUser, ResolvedMap, ResolvedUser};
use crate::services::api::DacApiClient;

pub struct UserResolver<'a> {
    client: &'a dyn DacApiClient,
}

impl<'a> UserResolver<'a> {
    pub fn new(client: &'a dyn DacApiClient) -> Self {
        Self { client }
    }

    pub async fn resolve(&self, approved: &[ApprovedUser]) -> ResolvedMap {
        let mut resolved = ResolvedMap::new();

        for user in approved {
            match self.client.get_user_by_email(&user.email).await {
                Ok(platform) => {
                    resolved.insert(
                        platform.username.clone(),
                        ResolvedUser {
                            platform,
                            app_expiry: user.app_expiry,
                            app_id: user.app_id.clone(),
                        },
                    );
                }
                Err(ReconcileError::NotFound { .. }) => {
                    tracing::info!(email = %user.email, "approved user has no platform account, omitting from reconciliation");
                }
                Err(e) => {
                    tracing::warn!(email = %user.email, error = %e, "failed to resolve approved user, omitting from reconciliation");
                }
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ApprovePermissionRequest, CreatedPermissionRequest, Dataset, Permission, PermissionRequest,
        PlatformUser, RevokePermissionRequest, UserAccessionId,
    };
    use crate::services::api::{ApprovalOutcome, ParseOutcome, RevocationOutcome};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;

    struct FakeClient {
        users_by_email: HashMap<String, PlatformUser>,
    }

    #[async_trait]
    impl DacApiClient for FakeClient {
        async fn list_datasets(&self, _dac_id: &str) -> Result<ParseOutcome<Dataset>, ReconcileError> {
            unimplemented!()
        }

        async fn get_user_by_email(&self, email: &str) -> Result<PlatformUser, ReconcileError> {
            self.users_by_email
                .get(email)
                .cloned()
                .ok_or_else(|| ReconcileError::NotFound {
                    message: email.to_string(),
                })
        }

        async fn list_dataset_permissions(
            &self,
            _dac_id: &str,
            _dataset_accession_id: &str,
            _limit: u32,
            _offset: u32,
        ) -> Result<ParseOutcome<Permission>, ReconcileError> {
            unimplemented!()
        }

        async fn list_user_permissions(&self, _user_id: i64, _limit: u32) -> Result<ParseOutcome<Permission>, ReconcileError> {
            unimplemented!()
        }

        async fn create_permission_requests(
            &self,
            _chunk: &[PermissionRequest],
        ) -> Result<ParseOutcome<CreatedPermissionRequest>, ReconcileError> {
            unimplemented!()
        }

        async fn approve_permission_requests(
            &self,
            _chunk: &[ApprovePermissionRequest],
        ) -> Result<ApprovalOutcome, ReconcileError> {
            unimplemented!()
        }

        async fn revoke_permissions(&self, _chunk: &[RevokePermissionRequest]) -> Result<RevocationOutcome, ReconcileError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn unresolvable_users_are_omitted_not_fatal() {
        let mut users_by_email = HashMap::new();
        users_by_email.insert(
            "alice@x.org".to_string(),
            PlatformUser {
                id: 1,
                username: "alice".to_string(),
                email: Some("alice@x.org".to_string()),
                accession_id: UserAccessionId::try_from("EGAW00000000001".to_string()).unwrap(),
            },
        );
        let client = FakeClient { users_by_email };

        let approved = vec![
            ApprovedUser {
                email: "alice@x.org".to_string(),
                app_expiry: Utc::now(),
                app_id: "app-1".to_string(),
            },
            ApprovedUser {
                email: "ghost@x.org".to_string(),
                app_expiry: Utc::now(),
                app_id: "app-2".to_string(),
            },
        ];

        let resolver = UserResolver::new(&client);
        let resolved = resolver.resolve(&approved).await;

        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains_key("alice"));
    }
}
