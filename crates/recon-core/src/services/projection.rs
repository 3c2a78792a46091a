//! Approved-User Projection (component C, spec §4.3).
//!
//! Purely in-process: reads approved applications from the authoritative
//! store and projects one `ApprovedUser` per applicant and per
//! collaborator, deduplicated by email (first occurrence wins). No network
//! activity; fails only if the store read fails.

use crate::error::ReconcileError;
use crate::models::ApprovedUser;
use crate::services::store::ApplicationStore;
use std::collections::HashSet;

pub struct ApprovedUserProjection<'a, S: ApplicationStore> {
    store: &'a S,
}

impl<'a, S: ApplicationStore> ApprovedUserProjection<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn project(&self) -> Result<Vec<ApprovedUser>, ReconcileError> {
        let applications = self
            .store
            .list_approved_applications()
            .await
            .map_err(|e| match e {
                ReconcileError::StoreFailure(_) => e,
                other => ReconcileError::StoreFailure(other.to_string()),
            })?;

        let mut seen = HashSet::new();
        let mut approved = Vec::new();

        for app in applications {
            for email in std::iter::once(app.applicant_email.clone()).chain(app.collaborator_emails) {
                if seen.insert(email.clone()) {
                    approved.push(ApprovedUser {
                        email,
                        app_expiry: app.expiry,
                        app_id: app.app_id.clone(),
                    });
                }
            }
        }

        Ok(approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::ApprovedApplication;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FakeStore(Vec<ApprovedApplication>);

    #[async_trait]
    impl ApplicationStore for FakeStore {
        async fn list_approved_applications(&self) -> Result<Vec<ApprovedApplication>, ReconcileError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn dedups_by_email_keeping_first_occurrence() {
        let expiry = Utc::now();
        let store = FakeStore(vec![
            ApprovedApplication {
                app_id: "app-1".to_string(),
                expiry,
                applicant_email: "alice@x.org".to_string(),
                collaborator_emails: vec!["bob@x.org".to_string()],
            },
            ApprovedApplication {
                app_id: "app-2".to_string(),
                expiry: expiry + chrono::Duration::days(1),
                applicant_email: "bob@x.org".to_string(),
                collaborator_emails: vec![],
            },
        ]);

        let projection = ApprovedUserProjection::new(&store);
        let users = projection.project().await.unwrap();

        assert_eq!(users.len(), 2);
        let bob = users.iter().find(|u| u.email == "bob@x.org").unwrap();
        assert_eq!(bob.app_id, "app-1");
    }

    #[tokio::test]
    async fn store_failure_is_fatal_to_projection() {
        struct FailingStore;

        #[async_trait]
        impl ApplicationStore for FailingStore {
            async fn list_approved_applications(&self) -> Result<Vec<ApprovedApplication>, ReconcileError> {
                Err(ReconcileError::StoreFailure("connection refused".to_string()))
            }
        }

        let projection = ApprovedUserProjection::new(&FailingStore);
        assert!(projection.project().await.is_err());
    }
}
