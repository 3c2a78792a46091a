//! The Reconciler (component E, spec §4.5): the two-pass orchestrator.
//!
//! Pass 1 creates missing permissions per resolved user; Pass 2 revokes
//! stale permissions per dataset. Only the initial dataset fetch is fatal —
//! every other failure is recorded in the job report and reconciliation
//! continues, per the state machine in §4.5.

use crate::error::ReconcileError;
use crate::models::{
    ApprovePermissionRequest, ApprovedUser, CompletionStatus, CreationReport, Dataset, JobReport,
    Permission, PermissionRequest, PermissionRequestData, ReconciliationDetails, ResolvedMap,
    RevocationReport, RevokePermissionRequest, REVOKE_REASON,
};
use crate::services::api::DacApiClient;
use crate::services::resolver::UserResolver;
use chrono::Utc;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    FetchingDatasets,
    Aborted,
    ResolvingUsers,
    CreatingPermissions,
    RevokingPermissions,
    Reporting,
}

pub struct ReconcilerConfig {
    pub dac_id: String,
    pub grantor_comment: String,
    pub max_batch_size: usize,
    pub page_limit: u32,
    pub page_offset: u32,
}

pub struct Reconciler<'a> {
    client: &'a dyn DacApiClient,
    config: ReconcilerConfig,
}

/// Splits `items` into chunks of at most `max_batch_size`, the ceiling
/// described in §4.2 ("No single PUT/POST/DELETE body may contain more
/// than MaxBatch items"). The client never chunks on the caller's behalf,
/// so the reconciler must.
fn chunked<T: Clone>(items: &[T], max_batch_size: usize) -> Vec<Vec<T>> {
    if max_batch_size == 0 {
        return vec![items.to_vec()];
    }
    items.chunks(max_batch_size).map(|c| c.to_vec()).collect()
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a dyn DacApiClient, config: ReconcilerConfig) -> Self {
        Self { client, config }
    }

    /// Runs the full job: `Idle -> FetchingDatasets -> (Aborted | ResolvingUsers)
    /// -> CreatingPermissions -> RevokingPermissions -> Reporting -> Idle`.
    ///
    /// `approved` is component C's output (the pre-resolution approved-user
    /// list). Per the spec's control flow ("asks B for the DAC's datasets,
    /// asks D … for platform user records") and recovery policy ("the only
    /// fatal condition is the inability to enumerate datasets, because every
    /// subsequent step is scoped by that list"), the User Resolver (component
    /// D) is only invoked once dataset enumeration has succeeded — a dataset
    /// fetch failure must not spend a single `GET /users/{email}` call.
    #[tracing::instrument(skip_all, fields(dac_id = %self.config.dac_id))]
    pub async fn run(&self, approved: &[ApprovedUser], cancel: &CancellationToken) -> JobReport {
        let started_at = Utc::now();
        let mut state = State::FetchingDatasets;

        let datasets = match self.fetch_datasets(cancel).await {
            Ok(datasets) => datasets,
            Err(e) => {
                state = State::Aborted;
                tracing::error!(error = %e, "fatal: could not enumerate datasets, aborting run");
                return JobReport {
                    job_name: "dac-permissions-reconciliation".to_string(),
                    started_at,
                    finished_at: Utc::now(),
                    success: false,
                    error: Some(e.to_string()),
                    details: ReconciliationDetails::default(),
                };
            }
        };
        debug_assert_eq!(state, State::FetchingDatasets);

        state = State::ResolvingUsers;
        let resolver = UserResolver::new(self.client);
        let resolved = resolver.resolve(approved).await;
        let _ = state;

        state = State::CreatingPermissions;
        let creation = self.run_creation_pass(approved.len(), &resolved, &datasets, cancel).await;

        state = State::RevokingPermissions;
        let revocation = self.run_revocation_pass(&resolved, &datasets, cancel).await;

        state = State::Reporting;
        let success = creation.errors.is_empty() && revocation.errors.is_empty();
        let report = JobReport {
            job_name: "dac-permissions-reconciliation".to_string(),
            started_at,
            finished_at: Utc::now(),
            success,
            error: None,
            details: ReconciliationDetails {
                permissions_created: creation,
                permissions_revoked: revocation,
            },
        };
        let _ = state; // -> Idle

        report
    }

    async fn fetch_datasets(&self, cancel: &CancellationToken) -> Result<Vec<Dataset>, ReconcileError> {
        tokio::select! {
            result = self.client.list_datasets(&self.config.dac_id) => {
                let outcome = result?;
                if outcome.success.is_empty() && !outcome.failure.is_empty() {
                    return Err(ReconcileError::FatalBootstrap {
                        message: format!("all {} dataset entries failed schema validation", outcome.failure.len()),
                    });
                }
                Ok(outcome.success)
            }
            _ = cancel.cancelled() => Err(ReconcileError::FatalBootstrap {
                message: "cancelled before datasets could be enumerated".to_string(),
            }),
        }
    }

    /// Pass 1 — create missing permissions, one user at a time (spec §4.5).
    ///
    /// `approved_count` is the pre-resolution size of the local approved-user
    /// list (component C's output); `resolved.len()` is the post-resolution
    /// count that actually has a platform account. The two diverge whenever
    /// a user fails to resolve (spec §8 scenario 4:
    /// `approvedDacoUsersCount=2, approvedEgaUsersCount=1`).
    async fn run_creation_pass(
        &self,
        approved_count: usize,
        resolved: &ResolvedMap,
        datasets: &[Dataset],
        cancel: &CancellationToken,
    ) -> CreationReport {
        let mut report = CreationReport {
            approved_daco_users_count: approved_count,
            approved_ega_users_count: resolved.len(),
            users_expected: resolved.len(),
            ..Default::default()
        };

        for user in resolved.values() {
            if cancel.is_cancelled() {
                break;
            }

            match self.reconcile_user_permissions(user, datasets, cancel).await {
                Ok((missing, granted)) => {
                    report.permissions_missing_count += missing;
                    report.permissions_granted_count += granted;
                    if granted == missing {
                        report.users_processed += 1;
                    } else {
                        tracing::warn!(
                            username = user.username(),
                            missing,
                            granted,
                            "user not fully processed: granted count does not match missing count"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(username = user.username(), error = %e, "failed to reconcile permissions for user");
                    report.errors.push(format!("{}: {}", user.username(), e));
                }
            }
        }

        report.finalize();
        report
    }

    async fn reconcile_user_permissions(
        &self,
        user: &crate::models::ResolvedUser,
        datasets: &[Dataset],
        cancel: &CancellationToken,
    ) -> Result<(usize, usize), ReconcileError> {
        // A user can hold at most one permission per dataset, so the current
        // dataset count is always a sufficient limit to see everything held.
        let held = tokio::select! {
            result = self.client.list_user_permissions(user.platform.id, datasets.len() as u32) => result?,
            _ = cancel.cancelled() => return Ok((0, 0)),
        };

        let held_dataset_ids: HashSet<&str> = held
            .success
            .iter()
            .map(|p| p.dataset_accession_id.as_str())
            .collect();

        let missing: Vec<&Dataset> = datasets
            .iter()
            .filter(|d| !held_dataset_ids.contains(d.accession_id.as_str()))
            .collect();

        let missing_count = missing.len();
        if missing.is_empty() {
            return Ok((0, 0));
        }

        let requests: Vec<PermissionRequest> = missing
            .iter()
            .map(|d| PermissionRequest {
                username: user.username().to_string(),
                dataset_accession_id: d.accession_id.clone(),
                request_data: PermissionRequestData {
                    comment: self.config.grantor_comment.clone(),
                },
            })
            .collect();

        let mut granted_count = 0;
        for chunk in chunked(&requests, self.config.max_batch_size) {
            // Inter-chunk boundary: a cancelled run must not dispatch
            // further chunks, per §5. The create-then-approve sequence for
            // a chunk already in flight is always allowed to finish so a
            // request is never left pending without its matching approval.
            if cancel.is_cancelled() {
                break;
            }

            let created = self.client.create_permission_requests(&chunk).await?;

            if created.success.is_empty() {
                continue;
            }

            let approvals: Vec<ApprovePermissionRequest> = created
                .success
                .iter()
                .map(|c| ApprovePermissionRequest {
                    request_id: c.request_id,
                    expires_at: user.app_expiry,
                })
                .collect();

            let approved = self.client.approve_permission_requests(&approvals).await?;
            granted_count += approved.num_granted;
        }

        Ok((missing_count, granted_count))
    }

    /// Pass 2 — revoke stale permissions, one dataset at a time (spec §4.5).
    async fn run_revocation_pass(
        &self,
        resolved: &ResolvedMap,
        datasets: &[Dataset],
        cancel: &CancellationToken,
    ) -> RevocationReport {
        let mut report = RevocationReport {
            datasets_expected: datasets.len(),
            ..Default::default()
        };

        for dataset in datasets {
            if cancel.is_cancelled() {
                break;
            }

            match self.revoke_stale_permissions_for_dataset(resolved, dataset, cancel).await {
                Ok((revoked, remaining_after, expected_to_revoke)) => {
                    report.permissions_revoked_count += revoked;

                    // A dataset only counts as successfully processed when
                    // both post-conditions in §4.5 step 4 hold: the revoked
                    // count matches what was targeted, and the post-revoke
                    // permission count lands exactly on |ResolvedMap|.
                    let revoked_as_expected = revoked == expected_to_revoke;
                    let count_correct = remaining_after == resolved.len();
                    if !count_correct {
                        report.has_incorrect_permissions_count = true;
                    }

                    if revoked_as_expected && count_correct {
                        report.datasets_processed += 1;
                    } else {
                        tracing::warn!(
                            dataset = %dataset.accession_id,
                            revoked,
                            expected_to_revoke,
                            remaining_after,
                            expected_remaining = resolved.len(),
                            "dataset not fully processed: revoked count or post-revoke count mismatch"
                        );
                        report.errors.push(format!(
                            "{}: revoked {revoked}/{expected_to_revoke} permissions, {remaining_after} remaining (expected {})",
                            dataset.accession_id,
                            resolved.len()
                        ));
                    }
                }
                Err(e) => {
                    tracing::error!(dataset = %dataset.accession_id, error = %e, "failed to reconcile permissions for dataset");
                    report.errors.push(format!("{}: {}", dataset.accession_id, e));
                }
            }
        }

        report.finalize();
        report
    }

    /// Returns `(revoked_count, remaining_after, expected_to_revoke)`:
    /// `expected_to_revoke` is `|toRevoke|` (spec §4.5 step 4), so the
    /// caller can check `revoked_count == expected_to_revoke` alongside the
    /// post-revoke count before counting the dataset as processed.
    async fn revoke_stale_permissions_for_dataset(
        &self,
        resolved: &ResolvedMap,
        dataset: &Dataset,
        cancel: &CancellationToken,
    ) -> Result<(usize, usize, usize), ReconcileError> {
        let mut offset = self.config.page_offset;
        let mut all_permissions: Vec<Permission> = Vec::new();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let page = tokio::select! {
                result = self.client.list_dataset_permissions(
                    &self.config.dac_id,
                    dataset.accession_id.as_str(),
                    self.config.page_limit,
                    offset,
                ) => result?,
                _ = cancel.cancelled() => break,
            };

            let page_size = page.len();
            all_permissions.extend(page.success);

            if page_size < self.config.page_limit as usize {
                break;
            }
            offset += self.config.page_limit;
        }

        let to_revoke: Vec<&Permission> = all_permissions
            .iter()
            .filter(|p| !resolved.contains_key(&p.username))
            .collect();

        let mut revoked_count = 0;
        for chunk in chunked(&to_revoke.iter().map(|p| p.permission_id).collect::<Vec<_>>(), self.config.max_batch_size)
        {
            // Inter-chunk boundary, same as the creation pass: stop
            // dispatching further revocation batches once cancelled.
            if cancel.is_cancelled() {
                break;
            }

            let requests: Vec<RevokePermissionRequest> = chunk
                .into_iter()
                .map(|id| RevokePermissionRequest {
                    id,
                    reason: REVOKE_REASON.to_string(),
                })
                .collect();

            let outcome = self.client.revoke_permissions(&requests).await?;
            revoked_count += outcome.num_revoked;
        }

        let expected_to_revoke = to_revoke.len();
        let remaining_after = all_permissions.len() - expected_to_revoke;
        Ok((revoked_count, remaining_after, expected_to_revoke))
    }
}
