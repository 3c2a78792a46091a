//! Structured job report (spec §3, §4.5, §8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status derived from `(errors, processed, expected)` for a single pass,
/// per the completion-status rule in §4.5:
/// - `errors > 0` => `Failure`
/// - `errors == 0 && processed == expected` => `Success`
/// - `errors == 0 && processed < expected` => `Incomplete`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
    Success,
    Incomplete,
    Failure,
}

impl CompletionStatus {
    pub fn derive(error_count: usize, processed: usize, expected: usize) -> Self {
        if error_count > 0 {
            CompletionStatus::Failure
        } else if processed == expected {
            CompletionStatus::Success
        } else {
            CompletionStatus::Incomplete
        }
    }
}

/// Pass 1: missing-permission creation, aggregated across all resolved
/// users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreationReport {
    pub approved_daco_users_count: usize,
    pub approved_ega_users_count: usize,
    pub permissions_missing_count: usize,
    pub permissions_granted_count: usize,
    pub users_processed: usize,
    pub users_expected: usize,
    pub errors: Vec<String>,
    pub status: Option<CompletionStatus>,
}

impl CreationReport {
    pub fn finalize(&mut self) {
        self.status = Some(CompletionStatus::derive(
            self.errors.len(),
            self.users_processed,
            self.users_expected,
        ));
    }
}

/// Pass 2: stale-permission revocation, aggregated across all datasets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevocationReport {
    pub permissions_revoked_count: usize,
    pub datasets_processed: usize,
    pub datasets_expected: usize,
    pub has_incorrect_permissions_count: bool,
    pub errors: Vec<String>,
    pub status: Option<CompletionStatus>,
}

impl RevocationReport {
    pub fn finalize(&mut self) {
        self.status = Some(CompletionStatus::derive(
            self.errors.len(),
            self.datasets_processed,
            self.datasets_expected,
        ));
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationDetails {
    pub permissions_created: CreationReport,
    pub permissions_revoked: RevocationReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub details: ReconciliationDetails,
}

impl JobReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
