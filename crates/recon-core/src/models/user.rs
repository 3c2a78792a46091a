//! User-related models (spec §3): `PlatformUser`, `ApprovedUser`,
//! `ResolvedUser`, and the `ResolvedMap` they're merged into.

use super::ids::UserAccessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A user record as reported by the external DAC platform.
///
/// Observed invariant from the real service: `email` may be `None` even
/// when `id` is present — `id` is the true primary key and identity must
/// never be re-derived from email after resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub accession_id: UserAccessionId,
}

/// One approved applicant or collaborator, projected from the local
/// authoritative store (component C).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApprovedUser {
    pub email: String,
    pub app_expiry: DateTime<Utc>,
    pub app_id: String,
}

/// The merge of a `PlatformUser` with the `ApprovedUser` application that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedUser {
    pub platform: PlatformUser,
    pub app_expiry: DateTime<Utc>,
    pub app_id: String,
}

impl ResolvedUser {
    pub fn username(&self) -> &str {
        &self.platform.username
    }
}

/// Invariant: keys are precisely the usernames authorized for the DAC for
/// the duration of one run.
pub type ResolvedMap = HashMap<String, ResolvedUser>;
