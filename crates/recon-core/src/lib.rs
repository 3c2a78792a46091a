//! Data model, reconciliation orchestration, and error taxonomy for the DAC
//! permissions engine.
//!
//! Owns everything that can be tested without a real HTTP endpoint or
//! database: the typed wire/report models (`models`), the closed error
//! taxonomy (`error`), the `DacApiClient`/`ApplicationStore` trait seams that
//! `recon-client` and `recon-db` implement, and the four components built on
//! top of those seams (Token Manager, Approved-User Projection, User
//! Resolver, Reconciler).

pub mod error;
pub mod models;
pub mod resilience;
pub mod services;

pub use error::ReconcileError;
pub use models::*;
pub use services::{
    ApplicationStore, ApprovalOutcome, ApprovedApplication, ApprovedUserProjection, DacApiClient,
    ParseOutcome, RateLimiter, Reconciler, ReconcilerConfig, RevocationOutcome, Token,
    TokenManager, UserResolver,
};

use tokio_util::sync::CancellationToken;

/// The full per-run pipeline: project approved users from the local store,
/// then hand them to the Reconciler, which gates user resolution (component
/// D) behind a successful dataset enumeration — only the store read happens
/// ahead of `Reconciler::run`, since a failed store read is fatal in the
/// same spirit as the Reconciler's own fatal dataset-enumeration case but
/// has no dataset list to be scoped by in the first place.
pub async fn run_reconciliation<S: ApplicationStore>(
    client: &dyn DacApiClient,
    store: &S,
    config: ReconcilerConfig,
    cancel: &CancellationToken,
) -> JobReport {
    let started_at = chrono::Utc::now();

    let projection = ApprovedUserProjection::new(store);
    let approved = match projection.project().await {
        Ok(approved) => approved,
        Err(e) => {
            tracing::error!(error = %e, "fatal: could not project approved users, aborting run");
            return JobReport {
                job_name: "dac-permissions-reconciliation".to_string(),
                started_at,
                finished_at: chrono::Utc::now(),
                success: false,
                error: Some(e.to_string()),
                details: ReconciliationDetails::default(),
            };
        }
    };

    let reconciler = Reconciler::new(client, config);
    reconciler.run(&approved, cancel).await
}
