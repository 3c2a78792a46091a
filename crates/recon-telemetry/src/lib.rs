//! Tracing and metrics bootstrap for the reconciliation engine.
//!
//! Grounded on `auth_telemetry::init_telemetry`'s
//! `Registry`-plus-`fmt`-layer-plus-Prometheus-recorder shape, extended
//! with an `EnvFilter` (as the corpus's own `main.rs` installs one ad hoc)
//! and a plain-vs-JSON switch driven by configuration rather than hardcoded
//! to JSON, since this engine's operator may run it directly in a terminal.

use metrics_exporter_prometheus::PrometheusBuilder;
use recon_core::JobReport;
use tracing::subscriber::set_global_default;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

pub fn init_telemetry(level: &str, json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let subscriber = Registry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json());
        set_global_default(subscriber).map_err(|e| anyhow::anyhow!(e))?;
    } else {
        let subscriber = Registry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer());
        set_global_default(subscriber).map_err(|e| anyhow::anyhow!(e))?;
    }

    PrometheusBuilder::new()
        .install()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

/// Records the handful of counters/histograms a job run produces: this is
/// wiring around the report the Reconciler already built, not a new
/// feature the spec's Non-goals would exclude (§9 of the expanded spec).
pub fn record_job_report(report: &JobReport) {
    metrics::counter!("recon_jobs_total").increment(1);
    if !report.success {
        metrics::counter!("recon_jobs_failed_total").increment(1);
    }

    metrics::counter!("recon_permissions_created_total")
        .increment(report.details.permissions_created.permissions_granted_count as u64);
    metrics::counter!("recon_permissions_revoked_total")
        .increment(report.details.permissions_revoked.permissions_revoked_count as u64);

    let duration_ms = report.duration().num_milliseconds().max(0) as f64;
    metrics::histogram!("recon_job_duration_ms").record(duration_ms);

    tracing::info!(
        success = report.success,
        permissions_granted = report.details.permissions_created.permissions_granted_count,
        permissions_revoked = report.details.permissions_revoked.permissions_revoked_count,
        duration_ms,
        "reconciliation job finished"
    );
}
