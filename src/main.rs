//! Entry point for the DAC permissions reconciliation engine.
//!
//! Resolves configuration, wires the five components (Token Manager, API
//! Client, Approved-User Projection, User Resolver, Reconciler), invokes
//! `run_reconciliation()` once, and logs the resulting `JobReport` — "any
//! trigger may invoke it" (spec §6); this binary is one such trigger, not a
//! long-running scheduler.

mod dry_run;

use anyhow::{Context, Result};
use clap::Parser;
use recon_core::{run_reconciliation, ReconcilerConfig};
use recon_crypto::VerifyingKey;
use recon_db::ApplicationRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "recon-engine", about = "DAC permissions reconciliation engine")]
struct Args {
    /// Directory holding default/{environment}/local config files.
    #[arg(long, default_value = "config")]
    config: String,

    /// Log intended mutations instead of sending them.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let environment = std::env::var("RECON__ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    let config = recon_config::ConfigLoader::new(&args.config, &environment)
        .load()
        .context("failed to load configuration")?;

    recon_telemetry::init_telemetry(&config.logging.level, config.logging.json)
        .context("failed to initialize telemetry")?;

    tracing::info!(environment, dac_id = %config.dac.dac_id, dry_run = args.dry_run, "starting reconciliation run");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(
            config.api.request_timeout_seconds.unwrap_or(30),
        ))
        .build()
        .context("failed to build HTTP client")?;

    let verifying_key = VerifyingKey::from_pem(config.auth.token_verification_public_key.clone())
        .context("invalid token-verification public key")?;

    let token_manager = Arc::new(recon_core::TokenManager::new(
        http.clone(),
        &config.auth.base_url,
        &config.auth.realm_name,
        config.auth.client_id.clone(),
        config.auth.username.clone(),
        config.auth.password.clone(),
        verifying_key,
    ));

    let rate_limiter = Arc::new(recon_core::RateLimiter::new(
        config.rate_limit.max_request_limit,
        config.rate_limit.max_request_interval_ms,
    ));

    let http_client = recon_client::HttpDacApiClient::new(
        http,
        config.api.base_url.clone(),
        token_manager,
        rate_limiter,
    );

    let pool = recon_db::create_mysql_pool(&config.store.mysql_url, config.store.max_connections.unwrap_or(5))
        .await
        .context("failed to connect to the authoritative application store")?;
    let store = ApplicationRepository::new(pool);

    let reconciler_config = ReconcilerConfig {
        dac_id: config.dac.dac_id.clone(),
        grantor_comment: config.dac.grantor_comment.clone(),
        max_batch_size: config.batch.max_batch_size,
        page_limit: config.pagination.default_page_limit,
        page_offset: config.pagination.default_page_offset,
    };

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("received interrupt, cancelling in-flight run");
            cancel_on_signal.cancel();
        }
    });

    let report = if args.dry_run {
        let client = dry_run::DryRunClient::new(http_client);
        run_reconciliation(&client, &store, reconciler_config, &cancel).await
    } else {
        run_reconciliation(&http_client, &store, reconciler_config, &cancel).await
    };

    recon_telemetry::record_job_report(&report);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}
