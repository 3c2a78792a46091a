//! MySQL-backed `ApplicationStore` (component C's store seam, spec §4.3).
//!
//! Reads applications currently in the approved state plus their listed
//! collaborators. Grounded on `auth_db::repositories::user_repository`'s
//! manual `sqlx::query` + `Row::try_get` mapping (no `query_as!` macros, so
//! the crate builds without a live `DATABASE_URL` at compile time).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recon_core::{ApplicationStore, ApprovedApplication, ReconcileError};
use secrecy::{ExposeSecret, Secret};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySqlPool, Row};
use std::collections::HashMap;
use std::time::Duration;

/// One run touches the store exactly once (component C's single read), so
/// the pool is sized for a batch job rather than `auth_db::connection`'s
/// high-concurrency server pool.
pub async fn create_mysql_pool(mysql_url: &Secret<String>, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .test_before_acquire(true)
        .connect(mysql_url.expose_secret())
        .await
}

#[derive(Clone)]
pub struct ApplicationRepository {
    pool: MySqlPool,
}

impl ApplicationRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_approved(&self) -> Result<HashMap<String, (String, DateTime<Utc>)>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, applicant_email, expires_at
            FROM applications
            WHERE status = 'approved'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut applications = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let applicant_email: String = row.try_get("applicant_email")?;
            let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
            applications.insert(id, (applicant_email, expires_at));
        }
        tracing::debug!(count = applications.len(), "fetched approved applications");
        Ok(applications)
    }

    #[tracing::instrument(skip(self, application_ids), fields(application_count = application_ids.len()))]
    async fn fetch_collaborators(&self, application_ids: &[String]) -> Result<HashMap<String, Vec<String>>, sqlx::Error> {
        if application_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = application_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            "SELECT application_id, email FROM application_collaborators WHERE application_id IN ({placeholders})"
        );
        let mut builder = sqlx::query(&query);
        for id in application_ids {
            builder = builder.bind(id);
        }
        let rows = builder.fetch_all(&self.pool).await?;

        let mut by_application: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let application_id: String = row.try_get("application_id")?;
            let email: String = row.try_get("email")?;
            by_application.entry(application_id).or_default().push(email);
        }
        Ok(by_application)
    }
}

#[async_trait]
impl ApplicationStore for ApplicationRepository {
    async fn list_approved_applications(&self) -> Result<Vec<ApprovedApplication>, ReconcileError> {
        let applications = self.fetch_approved().await?;
        let ids: Vec<String> = applications.keys().cloned().collect();
        let collaborators = self.fetch_collaborators(&ids).await?;

        Ok(applications
            .into_iter()
            .map(|(app_id, (applicant_email, expiry))| ApprovedApplication {
                collaborator_emails: collaborators.get(&app_id).cloned().unwrap_or_default(),
                app_id,
                expiry,
                applicant_email,
            })
            .collect())
    }
}
