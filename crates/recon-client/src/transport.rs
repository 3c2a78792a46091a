use async_trait::async_trait;
use recon_core::resilience::retry_once;
use recon_core::{
    ApprovalOutcome, ApprovePermissionRequest, CreatedPermissionRequest, DacApiClient, Dataset,
    ParseOutcome, Permission, PermissionRequest, PlatformUser, RateLimiter, ReconcileError,
    RevocationOutcome, RevokePermissionRequest, Token, TokenManager,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

pub struct HttpDacApiClient {
    http: reqwest::Client,
    base_url: String,
    token_manager: Arc<TokenManager>,
    rate_limiter: Arc<RateLimiter>,
}

impl HttpDacApiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        token_manager: Arc<TokenManager>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            http,
            base_url,
            token_manager,
            rate_limiter,
        }
    }

    async fn dispatch(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
        token: &Token,
    ) -> Result<reqwest::Response, ReconcileError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url).bearer_auth(&token.access_token);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(ReconcileError::from)
    }

    /// Dispatches once, applying the 401 invalidate-reacquire-retry rule.
    /// A second 401 is a fatal condition for this call.
    async fn send_once(&self, method: reqwest::Method, path: &str, body: Option<&Value>) -> Result<Value, ReconcileError> {
        self.rate_limiter.acquire().await;
        let token = self.token_manager.acquire().await?;
        let response = self.dispatch(method.clone(), path, body, &token).await?;

        if response.status().as_u16() == 401 {
            tracing::warn!(path, "received 401, invalidating cached token and retrying once");
            self.token_manager.invalidate().await;
            let token = self.token_manager.acquire().await?;
            let retried = self.dispatch(method, path, body, &token).await?;

            if retried.status().as_u16() == 401 {
                return Err(ReconcileError::ServerError {
                    message: "unauthorized after token refresh retry".to_string(),
                });
            }
            return Self::interpret(retried).await;
        }

        Self::interpret(response).await
    }

    /// Wraps `send_once` with the single-shot retry for 429/504/connection
    /// reset (spec §4.2). The 401 path is handled a layer below this one,
    /// since it requires a different recovery action than a bare retry.
    async fn send(&self, method: reqwest::Method, path: &str, body: Option<&Value>) -> Result<Value, ReconcileError> {
        retry_once(
            || self.send_once(method.clone(), path, body),
            ReconcileError::is_retryable,
        )
        .await
    }

    async fn interpret(response: reqwest::Response) -> Result<Value, ReconcileError> {
        let status = response.status();
        match status.as_u16() {
            200..=299 => response.json::<Value>().await.map_err(ReconcileError::from),
            400 => Err(ReconcileError::BadRequest {
                message: response.text().await.unwrap_or_default(),
            }),
            404 => Err(ReconcileError::NotFound {
                message: response.text().await.unwrap_or_default(),
            }),
            429 => Err(ReconcileError::TooManyRequests),
            504 => Err(ReconcileError::GatewayTimeout {
                message: response.text().await.unwrap_or_default(),
            }),
            _ if status.is_server_error() => Err(ReconcileError::ServerError {
                message: response.text().await.unwrap_or_default(),
            }),
            other => Err(ReconcileError::ServerError {
                message: format!("unexpected status {other}"),
            }),
        }
    }

    /// Per-item array parsing contract (§4.2): each array element is
    /// validated independently, landing in `success` or `failure`. Only a
    /// non-array top-level response fails the whole call.
    fn parse_many<T: DeserializeOwned>(value: Value) -> ParseOutcome<T> {
        let Some(items) = value.as_array() else {
            return ParseOutcome {
                success: vec![],
                failure: vec!["response body was not a JSON array".to_string()],
            };
        };

        let mut success = Vec::with_capacity(items.len());
        let mut failure = Vec::new();
        for item in items {
            match serde_json::from_value::<T>(item.clone()) {
                Ok(parsed) => success.push(parsed),
                Err(e) => failure.push(e.to_string()),
            }
        }
        ParseOutcome { success, failure }
    }
}

#[async_trait]
impl DacApiClient for HttpDacApiClient {
    async fn list_datasets(&self, dac_id: &str) -> Result<ParseOutcome<Dataset>, ReconcileError> {
        let path = format!("/dacs/{dac_id}/datasets");
        let value = self.send(reqwest::Method::GET, &path, None).await?;
        Ok(Self::parse_many(value))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<PlatformUser, ReconcileError> {
        let path = format!("/users/{email}");
        let value = self.send(reqwest::Method::GET, &path, None).await?;
        serde_json::from_value(value).map_err(ReconcileError::from)
    }

    async fn list_dataset_permissions(
        &self,
        dac_id: &str,
        dataset_accession_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ParseOutcome<Permission>, ReconcileError> {
        let path = format!(
            "/dacs/{dac_id}/permissions?dataset_accession_id={dataset_accession_id}&limit={limit}&offset={offset}"
        );
        let value = self.send(reqwest::Method::GET, &path, None).await?;
        Ok(Self::parse_many(value))
    }

    async fn list_user_permissions(&self, user_id: i64, limit: u32) -> Result<ParseOutcome<Permission>, ReconcileError> {
        let path = format!("/permissions?user_id={user_id}&limit={limit}");
        let value = self.send(reqwest::Method::GET, &path, None).await?;
        Ok(Self::parse_many(value))
    }

    async fn create_permission_requests(
        &self,
        chunk: &[PermissionRequest],
    ) -> Result<ParseOutcome<CreatedPermissionRequest>, ReconcileError> {
        let body = serde_json::to_value(chunk)?;
        let value = self.send(reqwest::Method::POST, "/requests", Some(&body)).await?;
        Ok(Self::parse_many(value))
    }

    async fn approve_permission_requests(&self, chunk: &[ApprovePermissionRequest]) -> Result<ApprovalOutcome, ReconcileError> {
        let body = serde_json::to_value(chunk)?;
        let value = self.send(reqwest::Method::PUT, "/requests", Some(&body)).await?;
        serde_json::from_value(value).map_err(ReconcileError::from)
    }

    async fn revoke_permissions(&self, chunk: &[RevokePermissionRequest]) -> Result<RevocationOutcome, ReconcileError> {
        let body = serde_json::to_value(chunk)?;
        let value = self.send(reqwest::Method::DELETE, "/permissions", Some(&body)).await?;
        serde_json::from_value(value).map_err(ReconcileError::from)
    }
}
