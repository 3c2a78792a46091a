//! Single-shot retry policy for the API Client's response interception
//! table (spec §4.2). Unlike the teacher's exponential-backoff
//! `auth_core::resilience::retry`, the spec mandates retries are
//! *single-shot*: a second failure of the same class escalates rather than
//! backing off further, so this helper runs the operation at most twice.

use std::future::Future;

/// Runs `operation` once. If it returns `Err(e)` and `should_retry(&e)` is
/// true, runs it exactly one more time and returns that result regardless
/// of outcome. A second failure of the same class is the caller's to
/// surface as fatal-for-this-call.
pub async fn retry_once<F, Fut, T, E>(mut operation: F, should_retry: impl Fn(&E) -> bool) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match operation().await {
        Ok(value) => Ok(value),
        Err(e) if should_retry(&e) => {
            tracing::warn!("retrying request once after retryable failure");
            operation().await
        }
        Err(e) => Err(e),
    }
}
