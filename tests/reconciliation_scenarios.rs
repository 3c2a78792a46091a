//! End-to-end reconciliation scenarios (spec §8) driven over real HTTP
//! against `wiremock` stand-ins for the identity host and the DAC platform,
//! with an in-memory `ApplicationStore` double standing in for the
//! authoritative local database. Named and organized the way the teacher's
//! `tests/api_mock_tests.rs` exercises its own outbound integrations.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use recon_client::HttpDacApiClient;
use recon_core::{run_reconciliation, ApplicationStore, ApprovedApplication, ReconcileError, ReconcilerConfig};
use recon_crypto::VerifyingKey;
use recon_core::RateLimiter;
use recon_core::TokenManager;
use secrecy::Secret;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_PRIVATE_KEY: &str = include_str!("../crates/recon-crypto/test_keys/private_key.pem");
const TEST_PUBLIC_KEY: &str = include_str!("../crates/recon-crypto/test_keys/public_key.pem");

struct FixedStore(Vec<ApprovedApplication>);

#[async_trait]
impl ApplicationStore for FixedStore {
    async fn list_approved_applications(&self) -> Result<Vec<ApprovedApplication>, ReconcileError> {
        Ok(self.0.clone())
    }
}

fn approved_application(app_id: &str, applicant_email: &str) -> ApprovedApplication {
    ApprovedApplication {
        app_id: app_id.to_string(),
        expiry: Utc::now() + chrono::Duration::days(365),
        applicant_email: applicant_email.to_string(),
        collaborator_emails: vec![],
    }
}

#[derive(serde::Serialize)]
struct Claims {
    exp: i64,
}

fn sign_access_token() -> String {
    let encoding_key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).unwrap();
    let claims = Claims {
        exp: Utc::now().timestamp() + 3600,
    };
    encode(&Header::new(Algorithm::RS256), &claims, &encoding_key).unwrap()
}

async fn mount_token_endpoint(identity: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/realms/dac/protocol/openid-connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": sign_access_token(),
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
        })))
        .mount(identity)
        .await;
}

fn client_for(identity: &MockServer, api: &MockServer) -> HttpDacApiClient {
    let verifying_key = VerifyingKey::from_pem(Secret::new(TEST_PUBLIC_KEY.to_string())).unwrap();
    let token_manager = Arc::new(TokenManager::new(
        reqwest::Client::new(),
        &identity.uri(),
        "dac",
        "client".to_string(),
        Secret::new("user".to_string()),
        Secret::new("pass".to_string()),
        verifying_key,
    ));
    let rate_limiter = Arc::new(RateLimiter::new(1000, 1));
    HttpDacApiClient::new(reqwest::Client::new(), api.uri(), token_manager, rate_limiter)
}

fn config() -> ReconcilerConfig {
    ReconcilerConfig {
        dac_id: "EGAC00000000001".to_string(),
        grantor_comment: "granted by test DAC".to_string(),
        max_batch_size: 2000,
        page_limit: 50,
        page_offset: 0,
    }
}

/// Scenario 1 — steady state: both users already hold every permission,
/// so the run creates and revokes nothing and both passes report SUCCESS.
#[tokio::test]
async fn steady_state_reports_success_with_no_mutations() {
    let identity = MockServer::start().await;
    let api = MockServer::start().await;
    mount_token_endpoint(&identity).await;

    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "accession_id": "EGAD00000000001", "title": "one" },
            { "accession_id": "EGAD00000000002", "title": "two" },
        ])))
        .mount(&api)
        .await;

    for (email, id) in [("alice@x.org", 1), ("bob@x.org", 2)] {
        Mock::given(method("GET"))
            .and(path(format!("/users/{email}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": id, "username": email.split('@').next().unwrap(), "email": email,
                "accession_id": format!("EGAW{:011}", id),
            })))
            .mount(&api)
            .await;

        Mock::given(method("GET"))
            .and(path("/permissions"))
            .and(query_param("user_id", id.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "permission_id": id * 10 + 1, "username": email.split('@').next().unwrap(), "user_accession_id": format!("EGAW{:011}", id), "dataset_accession_id": "EGAD00000000001", "dac_accession_id": "EGAC00000000001" },
                { "permission_id": id * 10 + 2, "username": email.split('@').next().unwrap(), "user_accession_id": format!("EGAW{:011}", id), "dataset_accession_id": "EGAD00000000002", "dac_accession_id": "EGAC00000000001" },
            ])))
            .mount(&api)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/permissions"))
        .and(query_param("dataset_accession_id", "EGAD00000000001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "permission_id": 11, "username": "alice", "user_accession_id": "EGAW00000000001", "dataset_accession_id": "EGAD00000000001", "dac_accession_id": "EGAC00000000001" },
            { "permission_id": 21, "username": "bob", "user_accession_id": "EGAW00000000002", "dataset_accession_id": "EGAD00000000001", "dac_accession_id": "EGAC00000000001" },
        ])))
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/permissions"))
        .and(query_param("dataset_accession_id", "EGAD00000000002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "permission_id": 12, "username": "alice", "user_accession_id": "EGAW00000000001", "dataset_accession_id": "EGAD00000000002", "dac_accession_id": "EGAC00000000001" },
            { "permission_id": 22, "username": "bob", "user_accession_id": "EGAW00000000002", "dataset_accession_id": "EGAD00000000002", "dac_accession_id": "EGAC00000000001" },
        ])))
        .mount(&api)
        .await;

    let client = client_for(&identity, &api);
    let store = FixedStore(vec![
        approved_application("app-1", "alice@x.org"),
        approved_application("app-2", "bob@x.org"),
    ]);
    let cancel = CancellationToken::new();

    let report = run_reconciliation(&client, &store, config(), &cancel).await;

    assert!(report.success);
    assert_eq!(report.details.permissions_created.permissions_granted_count, 0);
    assert_eq!(report.details.permissions_revoked.permissions_revoked_count, 0);
}

/// Scenario 4 — an approved user ("ghost") that the platform has no
/// account for (404 on `GET /users/ghost@x.org`) is omitted from
/// `ResolvedMap` entirely: no permission is created or revoked for them,
/// and `approvedDacoUsersCount`/`approvedEgaUsersCount` diverge (2 vs 1)
/// because the former counts the local approved list and the latter counts
/// only users who actually resolved.
#[tokio::test]
async fn unresolvable_user_is_omitted_and_counts_diverge() {
    let identity = MockServer::start().await;
    let api = MockServer::start().await;
    mount_token_endpoint(&identity).await;

    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "accession_id": "EGAD00000000001", "title": "one" },
        ])))
        .mount(&api)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/alice@x.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1, "username": "alice", "email": "alice@x.org", "accession_id": "EGAW00000000001",
        })))
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/ghost@x.org"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&api)
        .await;

    Mock::given(method("GET"))
        .and(path("/permissions"))
        .and(query_param("user_id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "request_id": 101, "username": "alice", "dataset_accession_id": "EGAD00000000001" },
        ])))
        .mount(&api)
        .await;
    Mock::given(method("PUT"))
        .and(path("/requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "num_granted": 1 })))
        .mount(&api)
        .await;

    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/permissions"))
        .and(query_param("dataset_accession_id", "EGAD00000000001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&api)
        .await;

    let client = client_for(&identity, &api);
    let store = FixedStore(vec![
        approved_application("app-1", "alice@x.org"),
        approved_application("app-2", "ghost@x.org"),
    ]);
    let cancel = CancellationToken::new();

    let report = run_reconciliation(&client, &store, config(), &cancel).await;

    assert!(report.success);
    assert_eq!(report.details.permissions_created.approved_daco_users_count, 2);
    assert_eq!(report.details.permissions_created.approved_ega_users_count, 1);
    assert_eq!(report.details.permissions_created.permissions_granted_count, 1);
    assert_eq!(report.details.permissions_revoked.permissions_revoked_count, 0);
}

/// Spec §8 boundary behavior: a dataset-permissions page whose size equals
/// `limit` forces one more page fetch; a page smaller than `limit`
/// terminates pagination. Exercised here with `page_limit=2` over 3 stale
/// permissions split across two pages.
#[tokio::test]
async fn a_full_permissions_page_forces_a_second_page_fetch() {
    let identity = MockServer::start().await;
    let api = MockServer::start().await;
    mount_token_endpoint(&identity).await;

    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "accession_id": "EGAD00000000001", "title": "one" },
        ])))
        .mount(&api)
        .await;

    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/permissions"))
        .and(query_param("dataset_accession_id", "EGAD00000000001"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "permission_id": 1, "username": "stale-1", "user_accession_id": "EGAW00000000001", "dataset_accession_id": "EGAD00000000001", "dac_accession_id": "EGAC00000000001" },
            { "permission_id": 2, "username": "stale-2", "user_accession_id": "EGAW00000000002", "dataset_accession_id": "EGAD00000000001", "dac_accession_id": "EGAC00000000001" },
        ])))
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/permissions"))
        .and(query_param("dataset_accession_id", "EGAD00000000001"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "permission_id": 3, "username": "stale-3", "user_accession_id": "EGAW00000000003", "dataset_accession_id": "EGAD00000000001", "dac_accession_id": "EGAC00000000001" },
        ])))
        .mount(&api)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/permissions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "num_revoked": 3 })))
        .mount(&api)
        .await;

    let client = client_for(&identity, &api);
    let store = FixedStore(vec![]);
    let cancel = CancellationToken::new();
    let mut cfg = config();
    cfg.page_limit = 2;

    let report = run_reconciliation(&client, &store, cfg, &cancel).await;

    assert!(report.success);
    assert_eq!(report.details.permissions_revoked.permissions_revoked_count, 3);
    assert_eq!(
        report.details.permissions_revoked.status,
        Some(recon_core::CompletionStatus::Success)
    );

    let api_requests = api.received_requests().await.unwrap();
    let permission_page_requests = api_requests
        .iter()
        .filter(|r| r.url.path() == "/dacs/EGAC00000000001/permissions")
        .count();
    assert_eq!(permission_page_requests, 2, "a full first page must force a second fetch");
}

/// Scenario 5 — the dataset enumeration call fails entirely; the run must
/// abort before any mutation endpoint is touched and report `success=false`
/// with both per-phase detail objects left at their zero default.
#[tokio::test]
async fn datasets_fetch_failure_aborts_before_any_mutation() {
    let identity = MockServer::start().await;
    let api = MockServer::start().await;
    mount_token_endpoint(&identity).await;

    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/datasets"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&api)
        .await;

    // No other mock is mounted — any call to /users, /requests, or
    // /permissions would be an unmatched request and wiremock would answer
    // it with a default error response instead of the handlers below, which
    // is exactly the proof the run never gets past dataset enumeration.
    let client = client_for(&identity, &api);
    let store = FixedStore(vec![approved_application("app-1", "alice@x.org")]);
    let cancel = CancellationToken::new();

    let report = run_reconciliation(&client, &store, config(), &cancel).await;

    assert!(!report.success);
    assert!(report.error.is_some());
    assert_eq!(report.details.permissions_created.users_processed, 0);
    assert_eq!(report.details.permissions_revoked.datasets_processed, 0);
}

/// Scenario 6 — a single 401 mid-run triggers exactly one transparent
/// token refresh and retry; the observable counters match the steady-state
/// scenario once the retried call succeeds.
#[tokio::test]
async fn a_401_mid_run_triggers_one_refresh_and_retry() {
    let identity = MockServer::start().await;
    let api = MockServer::start().await;
    mount_token_endpoint(&identity).await;

    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/datasets"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/dacs/EGAC00000000001/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .with_priority(2)
        .mount(&api)
        .await;

    let client = client_for(&identity, &api);
    let store = FixedStore(vec![]);
    let cancel = CancellationToken::new();

    let report = run_reconciliation(&client, &store, config(), &cancel).await;

    assert!(report.success);

    let token_requests = identity.received_requests().await.unwrap();
    let posts_to_token_endpoint = token_requests
        .iter()
        .filter(|r| r.url.path().ends_with("/protocol/openid-connect/token"))
        .count();
    assert_eq!(posts_to_token_endpoint, 2, "initial fetch plus exactly one refresh after the 401");
}
