//! Directory lookups against a scripted backend.

use auth_engine::{AuthError, AuthorizedClient, BackendClient, ClientConfig, SessionManager};
use backend_test_harness::{MockBackend, MockResponse};
use identity_directory::{DirectoryClient, DirectoryError};
use proof_sequencer::ProviderRegistry;
use serde_json::json;
use session_storage::{MemoryStorage, TokenExpiryPolicy, TokenStore};

fn directory(backend: &MockBackend) -> DirectoryClient {
    let config = ClientConfig::new(&backend.url()).unwrap();
    let store = TokenStore::new(Box::new(MemoryStorage::new()), TokenExpiryPolicy::default());
    store.set_tokens("AT1", "RT1").unwrap();
    let session = SessionManager::new(store, BackendClient::new(&config));
    DirectoryClient::new(AuthorizedClient::new(session), ProviderRegistry::builtin())
}

#[tokio::test]
async fn test_fetch_me() {
    let backend = MockBackend::start().await;
    backend.on(
        "GET",
        "/me",
        MockResponse::ok(json!({
            "id": "cosmos1abc",
            "identity_records": [{
                "proof_identifier": "0xp1",
                "provider_id": "6d3f6753-7ee6-49ee-a545-62f1b1822ae5",
                "claim_data_params": "{\"login\":\"octocat\"}",
                "public_data": null,
                "created_at": 1700000000
            }]
        })),
    );
    let directory = directory(&backend);

    let profile = directory.fetch_me().await.unwrap();

    assert_eq!(profile.id, "cosmos1abc");
    let (provider, record) = profile.known_records(directory.registry()).next().unwrap();
    assert_eq!(provider.id, "github");
    assert_eq!(record.display(directory.registry()).display_value, "octocat");
    assert_eq!(backend.requests_to("/me")[0].bearer(), Some("AT1"));
}

#[tokio::test]
async fn test_search_by_address() {
    let backend = MockBackend::start().await;
    backend.on(
        "GET",
        "/user/cosmos1xyz",
        MockResponse::ok(json!({ "id": "cosmos1xyz", "identity_records": [] })),
    );
    let directory = directory(&backend);

    let profile = directory.search(" cosmos1xyz ").await.unwrap().unwrap();

    assert_eq!(profile.id, "cosmos1xyz");
    assert!(profile.identity_records.is_empty());
}

#[tokio::test]
async fn test_search_unknown_address() {
    let backend = MockBackend::start().await;
    backend.on("GET", "/user/cosmos1nobody", MockResponse::status(404));
    let directory = directory(&backend);

    assert!(directory.search("cosmos1nobody").await.unwrap().is_none());
    assert!(matches!(
        directory.fetch_user_by_address("cosmos1nobody").await,
        Err(DirectoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_empty_query_makes_no_request() {
    let backend = MockBackend::start().await;
    let directory = directory(&backend);

    assert!(matches!(
        directory.search("  ").await,
        Err(DirectoryError::InvalidAddress(_))
    ));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_server_error_propagates() {
    let backend = MockBackend::start().await;
    backend.on("GET", "/user/cosmos1xyz", MockResponse::status(500));
    let directory = directory(&backend);

    assert!(matches!(
        directory.search("cosmos1xyz").await,
        Err(DirectoryError::Auth(AuthError::Api { status: 500, .. }))
    ));
}

#[tokio::test]
async fn test_proof_stats() {
    let backend = MockBackend::start().await;
    backend.on(
        "POST",
        "/proof-stats",
        MockResponse::ok(json!({
            "stats": [
                ["6d3f6753-7ee6-49ee-a545-62f1b1822ae5", 4],
                ["e6fe962d-8b4e-4ce5-abcc-3d21c88bd64a", 1]
            ]
        })),
    );
    let directory = directory(&backend);

    let stats = directory.proof_stats().await.unwrap();

    assert_eq!(stats.total(), 5);
    assert_eq!(stats.count_for("6d3f6753-7ee6-49ee-a545-62f1b1822ae5"), 4);

    let request = &backend.requests_to("/proof-stats")[0];
    assert_eq!(request.method, "POST");
    assert!(request.body.is_empty());
}
