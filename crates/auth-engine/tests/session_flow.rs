//! Sign-in, refresh and logout against a scripted backend.

mod common;

use auth_engine::{AuthError, LoginCredentials, RefreshOutcome, SessionState};
use backend_test_harness::{MockBackend, MockResponse};
use common::{session_for, MockWallet};
use serde_json::json;

fn script_login(backend: &MockBackend) {
    backend.on(
        "POST",
        "/auth/prepare",
        MockResponse::ok(json!({ "data": [1, 2, 3], "signer": "cosmos1abc" })),
    );
    backend.on(
        "POST",
        "/auth",
        MockResponse::ok(json!({
            "access_token": "AT1",
            "refresh_token": "RT1",
            "success": true
        })),
    );
}

#[tokio::test]
async fn test_sign_in_with_wallet() {
    let backend = MockBackend::start().await;
    script_login(&backend);
    let session = session_for(&backend);
    let wallet = MockWallet::connected();

    let pair = session.sign_in_with_wallet(&wallet).await.unwrap();

    assert_eq!(pair.access_token, "AT1");
    assert_eq!(session.get_access_token().unwrap().as_deref(), Some("AT1"));
    assert_eq!(
        session.store().get_refresh_token().unwrap().as_deref(),
        Some("RT1")
    );
    assert_eq!(session.fsm_state(), SessionState::Authenticated);

    let prepare = &backend.requests_to("/auth/prepare")[0];
    assert_eq!(
        prepare.json(),
        json!({ "signer": "cosmos1abc", "public_key": "AgE2" })
    );

    // The wallet signs the base64 of the challenge bytes, which is sent back as-is
    assert_eq!(
        wallet.signed(),
        vec![("cosmos1abc".to_string(), "AQID".to_string())]
    );
    let auth = &backend.requests_to("/auth")[0];
    assert_eq!(
        auth.json(),
        json!({
            "signer": "cosmos1abc",
            "public_key": "AgE2",
            "signature": "0xdead",
            "data": "AQID"
        })
    );
}

#[tokio::test]
async fn test_login_rejected_persists_nothing() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/auth", MockResponse::text(401, "bad signature"));
    let session = session_for(&backend);

    let credentials = LoginCredentials {
        signer: "cosmos1abc".to_string(),
        public_key: "AgE2".to_string(),
        signature: "0xdead".to_string(),
        data: "AQID".to_string(),
    };
    let result = session.login(&credentials).await;

    assert!(matches!(result, Err(AuthError::AuthenticationFailed(_))));
    assert!(!session.store().has_session().unwrap());
    assert_eq!(session.fsm_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_login_success_false_is_failure() {
    let backend = MockBackend::start().await;
    backend.on(
        "POST",
        "/auth",
        MockResponse::ok(json!({ "success": false, "message": "challenge expired" })),
    );
    let session = session_for(&backend);

    let credentials = LoginCredentials {
        signer: "cosmos1abc".to_string(),
        public_key: "AgE2".to_string(),
        signature: "0xdead".to_string(),
        data: "AQID".to_string(),
    };
    match session.login(&credentials).await {
        Err(AuthError::AuthenticationFailed(message)) => {
            assert_eq!(message, "challenge expired")
        }
        other => panic!("expected AuthenticationFailed, got {:?}", other),
    }
    assert!(!session.store().has_session().unwrap());
}

#[tokio::test]
async fn test_disconnected_wallet_makes_no_requests() {
    let backend = MockBackend::start().await;
    script_login(&backend);
    let session = session_for(&backend);

    let result = session
        .sign_in_with_wallet(&MockWallet::disconnected())
        .await;

    assert!(matches!(result, Err(AuthError::WalletNotConnected(_))));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_rejected_signature_skips_login() {
    let backend = MockBackend::start().await;
    script_login(&backend);
    let session = session_for(&backend);

    let result = session.sign_in_with_wallet(&MockWallet::rejecting()).await;

    assert!(matches!(result, Err(AuthError::SignatureRejected(_))));
    assert_eq!(backend.count("/auth/prepare"), 1);
    assert_eq!(backend.count("/auth"), 0);
    assert!(!session.store().has_session().unwrap());
}

#[tokio::test]
async fn test_refresh_without_token_makes_no_request() {
    let backend = MockBackend::start().await;
    let session = session_for(&backend);

    assert!(!session.refresh().await);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let backend = MockBackend::start().await;
    backend.on(
        "POST",
        "/auth/refresh",
        MockResponse::ok(json!({ "access_token": "AT2", "refresh_token": "RT2" })),
    );
    let session = session_for(&backend);
    session.store().set_tokens("AT1", "RT1").unwrap();

    assert!(session.refresh().await);

    assert_eq!(backend.requests_to("/auth/refresh")[0].bearer(), Some("RT1"));
    assert_eq!(session.get_access_token().unwrap().as_deref(), Some("AT2"));
    assert_eq!(
        session.store().get_refresh_token().unwrap().as_deref(),
        Some("RT2")
    );
}

#[tokio::test]
async fn test_refresh_unauthorized_clears_session() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/auth/refresh", MockResponse::status(401));
    let session = session_for(&backend);
    session.store().set_tokens("AT1", "RT1").unwrap();
    session.restore().unwrap();

    assert_eq!(session.refresh_outcome().await, RefreshOutcome::Rejected);

    assert_eq!(session.get_access_token().unwrap(), None);
    assert_eq!(session.store().get_refresh_token().unwrap(), None);
    assert_eq!(session.fsm_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_refresh_server_error_keeps_session() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/auth/refresh", MockResponse::status(500));
    let session = session_for(&backend);
    session.store().set_tokens("AT1", "RT1").unwrap();
    session.restore().unwrap();

    assert_eq!(session.refresh_outcome().await, RefreshOutcome::Failed);

    assert_eq!(session.get_access_token().unwrap().as_deref(), Some("AT1"));
    assert_eq!(
        session.store().get_refresh_token().unwrap().as_deref(),
        Some("RT1")
    );
    assert_eq!(session.fsm_state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_refresh_malformed_body_keeps_session() {
    let backend = MockBackend::start().await;
    backend.on(
        "POST",
        "/auth/refresh",
        MockResponse::ok(json!({ "unexpected": true })),
    );
    let session = session_for(&backend);
    session.store().set_tokens("AT1", "RT1").unwrap();

    assert!(!session.refresh().await);
    assert_eq!(session.get_access_token().unwrap().as_deref(), Some("AT1"));
}

#[tokio::test]
async fn test_logout_notifies_backend() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/auth/logout", MockResponse::ok(json!({})));
    let session = session_for(&backend);
    session.store().set_tokens("AT1", "RT1").unwrap();
    session.restore().unwrap();

    session.logout().await.unwrap();

    assert!(!session.store().has_session().unwrap());
    assert_eq!(backend.requests_to("/auth/logout")[0].bearer(), Some("AT1"));
    assert_eq!(session.fsm_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_logout_ignores_backend_failure() {
    let backend = MockBackend::start().await;
    backend.on("POST", "/auth/logout", MockResponse::status(500));
    let session = session_for(&backend);
    session.store().set_tokens("AT1", "RT1").unwrap();

    session.logout().await.unwrap();

    assert!(!session.store().has_session().unwrap());
}
