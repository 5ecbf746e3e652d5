#![allow(dead_code)]

use async_trait::async_trait;
use auth_engine::{
    AuthError, AuthResult, BackendClient, ClientConfig, SessionManager, SignedMessage,
    WalletAccount, WalletSigner, WalletStatus,
};
use backend_test_harness::MockBackend;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use session_storage::{MemoryStorage, TokenExpiryPolicy, TokenStore};
use std::sync::Mutex;

pub fn session_for(backend: &MockBackend) -> SessionManager {
    let config = ClientConfig::new(&backend.url()).unwrap();
    let store = TokenStore::new(Box::new(MemoryStorage::new()), TokenExpiryPolicy::default());
    SessionManager::new(store, BackendClient::new(&config))
}

/// JWT-shaped token with the given subject and expiry; the signature is fake.
pub fn jwt(sub: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({ "sub": sub, "exp": exp, "token_type": "Access" }).to_string(),
    );
    format!("{}.{}.sig", header, payload)
}

/// Wallet double recording every sign request.
pub struct MockWallet {
    pub status: WalletStatus,
    pub account: WalletAccount,
    pub signature: Option<String>,
    pub signed: Mutex<Vec<(String, String)>>,
}

impl MockWallet {
    pub fn connected() -> Self {
        Self {
            status: WalletStatus::Connected,
            account: WalletAccount {
                address: "cosmos1abc".to_string(),
                public_key: "AgE2".to_string(),
            },
            signature: Some("0xdead".to_string()),
            signed: Mutex::new(Vec::new()),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            status: WalletStatus::Disconnected,
            ..Self::connected()
        }
    }

    pub fn rejecting() -> Self {
        Self {
            signature: None,
            ..Self::connected()
        }
    }

    pub fn signed(&self) -> Vec<(String, String)> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    fn status(&self) -> WalletStatus {
        self.status
    }

    fn account(&self) -> Option<WalletAccount> {
        Some(self.account.clone())
    }

    async fn sign_arbitrary(&self, signer: &str, data: &str) -> AuthResult<SignedMessage> {
        self.signed
            .lock()
            .unwrap()
            .push((signer.to_string(), data.to_string()));
        match &self.signature {
            Some(signature) => Ok(SignedMessage {
                public_key: self.account.public_key.clone(),
                signature: signature.clone(),
            }),
            None => Err(AuthError::SignatureRejected("user declined".to_string())),
        }
    }
}
