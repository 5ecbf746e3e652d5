//! Backend auth endpoints.

use crate::config::{endpoint_url, ClientConfig, RequestTimeouts};
use crate::{AuthError, AuthResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

/// Encode challenge bytes the way the wallet is asked to sign them.
///
/// The same string is sent back as `data` so the backend can compare it with
/// what it issued.
pub fn encode_sign_data(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Challenge issued by `/auth/prepare`. One per login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub signer: String,
    pub public_key: String,
    pub data: Vec<u8>,
}

impl AuthChallenge {
    /// Base64 payload handed to the wallet.
    pub fn sign_data(&self) -> String {
        encode_sign_data(&self.data)
    }
}

/// Signed challenge posted to `/auth`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginCredentials {
    pub signer: String,
    pub public_key: String,
    pub signature: String,
    /// Base64 encoded challenge bytes
    pub data: String,
}

impl LoginCredentials {
    pub fn from_challenge(challenge: &AuthChallenge, signature: impl Into<String>) -> Self {
        Self {
            signer: challenge.signer.clone(),
            public_key: challenge.public_key.clone(),
            signature: signature.into(),
            data: challenge.sign_data(),
        }
    }
}

/// Access and refresh token issued together.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(alias = "refreshToken")]
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct PrepareRequest<'a> {
    signer: &'a str,
    public_key: &'a str,
}

/// Response of the prepare endpoints: raw bytes to sign.
#[derive(Debug, Deserialize)]
pub(crate) struct PrepareResponse {
    pub data: Vec<u8>,
    #[serde(default)]
    pub signer: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the unauthenticated auth endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    timeouts: RequestTimeouts,
}

impl BackendClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Use an existing reqwest client so connections are pooled.
    pub fn with_client(http: Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.api_url.clone(),
            timeouts: config.timeouts.clone(),
        }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeouts(&self) -> &RequestTimeouts {
        &self.timeouts
    }

    pub(crate) fn url(&self, path: &str) -> AuthResult<Url> {
        endpoint_url(&self.base_url, path)
    }

    /// Request a login challenge for `signer`.
    pub async fn prepare_auth(&self, signer: &str, public_key: &str) -> AuthResult<AuthChallenge> {
        let response = self
            .http
            .post(self.url("/auth/prepare")?)
            .timeout(self.timeouts.auth)
            .json(&PrepareRequest { signer, public_key })
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, "Auth challenge request failed");
            return Err(AuthError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: PrepareResponse = response.json().await.map_err(AuthError::from_transport)?;
        debug!(signer = %signer, bytes = body.data.len(), "Received auth challenge");

        Ok(AuthChallenge {
            signer: body.signer.unwrap_or_else(|| signer.to_string()),
            public_key: public_key.to_string(),
            data: body.data,
        })
    }

    /// Exchange a signed challenge for a token pair.
    pub async fn authenticate(&self, credentials: &LoginCredentials) -> AuthResult<TokenPair> {
        let response = self
            .http
            .post(self.url("/auth")?)
            .timeout(self.timeouts.auth)
            .json(credentials)
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, signer = %credentials.signer, "Login rejected");
            return Err(AuthError::AuthenticationFailed(if message.is_empty() {
                format!("HTTP {}", status)
            } else {
                message
            }));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::AuthenticationFailed(format!("Invalid response: {}", e)))?;

        if body.success == Some(false) {
            return Err(AuthError::AuthenticationFailed(
                body.message
                    .unwrap_or_else(|| "Authentication failed".to_string()),
            ));
        }

        match (body.access_token, body.refresh_token) {
            (Some(access_token), Some(refresh_token)) => {
                info!(signer = %credentials.signer, "Login accepted");
                Ok(TokenPair {
                    access_token,
                    refresh_token,
                })
            }
            _ => Err(AuthError::AuthenticationFailed(
                "Response did not contain tokens".to_string(),
            )),
        }
    }

    /// Rotate the token pair.
    ///
    /// A 401 means the refresh token is no longer valid and is reported with
    /// `relogin_required: true`; every other failure leaves that flag false.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let response = self
            .http
            .post(self.url("/auth/refresh")?)
            .timeout(self.timeouts.auth)
            .bearer_auth(refresh_token)
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed {
                reason: e.to_string(),
                relogin_required: false,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::RefreshFailed {
                reason: "Refresh token rejected".to_string(),
                relogin_required: true,
            });
        }
        if !status.is_success() {
            return Err(AuthError::RefreshFailed {
                reason: format!("HTTP {}", status),
                relogin_required: false,
            });
        }

        response
            .json::<TokenPair>()
            .await
            .map_err(|e| AuthError::RefreshFailed {
                reason: format!("Invalid refresh response: {}", e),
                relogin_required: false,
            })
    }

    /// Tell the backend the session is over. Callers ignore the result.
    pub async fn logout(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .http
            .post(self.url("/auth/logout")?)
            .timeout(self.timeouts.auth)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Api {
                status: status.as_u16(),
                message: format!("Logout returned {}", status),
            });
        }
        Ok(())
    }
}
