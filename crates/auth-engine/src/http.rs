//! Authorized HTTP client.
//!
//! Attaches the access token to every request. On a 401 the request is
//! retried exactly once: with the token another caller already rotated in,
//! or after a (single-flight) refresh. A second 401 ends the session.

use crate::config::endpoint_url;
use crate::session::{RefreshOutcome, SessionManager};
use crate::{AuthError, AuthResult};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Network call class; selects the request timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Auth,
    Proof,
    Search,
}

/// HTTP client for endpoints that need a session.
#[derive(Clone)]
pub struct AuthorizedClient {
    session: SessionManager,
}

impl AuthorizedClient {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    fn timeout(&self, class: RequestClass) -> Duration {
        let timeouts = self.session.backend().timeouts();
        match class {
            RequestClass::Auth => timeouts.auth,
            RequestClass::Proof => timeouts.proof,
            RequestClass::Search => timeouts.search,
        }
    }

    pub async fn get<T>(&self, path: &str, class: RequestClass) -> AuthResult<T>
    where
        T: DeserializeOwned,
    {
        self.request::<T, ()>(Method::GET, path, None, class).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, class: RequestClass) -> AuthResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body), class).await
    }

    /// POST without a request body.
    pub async fn post_empty<T>(&self, path: &str, class: RequestClass) -> AuthResult<T>
    where
        T: DeserializeOwned,
    {
        self.request::<T, ()>(Method::POST, path, None, class).await
    }

    /// Send a request with the current access token and decode the JSON body.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        class: RequestClass,
    ) -> AuthResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = endpoint_url(self.session.backend().base_url(), path)?;
        let timeout = self.timeout(class);
        let mut token = self.session.get_access_token()?;
        let mut retried = false;

        loop {
            let mut builder = self
                .session
                .backend()
                .http()
                .request(method.clone(), url.clone())
                .timeout(timeout);
            if let Some(token) = token.as_deref() {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(AuthError::from_transport)?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if retried {
                    warn!(path = %path, "Request rejected after token refresh, ending session");
                    self.session.expire()?;
                    return Err(AuthError::SessionExpired);
                }
                retried = true;

                let current = self.session.get_access_token()?;
                if current.is_some() && current != token {
                    debug!(path = %path, "Access token rotated meanwhile, retrying");
                    token = current;
                    continue;
                }

                debug!(path = %path, "Access token rejected, refreshing");
                match self.session.refresh_outcome().await {
                    RefreshOutcome::Refreshed => {}
                    RefreshOutcome::Rejected | RefreshOutcome::NoRefreshToken => {
                        return Err(AuthError::SessionExpired);
                    }
                    RefreshOutcome::Failed => {
                        warn!(path = %path, "Token refresh failed, session kept for a later retry");
                        return Err(AuthError::RefreshFailed {
                            reason: "token refresh did not complete".to_string(),
                            relogin_required: false,
                        });
                    }
                }
                token = self.session.get_access_token()?;
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                debug!(path = %path, status = %status, "Request failed");
                return Err(AuthError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return response.json::<T>().await.map_err(AuthError::from_transport);
        }
    }
}
