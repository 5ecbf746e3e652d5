//! Session management with single-flight token refresh.
//!
//! Tokens are persisted in a [`TokenStore`]; the FSM tracks transient states
//! (logging in, refreshing) that are never persisted. On startup the FSM is
//! derived from storage with [`SessionManager::restore`].

use crate::api::{AuthChallenge, BackendClient, LoginCredentials, TokenPair};
use crate::auth_fsm::{
    SessionMachine, SessionMachineInput, SessionState, SessionStateChangedPayload,
};
use crate::claims::TokenClaims;
use crate::{AuthError, AuthResult};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use session_storage::TokenStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Callback type for session state change notifications.
pub type SessionStateCallback = Box<dyn Fn(SessionStateChangedPayload) + Send + Sync>;

type InFlightRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Result of a refresh attempt, shared by every caller that joined it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New token pair persisted.
    Refreshed,
    /// Nothing to refresh with; no request was made.
    NoRefreshToken,
    /// Backend rejected the refresh token; the session was cleared.
    Rejected,
    /// Network, server or storage failure; stored tokens were left as-is.
    Failed,
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed)
    }

    /// True when the user has to sign in again.
    pub fn requires_relogin(&self) -> bool {
        matches!(self, RefreshOutcome::Rejected | RefreshOutcome::NoRefreshToken)
    }
}

struct Inner {
    store: TokenStore,
    backend: BackendClient,
    fsm: Mutex<SessionMachine>,
    state_callback: Mutex<Option<SessionStateCallback>>,
    in_flight: Mutex<Option<InFlightRefresh>>,
}

/// Session manager for one client context.
///
/// Cheap to clone; clones share the same store, FSM and in-flight refresh.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(store: TokenStore, backend: BackendClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                backend,
                fsm: Mutex::new(SessionMachine::new()),
                state_callback: Mutex::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Set a callback to be notified of session state changes.
    pub fn set_state_callback(&self, callback: SessionStateCallback) {
        *self.inner.state_callback.lock() = Some(callback);
    }

    /// Get the current FSM state.
    pub fn fsm_state(&self) -> SessionState {
        SessionState::from(self.inner.fsm.lock().state())
    }

    /// Transition the FSM and notify the callback if the state changed.
    fn transition(&self, input: &SessionMachineInput) -> AuthResult<SessionState> {
        let mut fsm = self.inner.fsm.lock();
        let old_state = SessionState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = SessionState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Session state transition"
            );
            self.notify_state_change(new_state);
        }

        Ok(new_state)
    }

    /// Transition where a concurrent operation may already have moved the FSM.
    fn advance(&self, input: SessionMachineInput) {
        if let Err(e) = self.transition(&input) {
            debug!(error = %e, "Skipped session state transition");
        }
    }

    fn notify_state_change(&self, state: SessionState) {
        let cb = self.inner.state_callback.lock();
        if let Some(callback) = cb.as_ref() {
            callback(SessionStateChangedPayload {
                state,
                signer: self.signer().ok().flatten(),
            });
        }
    }

    /// Derive the FSM state from persisted tokens.
    pub fn restore(&self) -> AuthResult<SessionState> {
        if self.inner.store.has_session()? {
            info!(signer = ?self.signer().ok().flatten(), "Restored persisted session");
            return self.transition(&SessionMachineInput::SessionRestored);
        }
        debug!("No persisted session");
        Ok(self.fsm_state())
    }

    /// Request a login challenge for `signer`.
    pub async fn prepare_challenge(
        &self,
        signer: &str,
        public_key: &str,
    ) -> AuthResult<AuthChallenge> {
        self.inner.backend.prepare_auth(signer, public_key).await
    }

    /// Exchange signed credentials for tokens.
    ///
    /// Tokens are persisted only when the backend accepts the credentials.
    pub async fn login(&self, credentials: &LoginCredentials) -> AuthResult<TokenPair> {
        self.advance(SessionMachineInput::LoginAttempt);

        let pair = match self.inner.backend.authenticate(credentials).await {
            Ok(pair) => pair,
            Err(e) => {
                self.login_failed();
                return Err(e);
            }
        };

        if let Err(e) = self
            .inner
            .store
            .set_tokens(&pair.access_token, &pair.refresh_token)
        {
            self.login_failed();
            return Err(e.into());
        }

        self.advance(SessionMachineInput::LoginSuccess);
        info!(signer = %credentials.signer, "Session established");
        Ok(pair)
    }

    fn login_failed(&self) {
        self.advance(SessionMachineInput::LoginFailed);
        // A failed re-login keeps the previous session
        if matches!(self.inner.store.has_session(), Ok(true)) {
            self.advance(SessionMachineInput::SessionRestored);
        }
    }

    /// Current access token. Storage read only.
    pub fn get_access_token(&self) -> AuthResult<Option<String>> {
        Ok(self.inner.store.get_access_token()?)
    }

    /// Claims of the stored access token, if any.
    pub fn access_token_claims(&self) -> AuthResult<Option<TokenClaims>> {
        match self.inner.store.get_access_token()? {
            Some(token) => TokenClaims::decode(&token).map(Some),
            None => Ok(None),
        }
    }

    /// Signer address the session was issued for.
    pub fn signer(&self) -> AuthResult<Option<String>> {
        Ok(self.access_token_claims()?.map(|claims| claims.sub))
    }

    /// Refresh the token pair. Returns true when new tokens were persisted.
    pub async fn refresh(&self) -> bool {
        self.refresh_outcome().await.is_refreshed()
    }

    /// Refresh the token pair, joining the in-flight refresh if there is one.
    pub async fn refresh_outcome(&self) -> RefreshOutcome {
        let shared = {
            let mut slot = self.inner.in_flight.lock();
            match slot.as_ref() {
                Some(existing) => {
                    debug!("Joining in-flight token refresh");
                    existing.clone()
                }
                None => {
                    let manager = self.clone();
                    let refresh = async move {
                        let outcome = manager.run_refresh().await;
                        manager.inner.in_flight.lock().take();
                        outcome
                    }
                    .boxed()
                    .shared();
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };
        shared.await
    }

    async fn run_refresh(&self) -> RefreshOutcome {
        let refresh_token = match self.inner.store.get_refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No refresh token stored, skipping refresh");
                return RefreshOutcome::NoRefreshToken;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read refresh token");
                return RefreshOutcome::Failed;
            }
        };

        self.advance(SessionMachineInput::RefreshStarted);

        match self.inner.backend.refresh(&refresh_token).await {
            Ok(pair) => {
                if let Err(e) = self
                    .inner
                    .store
                    .set_tokens(&pair.access_token, &pair.refresh_token)
                {
                    warn!(error = %e, "Failed to persist refreshed tokens");
                    self.advance(SessionMachineInput::RefreshDeferred);
                    return RefreshOutcome::Failed;
                }
                info!("Token refresh successful");
                self.advance(SessionMachineInput::RefreshSuccess);
                RefreshOutcome::Refreshed
            }
            Err(AuthError::RefreshFailed {
                relogin_required: true,
                reason,
            }) => {
                warn!(reason = %reason, "Refresh token rejected, clearing session");
                if let Err(e) = self.inner.store.clear_tokens() {
                    warn!(error = %e, "Failed to clear rejected session");
                }
                self.advance(SessionMachineInput::RefreshRejected);
                RefreshOutcome::Rejected
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, keeping session");
                self.advance(SessionMachineInput::RefreshDeferred);
                RefreshOutcome::Failed
            }
        }
    }

    /// End a session the backend no longer accepts.
    pub fn expire(&self) -> AuthResult<()> {
        self.inner.store.clear_tokens()?;
        self.advance(SessionMachineInput::SessionRevoked);
        info!("Session expired");
        Ok(())
    }

    /// Clear the local session, then notify the backend best-effort.
    pub async fn logout(&self) -> AuthResult<()> {
        let access_token = self.inner.store.get_access_token().ok().flatten();

        self.inner.store.clear_tokens()?;
        self.advance(SessionMachineInput::LogoutRequested);
        info!("Logged out");

        if let Some(token) = access_token {
            if let Err(e) = self.inner.backend.logout(&token).await {
                debug!(error = %e, "Backend logout failed, local session already cleared");
            }
        }
        Ok(())
    }
}
