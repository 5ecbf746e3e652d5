//! One client context: the services a host talks to, built from a single
//! config and token store.

use crate::{ClientError, ClientResult};
use auth_engine::{
    AuthorizedClient, BackendClient, ClientConfig, Notice, RefreshMonitor, RefreshMonitorHandle,
    RefreshPolicy, SessionManager, SessionState, SessionStateCallback, WalletSigner,
};
use identity_directory::DirectoryClient;
use proof_sequencer::{
    proof_applied_notice, PendingVerification, ProofSequencer, ProviderRegistry, VerificationSdk,
};
use session_storage::{create_file_token_store, TokenStore};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AppContext {
    config: ClientConfig,
    session: SessionManager,
    client: AuthorizedClient,
    wallet: Arc<dyn WalletSigner>,
    proofs: ProofSequencer,
    directory: DirectoryClient,
    monitor: Option<RefreshMonitorHandle>,
}

impl AppContext {
    /// Build the context with the built-in provider catalog.
    ///
    /// Restores any persisted session and starts the proactive refresh
    /// check. Must be called inside a Tokio runtime.
    pub fn start(
        config: ClientConfig,
        store: TokenStore,
        wallet: Arc<dyn WalletSigner>,
        sdk: Arc<dyn VerificationSdk>,
    ) -> ClientResult<Self> {
        Self::start_with_registry(config, store, wallet, sdk, ProviderRegistry::default())
    }

    /// Build the context with the session persisted in the default session file.
    pub fn start_with_file_storage(
        config: ClientConfig,
        wallet: Arc<dyn WalletSigner>,
        sdk: Arc<dyn VerificationSdk>,
    ) -> ClientResult<Self> {
        let store = create_file_token_store(config.token_expiry.clone())?;
        Self::start(config, store, wallet, sdk)
    }

    pub fn start_with_registry(
        config: ClientConfig,
        store: TokenStore,
        wallet: Arc<dyn WalletSigner>,
        sdk: Arc<dyn VerificationSdk>,
        registry: ProviderRegistry,
    ) -> ClientResult<Self> {
        config.validate()?;

        let session = SessionManager::new(store, BackendClient::new(&config));
        let restored = session.restore()?;

        let client = AuthorizedClient::new(session.clone());
        let proofs = ProofSequencer::new(client.clone(), wallet.clone(), sdk);
        let directory = DirectoryClient::new(client.clone(), registry);
        let monitor = RefreshMonitor::start(session.clone(), RefreshPolicy::from(&config));

        info!(
            api_url = %config.api_url,
            session = ?restored,
            providers = directory.registry().len(),
            "Prism client started"
        );

        Ok(Self {
            config,
            session,
            client,
            wallet,
            proofs,
            directory,
            monitor: Some(monitor),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn client(&self) -> &AuthorizedClient {
        &self.client
    }

    pub fn proofs(&self) -> &ProofSequencer {
        &self.proofs
    }

    pub fn directory(&self) -> &DirectoryClient {
        &self.directory
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.directory.registry()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.fsm_state()
    }

    pub fn on_session_change(&self, callback: SessionStateCallback) {
        self.session.set_state_callback(callback);
    }

    /// Sign in with the host wallet and report the result as a notice.
    pub async fn sign_in(&self) -> Notice {
        match self.session.sign_in_with_wallet(self.wallet.as_ref()).await {
            Ok(_) => Notice::signed_in(),
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                Notice::sign_in_failed(&e)
            }
        }
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.session.logout().await?;
        if !self.proofs.state().is_busy() {
            let _ = self.proofs.reset();
        }
        Ok(())
    }

    /// Open a verification session for the catalog entry `provider`.
    pub async fn verify(&self, provider: &str) -> ClientResult<PendingVerification> {
        let provider = self.registry().require(provider)?.clone();
        Ok(self.proofs.initiate(&provider).await?)
    }

    /// Wait for the proof of `pending`, attach it, and report the outcome.
    ///
    /// `None` means the verification was cancelled and nothing should be shown.
    pub async fn finish_verification(&self, pending: PendingVerification) -> Option<Notice> {
        let result = self.proofs.complete(pending).await;
        // Leave Done/Error so the next attach can start
        let _ = self.proofs.reset();
        match result {
            Ok(true) => Some(proof_applied_notice()),
            Ok(false) => Some(Notice::danger("Error applying proof", "The proof was not applied")),
            Err(e) => ClientError::from(e).notice(),
        }
    }

    /// Stop the refresh check and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.shutdown().await;
        }
        info!("Prism client stopped");
    }
}
