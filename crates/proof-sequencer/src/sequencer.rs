//! Proof submission sequencer.
//!
//! ## State Diagram
//!
//! ```text
//! Idle ─RequestLink─► LinkRequested ─LinkReady─► AwaitingExternalCallback
//!                                                        │ ProofArrived
//!                                                        ▼
//! Done ◄─Applied─ Submitting ◄─Signed─ Signing ◄─PrepareDone─ Preparing ◄─StartPrepare─ ProofReceived
//! ```
//!
//! `Fail` moves any active state to `Error`; `Cancel` and `Reset` return to
//! `Idle`. A proof obtained elsewhere can be attached from `Idle`, `Done` or
//! `Error`.

use crate::verification::{PendingVerification, VerificationEvent, VerificationRequest};
use crate::{Proof, ProofError, ProofResult, Provider, VerificationSdk};
use auth_engine::{
    encode_sign_data, ensure_wallet_ready, AuthorizedClient, RequestClass, WalletSigner,
};
use parking_lot::Mutex;
use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub proof_machine(Idle)

    Idle => {
        RequestLink => LinkRequested,
        StartPrepare => Preparing,
        Cancel => Idle,
        Reset => Idle
    },
    LinkRequested => {
        LinkReady => AwaitingExternalCallback,
        Fail => Error,
        Cancel => Idle
    },
    AwaitingExternalCallback => {
        ProofArrived => ProofReceived,
        // New link replaces the pending session
        RequestLink => LinkRequested,
        Fail => Error,
        Cancel => Idle
    },
    ProofReceived => {
        StartPrepare => Preparing,
        Fail => Error,
        Cancel => Idle
    },
    Preparing => {
        PrepareDone => Signing,
        Fail => Error
    },
    Signing => {
        Signed => Submitting,
        Fail => Error
    },
    Submitting => {
        Applied => Done,
        Fail => Error
    },
    Done => {
        RequestLink => LinkRequested,
        StartPrepare => Preparing,
        Reset => Idle
    },
    Error => {
        RequestLink => LinkRequested,
        StartPrepare => Preparing,
        Cancel => Idle,
        Reset => Idle
    }
}

pub use proof_machine::Input as ProofMachineInput;
pub use proof_machine::State as ProofMachineState;
pub use proof_machine::StateMachine as ProofMachine;

/// Sequencer state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofState {
    Idle,
    LinkRequested,
    AwaitingExternalCallback,
    ProofReceived,
    Preparing,
    Signing,
    Submitting,
    Done,
    Error,
}

impl ProofState {
    /// True while a request is on the wire or waiting on the user.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ProofState::LinkRequested
                | ProofState::Preparing
                | ProofState::Signing
                | ProofState::Submitting
        )
    }
}

impl From<&ProofMachineState> for ProofState {
    fn from(state: &ProofMachineState) -> Self {
        match state {
            ProofMachineState::Idle => ProofState::Idle,
            ProofMachineState::LinkRequested => ProofState::LinkRequested,
            ProofMachineState::AwaitingExternalCallback => ProofState::AwaitingExternalCallback,
            ProofMachineState::ProofReceived => ProofState::ProofReceived,
            ProofMachineState::Preparing => ProofState::Preparing,
            ProofMachineState::Signing => ProofState::Signing,
            ProofMachineState::Submitting => ProofState::Submitting,
            ProofMachineState::Done => ProofState::Done,
            ProofMachineState::Error => ProofState::Error,
        }
    }
}

#[derive(Serialize)]
struct PrepareRequest<'a> {
    proof: &'a Proof,
    provider_id: &'a str,
    signer: &'a str,
}

#[derive(Deserialize)]
struct PrepareResponse {
    data: Vec<u8>,
}

#[derive(Serialize)]
struct ApplyRequest<'a> {
    signer: &'a str,
    public_key: &'a str,
    signature: &'a str,
    data: &'a str,
    provider_id: &'a str,
    proof: &'a Proof,
}

#[derive(Deserialize)]
struct ApplyResponse {
    #[serde(default)]
    success: bool,
}

/// Drives one proof at a time from verification link to applied proof.
pub struct ProofSequencer {
    client: AuthorizedClient,
    wallet: Arc<dyn WalletSigner>,
    sdk: Arc<dyn VerificationSdk>,
    fsm: Mutex<ProofMachine>,
    /// SDK session that is still listening for a callback
    active_session: Mutex<Option<Uuid>>,
}

impl ProofSequencer {
    pub fn new(
        client: AuthorizedClient,
        wallet: Arc<dyn WalletSigner>,
        sdk: Arc<dyn VerificationSdk>,
    ) -> Self {
        Self {
            client,
            wallet,
            sdk,
            fsm: Mutex::new(ProofMachine::new()),
            active_session: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ProofState {
        ProofState::from(self.fsm.lock().state())
    }

    fn transition(&self, input: ProofMachineInput) -> ProofResult<ProofState> {
        let mut fsm = self.fsm.lock();
        let old_state = ProofState::from(fsm.state());

        fsm.consume(&input).map_err(|_| {
            ProofError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input, old_state
            ))
        })?;

        let new_state = ProofState::from(fsm.state());
        if old_state != new_state {
            debug!(old_state = ?old_state, new_state = ?new_state, "Proof state transition");
        }
        Ok(new_state)
    }

    /// Record a failure and hand the error back.
    fn fail(&self, error: ProofError) -> ProofError {
        warn!(error = %error, "Proof submission step failed");
        let _ = self.transition(ProofMachineInput::Fail);
        error
    }

    /// Stop `session_id` in the SDK and forget it if it is the active one.
    async fn stop_session(&self, session_id: Uuid) {
        {
            let mut active = self.active_session.lock();
            if *active == Some(session_id) {
                *active = None;
            }
        }
        self.sdk.stop_session(session_id).await;
        debug!(session_id = %session_id, "Verification session stopped");
    }

    /// Return to `Idle` after `Done` or `Error`.
    pub fn reset(&self) -> ProofResult<()> {
        self.transition(ProofMachineInput::Reset).map(|_| ())
    }

    /// Start a verification session for `provider`.
    ///
    /// A session started by an earlier `initiate` that is still waiting for
    /// its callback is stopped first.
    pub async fn initiate(&self, provider: &Provider) -> ProofResult<PendingVerification> {
        self.transition(ProofMachineInput::RequestLink)?;

        let superseded = self.active_session.lock().take();
        if let Some(session_id) = superseded {
            info!(session_id = %session_id, "Stopping superseded verification session");
            self.sdk.stop_session(session_id).await;
        }

        let request = VerificationRequest {
            session_id: Uuid::new_v4(),
            provider_id: provider.provider_id.clone(),
        };
        let (sink, events) = PendingVerification::channel();

        let request_url = match self.sdk.start_session(&request, sink).await {
            Ok(url) => url,
            Err(e) => return Err(self.fail(e)),
        };

        *self.active_session.lock() = Some(request.session_id);
        self.transition(ProofMachineInput::LinkReady)?;
        info!(
            provider = %provider.id,
            session_id = %request.session_id,
            "Verification link ready"
        );

        Ok(PendingVerification {
            session_id: request.session_id,
            provider: provider.clone(),
            request_url,
            events,
            cancel: Default::default(),
        })
    }

    /// Wait for the SDK callback. There is no client-side timeout.
    ///
    /// The SDK session is stopped once this returns, whatever the outcome.
    pub async fn await_proof(&self, pending: &mut PendingVerification) -> ProofResult<Proof> {
        let cancel = pending.cancel.clone();
        let event = tokio::select! {
            _ = cancel.cancelled() => None,
            event = pending.events.recv() => Some(event),
        };
        self.stop_session(pending.session_id).await;

        let event = match event {
            None => {
                let _ = self.transition(ProofMachineInput::Cancel);
                info!(session_id = %pending.session_id, "Verification cancelled");
                return Err(ProofError::Cancelled);
            }
            Some(None) => {
                return Err(self.fail(ProofError::Verification(
                    "verification session closed without a result".to_string(),
                )))
            }
            Some(Some(event)) => event,
        };

        match event {
            VerificationEvent::Success(payload) => {
                let proof = Proof::from_callback(payload).map_err(|e| self.fail(e))?;
                self.transition(ProofMachineInput::ProofArrived)?;
                debug!(identifier = ?proof.identifier(), "Proof received");
                Ok(proof)
            }
            VerificationEvent::Error(message) => Err(self.fail(ProofError::Verification(message))),
        }
    }

    /// Prepare, co-sign and apply `proof` for `provider`.
    ///
    /// Steps run strictly in order; the first failure stops the sequence, so
    /// the apply endpoint is never reached after a failed prepare or sign.
    /// `publicData` is removed before the proof leaves the client.
    pub async fn attach(&self, provider: &Provider, proof: &Proof) -> ProofResult<bool> {
        self.transition(ProofMachineInput::StartPrepare)?;

        let account =
            ensure_wallet_ready(self.wallet.as_ref()).map_err(|e| self.fail(e.into()))?;
        let proof = proof.without_public_data();

        let prepared: PrepareResponse = self
            .client
            .post(
                "/proof/prepare",
                &PrepareRequest {
                    proof: &proof,
                    provider_id: &provider.provider_id,
                    signer: &account.address,
                },
                RequestClass::Proof,
            )
            .await
            .map_err(|e| self.fail(ProofError::Preparation(e)))?;
        self.transition(ProofMachineInput::PrepareDone)?;

        let data = encode_sign_data(&prepared.data);
        let signed = self
            .wallet
            .sign_arbitrary(&account.address, &data)
            .await
            .map_err(|e| self.fail(e.into()))?;
        self.transition(ProofMachineInput::Signed)?;

        let applied: ApplyResponse = self
            .client
            .post(
                "/proof",
                &ApplyRequest {
                    signer: &account.address,
                    public_key: &signed.public_key,
                    signature: &signed.signature,
                    data: &data,
                    provider_id: &provider.provider_id,
                    proof: &proof,
                },
                RequestClass::Proof,
            )
            .await
            .map_err(|e| self.fail(ProofError::Submission(e)))?;

        if !applied.success {
            warn!(provider = %provider.id, "Backend did not apply proof");
            let _ = self.transition(ProofMachineInput::Fail);
            return Ok(false);
        }

        self.transition(ProofMachineInput::Applied)?;
        info!(provider = %provider.id, signer = %account.address, "Proof applied");
        Ok(true)
    }

    /// Await the callback of `pending`, then attach the proof.
    pub async fn complete(&self, mut pending: PendingVerification) -> ProofResult<bool> {
        let proof = self.await_proof(&mut pending).await?;
        self.attach(&pending.provider, &proof).await
    }

    /// Stop the SDK session and return to `Idle`.
    pub async fn cancel(&self, pending: PendingVerification) -> ProofResult<()> {
        pending.cancel.cancel();
        self.stop_session(pending.session_id).await;
        self.transition(ProofMachineInput::Cancel)?;
        info!(session_id = %pending.session_id, "Verification cancelled");
        Ok(())
    }
}
