//! Seam to the third-party verification SDK.
//!
//! The SDK runs a verification session out of band and reports back through
//! callbacks. Here those callbacks feed an unbounded channel owned by a
//! [`PendingVerification`], which the sequencer awaits.

use crate::{Provider, ProofResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

/// What the SDK is asked to verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub session_id: Uuid,
    /// External provider id the session is scoped to
    pub provider_id: String,
}

/// Callback delivered by the SDK.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationEvent {
    /// Raw success payload; may be a proof, an array of proofs or a string
    Success(Value),
    Error(String),
}

/// Sending half handed to the SDK for its callbacks.
#[derive(Debug, Clone)]
pub struct VerificationSink {
    tx: mpsc::UnboundedSender<VerificationEvent>,
}

impl VerificationSink {
    /// Returns false once nobody is listening.
    pub fn success(&self, payload: Value) -> bool {
        self.tx.send(VerificationEvent::Success(payload)).is_ok()
    }

    pub fn error(&self, message: impl Into<String>) -> bool {
        self.tx.send(VerificationEvent::Error(message.into())).is_ok()
    }
}

#[async_trait]
pub trait VerificationSdk: Send + Sync {
    /// Start a session and return the URL the user opens to verify.
    async fn start_session(
        &self,
        request: &VerificationRequest,
        sink: VerificationSink,
    ) -> ProofResult<String>;

    /// Stop listening for callbacks of `session_id`.
    async fn stop_session(&self, session_id: Uuid);
}

/// Cancels a pending verification from anywhere.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // notify_one stores a permit if nobody is waiting yet
        self.notify.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`Self::cancel`] has been called.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.notify.notified().await;
        }
    }
}

/// A started verification session awaiting its callback.
#[derive(Debug)]
pub struct PendingVerification {
    pub session_id: Uuid,
    pub provider: Provider,
    /// URL the user opens (or scans) to run the verification
    pub request_url: String,
    pub(crate) events: mpsc::UnboundedReceiver<VerificationEvent>,
    pub(crate) cancel: CancelHandle,
}

impl PendingVerification {
    pub(crate) fn channel() -> (VerificationSink, mpsc::UnboundedReceiver<VerificationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (VerificationSink { tx }, rx)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}
