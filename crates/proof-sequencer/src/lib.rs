//! Proof submission for the Prism client.
//!
//! This crate provides:
//! - The provider catalog and claim display parsing
//! - A seam to the third-party verification SDK with async callbacks
//! - The sequencer that prepares, co-signs and applies a received proof

mod claim_display;
mod error;
mod proof;
mod provider;
mod sequencer;
mod verification;

pub use claim_display::{parse_claim_data, ParsedClaimData};
pub use error::{proof_applied_notice, ProofError, ProofResult};
pub use proof::Proof;
pub use provider::{Provider, ProviderRegistry};
pub use sequencer::{proof_machine, ProofMachine, ProofMachineInput, ProofMachineState};
pub use sequencer::{ProofSequencer, ProofState};
pub use verification::{
    CancelHandle, PendingVerification, VerificationEvent, VerificationRequest, VerificationSdk,
    VerificationSink,
};
