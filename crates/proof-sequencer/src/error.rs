//! Proof submission error types.

use auth_engine::{AuthError, Notice, NoticeSeverity};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProofError {
    /// `/proof/prepare` failed
    #[error("Failed to prepare proof: {0}")]
    Preparation(#[source] AuthError),

    /// `/proof` failed or reported no success
    #[error("Failed to apply proof: {0}")]
    Submission(#[source] AuthError),

    /// Callback payload is not a usable proof
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// The verification SDK reported an error
    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Verification cancelled")]
    Cancelled,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid provider catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid proof state transition: {0}")]
    InvalidStateTransition(String),

    /// Wallet or session error
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProofError {
    /// Returns true if the user has to sign in again before retrying.
    pub fn requires_login(&self) -> bool {
        match self {
            ProofError::Preparation(e) | ProofError::Submission(e) | ProofError::Auth(e) => {
                e.requires_login()
            }
            _ => false,
        }
    }

    /// Notice for the user, `None` for a deliberate cancel.
    pub fn notice(&self) -> Option<Notice> {
        if self.requires_login() {
            return Some(Notice::session_expired());
        }
        let notice = match self {
            ProofError::Cancelled => return None,
            ProofError::Preparation(e) => Notice::danger("Error preparing proof", e.to_string()),
            ProofError::Submission(e) => Notice::danger("Error applying proof", e.to_string()),
            ProofError::Verification(message) => Notice::new(
                "Error generating proof link",
                message.clone(),
                NoticeSeverity::Danger,
                Duration::from_secs(100),
            ),
            ProofError::Auth(e) => Notice::from_error(e),
            other => Notice::danger("Error", other.to_string()),
        };
        Some(notice)
    }
}

pub fn proof_applied_notice() -> Notice {
    Notice::success("Proof applied", "Proof applied successfully")
}

pub type ProofResult<T> = Result<T, ProofError>;
