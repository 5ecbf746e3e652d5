use auth_engine::{AuthError, Notice};
use identity_directory::DirectoryError;
use proof_sequencer::ProofError;
use session_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] std::io::Error),
}

impl ClientError {
    /// Notice to show the user, `None` when nothing should be shown.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            ClientError::Auth(e) => Some(Notice::from_error(e)),
            ClientError::Proof(e) => e.notice(),
            ClientError::Directory(DirectoryError::Auth(e)) => Some(Notice::from_error(e)),
            ClientError::Directory(e) => Some(Notice::danger("Error", e.to_string())),
            ClientError::Storage(e) => Some(Notice::danger("Error", e.to_string())),
            ClientError::Logging(_) => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
