use auth_engine::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("No identity records for {0}")]
    NotFound(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
