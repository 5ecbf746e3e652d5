//! Authentication error types.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wallet absent or not in a ready state
    #[error("Wallet not connected: {0}")]
    WalletNotConnected(String),

    /// User declined (or the wallet failed) to sign
    #[error("Signature rejected: {0}")]
    SignatureRejected(String),

    /// Backend rejected the signed challenge
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Token refresh failed.
    ///
    /// `relogin_required` is true when the refresh token was rejected and the
    /// session has been cleared; false when a later retry may succeed.
    #[error("Token refresh failed: {reason}")]
    RefreshFailed {
        reason: String,
        relogin_required: bool,
    },

    /// Session is gone and the user must sign in again
    #[error("Session expired")]
    SessionExpired,

    /// Backend answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Access token could not be decoded
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] session_storage::StorageError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Returns true if this error is transient and the user action can be retried.
    ///
    /// Transient errors include:
    /// - Connection failures and timeouts
    /// - HTTP 5xx responses
    /// - Refresh failures that kept the session
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Timeout => true,
            AuthError::Network(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            AuthError::Api { status, .. } => *status >= 500,
            AuthError::RefreshFailed {
                relogin_required, ..
            } => !relogin_required,
            _ => false,
        }
    }

    /// Returns true if the user has to sign in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            AuthError::SessionExpired
                | AuthError::RefreshFailed {
                    relogin_required: true,
                    ..
                }
        )
    }

    /// Build an error from a transport failure, mapping request timeouts to `Timeout`.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Timeout
        } else {
            AuthError::Network(err)
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
