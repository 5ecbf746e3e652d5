//! Authentication engine for the Prism client.
//!
//! This crate provides:
//! - Wallet sign-in (prepare challenge, sign, exchange for tokens)
//! - Session management with single-flight token refresh
//! - An authorized HTTP client that refreshes and retries once on 401
//! - A proactive refresh monitor driven by the access token's `exp` claim
//! - Explicit FSM-based session state

mod api;
mod auth_fsm;
mod claims;
mod config;
mod error;
mod http;
mod notice;
mod refresh_monitor;
mod session;
mod sign_in;
mod wallet;

pub use api::{encode_sign_data, AuthChallenge, BackendClient, LoginCredentials, TokenPair};
pub use auth_fsm::session_machine;
pub use auth_fsm::{
    SessionMachine, SessionMachineInput, SessionMachineState, SessionState,
    SessionStateChangedPayload,
};
pub use claims::TokenClaims;
pub use config::{ClientConfig, RequestTimeouts, MAX_TOKEN_DAYS};
pub use error::{AuthError, AuthResult};
pub use http::{AuthorizedClient, RequestClass};
pub use notice::{Notice, NoticeSeverity};
pub use refresh_monitor::{ProactiveCheck, RefreshMonitor, RefreshMonitorHandle, RefreshPolicy};
pub use session::{RefreshOutcome, SessionManager, SessionStateCallback};
pub use wallet::{ensure_wallet_ready, SignedMessage, WalletAccount, WalletSigner, WalletStatus};
