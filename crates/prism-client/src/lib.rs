//! Prism identity client.
//!
//! [`AppContext`] wires the session manager, authorized HTTP client, proof
//! sequencer and identity directory together for one client context. Hosts
//! construct it once with their wallet and verification SDK, and call
//! [`AppContext::shutdown`] when done.

mod context;
mod error;
mod logging;

pub use context::AppContext;
pub use error::{ClientError, ClientResult};
pub use logging::{init_logging, LoggingSettings};

pub use auth_engine::{ClientConfig, Notice, NoticeSeverity, SessionState};
pub use identity_directory::{shorten_address, UserProfile};
pub use proof_sequencer::{PendingVerification, Provider, ProviderRegistry};
