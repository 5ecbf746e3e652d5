//! Session state machine using rust-fsm.
//!
//! Tokens live in storage; the FSM tracks what the client is doing with them.
//!
//! ## State Diagram
//!
//! ```text
//! ┌──────────────────┐  SessionRestored   ┌─────────────────┐
//! │ Unauthenticated  │ ─────────────────► │  Authenticated  │
//! └────────┬─────────┘                    └───┬─────────▲───┘
//!          │ LoginAttempt                     │         │
//!          ▼                                  │         │ RefreshSuccess /
//! ┌──────────────────┐   LoginSuccess         │         │ RefreshDeferred
//! │  Authenticating  │ ───────────────────────┘         │
//! └──────────────────┘                  RefreshStarted  │
//!          │ LoginFailed                      ▼         │
//!          ▼                          ┌─────────────────┴┐
//!    Unauthenticated ◄─────────────── │    Refreshing    │
//!                    RefreshRejected  └──────────────────┘
//! ```
//!
//! `LogoutRequested` and `SessionRevoked` return to `Unauthenticated` from
//! any state that holds a session.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unauthenticated)

    Unauthenticated => {
        LoginAttempt => Authenticating,
        SessionRestored => Authenticated,
        // Tokens can exist before restore() ran, so a 401 may still refresh
        RefreshStarted => Refreshing,
        LogoutRequested => Unauthenticated,
        SessionRevoked => Unauthenticated
    },
    Authenticating => {
        LoginAttempt => Authenticating,
        LoginSuccess => Authenticated,
        LoginFailed => Unauthenticated,
        LogoutRequested => Unauthenticated
    },
    Authenticated => {
        SessionRestored => Authenticated,
        LoginAttempt => Authenticating,
        RefreshStarted => Refreshing,
        LogoutRequested => Unauthenticated,
        SessionRevoked => Unauthenticated
    },
    Refreshing => {
        LoginAttempt => Authenticating,
        RefreshSuccess => Authenticated,
        // Transient failure: tokens were kept
        RefreshDeferred => Authenticated,
        RefreshRejected => Unauthenticated,
        LogoutRequested => Unauthenticated,
        SessionRevoked => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session state for external consumption (UI, logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Refreshing,
}

impl SessionState {
    /// Returns true if the client holds a usable session.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated | SessionState::Refreshing)
    }

    /// Returns true if the state is in-progress.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionState::Authenticating | SessionState::Refreshing)
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Unauthenticated => SessionState::Unauthenticated,
            SessionMachineState::Authenticating => SessionState::Authenticating,
            SessionMachineState::Authenticated => SessionState::Authenticated,
            SessionMachineState::Refreshing => SessionState::Refreshing,
        }
    }
}

/// Payload for session state change events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStateChangedPayload {
    pub state: SessionState,
    /// Signer address from the access token, when one is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticated() -> SessionMachine {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::LoginAttempt).unwrap();
        machine.consume(&SessionMachineInput::LoginSuccess).unwrap();
        machine
    }

    #[test]
    fn test_initial_state_is_unauthenticated() {
        let machine = SessionMachine::new();
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_login_flow() {
        let machine = authenticated();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_login_failure_returns_to_unauthenticated() {
        let mut machine = SessionMachine::new();

        machine.consume(&SessionMachineInput::LoginAttempt).unwrap();
        machine.consume(&SessionMachineInput::LoginFailed).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_restored_session_is_authenticated() {
        let mut machine = SessionMachine::new();

        machine.consume(&SessionMachineInput::SessionRestored).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_refresh_success() {
        let mut machine = authenticated();

        machine.consume(&SessionMachineInput::RefreshStarted).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Refreshing);

        machine.consume(&SessionMachineInput::RefreshSuccess).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_refresh_deferred_keeps_session() {
        let mut machine = authenticated();

        machine.consume(&SessionMachineInput::RefreshStarted).unwrap();
        machine.consume(&SessionMachineInput::RefreshDeferred).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_refresh_rejected_ends_session() {
        let mut machine = authenticated();

        machine.consume(&SessionMachineInput::RefreshStarted).unwrap();
        machine.consume(&SessionMachineInput::RefreshRejected).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_logout_from_authenticated() {
        let mut machine = authenticated();

        machine.consume(&SessionMachineInput::LogoutRequested).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut machine = SessionMachine::new();

        // Cannot succeed a login that never started
        assert!(machine.consume(&SessionMachineInput::LoginSuccess).is_err());
        // Cannot finish a refresh that never started
        assert!(machine.consume(&SessionMachineInput::RefreshSuccess).is_err());

        machine.consume(&SessionMachineInput::LoginAttempt).unwrap();
        assert!(machine.consume(&SessionMachineInput::RefreshStarted).is_err());
    }

    #[test]
    fn test_session_state_conversion() {
        assert_eq!(
            SessionState::from(&SessionMachineState::Unauthenticated),
            SessionState::Unauthenticated
        );
        assert_eq!(
            SessionState::from(&SessionMachineState::Refreshing),
            SessionState::Refreshing
        );
    }

    #[test]
    fn test_session_state_helpers() {
        assert!(SessionState::Authenticated.is_authenticated());
        assert!(SessionState::Refreshing.is_authenticated());
        assert!(!SessionState::Authenticating.is_authenticated());

        assert!(SessionState::Authenticating.is_transient());
        assert!(!SessionState::Unauthenticated.is_transient());
    }

    #[test]
    fn test_state_changed_payload_serialization() {
        let payload = SessionStateChangedPayload {
            state: SessionState::Authenticated,
            signer: Some("cosmos1abc".to_string()),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["state"], "authenticated");
        assert_eq!(json["signer"], "cosmos1abc");

        let anonymous = SessionStateChangedPayload {
            state: SessionState::Unauthenticated,
            signer: None,
        };
        let json = serde_json::to_value(&anonymous).unwrap();
        assert!(json.get("signer").is_none());
    }
}
