//! User-facing notices.
//!
//! Orchestration code turns outcomes into [`Notice`] values; rendering them
//! is up to the host UI.

use crate::AuthError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: NoticeSeverity,
    /// How long the notice stays visible
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
}

const SHORT: Duration = Duration::from_secs(3);

impl Notice {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: NoticeSeverity,
        timeout: Duration,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            timeout,
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, NoticeSeverity::Success, SHORT)
    }

    pub fn danger(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, NoticeSeverity::Danger, SHORT)
    }

    pub fn session_expired() -> Self {
        Self::new(
            "Session expired",
            "Your session has expired. Please log in again.",
            NoticeSeverity::Warning,
            Duration::from_secs(5),
        )
    }

    pub fn signed_in() -> Self {
        Self::success("Success", "Authentication successful")
    }

    pub fn sign_in_failed(error: &AuthError) -> Self {
        Self::danger(
            "Error",
            format!("Authentication failed: {}, please try again", error),
        )
    }

    /// Generic notice for an error surfaced from a user action.
    pub fn from_error(error: &AuthError) -> Self {
        if error.requires_login() {
            return Self::session_expired();
        }
        match error {
            AuthError::WalletNotConnected(_) => {
                Self::danger("Wallet not connected", "Connect a wallet to continue")
            }
            AuthError::SignatureRejected(_) => {
                Self::danger("Rejected", "The signature request was rejected")
            }
            other => Self::danger("Error", other.to_string()),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expired_notice() {
        let notice = Notice::session_expired();
        assert_eq!(notice.title, "Session expired");
        assert_eq!(notice.severity, NoticeSeverity::Warning);
        assert_eq!(notice.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_error_maps_session_loss() {
        assert_eq!(
            Notice::from_error(&AuthError::SessionExpired),
            Notice::session_expired()
        );
    }

    #[test]
    fn test_sign_in_failed_includes_reason() {
        let notice =
            Notice::sign_in_failed(&AuthError::AuthenticationFailed("bad signature".to_string()));
        assert_eq!(notice.severity, NoticeSeverity::Danger);
        assert!(notice.description.contains("bad signature"));
    }

    #[test]
    fn test_notice_serializes_timeout_in_millis() {
        let json = serde_json::to_value(Notice::signed_in()).unwrap();
        assert_eq!(json["timeout"], 3000);
        assert_eq!(json["severity"], "success");
    }
}
