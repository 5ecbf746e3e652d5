//! Access token claim decoding.
//!
//! The client never verifies token signatures; it only reads the payload to
//! schedule proactive refreshes and to know which signer the session is for.

use crate::{AuthError, AuthResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Claims embedded in a backend-issued JWT.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject: the signer address
    pub sub: String,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Issued at, seconds since the epoch
    #[serde(default)]
    pub iat: Option<i64>,
    /// `Access` or `Refresh`
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenClaims {
    /// Decode the payload segment of a compact JWT.
    pub fn decode(token: &str) -> AuthResult<Self> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => {
                return Err(AuthError::InvalidToken(
                    "expected three dot-separated segments".to_string(),
                ))
            }
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::InvalidToken(format!("payload is not base64url: {}", e)))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::InvalidToken(format!("payload is not valid claims: {}", e)))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Lifetime left at `now`; negative once expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        chrono::Duration::seconds(self.exp - now.timestamp())
    }

    /// True when less than `threshold` of lifetime is left at `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        let threshold = chrono::Duration::from_std(threshold).unwrap_or(chrono::Duration::MAX);
        self.remaining_at(now) < threshold
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(sub: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({ "sub": sub, "exp": exp, "iat": exp - 900, "token_type": "Access" })
            .to_string(),
    );
    format!("{}.{}.signature", header, payload)
}
