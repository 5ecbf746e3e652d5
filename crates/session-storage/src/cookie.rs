//! Cookie-style entry attributes.
//!
//! Entries carry the same attributes a browser cookie jar would apply:
//! an absolute expiry, a path, the `secure` flag and a `SameSite` policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SameSite policy of a persisted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "strict",
            SameSite::Lax => "lax",
            SameSite::None => "none",
        }
    }
}

/// Attributes applied to every entry written by a `TokenStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            secure: true,
            same_site: SameSite::Strict,
        }
    }
}

/// A persisted value with its cookie attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub path: String,
    pub secure: bool,
    pub same_site: SameSite,
}

impl StoredEntry {
    pub fn new(value: &str, expires_at: Option<DateTime<Utc>>, options: &CookieOptions) -> Self {
        Self {
            value: value.to_string(),
            expires_at,
            path: options.path.clone(),
            secure: options.secure,
            same_site: options.same_site,
        }
    }

    /// An entry without an expiry never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Render the entry as a `Set-Cookie` style header value.
    pub fn to_set_cookie(&self, name: &str) -> String {
        let mut header = format!("{}={}", name, encode_component(&self.value));
        if let Some(expires_at) = self.expires_at {
            header.push_str(&format!(
                "; expires={}",
                expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        header.push_str(&format!("; path={}", self.path));
        if self.secure {
            header.push_str("; secure");
        }
        header.push_str(&format!("; samesite={}", self.same_site.as_str()));
        header
    }
}

/// Percent-encode everything outside the URI component unreserved set.
fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
