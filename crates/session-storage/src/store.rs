//! High-level API for the persisted access/refresh token pair.

use crate::{CookieOptions, StorageError, StorageKeys, StorageResult, TokenStorage};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

/// How long each token is kept and which attributes it is written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExpiryPolicy {
    /// Days the access token entry is kept
    pub access_token_days: i64,
    /// Days the refresh token entry is kept
    pub refresh_token_days: i64,
    /// Cookie attributes for both entries
    pub cookie: CookieOptions,
}

impl Default for TokenExpiryPolicy {
    fn default() -> Self {
        Self {
            access_token_days: 1,
            refresh_token_days: 7,
            cookie: CookieOptions::default(),
        }
    }
}

/// Owner of the persisted session tokens.
///
/// Writes are last-write-wins; there is a single writer per client context.
pub struct TokenStore {
    storage: Box<dyn TokenStorage>,
    policy: TokenExpiryPolicy,
}

impl TokenStore {
    pub fn new(storage: Box<dyn TokenStorage>, policy: TokenExpiryPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> &TokenExpiryPolicy {
        &self.policy
    }

    /// Persist a freshly issued token pair, each with its own expiry window.
    pub fn set_tokens(&self, access_token: &str, refresh_token: &str) -> StorageResult<()> {
        let now = Utc::now();
        let access_expires = expires_after(now, self.policy.access_token_days)?;
        let refresh_expires = expires_after(now, self.policy.refresh_token_days)?;

        self.storage.set(
            StorageKeys::ACCESS_TOKEN,
            access_token,
            Some(access_expires),
            &self.policy.cookie,
        )?;
        self.storage.set(
            StorageKeys::REFRESH_TOKEN,
            refresh_token,
            Some(refresh_expires),
            &self.policy.cookie,
        )?;
        debug!("Stored session token pair");
        Ok(())
    }

    pub fn get_access_token(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::ACCESS_TOKEN)
    }

    pub fn get_refresh_token(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::REFRESH_TOKEN)
    }

    /// True when either token is still present.
    pub fn has_session(&self) -> StorageResult<bool> {
        Ok(self.storage.has(StorageKeys::ACCESS_TOKEN)?
            || self.storage.has(StorageKeys::REFRESH_TOKEN)?)
    }

    /// Remove both tokens.
    pub fn clear_tokens(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::ACCESS_TOKEN)?;
        self.storage.delete(StorageKeys::REFRESH_TOKEN)?;
        debug!("Cleared session tokens");
        Ok(())
    }

    /// `Set-Cookie` renderings of the live entries, for hosts that mirror
    /// the session into a browser cookie jar.
    pub fn set_cookie_headers(&self) -> StorageResult<Vec<String>> {
        let mut headers = Vec::new();
        for key in [StorageKeys::ACCESS_TOKEN, StorageKeys::REFRESH_TOKEN] {
            if let Some(entry) = self.storage.get_entry(key)? {
                if !entry.is_expired_at(Utc::now()) {
                    headers.push(entry.to_set_cookie(key));
                }
            }
        }
        Ok(headers)
    }
}

fn expires_after(now: DateTime<Utc>, days: i64) -> StorageResult<DateTime<Utc>> {
    TimeDelta::try_days(days)
        .and_then(|window| now.checked_add_signed(window))
        .ok_or(StorageError::InvalidExpiry(days))
}
