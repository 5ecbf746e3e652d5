//! Client configuration.

use crate::{AuthError, AuthResult};
use session_storage::TokenExpiryPolicy;
use std::time::Duration;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Longest expiry window accepted for either token.
pub const MAX_TOKEN_DAYS: i64 = 3650;

/// Request timeouts per network call class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTimeouts {
    /// Challenge, login, refresh and logout calls
    pub auth: Duration,
    /// Proof prepare and apply calls
    pub proof: Duration,
    /// Profile, search and stats calls
    pub search: Duration,
}

impl Default for RequestTimeouts {
    fn default() -> Self {
        Self {
            auth: Duration::from_secs(10),
            proof: Duration::from_secs(30),
            search: Duration::from_secs(10),
        }
    }
}

/// Prism client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL
    pub api_url: Url,

    /// Expiry windows and attributes for persisted tokens
    pub token_expiry: TokenExpiryPolicy,

    /// How often the proactive refresh check runs
    pub refresh_check_interval: Duration,

    /// Refresh when the access token has less than this left
    pub refresh_threshold: Duration,

    /// Per call class request timeouts
    pub timeouts: RequestTimeouts,
}

impl ClientConfig {
    /// Create a config for `api_url` with default settings.
    pub fn new(api_url: &str) -> AuthResult<Self> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            token_expiry: TokenExpiryPolicy::default(),
            refresh_check_interval: Duration::from_secs(60),
            refresh_threshold: Duration::from_secs(5 * 60),
            timeouts: RequestTimeouts::default(),
        })
    }

    /// Create a config from `PRISM_*` environment variables.
    ///
    /// Unset or unparsable numeric values fall back to their defaults.
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AuthResult<Self> {
        let api_url = lookup("PRISM_API_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&api_url)?;

        let number = |name: &str| lookup(name).and_then(|value| value.trim().parse::<u64>().ok());

        if let Some(days) = number("PRISM_ACCESS_TOKEN_DAYS") {
            config.token_expiry.access_token_days = i64::try_from(days).unwrap_or(i64::MAX);
        }
        if let Some(days) = number("PRISM_REFRESH_TOKEN_DAYS") {
            config.token_expiry.refresh_token_days = i64::try_from(days).unwrap_or(i64::MAX);
        }
        if let Some(secs) = number("PRISM_REFRESH_INTERVAL_SECS") {
            config.refresh_check_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = number("PRISM_REFRESH_THRESHOLD_SECS") {
            config.refresh_threshold = Duration::from_secs(secs);
        }
        if let Some(secs) = number("PRISM_AUTH_TIMEOUT_SECS") {
            config.timeouts.auth = Duration::from_secs(secs);
        }
        if let Some(secs) = number("PRISM_PROOF_TIMEOUT_SECS") {
            config.timeouts.proof = Duration::from_secs(secs);
        }
        if let Some(secs) = number("PRISM_SEARCH_TIMEOUT_SECS") {
            config.timeouts.search = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> AuthResult<()> {
        if self.refresh_check_interval.is_zero() {
            return Err(AuthError::Config(
                "refresh check interval must be greater than zero".to_string(),
            ));
        }
        let expiry = &self.token_expiry;
        for days in [expiry.access_token_days, expiry.refresh_token_days] {
            if !(1..=MAX_TOKEN_DAYS).contains(&days) {
                return Err(AuthError::Config(format!(
                    "token expiry windows must be between 1 and {} days, got {}",
                    MAX_TOKEN_DAYS, days
                )));
            }
        }
        let timeouts = &self.timeouts;
        if timeouts.auth.is_zero() || timeouts.proof.is_zero() || timeouts.search.is_zero() {
            return Err(AuthError::Config(
                "request timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute URL for a backend path such as `/auth/prepare`.
    pub fn endpoint(&self, path: &str) -> AuthResult<Url> {
        endpoint_url(&self.api_url, path)
    }
}

pub(crate) fn endpoint_url(base: &Url, path: &str) -> AuthResult<Url> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{}/{}", base, path))?)
}

fn parse_api_url(raw: &str) -> AuthResult<Url> {
    let url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AuthError::Config(format!(
            "API URL must be http or https, got {}",
            url.scheme()
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.api_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.token_expiry.access_token_days, 1);
        assert_eq!(config.token_expiry.refresh_token_days, 7);
        assert_eq!(config.refresh_check_interval, Duration::from_secs(60));
        assert_eq!(config.refresh_threshold, Duration::from_secs(300));
        assert_eq!(config.timeouts, RequestTimeouts::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("PRISM_API_URL", "https://api.prism.id"),
            ("PRISM_REFRESH_THRESHOLD_SECS", "120"),
            ("PRISM_PROOF_TIMEOUT_SECS", "45"),
            ("PRISM_ACCESS_TOKEN_DAYS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.api_url.host_str(), Some("api.prism.id"));
        assert_eq!(config.refresh_threshold, Duration::from_secs(120));
        assert_eq!(config.timeouts.proof, Duration::from_secs(45));
        assert_eq!(config.token_expiry.access_token_days, 2);
    }

    #[test]
    fn test_unparsable_numbers_fall_back() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("PRISM_AUTH_TIMEOUT_SECS", "soon")])).unwrap();
        assert_eq!(config.timeouts.auth, Duration::from_secs(10));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result =
            ClientConfig::from_lookup(lookup_from(&[("PRISM_REFRESH_INTERVAL_SECS", "0")]));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_oversized_token_days_rejected() {
        let result =
            ClientConfig::from_lookup(lookup_from(&[("PRISM_ACCESS_TOKEN_DAYS", "100000000")]));
        assert!(matches!(result, Err(AuthError::Config(_))));

        let result = ClientConfig::from_lookup(lookup_from(&[(
            "PRISM_REFRESH_TOKEN_DAYS",
            "18446744073709551615",
        )]));
        assert!(matches!(result, Err(AuthError::Config(_))));

        let config =
            ClientConfig::from_lookup(lookup_from(&[("PRISM_REFRESH_TOKEN_DAYS", "3650")])).unwrap();
        assert_eq!(config.token_expiry.refresh_token_days, MAX_TOKEN_DAYS);
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        assert!(matches!(
            ClientConfig::new("ftp://example.com"),
            Err(AuthError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(AuthError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = ClientConfig::new("https://example.com/api/").unwrap();
        assert_eq!(
            config.endpoint("/auth/prepare").unwrap().as_str(),
            "https://example.com/api/auth/prepare"
        );
    }
}
