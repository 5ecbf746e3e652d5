//! Storage key constants.

/// Names of the persisted session entries.
pub struct StorageKeys;

impl StorageKeys {
    /// Short-lived access token
    pub const ACCESS_TOKEN: &'static str = "access_token";

    /// Long-lived refresh token
    pub const REFRESH_TOKEN: &'static str = "refresh_token";
}
