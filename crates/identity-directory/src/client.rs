//! Directory endpoints.

use crate::address::validate_address;
use crate::records::{ProofStats, UserProfile};
use crate::{DirectoryError, DirectoryResult};
use auth_engine::{AuthError, AuthorizedClient, RequestClass};
use proof_sequencer::ProviderRegistry;
use tracing::debug;

/// Reads identity records and proof statistics.
#[derive(Clone)]
pub struct DirectoryClient {
    client: AuthorizedClient,
    registry: ProviderRegistry,
}

impl DirectoryClient {
    pub fn new(client: AuthorizedClient, registry: ProviderRegistry) -> Self {
        Self { client, registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Records of the signed-in user.
    pub async fn fetch_me(&self) -> DirectoryResult<UserProfile> {
        Ok(self.client.get("/me", RequestClass::Search).await?)
    }

    /// Records attached to `address`; `NotFound` when the backend has none.
    pub async fn fetch_user_by_address(&self, address: &str) -> DirectoryResult<UserProfile> {
        let address = validate_address(address)?;
        let path = format!("/user/{}", address);

        match self.client.get(&path, RequestClass::Search).await {
            Ok(profile) => Ok(profile),
            Err(AuthError::Api { status: 404, .. }) => {
                debug!(address = %address, "No identity records found");
                Err(DirectoryError::NotFound(address.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Search box lookup: `None` for an unknown address.
    pub async fn search(&self, query: &str) -> DirectoryResult<Option<UserProfile>> {
        match self.fetch_user_by_address(query).await {
            Ok(profile) => Ok(Some(profile)),
            Err(DirectoryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Attached proof counts per provider.
    pub async fn proof_stats(&self) -> DirectoryResult<ProofStats> {
        Ok(self
            .client
            .post_empty("/proof-stats", RequestClass::Search)
            .await?)
    }
}
