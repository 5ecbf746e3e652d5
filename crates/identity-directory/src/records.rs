//! Identity record and statistics payloads.

use proof_sequencer::{parse_claim_data, ParsedClaimData, Provider, ProviderRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A proof attached to an address, as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub proof_identifier: String,
    /// External provider id
    #[serde(default, alias = "provider")]
    pub provider_id: String,
    /// Provider-specific JSON parameters of the claim
    #[serde(default)]
    pub claim_data_params: String,
    #[serde(default)]
    pub public_data: Option<HashMap<String, String>>,
    /// Seconds since the epoch
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl IdentityRecord {
    pub fn provider<'a>(&self, registry: &'a ProviderRegistry) -> Option<&'a Provider> {
        registry.by_provider_id(&self.provider_id)
    }

    pub fn display(&self, registry: &ProviderRegistry) -> ParsedClaimData {
        parse_claim_data(registry, &self.provider_id, &self.claim_data_params)
    }
}

/// Records attached to one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default, alias = "proofs")]
    pub identity_records: Vec<IdentityRecord>,
}

impl UserProfile {
    /// Records for providers in `registry`, paired with their provider.
    pub fn known_records<'a>(
        &'a self,
        registry: &'a ProviderRegistry,
    ) -> impl Iterator<Item = (&'a Provider, &'a IdentityRecord)> + 'a {
        self.identity_records
            .iter()
            .filter_map(move |record| record.provider(registry).map(|p| (p, record)))
    }

    pub fn has_proof_for(&self, provider: &Provider) -> bool {
        self.identity_records
            .iter()
            .any(|record| record.provider_id == provider.provider_id)
    }
}

/// Number of attached proofs per external provider id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStats {
    pub stats: Vec<(String, i64)>,
}

impl ProofStats {
    /// Sum of all counts, saturating at the `i64` bounds.
    pub fn total(&self) -> i64 {
        saturating_sum(self.stats.iter().map(|(_, count)| *count))
    }

    pub fn count_for(&self, provider_id: &str) -> i64 {
        saturating_sum(
            self.stats
                .iter()
                .filter(|(id, _)| id == provider_id)
                .map(|(_, count)| *count),
        )
    }

    /// Every provider in `registry` with its count, zero when absent.
    pub fn by_provider<'a>(&self, registry: &'a ProviderRegistry) -> Vec<(&'a Provider, i64)> {
        registry
            .iter()
            .map(|provider| (provider, self.count_for(&provider.provider_id)))
            .collect()
    }
}

fn saturating_sum(counts: impl Iterator<Item = i64>) -> i64 {
    counts.fold(0i64, |total, count| total.saturating_add(count))
}
