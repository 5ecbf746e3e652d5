//! Identity provider catalog.

use crate::{ProofError, ProofResult};
use serde::{Deserialize, Serialize};

/// A third-party identity source that proofs can be requested from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Short slug, e.g. `github`
    pub id: String,
    pub name: String,
    pub domain: String,
    pub link: String,
    /// Identifier in the verification SDK and on the backend
    #[serde(alias = "providerId")]
    pub provider_id: String,
    pub description: String,
}

impl Provider {
    fn builtin(
        id: &str,
        name: &str,
        domain: &str,
        provider_id: &str,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            domain: domain.to_string(),
            link: format!("https://{}", domain),
            provider_id: provider_id.to_string(),
            description: description.to_string(),
        }
    }
}

/// Immutable set of providers, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

impl ProviderRegistry {
    /// The providers the client ships with.
    pub fn builtin() -> Self {
        Self {
            providers: vec![
                Provider::builtin(
                    "twitter",
                    "X",
                    "x.com",
                    "e6fe962d-8b4e-4ce5-abcc-3d21c88bd64a",
                    "Verifies twitter profile of user",
                ),
                Provider::builtin(
                    "google",
                    "Google",
                    "gmail.com",
                    "f9f383fd-32d9-4c54-942f-5e9fda349762",
                    "Verifies Google account ownership",
                ),
                Provider::builtin(
                    "linkedin",
                    "Linkedin",
                    "linkedin.com",
                    "a9f1063c-06b7-476a-8410-9ff6e427e637",
                    "Verifies LinkedIn profile authenticity",
                ),
                Provider::builtin(
                    "github",
                    "Github",
                    "github.com",
                    "6d3f6753-7ee6-49ee-a545-62f1b1822ae5",
                    "Verifies GitHub account ownership",
                ),
                Provider::builtin(
                    "facebook",
                    "Facebook",
                    "facebook.com",
                    "823aa38f-7a42-4dd9-854e-7cf574100cc8",
                    "Verifies Facebook account ownership",
                ),
                Provider::builtin(
                    "binance",
                    "Binance",
                    "binance.com",
                    "2b22db5c-78d9-4d82-84f0-a9e0a4ed0470",
                    "Verifies Binance KYC Level",
                ),
                Provider::builtin(
                    "coinbase",
                    "Coinbase",
                    "coinbase.com",
                    "285a345c-c6a6-4b9f-9e1e-23432082c0a8",
                    "Verifies Coinbase Completed KYC",
                ),
                Provider::builtin(
                    "instagram",
                    "Instagram",
                    "instagram.com",
                    "3ad6946f-88f4-4958-9a8e-5271a831b5b8",
                    "Verifies Instagram account ownership",
                ),
            ],
        }
    }

    /// Load a catalog from a JSON array of providers.
    ///
    /// Slugs and provider ids must be unique.
    pub fn from_json(json: &str) -> ProofResult<Self> {
        let providers: Vec<Provider> = serde_json::from_str(json)?;
        for (index, provider) in providers.iter().enumerate() {
            let duplicate = providers[..index]
                .iter()
                .any(|p| p.id == provider.id || p.provider_id == provider.provider_id);
            if duplicate {
                return Err(ProofError::InvalidCatalog(format!(
                    "duplicate provider entry: {}",
                    provider.id
                )));
            }
        }
        Ok(Self { providers })
    }

    /// Look up by slug.
    pub fn get(&self, id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Look up by external provider id.
    pub fn by_provider_id(&self, provider_id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.provider_id == provider_id)
    }

    /// Like [`Self::get`], failing with `UnknownProvider`.
    pub fn require(&self, id: &str) -> ProofResult<&Provider> {
        self.get(id)
            .ok_or_else(|| ProofError::UnknownProvider(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.len(), 8);

        let github = registry.get("github").unwrap();
        assert_eq!(github.provider_id, "6d3f6753-7ee6-49ee-a545-62f1b1822ae5");
        assert_eq!(github.link, "https://github.com");

        let binance = registry
            .by_provider_id("2b22db5c-78d9-4d82-84f0-a9e0a4ed0470")
            .unwrap();
        assert_eq!(binance.description, "Verifies Binance KYC Level");
    }

    #[test]
    fn test_require_unknown_provider() {
        let registry = ProviderRegistry::builtin();
        assert!(matches!(
            registry.require("myspace"),
            Err(ProofError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_from_json_accepts_camel_case_provider_id() {
        let registry = ProviderRegistry::from_json(
            r#"[{"id":"github","name":"Github","domain":"github.com","link":"https://github.com",
                "providerId":"p-1","description":"GitHub"}]"#,
        )
        .unwrap();
        assert_eq!(registry.get("github").unwrap().provider_id, "p-1");
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let entry = r#"{"id":"github","name":"Github","domain":"github.com","link":"https://github.com","provider_id":"p-1","description":"GitHub"}"#;
        let json = format!("[{},{}]", entry, entry);
        assert!(ProviderRegistry::from_json(&json).is_err());
    }
}
