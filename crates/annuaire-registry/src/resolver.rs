//! Two-tier enrichment with bounded lookups.

use crate::error::{RegistryError, Result};
use crate::normalize::CompanyId;
use crate::pappers::PappersProvider;
use crate::provider::{CompanyFragment, RegistryProvider};
use crate::sirene::SireneProvider;
use annuaire_core::{EnrichmentConfig, TierOrder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Which tier produced an enrichment result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentSource {
    /// First tier answered
    Primary,
    /// First tier failed, fallback answered
    Secondary,
    /// No identifier, or both tiers failed
    None,
}

/// Outcome of enriching one identifier. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentResult {
    /// Tier tag
    pub source: EnrichmentSource,
    /// Provider that answered, if any
    pub provider: Option<&'static str>,
    /// Company attributes; all null when `source` is `None`
    pub fragment: CompanyFragment,
}

impl EnrichmentResult {
    /// Empty result tagged `none`.
    #[must_use]
    pub fn none() -> Self {
        Self {
            source: EnrichmentSource::None,
            provider: None,
            fragment: CompanyFragment::default(),
        }
    }

    /// Whether any tier answered.
    #[must_use]
    pub fn is_enriched(&self) -> bool {
        self.source != EnrichmentSource::None
    }
}

/// Anything that can turn a raw company identifier into registry data.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Resolve `raw`. Absent or unusable identifiers yield [`EnrichmentResult::none`].
    async fn resolve(&self, raw: Option<&str>) -> EnrichmentResult;
}

/// Resolver that tries a primary registry, then a secondary one.
pub struct EnrichmentResolver {
    primary: Arc<dyn RegistryProvider>,
    secondary: Arc<dyn RegistryProvider>,
    timeout: Duration,
}

impl EnrichmentResolver {
    /// Create a resolver over two providers with a per-lookup bound.
    #[must_use]
    pub fn new(
        primary: Arc<dyn RegistryProvider>,
        secondary: Arc<dyn RegistryProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            timeout,
        }
    }

    /// Build the Sirene and Pappers tiers in the configured order.
    ///
    /// # Errors
    /// Returns error if an HTTP client cannot be created.
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self> {
        let sirene: Arc<dyn RegistryProvider> = Arc::new(SireneProvider::new(
            config.sirene_base_url.clone(),
            config.sirene_api_key.clone(),
            config.timeout_secs,
        )?);
        let pappers: Arc<dyn RegistryProvider> = Arc::new(PappersProvider::new(
            config.pappers_base_url.clone(),
            config.pappers_api_key.clone(),
            config.timeout_secs,
        )?);

        let (primary, secondary) = match config.tier_order {
            TierOrder::SireneFirst => (sirene, pappers),
            TierOrder::PappersFirst => (pappers, sirene),
        };

        for provider in [&primary, &secondary] {
            if !provider.has_credentials() {
                tracing::warn!(
                    "No API key for {}; that enrichment tier is disabled",
                    provider.provider_id()
                );
            }
        }

        Ok(Self::new(
            primary,
            secondary,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    /// Provider ids in lookup order.
    #[must_use]
    pub fn tiers(&self) -> [&'static str; 2] {
        [self.primary.provider_id(), self.secondary.provider_id()]
    }

    async fn try_tier(&self, provider: &dyn RegistryProvider, id: &CompanyId) -> Result<CompanyFragment> {
        let name = provider.provider_id();
        if !provider.has_credentials() {
            return Err(RegistryError::MissingCredential {
                provider: name.to_string(),
            });
        }

        let fragment = tokio::time::timeout(self.timeout, provider.lookup(id))
            .await
            .map_err(|_| RegistryError::Timeout {
                provider: name.to_string(),
                seconds: self.timeout.as_secs(),
            })??;

        if fragment.is_empty() {
            return Err(RegistryError::NotFound {
                provider: name.to_string(),
                identifier: id.to_string(),
            });
        }
        Ok(fragment)
    }
}

#[async_trait]
impl Enricher for EnrichmentResolver {
    async fn resolve(&self, raw: Option<&str>) -> EnrichmentResult {
        let Some(id) = raw.and_then(CompanyId::parse) else {
            tracing::debug!("No usable company identifier; enrichment skipped");
            return EnrichmentResult::none();
        };

        let tiers = [
            (EnrichmentSource::Primary, &self.primary),
            (EnrichmentSource::Secondary, &self.secondary),
        ];

        for (source, provider) in tiers {
            match self.try_tier(provider.as_ref(), &id).await {
                Ok(fragment) => {
                    tracing::debug!(
                        identifier = %id,
                        provider = provider.provider_id(),
                        "enrichment resolved"
                    );
                    return EnrichmentResult {
                        source,
                        provider: Some(provider.provider_id()),
                        fragment,
                    };
                }
                Err(RegistryError::MissingCredential { provider }) => {
                    tracing::debug!("Skipping {} tier: no credential", provider);
                }
                Err(e) => {
                    tracing::warn!(identifier = %id, "Enrichment tier failed: {}", e);
                }
            }
        }

        EnrichmentResult::none()
    }
}
