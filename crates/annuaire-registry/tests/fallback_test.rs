use annuaire_registry::{
    CompanyFragment, CompanyId, Enricher, EnrichmentResolver, EnrichmentSource, RegistryError,
    RegistryProvider,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Registry double that either fails with an API error or answers with a fixed NAF code.
struct StaticRegistry {
    id: &'static str,
    naf: Option<&'static str>,
}

#[async_trait]
impl RegistryProvider for StaticRegistry {
    fn provider_id(&self) -> &'static str {
        self.id
    }

    fn has_credentials(&self) -> bool {
        true
    }

    async fn lookup(&self, id: &CompanyId) -> annuaire_registry::Result<CompanyFragment> {
        match self.naf {
            Some(naf) => Ok(CompanyFragment {
                siren: Some(id.siren.clone()),
                siret: id.siret.clone(),
                naf_ape_code: Some(naf.to_string()),
                ..CompanyFragment::default()
            }),
            None => Err(RegistryError::ApiError {
                provider: self.id.to_string(),
                status: 500,
                message: "internal error".to_string(),
            }),
        }
    }
}

fn resolver(primary: Option<&'static str>, secondary: Option<&'static str>) -> EnrichmentResolver {
    EnrichmentResolver::new(
        Arc::new(StaticRegistry { id: "primary", naf: primary }),
        Arc::new(StaticRegistry { id: "secondary", naf: secondary }),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn test_secondary_answers_when_primary_fails() {
    let result = resolver(None, Some("86.21Z"))
        .resolve(Some("123 456 789 00012"))
        .await;

    assert_eq!(result.source, EnrichmentSource::Secondary);
    assert_eq!(result.provider, Some("secondary"));
    assert_eq!(result.fragment.naf_ape_code.as_deref(), Some("86.21Z"));
    assert_eq!(result.fragment.siren.as_deref(), Some("123456789"));
    assert_eq!(result.fragment.siret.as_deref(), Some("12345678900012"));
}

#[tokio::test]
async fn test_both_tiers_failing_is_not_an_error() {
    let result = resolver(None, None).resolve(Some("123456789")).await;

    assert_eq!(result.source, EnrichmentSource::None);
    assert!(result.provider.is_none());
    assert!(result.fragment.is_empty());
}
