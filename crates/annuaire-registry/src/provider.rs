//! Registry provider trait and the company data it returns.

use crate::error::Result;
use crate::normalize::CompanyId;
use annuaire_core::{Field, FieldValues};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for company registries.
///
/// Implementations must be thread-safe (Send + Sync) so the resolver can
/// hold them behind `Arc<dyn RegistryProvider>`.
#[async_trait]
pub trait RegistryProvider: Send + Sync {
    /// Short stable identifier used in logs and errors.
    fn provider_id(&self) -> &'static str;

    /// Whether an API credential is configured. Tiers without one are skipped.
    fn has_credentials(&self) -> bool;

    /// Look up a company by its normalized identifier.
    ///
    /// # Errors
    /// Returns error on missing credentials, unknown identifiers, network
    /// failures or unparseable responses.
    async fn lookup(&self, id: &CompanyId) -> Result<CompanyFragment>;
}

/// Company attributes returned by a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyFragment {
    /// 9-digit company number
    pub siren: Option<String>,
    /// 14-digit head-office or establishment number
    pub siret: Option<String>,
    /// NAF/APE activity code
    pub naf_ape_code: Option<String>,
    /// Creation date as reported by the registry
    pub date_creation: Option<String>,
    /// Registered postal code
    pub postal_code: Option<String>,
}

impl CompanyFragment {
    /// True when the registry returned none of the attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.siren.is_none()
            && self.siret.is_none()
            && self.naf_ape_code.is_none()
            && self.date_creation.is_none()
            && self.postal_code.is_none()
    }

    /// Write the enrichment fields into `values`.
    ///
    /// Registry data wins for company identifiers; the postal code only
    /// fills in when the page did not yield one.
    pub fn apply_to(&self, values: &mut FieldValues) {
        for (field, value) in [
            (Field::Siren, &self.siren),
            (Field::Siret, &self.siret),
            (Field::NafApeCode, &self.naf_ape_code),
            (Field::DateCreation, &self.date_creation),
        ] {
            if value.is_some() {
                values.set(field, value.clone());
            }
        }
        values.set_if_absent(Field::PostalCode, self.postal_code.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fragment() {
        assert!(CompanyFragment::default().is_empty());
        let fragment = CompanyFragment {
            naf_ape_code: Some("86.21Z".to_string()),
            ..CompanyFragment::default()
        };
        assert!(!fragment.is_empty());
    }

    #[test]
    fn test_apply_to_keeps_page_postal_code() {
        let mut values = FieldValues::new();
        values.set(Field::PostalCode, Some("33000".to_string()));

        let fragment = CompanyFragment {
            siren: Some("123456789".to_string()),
            siret: Some("12345678900012".to_string()),
            naf_ape_code: Some("86.21Z".to_string()),
            date_creation: Some("2012-05-01".to_string()),
            postal_code: Some("33800".to_string()),
        };
        fragment.apply_to(&mut values);

        assert_eq!(values.get(Field::Siren), Some("123456789"));
        assert_eq!(values.get(Field::Siret), Some("12345678900012"));
        assert_eq!(values.get(Field::NafApeCode), Some("86.21Z"));
        assert_eq!(values.get(Field::DateCreation), Some("2012-05-01"));
        assert_eq!(values.get(Field::PostalCode), Some("33000"));
    }
}
