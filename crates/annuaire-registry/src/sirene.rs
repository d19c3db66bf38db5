//! INSEE Sirene 3.11 provider.
//!
//! A full SIRET goes to the establishment endpoint, anything else to the
//! company endpoint. The API key travels in `X-INSEE-Api-Key-Integration`.

use crate::common::{build_http_client, read_json, string_at};
use crate::error::{RegistryError, Result};
use crate::normalize::CompanyId;
use crate::provider::{CompanyFragment, RegistryProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

const PROVIDER: &str = "sirene";

const SIRET_FIELDS: &str =
    "siren,siret,dateCreationEtablissement,activitePrincipaleUniteLegale,codePostalEtablissement";
const SIREN_FIELDS: &str = "siren,dateCreationUniteLegale,activitePrincipaleUniteLegale";

/// Sirene API client.
pub struct SireneProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SireneProvider {
    /// Create a provider against `base_url`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl RegistryProvider for SireneProvider {
    fn provider_id(&self) -> &'static str {
        PROVIDER
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn lookup(&self, id: &CompanyId) -> Result<CompanyFragment> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RegistryError::MissingCredential {
                provider: PROVIDER.to_string(),
            })?;

        let (url, fields) = match &id.siret {
            Some(siret) => (format!("{}/siret/{siret}", self.base_url), SIRET_FIELDS),
            None => (format!("{}/siren/{}", self.base_url, id.siren), SIREN_FIELDS),
        };

        tracing::debug!(identifier = %id, "querying Sirene");

        let response = self
            .client
            .get(&url)
            .query(&[("champs", fields)])
            .header("accept", "application/json")
            .header("X-INSEE-Api-Key-Integration", api_key)
            .send()
            .await?;

        let body = read_json(PROVIDER, &id.to_string(), response).await?;

        if id.siret.is_some() {
            parse_siret_payload(&body)
        } else {
            parse_siren_payload(&body)
        }
    }
}

fn parse_error(message: &str) -> RegistryError {
    RegistryError::ParseError {
        provider: PROVIDER.to_string(),
        message: message.to_string(),
    }
}

/// Interpret a `siret/{siret}` response.
pub(crate) fn parse_siret_payload(body: &Value) -> Result<CompanyFragment> {
    let etab = body
        .get("etablissement")
        .filter(|v| v.is_object())
        .ok_or_else(|| parse_error("missing 'etablissement' object"))?;

    Ok(CompanyFragment {
        siren: string_at(etab, "/siren"),
        siret: string_at(etab, "/siret"),
        naf_ape_code: string_at(etab, "/uniteLegale/activitePrincipaleUniteLegale"),
        date_creation: string_at(etab, "/dateCreationEtablissement"),
        postal_code: string_at(etab, "/adresseEtablissement/codePostalEtablissement")
            .or_else(|| string_at(etab, "/codePostalEtablissement")),
    })
}

/// Interpret a `siren/{siren}` response.
///
/// `periodesUniteLegale` is a list (most recent first) on the live API but
/// has been seen as a single object.
pub(crate) fn parse_siren_payload(body: &Value) -> Result<CompanyFragment> {
    let unit = body
        .get("uniteLegale")
        .filter(|v| v.is_object())
        .ok_or_else(|| parse_error("missing 'uniteLegale' object"))?;

    let naf_ape_code = match unit.get("periodesUniteLegale") {
        Some(Value::Array(periods)) => periods
            .first()
            .and_then(|p| string_at(p, "/activitePrincipaleUniteLegale")),
        Some(period @ Value::Object(_)) => string_at(period, "/activitePrincipaleUniteLegale"),
        _ => None,
    }
    .or_else(|| string_at(unit, "/activitePrincipaleUniteLegale"));

    Ok(CompanyFragment {
        siren: string_at(unit, "/siren"),
        siret: None,
        naf_ape_code,
        date_creation: string_at(unit, "/dateCreationUniteLegale"),
        postal_code: None,
    })
}
