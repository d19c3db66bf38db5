//! Pappers v2 provider.

use crate::common::{build_http_client, read_json, string_at};
use crate::error::{RegistryError, Result};
use crate::normalize::CompanyId;
use crate::provider::{CompanyFragment, RegistryProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

const PROVIDER: &str = "pappers";

/// Pappers API client. Authenticates with the `api_token` query parameter.
pub struct PappersProvider {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl PappersProvider {
    /// Create a provider against `base_url`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>, api_token: Option<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl RegistryProvider for PappersProvider {
    fn provider_id(&self) -> &'static str {
        PROVIDER
    }

    fn has_credentials(&self) -> bool {
        self.api_token.is_some()
    }

    async fn lookup(&self, id: &CompanyId) -> Result<CompanyFragment> {
        let api_token = self
            .api_token
            .as_deref()
            .ok_or_else(|| RegistryError::MissingCredential {
                provider: PROVIDER.to_string(),
            })?;

        tracing::debug!(siren = %id.siren, "querying Pappers");

        let response = self
            .client
            .get(format!("{}/entreprise", self.base_url))
            .query(&[("api_token", api_token), ("siren", id.siren.as_str())])
            .header("accept", "application/json")
            .send()
            .await?;

        let body = read_json(PROVIDER, &id.siren, response).await?;
        parse_company_payload(&body)
    }
}

/// Interpret an `entreprise` response.
pub(crate) fn parse_company_payload(body: &Value) -> Result<CompanyFragment> {
    if !body.is_object() || body.get("siren").is_none() {
        return Err(RegistryError::ParseError {
            provider: PROVIDER.to_string(),
            message: "response carries no 'siren'".to_string(),
        });
    }

    Ok(CompanyFragment {
        siren: string_at(body, "/siren"),
        siret: string_at(body, "/siege/siret"),
        naf_ape_code: string_at(body, "/code_naf"),
        date_creation: string_at(body, "/date_creation"),
        postal_code: string_at(body, "/siege/code_postal"),
    })
}
