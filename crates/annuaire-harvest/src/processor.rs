//! Extraction of one profile page into a record.

use crate::address::{label_value, postal_code_and_city};
use crate::done_set::DoneSet;
use crate::error::{HarvestError, Result};
use crate::site::{field_selector, SiteSelectors};
use annuaire_browser::{
    with_retry, BrowserActions, BrowserError, InteractionFailure, RetryPolicy, Selector,
};
use annuaire_core::{
    Field, FieldValues, ProfileRecord, RppsNumber, StructuredRecord, Timestamp,
};
use annuaire_registry::{normalize, normalize_siret, Enricher, EnrichmentSource};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A fully extracted profile, ready to be recorded.
#[derive(Debug, Clone)]
pub struct ProcessedProfile {
    /// Identity key
    pub rpps: RppsNumber,
    /// Nested record appended to the store
    pub record: StructuredRecord,
    /// Flat rendering of the same values
    pub flat: ProfileRecord,
    /// Which registry tier supplied company data
    pub enrichment: EnrichmentSource,
}

/// Why a profile was deliberately not recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The page shows no identifier
    MissingIdentity,
    /// The identifier was found in the done-set after the page loaded
    AlreadyProcessed,
    /// The site's "no information" marker is displayed
    NoInformation,
    /// A non-retryable interaction failure
    Unreachable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentity => write!(f, "no RPPS number on page"),
            Self::AlreadyProcessed => write!(f, "already processed"),
            Self::NoInformation => write!(f, "no information published"),
            Self::Unreachable(cause) => write!(f, "unreachable: {cause}"),
        }
    }
}

/// A profile that could not be processed.
#[derive(Debug)]
pub struct ProfileFailure {
    /// Profile URL
    pub url: String,
    /// Identifier, if it was read before the failure
    pub rpps: Option<String>,
    /// What went wrong
    pub cause: HarvestError,
}

/// Tagged result of processing one candidate.
#[derive(Debug)]
pub enum ProfileOutcome {
    /// Record extracted
    Success(Box<ProcessedProfile>),
    /// Deliberately not recorded
    Skip {
        /// Profile URL
        url: String,
        /// Why
        reason: SkipReason,
        /// Identifier, marked done by the caller when known
        rpps: Option<String>,
    },
    /// Processing failed; the caller may try again
    Failure(ProfileFailure),
}

impl ProfileOutcome {
    fn skip(url: &str, reason: SkipReason, rpps: Option<&RppsNumber>) -> Self {
        Self::Skip {
            url: url.to_string(),
            reason,
            rpps: rpps.map(|r| r.as_str().to_string()),
        }
    }
}

/// Anything that turns a candidate URL into a [`ProfileOutcome`].
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Process one profile. Never fails: errors become [`ProfileOutcome::Failure`].
    async fn process(&self, url: &str, done: &DoneSet) -> ProfileOutcome;
}

/// Browser-driven profile extractor.
pub struct ProfileProcessor {
    browser: Arc<dyn BrowserActions>,
    enricher: Arc<dyn Enricher>,
    selectors: SiteSelectors,
    policy: RetryPolicy,
    loading_timeout: Duration,
}

impl ProfileProcessor {
    /// Create a processor working in its own browser tab.
    #[must_use]
    pub fn new(
        browser: Arc<dyn BrowserActions>,
        enricher: Arc<dyn Enricher>,
        policy: RetryPolicy,
        loading_timeout: Duration,
    ) -> Self {
        Self {
            browser,
            enricher,
            selectors: SiteSelectors::default(),
            policy,
            loading_timeout,
        }
    }

    /// Override the site selectors.
    #[must_use]
    pub fn with_selectors(mut self, selectors: SiteSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    async fn read(&self, what: &str, selector: &Selector) -> std::result::Result<Option<String>, InteractionFailure> {
        with_retry(&self.policy, what, || self.browser.find_text(selector)).await
    }

    /// Read a field that may legitimately be missing. Failures become null.
    async fn read_optional(&self, what: &str, selector: &Selector) -> Option<String> {
        match self.read(what, selector).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Could not read {}: {}", what, e);
                None
            }
        }
    }

    async fn extract(&self, url: &str, done: &DoneSet, rpps_slot: &mut Option<RppsNumber>) -> Result<ProfileOutcome> {
        match with_retry(&self.policy, "open profile", || self.browser.navigate(url)).await {
            Ok(()) => {}
            Err(failure @ InteractionFailure::Terminal { .. }) => {
                return Ok(ProfileOutcome::skip(
                    url,
                    SkipReason::Unreachable(failure.to_string()),
                    None,
                ));
            }
            Err(failure) => return Err(failure.into()),
        }

        if let Err(e) = self
            .browser
            .wait_while_visible(&self.selectors.loading, self.loading_timeout)
            .await
        {
            tracing::warn!(url = %url, "Loading indicator check failed: {}", e);
        }

        let rpps = match self.read_rpps().await {
            Ok(Some(rpps)) => rpps,
            Ok(None) => return Ok(ProfileOutcome::skip(url, SkipReason::MissingIdentity, None)),
            Err(failure @ InteractionFailure::Terminal { .. }) => {
                return Ok(ProfileOutcome::skip(
                    url,
                    SkipReason::Unreachable(failure.to_string()),
                    None,
                ));
            }
            Err(failure) => {
                tracing::warn!(url = %url, "No RPPS number after retries: {}", failure);
                return Ok(ProfileOutcome::skip(url, SkipReason::MissingIdentity, None));
            }
        };
        *rpps_slot = Some(rpps.clone());

        if done.is_done(rpps.as_str()) {
            return Ok(ProfileOutcome::skip(url, SkipReason::AlreadyProcessed, Some(&rpps)));
        }

        let no_information = with_retry(&self.policy, "check no-information marker", || {
            self.browser.exists(&self.selectors.no_information)
        })
        .await?;
        if no_information {
            return Ok(ProfileOutcome::skip(url, SkipReason::NoInformation, Some(&rpps)));
        }

        let mut values = FieldValues::new();
        values.set(Field::RppsNumber, Some(rpps.as_str().to_string()));

        for field in Field::ALL {
            if field == Field::RppsNumber {
                continue;
            }
            if let Some(selector) = field_selector(field) {
                let text = self.read_optional(field.key(), &selector).await;
                values.set(field, text);
            }
        }

        if let Some(line) = self
            .read_optional("finess address", &self.selectors.finess_address)
            .await
        {
            if let Some((postal_code, city)) = postal_code_and_city(&line) {
                values.set(Field::PostalCode, Some(postal_code));
                values.set(Field::City, Some(city));
            }
        }

        let company_id = self
            .read_optional("company id", &self.selectors.company_id)
            .await;
        let enrichment = self.enricher.resolve(company_id.as_deref()).await;
        enrichment.fragment.apply_to(&mut values);
        if let Some(raw) = company_id.as_deref() {
            values.set_if_absent(Field::Siren, normalize(raw));
            values.set_if_absent(Field::Siret, normalize_siret(raw));
        }

        values.set(Field::SourceUrl, Some(url.to_string()));
        values.set(Field::ScrapedAt, Some(Timestamp::now().to_rfc3339()));

        Ok(ProfileOutcome::Success(Box::new(ProcessedProfile {
            rpps,
            record: StructuredRecord::from_values(&values),
            flat: ProfileRecord::from_values(&values),
            enrichment: enrichment.source,
        })))
    }

    /// RPPS from the `"N° RPPS : value"` line. A bare number is accepted too.
    ///
    /// The element is required: until it renders, reads fail transiently and
    /// go through the retry policy.
    async fn read_rpps(&self) -> std::result::Result<Option<RppsNumber>, InteractionFailure> {
        let Some(selector) = field_selector(Field::RppsNumber) else {
            return Ok(None);
        };

        match self.browser.wait_for(&selector, self.loading_timeout).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("RPPS element not rendered within {:?}", self.loading_timeout),
            Err(e) => tracing::warn!("Waiting for the RPPS element failed: {}", e),
        }

        let browser = &self.browser;
        let selector = &selector;
        let text = with_retry(&self.policy, Field::RppsNumber.key(), || async move {
            browser
                .find_text(selector)
                .await?
                .ok_or_else(|| BrowserError::SelectorNotFound(selector.to_string()))
        })
        .await?;

        let candidate = label_value(&text).unwrap_or_else(|| text.trim().to_string());
        match RppsNumber::new(&candidate) {
            Ok(rpps) => Ok(Some(rpps)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable RPPS text '{}': {}", text, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ProfileSource for ProfileProcessor {
    async fn process(&self, url: &str, done: &DoneSet) -> ProfileOutcome {
        let mut rpps = None;
        match self.extract(url, done, &mut rpps).await {
            Ok(outcome) => outcome,
            Err(cause) => ProfileOutcome::Failure(ProfileFailure {
                url: url.to_string(),
                rpps: rpps.map(|r| r.as_str().to_string()),
                cause,
            }),
        }
    }
}
