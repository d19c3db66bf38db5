//! Search submission and result-page enumeration.

use crate::error::{HarvestError, Result};
use crate::site::SiteSelectors;
use annuaire_browser::{with_retry, BrowserActions, RetryPolicy};
use annuaire_core::SearchScope;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A paged source of candidate profile URLs.
#[async_trait]
pub trait CandidateSource: Send {
    /// URLs of the next result page, or `None` once there are no more pages.
    ///
    /// # Errors
    /// Returns error only when enumeration cannot start at all.
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagerState {
    Unsubmitted,
    OnPage,
    Exhausted,
}

/// Drives the directory search form and follows "next page" links.
pub struct SearchPager {
    browser: Arc<dyn BrowserActions>,
    selectors: SiteSelectors,
    policy: RetryPolicy,
    loading_timeout: Duration,
    start_url: String,
    scope: SearchScope,
    max_pages: u32,
    page: u32,
    state: PagerState,
}

impl SearchPager {
    /// Create a pager for `scope`. `max_pages == 0` means no cap.
    #[must_use]
    pub fn new(
        browser: Arc<dyn BrowserActions>,
        scope: SearchScope,
        start_url: impl Into<String>,
        policy: RetryPolicy,
        loading_timeout: Duration,
        max_pages: u32,
    ) -> Self {
        Self {
            browser,
            selectors: SiteSelectors::default(),
            policy,
            loading_timeout,
            start_url: start_url.into(),
            scope,
            max_pages,
            page: 0,
            state: PagerState::Unsubmitted,
        }
    }

    /// Override the site selectors.
    #[must_use]
    pub fn with_selectors(mut self, selectors: SiteSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Result pages visited so far.
    #[must_use]
    pub fn pages_visited(&self) -> u32 {
        self.page
    }

    async fn wait_for_load(&self) {
        if let Err(e) = self
            .browser
            .wait_while_visible(&self.selectors.loading, self.loading_timeout)
            .await
        {
            tracing::warn!("Loading indicator check failed: {}", e);
        }
    }

    async fn submit_search(&self) -> Result<()> {
        let fatal = |e: annuaire_browser::InteractionFailure| HarvestError::SearchFailed(e.to_string());

        with_retry(&self.policy, "open search page", || {
            self.browser.navigate(&self.start_url)
        })
        .await
        .map_err(fatal)?;

        tracing::info!(url = %self.start_url, "At search page");

        if let Err(e) = with_retry(&RetryPolicy::once(), "focus search form", || {
            self.browser.click(&self.selectors.search_submit)
        })
        .await
        {
            tracing::warn!("Initial search focus click failed: {}", e);
        }

        with_retry(&self.policy, "fill keyword", || {
            self.browser
                .fill_field(&self.selectors.keyword_input, &self.scope.keyword)
        })
        .await
        .map_err(fatal)?;

        if !self.scope.location.is_empty() {
            with_retry(&self.policy, "fill location", || {
                self.browser
                    .fill_field(&self.selectors.location_input, &self.scope.location)
            })
            .await
            .map_err(fatal)?;
        }

        with_retry(&self.policy, "submit search", || {
            self.browser.click(&self.selectors.search_submit)
        })
        .await
        .map_err(fatal)?;

        tracing::info!(scope = %self.scope, "Search submitted");
        self.wait_for_load().await;
        Ok(())
    }

    /// Move to the next result page. `false` when there is none.
    async fn advance(&mut self) -> bool {
        if self.max_pages > 0 && self.page >= self.max_pages {
            tracing::info!("Reached the page cap ({} pages)", self.max_pages);
            return false;
        }

        let has_next = match with_retry(&self.policy, "look for next page", || {
            self.browser.exists(&self.selectors.next_page)
        })
        .await
        {
            Ok(has_next) => has_next,
            Err(e) => {
                tracing::warn!("Could not check for a next page: {}", e);
                false
            }
        };
        if !has_next {
            tracing::info!("No more pages to process");
            return false;
        }

        tracing::info!("Navigating to next page (current index {})", self.page);
        if let Err(e) = with_retry(&self.policy, "click next page", || {
            self.browser.click(&self.selectors.next_page)
        })
        .await
        {
            tracing::error!("Failed to open page {}: {}", self.page + 1, e);
            return false;
        }

        self.wait_for_load().await;
        true
    }
}

#[async_trait]
impl CandidateSource for SearchPager {
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
        match self.state {
            PagerState::Exhausted => return Ok(None),
            PagerState::Unsubmitted => {
                self.submit_search().await?;
                self.state = PagerState::OnPage;
            }
            PagerState::OnPage => {
                if !self.advance().await {
                    self.state = PagerState::Exhausted;
                    return Ok(None);
                }
            }
        }
        self.page += 1;

        let links = match with_retry(&self.policy, "collect result links", || {
            self.browser.find_links(&self.selectors.result_links)
        })
        .await
        {
            Ok(links) => links,
            Err(e) => {
                tracing::error!("Failed retrieving result links on page {}: {}", self.page, e);
                Vec::new()
            }
        };

        if links.is_empty() {
            tracing::info!("No results found on page {}; ending pagination", self.page);
            self.state = PagerState::Exhausted;
            return Ok(None);
        }

        tracing::info!("Page {}: found {} profile links", self.page, links.len());
        Ok(Some(links))
    }
}
