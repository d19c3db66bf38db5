//! End-to-end harvest of one search scope.

use crate::error::Result;
use crate::orchestrator::{Orchestrator, RunSummary};
use crate::pager::SearchPager;
use crate::processor::ProfileProcessor;
use crate::scope::ScopePaths;
use annuaire_browser::{BrowserActions, BrowserEngine, RetryPolicy};
use annuaire_core::{AppConfig, SearchScope};
use annuaire_registry::{Enricher, EnrichmentResolver};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run a full harvest for the configured scope.
///
/// Finalization (browser closed, store flushed, outputs aggregated) happens
/// on every path. A fatal error is reported in [`RunSummary::fatal`]; `Err`
/// is only returned when the scope's files cannot be opened or aggregated.
pub async fn harvest(config: &AppConfig, cancel: CancellationToken) -> Result<RunSummary> {
    let scope = SearchScope::new(&config.search.keyword, &config.search.location)?;
    let paths = ScopePaths::from_config(&config.general, &scope);

    tracing::info!(
        scope = %scope,
        store = %paths.store.display(),
        "Starting harvest"
    );

    let mut orchestrator = Orchestrator::open(paths, config.retry.profile_attempts, cancel)?;

    let fatal = run_with_browser(config, scope, &mut orchestrator).await.err();
    if let Some(e) = &fatal {
        tracing::error!("Fatal error in harvest: {}", e);
        orchestrator.interrupt();
    }

    let mut summary = orchestrator.finalize()?;
    summary.fatal = fatal;
    Ok(summary)
}

async fn run_with_browser(
    config: &AppConfig,
    scope: SearchScope,
    orchestrator: &mut Orchestrator,
) -> Result<()> {
    let enricher: Arc<dyn Enricher> = Arc::new(EnrichmentResolver::from_config(&config.enrichment)?);
    let engine = BrowserEngine::launch(&config.browser).await?;

    let result = drive(&engine, config, scope, enricher, orchestrator).await;

    if let Err(e) = engine.close().await {
        tracing::warn!("Error closing browser: {}", e);
    }
    result
}

async fn drive(
    engine: &BrowserEngine,
    config: &AppConfig,
    scope: SearchScope,
    enricher: Arc<dyn Enricher>,
    orchestrator: &mut Orchestrator,
) -> Result<()> {
    let policy = RetryPolicy::from_config(&config.retry);
    let loading_timeout = Duration::from_secs(config.browser.loading_timeout_secs);

    let listing: Arc<dyn BrowserActions> = Arc::new(engine.new_tab().await?);
    let profiles: Arc<dyn BrowserActions> = Arc::new(engine.new_tab().await?);

    let mut pager = SearchPager::new(
        listing,
        scope,
        config.search.start_url.clone(),
        policy,
        loading_timeout,
        config.search.max_pages,
    );
    let processor = ProfileProcessor::new(profiles, enricher, policy, loading_timeout);

    orchestrator.run(&mut pager, &processor).await
}
