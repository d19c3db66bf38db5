//! In-memory stand-ins for the browser and the registries.

#![allow(dead_code)]

use annuaire_browser::{BrowserActions, BrowserError, Selector};
use annuaire_core::{Field, FieldValues, RppsNumber, StructuredRecord, ProfileRecord};
use annuaire_harvest::{DoneSet, ProcessedProfile, ProfileFailure, ProfileOutcome, ProfileSource, HarvestError};
use annuaire_registry::{CompanyFragment, Enricher, EnrichmentResult, EnrichmentSource};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A static page: text per selector, links, and click targets.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub texts: HashMap<Selector, String>,
    pub present: HashSet<Selector>,
    pub links: Vec<String>,
    pub clicks: HashMap<Selector, String>,
    /// Reads of these selectors fail with the given error
    pub read_errors: HashMap<Selector, ErrorFactory>,
    /// Reads of these selectors return nothing for the first `n` calls
    pub render_after: HashMap<Selector, u32>,
}

impl FakePage {
    pub fn text(mut self, selector: Selector, value: &str) -> Self {
        self.texts.insert(selector, value.to_string());
        self
    }

    pub fn present(mut self, selector: Selector) -> Self {
        self.present.insert(selector);
        self
    }

    pub fn links(mut self, links: &[&str]) -> Self {
        self.links = links.iter().map(|l| (*l).to_string()).collect();
        self
    }

    pub fn on_click(mut self, selector: Selector, target: &str) -> Self {
        self.clicks.insert(selector, target.to_string());
        self
    }

    pub fn fail_read(mut self, selector: Selector, error: ErrorFactory) -> Self {
        self.read_errors.insert(selector, error);
        self
    }

    pub fn render_after(mut self, selector: Selector, reads: u32) -> Self {
        self.render_after.insert(selector, reads);
        self
    }

    fn has(&self, selector: &Selector) -> bool {
        self.texts.contains_key(selector)
            || self.present.contains(selector)
            || self.clicks.contains_key(selector)
    }
}

type ErrorFactory = fn() -> BrowserError;

/// A site made of [`FakePage`]s. Each [`FakeBrowser::tab`] shares the pages
/// but keeps its own current URL.
#[derive(Clone, Default)]
pub struct FakeSite {
    pages: Arc<Mutex<HashMap<String, FakePage>>>,
    navigation_errors: Arc<Mutex<HashMap<String, ErrorFactory>>>,
    pub navigations: Arc<Mutex<Vec<String>>>,
    pub filled: Arc<Mutex<Vec<(Selector, String)>>>,
    reads: Arc<Mutex<HashMap<Selector, u32>>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, page: FakePage) {
        self.pages.lock().unwrap().insert(url.to_string(), page);
    }

    pub fn fail_navigation(&self, url: &str, error: ErrorFactory) {
        self.navigation_errors
            .lock()
            .unwrap()
            .insert(url.to_string(), error);
    }

    pub fn tab(&self) -> Arc<FakeBrowser> {
        Arc::new(FakeBrowser {
            site: self.clone(),
            current: Mutex::new(None),
        })
    }

    pub fn read_count(&self, selector: &Selector) -> u32 {
        self.reads.lock().unwrap().get(selector).copied().unwrap_or(0)
    }

    pub fn navigation_count(&self, url: &str) -> usize {
        self.navigations
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

pub struct FakeBrowser {
    site: FakeSite,
    current: Mutex<Option<String>>,
}

impl FakeBrowser {
    fn with_page<T>(&self, f: impl FnOnce(&FakePage) -> T) -> Result<T, BrowserError> {
        let current = self.current.lock().unwrap().clone();
        let url = current.ok_or_else(|| BrowserError::NavigationError("no page loaded".into()))?;
        let pages = self.site.pages.lock().unwrap();
        let page = pages
            .get(&url)
            .ok_or_else(|| BrowserError::NavigationError(format!("404 {url}")))?;
        Ok(f(page))
    }
}

#[async_trait]
impl BrowserActions for FakeBrowser {
    async fn navigate(&self, url: &str) -> annuaire_browser::Result<()> {
        self.site.navigations.lock().unwrap().push(url.to_string());
        if let Some(error) = self.site.navigation_errors.lock().unwrap().get(url) {
            return Err(error());
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn find_text(&self, selector: &Selector) -> annuaire_browser::Result<Option<String>> {
        let read = {
            let mut reads = self.site.reads.lock().unwrap();
            let n = reads.entry(selector.clone()).or_insert(0);
            *n += 1;
            *n
        };
        self.with_page(|page| {
            if let Some(error) = page.read_errors.get(selector) {
                return Err(error());
            }
            if page.render_after.get(selector).is_some_and(|after| read <= *after) {
                return Ok(None);
            }
            Ok(page.texts.get(selector).cloned())
        })?
    }

    async fn find_links(&self, selector: &Selector) -> annuaire_browser::Result<Vec<String>> {
        let _ = selector;
        self.with_page(|page| page.links.clone())
    }

    async fn exists(&self, selector: &Selector) -> annuaire_browser::Result<bool> {
        self.with_page(|page| page.has(selector))
    }

    async fn click(&self, selector: &Selector) -> annuaire_browser::Result<()> {
        let outcome = self.with_page(|page| (page.has(selector), page.clicks.get(selector).cloned()))?;
        match outcome {
            (_, Some(target)) => {
                *self.current.lock().unwrap() = Some(target);
                Ok(())
            }
            (true, None) => Ok(()),
            (false, None) => Err(BrowserError::SelectorNotFound(selector.to_string())),
        }
    }

    async fn fill_field(&self, selector: &Selector, value: &str) -> annuaire_browser::Result<()> {
        if !self.with_page(|page| page.has(selector))? {
            return Err(BrowserError::SelectorNotFound(selector.to_string()));
        }
        self.site
            .filled
            .lock()
            .unwrap()
            .push((selector.clone(), value.to_string()));
        Ok(())
    }

    async fn wait_for(&self, selector: &Selector, _timeout: Duration) -> annuaire_browser::Result<bool> {
        self.with_page(|page| page.has(selector))
    }

    async fn wait_while_visible(&self, _selector: &Selector, _timeout: Duration) -> annuaire_browser::Result<()> {
        Ok(())
    }
}

/// Enricher answering a fixed fragment for one identifier.
pub struct FakeEnricher {
    pub answers: HashMap<String, CompanyFragment>,
    pub calls: Mutex<Vec<Option<String>>>,
}

impl FakeEnricher {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            answers: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(raw: &str, fragment: CompanyFragment) -> Arc<Self> {
        Arc::new(Self {
            answers: HashMap::from([(raw.to_string(), fragment)]),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Enricher for FakeEnricher {
    async fn resolve(&self, raw: Option<&str>) -> EnrichmentResult {
        self.calls.lock().unwrap().push(raw.map(str::to_string));
        match raw.and_then(|r| self.answers.get(r)) {
            Some(fragment) => EnrichmentResult {
                source: EnrichmentSource::Primary,
                provider: Some("fake"),
                fragment: fragment.clone(),
            },
            None => EnrichmentResult::none(),
        }
    }
}

/// Scripted outcome for [`ScriptedProfiles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Succeed,
    FailOnce,
    AlwaysFail,
    NoInformation,
}

/// Profile source that derives the RPPS from the last URL segment.
pub struct ScriptedProfiles {
    scripts: HashMap<String, Script>,
    pub calls: Mutex<HashMap<String, u32>>,
    /// Cancelled after this many successes, when set
    pub cancel_after: Option<(u32, tokio_util::sync::CancellationToken)>,
    successes: Mutex<u32>,
}

impl ScriptedProfiles {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
            cancel_after: None,
            successes: Mutex::new(0),
        }
    }

    pub fn script(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    pub fn calls_for(&self, url: &str) -> u32 {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

pub fn rpps_of(url: &str) -> String {
    url.rsplit('/').next().unwrap_or_default().to_string()
}

pub fn profile_for(url: &str) -> ProcessedProfile {
    let rpps = RppsNumber::new(rpps_of(url)).unwrap();
    let mut values = FieldValues::new();
    values.set(Field::Name, Some(format!("Dr {}", rpps.as_str())));
    values.set(Field::RppsNumber, Some(rpps.as_str().to_string()));
    values.set(Field::SourceUrl, Some(url.to_string()));
    ProcessedProfile {
        rpps,
        record: StructuredRecord::from_values(&values),
        flat: ProfileRecord::from_values(&values),
        enrichment: EnrichmentSource::None,
    }
}

#[async_trait]
impl ProfileSource for ScriptedProfiles {
    async fn process(&self, url: &str, _done: &DoneSet) -> ProfileOutcome {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(url.to_string()).or_insert(0);
            *n += 1;
            *n
        };

        let script = self.scripts.get(url).copied().unwrap_or(Script::Succeed);
        let fail = match script {
            Script::Succeed => false,
            Script::FailOnce => call == 1,
            Script::AlwaysFail => true,
            Script::NoInformation => {
                return ProfileOutcome::Skip {
                    url: url.to_string(),
                    reason: annuaire_harvest::SkipReason::NoInformation,
                    rpps: Some(rpps_of(url)),
                }
            }
        };

        if fail {
            return ProfileOutcome::Failure(ProfileFailure {
                url: url.to_string(),
                rpps: None,
                cause: HarvestError::SearchFailed("scripted failure".to_string()),
            });
        }

        let successes = {
            let mut n = self.successes.lock().unwrap();
            *n += 1;
            *n
        };
        if let Some((limit, token)) = &self.cancel_after {
            if successes >= *limit {
                token.cancel();
            }
        }
        ProfileOutcome::Success(Box::new(profile_for(url)))
    }
}

/// Candidate source serving fixed pages.
pub struct StaticPages {
    pages: std::collections::VecDeque<Vec<String>>,
}

impl StaticPages {
    pub fn new(pages: &[&[&str]]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|page| page.iter().map(|u| (*u).to_string()).collect())
                .collect(),
        }
    }
}

#[async_trait]
impl annuaire_harvest::CandidateSource for StaticPages {
    async fn next_batch(&mut self) -> annuaire_harvest::Result<Option<Vec<String>>> {
        Ok(self.pages.pop_front())
    }
}
