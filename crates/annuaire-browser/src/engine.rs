use crate::actions::{BrowserActions, Selector};
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use annuaire_core::BrowserConfig;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Delay between browser launch attempts.
const LAUNCH_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Polling interval while waiting for an element to disappear.
const VISIBILITY_POLL: Duration = Duration::from_millis(500);

/// Browser automation engine
///
/// Owns the Chromium process for the whole run. Pages are handed out as
/// [`BrowserTab`]s; [`BrowserEngine::close`] must be called on every exit path.
pub struct BrowserEngine {
    browser: Browser,
    handler: JoinHandle<()>,
    fingerprint: FingerprintConfig,
    navigation_timeout: Duration,
}

impl BrowserEngine {
    /// Launch Chromium, retrying up to `config.launch_attempts` times.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let attempts = config.launch_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match Self::launch_once(config).await {
                Ok(engine) => {
                    tracing::info!(
                        headless = config.headless,
                        user_agent = %engine.fingerprint.user_agent,
                        "browser launched (attempt {})",
                        attempt
                    );
                    return Ok(engine);
                }
                Err(e) => {
                    tracing::error!("Browser launch attempt {} failed: {}", attempt, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(LAUNCH_RETRY_DELAY).await;
                    }
                }
            }
        }

        Err(BrowserError::LaunchFailed(format!(
            "gave up after {attempts} attempts: {}",
            last_error.map_or_else(|| "unknown error".to_string(), |e| e.to_string())
        )))
    }

    async fn launch_once(config: &BrowserConfig) -> Result<Self> {
        let fingerprint = FingerprintConfig::randomized(config.window_width, config.window_height);

        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height)
            .args(fingerprint.launch_args())
            .args([
                "--disable-blink-features=AutomationControlled",
                "--disable-extensions",
                "--disable-dev-shm-usage",
                "--disable-features=TranslateUI",
            ]);

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        if config.disable_javascript {
            builder = builder.arg("--disable-javascript");
        }

        let chrome_config = builder.build().map_err(BrowserError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            handler,
            fingerprint,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        })
    }

    /// Open a new tab.
    pub async fn new_tab(&self) -> Result<BrowserTab> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(BrowserTab {
            page,
            navigation_timeout: self.navigation_timeout,
        })
    }

    /// Shut the browser down and wait for the process to exit.
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        closed?;
        tracing::info!("browser closed");
        Ok(())
    }
}

/// A single browser tab implementing [`BrowserActions`].
///
/// Every action is one JavaScript evaluation returning a JSON string, so CSS
/// and XPath selectors go through the same code path.
pub struct BrowserTab {
    page: Page,
    navigation_timeout: Duration,
}

impl BrowserTab {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        let raw: String = self
            .page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| BrowserError::ScriptResult(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| BrowserError::ScriptResult(e.to_string()))
    }

    /// Close the tab.
    pub async fn close(self) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserTab {
    async fn navigate(&self, url: &str) -> Result<()> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Err(_) => Err(BrowserError::Timeout(format!("navigating to {url}"))),
            Ok(Err(e)) => Err(BrowserError::NavigationError(format!("{url}: {e}"))),
            Ok(Ok(_)) => {
                tracing::debug!(url = %url, "navigated");
                Ok(())
            }
        }
    }

    async fn find_text(&self, selector: &Selector) -> Result<Option<String>> {
        let text: Option<String> = self.eval(scripts::text(selector)).await?;
        Ok(text.filter(|t| !t.is_empty()))
    }

    async fn find_links(&self, selector: &Selector) -> Result<Vec<String>> {
        self.eval(scripts::links(selector)).await
    }

    async fn exists(&self, selector: &Selector) -> Result<bool> {
        self.eval(scripts::exists(selector)).await
    }

    async fn click(&self, selector: &Selector) -> Result<()> {
        if self.eval(scripts::click(selector)).await? {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(selector.to_string()))
        }
    }

    async fn fill_field(&self, selector: &Selector, value: &str) -> Result<()> {
        match self.eval::<Option<bool>>(scripts::fill(selector, value)).await? {
            Some(true) => Ok(()),
            Some(false) => Err(BrowserError::StaleElement(format!(
                "{selector} did not keep the typed value"
            ))),
            None => Err(BrowserError::SelectorNotFound(selector.to_string())),
        }
    }

    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> Result<bool> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.eval::<bool>(scripts::exists(selector)).await? {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::debug!("{} did not render within {:?}", selector, timeout);
                return Ok(false);
            }
            tokio::time::sleep(VISIBILITY_POLL).await;
        }
    }

    async fn wait_while_visible(&self, selector: &Selector, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if !self.eval::<bool>(scripts::visible(selector)).await? {
                return Ok(());
            }
            tokio::time::sleep(VISIBILITY_POLL).await;
        }
        tracing::warn!("Timeout waiting for {} to stop displaying", selector);
        Ok(())
    }
}

/// Script builders. Each script returns `JSON.stringify(...)` of its result.
mod scripts {
    use crate::actions::Selector;

    pub fn text(selector: &Selector) -> String {
        format!(
            "(() => {{ const el = {}; return JSON.stringify(el ? (el.innerText || el.textContent || '').trim() : null); }})()",
            selector.to_js_first()
        )
    }

    pub fn links(selector: &Selector) -> String {
        format!(
            "(() => JSON.stringify({}.map(a => a.href).filter(h => !!h)))()",
            selector.to_js_all()
        )
    }

    pub fn exists(selector: &Selector) -> String {
        format!(
            "(() => JSON.stringify({} !== null))()",
            selector.to_js_first()
        )
    }

    pub fn click(selector: &Selector) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return JSON.stringify(false); \
             el.scrollIntoView({{block: 'center'}}); el.click(); return JSON.stringify(true); }})()",
            selector.to_js_first()
        )
    }

    pub fn fill(selector: &Selector, value: &str) -> String {
        let value = serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string());
        format!(
            "(() => {{ const el = {}; if (!el) return JSON.stringify(null); el.focus(); el.value = {value}; \
             el.dispatchEvent(new Event('input', {{bubbles: true}})); \
             el.dispatchEvent(new Event('change', {{bubbles: true}})); \
             return JSON.stringify(el.value === {value}); }})()",
            selector.to_js_first()
        )
    }

    pub fn visible(selector: &Selector) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return JSON.stringify(false); const s = window.getComputedStyle(el); \
             return JSON.stringify(s.display !== 'none' && s.visibility !== 'hidden' && el.getClientRects().length > 0); }})()",
            selector.to_js_first()
        )
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_scripts_stringify_results() {
            let sel = Selector::css("div.nom_prenom > a");
            for script in [
                text(&sel),
                links(&sel),
                exists(&sel),
                click(&sel),
                fill(&sel, "bordeaux"),
                visible(&sel),
            ] {
                assert!(script.starts_with("(() =>"), "{script}");
                assert!(script.contains("JSON.stringify"), "{script}");
                assert!(script.ends_with(")()"), "{script}");
            }
        }

        #[test]
        fn test_fill_escapes_value() {
            let script = fill(&Selector::css("input#q"), "Médecin \"généraliste\"");
            assert!(script.contains(r#"el.value = "Médecin \"généraliste\"""#));
        }

        #[test]
        fn test_links_reads_href() {
            let script = links(&Selector::xpath("//div[@class='nom_prenom']/a"));
            assert!(script.contains("a.href"));
            assert!(script.contains("snapshotItem"));
        }
    }
}
