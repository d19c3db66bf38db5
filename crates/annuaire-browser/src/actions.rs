use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Element locator understood by every [`BrowserActions`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Selector {
    /// CSS selector, e.g. `div.rpps > span`
    Css(String),
    /// XPath expression, e.g. `//span[contains(text(), 'Fax')]`
    XPath(String),
}

impl Selector {
    pub fn css(s: impl Into<String>) -> Self {
        Self::Css(s.into())
    }

    pub fn xpath(s: impl Into<String>) -> Self {
        Self::XPath(s.into())
    }

    /// XPath to the value span that follows a label span containing `label`.
    ///
    /// The directory renders most fields as `<span>Label</span><span>value</span>`.
    pub fn labelled(label: &str) -> Self {
        Self::XPath(format!(
            "//span[contains(text(), '{label}')]/following-sibling::span[1]"
        ))
    }

    /// JavaScript expression evaluating to the first matching element or `null`.
    #[must_use]
    pub fn to_js_first(&self) -> String {
        match self {
            Self::Css(css) => format!("document.querySelector({})", js_string(css)),
            Self::XPath(xpath) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(xpath)
            ),
        }
    }

    /// JavaScript expression evaluating to an array of every matching element.
    #[must_use]
    pub fn to_js_all(&self) -> String {
        match self {
            Self::Css(css) => format!("Array.from(document.querySelectorAll({}))", js_string(css)),
            Self::XPath(xpath) => format!(
                "(() => {{ const r = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); return out; }})()",
                js_string(xpath)
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css:{s}"),
            Self::XPath(s) => write!(f, "xpath:{s}"),
        }
    }
}

/// Quote a Rust string as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Browser actions for automation.
///
/// Every method performs exactly one interaction; retrying is the caller's
/// business (see [`crate::retry`]). Errors carry a transient/terminal
/// classification through [`crate::BrowserError::class`].
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL and wait for the load to finish
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Visible text of the first matching element, `None` if absent or blank
    async fn find_text(&self, selector: &Selector) -> Result<Option<String>>;

    /// Absolute `href` of every matching anchor
    async fn find_links(&self, selector: &Selector) -> Result<Vec<String>>;

    /// Whether at least one element matches
    async fn exists(&self, selector: &Selector) -> Result<bool>;

    /// Click the first matching element
    async fn click(&self, selector: &Selector) -> Result<()>;

    /// Replace the value of an input field
    async fn fill_field(&self, selector: &Selector, value: &str) -> Result<()>;

    /// Wait until an element matches, up to `timeout`. `false` on timeout.
    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> Result<bool>;

    /// Wait until no matching element is displayed, up to `timeout`
    async fn wait_while_visible(&self, selector: &Selector, timeout: Duration) -> Result<()>;
}
