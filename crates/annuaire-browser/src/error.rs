use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

/// Whether an interaction failure is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Stale element, timeout, element not rendered yet
    Transient,
    /// Permanent: retrying cannot help
    Terminal,
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("browser failed to launch: {0}")]
    LaunchFailed(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("stale element: {0}")]
    StaleElement(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("unexpected script result: {0}")]
    ScriptResult(String),

    #[error("browser session closed")]
    Closed,
}

impl BrowserError {
    /// Classify the failure for the retry wrapper.
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::ChromiumError(_)
            | Self::NavigationError(_)
            | Self::SelectorNotFound(_)
            | Self::StaleElement(_)
            | Self::Timeout(_) => FailureClass::Transient,
            Self::LaunchFailed(_)
            | Self::InvalidSelector(_)
            | Self::ScriptResult(_)
            | Self::Closed => FailureClass::Terminal,
        }
    }

    /// Shorthand for `class() == FailureClass::Transient`.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.class() == FailureClass::Transient
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        match err {
            chromiumoxide::error::CdpError::Timeout => Self::Timeout("CDP request".to_string()),
            other => Self::ChromiumError(other.to_string()),
        }
    }
}
