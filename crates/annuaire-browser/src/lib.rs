//! Browser automation for the directory site.
//!
//! Provides a headless (or headed) Chromium session, a selector-based action
//! trait that the harvester depends on, and the retry policy wrapped around
//! every single interaction.

pub mod actions;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod retry;

pub use actions::{BrowserActions, Selector};
pub use engine::{BrowserEngine, BrowserTab};
pub use error::{BrowserError, FailureClass, Result};
pub use retry::{with_retry, InteractionFailure, RetryPolicy};
