//! Bounded retry around single browser interactions.
//!
//! This is the only place retry timing is defined. Callers wrap one
//! interaction at a time and get either its value or a typed
//! [`InteractionFailure`] back; nothing here panics or swallows errors.

use crate::error::{BrowserError, FailureClass};
use annuaire_core::RetryConfig;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// How often and how patiently to retry an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Attempt `n` (1-based) is followed by a wait of `n * base_delay`
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Build the interaction policy from configuration.
    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
    }

    /// A single attempt, no waiting. Used for optional probes.
    #[must_use]
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait after the given failed attempt (1-based): linear backoff.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Typed outcome of an interaction that did not succeed.
#[derive(Debug, Error)]
pub enum InteractionFailure {
    /// A non-retryable error; no further attempt was made
    #[error("{action}: terminal failure: {source}")]
    Terminal {
        /// What was being attempted
        action: String,
        /// Underlying browser error
        #[source]
        source: BrowserError,
    },

    /// Every attempt failed transiently
    #[error("{action}: gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// What was being attempted
        action: String,
        /// Number of attempts made
        attempts: u32,
        /// Error of the final attempt
        #[source]
        last: BrowserError,
    },
}

impl InteractionFailure {
    /// The browser error that ended the interaction.
    #[must_use]
    pub fn cause(&self) -> &BrowserError {
        match self {
            Self::Terminal { source, .. } => source,
            Self::Exhausted { last, .. } => last,
        }
    }

    /// Number of attempts made before giving up.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Terminal { .. } => 1,
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Run `op` until it succeeds, fails terminally, or `policy.max_attempts` is reached.
///
/// Transient failures sleep `attempt * base_delay` before the next attempt.
/// No sleep follows the final attempt.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    action: &str,
    mut op: F,
) -> Result<T, InteractionFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::Result<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if err.class() == FailureClass::Terminal {
            tracing::warn!("{} failed terminally: {}", action, err);
            return Err(InteractionFailure::Terminal {
                action: action.to_string(),
                source: err,
            });
        }

        if attempt >= policy.max_attempts {
            tracing::debug!("{} exhausted {} attempts: {}", action, attempt, err);
            return Err(InteractionFailure::Exhausted {
                action: action.to_string(),
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.delay_after(attempt);
        tracing::debug!(
            "{} failed (attempt {}/{}), retrying in {:?}: {}",
            action,
            attempt,
            policy.max_attempts,
            delay,
            err
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(100))
    }

    #[test]
    fn test_linear_backoff() {
        let p = policy();
        assert_eq!(p.delay_after(1), Duration::from_millis(100));
        assert_eq!(p.delay_after(2), Duration::from_millis(200));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_last_attempt() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result = with_retry(&policy(), "read rpps", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(BrowserError::StaleElement("div.rpps".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_without_extra_attempt() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<(), _> = with_retry(&policy(), "click next", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(BrowserError::Timeout("click".to_string())) }
        })
        .await;

        let failure = result.unwrap_err();
        assert!(matches!(
            failure,
            InteractionFailure::Exhausted { attempts: 3, .. }
        ));
        assert_eq!(failure.attempts(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // No sleep after the final attempt
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_aborts_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&policy(), "read name", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(BrowserError::Closed) }
        })
        .await;

        let failure = result.unwrap_err();
        assert!(matches!(failure, InteractionFailure::Terminal { .. }));
        assert!(matches!(failure.cause(), BrowserError::Closed));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_try_success_does_not_wait() {
        let result = with_retry(&RetryPolicy::new(5, Duration::from_secs(60)), "navigate", || async {
            Ok::<_, BrowserError>("ok")
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
    }

    #[test]
    fn test_from_config() {
        let config = RetryConfig {
            max_attempts: 4,
            base_delay_ms: 250,
            profile_attempts: 1,
        };
        let p = RetryPolicy::from_config(&config);
        assert_eq!(p.max_attempts, 4);
        assert_eq!(p.base_delay, Duration::from_millis(250));
    }
}
