//! Bounded exponential backoff around an [`ArtefactFetcher`].
//!
//! Only [`FetchError::Transient`] failures are retried. The sleep function
//! is injected so tests can observe the schedule without waiting.

use super::download::{ArtefactFetcher, FetchError};
use std::time::Duration;

/// Retry schedule for artefact downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after each failed attempt.
    pub multiplier: u32,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            multiplier: 2,
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Return the delay to wait after failed attempt number `attempt`
    /// (1-based).
    ///
    /// # Examples
    ///
    /// ```
    /// use auths_installer::artefact::retry::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_after(1), Duration::from_millis(500));
    /// assert_eq!(policy.delay_after(2), Duration::from_secs(1));
    /// ```
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Fetch `url`, retrying transient failures according to `policy`.
///
/// # Errors
///
/// Returns the first permanent error, or the last transient error once the
/// attempts are exhausted.
pub fn fetch_with_retry(
    fetcher: &dyn ArtefactFetcher,
    url: &str,
    policy: &RetryPolicy,
    sleep: &dyn Fn(Duration),
) -> Result<Vec<u8>, FetchError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match fetcher.fetch(url) {
            Ok(bytes) => return Ok(bytes),
            Err(err) if err.is_transient() && attempt < attempts => {
                let delay = policy.delay_after(attempt);
                log::warn!("attempt {attempt}/{attempts} failed: {err}; retrying in {delay:?}");
                sleep(delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
