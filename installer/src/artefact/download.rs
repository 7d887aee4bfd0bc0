//! Artefact retrieval over HTTP(S).
//!
//! Provides a trait-based abstraction for fetching release archives,
//! enabling dependency injection for testing. Failures are classified as
//! transient (worth retrying) or permanent so that
//! [`crate::artefact::retry`] can decide whether to try again.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

/// Network timeout for a single download attempt.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the archive size accepted from the network.
const MAX_ARTEFACT_BYTES: u64 = 512 * 1024 * 1024;

/// Trait for fetching artefact bytes from a URL.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
///
/// # Examples
///
/// ```
/// use auths_installer::artefact::download::HttpFetcher;
///
/// let fetcher = HttpFetcher;
/// // Use fetcher.fetch(url) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactFetcher {
    /// Fetch the full response body for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transient`] for failures worth retrying and
    /// [`FetchError::Permanent`] otherwise.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Errors arising from artefact retrieval.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// A failure that may succeed on retry (timeout, reset, 5xx).
    #[error("download failed for {url} (transient): {reason}")]
    Transient {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// A failure that will not succeed on retry (404, malformed URL).
    #[error("download failed for {url}: {reason}")]
    Permanent {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },
}

impl FetchError {
    /// Return whether retrying could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Return the URL the failure relates to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Transient { url, .. } | Self::Permanent { url, .. } => url,
        }
    }

    fn transient(url: &str, reason: impl Into<String>) -> Self {
        Self::Transient {
            url: url.to_owned(),
            reason: reason.into(),
        }
    }

    fn permanent(url: &str, reason: impl Into<String>) -> Self {
        Self::Permanent {
            url: url.to_owned(),
            reason: reason.into(),
        }
    }
}

/// HTTP-based fetcher using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl ArtefactFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(FetchError::permanent(url, "unsupported URL scheme"));
        }

        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(classify_status(url, status));
        }

        let mut body = response.into_body();
        let mut bytes = Vec::new();
        body.as_reader()
            .take(MAX_ARTEFACT_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| FetchError::transient(url, format!("reading body: {e}")))?;
        if bytes.len() as u64 > MAX_ARTEFACT_BYTES {
            return Err(FetchError::permanent(
                url,
                format!("response exceeds {MAX_ARTEFACT_BYTES} bytes"),
            ));
        }

        log::debug!("fetched {} bytes from {url}", bytes.len());
        Ok(bytes)
    }
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map an HTTP status code to a [`FetchError`].
fn classify_status(url: &str, status: u16) -> FetchError {
    let reason = format!("HTTP status {status}");
    match status {
        408 | 429 | 500..=599 => FetchError::transient(url, reason),
        _ => FetchError::permanent(url, reason),
    }
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(status) => classify_status(url, *status),
        ureq::Error::BadUri(reason) => FetchError::permanent(url, format!("malformed URL: {reason}")),
        other => FetchError::transient(url, other.to_string()),
    }
}
