//! SHA-256 digest newtype for artefact verification.
//!
//! Validates that the value is a 64-character lowercase hexadecimal string
//! representing a 256-bit hash digest, and that it is not one of the
//! placeholder values release manifests are sometimes shipped with
//! (all zeros, a single repeated digit, or marker words like `REPLACE_ME`).

use super::error::{ArtefactError, Result};
use sha2::{Digest, Sha256};
use std::fmt;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Marker words that identify a checksum nobody filled in.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "replace_me",
    "replaceme",
    "replace-me",
    "placeholder",
    "changeme",
    "todo",
    "tbd",
    "fixme",
    "xxxx",
];

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use auths_installer::artefact::sha256_digest::Sha256Digest;
///
/// let digest = Sha256Digest::compute(b"hello");
/// assert_eq!(
///     digest.as_str(),
///     "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
/// );
/// assert!(Sha256Digest::try_from("0".repeat(64).as_str()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Compute the digest of `bytes`.
    #[must_use]
    pub fn compute(bytes: &[u8]) -> Self {
        // sha2 always renders 64 lowercase hex characters.
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = ArtefactError;

    fn try_from(value: &str) -> Result<Self> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        validate_sha256(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Report whether `value` is a known placeholder instead of a real digest.
///
/// Checked before the format rules so a `REPLACE_ME` marker is reported as a
/// placeholder rather than as a length error.
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    if PLACEHOLDER_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return true;
    }
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => false,
    }
}

/// Validate that `value` is a well-formed, non-placeholder SHA-256 digest.
fn validate_sha256(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ArtefactError::InvalidSha256Digest {
            reason: "digest is missing".to_owned(),
        });
    }
    if is_placeholder(value) {
        return Err(ArtefactError::PlaceholderSha256Digest {
            value: value.to_owned(),
        });
    }
    if value.len() != DIGEST_HEX_LEN {
        return Err(ArtefactError::InvalidSha256Digest {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ArtefactError::InvalidSha256Digest {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ArtefactError::InvalidSha256Digest {
            reason: "digest must be lowercase".to_owned(),
        });
    }
    Ok(())
}
