//! Release version newtype.
//!
//! Validates that the version string is non-empty, starts with a digit, and
//! contains only ASCII alphanumeric characters, dots, hyphens, and plus
//! signs. That covers semantic versions with pre-release and build suffixes
//! such as `0.0.1-rc.11` while keeping the value safe to interpolate into a
//! download URL.

use super::error::{ArtefactError, Result};
use serde::Deserialize;
use std::fmt;

/// A validated release version identifier (e.g. `0.0.1-rc.11`).
///
/// # Examples
///
/// ```
/// use auths_installer::artefact::release_version::ReleaseVersion;
///
/// let version: ReleaseVersion = "0.0.1-rc.11".try_into().expect("valid version");
/// assert_eq!(version.as_str(), "0.0.1-rc.11");
/// assert_eq!(version.tag(), "v0.0.1-rc.11");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ReleaseVersion(String);

fn is_valid_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '+'
}

impl ReleaseVersion {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the git tag the release is published under.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("v{}", self.0)
    }
}

impl TryFrom<&str> for ReleaseVersion {
    type Error = ArtefactError;

    fn try_from(value: &str) -> Result<Self> {
        // Accept the tag form and normalise to the bare version.
        let bare = value.strip_prefix('v').unwrap_or(value);
        if bare.is_empty() {
            return Err(invalid(value, "version must not be empty"));
        }
        if !bare.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid(value, "version must start with a digit"));
        }
        if let Some(bad) = bare.chars().find(|c| !is_valid_version_char(*c)) {
            return Err(invalid(value, &format!("invalid character '{bad}'")));
        }
        Ok(Self(bare.to_owned()))
    }
}

impl TryFrom<String> for ReleaseVersion {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for ReleaseVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn invalid(value: &str, reason: &str) -> ArtefactError {
    ArtefactError::InvalidReleaseVersion {
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}
