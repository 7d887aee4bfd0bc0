//! Error types for platform, release version, and digest validation.
//!
//! Each variant provides a descriptive message identifying the invalid input
//! and the constraint that was violated.

use thiserror::Error;

/// Errors arising from invalid artefact-related values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtefactError {
    /// An operating system or CPU architecture name is missing or unreadable.
    #[error("unsupported platform \"{value}\": {reason}")]
    UnsupportedPlatform {
        /// The rejected platform string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A release version string is empty or syntactically invalid.
    #[error("invalid release version \"{value}\": {reason}")]
    InvalidReleaseVersion {
        /// The rejected version string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A SHA-256 digest is not a valid 64-character hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },

    /// A SHA-256 digest is a known placeholder rather than a real checksum.
    #[error("placeholder SHA-256 digest \"{value}\" cannot be trusted")]
    PlaceholderSha256Digest {
        /// The rejected placeholder value.
        value: String,
    },
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;
