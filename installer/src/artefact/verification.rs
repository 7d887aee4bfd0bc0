//! Integrity verification for downloaded artefacts.
//!
//! The catalog's expected digest is an externally supplied, trusted input.
//! Verification therefore has two halves: refuse outright when the expected
//! value is missing, malformed, or a placeholder, and otherwise compare it
//! against the SHA-256 of the fetched bytes. The comparison is a plain string
//! equality; this is an integrity check, not a secret comparison.

use super::error::ArtefactError;
use super::sha256_digest::Sha256Digest;

/// Errors arising from artefact integrity verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// The expected digest cannot be trusted, so no bytes can match it.
    #[error("untrusted artefact: {source}")]
    UntrustedArtifact {
        /// Why the expected digest was rejected.
        #[from]
        source: ArtefactError,
    },

    /// The downloaded bytes do not hash to the expected digest.
    #[error("checksum mismatch: expected={expected}, actual={actual}")]
    HashMismatch {
        /// The digest recorded in the catalog.
        expected: Sha256Digest,
        /// The digest computed over the downloaded bytes.
        actual: Sha256Digest,
    },
}

/// Parse an expected digest, rejecting placeholders and malformed values.
///
/// # Errors
///
/// Returns [`IntegrityError::UntrustedArtifact`] if `expected` is not a
/// usable SHA-256 digest.
pub fn trusted_digest(expected: &str) -> Result<Sha256Digest, IntegrityError> {
    Ok(Sha256Digest::try_from(expected)?)
}

/// Verify that `bytes` hash to `expected`.
///
/// The expected value is validated before any hashing so that a placeholder
/// is rejected regardless of the bytes supplied. On success the computed
/// digest is returned.
///
/// # Errors
///
/// Returns [`IntegrityError::UntrustedArtifact`] for an unusable expected
/// digest and [`IntegrityError::HashMismatch`] when the digests differ.
///
/// # Examples
///
/// ```
/// use auths_installer::artefact::verification::{IntegrityError, verify};
///
/// let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
/// assert!(verify(b"hello", expected).is_ok());
/// assert!(matches!(
///     verify(b"hellp", expected),
///     Err(IntegrityError::HashMismatch { .. })
/// ));
/// ```
pub fn verify(bytes: &[u8], expected: &str) -> Result<Sha256Digest, IntegrityError> {
    let expected = trusted_digest(expected)?;
    let actual = Sha256Digest::compute(bytes);
    if actual != expected {
        return Err(IntegrityError::HashMismatch { expected, actual });
    }
    Ok(actual)
}
