//! Release artefact domain model.
//!
//! Covers everything between "which machine is this" and "here are the
//! unpacked files":
//!
//! - [`platform`] - Operating system and architecture keys (`PlatformKey`).
//! - [`release_version`] - Release identifier newtype (`ReleaseVersion`).
//! - [`catalog`] - Built-in `(version, platform)` artefact catalog.
//! - [`catalog_file`] - TOML release index loading.
//! - [`download`] - Artefact fetch trait and HTTP implementation.
//! - [`retry`] - Bounded exponential backoff for transient fetch failures.
//! - [`sha256_digest`] - SHA-256 digest newtype and placeholder detection.
//! - [`verification`] - Integrity verification of downloaded bytes.
//! - [`extraction`] - Archive extraction with path traversal protection.
//! - [`error`] - Validation errors for the types above.

pub mod catalog;
pub mod catalog_file;
pub mod download;
pub mod error;
pub mod extraction;
pub mod platform;
pub mod release_version;
pub mod retry;
pub mod sha256_digest;
pub mod verification;
