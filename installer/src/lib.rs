//! auths release installer library.
//!
//! This crate installs the `auths` command-line tools from a published
//! release: it detects the host platform, resolves the release archive from
//! a catalog, downloads it with bounded retry, verifies its SHA-256 digest,
//! extracts it into a run-scoped staging directory, installs the required
//! and optional executables, and confirms the installed version. It is used
//! by the `auths-installer` CLI binary and can be driven programmatically
//! with injected collaborators for testing.
//!
//! # Modules
//!
//! - [`artefact`] - Platform, release, catalog, download, and archive types
//! - [`cli`] - Command-line argument definitions
//! - [`error`] - Error taxonomy, pipeline stages, and exit codes
//! - [`executable`] - Required and optional executable selection
//! - [`output`] - User-facing message formatting
//! - [`pipeline`] - Install pipeline orchestration
//! - [`stager`] - Atomic installation into the binary directory
//! - [`staging`] - Run-scoped extraction directories and interrupt cleanup
//! - [`version_check`] - Post-install version verification

pub mod artefact;
pub mod cli;
pub mod error;
pub mod executable;
pub mod output;
pub mod pipeline;
pub mod stager;
pub mod staging;
pub mod version_check;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
