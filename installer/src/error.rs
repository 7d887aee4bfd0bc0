//! Error types for the auths installer.
//!
//! [`InstallerError`] aggregates the typed failure of every pipeline stage.
//! Callers can ask which [`Stage`] failed, which [`ErrorCategory`] the
//! failure belongs to, and which process exit code represents it, so that
//! "your platform isn't supported" and "the download was tampered with"
//! never collapse into the same generic failure.

use crate::artefact::catalog::CatalogError;
use crate::artefact::download::FetchError;
use crate::artefact::error::ArtefactError;
use crate::artefact::extraction::ExtractionError;
use crate::artefact::verification::IntegrityError;
use crate::executable::SelectionError;
use crate::stager::StagingError;
use crate::version_check::VersionCheckError;
use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// Exit code used when the run is interrupted by a signal.
pub const EXIT_INTERRUPTED: i32 = 130;

/// A step of the install pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Determining the host platform.
    Detecting,
    /// Looking up the artefact in the catalog.
    Resolving,
    /// Downloading the archive.
    Fetching,
    /// Checking the archive digest.
    Verifying,
    /// Unpacking the archive into staging.
    Extracting,
    /// Copying executables into the binary directory.
    Installing,
    /// Asking the installed executable for its version.
    VerifyingVersion,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ALL: [Self; 7] = [
        Self::Detecting,
        Self::Resolving,
        Self::Fetching,
        Self::Verifying,
        Self::Extracting,
        Self::Installing,
        Self::VerifyingVersion,
    ];

    /// Return the lowercase stage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detecting => "detecting",
            Self::Resolving => "resolving",
            Self::Fetching => "fetching",
            Self::Verifying => "verifying",
            Self::Extracting => "extracting",
            Self::Installing => "installing",
            Self::VerifyingVersion => "verifying version",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad classification of installer failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The host platform could not be determined.
    Environment,
    /// The catalog has no artefact for the request.
    Coverage,
    /// Downloading failed.
    Network,
    /// The artefact failed digest verification or cannot be trusted.
    Integrity,
    /// The archive is corrupt or could not be unpacked.
    Archive,
    /// Executables could not be selected or written.
    Install,
    /// The install succeeded but the version check did not.
    PostInstallWarning,
    /// Invocation or release index problems outside the pipeline.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Environment => "environment",
            Self::Coverage => "coverage",
            Self::Network => "network",
            Self::Integrity => "integrity",
            Self::Archive => "archive",
            Self::Install => "install",
            Self::PostInstallWarning => "post-install warning",
            Self::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during an install run.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The host or requested platform name could not be read.
    #[error(transparent)]
    UnsupportedPlatform(ArtefactError),

    /// The requested release version is malformed.
    #[error(transparent)]
    InvalidRelease(ArtefactError),

    /// No release was requested and the catalog is empty.
    #[error("the release catalog is empty; pass --release with --catalog")]
    NoReleases,

    /// Catalog lookup or release index loading failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Downloading the archive failed.
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),

    /// The downloaded archive failed verification.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// The artefact URL does not name a supported archive format.
    #[error("corrupt archive: cannot infer archive format from {url}")]
    UnknownArchiveFormat {
        /// URL of the artefact.
        url: String,
    },

    /// Unpacking the archive failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The run-scoped staging directory could not be created or removed.
    #[error("staging directory error: {source}")]
    Staging {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A required executable is missing from the archive.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Writing executables into the binary directory failed.
    #[error(transparent)]
    Install(#[from] StagingError),

    /// The executables were installed but the version check failed.
    #[error("installed {} executable(s) but the version check failed: {source}", .installed.len())]
    VersionCheck {
        /// The version check failure.
        #[source]
        source: VersionCheckError,
        /// Paths of the executables that were installed.
        installed: Vec<Utf8PathBuf>,
    },

    /// No binary directory was given and none could be derived.
    #[error("could not determine a binary directory; pass --bin-dir or set AUTHS_INSTALL_DIR")]
    NoBinDir,

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

impl InstallerError {
    /// Return the pipeline stage at which the error occurred.
    ///
    /// Errors raised outside the pipeline, such as while loading a release
    /// index or parsing arguments, have no stage.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::UnsupportedPlatform(_) => Some(Stage::Detecting),
            Self::InvalidRelease(_) | Self::NoReleases => Some(Stage::Resolving),
            Self::Catalog(CatalogError::NoArtifactForPlatform { .. }) => Some(Stage::Resolving),
            Self::Catalog(_) => None,
            Self::Fetch(_) => Some(Stage::Fetching),
            Self::Integrity(_) => Some(Stage::Verifying),
            Self::UnknownArchiveFormat { .. } | Self::Extraction(_) | Self::Staging { .. } => {
                Some(Stage::Extracting)
            }
            Self::Selection(_) | Self::Install(_) => Some(Stage::Installing),
            Self::VersionCheck { .. } => Some(Stage::VerifyingVersion),
            Self::NoBinDir | Self::Io(_) | Self::WriteFailed { .. } => None,
        }
    }

    /// Return the failure category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedPlatform(_) => ErrorCategory::Environment,
            Self::NoReleases | Self::Catalog(CatalogError::NoArtifactForPlatform { .. }) => {
                ErrorCategory::Coverage
            }
            Self::Catalog(CatalogError::InvalidEntry(err)) if is_untrusted_digest(err) => {
                ErrorCategory::Integrity
            }
            Self::InvalidRelease(_) | Self::Catalog(_) | Self::NoBinDir => {
                ErrorCategory::Configuration
            }
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Integrity(_) => ErrorCategory::Integrity,
            Self::UnknownArchiveFormat { .. } | Self::Extraction(_) | Self::Staging { .. } => {
                ErrorCategory::Archive
            }
            Self::Selection(_) | Self::Install(_) | Self::Io(_) | Self::WriteFailed { .. } => {
                ErrorCategory::Install
            }
            Self::VersionCheck { .. } => ErrorCategory::PostInstallWarning,
        }
    }

    /// Return the process exit code representing this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use auths_installer::error::InstallerError;
    ///
    /// assert_eq!(InstallerError::NoBinDir.exit_code(), 2);
    /// assert_eq!(InstallerError::NoReleases.exit_code(), 4);
    /// ```
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) | Self::WriteFailed { .. } => 1,
            Self::InvalidRelease(_) | Self::NoBinDir => 2,
            Self::UnsupportedPlatform(_) => 3,
            Self::NoReleases | Self::Catalog(CatalogError::NoArtifactForPlatform { .. }) => 4,
            Self::Catalog(CatalogError::InvalidEntry(err)) if is_untrusted_digest(err) => 6,
            Self::Catalog(_) => 2,
            Self::Fetch(_) => 5,
            Self::Integrity(IntegrityError::UntrustedArtifact { .. }) => 6,
            Self::Integrity(IntegrityError::HashMismatch { .. }) => 7,
            Self::UnknownArchiveFormat { .. } => 8,
            Self::Extraction(err) if err.is_corrupt_archive() => 8,
            Self::Extraction(_) | Self::Staging { .. } => 9,
            Self::Selection(_) => 10,
            Self::Install(_) => 11,
            Self::VersionCheck { .. } => 12,
        }
    }
}

fn is_untrusted_digest(err: &ArtefactError) -> bool {
    matches!(
        err,
        ArtefactError::InvalidSha256Digest { .. } | ArtefactError::PlaceholderSha256Digest { .. }
    )
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artefact::platform::PlatformKey;
    use crate::artefact::release_version::ReleaseVersion;
    use crate::artefact::sha256_digest::Sha256Digest;
    use rstest::rstest;
    use std::collections::HashSet;

    fn placeholder() -> ArtefactError {
        ArtefactError::PlaceholderSha256Digest {
            value: "REPLACE_ME".to_owned(),
        }
    }

    fn no_artifact() -> InstallerError {
        InstallerError::Catalog(CatalogError::NoArtifactForPlatform {
            version: ReleaseVersion::try_from("0.0.1-rc.11").expect("valid version"),
            platform: "windows-x86_64".parse::<PlatformKey>().expect("valid platform"),
            supported: "linux-x86_64".to_owned(),
        })
    }

    fn representative_errors() -> Vec<InstallerError> {
        vec![
            InstallerError::UnsupportedPlatform(ArtefactError::UnsupportedPlatform {
                value: "plan9".to_owned(),
                reason: "unknown operating system".to_owned(),
            }),
            no_artifact(),
            InstallerError::Fetch(FetchError::Permanent {
                url: "https://example.test/a.tar.gz".to_owned(),
                reason: "HTTP status 404".to_owned(),
            }),
            InstallerError::Integrity(IntegrityError::UntrustedArtifact {
                source: placeholder(),
            }),
            InstallerError::Integrity(IntegrityError::HashMismatch {
                expected: Sha256Digest::compute(b"expected"),
                actual: Sha256Digest::compute(b"actual"),
            }),
            InstallerError::Extraction(ExtractionError::EmptyArchive),
            InstallerError::Selection(SelectionError::MissingRequiredExecutable {
                name: "auths".to_owned(),
            }),
            InstallerError::VersionCheck {
                source: VersionCheckError::Mismatch {
                    expected: "0.0.1-rc.11".to_owned(),
                    output: "auths 0.0.1-rc.10".to_owned(),
                },
                installed: vec![Utf8PathBuf::from("/bin/auths")],
            },
        ]
    }

    #[test]
    fn result_codes_are_distinct() {
        let errors = representative_errors();
        let codes: HashSet<i32> = errors.iter().map(InstallerError::exit_code).collect();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn pipeline_errors_report_stages_in_order() {
        let stages: Vec<Stage> = representative_errors()
            .iter()
            .filter_map(InstallerError::stage)
            .collect();
        let mut sorted = stages.clone();
        sorted.sort();
        assert_eq!(stages, sorted);
        assert_eq!(stages.first(), Some(&Stage::Detecting));
        assert_eq!(stages.last(), Some(&Stage::VerifyingVersion));
    }

    #[rstest]
    #[case::no_artifact(no_artifact(), ErrorCategory::Coverage)]
    #[case::untrusted_index_entry(
        InstallerError::Catalog(CatalogError::InvalidEntry(placeholder())),
        ErrorCategory::Integrity
    )]
    #[case::missing_bin_dir(InstallerError::NoBinDir, ErrorCategory::Configuration)]
    #[case::corrupt(
        InstallerError::UnknownArchiveFormat { url: "https://example.test/a.rar".to_owned() },
        ErrorCategory::Archive
    )]
    fn categories(#[case] err: InstallerError, #[case] expected: ErrorCategory) {
        assert_eq!(err.category(), expected);
    }

    #[test]
    fn extraction_io_is_distinct_from_corruption() {
        let corrupt = InstallerError::Extraction(ExtractionError::CorruptArchive {
            reason: "truncated".to_owned(),
        });
        let io = InstallerError::Extraction(ExtractionError::Io(std::io::Error::other("disk full")));
        assert_eq!(corrupt.exit_code(), 8);
        assert_eq!(io.exit_code(), 9);
    }

    #[test]
    fn version_check_failure_names_installed_count() {
        let err = representative_errors().pop().expect("version check error");
        let msg = err.to_string();
        assert!(msg.contains("installed 1 executable(s)"), "{msg}");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn stage_display_is_lowercase() {
        let names: Vec<String> = Stage::ALL.iter().map(ToString::to_string).collect();
        assert!(names.iter().all(|n| n == &n.to_lowercase()));
        assert_eq!(Stage::VerifyingVersion.to_string(), "verifying version");
    }
}
