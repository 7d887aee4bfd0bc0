//! Post-install version verification.
//!
//! After the executables are in place the installer asks the primary one for
//! its version and checks that the expected release appears in the output.
//! A mismatch is reported but does not undo the install.

use crate::artefact::release_version::ReleaseVersion;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Maximum time the installed executable may take to report its version.
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors arising from the post-install version check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionCheckError {
    /// The executable could not be started.
    #[error("failed to run {path}: {reason}")]
    Spawn {
        /// Path to the executable.
        path: PathBuf,
        /// Description of the spawn failure.
        reason: String,
    },

    /// The executable did not exit within the timeout.
    #[error("{path} --version did not finish within {seconds} seconds")]
    TimedOut {
        /// Path to the executable.
        path: PathBuf,
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// The executable exited unsuccessfully.
    #[error("{path} --version failed: {message}")]
    Failed {
        /// Path to the executable.
        path: PathBuf,
        /// Exit status and captured stderr.
        message: String,
    },

    /// The reported version does not contain the expected release.
    #[error("installed executable reports {output:?}, expected version {expected}")]
    Mismatch {
        /// The release that was installed.
        expected: String,
        /// Trimmed version output.
        output: String,
    },
}

/// Source of an executable's version output.
#[cfg_attr(test, mockall::automock)]
pub trait VersionCommand {
    /// Return the version output of `exe`.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable cannot be run to completion.
    fn version_output(&self, exe: &Path) -> Result<String, VersionCheckError>;
}

/// Runs `<exe> --version` as a child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessVersionCommand;

impl VersionCommand for ProcessVersionCommand {
    fn version_output(&self, exe: &Path) -> Result<String, VersionCheckError> {
        let spawn_error = |err: io::Error| VersionCheckError::Spawn {
            path: exe.to_path_buf(),
            reason: err.to_string(),
        };

        let mut child = Command::new(exe)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let Some(status) = child.wait_timeout(VERSION_TIMEOUT).map_err(spawn_error)? else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VersionCheckError::TimedOut {
                path: exe.to_path_buf(),
                seconds: VERSION_TIMEOUT.as_secs(),
            });
        };

        let stdout = child
            .stdout
            .take()
            .map(io::read_to_string)
            .transpose()
            .map_err(spawn_error)?
            .unwrap_or_default();

        if !status.success() {
            let stderr = child
                .stderr
                .take()
                .map(io::read_to_string)
                .transpose()
                .map_err(spawn_error)?
                .unwrap_or_default();
            return Err(VersionCheckError::Failed {
                path: exe.to_path_buf(),
                message: format!("{status}: {}", stderr.trim()),
            });
        }

        Ok(stdout)
    }
}

/// Check that `exe` reports `expected` in its version output.
///
/// The version must appear as a whole token: `0.0.1-rc.1` does not match
/// `auths 0.0.1-rc.11`. A leading `v` is allowed. Returns the trimmed
/// version output on success.
///
/// # Errors
///
/// Returns [`VersionCheckError::Mismatch`] when the output does not contain
/// the expected version, or the command's own error if it could not run.
pub fn check_version(
    command: &dyn VersionCommand,
    exe: &Path,
    expected: &ReleaseVersion,
) -> Result<String, VersionCheckError> {
    let output = command.version_output(exe)?;
    let reported = output.trim().to_owned();
    if reports_version(&reported, expected.as_str()) {
        log::debug!("{} reports {reported}", exe.display());
        Ok(reported)
    } else {
        Err(VersionCheckError::Mismatch {
            expected: expected.as_str().to_owned(),
            output: reported,
        })
    }
}

/// Report whether `expected` occurs in `output` with no adjoining version
/// characters.
fn reports_version(output: &str, expected: &str) -> bool {
    output.match_indices(expected).any(|(start, _)| {
        let before = output[..start].chars().next_back();
        let after = output[start + expected.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_digit() || c == '.')
            && !after.is_some_and(is_version_char)
    })
}

fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-')
}
