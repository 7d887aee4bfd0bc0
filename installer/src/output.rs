//! Output formatting for the installer CLI.
//!
//! User-facing progress and summaries are written to an injected writer
//! (stderr in the binary) so tests can capture them.

use crate::artefact::catalog::{ArtifactCatalog, ArtifactDescriptor};
use crate::error::InstallerError;
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Format a success message after installation.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use auths_installer::output::success_message;
///
/// let msg = success_message(1, &Utf8PathBuf::from("/home/user/.local/bin"));
/// assert_eq!(msg, "Installed 1 executable to /home/user/.local/bin");
/// ```
#[must_use]
pub fn success_message(count: usize, target_dir: &Utf8Path) -> String {
    let plural = if count == 1 { "executable" } else { "executables" };
    format!("Installed {count} {plural} to {target_dir}")
}

/// Format the failure line shown before the process exits.
///
/// Pipeline failures name the stage they occurred in.
#[must_use]
pub fn failure_message(err: &InstallerError) -> String {
    match err.stage() {
        Some(stage) => format!("error ({stage}): {err}"),
        None => format!("error: {err}"),
    }
}

/// What a dry run would do.
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// The resolved artefact.
    pub descriptor: &'a ArtifactDescriptor,
    /// Directory the executables would be installed into.
    pub target_dir: &'a Utf8Path,
    /// Names of the executables that would be installed.
    pub executables: &'a [String],
    /// Whether the post-install version check would run.
    pub verify_version: bool,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no files will be downloaded or modified".to_owned(),
            String::new(),
            format!("Release: {}", self.descriptor.version()),
            format!("Platform: {}", self.descriptor.platform()),
            format!("URL: {}", self.descriptor.url()),
            format!("SHA-256: {}", self.descriptor.expected_sha256()),
            format!("Target directory: {}", self.target_dir),
            format!("Version check: {}", self.verify_version),
            String::new(),
            "Executables:".to_owned(),
        ];
        lines.extend(self.executables.iter().map(|name| format!("  - {name}")));
        lines.join("\n")
    }
}

/// Format every catalogued release and its platforms, newest last.
#[must_use]
pub fn catalog_listing(catalog: &ArtifactCatalog) -> String {
    if catalog.is_empty() {
        return "No releases catalogued.".to_owned();
    }

    let mut lines = Vec::new();
    for version in catalog.releases() {
        lines.push(format!("{version}:"));
        lines.extend(
            catalog
                .platforms(version)
                .iter()
                .map(|platform| format!("  - {platform}")),
        );
    }
    lines.join("\n")
}

/// Format the summary printed after a successful install.
#[must_use]
pub fn install_summary(installed: &[Utf8PathBuf], skipped: &[String]) -> String {
    let mut lines: Vec<String> = installed.iter().map(|path| format!("  + {path}")).collect();
    lines.extend(
        skipped
            .iter()
            .map(|name| format!("  - {name} (not in this release)")),
    );
    lines.join("\n")
}
