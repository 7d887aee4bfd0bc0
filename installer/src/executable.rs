//! Declarative executable selection.
//!
//! An install names the executables it wants through [`ExecutableSpec`]
//! values, each marked required or optional. [`plan_install`] matches those
//! specs against the files an archive produced without touching the
//! filesystem: a missing required executable aborts the plan, a missing
//! optional one is recorded as skipped.

use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the primary `auths` executable.
pub const PRIMARY_EXECUTABLE: &str = "auths";

/// Optional helper executables shipped alongside `auths` in some releases.
pub const OPTIONAL_EXECUTABLES: &[&str] = &["auths-sign", "auths-verify"];

/// One executable the installer should copy out of the archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutableSpec {
    name: String,
    required: bool,
}

impl ExecutableSpec {
    /// An executable whose absence aborts the install.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    /// An executable that is installed only when the archive contains it.
    #[must_use]
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    /// Return the executable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return whether the executable is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Return whether `path` names this executable, with or without a
    /// Windows `.exe` suffix.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        file_name == self.name
            || file_name
                .strip_suffix(".exe")
                .is_some_and(|stem| stem == self.name)
    }
}

impl fmt::Display for ExecutableSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.required { "required" } else { "optional" };
        write!(f, "{} ({kind})", self.name)
    }
}

/// Return the executables published in `auths` release archives.
///
/// # Examples
///
/// ```
/// use auths_installer::executable::default_executables;
///
/// let specs = default_executables();
/// assert_eq!(specs[0].name(), "auths");
/// assert!(specs[0].is_required());
/// assert!(specs[1..].iter().all(|s| !s.is_required()));
/// ```
#[must_use]
pub fn default_executables() -> Vec<ExecutableSpec> {
    std::iter::once(ExecutableSpec::required(PRIMARY_EXECUTABLE))
        .chain(OPTIONAL_EXECUTABLES.iter().copied().map(ExecutableSpec::optional))
        .collect()
}

/// An executable matched to the extracted file that provides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedExecutable {
    /// The spec that was matched.
    pub spec: ExecutableSpec,
    /// The extracted file to install.
    pub source: PathBuf,
    /// File name to use in the target directory.
    pub file_name: String,
}

/// The outcome of matching specs against extracted files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    /// Executables found in the archive, in spec order.
    pub install: Vec<PlannedExecutable>,
    /// Optional executables absent from the archive, in spec order.
    pub skipped: Vec<String>,
}

/// Errors arising from executable selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// A required executable is not present in the archive.
    #[error("required executable {name} is missing from the archive")]
    MissingRequiredExecutable {
        /// Name of the missing executable.
        name: String,
    },
}

/// Match `specs` against `extracted` files.
///
/// When several extracted files match a spec, the one closest to the
/// archive root wins. Presence is evaluated on every call; nothing is
/// cached between runs.
///
/// # Errors
///
/// Returns [`SelectionError::MissingRequiredExecutable`] for the first
/// required spec with no matching file.
pub fn plan_install(
    extracted: &[PathBuf],
    specs: &[ExecutableSpec],
) -> Result<InstallPlan, SelectionError> {
    let mut plan = InstallPlan::default();

    for spec in specs {
        let candidate = extracted
            .iter()
            .filter(|path| spec.matches(path))
            .min_by(|a, b| {
                a.components()
                    .count()
                    .cmp(&b.components().count())
                    .then_with(|| a.cmp(b))
            });

        match candidate {
            Some(source) => {
                let file_name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| spec.name().to_owned());
                plan.install.push(PlannedExecutable {
                    spec: spec.clone(),
                    source: source.clone(),
                    file_name,
                });
            }
            None if spec.is_required() => {
                return Err(SelectionError::MissingRequiredExecutable {
                    name: spec.name().to_owned(),
                });
            }
            None => {
                log::info!("optional executable {} not in archive; skipping", spec.name());
                plan.skipped.push(spec.name().to_owned());
            }
        }
    }

    Ok(plan)
}
