//! Executable staging into the target binary directory.
//!
//! Copies planned executables out of the staging directory with executable
//! permission bits set. Each file is written under a temporary name in the
//! target directory and renamed into place, so an interrupted install never
//! leaves a partially written executable behind.

use crate::executable::{InstallPlan, PlannedExecutable};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::{self, Write};
use tempfile::NamedTempFile;

/// Permission bits applied to installed executables on Unix.
#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

/// Errors arising from writing executables into the target directory.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    /// The target directory cannot be created or written to.
    #[error("target directory {path} is not writable: {reason}")]
    TargetNotWritable {
        /// Path to the target directory.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// Copying an executable into place failed.
    #[error("failed to install {name} into {path}: {source}")]
    CopyFailed {
        /// Name of the executable being installed.
        name: String,
        /// Destination path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Handles installation of executables into the target directory.
#[derive(Debug, Clone)]
pub struct Stager {
    target_dir: Utf8PathBuf,
}

impl Stager {
    /// Create a new stager for the given target directory.
    #[must_use]
    pub fn new(target_dir: Utf8PathBuf) -> Self {
        Self { target_dir }
    }

    /// Ensure the target directory exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or is not writable.
    pub fn prepare(&self) -> Result<(), StagingError> {
        fs::create_dir_all(&self.target_dir).map_err(|e| self.not_writable(&e))?;

        // Verify writability with a probe that is removed on drop.
        NamedTempFile::with_prefix_in(".auths-installer-probe", &self.target_dir)
            .map(drop)
            .map_err(|e| self.not_writable(&e))
    }

    /// Install one planned executable and return its destination path.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::CopyFailed`] if the copy, permission change,
    /// or rename fails. The destination is left untouched in that case.
    pub fn stage(&self, planned: &PlannedExecutable) -> Result<Utf8PathBuf, StagingError> {
        let dest_path = self.target_dir.join(&planned.file_name);
        write_atomically(planned, &self.target_dir, &dest_path).map_err(|source| {
            StagingError::CopyFailed {
                name: planned.spec.name().to_owned(),
                path: dest_path.clone(),
                source,
            }
        })?;
        log::info!("installed {} to {dest_path}", planned.spec.name());
        Ok(dest_path)
    }

    /// Install every executable in `plan`, in plan order.
    ///
    /// # Errors
    ///
    /// Returns the first staging error encountered.
    pub fn stage_all(&self, plan: &InstallPlan) -> Result<Vec<Utf8PathBuf>, StagingError> {
        plan.install.iter().map(|p| self.stage(p)).collect()
    }

    /// Return the target directory.
    #[must_use]
    pub fn target_dir(&self) -> &Utf8Path {
        &self.target_dir
    }

    fn not_writable(&self, err: &io::Error) -> StagingError {
        StagingError::TargetNotWritable {
            path: self.target_dir.clone(),
            reason: err.to_string(),
        }
    }
}

fn write_atomically(
    planned: &PlannedExecutable,
    target_dir: &Utf8Path,
    dest_path: &Utf8Path,
) -> io::Result<()> {
    let mut source = fs::File::open(&planned.source)?;
    let mut temp = NamedTempFile::with_prefix_in(format!(".{}.", planned.file_name), target_dir)?;
    io::copy(&mut source, temp.as_file_mut())?;
    temp.as_file_mut().flush()?;
    temp.as_file().sync_all()?;
    set_executable(temp.path())?;
    temp.persist(dest_path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &std::path::Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
fn set_executable(_path: &std::path::Path) -> io::Result<()> {
    Ok(())
}

/// Return the default binary directory for the current user.
///
/// Uses the platform executable directory from `directories-next` when it
/// has one (for example `~/.local/bin` on Linux), and falls back to
/// `~/.local/bin` under the home directory elsewhere.
#[must_use]
pub fn default_bin_dir() -> Option<Utf8PathBuf> {
    let dirs = directories_next::BaseDirs::new()?;
    let path = dirs
        .executable_dir()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(|| dirs.home_dir().join(".local").join("bin"));
    Utf8PathBuf::try_from(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executable::ExecutableSpec;

    fn utf8_temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        (temp, path)
    }

    fn planned(source_dir: &Utf8Path, name: &str, contents: &[u8]) -> PlannedExecutable {
        let source = source_dir.join(name);
        fs::write(&source, contents).expect("write source");
        PlannedExecutable {
            spec: ExecutableSpec::required(name),
            source: source.into_std_path_buf(),
            file_name: name.to_owned(),
        }
    }

    #[test]
    fn stage_copies_file_and_leaves_no_temporaries() {
        let (_src_guard, src) = utf8_temp_dir();
        let (_dst_guard, dst) = utf8_temp_dir();
        let stager = Stager::new(dst.clone());
        stager.prepare().expect("prepare");

        let path = stager
            .stage(&planned(&src, "auths", b"#!/bin/sh\n"))
            .expect("stage");

        assert_eq!(path, dst.join("auths"));
        assert_eq!(fs::read(&path).expect("read"), b"#!/bin/sh\n");
        let entries: Vec<_> = fs::read_dir(&dst).expect("read dir").collect();
        assert_eq!(entries.len(), 1, "temporary files left behind");
    }

    #[cfg(unix)]
    #[test]
    fn staged_file_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let (_src_guard, src) = utf8_temp_dir();
        let (_dst_guard, dst) = utf8_temp_dir();
        let stager = Stager::new(dst);
        let path = stager.stage(&planned(&src, "auths", b"bin")).expect("stage");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, EXECUTABLE_MODE);
    }

    #[test]
    fn stage_replaces_existing_executable() {
        let (_src_guard, src) = utf8_temp_dir();
        let (_dst_guard, dst) = utf8_temp_dir();
        fs::write(dst.join("auths"), b"old").expect("seed old binary");

        let stager = Stager::new(dst.clone());
        stager.stage(&planned(&src, "auths", b"new")).expect("stage");
        assert_eq!(fs::read(dst.join("auths")).expect("read"), b"new");
    }

    #[test]
    fn missing_source_leaves_destination_untouched() {
        let (_dst_guard, dst) = utf8_temp_dir();
        fs::write(dst.join("auths"), b"old").expect("seed old binary");
        let stager = Stager::new(dst.clone());
        let planned = PlannedExecutable {
            spec: ExecutableSpec::required("auths"),
            source: "/nonexistent/auths".into(),
            file_name: "auths".to_owned(),
        };

        let err = stager.stage(&planned).expect_err("missing source");
        assert!(matches!(err, StagingError::CopyFailed { .. }));
        assert_eq!(fs::read(dst.join("auths")).expect("read"), b"old");
    }

    #[test]
    fn prepare_creates_missing_directory() {
        let (_guard, root) = utf8_temp_dir();
        let target = root.join("nested").join("bin");
        Stager::new(target.clone()).prepare().expect("prepare");
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).expect("read dir").count(), 0);
    }

    #[test]
    fn prepare_reports_file_in_the_way() {
        let (_guard, root) = utf8_temp_dir();
        let occupied = root.join("occupied");
        fs::write(&occupied, b"file").expect("write");
        let err = Stager::new(occupied.join("bin"))
            .prepare()
            .expect_err("cannot create under a file");
        assert!(matches!(err, StagingError::TargetNotWritable { .. }));
    }
}
