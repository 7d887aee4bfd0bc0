//! Run-scoped staging directories.
//!
//! Each install run extracts its archive into a private temporary directory
//! named after the platform being installed, so concurrent runs never
//! collide. The directory is removed when the [`StagingDir`] guard is
//! dropped, on success and failure alike. Live staging directories are also
//! tracked in a process-wide registry so that an interrupt handler can remove
//! them before the process exits.

use crate::artefact::platform::PlatformKey;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::TempDir;

/// Prefix shared by every staging directory name.
const STAGING_PREFIX: &str = "auths-stage-";

static ACTIVE: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// A temporary extraction directory owned by one install run.
#[derive(Debug)]
pub struct StagingDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl StagingDir {
    /// Create a staging directory under the system temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn create(platform: &PlatformKey) -> io::Result<Self> {
        Self::create_in(&std::env::temp_dir(), platform)
    }

    /// Create a staging directory under `base`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn create_in(base: &Path, platform: &PlatformKey) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{STAGING_PREFIX}{platform}-"))
            .tempdir_in(base)?;
        let path = dir.path().to_path_buf();
        registry().push(path.clone());
        log::debug!("created staging directory {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Return the staging directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now, reporting any failure.
    ///
    /// A directory already removed by [`cleanup_registered`] counts as
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be removed.
    pub fn close(mut self) -> io::Result<()> {
        self.release()
    }

    fn release(&mut self) -> io::Result<()> {
        deregister(&self.path);
        match self.dir.take().map(TempDir::close) {
            Some(Err(err)) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::warn!(
                "failed to remove staging directory {}: {err}",
                self.path.display()
            );
        }
    }
}

/// Remove every staging directory still registered in this process.
///
/// Intended for interrupt handlers, which run while the owning guards are
/// still alive. Returns the number of directories removed.
pub fn cleanup_registered() -> usize {
    let paths: Vec<PathBuf> = registry().drain(..).collect();
    remove_all(&paths)
}

fn remove_all(paths: &[PathBuf]) -> usize {
    paths
        .iter()
        .filter(|path| match std::fs::remove_dir_all(path) {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => {
                log::warn!("failed to remove staging directory {}: {err}", path.display());
                false
            }
        })
        .count()
}

/// Return the staging directories currently registered.
#[must_use]
pub fn registered() -> Vec<PathBuf> {
    registry().clone()
}

fn registry() -> std::sync::MutexGuard<'static, Vec<PathBuf>> {
    ACTIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn deregister(path: &Path) {
    registry().retain(|registered| registered != path);
}
