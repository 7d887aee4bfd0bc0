//! Archive extraction for release artefacts.
//!
//! Unpacks `.tar.gz`, `.tar.zst`, and `.zip` archives held in memory into a
//! staging directory, with path traversal protection to prevent zip-slip
//! attacks. Malformed archive structure is reported separately from
//! failures to write the extracted files.

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};

/// Compressed archive formats published for releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tarball.
    TarGz,
    /// Zstandard-compressed tarball.
    TarZst,
    /// Zip archive.
    Zip,
}

impl ArchiveFormat {
    /// Infer the archive format from a download URL or file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use auths_installer::artefact::extraction::ArchiveFormat;
    ///
    /// assert_eq!(
    ///     ArchiveFormat::from_url("https://example.test/auths-linux-x86_64.tar.gz"),
    ///     Some(ArchiveFormat::TarGz)
    /// );
    /// assert_eq!(ArchiveFormat::from_url("auths.exe"), None);
    /// ```
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
        if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if path.ends_with(".tar.zst") || path.ends_with(".tzst") {
            Some(Self::TarZst)
        } else if path.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Trait for extracting artefact archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use auths_installer::artefact::extraction::ArchiveUnpacker;
///
/// let extractor = ArchiveUnpacker;
/// // Use extractor.extract(bytes, format, staging_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract `bytes` (in `format`) into `dest_dir`.
    ///
    /// Returns the paths of the regular files that were written.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::CorruptArchive`],
    /// [`ExtractionError::PathTraversal`], or
    /// [`ExtractionError::EmptyArchive`] for archive structure problems and
    /// [`ExtractionError::Io`] for failures writing into `dest_dir`.
    fn extract(
        &self,
        bytes: &[u8],
        format: ArchiveFormat,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The archive structure or compression stream is malformed.
    #[error("corrupt archive: {reason}")]
    CorruptArchive {
        /// Description of the malformation.
        reason: String,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,

    /// Writing into the staging directory failed.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ExtractionError {
    /// Return whether the archive itself is at fault, as opposed to the
    /// destination filesystem.
    #[must_use]
    pub fn is_corrupt_archive(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Default extractor using the `tar`, `flate2`, `zstd`, and `zip` crates.
///
/// Validates each entry path before extraction to guard against
/// path traversal attacks (zip-slip).
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveUnpacker;

impl ArchiveExtractor for ArchiveUnpacker {
    fn extract(
        &self,
        bytes: &[u8],
        format: ArchiveFormat,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let extracted = match format {
            ArchiveFormat::TarGz => unpack_tar(flate2::read::GzDecoder::new(bytes), dest_dir)?,
            ArchiveFormat::TarZst => {
                let decoder = zstd::Decoder::new(bytes).map_err(corrupt)?;
                unpack_tar(decoder, dest_dir)?
            }
            ArchiveFormat::Zip => unpack_zip(bytes, dest_dir)?,
        };

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }
        log::debug!(
            "extracted {} file(s) into {}",
            extracted.len(),
            dest_dir.display()
        );
        Ok(extracted)
    }
}

fn unpack_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    let mut extracted = Vec::new();

    for entry_result in archive.entries().map_err(corrupt)? {
        let mut entry = entry_result.map_err(corrupt)?;
        let entry_path = entry.path().map_err(corrupt)?.into_owned();
        validate_entry_path(&entry_path)?;
        let dest_path = dest_dir.join(&entry_path);

        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }
        if !entry_type.is_file() {
            log::warn!("skipping non-regular archive entry {}", entry_path.display());
            continue;
        }

        let size = entry.size();
        let contents = read_entry(&mut entry, size, &entry_path)?;
        write_extracted(&dest_path, &contents)?;
        extracted.push(dest_path);
    }

    Ok(extracted)
}

fn unpack_zip(bytes: &[u8], dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(corrupt)?;
    let mut extracted = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(corrupt)?;
        let entry_path = file
            .enclosed_name()
            .ok_or_else(|| ExtractionError::PathTraversal {
                path: file.name().to_owned(),
            })?;
        validate_entry_path(&entry_path)?;
        let dest_path = dest_dir.join(&entry_path);

        if file.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }

        let size = file.size();
        let contents = read_entry(&mut file, size, &entry_path)?;
        write_extracted(&dest_path, &contents)?;
        extracted.push(dest_path);
    }

    Ok(extracted)
}

/// Validate that an entry path does not escape the destination directory
/// via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        ) {
            return Err(ExtractionError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}

fn corrupt(err: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::CorruptArchive {
        reason: err.to_string(),
    }
}

/// Read one entry fully before touching the destination, so that decoding
/// failures are attributed to the archive and write failures to the disk.
fn read_entry(reader: &mut dyn Read, size: u64, path: &Path) -> Result<Vec<u8>, ExtractionError> {
    let mut contents = Vec::new();
    reader.read_to_end(&mut contents).map_err(corrupt)?;
    if contents.len() as u64 != size {
        return Err(ExtractionError::CorruptArchive {
            reason: format!(
                "entry {} is truncated: expected {size} bytes, found {}",
                path.display(),
                contents.len()
            ),
        });
    }
    Ok(contents)
}

fn write_extracted(dest_path: &Path, contents: &[u8]) -> Result<(), ExtractionError> {
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest_path, contents)?;
    Ok(())
}
