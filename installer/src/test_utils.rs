//! Shared test utilities for the installer crate.
//!
//! Builds release archives in memory and provides deterministic stand-ins
//! for the network and process collaborators of the pipeline.

use crate::artefact::download::{ArtefactFetcher, FetchError};
use crate::artefact::sha256_digest::Sha256Digest;
use crate::version_check::{VersionCheckError, VersionCommand};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

/// Return the lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256Digest::compute(bytes).into_inner()
}

fn append_entries<W: Write>(builder: &mut tar::Builder<W>, entries: &[(&str, &[u8])]) {
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *contents)
            .expect("append tar entry");
    }
}

/// Build a gzip-compressed tarball holding `entries`.
pub fn tar_gz_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    append_entries(&mut builder, entries);
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// Build a zstd-compressed tarball holding `entries`.
pub fn tar_zst_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = zstd::Encoder::new(Vec::new(), 0).expect("zstd encoder");
    let mut builder = tar::Builder::new(encoder);
    append_entries(&mut builder, entries);
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish zstd")
}

/// Build a zip archive holding `entries`.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
    for (path, contents) in entries {
        zip.start_file(*path, options).expect("start zip entry");
        zip.write_all(contents).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Return a shell script that prints `auths <version>` when run.
pub fn version_script(version: &str) -> Vec<u8> {
    format!("#!/bin/sh\necho \"auths {version}\"\n").into_bytes()
}

/// An [`ArtefactFetcher`] serving fixed bodies by URL.
///
/// Unknown URLs fail permanently, as a 404 would. Every request is recorded.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl StaticFetcher {
    /// Create a fetcher with no bodies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    #[must_use]
    pub fn with_body(mut self, url: impl Into<String>, body: Vec<u8>) -> Self {
        self.bodies.insert(url.into(), body);
        self
    }

    /// Return the URLs requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ArtefactFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.borrow_mut().push(url.to_owned());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Permanent {
                url: url.to_owned(),
                reason: "HTTP status 404".to_owned(),
            })
    }
}

/// A [`VersionCommand`] that reports a fixed string for every executable.
///
/// Every queried path is recorded.
#[derive(Debug)]
pub struct StubVersionCommand {
    output: String,
    queried: RefCell<Vec<PathBuf>>,
}

impl StubVersionCommand {
    /// Create a stub that reports `output`.
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            queried: RefCell::new(Vec::new()),
        }
    }

    /// Return the executables queried so far.
    pub fn queried(&self) -> Vec<PathBuf> {
        self.queried.borrow().clone()
    }
}

impl VersionCommand for StubVersionCommand {
    fn version_output(&self, exe: &Path) -> Result<String, VersionCheckError> {
        self.queried.borrow_mut().push(exe.to_path_buf());
        Ok(self.output.clone())
    }
}
