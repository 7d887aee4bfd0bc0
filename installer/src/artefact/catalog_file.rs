//! Release index deserialization.
//!
//! Loads an [`ArtifactCatalog`] from a TOML release index so that new
//! releases can be installed without rebuilding the installer:
//!
//! ```toml
//! [[release]]
//! version = "0.0.1-rc.11"
//! url_template = "https://example.test/v{version}/auths-{os}-{arch}.tar.gz"
//!
//! [[release.artefact]]
//! os = "macos"
//! arch = "aarch64"
//! sha256 = "f1bdc4674b43d1502c0040f6b1b2df4f1818622b98c56bde0fad532b34485bfa"
//! ```
//!
//! Every digest is checked while loading; an index carrying placeholder
//! checksums is rejected as a whole.

use super::catalog::{ArtifactCatalog, ArtifactDescriptor, CatalogError, expand_url};
use super::platform::{Architecture, OsFamily, PlatformKey};
use super::release_version::ReleaseVersion;
use super::sha256_digest::Sha256Digest;
use camino::Utf8Path;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReleaseIndex {
    #[serde(default)]
    release: Vec<ReleaseEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReleaseEntry {
    version: ReleaseVersion,
    url_template: Option<String>,
    #[serde(default)]
    artefact: Vec<ArtefactEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtefactEntry {
    os: OsFamily,
    arch: Architecture,
    sha256: String,
    url: Option<String>,
}

/// Parse a release index from TOML text.
///
/// # Errors
///
/// Returns [`CatalogError::Parse`] for malformed TOML or unknown fields,
/// [`CatalogError::InvalidEntry`] for a missing, malformed, or placeholder
/// digest, [`CatalogError::MissingUrl`] when an artefact has no URL, and
/// [`CatalogError::DuplicateEntry`] when a platform is listed twice.
pub fn parse_catalog(text: &str) -> Result<ArtifactCatalog, CatalogError> {
    let index: ReleaseIndex = toml::from_str(text)?;
    let mut catalog = ArtifactCatalog::new();

    for release in index.release {
        for artefact in release.artefact {
            let platform = PlatformKey::new(artefact.os, artefact.arch);
            let digest = Sha256Digest::try_from(artefact.sha256)?;
            let url = match (artefact.url, release.url_template.as_deref()) {
                (Some(url), _) => url,
                (None, Some(template)) => expand_url(template, &release.version, &platform),
                (None, None) => {
                    return Err(CatalogError::MissingUrl {
                        version: release.version.clone(),
                        platform,
                    });
                }
            };
            catalog.insert(ArtifactDescriptor::new(
                platform,
                release.version.clone(),
                url,
                digest.into_inner(),
            ))?;
        }
    }

    log::debug!("loaded {} artefact(s) from release index", catalog.len());
    Ok(catalog)
}

/// Read and parse the release index at `path`.
///
/// # Errors
///
/// Returns [`CatalogError::Read`] if the file cannot be read, or any error
/// from [`parse_catalog`].
pub fn load_catalog(path: &Utf8Path) -> Result<ArtifactCatalog, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_string(),
        source,
    })?;
    parse_catalog(&text)
}
