//! Release artefact catalog.
//!
//! Maps a `(release version, platform)` pair to the download URL and
//! expected SHA-256 of the archive published for it. Supported combinations
//! are listed explicitly: a lookup for anything not listed fails with
//! [`CatalogError::NoArtifactForPlatform`] and never falls back to another
//! platform's archive.

use super::error::ArtefactError;
use super::platform::PlatformKey;
use super::release_version::ReleaseVersion;
use std::collections::BTreeMap;
use std::fmt;

/// URL template for archives published on the auths release repository.
///
/// `{version}`, `{os}`, and `{arch}` are substituted by [`expand_url`].
pub const AUTHS_RELEASE_URL_TEMPLATE: &str = "https://github.com/bordumb/auths-releases/releases/download/v{version}/auths-{os}-{arch}.tar.gz";

/// One built-in catalog row.
struct BuiltinArtefact {
    version: &'static str,
    os: &'static str,
    arch: &'static str,
    sha256: &'static str,
}

/// Releases known to this build of the installer, oldest first.
const BUILTIN_ARTEFACTS: &[BuiltinArtefact] = &[
    BuiltinArtefact {
        version: "0.0.1-rc.11",
        os: "macos",
        arch: "aarch64",
        sha256: "f1bdc4674b43d1502c0040f6b1b2df4f1818622b98c56bde0fad532b34485bfa",
    },
    BuiltinArtefact {
        version: "0.0.1-rc.11",
        os: "linux",
        arch: "x86_64",
        sha256: "5398ecebd6981f146ff53791aa42211866a43a372706593fd18533f709153d93",
    },
    BuiltinArtefact {
        version: "0.0.1-rc.11",
        os: "linux",
        arch: "aarch64",
        sha256: "c199bc049fe187a1d90819195adee97fa00e517586ad9a83d9d59b3287cfc89e",
    },
];

/// Errors arising from catalog construction and lookup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No artefact is published for the requested platform and version.
    #[error("no artefact for {platform} in release {version}; supported platforms: {supported}")]
    NoArtifactForPlatform {
        /// The requested release.
        version: ReleaseVersion,
        /// The requested platform.
        platform: PlatformKey,
        /// Comma-separated platforms catalogued for the release, or `none`.
        supported: String,
    },

    /// The same `(version, platform)` pair was listed twice.
    #[error("duplicate catalog entry for {platform} in release {version}")]
    DuplicateEntry {
        /// The release listed twice.
        version: ReleaseVersion,
        /// The platform listed twice.
        platform: PlatformKey,
    },

    /// A catalog entry holds an invalid value.
    #[error("invalid catalog entry: {0}")]
    InvalidEntry(#[from] ArtefactError),

    /// A catalog entry has neither a URL nor a URL template to derive one.
    #[error("catalog entry for {platform} in release {version} has no download URL")]
    MissingUrl {
        /// The release missing a URL.
        version: ReleaseVersion,
        /// The platform missing a URL.
        platform: PlatformKey,
    },

    /// The release index file could not be read.
    #[error("failed to read release index {path}: {source}")]
    Read {
        /// Path to the release index.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The release index file is not valid TOML for the expected schema.
    #[error("failed to parse release index: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Location and expected checksum of one release archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    platform: PlatformKey,
    version: ReleaseVersion,
    url: String,
    expected_sha256: String,
}

impl ArtifactDescriptor {
    /// Create a descriptor.
    ///
    /// The expected digest is kept exactly as declared; it is judged by the
    /// integrity verifier so that an untrusted value is refused at the point
    /// where it would matter.
    #[must_use]
    pub fn new(
        platform: PlatformKey,
        version: ReleaseVersion,
        url: impl Into<String>,
        expected_sha256: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            version,
            url: url.into(),
            expected_sha256: expected_sha256.into(),
        }
    }

    /// Return the platform the archive was built for.
    #[must_use]
    pub fn platform(&self) -> &PlatformKey {
        &self.platform
    }

    /// Return the release the archive belongs to.
    #[must_use]
    pub fn version(&self) -> &ReleaseVersion {
        &self.version
    }

    /// Return the download URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Return the expected SHA-256 as declared.
    #[must_use]
    pub fn expected_sha256(&self) -> &str {
        &self.expected_sha256
    }
}

impl fmt::Display for ArtifactDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "auths {} for {}: {} (sha256 {})",
            self.version, self.platform, self.url, self.expected_sha256
        )
    }
}

/// Static mapping from `(version, platform)` to artefact descriptors.
///
/// # Examples
///
/// ```
/// use auths_installer::artefact::catalog::ArtifactCatalog;
/// use auths_installer::artefact::platform::PlatformKey;
/// use auths_installer::artefact::release_version::ReleaseVersion;
///
/// let catalog = ArtifactCatalog::builtin();
/// let version = ReleaseVersion::try_from("0.0.1-rc.11").expect("valid version");
/// let platform: PlatformKey = "macos-aarch64".parse().expect("valid platform");
/// let descriptor = catalog.resolve(&version, &platform).expect("catalogued");
/// assert!(descriptor.url().ends_with("auths-macos-aarch64.tar.gz"));
///
/// let windows: PlatformKey = "windows-x86_64".parse().expect("valid platform");
/// assert!(catalog.resolve(&version, &windows).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArtifactCatalog {
    releases: Vec<ReleaseVersion>,
    entries: BTreeMap<ReleaseVersion, BTreeMap<PlatformKey, ArtifactDescriptor>>,
}

impl ArtifactCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the catalog of releases compiled into the installer.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for row in BUILTIN_ARTEFACTS {
            // The table is fixed at compile time; the tests assert it is valid.
            let Ok(version) = ReleaseVersion::try_from(row.version) else {
                log::error!("skipping malformed built-in release {}", row.version);
                continue;
            };
            let Ok(platform) = PlatformKey::from_names(row.os, row.arch) else {
                log::error!("skipping malformed built-in platform {}-{}", row.os, row.arch);
                continue;
            };
            let url = expand_url(AUTHS_RELEASE_URL_TEMPLATE, &version, &platform);
            let descriptor = ArtifactDescriptor::new(platform, version, url, row.sha256);
            if let Err(err) = catalog.insert(descriptor) {
                log::error!("skipping built-in catalog row: {err}");
            }
        }
        catalog
    }

    /// Add a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateEntry`] if the `(version, platform)`
    /// pair is already present.
    pub fn insert(&mut self, descriptor: ArtifactDescriptor) -> Result<(), CatalogError> {
        let version = descriptor.version().clone();
        let platform = descriptor.platform().clone();
        let platforms = self.entries.entry(version.clone()).or_default();
        if platforms.contains_key(&platform) {
            return Err(CatalogError::DuplicateEntry { version, platform });
        }
        platforms.insert(platform, descriptor);
        if !self.releases.contains(&version) {
            self.releases.push(version);
        }
        Ok(())
    }

    /// Look up the artefact for `platform` in release `version`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NoArtifactForPlatform`] if the pair is not
    /// catalogued, including when the release itself is unknown.
    pub fn resolve(
        &self,
        version: &ReleaseVersion,
        platform: &PlatformKey,
    ) -> Result<&ArtifactDescriptor, CatalogError> {
        self.entries
            .get(version)
            .and_then(|platforms| platforms.get(platform))
            .ok_or_else(|| CatalogError::NoArtifactForPlatform {
                version: version.clone(),
                platform: platform.clone(),
                supported: self.supported_list(version),
            })
    }

    /// Return catalogued releases in the order they were added.
    #[must_use]
    pub fn releases(&self) -> &[ReleaseVersion] {
        &self.releases
    }

    /// Return the most recently added release, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&ReleaseVersion> {
        self.releases.last()
    }

    /// Return the platforms catalogued for `version`, in sorted order.
    #[must_use]
    pub fn platforms(&self, version: &ReleaseVersion) -> Vec<PlatformKey> {
        self.entries
            .get(version)
            .map(|platforms| platforms.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Iterate over every descriptor, grouped by release.
    pub fn descriptors(&self) -> impl Iterator<Item = &ArtifactDescriptor> {
        self.releases
            .iter()
            .filter_map(|version| self.entries.get(version))
            .flat_map(BTreeMap::values)
    }

    /// Return the number of catalogued artefacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Return whether the catalog has no artefacts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn supported_list(&self, version: &ReleaseVersion) -> String {
        let platforms = self.platforms(version);
        if platforms.is_empty() {
            return "none".to_owned();
        }
        platforms
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Substitute `{version}`, `{os}`, and `{arch}` in a URL template.
#[must_use]
pub fn expand_url(template: &str, version: &ReleaseVersion, platform: &PlatformKey) -> String {
    template
        .replace("{version}", version.as_str())
        .replace("{os}", platform.os().as_str())
        .replace("{arch}", platform.arch().as_str())
}
