//! Host platform detection and the platform key used for catalog lookups.
//!
//! A [`PlatformKey`] pairs an [`OsFamily`] with an [`Architecture`]. Known
//! names and their aliases map onto named variants; any other well-formed
//! name is kept verbatim in an `Other` variant and is never mapped onto a
//! neighbouring platform. Only a missing or unreadable name is rejected with
//! [`ArtefactError::UnsupportedPlatform`]. Whether a platform actually has a
//! release artefact is a separate question answered by the catalog.

use super::error::{ArtefactError, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Operating system family of a release artefact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum OsFamily {
    /// Apple macOS.
    MacOs,
    /// Linux (any libc).
    Linux,
    /// Microsoft Windows.
    Windows,
    /// FreeBSD.
    FreeBsd,
    /// Any other operating system, by its lowercase name.
    Other(String),
}

impl OsFamily {
    /// Every named operating system family.
    pub const ALL: [Self; 4] = [Self::MacOs, Self::Linux, Self::Windows, Self::FreeBsd];

    /// Return the lowercase name used in release asset file names.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::FreeBsd => "freebsd",
            Self::Other(name) => name,
        }
    }

    /// Parse an operating system name, accepting common aliases.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::UnsupportedPlatform`] for empty or
    /// unreadable names.
    pub fn from_name(name: &str) -> Result<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "macos" | "darwin" | "osx" | "apple-darwin" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            "windows" | "win32" => Ok(Self::Windows),
            "freebsd" => Ok(Self::FreeBsd),
            _ => other_name(name, lowered, "operating system").map(Self::Other),
        }
    }
}

impl TryFrom<String> for OsFamily {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_name(&value)
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture of a release artefact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Architecture {
    /// 64-bit x86 (Intel/AMD).
    X86_64,
    /// 64-bit ARM (Apple silicon, Graviton, ...).
    Aarch64,
    /// 32-bit x86.
    X86,
    /// 32-bit ARM.
    Arm,
    /// 64-bit RISC-V.
    Riscv64,
    /// Any other architecture, by its lowercase name.
    Other(String),
}

impl Architecture {
    /// Every named CPU architecture.
    pub const ALL: [Self; 5] = [
        Self::X86_64,
        Self::Aarch64,
        Self::X86,
        Self::Arm,
        Self::Riscv64,
    ];

    /// Return the lowercase name used in release asset file names.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::X86 => "x86",
            Self::Arm => "arm",
            Self::Riscv64 => "riscv64",
            Self::Other(name) => name,
        }
    }

    /// Parse an architecture name, accepting common aliases.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::UnsupportedPlatform`] for empty or
    /// unreadable names.
    pub fn from_name(name: &str) -> Result<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "x86_64" | "amd64" | "x64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            "x86" | "i386" | "i686" => Ok(Self::X86),
            "arm" | "armv7" => Ok(Self::Arm),
            "riscv64" | "riscv64gc" => Ok(Self::Riscv64),
            _ => other_name(name, lowered, "CPU architecture").map(Self::Other),
        }
    }
}

impl TryFrom<String> for Architecture {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_name(&value)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An (operating system, architecture) pair identifying one artefact flavour.
///
/// # Examples
///
/// ```
/// use auths_installer::artefact::platform::{Architecture, OsFamily, PlatformKey};
///
/// let key: PlatformKey = "macos-aarch64".parse().expect("valid platform");
/// assert_eq!(key.os(), &OsFamily::MacOs);
/// assert_eq!(key.arch(), &Architecture::Aarch64);
/// assert_eq!(key.to_string(), "macos-aarch64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformKey {
    os: OsFamily,
    arch: Architecture,
}

impl PlatformKey {
    /// Create a platform key from its components.
    #[must_use]
    pub const fn new(os: OsFamily, arch: Architecture) -> Self {
        Self { os, arch }
    }

    /// Build a platform key from raw OS and architecture names.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::UnsupportedPlatform`] if either name is
    /// empty or unreadable.
    pub fn from_names(os: &str, arch: &str) -> Result<Self> {
        Ok(Self::new(OsFamily::from_name(os)?, Architecture::from_name(arch)?))
    }

    /// Return the operating system family.
    #[must_use]
    pub fn os(&self) -> &OsFamily {
        &self.os
    }

    /// Return the CPU architecture.
    #[must_use]
    pub fn arch(&self) -> &Architecture {
        &self.arch
    }
}

impl FromStr for PlatformKey {
    type Err = ArtefactError;

    /// Parse `<os>-<arch>`, for example `linux-x86_64`.
    fn from_str(value: &str) -> Result<Self> {
        let (os, arch) = value
            .split_once('-')
            .ok_or_else(|| unsupported(value, "expected <os>-<arch>, e.g. linux-x86_64"))?;
        Self::from_names(os, arch)
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Detect the platform this process is running on.
///
/// Reads the compile-time target OS and architecture names. Detection only
/// fails if those names are missing or unreadable; a platform without a
/// published artefact is reported later by the catalog.
///
/// # Errors
///
/// Returns [`ArtefactError::UnsupportedPlatform`] if a host name cannot be
/// read.
pub fn detect() -> Result<PlatformKey> {
    PlatformKey::from_names(std::env::consts::OS, std::env::consts::ARCH)
}

/// Accept `lowered` as an unlisted platform name if it is readable.
fn other_name(raw: &str, lowered: String, kind: &str) -> Result<String> {
    if lowered.is_empty() {
        return Err(unsupported(raw, &format!("{kind} could not be determined")));
    }
    if !lowered.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(unsupported(raw, &format!("{kind} name is not readable")));
    }
    Ok(lowered)
}

fn unsupported(value: &str, reason: &str) -> ArtefactError {
    ArtefactError::UnsupportedPlatform {
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::macos("macos", "aarch64", OsFamily::MacOs, Architecture::Aarch64)]
    #[case::darwin_alias("darwin", "arm64", OsFamily::MacOs, Architecture::Aarch64)]
    #[case::linux_intel("linux", "x86_64", OsFamily::Linux, Architecture::X86_64)]
    #[case::linux_amd64_alias("Linux", "amd64", OsFamily::Linux, Architecture::X86_64)]
    #[case::windows("windows", "x86_64", OsFamily::Windows, Architecture::X86_64)]
    fn from_names_accepts_known_platforms(
        #[case] os: &str,
        #[case] arch: &str,
        #[case] expected_os: OsFamily,
        #[case] expected_arch: Architecture,
    ) {
        let key = PlatformKey::from_names(os, arch).expect("known platform");
        assert_eq!(key.os(), &expected_os);
        assert_eq!(key.arch(), &expected_arch);
    }

    #[rstest]
    #[case::netbsd("netbsd", "x86_64", "netbsd-x86_64")]
    #[case::s390x("linux", "s390x", "linux-s390x")]
    #[case::loongarch("Linux", "LoongArch64", "linux-loongarch64")]
    #[case::powerpc("illumos", "powerpc64", "illumos-powerpc64")]
    fn from_names_keeps_unlisted_names(
        #[case] os: &str,
        #[case] arch: &str,
        #[case] expected: &str,
    ) {
        let key = PlatformKey::from_names(os, arch).expect("determinable platform");
        assert_eq!(key.to_string(), expected);
        assert_eq!(expected.parse::<PlatformKey>(), Ok(key));
    }

    #[test]
    fn unlisted_names_do_not_alias_named_variants() {
        let key: PlatformKey = "netbsd-s390x".parse().expect("determinable platform");
        assert_eq!(key.os(), &OsFamily::Other("netbsd".to_owned()));
        assert_eq!(key.arch(), &Architecture::Other("s390x".to_owned()));
    }

    #[rstest]
    #[case::empty_os("", "x86_64")]
    #[case::empty_arch("macos", "")]
    #[case::blank_arch("linux", "   ")]
    #[case::unreadable_os("plan 9", "x86_64")]
    #[case::unreadable_arch("linux", "x86/64")]
    fn from_names_rejects_missing_or_unreadable_names(#[case] os: &str, #[case] arch: &str) {
        let err = PlatformKey::from_names(os, arch).expect_err("undeterminable platform");
        assert!(matches!(err, ArtefactError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn parses_and_displays_round_trip_form() {
        let key: PlatformKey = "linux-x86_64".parse().expect("valid");
        assert_eq!(key, PlatformKey::new(OsFamily::Linux, Architecture::X86_64));
        assert_eq!(key.to_string(), "linux-x86_64");
    }

    #[test]
    fn parse_rejects_missing_separator() {
        let err = "linux".parse::<PlatformKey>().expect_err("no arch");
        assert!(err.to_string().contains("<os>-<arch>"));
    }

    #[test]
    fn all_names_parse_back_to_themselves() {
        for os in OsFamily::ALL {
            assert_eq!(OsFamily::from_name(os.as_str()), Ok(os.clone()));
        }
        for arch in Architecture::ALL {
            assert_eq!(Architecture::from_name(arch.as_str()), Ok(arch.clone()));
        }
    }

    #[test]
    fn detect_reads_host_names() {
        let key = detect().expect("host platform should be determinable");
        let host_os = OsFamily::from_name(std::env::consts::OS).expect("host OS");
        assert_eq!(key.os(), &host_os);
        assert_eq!(key.to_string().parse::<PlatformKey>(), Ok(key));
    }
}
