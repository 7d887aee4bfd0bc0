//! CLI argument definitions for the auths installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

/// Environment variable naming the binary directory.
pub const INSTALL_DIR_ENV: &str = "AUTHS_INSTALL_DIR";

/// Install the auths command-line tools from a published release.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "auths-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install the auths command-line tools from a published release.\n\n",
    "The installer detects the host platform, looks up the matching release ",
    "archive, downloads it, verifies its SHA-256 checksum, and installs the ",
    "auths executable (plus auths-sign and auths-verify when the release ",
    "ships them) into a binary directory. Finally it runs `auths --version` ",
    "to confirm the expected release is in place.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the newest catalogued release:\n",
    "    $ auths-installer\n\n",
    "  Install a specific release into /usr/local/bin:\n",
    "    $ auths-installer --release 0.0.1-rc.11 --bin-dir /usr/local/bin\n\n",
    "  Show what would be installed:\n",
    "    $ auths-installer --dry-run\n\n",
    "  List catalogued releases and platforms:\n",
    "    $ auths-installer --list\n\n",
    "  Install from a custom release index:\n",
    "    $ auths-installer --catalog releases.toml --release 0.0.2",
))]
pub struct Cli {
    /// Release to install [default: newest catalogued release].
    #[arg(short, long, value_name = "VERSION")]
    pub release: Option<String>,

    /// Install for this platform instead of the host, as `<os>-<arch>`.
    #[arg(long, value_name = "OS-ARCH")]
    pub platform: Option<String>,

    /// Directory to install executables into [default: platform-specific].
    #[arg(short, long, value_name = "DIR", env = INSTALL_DIR_ENV)]
    pub bin_dir: Option<Utf8PathBuf>,

    /// Load releases from a TOML release index instead of the built-in one.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<Utf8PathBuf>,

    /// Skip running the installed executable to confirm its version.
    #[arg(long)]
    pub skip_version_check: bool,

    /// Show what would be installed and exit without downloading.
    #[arg(long)]
    pub dry_run: bool,

    /// List catalogued releases and platforms, then exit.
    #[arg(long, conflicts_with = "dry_run")]
    pub list: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Return the log level selected by `-v`.
    ///
    /// Warnings are shown by default; each `-v` adds a level.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
