//! auths installer CLI entrypoint.
//!
//! This binary installs the auths executables from a published release and
//! reports failures with a distinct exit code per failure kind.

use auths_installer::artefact::catalog::ArtifactCatalog;
use auths_installer::artefact::catalog_file::load_catalog;
use auths_installer::artefact::platform::PlatformKey;
use auths_installer::artefact::release_version::ReleaseVersion;
use auths_installer::cli::Cli;
use auths_installer::error::{EXIT_INTERRUPTED, InstallerError, Result};
use auths_installer::executable::default_executables;
use auths_installer::output::{
    DryRunInfo, catalog_listing, failure_message, install_summary, success_message,
    write_stderr_line,
};
use auths_installer::pipeline::{InstallRequest, resolve_artefact, run_install};
use auths_installer::stager::default_bin_dir;
use auths_installer::staging;
use clap::Parser;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    install_interrupt_handler();

    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Removes live staging directories before exiting on Ctrl-C.
fn install_interrupt_handler() {
    let result = ctrlc::set_handler(|| {
        let removed = staging::cleanup_registered();
        log::debug!("removed {removed} staging directories after interrupt");
        let _ = writeln!(std::io::stderr(), "Interrupted.");
        std::process::exit(EXIT_INTERRUPTED);
    });
    if let Err(err) = result {
        log::warn!("failed to install interrupt handler: {err}");
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let catalog = match &cli.catalog {
        Some(path) => load_catalog(path)?,
        None => ArtifactCatalog::builtin(),
    };

    if cli.list {
        write_stderr_line(stderr, catalog_listing(&catalog));
        return Ok(());
    }

    let request = build_request(cli, &catalog)?;

    if cli.dry_run {
        return run_dry(&request, &catalog, stderr);
    }

    let outcome = run_install(&request, &catalog, stderr)?;
    if !cli.quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(
            stderr,
            success_message(outcome.installed.len(), &request.target_dir),
        );
        write_stderr_line(stderr, install_summary(&outcome.installed, &outcome.skipped));
        if let Some(reported) = &outcome.reported_version {
            write_stderr_line(stderr, format!("Verified: {reported}"));
        }
    }
    Ok(())
}

/// Shows the resolved artefact without downloading or writing anything.
fn run_dry(
    request: &InstallRequest,
    catalog: &ArtifactCatalog,
    stderr: &mut dyn Write,
) -> Result<()> {
    let (_, descriptor) = resolve_artefact(request, catalog)?;
    let executables: Vec<String> = request
        .executables
        .iter()
        .map(ToString::to_string)
        .collect();
    let info = DryRunInfo {
        descriptor,
        target_dir: &request.target_dir,
        executables: &executables,
        verify_version: request.verify_version,
    };
    write_stderr_line(stderr, info.display_text());
    Ok(())
}

fn build_request(cli: &Cli, catalog: &ArtifactCatalog) -> Result<InstallRequest> {
    let version = match cli.release.as_deref() {
        Some(raw) => ReleaseVersion::try_from(raw).map_err(InstallerError::InvalidRelease)?,
        None => catalog.latest().cloned().ok_or(InstallerError::NoReleases)?,
    };
    let platform = cli
        .platform
        .as_deref()
        .map(str::parse::<PlatformKey>)
        .transpose()
        .map_err(InstallerError::UnsupportedPlatform)?;
    let target_dir = cli
        .bin_dir
        .clone()
        .or_else(default_bin_dir)
        .ok_or(InstallerError::NoBinDir)?;

    Ok(InstallRequest {
        version,
        platform,
        target_dir,
        executables: default_executables(),
        verify_version: !cli.skip_version_check,
        quiet: cli.quiet,
    })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, failure_message(&err));
            err.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("auths-installer").chain(args.iter().copied()))
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        assert_eq!(exit_code_for_run_result(Ok(()), &mut stderr), 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_its_code() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(InstallerError::NoReleases), &mut stderr);
        assert_eq!(exit_code, 4);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("error (resolving)"));
    }

    #[test]
    fn build_request_defaults_to_latest_release() {
        let catalog = ArtifactCatalog::builtin();
        let request = build_request(&cli(&["--bin-dir", "/opt/bin"]), &catalog).expect("request");
        assert_eq!(request.version.as_str(), "0.0.1-rc.11");
        assert_eq!(request.target_dir, Utf8PathBuf::from("/opt/bin"));
        assert!(request.platform.is_none());
        assert!(request.verify_version);
    }

    #[test]
    fn build_request_rejects_unreadable_platform() {
        let err = build_request(
            &cli(&["--bin-dir", "/opt/bin", "--platform", "plan9"]),
            &ArtifactCatalog::builtin(),
        )
        .expect_err("no architecture");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn uncatalogued_platform_is_reported_as_coverage() {
        let catalog = ArtifactCatalog::builtin();
        let request = build_request(
            &cli(&["--bin-dir", "/opt/bin", "--platform", "plan9-mips"]),
            &catalog,
        )
        .expect("platform names are readable");
        let err = run_dry(&request, &catalog, &mut Vec::new()).expect_err("not catalogued");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn build_request_rejects_malformed_release() {
        let err = build_request(
            &cli(&["--bin-dir", "/opt/bin", "--release", "latest!"]),
            &ArtifactCatalog::builtin(),
        )
        .expect_err("malformed release");
        assert!(matches!(err, InstallerError::InvalidRelease(_)));
    }

    #[test]
    fn build_request_needs_a_release_when_catalog_is_empty() {
        let err = build_request(&cli(&["--bin-dir", "/opt/bin"]), &ArtifactCatalog::new())
            .expect_err("no releases");
        assert!(matches!(err, InstallerError::NoReleases));
    }

    #[test]
    fn dry_run_prints_descriptor_without_writing() {
        let request = build_request(
            &cli(&["--bin-dir", "/nonexistent/bin", "--platform", "linux-x86_64"]),
            &ArtifactCatalog::builtin(),
        )
        .expect("request");
        let mut stderr = Vec::new();
        run_dry(&request, &ArtifactCatalog::builtin(), &mut stderr).expect("dry run");

        let text = String::from_utf8(stderr).expect("UTF-8");
        assert!(text.contains("auths-linux-x86_64.tar.gz"));
        assert!(text.contains("auths (required)"));
        assert!(!std::path::Path::new("/nonexistent/bin").exists());
    }
}
