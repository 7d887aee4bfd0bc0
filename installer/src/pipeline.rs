//! Install pipeline orchestration.
//!
//! One run walks the stages of [`Stage`] strictly in order: detect the
//! platform, resolve the artefact, fetch it with bounded retry, verify its
//! digest, extract it into a run-scoped staging directory, install the
//! selected executables, and finally ask the primary executable for its
//! version. The first failing stage ends the run with its typed error; no
//! stage is revisited.

use crate::artefact::catalog::{ArtifactCatalog, ArtifactDescriptor};
use crate::artefact::download::{ArtefactFetcher, HttpFetcher};
use crate::artefact::extraction::{ArchiveExtractor, ArchiveFormat, ArchiveUnpacker};
use crate::artefact::platform::{self, PlatformKey};
use crate::artefact::release_version::ReleaseVersion;
use crate::artefact::retry::{RetryPolicy, fetch_with_retry};
use crate::artefact::verification;
use crate::error::{InstallerError, Result, Stage};
use crate::executable::{ExecutableSpec, InstallPlan, plan_install};
use crate::output::write_stderr_line;
use crate::stager::Stager;
use crate::staging::StagingDir;
use crate::version_check::{ProcessVersionCommand, VersionCommand, check_version};
use camino::Utf8PathBuf;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Parameters for one install run.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// Release to install.
    pub version: ReleaseVersion,
    /// Platform override; the host platform is detected when absent.
    pub platform: Option<PlatformKey>,
    /// Directory the executables are installed into.
    pub target_dir: Utf8PathBuf,
    /// Executables to install, in order.
    pub executables: Vec<ExecutableSpec>,
    /// Whether to run the post-install version check.
    pub verify_version: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

/// The result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Platform that was installed.
    pub platform: PlatformKey,
    /// Release that was installed.
    pub version: ReleaseVersion,
    /// Paths of the installed executables, in request order.
    pub installed: Vec<Utf8PathBuf>,
    /// Optional executables absent from the archive.
    pub skipped: Vec<String>,
    /// Version output of the primary executable; `None` when no check ran.
    pub reported_version: Option<String>,
}

/// Side-effecting collaborators used by a run.
pub struct Collaborators<'a> {
    /// Downloads archives.
    pub fetcher: &'a dyn ArtefactFetcher,
    /// Unpacks archives.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Queries the installed executable for its version.
    pub version_command: &'a dyn VersionCommand,
    /// Download retry schedule.
    pub retry: RetryPolicy,
    /// Sleeps between download attempts.
    pub sleep: &'a dyn Fn(Duration),
    /// Parent of the staging directory; the system temporary directory
    /// when absent.
    pub staging_base: Option<&'a Path>,
}

/// Run the pipeline with production HTTP, extraction, and process
/// implementations.
///
/// # Errors
///
/// Returns the error of the first stage that fails.
pub fn run_install(
    request: &InstallRequest,
    catalog: &ArtifactCatalog,
    stderr: &mut dyn Write,
) -> Result<InstallOutcome> {
    let sleep = std::thread::sleep;
    let collaborators = Collaborators {
        fetcher: &HttpFetcher,
        extractor: &ArchiveUnpacker,
        version_command: &ProcessVersionCommand,
        retry: RetryPolicy::default(),
        sleep: &sleep,
        staging_base: None,
    };
    run_install_with(request, catalog, &collaborators, stderr)
}

/// Run the pipeline with injected collaborators.
///
/// The production entry point [`run_install`] delegates here; tests inject
/// mocks and stubs.
///
/// # Errors
///
/// Returns the error of the first stage that fails. A failed version check
/// is reported as [`InstallerError::VersionCheck`] after the executables
/// are already in place.
pub fn run_install_with(
    request: &InstallRequest,
    catalog: &ArtifactCatalog,
    collaborators: &Collaborators<'_>,
    stderr: &mut dyn Write,
) -> Result<InstallOutcome> {
    let (platform, descriptor) = resolve_artefact(request, catalog)?;
    progress(
        request,
        stderr,
        format!("Installing auths {} for {platform}", descriptor.version()),
    );

    let format = ArchiveFormat::from_url(descriptor.url()).ok_or_else(|| {
        InstallerError::UnknownArchiveFormat {
            url: descriptor.url().to_owned(),
        }
    })?;

    enter(Stage::Fetching);
    progress(request, stderr, format!("Downloading {}...", descriptor.url()));
    let bytes = fetch_with_retry(
        collaborators.fetcher,
        descriptor.url(),
        &collaborators.retry,
        collaborators.sleep,
    )?;

    enter(Stage::Verifying);
    let digest = verification::verify(&bytes, descriptor.expected_sha256())?;
    log::info!("verified sha256 {digest}");

    enter(Stage::Extracting);
    let staging = match collaborators.staging_base {
        Some(base) => StagingDir::create_in(base, &platform),
        None => StagingDir::create(&platform),
    }
    .map_err(|source| InstallerError::Staging { source })?;
    let extracted = collaborators
        .extractor
        .extract(&bytes, format, staging.path())?;
    log::debug!("extracted {} file(s)", extracted.len());

    enter(Stage::Installing);
    let plan = plan_install(&extracted, &request.executables)?;
    let installed = install_plan(request, &plan, stderr)?;
    if let Err(err) = staging.close() {
        log::warn!("failed to remove staging directory: {err}");
    }

    let reported_version = if request.verify_version {
        enter(Stage::VerifyingVersion);
        verify_installed_version(request, collaborators, &plan, &installed)?
    } else {
        None
    };

    Ok(InstallOutcome {
        platform,
        version: descriptor.version().clone(),
        installed,
        skipped: plan.skipped,
        reported_version,
    })
}

/// Perform the detecting and resolving stages only.
///
/// Used for dry runs and as the first two stages of a full run.
///
/// # Errors
///
/// Returns [`InstallerError::UnsupportedPlatform`] if the host platform
/// cannot be identified, or [`InstallerError::Catalog`] if the catalog has
/// no artefact for the request.
pub fn resolve_artefact<'c>(
    request: &InstallRequest,
    catalog: &'c ArtifactCatalog,
) -> Result<(PlatformKey, &'c ArtifactDescriptor)> {
    enter(Stage::Detecting);
    let platform = match &request.platform {
        Some(platform) => platform.clone(),
        None => platform::detect().map_err(InstallerError::UnsupportedPlatform)?,
    };

    enter(Stage::Resolving);
    let descriptor = catalog.resolve(&request.version, &platform)?;
    Ok((platform, descriptor))
}

fn install_plan(
    request: &InstallRequest,
    plan: &InstallPlan,
    stderr: &mut dyn Write,
) -> Result<Vec<Utf8PathBuf>> {
    let stager = Stager::new(request.target_dir.clone());
    progress(
        request,
        stderr,
        format!("Installing executables to {}...", stager.target_dir()),
    );
    stager.prepare()?;
    let installed = stager.stage_all(plan)?;
    for name in &plan.skipped {
        progress(
            request,
            stderr,
            format!("  {name} is not part of this release; skipped"),
        );
    }
    Ok(installed)
}

fn verify_installed_version(
    request: &InstallRequest,
    collaborators: &Collaborators<'_>,
    plan: &InstallPlan,
    installed: &[Utf8PathBuf],
) -> Result<Option<String>> {
    // `installed` is in plan order, so the first required entry is the
    // primary executable.
    let primary = plan
        .install
        .iter()
        .zip(installed)
        .find(|(planned, _)| planned.spec.is_required())
        .or_else(|| plan.install.iter().zip(installed).next())
        .map(|(_, path)| path);

    let Some(primary) = primary else {
        log::warn!("no executable was installed; skipping version check");
        return Ok(None);
    };

    check_version(
        collaborators.version_command,
        primary.as_std_path(),
        &request.version,
    )
    .map(Some)
    .map_err(|source| InstallerError::VersionCheck {
        source,
        installed: installed.to_vec(),
    })
}

fn enter(stage: Stage) {
    log::debug!("stage: {stage}");
}

fn progress(request: &InstallRequest, stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if !request.quiet {
        write_stderr_line(stderr, message);
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
