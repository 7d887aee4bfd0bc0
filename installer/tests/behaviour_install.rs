//! BDD tests for the end-to-end install pipeline.

use auths_installer::artefact::catalog::{
    AUTHS_RELEASE_URL_TEMPLATE, ArtifactCatalog, ArtifactDescriptor, expand_url,
};
use auths_installer::artefact::extraction::ArchiveUnpacker;
use auths_installer::artefact::platform::PlatformKey;
use auths_installer::artefact::release_version::ReleaseVersion;
use auths_installer::artefact::retry::RetryPolicy;
use auths_installer::error::InstallerError;
use auths_installer::executable::default_executables;
use auths_installer::pipeline::{Collaborators, InstallOutcome, InstallRequest, run_install_with};
use auths_installer::test_utils::{
    StaticFetcher, StubVersionCommand, sha256_hex, tar_gz_archive, version_script,
};
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Default)]
struct InstallWorld {
    _temp_dir: Option<tempfile::TempDir>,
    target_dir: Option<Utf8PathBuf>,
    staging_base: Option<PathBuf>,
    version: Option<ReleaseVersion>,
    catalogued_platform: Option<PlatformKey>,
    requested_platform: Option<PlatformKey>,
    checksum_override: Option<String>,
    archive_entries: Vec<String>,
    tampered: bool,
    requested_urls: Vec<String>,
    result: Option<Result<InstallOutcome, InstallerError>>,
}

impl InstallWorld {
    fn target_dir(&self) -> &Utf8PathBuf {
        self.target_dir.as_ref().expect("target_dir set")
    }

    fn outcome(&self) -> &InstallOutcome {
        match self.result.as_ref().expect("result set") {
            Ok(outcome) => outcome,
            Err(err) => panic!("expected the run to complete, got {err}"),
        }
    }

    fn error(&self) -> &InstallerError {
        match self.result.as_ref().expect("result set") {
            Ok(outcome) => panic!("expected the run to fail, got {outcome:?}"),
            Err(err) => err,
        }
    }
}

#[fixture]
fn world() -> InstallWorld {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("UTF-8 path");
    let staging_base = temp_dir.path().join("staging");
    std::fs::create_dir_all(&staging_base).expect("create staging base");
    InstallWorld {
        _temp_dir: Some(temp_dir),
        target_dir: Some(root.join("bin")),
        staging_base: Some(staging_base),
        ..Default::default()
    }
}

#[given("a catalog entry for release \"{version}\" on \"{platform}\"")]
fn given_catalog_entry(world: &mut InstallWorld, version: String, platform: String) {
    world.version = Some(ReleaseVersion::try_from(version.as_str()).expect("valid version"));
    world.catalogued_platform = Some(platform.parse().expect("valid platform"));
}

#[given("the published archive contains \"{name}\"")]
fn given_archive_entry(world: &mut InstallWorld, name: String) {
    world.archive_entries.push(name);
}

#[given("the download has been tampered with")]
fn given_tampered_download(world: &mut InstallWorld) {
    world.tampered = true;
}

#[given("the catalogued checksum is \"{checksum}\"")]
fn given_checksum_override(world: &mut InstallWorld, checksum: String) {
    world.checksum_override = Some(checksum);
}

#[given("the requested platform is \"{platform}\"")]
fn given_requested_platform(world: &mut InstallWorld, platform: String) {
    world.requested_platform = Some(platform.parse().expect("valid platform"));
}

#[when("the installer runs")]
fn when_installer_runs(world: &mut InstallWorld) {
    let version = world.version.clone().expect("version set");
    let platform = world.catalogued_platform.clone().expect("platform set");
    let url = expand_url(AUTHS_RELEASE_URL_TEMPLATE, &version, &platform);

    let script = version_script(version.as_str());
    let entries: Vec<(&str, &[u8])> = world
        .archive_entries
        .iter()
        .map(|name| (name.as_str(), script.as_slice()))
        .collect();
    let archive = tar_gz_archive(&entries);
    let checksum = world
        .checksum_override
        .clone()
        .unwrap_or_else(|| sha256_hex(&archive));
    let served = if world.tampered {
        tar_gz_archive(&[("auths", b"tampered")])
    } else {
        archive
    };

    let mut catalog = ArtifactCatalog::new();
    catalog
        .insert(ArtifactDescriptor::new(
            platform.clone(),
            version.clone(),
            url.clone(),
            checksum,
        ))
        .expect("insert descriptor");

    let fetcher = StaticFetcher::new().with_body(url, served);
    let version_command = StubVersionCommand::new(format!("auths {version}"));
    let staging_base = world.staging_base.clone().expect("staging_base set");
    let collaborators = Collaborators {
        fetcher: &fetcher,
        extractor: &ArchiveUnpacker,
        version_command: &version_command,
        retry: RetryPolicy::default(),
        sleep: &|_: Duration| {},
        staging_base: Some(&staging_base),
    };
    let request = InstallRequest {
        version,
        platform: Some(world.requested_platform.clone().unwrap_or(platform)),
        target_dir: world.target_dir().clone(),
        executables: default_executables(),
        verify_version: true,
        quiet: true,
    };

    let result = run_install_with(&request, &catalog, &collaborators, &mut Vec::new());
    world.requested_urls = fetcher.requests();
    world.result = Some(result);
}

#[then("the run completes")]
fn then_run_completes(world: &mut InstallWorld) {
    let _ = world.outcome();
}

#[then("the target directory contains \"{name}\"")]
fn then_target_contains(world: &mut InstallWorld, name: String) {
    let path = world.target_dir().join(&name);
    assert!(path.is_file(), "{path} was not installed");
    assert!(world.outcome().installed.contains(&path));
}

#[then("\"{name}\" is reported as skipped")]
fn then_reported_skipped(world: &mut InstallWorld, name: String) {
    assert!(
        world.outcome().skipped.contains(&name),
        "{name} not in {:?}",
        world.outcome().skipped
    );
    assert!(!world.target_dir().join(&name).exists());
}

#[then("the reported version contains \"{version}\"")]
fn then_reported_version(world: &mut InstallWorld, version: String) {
    let reported = world
        .outcome()
        .reported_version
        .as_deref()
        .expect("version was checked");
    assert!(reported.contains(&version), "reported {reported}");
}

#[then("the run fails at stage \"{stage}\"")]
fn then_fails_at_stage(world: &mut InstallWorld, stage: String) {
    let err = world.error();
    let actual = err.stage().map(|s| s.to_string());
    assert_eq!(actual.as_deref(), Some(stage.as_str()), "error was {err}");
}

#[then("the exit code is \"{code}\"")]
fn then_exit_code(world: &mut InstallWorld, code: String) {
    let expected: i32 = code.parse().expect("numeric exit code");
    assert_eq!(world.error().exit_code(), expected);
}

#[then("the target directory is untouched")]
fn then_target_untouched(world: &mut InstallWorld) {
    assert!(
        !world.target_dir().exists(),
        "{} should not have been created",
        world.target_dir()
    );
    let staging = world.staging_base.as_ref().expect("staging_base set");
    let leftovers = std::fs::read_dir(staging).expect("read staging").count();
    assert_eq!(leftovers, 0, "staging directories were left behind");
}

#[then("no download was attempted")]
fn then_no_download(world: &mut InstallWorld) {
    assert!(
        world.requested_urls.is_empty(),
        "unexpected downloads: {:?}",
        world.requested_urls
    );
}

#[scenario(
    path = "tests/features/install_pipeline.feature",
    name = "Installing the primary executable from a verified archive"
)]
fn scenario_primary_install(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install_pipeline.feature",
    name = "Installing an optional helper shipped with the release"
)]
fn scenario_optional_helper(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install_pipeline.feature",
    name = "A tampered download halts at verification"
)]
fn scenario_tampered_download(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install_pipeline.feature",
    name = "A placeholder checksum is never trusted"
)]
fn scenario_placeholder_checksum(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install_pipeline.feature",
    name = "An uncatalogued platform is reported before downloading"
)]
fn scenario_uncatalogued_platform(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install_pipeline.feature",
    name = "An archive without the primary executable installs nothing"
)]
fn scenario_missing_primary(world: InstallWorld) {
    let _ = world;
}
