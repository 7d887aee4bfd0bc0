//! Interrupt cleanup of live staging directories.
//!
//! `cleanup_registered` drains the process-wide registry, so this test lives
//! in its own binary where no other test owns a staging directory.

use auths_installer::artefact::platform::PlatformKey;
use auths_installer::staging::{StagingDir, cleanup_registered, registered};

#[test]
fn cleanup_removes_live_staging_directories() {
    let base = tempfile::tempdir().expect("temp dir");
    let platform: PlatformKey = "macos-aarch64".parse().expect("valid platform");
    let first = StagingDir::create_in(base.path(), &platform).expect("first staging");
    let second = StagingDir::create_in(base.path(), &platform).expect("second staging");
    let paths = [first.path().to_path_buf(), second.path().to_path_buf()];
    std::fs::write(paths[0].join("auths"), b"partial").expect("write extracted file");

    assert_eq!(cleanup_registered(), 2);

    for path in &paths {
        assert!(!path.exists(), "{} was not removed", path.display());
        assert!(!registered().contains(path));
    }

    // The guards outlive the cleanup, as they do when the handler runs.
    drop(first);
    second.close().expect("closing a cleaned-up directory succeeds");
    assert!(registered().is_empty());
    assert_eq!(cleanup_registered(), 0);
}
