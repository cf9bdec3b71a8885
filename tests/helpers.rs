//! Shared test utilities for salvus-build tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use salvus_build::config::Layout;
use tempfile::TempDir;

/// Test environment with the standard src/ and data/ layout in a temp root.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub root: PathBuf,
    pub layout: Layout,
}

impl TestEnv {
    /// Create a root with `src/patches` and `data/build`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let layout = Layout::under(&root);

        fs::create_dir_all(&layout.patches).expect("Failed to create patches dir");
        fs::create_dir_all(&layout.build).expect("Failed to create build dir");

        Self {
            _temp_dir: temp_dir,
            root,
            layout,
        }
    }

    /// Create `src/<stem>.tar.gz` containing `<stem>/<file>` for each entry.
    pub fn add_tarball(&self, stem: &str, files: &[(&str, &str)]) -> PathBuf {
        create_tarball(&self.layout.src, stem, files)
    }

    pub fn add_patch(&self, name: &str, content: &str) {
        fs::write(self.layout.patches.join(name), content).expect("Failed to write patch");
    }
}

/// Build a gzipped tarball `<dir>/<stem>.tar.gz` with the given files.
///
/// Files named `configure` or ending in `.sh` are made executable.
pub fn create_tarball(dir: &Path, stem: &str, files: &[(&str, &str)]) -> PathBuf {
    let staging = TempDir::new().expect("Failed to create staging dir");
    let tree = staging.path().join(stem);
    for (name, content) in files {
        let path = tree.join(name);
        fs::create_dir_all(path.parent().expect("file has a parent"))
            .expect("Failed to create tarball dir");
        fs::write(&path, content).expect("Failed to write tarball file");
        if *name == "configure" || name.ends_with(".sh") {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("Failed to set permissions");
        }
    }

    let tarball = dir.join(format!("{}.tar.gz", stem));
    let status = Command::new("tar")
        .arg("czf")
        .arg(&tarball)
        .arg(stem)
        .current_dir(staging.path())
        .status()
        .expect("Failed to run tar");
    assert!(status.success(), "tar failed creating {}", tarball.display());
    tarball
}
