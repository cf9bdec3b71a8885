//! Locating and unpacking vendored source tarballs.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::process;

/// A tarball found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tarball {
    pub path: PathBuf,
    /// Directory name the archive unpacks to (filename without `.tar.*`).
    pub stem: String,
}

/// Strip the `.tar.*` suffix from a tarball filename.
///
/// Splits at the last `.tar.`, so `foo-1.2.3.tar.gz` gives `foo-1.2.3`.
/// Returns `None` for names that are not compressed tarballs.
pub fn tarball_stem(filename: &str) -> Option<&str> {
    filename.rfind(".tar.").map(|i| &filename[..i])
}

/// Find the tarball for `prefix` in `src_dir`.
///
/// Candidates are compared by filename and the lexicographically first one
/// wins, so the choice does not depend on directory listing order.
pub fn find_tarball(src_dir: &Path, prefix: &str) -> Result<Option<Tarball>> {
    let entries = fs::read_dir(src_dir).map_err(|e| Error::io(src_dir, e))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(src_dir, e))?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        if let Some(stem) = tarball_stem(&name) {
            candidates.push(Tarball {
                path: entry.path(),
                stem: stem.to_string(),
            });
        }
    }

    candidates.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(candidates.into_iter().next())
}

/// Extract the tarball for `prefix` into `build_dir` and return the unpacked path.
///
/// Any previous extraction at that path is removed first.
pub fn extract_package(src_dir: &Path, build_dir: &Path, prefix: &str) -> Result<PathBuf> {
    let tarball = find_tarball(src_dir, prefix)?.ok_or_else(|| Error::TarballNotFound {
        prefix: prefix.to_string(),
        dir: src_dir.to_path_buf(),
    })?;

    let path = build_dir.join(&tarball.stem);
    if path.exists() {
        debug!("removing previous extraction at {}", path.display());
        fs::remove_dir_all(&path).map_err(|e| Error::io(&path, e))?;
    }

    process::cmd(
        &format!("tar xvf \"{}\"", tarball.path.display()),
        build_dir,
    )?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tarball_stem() {
        assert_eq!(tarball_stem("foo-1.2.3.tar.gz"), Some("foo-1.2.3"));
        assert_eq!(tarball_stem("nginx-1.2.0.tar.bz2"), Some("nginx-1.2.0"));
        assert_eq!(tarball_stem("a.tar.b.tar.xz"), Some("a.tar.b"));
        assert_eq!(tarball_stem("haproxy.patch"), None);
        assert_eq!(tarball_stem("foo.tar"), None);
    }

    #[test]
    fn test_find_tarball_picks_first_by_name() {
        let src = tempfile::tempdir().unwrap();
        for name in ["foo-2.0.tar.gz", "foo-1.0.tar.gz", "bar-1.0.tar.gz", "foo.txt"] {
            fs::write(src.path().join(name), b"").unwrap();
        }

        let found = find_tarball(src.path(), "foo").unwrap().unwrap();
        assert_eq!(found.stem, "foo-1.0");
        assert_eq!(found.path, src.path().join("foo-1.0.tar.gz"));
    }

    #[test]
    fn test_find_tarball_skips_non_tarballs() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("tinc.README"), b"").unwrap();
        fs::create_dir(src.path().join("tinc-patches")).unwrap();

        assert!(find_tarball(src.path(), "tinc").unwrap().is_none());
    }

    #[test]
    fn test_extract_missing_tarball() {
        let src = tempfile::tempdir().unwrap();
        let build = tempfile::tempdir().unwrap();

        let err = extract_package(src.path(), build.path(), "memcached").unwrap_err();
        assert!(matches!(err, Error::TarballNotFound { ref prefix, .. } if prefix == "memcached"));
    }

    #[test]
    fn test_extract_replaces_previous_extraction() {
        let src = tempfile::tempdir().unwrap();
        let build = tempfile::tempdir().unwrap();

        let staging = src.path().join("pkg-1.0");
        fs::create_dir(&staging).unwrap();
        fs::write(staging.join("configure"), "#!/bin/sh\n").unwrap();
        process::cmd("tar czf pkg-1.0.tar.gz pkg-1.0", src.path()).unwrap();
        fs::remove_dir_all(&staging).unwrap();

        let stale = build.path().join("pkg-1.0");
        fs::create_dir(&stale).unwrap();
        fs::write(stale.join("stale"), b"old").unwrap();

        let path = extract_package(src.path(), build.path(), "pkg").unwrap();

        assert_eq!(path, build.path().join("pkg-1.0"));
        assert!(path.join("configure").exists());
        assert!(!path.join("stale").exists());
    }
}
