//! Source layout checks: directories and component tarballs.

use crate::component::Component;
use crate::config::Layout;
use crate::extract;

use super::types::CheckResult;

/// Check the source and patch directories exist.
pub fn check_layout(layout: &Layout) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if layout.src.is_dir() {
        results.push(CheckResult::pass_with("source directory", &layout.src.to_string_lossy()));
    } else {
        results.push(CheckResult::fail(
            "source directory",
            &format!("{} does not exist", layout.src.display()),
        ));
    }

    if layout.patches.is_dir() {
        results.push(CheckResult::pass("patch directory"));
    } else {
        results.push(CheckResult::warn(
            "patch directory",
            &format!(
                "{} does not exist - haproxy and cassandra will fail",
                layout.patches.display()
            ),
        ));
    }

    results
}

/// Report which tarball each component would use.
///
/// A missing tarball is a warning: only the components actually selected
/// need theirs.
pub fn check_tarballs(layout: &Layout, components: &[&Component]) -> Vec<CheckResult> {
    if !layout.src.is_dir() {
        return Vec::new();
    }

    let mut results = Vec::new();
    for component in components {
        for prefix in component.tarballs() {
            let name = format!("{} ({}*)", component.name, prefix);
            match extract::find_tarball(&layout.src, prefix) {
                Ok(Some(tarball)) => {
                    let file = tarball
                        .path
                        .file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    results.push(CheckResult::pass_with(&name, &file));
                }
                Ok(None) => results.push(CheckResult::warn(&name, "no tarball found")),
                Err(e) => results.push(CheckResult::fail(&name, &e.to_string())),
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::definitions::{NGINX, TINC};
    use crate::preflight::types::CheckStatus;
    use std::fs;

    #[test]
    fn test_missing_source_dir_fails() {
        let root = tempfile::tempdir().unwrap();
        let layout = Layout::under(root.path());

        let results = check_layout(&layout);
        assert_eq!(results[0].status, CheckStatus::Fail);
        assert_eq!(results[1].status, CheckStatus::Warn);
        assert!(check_tarballs(&layout, &[&TINC]).is_empty());
    }

    #[test]
    fn test_tarball_presence() {
        let root = tempfile::tempdir().unwrap();
        let layout = Layout::under(root.path());
        fs::create_dir_all(&layout.patches).unwrap();
        fs::write(layout.src.join("tinc-1.0.19.tar.gz"), b"").unwrap();

        assert!(check_layout(&layout)
            .iter()
            .all(|c| c.status == CheckStatus::Pass));

        let results = check_tarballs(&layout, &[&TINC, &NGINX]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, CheckStatus::Pass);
        assert_eq!(results[0].details.as_deref(), Some("tinc-1.0.19.tar.gz"));
        assert_eq!(results[1].status, CheckStatus::Warn);
    }
}
