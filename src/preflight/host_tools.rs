//! Host tool availability checks.

use crate::error::Result;
use crate::process::{self, Cmd};

use super::types::CheckResult;

/// Tools every component build needs, with the package that provides them
/// and the flag that prints their version.
const REQUIRED_TOOLS: &[(&str, &str, &str, Option<&str>)] = &[
    ("sh", "dash or bash", "Runs every build step", None),
    ("tar", "tar", "Extracts source tarballs", Some("--version")),
    ("make", "make", "Builds every autotools component", Some("--version")),
    ("cc", "gcc or clang", "Compiles C sources", Some("--version")),
    ("patch", "patch", "Applies the haproxy log patch", Some("--version")),
];

/// Check host tools are installed.
pub fn check_host_tools() -> Vec<CheckResult> {
    REQUIRED_TOOLS
        .iter()
        .map(|(tool, package, purpose, flag)| check_tool(tool, package, purpose, *flag))
        .collect()
}

fn check_tool(
    tool: &str,
    package: &str,
    purpose: &str,
    version_flag: Option<&str>,
) -> CheckResult {
    let Some(path) = process::which(tool) else {
        return CheckResult::fail(
            tool,
            &format!("Not found. Install '{}' package. {}", package, purpose),
        );
    };
    let path = path.to_string_lossy();

    match version_flag {
        None => CheckResult::pass_with(tool, &path),
        Some(flag) => match tool_version(tool, flag) {
            Ok(version) => CheckResult::pass_with(tool, &format!("{} ({})", path, version)),
            // Present but broken, e.g. a cc wrapper with no compiler behind it.
            Err(e) => CheckResult::warn(tool, &format!("{} found but {}", path, e)),
        },
    }
}

/// First line of `<tool> <flag>` output.
fn tool_version(tool: &str, flag: &str) -> Result<String> {
    let result = Cmd::new(tool).arg(flag).run()?;
    let out = result.stdout_trimmed();
    let out = if out.is_empty() {
        result.stderr.trim()
    } else {
        out
    };
    Ok(out.lines().next().unwrap_or_default().to_string())
}
