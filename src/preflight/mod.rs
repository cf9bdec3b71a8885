//! Preflight checks.
//!
//! Validates host tools and the source layout before starting a build.
//! Run with `salvus-build --preflight`.

mod host_tools;
mod sources;
mod types;

use anyhow::{bail, Result};

use crate::component::Component;
use crate::config::Layout;

pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks for `components`.
pub fn run_preflight(layout: &Layout, components: &[&Component]) -> PreflightReport {
    let mut checks = Vec::new();

    println!("Running preflight checks...\n");

    println!("Checking host tools...");
    checks.extend(host_tools::check_host_tools());

    println!("Checking source layout...");
    checks.extend(sources::check_layout(layout));
    checks.extend(sources::check_tarballs(layout, components));

    println!();

    PreflightReport { checks }
}

/// Run preflight, print the report and bail if any check fails.
pub fn run_preflight_or_fail(layout: &Layout, components: &[&Component]) -> Result<()> {
    let report = run_preflight(layout, components);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before building.",
            report.fail_count()
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}
