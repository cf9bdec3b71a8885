//! Configuration management.
//!
//! Reads configuration from a `.env` file in the root directory and from
//! environment variables. Environment variables take precedence over the
//! `.env` file; command-line flags take precedence over both.

use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::warn;

/// CPU count used when detection fails.
const FALLBACK_JOBS: usize = 4;

/// Directory layout shared by every component build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Vendored source tarballs.
    pub src: PathBuf,
    /// Patch files applied during builds.
    pub patches: PathBuf,
    /// Scratch space where tarballs are extracted and built.
    pub build: PathBuf,
    /// Install prefix all components are configured into.
    pub target: PathBuf,
}

impl Layout {
    /// Standard layout: `src`, `src/patches`, `data/build`, `data/local`.
    pub fn new(src: &Path, data: &Path) -> Self {
        Self {
            src: src.to_path_buf(),
            patches: src.join("patches"),
            build: data.join("build"),
            target: data.join("local"),
        }
    }

    /// Layout rooted at `root` with default directory names.
    pub fn under(root: &Path) -> Self {
        Self::new(&root.join("src"), &root.join("data"))
    }

    pub fn target_bin(&self) -> PathBuf {
        self.target.join("bin")
    }

    /// Create the build directory if it does not exist yet.
    pub fn ensure_build_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.build)
            .with_context(|| format!("Failed to create {}", self.build.display()))
    }

    /// `PATH` for child processes: `<target>/bin` ahead of `inherited`.
    pub fn search_path(&self, inherited: Option<OsString>) -> Result<OsString> {
        let mut paths = vec![self.target_bin()];
        if let Some(inherited) = inherited {
            paths.extend(env::split_paths(&inherited));
        }
        env::join_paths(paths).context("Install prefix cannot be placed on PATH")
    }
}

/// Keys read from `.env` and the process environment.
const KEYS: [&str; 3] = ["SALVUS_SRC", "SALVUS_DATA", "SALVUS_JOBS"];

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub layout: Layout,
    /// Parallel jobs passed to `make -j`.
    pub jobs: usize,
}

impl Config {
    /// Load configuration for `root`.
    ///
    /// Recognized keys: `SALVUS_SRC`, `SALVUS_DATA` (relative paths resolve
    /// against the root) and `SALVUS_JOBS`.
    pub fn load(root: &Path) -> Result<Self> {
        let root = absolute(root)?;
        let mut env_vars = HashMap::new();

        let env_path = root.join(".env");
        if env_path.exists() {
            let iter = dotenvy::from_path_iter(&env_path)
                .with_context(|| format!("Failed to read {}", env_path.display()))?;
            for item in iter {
                let (key, value) =
                    item.with_context(|| format!("Malformed line in {}", env_path.display()))?;
                env_vars.insert(key, value);
            }
        }

        for key in KEYS {
            match env::var(key) {
                Ok(value) => {
                    env_vars.insert(key.to_string(), value);
                }
                Err(env::VarError::NotPresent) => {}
                Err(e) => bail!("{}: {}", key, e),
            }
        }

        let resolve = |key: &str, default: &str| {
            let path = env_vars
                .get(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default));
            if path.is_absolute() {
                path
            } else {
                root.join(path)
            }
        };
        let layout = Layout::new(&resolve("SALVUS_SRC", "src"), &resolve("SALVUS_DATA", "data"));

        let jobs = match env_vars.get("SALVUS_JOBS") {
            Some(value) => parse_jobs(value).context("Invalid SALVUS_JOBS")?,
            None => detect_cpus(),
        };

        Ok(Self { root, layout, jobs })
    }

    /// Override the job count, e.g. from `--jobs`.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        if let Some(jobs) = jobs {
            self.jobs = jobs.max(1);
        }
        self
    }

    pub fn print(&self) {
        println!("Configuration:");
        println!("  root:    {}", self.root.display());
        println!("  src:     {}", self.layout.src.display());
        println!("  patches: {}", self.layout.patches.display());
        println!("  build:   {}", self.layout.build.display());
        println!("  target:  {}", self.layout.target.display());
        println!("  jobs:    {}", self.jobs);
    }
}

fn parse_jobs(value: &str) -> Result<usize> {
    let jobs: usize = value
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a number", value))?;
    anyhow::ensure!(jobs > 0, "job count must be at least 1");
    Ok(jobs)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()
            .context("Cannot determine current directory")?
            .join(path))
    }
}

/// Number of online CPUs.
pub fn detect_cpus() -> usize {
    match std::thread::available_parallelism() {
        Ok(n) => n.get(),
        Err(e) => {
            warn!(
                "could not detect CPU count ({}), using {} jobs",
                e, FALLBACK_JOBS
            );
            FALLBACK_JOBS
        }
    }
}

/// haproxy `TARGET=` value for the host OS.
pub fn haproxy_target() -> &'static str {
    if cfg!(target_os = "linux") {
        "linux2628"
    } else {
        "generic"
    }
}
