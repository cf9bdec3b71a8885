//! Component executor - interprets `Op` variants and performs them.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{Component, Dir, Op};
use crate::config::{self, Config, Layout};
use crate::extract;
use crate::process;

/// Everything operations need to know about the build environment.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub layout: Layout,
    pub jobs: usize,
    pub make_target: &'static str,
    /// `PATH` handed to child processes, with the target `bin` first.
    path_env: OsString,
}

impl BuildContext {
    pub fn new(layout: Layout, jobs: usize) -> Result<Self> {
        let path_env = layout.search_path(std::env::var_os("PATH"))?;
        Ok(Self {
            layout,
            jobs,
            make_target: config::haproxy_target(),
            path_env,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.layout.clone(), config.jobs)
    }

    pub fn path_env(&self) -> &OsString {
        &self.path_env
    }

    /// Substitute placeholders in a command template.
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{prefix}", &self.layout.target.to_string_lossy())
            .replace("{patches}", &self.layout.patches.to_string_lossy())
            .replace("{jobs}", &self.jobs.to_string())
            .replace("{make_target}", self.make_target)
    }

    /// Resolve a `Dir` given the current source tree, if any.
    pub fn resolve(&self, dir: Dir, source: Option<&Path>) -> Result<PathBuf> {
        let path = match dir {
            Dir::Source => source.context("no source tree extracted yet")?.to_path_buf(),
            Dir::SourceSub(sub) => source
                .context("no source tree extracted yet")?
                .join(sub),
            Dir::Build => self.layout.build.clone(),
            Dir::Target => self.layout.target.clone(),
            Dir::TargetSub(sub) => self.layout.target.join(sub),
        };
        Ok(path)
    }
}

/// Execute all operations of a component.
pub fn execute(ctx: &BuildContext, component: &Component) -> Result<()> {
    info!("building {}", component.name);

    let mut source: Option<PathBuf> = None;
    for op in component.ops {
        execute_op(ctx, op, &mut source)
            .with_context(|| format!("in component '{}'", component.name))?;
    }

    Ok(())
}

fn execute_op(ctx: &BuildContext, op: &Op, source: &mut Option<PathBuf>) -> Result<()> {
    match op {
        Op::Extract(prefix) => {
            let path = extract::extract_package(&ctx.layout.src, &ctx.layout.build, prefix)?;
            debug!("source tree is now {}", path.display());
            *source = Some(path);
        }
        Op::Run(template, dir) => {
            let dir = ctx.resolve(*dir, source.as_deref())?;
            process::shell(&ctx.expand(template), &dir)
                .env("PATH", ctx.path_env())
                .run_interactive()?;
        }
        Op::ResetDir(dir) => {
            let dir = ctx.resolve(*dir, source.as_deref())?;
            remove_dir(&dir)?;
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Op::RemoveDir(dir) => {
            let dir = ctx.resolve(*dir, source.as_deref())?;
            remove_dir(&dir)?;
        }
        Op::CopyTree { from, to } => {
            let from = ctx.resolve(*from, source.as_deref())?;
            let to = ctx.resolve(*to, source.as_deref())?;
            info!("copying {} to {}", from.display(), to.display());
            copy_tree(&from, &to)?;
        }
        Op::CopyPatch { file, to } => {
            let from = ctx.layout.patches.join(file);
            let to = ctx.resolve(*to, source.as_deref())?;
            if !from.is_file() {
                bail!("Patch file not found: {}", from.display());
            }
            fs::create_dir_all(&to)
                .with_context(|| format!("Failed to create {}", to.display()))?;
            fs::copy(&from, to.join(file)).with_context(|| {
                format!("Failed to copy {} to {}", from.display(), to.display())
            })?;
        }
    }
    Ok(())
}

fn remove_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    }
    Ok(())
}

/// Copy the contents of `from` into `to`, preserving symlinks.
pub fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        bail!("Source directory not found: {}", from.display());
    }

    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry.with_context(|| format!("Failed to walk {}", from.display()))?;
        let rel = entry.path().strip_prefix(from)?;
        let dest = to.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create {}", dest.display()))?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path())
                .with_context(|| format!("Failed to read link {}", entry.path().display()))?;
            if dest.symlink_metadata().is_ok() {
                fs::remove_file(&dest)
                    .with_context(|| format!("Failed to replace {}", dest.display()))?;
            }
            std::os::unix::fs::symlink(&target, &dest)
                .with_context(|| format!("Failed to link {}", dest.display()))?;
        } else {
            fs::copy(entry.path(), &dest).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), dest.display())
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(root: &Path) -> BuildContext {
        BuildContext::new(Layout::under(root), 6).unwrap()
    }

    #[test]
    fn test_expand_placeholders() {
        let ctx = context(Path::new("/srv"));
        assert_eq!(
            ctx.expand("./configure --prefix=\"{prefix}\" && make -j {jobs}"),
            "./configure --prefix=\"/srv/data/local\" && make -j 6"
        );
        assert_eq!(
            ctx.expand("patch -p0 < {patches}/haproxy.patch"),
            "patch -p0 < /srv/src/patches/haproxy.patch"
        );
        assert_eq!(
            ctx.expand("make TARGET={make_target}"),
            format!("make TARGET={}", config::haproxy_target())
        );
    }

    #[test]
    fn test_resolve_dirs() {
        let ctx = context(Path::new("/srv"));
        let src = Path::new("/srv/data/build/protobuf-2.4.1");

        assert_eq!(ctx.resolve(Dir::Source, Some(src)).unwrap(), src);
        assert_eq!(
            ctx.resolve(Dir::SourceSub("python"), Some(src)).unwrap(),
            src.join("python")
        );
        assert_eq!(
            ctx.resolve(Dir::Build, None).unwrap(),
            Path::new("/srv/data/build")
        );
        assert_eq!(
            ctx.resolve(Dir::TargetSub("bin"), None).unwrap(),
            Path::new("/srv/data/local/bin")
        );
    }

    #[test]
    fn test_source_requires_extraction() {
        let ctx = context(Path::new("/srv"));
        assert!(ctx.resolve(Dir::Source, None).is_err());
        assert!(ctx.resolve(Dir::SourceSub("python"), None).is_err());
    }

    #[test]
    fn test_path_env_starts_with_target_bin() {
        let ctx = context(Path::new("/srv"));
        let first = std::env::split_paths(ctx.path_env()).next().unwrap();
        assert_eq!(first, Path::new("/srv/data/local/bin"));
    }

    #[test]
    fn test_copy_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("from");
        let to = tmp.path().join("to");
        fs::create_dir_all(from.join("conf")).unwrap();
        fs::create_dir_all(from.join("bin")).unwrap();
        fs::write(from.join("conf/cassandra.yaml"), "cluster_name: test").unwrap();
        fs::write(from.join("bin/cassandra"), "#!/bin/sh").unwrap();
        std::os::unix::fs::symlink("bin/cassandra", from.join("launch")).unwrap();
        fs::create_dir_all(&to).unwrap();

        copy_tree(&from, &to).unwrap();

        assert_eq!(
            fs::read_to_string(to.join("conf/cassandra.yaml")).unwrap(),
            "cluster_name: test"
        );
        assert!(to.join("bin/cassandra").is_file());
        assert_eq!(
            fs::read_link(to.join("launch")).unwrap(),
            Path::new("bin/cassandra")
        );
    }

    #[test]
    fn test_copy_tree_replaces_existing_link() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("from");
        let to = tmp.path().join("to");
        fs::create_dir_all(&from).unwrap();
        fs::create_dir_all(&to).unwrap();
        std::os::unix::fs::symlink("bin/cassandra", from.join("launch")).unwrap();
        std::os::unix::fs::symlink("stale", to.join("launch")).unwrap();

        copy_tree(&from, &to).unwrap();

        assert_eq!(
            fs::read_link(to.join("launch")).unwrap(),
            Path::new("bin/cassandra")
        );
    }

    #[test]
    fn test_execute_runs_ops_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        fs::create_dir_all(&ctx.layout.build).unwrap();
        fs::create_dir_all(&ctx.layout.patches).unwrap();
        fs::write(ctx.layout.patches.join("start-demo"), "#!/bin/sh\n").unwrap();

        static DEMO: Component = Component {
            name: "demo",
            description: "test component",
            ops: &[
                Op::ResetDir(Dir::TargetSub("demo")),
                Op::Run("echo {jobs} > jobs.txt", Dir::TargetSub("demo")),
                Op::CopyPatch {
                    file: "start-demo",
                    to: Dir::TargetSub("bin"),
                },
            ],
        };

        execute(&ctx, &DEMO).unwrap();

        let jobs = fs::read_to_string(ctx.layout.target.join("demo/jobs.txt")).unwrap();
        assert_eq!(jobs.trim(), "6");
        assert!(ctx.layout.target.join("bin/start-demo").is_file());
    }

    #[test]
    fn test_execute_reports_component_and_command() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        fs::create_dir_all(&ctx.layout.build).unwrap();

        static BROKEN: Component = Component {
            name: "broken",
            description: "test component",
            ops: &[Op::Run("exit 2", Dir::Build)],
        };

        let err = execute(&ctx, &BROKEN).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("in component 'broken'"));
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("&& exit 2\""));
        assert!(!msg.contains("Run("));
    }

    #[test]
    fn test_missing_patch_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());

        static NEEDS_PATCH: Component = Component {
            name: "needs-patch",
            description: "test component",
            ops: &[Op::CopyPatch {
                file: "absent",
                to: Dir::Target,
            }],
        };

        assert!(execute(&ctx, &NEEDS_PATCH).is_err());
    }
}
