//! Declarative component definitions.
//!
//! Each third-party package is a static `Component`: a name plus the
//! operations that extract, configure, build and install it. The executor
//! interprets the operations; the builder runs components in order.
//!
//! ```text
//! Component Definition (DATA)          Executor (LOGIC)
//! ─────────────────────────────        ─────────────────
//! TINC = Component {                   for op in component.ops {
//!   ops: [                               execute_op(ctx, op)?;
//!     extract("tinc"),                 }
//!     run("./configure ...", Source),
//!     run("make -j {jobs}", Source),
//!   ]
//! }
//! ```

pub mod builder;
pub mod definitions;
pub mod executor;

pub use builder::{build_components, select, RunReport};
pub use definitions::ALL;
pub use executor::BuildContext;

/// A third-party package built into the target prefix.
#[derive(Debug, Clone)]
pub struct Component {
    /// Name used in flags (`--build_<name>`) and the timing summary.
    pub name: &'static str,
    /// One-line description for `--list` and `--help`.
    pub description: &'static str,
    pub ops: &'static [Op],
}

impl Component {
    /// Tarball prefixes this component extracts, in order.
    pub fn tarballs(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ops.iter().filter_map(|op| match op {
            Op::Extract(prefix) => Some(*prefix),
            _ => None,
        })
    }
}

/// Operations that can be performed while building a component.
///
/// Shell templates may use these placeholders:
/// - `{prefix}` - install target prefix
/// - `{jobs}` - parallel make jobs
/// - `{patches}` - patch directory
/// - `{make_target}` - haproxy platform target
#[derive(Debug, Clone)]
pub enum Op {
    /// Extract the tarball with this prefix. It becomes the current source directory.
    Extract(&'static str),

    /// Run a shell command template in a directory.
    Run(&'static str, Dir),

    /// Remove a directory if present, then create it empty.
    ResetDir(Dir),

    /// Remove a directory tree.
    RemoveDir(Dir),

    /// Recursively copy the contents of one directory into another.
    CopyTree { from: Dir, to: Dir },

    /// Copy a file from the patch directory into a directory, keeping its name.
    CopyPatch { file: &'static str, to: Dir },
}

/// Directories operations can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    /// The most recently extracted source tree.
    Source,
    /// A subdirectory of the current source tree.
    SourceSub(&'static str),
    /// The build (scratch) directory.
    Build,
    /// The install target prefix.
    Target,
    /// A subdirectory of the target prefix.
    TargetSub(&'static str),
}

// Helper constructors keep definitions.rs readable.

pub const fn extract(prefix: &'static str) -> Op {
    Op::Extract(prefix)
}

pub const fn run(template: &'static str, dir: Dir) -> Op {
    Op::Run(template, dir)
}

/// Run a command template in the current source tree.
pub const fn in_source(template: &'static str) -> Op {
    Op::Run(template, Dir::Source)
}
