//! Error type for command execution and source extraction.
//!
//! Build steps are shell commands against third-party build systems, so the
//! interesting failure is almost always "this command exited non-zero". The
//! variants carry the full command string so the top-level report can show
//! exactly what to re-run by hand.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the process and extraction layers.
#[derive(Error, Debug)]
pub enum Error {
    /// A command ran but exited with a non-zero status.
    #[error("command failed (exit code {code}): \"{command}\"{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        code: i32,
        /// Captured stderr, empty when stdio was inherited.
        stderr: String,
    },

    /// The command could not be started at all.
    #[error("failed to execute \"{command}\". Is it installed?")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// No tarball in the source directory matches the requested prefix.
    #[error("no tarball starting with '{prefix}' in {}", .dir.display())]
    TarballNotFound { prefix: String, dir: PathBuf },

    #[error("I/O error at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// The failed command string, if this error came from running one.
    pub fn command(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { command, .. } | Error::Spawn { command, .. } => {
                Some(command.as_str())
            }
            _ => None,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{}", stderr)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
