//! Command execution with consistent logging and error reporting.
//!
//! Every build step goes through [`cmd`], which runs a shell string in a
//! given directory with the terminal attached. [`Cmd`] is the underlying
//! builder, also used directly when output needs to be captured.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Result of a captured command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Builder for configuring command execution.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    envs: Vec<(OsString, OsString)>,
    /// How the command is shown in logs and errors. Defaults to program + args.
    label: Option<String>,
}

impl Cmd {
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            envs: Vec::new(),
            label: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Set an environment variable for the child, on top of the inherited environment.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Override how the command is displayed in logs and error messages.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The command as shown in logs and errors.
    pub fn display(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None if self.args.is_empty() => self.program.clone(),
            None => format!("{} {}", self.program, self.args.join(" ")),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run the command and capture output.
    pub fn run(self) -> Result<CommandResult> {
        let shown = self.display();
        debug!("exec: {}", shown);

        let output = self.command().output().map_err(|source| Error::Spawn {
            command: shown.clone(),
            source,
        })?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            return Err(Error::CommandFailed {
                command: shown,
                code: result.code(),
                stderr: result.stderr.clone(),
            });
        }

        Ok(result)
    }

    /// Run the command with inherited stdio.
    ///
    /// Output goes directly to the terminal. Used for configure/make steps
    /// where the user should see progress.
    pub fn run_interactive(self) -> Result<ExitStatus> {
        let shown = self.display();
        info!("cmd: {}", shown);

        let status = self
            .command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| Error::Spawn {
                command: shown.clone(),
                source,
            })?;

        if !status.success() {
            return Err(Error::CommandFailed {
                command: shown,
                code: status.code().unwrap_or(-1),
                stderr: String::new(),
            });
        }

        Ok(status)
    }
}

/// The shell string actually executed for `command` in `dir`.
pub fn in_dir(command: &str, dir: &Path) -> String {
    format!("cd \"{}\" && {}", dir.display(), command)
}

/// Build a `sh -c` invocation that changes into `dir` first.
///
/// The command is labelled with the full shell string, so a failure reports
/// exactly what was run.
pub fn shell(command: &str, dir: &Path) -> Cmd {
    let full = in_dir(command, dir);
    Cmd::new("sh").arg("-c").arg(&full).label(full)
}

/// Run a shell command in `dir` with the terminal attached.
///
/// Silent apart from the log line on success; a non-zero exit becomes
/// [`Error::CommandFailed`] carrying the full command string.
pub fn cmd(command: &str, dir: &Path) -> Result<()> {
    shell(command, dir).run_interactive()?;
    Ok(())
}

/// Check if a program exists in PATH.
pub fn which(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}
