//! Build timing and per-component outcomes.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

/// How a component build ended. Both variants carry the elapsed time.
#[derive(Debug)]
pub enum Outcome {
    Succeeded { elapsed: Duration },
    Failed { elapsed: Duration, cause: anyhow::Error },
}

impl Outcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            Outcome::Succeeded { elapsed } | Outcome::Failed { elapsed, .. } => *elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Outcome::Succeeded { .. } => None,
            Outcome::Failed { cause, .. } => Some(cause),
        }
    }

    pub fn status(&self) -> Status {
        if self.is_success() {
            Status::Succeeded
        } else {
            Status::Failed
        }
    }
}

/// A simple timer for measuring one component build.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Stop the timer, log the elapsed time and pair it with `result`.
    pub fn finish(self, result: Result<()>) -> Outcome {
        let elapsed = self.start.elapsed();
        info!(
            "{}: total time: {:.2} seconds",
            self.name,
            elapsed.as_secs_f64()
        );
        match result {
            Ok(()) => Outcome::Succeeded { elapsed },
            Err(cause) => Outcome::Failed { elapsed, cause },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeEntry {
    pub name: String,
    pub seconds: f64,
    pub status: Status,
}

/// Per-component times in the order the components ran.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Times {
    entries: Vec<TimeEntry>,
}

impl Times {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, outcome: &Outcome) {
        self.entries.push(TimeEntry {
            name: name.to_string(),
            seconds: outcome.elapsed().as_secs_f64(),
            status: outcome.status(),
        });
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Write the times as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// `{tinc: 12.34, nginx: 56.78 (failed)}`
impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:.2}", entry.name, entry.seconds)?;
            if entry.status == Status::Failed {
                write!(f, " (failed)")?;
            }
        }
        write!(f, "}}")
    }
}
