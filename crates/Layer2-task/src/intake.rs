//! Task intake - task descriptors from TOML task files
//!
//! ```toml
//! [[task]]
//! command = "sleep 2"
//! count = 5
//!
//! [[task]]
//! argv = ["sh", "-c", "echo done"]
//! output = "/tmp/done.txt"
//! cwd = "/tmp"
//! ```

use crate::task::Task;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use taskpit_foundation::{Error, Result};

/// One `[[task]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSpec {
    /// Shell-style command line, split with POSIX quoting rules
    #[serde(default)]
    pub command: Option<String>,

    /// Explicit argument vector
    #[serde(default)]
    pub argv: Option<Vec<String>>,

    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default)]
    pub error: Option<PathBuf>,

    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// How many identical tasks to submit
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    1
}

impl TaskSpec {
    /// Build a task (one copy; `count` is applied by [`TaskFile::into_tasks`])
    pub fn build(&self) -> Result<Task> {
        let argv = match (&self.command, &self.argv) {
            (Some(command), None) => split_command(command)?,
            (None, Some(argv)) => argv.clone(),
            (Some(_), Some(_)) => {
                return Err(Error::InvalidInput(
                    "task sets both `command` and `argv`".to_string(),
                ))
            }
            (None, None) => {
                return Err(Error::InvalidInput(
                    "task needs `command` or `argv`".to_string(),
                ))
            }
        };

        let mut task = Task::new(argv)?;
        if let Some(path) = &self.output {
            task = task.with_output(path);
        }
        if let Some(path) = &self.error {
            task = task.with_error(path);
        }
        if let Some(path) = &self.cwd {
            task = task.with_cwd(path);
        }
        Ok(task)
    }
}

/// A parsed task file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFile {
    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskSpec>,
}

impl TaskFile {
    /// Read and parse a task file; unreadable and malformed files are both
    /// `InvalidInput`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidInput(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::InvalidInput(format!("Bad task file: {}", e)))
    }

    /// Expand every spec `count` times, in file order
    pub fn into_tasks(self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for spec in &self.tasks {
            for _ in 0..spec.count {
                tasks.push(spec.build()?);
            }
        }
        Ok(tasks)
    }
}

/// Split a command line into an argument vector
pub fn split_command(command: &str) -> Result<Vec<String>> {
    let argv = shlex::split(command)
        .ok_or_else(|| Error::InvalidInput(format!("Unbalanced quoting in {:?}", command)))?;
    if argv.is_empty() {
        return Err(Error::InvalidInput("empty command".to_string()));
    }
    Ok(argv)
}
