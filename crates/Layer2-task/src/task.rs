//! Task definition and types

use taskpit_foundation::{Error, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a new random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// One command to run.
///
/// A task is built once and never mutated afterwards. It is moved from the
/// submission queue into the running index and dropped by the reaper; it is
/// intentionally not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct Task {
    id: TaskId,

    /// Argument vector, program name first
    argv: Vec<String>,

    /// Standard output redirect target
    output: Option<PathBuf>,

    /// Standard error redirect target
    error: Option<PathBuf>,

    /// Working directory override
    cwd: Option<PathBuf>,
}

impl Task {
    /// Create a new task from an argument vector.
    ///
    /// Fails if `argv` is empty or any token contains a NUL byte, since
    /// neither can be turned into an exec image.
    pub fn new<I, S>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();

        if argv.is_empty() {
            return Err(Error::InvalidInput(
                "task needs at least a program name".to_string(),
            ));
        }
        if let Some(bad) = argv.iter().find(|arg| arg.contains('\0')) {
            return Err(Error::InvalidInput(format!(
                "argument contains a NUL byte: {:?}",
                bad
            )));
        }

        Ok(Self {
            id: TaskId::new(),
            argv,
            output: None,
            error: None,
            cwd: None,
        })
    }

    /// Redirect standard output to a file (created or truncated)
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Redirect standard error to a file (created or truncated)
    pub fn with_error(mut self, path: impl Into<PathBuf>) -> Self {
        self.error = Some(path.into());
        self
    }

    /// Run the program from another directory
    pub fn with_cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.cwd = Some(path.into());
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Full argument vector, program name first
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Program name (first argument)
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn error(&self) -> Option<&Path> {
        self.error.as_deref()
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Whether any redirect or directory change is requested
    pub fn has_environment(&self) -> bool {
        self.output.is_some() || self.error.is_some() || self.cwd.is_some()
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_round_trip() {
        let task = Task::new(["grep", "-r", "needle", "."])
            .unwrap()
            .with_output("/tmp/out.txt")
            .with_error("/tmp/err.txt")
            .with_cwd("/srv");

        assert_eq!(task.argv(), &["grep", "-r", "needle", "."]);
        assert_eq!(task.program(), "grep");
        assert_eq!(task.output(), Some(Path::new("/tmp/out.txt")));
        assert_eq!(task.error(), Some(Path::new("/tmp/err.txt")));
        assert_eq!(task.cwd(), Some(Path::new("/srv")));
        assert!(task.has_environment());
        assert_eq!(task.to_string(), "grep -r needle .");
    }

    #[test]
    fn test_empty_argv_rejected() {
        let result = Task::new(Vec::<String>::new());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_nul_byte_rejected() {
        let result = Task::new(["echo", "a\0b"]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_plain_task_has_no_environment() {
        let task = Task::new(["sleep", "2"]).unwrap();
        assert!(!task.has_environment());
        assert!(task.output().is_none());
    }

    #[test]
    fn test_ids_are_distinct() {
        let a = Task::new(["true"]).unwrap();
        let b = Task::new(["true"]).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().to_string().len(), 8);
    }
}
