//! Process identifiers and poll results

use std::fmt;

/// OS process identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub i32);

impl Pid {
    pub fn as_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with a status code
    Code(i32),
    /// Terminated by a signal
    Signal(i32),
}

impl ExitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Code(0))
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Code(code) => write!(f, "exit code {}", code),
            ExitOutcome::Signal(sig) => write!(f, "signal {}", sig),
        }
    }
}

/// Result of a non-blocking status check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Still running (or stopped, which still holds its slot)
    Running,
    /// Exited since the last poll
    Exited(ExitOutcome),
    /// Status cannot be retrieved; the process is already gone
    Gone,
}

impl ProcessState {
    /// Whether the process no longer occupies a slot
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ProcessState::Running)
    }
}
