//! Launcher trait

use crate::process::{Pid, ProcessState};
use crate::task::Task;
use taskpit_foundation::Result;

/// Launcher trait - implement to add new process backends.
///
/// Both calls must return promptly: the scheduler loop runs them inline and
/// never blocks on a child.
pub trait ProcessLauncher {
    /// Start a process for `task` and return its pid.
    ///
    /// An `Err` means the process could not be created at all. Failures that
    /// happen inside the new process (bad program name, unopenable redirect)
    /// are not visible here; they surface later as an exit.
    fn spawn(&mut self, task: &Task) -> Result<Pid>;

    /// Non-blocking status check for a pid returned by `spawn`
    fn poll(&mut self, pid: Pid) -> ProcessState;

    /// Get launcher name
    fn name(&self) -> &'static str;
}
