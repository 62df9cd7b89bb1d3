//! # taskpit-task
//!
//! Local process scheduler core for taskpit.
//! Admits tasks into a FIFO queue, runs at most N of them as OS processes,
//! and reaps finished ones to free their slots.
//!
//! ## Features
//!
//! - Submission queue with strict FIFO dispatch
//! - Running index: pid-ordered binary search tree of live processes
//! - Slot controller bounding concurrency
//! - Non-blocking reaper and the reap / dispatch / report tick loop
//! - Injectable process launchers (fork/exec, scripted for tests)
//! - Plain-text and `tracing` status sinks
//! - TOML task files

pub mod index;
pub mod intake;
pub mod launcher;
pub mod process;
pub mod queue;
pub mod report;
pub mod scheduler;
pub mod slots;
pub mod task;

// Scheduler core
pub use index::{RunningEntry, RunningIndex};
pub use queue::SubmissionQueue;
pub use scheduler::{Scheduler, TickSummary};
pub use slots::SlotController;
pub use task::{Task, TaskId};

// Processes
#[cfg(unix)]
pub use launcher::{ForkExecLauncher, LaunchRoute, EXEC_FAILURE_STATUS};
pub use launcher::{ProcessLauncher, ScriptedLauncher, SpawnRecord};
pub use process::{ExitOutcome, Pid, ProcessState};

// Reporting and intake
pub use intake::{split_command, TaskFile, TaskSpec};
pub use report::{PlainTextSink, StatusReport, StatusSink, TracingSink};
