//! Process launchers
//!
//! - `ForkExecLauncher` - real OS processes via fork + exec (unix)
//! - `ScriptedLauncher` - synthetic pids and exit timing for tests

#[cfg(unix)]
pub mod fork_exec;
pub mod scripted;
pub mod r#trait;

#[cfg(unix)]
pub use fork_exec::{ForkExecLauncher, LaunchRoute, EXEC_FAILURE_STATUS};
pub use r#trait::ProcessLauncher;
pub use scripted::{ScriptedLauncher, SpawnRecord};
