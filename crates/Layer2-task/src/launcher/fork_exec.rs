//! Fork/exec launcher - runs tasks as real host processes
//!
//! Features:
//! - Duplicate-then-replace process model (`fork` + `execvp`)
//! - Output/error redirection and working directory applied in the child
//! - Default `SIGPIPE` disposition and an empty signal mask in the child
//! - Optional routing through the companion launcher binary
//! - Non-blocking completion checks with `waitpid(WNOHANG)`
//!
//! Everything the child needs (C strings, the NULL-terminated argument
//! array, diagnostic messages) is prepared before `fork`, so the child only
//! makes async-signal-safe calls until it execs or exits.

use crate::launcher::ProcessLauncher;
use crate::process::{ExitOutcome, Pid, ProcessState};
use crate::task::Task;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult};
use std::ffi::{CStr, CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use taskpit_foundation::{Error, Result, SchedulerConfig};
use tracing::{debug, error};

/// Exit status of a child whose setup or exec failed
pub const EXEC_FAILURE_STATUS: i32 = 127;

/// How a task becomes a process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LaunchRoute {
    /// Exec the task's program directly; redirects and cwd are applied by
    /// the forked child itself
    #[default]
    Direct,

    /// Exec the companion launcher, passing redirects and cwd as flags
    Companion(PathBuf),
}

/// Launcher that forks real processes
#[derive(Debug, Clone, Default)]
pub struct ForkExecLauncher {
    route: LaunchRoute,
}

impl ForkExecLauncher {
    /// Create a launcher that execs programs directly
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with an explicit route
    pub fn with_route(route: LaunchRoute) -> Self {
        Self { route }
    }

    /// Companion route when the config names a launcher, direct otherwise
    pub fn from_config(config: &SchedulerConfig) -> Self {
        match &config.launcher {
            Some(path) => Self::with_route(LaunchRoute::Companion(path.clone())),
            None => Self::new(),
        }
    }

    pub fn route(&self) -> &LaunchRoute {
        &self.route
    }
}

impl ProcessLauncher for ForkExecLauncher {
    fn spawn(&mut self, task: &Task) -> Result<Pid> {
        let image = ExecImage::build(task, &self.route)?;
        let argv = image.argv_ptrs();

        // SAFETY: the child branch only calls async-signal-safe libc
        // functions on memory prepared above, then execs or `_exit`s.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                let pid = Pid(child.as_raw());
                debug!("Spawned pid {} for task {}: {}", pid, task.id(), task);
                Ok(pid)
            }
            Ok(ForkResult::Child) => unsafe { exec_child(&image, &argv) },
            Err(errno) => {
                error!("fork failed for task {}: {}", task.id(), errno);
                Err(Error::spawn(task.program(), errno.desc()))
            }
        }
    }

    fn poll(&mut self, pid: Pid) -> ProcessState {
        let target = nix::unistd::Pid::from_raw(pid.as_raw());
        match waitpid(target, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(_, code)) => ProcessState::Exited(ExitOutcome::Code(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                ProcessState::Exited(ExitOutcome::Signal(signal as i32))
            }
            // StillAlive, or a stop/continue notification: the slot stays taken
            Ok(_) => ProcessState::Running,
            Err(Errno::EINTR) => ProcessState::Running,
            Err(errno) => {
                debug!("waitpid({}) failed: {}", pid, errno);
                ProcessState::Gone
            }
        }
    }

    fn name(&self) -> &'static str {
        match self.route {
            LaunchRoute::Direct => "fork-exec",
            LaunchRoute::Companion(_) => "fork-exec (companion)",
        }
    }
}

/// Argument vector for routing `task` through the companion launcher:
/// `launcher [-o out] [-e err] [-d cwd] -- program args...`
pub fn companion_argv<'a>(launcher: &'a Path, task: &'a Task) -> Vec<&'a OsStr> {
    let mut argv = vec![launcher.as_os_str()];

    if let Some(path) = task.output() {
        argv.push(OsStr::new("-o"));
        argv.push(path.as_os_str());
    }
    if let Some(path) = task.error() {
        argv.push(OsStr::new("-e"));
        argv.push(path.as_os_str());
    }
    if let Some(path) = task.cwd() {
        argv.push(OsStr::new("-d"));
        argv.push(path.as_os_str());
    }

    argv.push(OsStr::new("--"));
    argv.extend(task.argv().iter().map(|arg| OsStr::new(arg.as_str())));
    argv
}

/// Pre-fork copy of everything the child touches
struct ExecImage {
    argv: Vec<CString>,
    output: Option<CString>,
    error: Option<CString>,
    cwd: Option<CString>,
    messages: Diagnostics,
}

/// Messages the child writes when it cannot reach the target program
struct Diagnostics {
    output: Vec<u8>,
    error: Vec<u8>,
    cwd: Vec<u8>,
    exec: Vec<u8>,
}

impl ExecImage {
    fn build(task: &Task, route: &LaunchRoute) -> Result<Self> {
        let (argv, output, error, cwd) = match route {
            LaunchRoute::Direct => {
                let argv = task
                    .argv()
                    .iter()
                    .map(|arg| c_string(OsStr::new(arg)))
                    .collect::<Result<Vec<_>>>()?;
                (
                    argv,
                    task.output().map(|p| c_string(p.as_os_str())).transpose()?,
                    task.error().map(|p| c_string(p.as_os_str())).transpose()?,
                    task.cwd().map(|p| c_string(p.as_os_str())).transpose()?,
                )
            }
            LaunchRoute::Companion(launcher) => {
                let argv = companion_argv(launcher, task)
                    .into_iter()
                    .map(c_string)
                    .collect::<Result<Vec<_>>>()?;
                (argv, None, None, None)
            }
        };

        let program = argv[0].to_string_lossy().into_owned();
        let messages = Diagnostics {
            output: diagnostic("cannot open output file", task.output()),
            error: diagnostic("cannot open error file", task.error()),
            cwd: diagnostic("cannot change working directory to", task.cwd()),
            exec: format!("taskpit: cannot run the requested command: {}\n", program).into_bytes(),
        };

        Ok(Self {
            argv,
            output,
            error,
            cwd,
            messages,
        })
    }

    /// NULL-terminated argument array for `execvp`
    fn argv_ptrs(&self) -> Vec<*const libc::c_char> {
        self.argv
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(std::ptr::null()))
            .collect()
    }
}

fn c_string(value: &OsStr) -> Result<CString> {
    CString::new(value.as_bytes())
        .map_err(|_| Error::InvalidInput(format!("{:?} contains a NUL byte", value)))
}

fn diagnostic(what: &str, path: Option<&Path>) -> Vec<u8> {
    match path {
        Some(path) => format!("taskpit: {} {}\n", what, path.display()).into_bytes(),
        None => Vec::new(),
    }
}

/// Child side of `spawn`. Never returns.
unsafe fn exec_child(image: &ExecImage, argv: &[*const libc::c_char]) -> ! {
    // keep the original stderr for diagnostics, even after `-e` redirection
    let diag = libc::fcntl(libc::STDERR_FILENO, libc::F_DUPFD_CLOEXEC, 3);
    let diag = if diag < 0 { libc::STDERR_FILENO } else { diag };

    // the scheduler runs with SIGPIPE ignored; exec keeps ignored
    // dispositions and the signal mask, so restore both
    libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    let mut unblocked: libc::sigset_t = std::mem::zeroed();
    libc::sigemptyset(&mut unblocked);
    libc::sigprocmask(libc::SIG_SETMASK, &unblocked, std::ptr::null_mut());

    if let Some(path) = &image.output {
        if !redirect(path, libc::STDOUT_FILENO) {
            fail(diag, &image.messages.output);
        }
    }
    if let Some(path) = &image.error {
        if !redirect(path, libc::STDERR_FILENO) {
            fail(diag, &image.messages.error);
        }
    }
    if let Some(dir) = &image.cwd {
        if libc::chdir(dir.as_ptr()) != 0 {
            fail(diag, &image.messages.cwd);
        }
    }

    libc::execvp(argv[0], argv.as_ptr());
    fail(diag, &image.messages.exec)
}

/// Open `path` for writing (create/truncate) onto descriptor `target`
unsafe fn redirect(path: &CStr, target: libc::c_int) -> bool {
    let fd = libc::open(
        path.as_ptr(),
        libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
        0o666 as libc::c_uint,
    );
    if fd < 0 {
        return false;
    }
    if fd != target {
        let duplicated = libc::dup2(fd, target);
        libc::close(fd);
        if duplicated < 0 {
            return false;
        }
    }
    true
}

unsafe fn fail(fd: libc::c_int, message: &[u8]) -> ! {
    libc::write(fd, message.as_ptr().cast(), message.len());
    libc::_exit(EXEC_FAILURE_STATUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_argv_full() {
        let task = Task::new(["ls", "-l"])
            .unwrap()
            .with_output("out.txt")
            .with_error("err.txt")
            .with_cwd("/tmp");
        let launcher = Path::new("/usr/bin/taskpit-launch");

        let argv: Vec<&str> = companion_argv(launcher, &task)
            .into_iter()
            .map(|s| s.to_str().unwrap())
            .collect();
        assert_eq!(
            argv,
            vec![
                "/usr/bin/taskpit-launch",
                "-o",
                "out.txt",
                "-e",
                "err.txt",
                "-d",
                "/tmp",
                "--",
                "ls",
                "-l"
            ]
        );
    }

    #[test]
    fn test_companion_argv_plain() {
        let task = Task::new(["true"]).unwrap();
        let argv = companion_argv(Path::new("taskpit-launch"), &task);
        assert_eq!(argv, vec!["taskpit-launch", "--", "true"]);
    }

    #[test]
    fn test_exec_image_is_null_terminated() {
        let task = Task::new(["sleep", "2"]).unwrap();
        let image = ExecImage::build(&task, &LaunchRoute::Direct).unwrap();
        let ptrs = image.argv_ptrs();

        assert_eq!(ptrs.len(), 3);
        assert!(ptrs[2].is_null());
        assert!(image.output.is_none());
        assert!(image.messages.output.is_empty());
    }

    #[test]
    fn test_companion_route_moves_redirects_into_flags() {
        let task = Task::new(["echo", "hi"]).unwrap().with_output("/tmp/o");
        let route = LaunchRoute::Companion(PathBuf::from("/opt/taskpit-launch"));
        let image = ExecImage::build(&task, &route).unwrap();

        assert!(image.output.is_none());
        assert_eq!(image.argv[0].to_str().unwrap(), "/opt/taskpit-launch");
        assert_eq!(image.argv.len(), 6);
    }

    #[test]
    fn test_nul_in_path_rejected() {
        let task = Task::new(["true"]).unwrap().with_output("bad\0path");
        let result = ExecImage::build(&task, &LaunchRoute::Direct);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_from_config() {
        let direct = ForkExecLauncher::from_config(&SchedulerConfig::default());
        assert_eq!(direct.route(), &LaunchRoute::Direct);
        assert_eq!(direct.name(), "fork-exec");

        let config = SchedulerConfig::default().launcher("/opt/taskpit-launch");
        let companion = ForkExecLauncher::from_config(&config);
        assert_eq!(
            companion.route(),
            &LaunchRoute::Companion(PathBuf::from("/opt/taskpit-launch"))
        );
    }

    #[test]
    fn test_poll_unknown_pid_is_gone() {
        let mut launcher = ForkExecLauncher::new();
        // pid 1 is never our child
        assert_eq!(launcher.poll(Pid(1)), ProcessState::Gone);
    }
}
