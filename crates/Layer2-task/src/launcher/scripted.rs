//! Scripted launcher - deterministic fake processes
//!
//! Hands out synthetic pids and decides exits from a script instead of the
//! OS, so scheduler behavior can be tested without creating processes.

use crate::launcher::ProcessLauncher;
use crate::process::{ExitOutcome, Pid, ProcessState};
use crate::task::Task;
use std::collections::{BTreeMap, VecDeque};
use taskpit_foundation::{Error, Result};

/// First pid handed out when no sequence is configured
const DEFAULT_FIRST_PID: i32 = 1000;

/// One successful `spawn` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRecord {
    pub pid: Pid,
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct FakeProcess {
    /// Polls left that still report `Running`; `None` runs until finished
    remaining_polls: Option<u32>,
    /// Set once the script decides the process has exited
    outcome: Option<ExitOutcome>,
}

/// Launcher with scripted pids and exits
#[derive(Debug)]
pub struct ScriptedLauncher {
    next_pid: i32,
    pid_sequence: VecDeque<i32>,
    lifetime: Option<u32>,
    live: BTreeMap<Pid, FakeProcess>,
    spawned: Vec<SpawnRecord>,
    failing_spawns: usize,
    polls: usize,
}

impl Default for ScriptedLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedLauncher {
    /// Processes run until explicitly finished; pids count up from 1000
    pub fn new() -> Self {
        Self {
            next_pid: DEFAULT_FIRST_PID,
            pid_sequence: VecDeque::new(),
            lifetime: None,
            live: BTreeMap::new(),
            spawned: Vec::new(),
            failing_spawns: 0,
            polls: 0,
        }
    }

    /// Hand out these pids first, in order
    pub fn with_pids(mut self, pids: impl IntoIterator<Item = i32>) -> Self {
        self.pid_sequence = pids.into_iter().collect();
        self
    }

    /// Every process reports `Running` for `polls` polls, then exits with 0
    pub fn with_lifetime(mut self, polls: u32) -> Self {
        self.lifetime = Some(polls);
        self
    }

    /// Make the next `count` spawn calls fail like a failed fork
    pub fn fail_next_spawns(&mut self, count: usize) {
        self.failing_spawns = count;
    }

    /// Mark a live process as exited with `outcome`
    pub fn finish(&mut self, pid: Pid, outcome: ExitOutcome) -> bool {
        match self.live.get_mut(&pid) {
            Some(process) => {
                process.outcome = Some(outcome);
                true
            }
            None => false,
        }
    }

    /// Mark every live process as exited successfully
    pub fn finish_all(&mut self) {
        for process in self.live.values_mut() {
            process.outcome.get_or_insert(ExitOutcome::Code(0));
        }
    }

    /// Forget a process so later polls report `Gone`
    pub fn vanish(&mut self, pid: Pid) -> bool {
        self.live.remove(&pid).is_some()
    }

    /// Every successful spawn, oldest first
    pub fn spawned(&self) -> &[SpawnRecord] {
        &self.spawned
    }

    /// Pids that have been spawned and not yet observed as exited
    pub fn live_pids(&self) -> Vec<Pid> {
        self.live.keys().copied().collect()
    }

    /// Total poll calls so far
    pub fn poll_count(&self) -> usize {
        self.polls
    }

    fn next_pid(&mut self) -> Pid {
        if let Some(pid) = self.pid_sequence.pop_front() {
            return Pid(pid);
        }
        let pid = self.next_pid;
        self.next_pid += 1;
        Pid(pid)
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn spawn(&mut self, task: &Task) -> Result<Pid> {
        if self.failing_spawns > 0 {
            self.failing_spawns -= 1;
            return Err(Error::spawn(
                task.program(),
                "Resource temporarily unavailable",
            ));
        }

        let pid = self.next_pid();
        self.live.insert(
            pid,
            FakeProcess {
                remaining_polls: self.lifetime,
                outcome: None,
            },
        );
        self.spawned.push(SpawnRecord {
            pid,
            argv: task.argv().to_vec(),
        });
        Ok(pid)
    }

    fn poll(&mut self, pid: Pid) -> ProcessState {
        self.polls += 1;

        let Some(process) = self.live.get_mut(&pid) else {
            return ProcessState::Gone;
        };

        let outcome = match (process.outcome, process.remaining_polls) {
            (Some(outcome), _) => outcome,
            (None, Some(0)) => ExitOutcome::Code(0),
            (None, Some(left)) => {
                process.remaining_polls = Some(left - 1);
                return ProcessState::Running;
            }
            (None, None) => return ProcessState::Running,
        };

        // a reaped child can be waited on only once
        self.live.remove(&pid);
        ProcessState::Exited(outcome)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
