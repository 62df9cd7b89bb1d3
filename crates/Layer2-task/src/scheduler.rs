//! Scheduler - the reap / dispatch / report tick loop
//!
//! Features:
//! - FIFO admission gated by a fixed number of slots
//! - Non-blocking reaping of finished processes every tick
//! - Pluggable process launcher (real fork/exec or scripted)
//! - Per-tick status report to any `StatusSink`
//!
//! All state lives in one `Scheduler` value and every operation takes
//! `&mut self`, so a tick always runs to completion before the next one
//! starts and nothing needs a lock.

use crate::index::RunningIndex;
use crate::launcher::ProcessLauncher;
use crate::process::ProcessState;
use crate::queue::SubmissionQueue;
use crate::report::{StatusReport, StatusSink};
use crate::slots::SlotController;
use crate::task::{Task, TaskId};
use taskpit_foundation::{Result, SchedulerConfig};
use tracing::{debug, error, info, warn};

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: u64,
    pub reaped: usize,
    pub dispatched: usize,
    pub running: usize,
    pub queued: usize,
    pub free_slots: usize,
}

/// Scheduler state: queue, running index, slots and the launcher
pub struct Scheduler<L: ProcessLauncher> {
    config: SchedulerConfig,
    queue: SubmissionQueue,
    index: RunningIndex,
    slots: SlotController,
    launcher: L,
    ticks: u64,
}

impl<L: ProcessLauncher> Scheduler<L> {
    /// Create a scheduler with every slot free
    pub fn new(config: SchedulerConfig, launcher: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            slots: SlotController::new(config.capacity),
            config,
            queue: SubmissionQueue::new(),
            index: RunningIndex::new(),
            launcher,
            ticks: 0,
        })
    }

    /// Append a task to the submission queue
    pub fn submit(&mut self, task: Task) -> TaskId {
        let task_id = task.id();
        debug!("Queued task {}: {}", task_id, task);
        self.queue.submit(task);
        task_id
    }

    /// Reap at most one terminated process.
    ///
    /// Returns true iff an entry was removed; its slot is released and its
    /// task dropped.
    pub fn reap_one(&mut self) -> bool {
        let launcher = &mut self.launcher;
        let mut observed = ProcessState::Running;

        let reaped = self.index.reap_one(|pid| {
            let state = launcher.poll(pid);
            if state.is_terminated() {
                observed = state;
                true
            } else {
                false
            }
        });

        let Some(entry) = reaped else {
            return false;
        };
        self.slots.release();

        let runtime_ms = entry.elapsed().num_milliseconds();
        match observed {
            ProcessState::Exited(outcome) => debug!(
                "Reaped pid {} ({}, {}ms): {}",
                entry.pid(),
                outcome,
                runtime_ms,
                entry.task()
            ),
            _ => warn!(
                "pid {} vanished before its status could be read: {}",
                entry.pid(),
                entry.task()
            ),
        }
        true
    }

    /// Reap every process that has terminated so far
    pub fn reap_all(&mut self) -> usize {
        let mut reaped = 0;
        while self.reap_one() {
            reaped += 1;
        }
        reaped
    }

    /// Start queued tasks while slots are free.
    ///
    /// A spawn error aborts the phase and is returned as-is; the task that
    /// failed to spawn is dropped. Tasks already started stay tracked.
    pub fn dispatch(&mut self) -> Result<usize> {
        let mut dispatched = 0;

        while self.slots.has_free() {
            let Some(task) = self.queue.pop_front() else {
                break;
            };

            let pid = match self.launcher.spawn(&task) {
                Ok(pid) => pid,
                Err(e) => {
                    error!("Dispatch aborted on task {} ({}): {}", task.id(), task, e);
                    return Err(e);
                }
            };

            self.slots.try_acquire();
            debug!("Dispatched task {} as pid {}", task.id(), pid);
            self.index.insert(pid, task);
            dispatched += 1;
        }

        Ok(dispatched)
    }

    /// Snapshot of running and queued tasks
    pub fn report(&self) -> StatusReport<'_> {
        StatusReport::capture(self.ticks, &self.index, &self.queue, &self.slots)
    }

    /// One tick without the pause: reap, dispatch, report
    pub fn tick<S>(&mut self, sink: &mut S) -> Result<TickSummary>
    where
        S: StatusSink + ?Sized,
    {
        self.ticks += 1;

        let reaped = self.reap_all();
        let dispatched = self.dispatch()?;

        debug_assert_eq!(self.slots.occupied(), self.index.len());

        if let Err(e) = sink.report(&self.report()) {
            warn!("Status report failed: {}", e);
        }

        Ok(TickSummary {
            tick: self.ticks,
            reaped,
            dispatched,
            running: self.index.len(),
            queued: self.queue.len(),
            free_slots: self.slots.free(),
        })
    }

    /// Tick forever, pausing `tick_interval` between ticks.
    ///
    /// Returns the number of ticks run when `exit_when_idle` is set and a
    /// tick leaves nothing queued or running. A spawn failure ends the loop
    /// with that error.
    pub async fn run<S>(&mut self, sink: &mut S) -> Result<u64>
    where
        S: StatusSink + ?Sized,
    {
        let interval = self.config.tick_interval();
        info!(
            "Scheduler started: {} slots, {}ms tick, launcher {}",
            self.slots.capacity(),
            interval.as_millis(),
            self.launcher.name()
        );

        loop {
            let summary = self.tick(sink)?;

            if self.config.exit_when_idle && self.is_idle() {
                info!("Idle after {} ticks, stopping", summary.tick);
                return Ok(summary.tick);
            }

            tokio::time::sleep(interval).await;
        }
    }

    /// Nothing queued and nothing running
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.index.is_empty()
    }

    pub fn queue(&self) -> &SubmissionQueue {
        &self.queue
    }

    pub fn index(&self) -> &RunningIndex {
        &self.index
    }

    pub fn slots(&self) -> &SlotController {
        &self.slots
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn launcher_mut(&mut self) -> &mut L {
        &mut self.launcher
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::ScriptedLauncher;
    use crate::process::{ExitOutcome, Pid};
    use crate::report::PlainTextSink;

    fn scheduler(capacity: usize) -> Scheduler<ScriptedLauncher> {
        let config = SchedulerConfig::default().capacity(capacity);
        Scheduler::new(config, ScriptedLauncher::new()).unwrap()
    }

    fn sleep_task() -> Task {
        Task::new(["sleep", "2"]).unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = SchedulerConfig::default().capacity(0);
        assert!(Scheduler::new(config, ScriptedLauncher::new()).is_err());
    }

    #[test]
    fn test_dispatch_respects_slots() {
        let mut sched = scheduler(2);
        for _ in 0..3 {
            sched.submit(sleep_task());
        }

        assert_eq!(sched.dispatch().unwrap(), 2);
        assert_eq!(sched.slots().free(), 0);
        assert_eq!(sched.index().len(), 2);
        assert_eq!(sched.queue().len(), 1);

        // no free slot, nothing more starts
        assert_eq!(sched.dispatch().unwrap(), 0);
    }

    #[test]
    fn test_reap_releases_slot() {
        let mut sched = scheduler(1);
        sched.submit(sleep_task());
        sched.dispatch().unwrap();

        assert!(!sched.reap_one());
        sched.launcher_mut().finish(Pid(1000), ExitOutcome::Code(3));
        assert!(sched.reap_one());
        assert_eq!(sched.slots().free(), 1);
        assert!(sched.is_idle());
    }

    #[test]
    fn test_spawn_failure_is_fatal_and_keeps_started_tasks() {
        let mut sched = scheduler(3);
        sched.submit(sleep_task());
        assert_eq!(sched.dispatch().unwrap(), 1);

        sched.submit(sleep_task());
        sched.submit(sleep_task());
        sched.launcher_mut().fail_next_spawns(1);

        let err = sched.dispatch().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(sched.index().len(), 1);
        assert_eq!(sched.queue().len(), 1);
        assert_eq!(sched.slots().free(), 2);
    }

    #[test]
    fn test_tick_summary() {
        let mut sched = scheduler(2);
        sched.submit(sleep_task());
        let mut sink = PlainTextSink::new(Vec::new());

        let summary = sched.tick(&mut sink).unwrap();
        assert_eq!(
            summary,
            TickSummary {
                tick: 1,
                reaped: 0,
                dispatched: 1,
                running: 1,
                queued: 0,
                free_slots: 1,
            }
        );

        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(written, "Tasks:\n======\nR 1000 sleep 2\n\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exits_when_idle() {
        let config = SchedulerConfig::default()
            .capacity(2)
            .tick_interval_ms(1000)
            .exit_when_idle(true);
        let launcher = ScriptedLauncher::new().with_lifetime(1);
        let mut sched = Scheduler::new(config, launcher).unwrap();
        for _ in 0..3 {
            sched.submit(sleep_task());
        }

        let mut sink = PlainTextSink::new(Vec::new());
        let ticks = sched.run(&mut sink).await.unwrap();

        assert!(sched.is_idle());
        assert_eq!(sched.launcher().spawned().len(), 3);
        assert_eq!(ticks, sched.ticks());
        assert!(ticks >= 3);
    }
}
