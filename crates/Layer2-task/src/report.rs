//! Status reporting - the per-tick dump of running and queued tasks
//!
//! Format (human-oriented, not meant for parsing):
//!
//! ```text
//! R <pid> <argv...>     one line per running process, pid-tree pre-order
//! Q <argv...>           one line per queued task, FIFO order
//! ```

use crate::index::RunningIndex;
use crate::process::Pid;
use crate::queue::SubmissionQueue;
use crate::slots::SlotController;
use crate::task::Task;
use std::fmt;
use std::io::Write;
use taskpit_foundation::Result;
use tracing::{debug, info};

/// Borrowed snapshot of scheduler state at the end of a tick
#[derive(Debug)]
pub struct StatusReport<'a> {
    /// Tick number (1-based; 0 before the first tick)
    pub tick: u64,
    pub running: Vec<(Pid, &'a Task)>,
    pub queued: Vec<&'a Task>,
    pub free_slots: usize,
    pub capacity: usize,
}

impl<'a> StatusReport<'a> {
    pub fn capture(
        tick: u64,
        index: &'a RunningIndex,
        queue: &'a SubmissionQueue,
        slots: &SlotController,
    ) -> Self {
        Self {
            tick,
            running: index.list().collect(),
            queued: queue.iter().collect(),
            free_slots: slots.free(),
            capacity: slots.capacity(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty() && self.queued.is_empty()
    }

    /// The dump as individual lines
    pub fn lines(&self) -> Vec<String> {
        self.running
            .iter()
            .map(|(pid, task)| format!("R {} {}", pid, task))
            .chain(self.queued.iter().map(|task| format!("Q {}", task)))
            .collect()
    }
}

impl fmt::Display for StatusReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Receives one report per tick
pub trait StatusSink {
    fn report(&mut self, report: &StatusReport<'_>) -> Result<()>;
}

/// Writes the dump as plain text, framed by a header and a blank line
pub struct PlainTextSink<W: Write> {
    out: W,
}

impl<W: Write> PlainTextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl PlainTextSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> StatusSink for PlainTextSink<W> {
    fn report(&mut self, report: &StatusReport<'_>) -> Result<()> {
        write!(self.out, "Tasks:\n======\n{}\n", report)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Emits the dump through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn report(&mut self, report: &StatusReport<'_>) -> Result<()> {
        info!(
            "Tick {}: {} running, {} queued, {}/{} slots free",
            report.tick,
            report.running.len(),
            report.queued.len(),
            report.free_slots,
            report.capacity
        );
        for line in report.lines() {
            debug!("{}", line);
        }
        Ok(())
    }
}
