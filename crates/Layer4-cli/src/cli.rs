//! Scheduler run mode

use taskpit_foundation::{Result, SchedulerConfig};
use taskpit_task::{PlainTextSink, Scheduler, StatusSink, Task, TracingSink};
use tracing::{info, warn};

/// Where the per-tick status dump goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// `Tasks:` dump on stdout
    Stdout,
    /// Summary at info level, task lines at debug level
    Log,
}

impl ReportMode {
    pub fn sink(self) -> Box<dyn StatusSink> {
        match self {
            ReportMode::Stdout => Box::new(PlainTextSink::stdout()),
            ReportMode::Log => Box::new(TracingSink),
        }
    }
}

/// Submit `tasks` and tick until idle (with `exit_when_idle`), a spawn
/// failure, or Ctrl-C
#[cfg(unix)]
pub async fn run(config: SchedulerConfig, tasks: Vec<Task>, mode: ReportMode) -> Result<()> {
    let launcher = taskpit_task::ForkExecLauncher::from_config(&config);
    let mut scheduler = Scheduler::new(config, launcher)?;

    let submitted = tasks.len();
    for task in tasks {
        scheduler.submit(task);
    }
    info!("Submitted {} tasks", submitted);

    let mut sink = mode.sink();
    let finished = tokio::select! {
        result = scheduler.run(sink.as_mut()) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match finished {
        Some(result) => {
            let ticks = result?;
            info!("All tasks finished after {} ticks", ticks);
        }
        None => {
            let running = scheduler.index().len();
            if running > 0 {
                warn!(
                    "Interrupted after {} ticks; {} processes left running, {} tasks never started",
                    scheduler.ticks(),
                    running,
                    scheduler.queue().len()
                );
            } else {
                info!("Interrupted after {} ticks", scheduler.ticks());
            }
        }
    }

    Ok(())
}

#[cfg(not(unix))]
pub async fn run(_config: SchedulerConfig, _tasks: Vec<Task>, _mode: ReportMode) -> Result<()> {
    Err(taskpit_foundation::Error::Config(
        "process launching is only supported on unix hosts".to_string(),
    ))
}
