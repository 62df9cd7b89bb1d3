//! taskpit CLI - Main entry point

mod cli;

use anyhow::Context;
use cli::ReportMode;
use clap::Parser;
use std::path::PathBuf;
use taskpit_foundation::SchedulerConfig;
use taskpit_task::{Task, TaskFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tasks in the built-in demonstration batch
const DEMO_TASKS: usize = 10;

/// taskpit - run a batch of commands, at most N at a time
#[derive(Parser, Debug)]
#[command(name = "taskpit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Load tasks from a TOML task file
    #[arg(short, long, value_name = "FILE")]
    tasks: Option<PathBuf>,

    /// Submit the trailing command this many times
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Maximum number of processes running at once
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Pause between ticks, in milliseconds
    #[arg(short, long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Route every task through this companion launcher
    #[arg(long, value_name = "PATH")]
    launcher: Option<PathBuf>,

    /// Stop once nothing is queued or running
    #[arg(short = 'x', long)]
    exit_when_idle: bool,

    /// Read settings from this file instead of the global and project files
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Send the per-tick status dump to the log instead of stdout
    #[arg(long)]
    log_report: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Command to run, after `--`
    #[arg(last = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = load_config(&args)?;
    let tasks = seed_tasks(&args)?;

    let mode = if args.log_report {
        ReportMode::Log
    } else {
        ReportMode::Stdout
    };

    cli::run(config, tasks, mode).await?;
    Ok(())
}

/// Config file(s) first, then command-line overrides
fn load_config(args: &Args) -> anyhow::Result<SchedulerConfig> {
    let mut config = match &args.config {
        Some(path) => SchedulerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SchedulerConfig::load().context("Failed to load config")?,
    };

    if let Some(capacity) = args.capacity {
        config = config.capacity(capacity);
    }
    if let Some(ms) = args.interval_ms {
        config = config.tick_interval_ms(ms);
    }
    if let Some(path) = &args.launcher {
        config = config.launcher(path);
    }
    if args.exit_when_idle {
        config = config.exit_when_idle(true);
    }

    config.validate()?;
    Ok(config)
}

/// Task file, else the trailing command, else the demonstration batch
fn seed_tasks(args: &Args) -> anyhow::Result<Vec<Task>> {
    if let Some(path) = &args.tasks {
        let tasks = TaskFile::from_file(path)
            .and_then(TaskFile::into_tasks)
            .with_context(|| format!("Failed to read tasks from {}", path.display()))?;
        return Ok(tasks);
    }

    let (argv, count) = if args.command.is_empty() {
        (vec!["sleep".to_string(), "2".to_string()], DEMO_TASKS)
    } else {
        (args.command.clone(), args.count)
    };

    let tasks = (0..count)
        .map(|_| Task::new(argv.iter().cloned()))
        .collect::<taskpit_foundation::Result<Vec<_>>>()?;
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("taskpit").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_demo_seed() {
        let tasks = seed_tasks(&parse(&[])).unwrap();
        assert_eq!(tasks.len(), DEMO_TASKS);
        assert!(tasks.iter().all(|t| t.argv() == ["sleep", "2"]));
    }

    #[test]
    fn test_trailing_command_seed() {
        let tasks = seed_tasks(&parse(&["-n", "3", "--", "echo", "-n", "hi"])).unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].argv(), &["echo", "-n", "hi"]);
    }

    #[test]
    fn test_task_file_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.toml");
        std::fs::write(&path, "[[task]]\ncommand = \"true\"\ncount = 2\n").unwrap();

        let args = parse(&["--tasks", path.to_str().unwrap(), "--", "ignored"]);
        let tasks = seed_tasks(&args).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].argv(), &["true"]);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskpit.toml");
        std::fs::write(&path, "capacity = 8\ntick_interval_ms = 50\n").unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "-c", "2", "-x"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.capacity, 2);
        assert_eq!(config.tick_interval_ms, 50);
        assert!(config.exit_when_idle);
    }

    #[test]
    fn test_zero_capacity_flag_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskpit.toml");
        std::fs::write(&path, "").unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "-c", "0"]);
        assert!(load_config(&args).is_err());
    }
}
