//! Scheduler configuration
//!
//! Loaded from `taskpit.toml`, global first, then the project file on top.

use super::store::{load_file, TomlStore};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Config file name
pub const SCHEDULER_CONFIG_FILE: &str = "taskpit.toml";

/// Default number of concurrent slots
pub const DEFAULT_CAPACITY: usize = 4;

/// Default pause between ticks
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Maximum number of tasks running at once
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Pause between ticks in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Companion launcher binary. When set, every task is routed through it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launcher: Option<PathBuf>,

    /// Stop the loop once nothing is queued or running
    #[serde(default)]
    pub exit_when_idle: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            launcher: None,
            exit_when_idle: false,
        }
    }
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

/// Partial config as read from one file; absent keys do not override
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct SchedulerConfigFile {
    capacity: Option<usize>,
    tick_interval_ms: Option<u64>,
    launcher: Option<PathBuf>,
    exit_when_idle: Option<bool>,
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// Global + project merged load
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(global) = TomlStore::global() {
            if let Some(file) = global.load_optional::<SchedulerConfigFile>(SCHEDULER_CONFIG_FILE)? {
                debug!("Loaded global config from {}", global.base_dir().display());
                config.merge(file);
            }
        }

        let project = TomlStore::current_project()?;
        if let Some(file) = project.load_optional::<SchedulerConfigFile>(SCHEDULER_CONFIG_FILE)? {
            debug!("Loaded project config from {}", project.base_dir().display());
            config.merge(file);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a single explicit file on top of the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file: SchedulerConfigFile = load_file(path.as_ref())?;
        let mut config = Self::new();
        config.merge(file);
        config.validate()?;
        Ok(config)
    }

    fn merge(&mut self, other: SchedulerConfigFile) {
        if let Some(capacity) = other.capacity {
            self.capacity = capacity;
        }
        if let Some(interval) = other.tick_interval_ms {
            self.tick_interval_ms = interval;
        }
        if other.launcher.is_some() {
            self.launcher = other.launcher;
        }
        if let Some(exit_when_idle) = other.exit_when_idle {
            self.exit_when_idle = exit_when_idle;
        }
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    pub fn launcher(mut self, path: impl Into<PathBuf>) -> Self {
        self.launcher = Some(path.into());
        self
    }

    pub fn exit_when_idle(mut self, exit: bool) -> Self {
        self.exit_when_idle = exit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.capacity, 4);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert!(config.launcher.is_none());
        assert!(!config.exit_when_idle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SCHEDULER_CONFIG_FILE);
        std::fs::write(&path, "capacity = 2\nlauncher = \"/usr/local/bin/taskpit-launch\"\n")
            .unwrap();

        let config = SchedulerConfig::from_file(&path).unwrap();
        assert_eq!(config.capacity, 2);
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
        assert_eq!(
            config.launcher.as_deref(),
            Some(Path::new("/usr/local/bin/taskpit-launch"))
        );
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SCHEDULER_CONFIG_FILE);
        std::fs::write(&path, "capacity = 0\n").unwrap();

        let err = SchedulerConfig::from_file(&path).unwrap_err();
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut config = SchedulerConfig::new().tick_interval_ms(50).exit_when_idle(true);
        config.merge(SchedulerConfigFile {
            capacity: Some(8),
            ..Default::default()
        });

        assert_eq!(config.capacity, 8);
        assert_eq!(config.tick_interval_ms, 50);
        assert!(config.exit_when_idle);
    }
}
