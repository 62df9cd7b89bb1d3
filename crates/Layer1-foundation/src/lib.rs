//! # taskpit-foundation
//!
//! Foundation layer for taskpit:
//! - Error: the workspace-wide `Error` enum and `Result` alias
//! - Config: `SchedulerConfig` and its TOML store (global + project merge)

pub mod config;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{
    SchedulerConfig, TomlStore, DEFAULT_CAPACITY, DEFAULT_TICK_INTERVAL_MS,
    SCHEDULER_CONFIG_FILE,
};
