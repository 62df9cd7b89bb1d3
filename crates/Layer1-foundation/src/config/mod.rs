//! Config - settings management
//!
//! - `store.rs` - TOML file store (global / project)
//! - `scheduler.rs` - SchedulerConfig

mod scheduler;
mod store;

pub use scheduler::{
    SchedulerConfig, DEFAULT_CAPACITY, DEFAULT_TICK_INTERVAL_MS, SCHEDULER_CONFIG_FILE,
};
pub use store::{load_file, TomlStore, CONFIG_DIR_NAME};
