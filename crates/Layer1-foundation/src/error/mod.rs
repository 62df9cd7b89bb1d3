//! Error types for taskpit
//!
//! All crates in the workspace report failures through this one enum.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// taskpit error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Task / scheduling
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The process-duplication step failed. Fatal to the scheduler loop.
    #[error("Spawn failed: {program} - {message}")]
    Spawn { program: String, message: String },

    // ========================================================================
    // External error conversion
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the scheduler loop must stop on this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Spawn { .. })
    }

    /// Whether the error is caused by user-supplied input and can be shown as-is
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::Config(_) | Error::InvalidInput(_))
    }

    /// Spawn error helper
    pub fn spawn(program: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Spawn {
            program: program.into(),
            message: message.into(),
        }
    }
}
