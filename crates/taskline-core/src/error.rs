//! Core error types for taskline-core.
//!
//! Producer-side argument errors surface synchronously to the caller;
//! writer-side failures are diagnosed inside the writer thread and only
//! escalate (as [`SessionError::WriterDead`]) once the writer itself is
//! unusable.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for taskline-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid construction arguments
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session and writer-thread errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors (reader path; treated as transient by pollers)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid arguments at task creation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Task name must be non-empty
    #[error("Task name must not be empty")]
    EmptyName,

    /// A zero expected-unit count is meaningless
    #[error("Task total must be greater than zero when given")]
    ZeroTotal,
}

/// Session lifecycle and writer-thread errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Sidecar file could not be opened. Fatal for this session.
    #[error("Failed to open progress log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The background writer thread is no longer running. Raised lazily on
    /// the next producer call after the writer died.
    #[error("Background writer thread is no longer running")]
    WriterDead,

    /// The writer did not acknowledge shutdown within the drain timeout.
    /// Reported best-effort; queued events may not have reached the file.
    #[error("Writer did not drain within {timeout_ms} ms on shutdown")]
    ShutdownTimeout { timeout_ms: u64 },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
