/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure returned by a process work callback
///
/// The scheduler treats this exactly like a caught panic: it is logged and
/// counted, never propagated.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[error("{message}")]
pub struct ProcessFailure {
    pub message: String,
}

impl ProcessFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for ProcessFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ProcessFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Configuration loading errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(
        code(config::io),
        help("Check that KERNEL_CONFIG points at a readable file.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    #[diagnostic(
        code(config::parse),
        help("The config must be a JSON object; unknown sections are rejected.")
    )]
    Parse(#[from] serde_json::Error),
}

/// Control-plane errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Process {0} not found")]
    #[diagnostic(
        code(scheduler::process_not_found),
        help("The process may have been unregistered or never existed.")
    )]
    ProcessNotFound(String),

    #[error("Process {0} is not suspended")]
    #[diagnostic(code(scheduler::not_suspended))]
    NotSuspended(String),

    #[error("Process {0} is already suspended")]
    #[diagnostic(code(scheduler::already_suspended))]
    AlreadySuspended(String),

    #[error("Invalid process definition: {0}")]
    #[diagnostic(
        code(scheduler::invalid_definition),
        help("Process ids must be non-empty and cpu budgets finite and non-negative.")
    )]
    InvalidDefinition(String),
}

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error("Scheduler error: {0}")]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("Config error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;
