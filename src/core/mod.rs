/*!
 * Core Module
 * Shared types, limits, and error definitions
 */

pub mod errors;
pub mod limits;
pub mod types;

pub use errors::{ConfigError, KernelError, KernelResult, ProcessFailure, SchedulerError};
pub use types::{
    FrequencyClass, Priority, ProcessId, ProcessState, SuspendedUntil, SuspensionReason, Tick,
};
