/*!
 * Tick Kernel Library
 * Cooperative, budget-constrained process scheduling for tick-driven hosts
 */

pub mod budget;
pub mod config;
pub mod core;
pub mod monitoring;
pub mod process;
pub mod scheduler;

// Re-exports
pub use budget::{BudgetMeter, BudgetTable, CpuHost, SimHost};
pub use config::KernelConfig;
pub use core::{
    ConfigError, FrequencyClass, KernelError, KernelResult, Priority, ProcessFailure, ProcessId,
    ProcessState, SchedulerError, SuspendedUntil, SuspensionReason, Tick,
};
pub use monitoring::{init_tracing, KernelStats, LifecycleEvent};
pub use process::{Process, ProcessDefinition, ProcessStats};
pub use scheduler::{Kernel, MetricsSummary, ProcessDetail, TickReport};
