/*!
 * Process Module
 * Process definitions, registry, and health monitoring
 */

pub mod health;
pub mod registry;
pub mod types;

// Re-export for convenience
pub use health::{backoff_ticks, escalate, health_score, Escalation};
pub use registry::Registry;
pub use types::{Process, ProcessDefinition, ProcessStats, WorkFn};
