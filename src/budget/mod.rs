/*!
 * Budget Module
 * Host compute measurement, per-tick budget meter and adaptive scaling
 */

pub mod adaptive;
pub mod host;
pub mod meter;

pub use adaptive::{AdaptiveBudgetCalculator, BudgetTable};
pub use host::{CpuHost, SimHost};
pub use meter::BudgetMeter;
