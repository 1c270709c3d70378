/*!
 * Kernel Limits
 * Default tuning constants; every value here is overridable through `KernelConfig`
 */

use super::types::Tick;

/// Fraction of the host's per-tick ceiling the kernel aims to use
pub const DEFAULT_TARGET_UTILIZATION: f64 = 0.98;

/// Fraction of the effective limit held back as a safety margin
pub const DEFAULT_RESERVED_FRACTION: f64 = 0.05;

/// Maximum bucket (reserve) level
pub const DEFAULT_BUCKET_MAX: f64 = 10_000.0;

pub const DEFAULT_BUCKET_CRITICAL: f64 = 500.0;
pub const DEFAULT_BUCKET_LOW: f64 = 2_000.0;
pub const DEFAULT_BUCKET_HIGH: f64 = 9_000.0;

/// Consecutive failures before a temporary suspension
pub const SUSPEND_AFTER_ERRORS: u32 = 3;

/// Consecutive failures before the circuit breaker opens permanently
pub const PERMANENT_AFTER_ERRORS: u32 = 10;

/// Backoff ceiling in ticks
pub const MAX_BACKOFF_TICKS: Tick = 1_000;

/// Health score bounds
pub const HEALTH_MAX: f64 = 100.0;
pub const HEALTH_MIN: f64 = 0.0;

/// A success this many ticks ago or fewer (exclusive) counts as recent
pub const HEALTH_RECENT_WINDOW: Tick = 100;
pub const HEALTH_RECENT_BONUS: f64 = 20.0;
pub const HEALTH_ERROR_PENALTY: f64 = 15.0;

/// Over-budget warning ratio and per-process cooldown
pub const OVER_BUDGET_RATIO: f64 = 1.5;
pub const OVER_BUDGET_COOLDOWN: Tick = 100;

/// Wall-clock duration above which a tick is logged as slow
pub const SLOW_TICK_MS: u64 = 50;

/// Default number of entries in top/bottom metrics lists
pub const DEFAULT_TOP_N: usize = 5;
