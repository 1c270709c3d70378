/*!
 * Budget Meter
 * Remaining per-tick compute, derived from host measurements and CPU config
 */

use super::host::CpuHost;
use crate::config::CpuConfig;
use crate::core::types::Tick;
use std::fmt;
use std::sync::Arc;

/// Read-only view over the host's compute counters
///
/// Holds no per-tick state of its own; every query goes back to the host.
#[derive(Clone)]
pub struct BudgetMeter {
    host: Arc<dyn CpuHost>,
    target_utilization: f64,
    reserved_fraction: f64,
}

impl BudgetMeter {
    pub fn new(host: Arc<dyn CpuHost>, cpu: &CpuConfig) -> Self {
        Self {
            host,
            target_utilization: cpu.target_utilization,
            reserved_fraction: cpu.reserved_fraction,
        }
    }

    /// Apply new fractions after a config change
    pub fn configure(&mut self, cpu: &CpuConfig) {
        self.target_utilization = cpu.target_utilization;
        self.reserved_fraction = cpu.reserved_fraction;
    }

    /// Effective per-tick limit
    #[inline]
    pub fn limit(&self) -> f64 {
        self.host.limit() * self.target_utilization
    }

    #[inline]
    pub fn used(&self) -> f64 {
        self.host.used()
    }

    /// Safety margin held back from processes
    #[inline]
    pub fn reserve_margin(&self) -> f64 {
        self.limit() * self.reserved_fraction
    }

    /// Compute still available to processes this tick
    #[inline]
    pub fn remaining(&self) -> f64 {
        let limit = self.limit();
        (limit - self.used() - limit * self.reserved_fraction).max(0.0)
    }

    #[inline]
    pub fn has_budget(&self) -> bool {
        self.remaining() > 0.0
    }

    #[inline]
    pub fn bucket(&self) -> f64 {
        self.host.bucket()
    }

    #[inline]
    pub fn tick(&self) -> Tick {
        self.host.tick()
    }

    pub fn host(&self) -> &Arc<dyn CpuHost> {
        &self.host
    }
}

impl fmt::Debug for BudgetMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BudgetMeter")
            .field("target_utilization", &self.target_utilization)
            .field("reserved_fraction", &self.reserved_fraction)
            .finish_non_exhaustive()
    }
}
