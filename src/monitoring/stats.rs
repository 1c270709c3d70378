/*!
 * Lock-Free Kernel Statistics
 * Atomic counters updated from the tick loop and readable from anywhere
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the kernel counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelStats {
    pub ticks: u64,
    pub executions: u64,
    pub failures: u64,
    pub skips: u64,
    pub deferrals: u64,
    pub starved_ticks: u64,
    pub suspensions: u64,
    pub permanent_suspensions: u64,
    pub recoveries: u64,
    pub over_budget_warnings: u64,
    pub queue_rebuilds: u64,
}

/// Atomic kernel counters
///
/// # Note
/// Counters are independent relaxed atomics; a snapshot taken mid-tick
/// may mix values from before and after the same execution.
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct AtomicKernelStats {
    ticks: AtomicU64,
    executions: AtomicU64,
    failures: AtomicU64,
    skips: AtomicU64,
    deferrals: AtomicU64,
    starved_ticks: AtomicU64,
    suspensions: AtomicU64,
    permanent_suspensions: AtomicU64,
    recoveries: AtomicU64,
    over_budget_warnings: AtomicU64,
    queue_rebuilds: AtomicU64,
}

macro_rules! counter {
    ($($inc:ident => $field:ident),+ $(,)?) => {
        $(
            #[inline(always)]
            pub fn $inc(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )+
    };
}

impl AtomicKernelStats {
    pub fn new() -> Self {
        Self::default()
    }

    counter! {
        inc_ticks => ticks,
        inc_executions => executions,
        inc_failures => failures,
        inc_starved => starved_ticks,
        inc_suspensions => suspensions,
        inc_permanent_suspensions => permanent_suspensions,
        inc_recoveries => recoveries,
        inc_over_budget => over_budget_warnings,
        inc_rebuilds => queue_rebuilds,
    }

    #[inline]
    pub fn add_skips(&self, n: u64) {
        self.skips.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_deferrals(&self, n: u64) {
        self.deferrals.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> KernelStats {
        KernelStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            skips: self.skips.load(Ordering::Relaxed),
            deferrals: self.deferrals.load(Ordering::Relaxed),
            starved_ticks: self.starved_ticks.load(Ordering::Relaxed),
            suspensions: self.suspensions.load(Ordering::Relaxed),
            permanent_suspensions: self.permanent_suspensions.load(Ordering::Relaxed),
            recoveries: self.recoveries.load(Ordering::Relaxed),
            over_budget_warnings: self.over_budget_warnings.load(Ordering::Relaxed),
            queue_rebuilds: self.queue_rebuilds.load(Ordering::Relaxed),
        }
    }
}
