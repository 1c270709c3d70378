/*!
 * Adaptive Budget Calculator
 *
 * Derives per-frequency-class CPU budgets once per tick from population
 * size (logarithmic) and bucket level (step function). Results are published
 * as an immutable, tick-stamped `BudgetTable`; holders of an older snapshot
 * can detect it with `is_stale`.
 */

use crate::config::{AdaptiveConfig, KernelConfig, ReserveConfig};
use crate::core::types::{FrequencyClass, Tick};
use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Per-class budgets in effect for one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetTable {
    /// Increments on every recompute
    pub version: u64,
    /// Tick the table was computed for
    pub tick: Tick,
    pub population: usize,
    pub bucket: f64,
    pub population_multiplier: f64,
    pub reserve_multiplier: f64,
    /// Indexed by `FrequencyClass::index`
    budgets: [f64; 3],
}

impl BudgetTable {
    /// Unscaled table straight from config
    pub fn base(config: &KernelConfig) -> Self {
        Self {
            version: 0,
            tick: 0,
            population: 0,
            bucket: config.reserve.bucket_max,
            population_multiplier: 1.0,
            reserve_multiplier: 1.0,
            budgets: FrequencyClass::ALL.map(|class| config.frequencies.get(class).cpu_budget),
        }
    }

    /// Default budget (fraction of the effective limit) for a class
    #[inline]
    pub fn budget(&self, class: FrequencyClass) -> f64 {
        self.budgets[class.index()]
    }

    /// Whether this snapshot predates `now`
    #[inline]
    pub fn is_stale(&self, now: Tick) -> bool {
        self.tick != now
    }
}

/// Population multiplier: `1 + ln(n / min_n) / ln(scale)` clamped to `[1, max]`
pub fn population_multiplier(adaptive: &AdaptiveConfig, population: usize) -> f64 {
    let min_n = adaptive.min_population.max(1);
    let n = population.max(min_n) as f64;
    let raw = 1.0 + (n / min_n as f64).ln() / adaptive.scale_factor.ln();
    if raw.is_finite() {
        raw.clamp(1.0, adaptive.max_multiplier.max(1.0))
    } else {
        1.0
    }
}

/// Reserve multiplier: step function over the bucket thresholds
pub fn reserve_multiplier(reserve: &ReserveConfig, adaptive: &AdaptiveConfig, bucket: f64) -> f64 {
    if bucket < reserve.critical {
        adaptive.critical_multiplier
    } else if bucket < reserve.low {
        adaptive.low_multiplier
    } else if bucket > reserve.high {
        adaptive.high_multiplier
    } else {
        1.0
    }
}

/// Publishes the live budget table
#[derive(Debug)]
pub struct AdaptiveBudgetCalculator {
    table: ArcSwap<BudgetTable>,
}

impl AdaptiveBudgetCalculator {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            table: ArcSwap::from_pointee(BudgetTable::base(config)),
        }
    }

    /// Current snapshot
    #[inline]
    pub fn current(&self) -> Arc<BudgetTable> {
        self.table.load_full()
    }

    /// Recompute and publish the table for `tick`
    pub fn recompute(
        &self,
        config: &KernelConfig,
        population: usize,
        bucket: f64,
        tick: Tick,
    ) -> Arc<BudgetTable> {
        let population_multiplier = population_multiplier(&config.adaptive, population);
        let reserve_multiplier = reserve_multiplier(&config.reserve, &config.adaptive, bucket);
        let scale = population_multiplier * reserve_multiplier;

        let version = self.table.load().version + 1;
        let table = Arc::new(BudgetTable {
            version,
            tick,
            population,
            bucket,
            population_multiplier,
            reserve_multiplier,
            budgets: FrequencyClass::ALL
                .map(|class| config.frequencies.get(class).cpu_budget * scale),
        });

        debug!(
            tick,
            version,
            population,
            bucket,
            population_multiplier,
            reserve_multiplier,
            "Recomputed adaptive budgets"
        );

        self.table.store(Arc::clone(&table));
        table
    }
}
