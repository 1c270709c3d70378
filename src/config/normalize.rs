/*!
 * Config Normalization
 * Repairs degenerate or inverted settings so the kernel never runs on them
 */

use super::{FrequencyTable, KernelConfig};
use crate::core::limits::*;
use crate::core::types::FrequencyClass;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// One repaired setting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigCorrection {
    pub field: &'static str,
    pub from: f64,
    pub to: f64,
}

impl fmt::Display for ConfigCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.from, self.to)
    }
}

struct Corrections(Vec<ConfigCorrection>);

impl Corrections {
    fn fix(&mut self, field: &'static str, value: &mut f64, to: f64) {
        if *value == to {
            return;
        }
        self.0.push(ConfigCorrection {
            field,
            from: *value,
            to,
        });
        *value = to;
    }

    fn fix_u64(&mut self, field: &'static str, value: &mut u64, to: u64) {
        if *value == to {
            return;
        }
        self.0.push(ConfigCorrection {
            field,
            from: *value as f64,
            to: to as f64,
        });
        *value = to;
    }

    fn fix_u32(&mut self, field: &'static str, value: &mut u32, to: u32) {
        if *value == to {
            return;
        }
        self.0.push(ConfigCorrection {
            field,
            from: f64::from(*value),
            to: f64::from(to),
        });
        *value = to;
    }
}

impl KernelConfig {
    /// Repair the config in place and report every change
    ///
    /// Guarantees afterwards: `0 <= critical < low < high <= bucket_max`,
    /// fractions inside their ranges, intervals >= 1, a scale factor > 1
    /// and `suspend_after <= permanent_after`.
    pub fn normalize(&mut self) -> Vec<ConfigCorrection> {
        let mut c = Corrections(Vec::new());

        let cpu = &mut self.cpu;
        if !cpu.target_utilization.is_finite() || cpu.target_utilization <= 0.0 {
            c.fix(
                "cpu.target_utilization",
                &mut cpu.target_utilization,
                DEFAULT_TARGET_UTILIZATION,
            );
        } else if cpu.target_utilization > 1.0 {
            c.fix("cpu.target_utilization", &mut cpu.target_utilization, 1.0);
        }
        if !cpu.reserved_fraction.is_finite() || cpu.reserved_fraction < 0.0 {
            c.fix("cpu.reserved_fraction", &mut cpu.reserved_fraction, 0.0);
        } else if cpu.reserved_fraction >= 1.0 {
            c.fix("cpu.reserved_fraction", &mut cpu.reserved_fraction, 0.9);
        }

        let reserve = &mut self.reserve;
        if !reserve.bucket_max.is_finite() || reserve.bucket_max <= 0.0 {
            c.fix("reserve.bucket_max", &mut reserve.bucket_max, DEFAULT_BUCKET_MAX);
        }
        if !reserve.high.is_finite() || reserve.high <= 0.0 {
            c.fix("reserve.high", &mut reserve.high, reserve.bucket_max * 0.9);
        } else if reserve.high > reserve.bucket_max {
            c.fix("reserve.high", &mut reserve.high, reserve.bucket_max);
        }
        if !reserve.low.is_finite() || reserve.low <= 0.0 || reserve.low >= reserve.high {
            c.fix("reserve.low", &mut reserve.low, reserve.high / 2.0);
        }
        if !reserve.critical.is_finite() || reserve.critical < 0.0 || reserve.critical >= reserve.low
        {
            c.fix("reserve.critical", &mut reserve.critical, reserve.low / 2.0);
        }

        let bucket_max = self.reserve.bucket_max;
        for class in FrequencyClass::ALL {
            let fallback = FrequencyTable::class_default(class);
            let entry = self.frequencies.get_mut(class);
            if entry.interval == 0 {
                c.fix_u64(frequency_field(class, "interval"), &mut entry.interval, 1);
            }
            if !entry.cpu_budget.is_finite() || entry.cpu_budget < 0.0 {
                c.fix(
                    frequency_field(class, "cpu_budget"),
                    &mut entry.cpu_budget,
                    fallback.cpu_budget,
                );
            }
            if !entry.min_reserve.is_finite() || entry.min_reserve < 0.0 {
                c.fix(frequency_field(class, "min_reserve"), &mut entry.min_reserve, 0.0);
            } else if entry.min_reserve > bucket_max {
                c.fix(
                    frequency_field(class, "min_reserve"),
                    &mut entry.min_reserve,
                    bucket_max,
                );
            }
        }

        let adaptive = &mut self.adaptive;
        if adaptive.min_population == 0 {
            c.0.push(ConfigCorrection {
                field: "adaptive.min_population",
                from: 0.0,
                to: 1.0,
            });
            adaptive.min_population = 1;
        }
        if !adaptive.scale_factor.is_finite() || adaptive.scale_factor <= 1.0 {
            c.fix("adaptive.scale_factor", &mut adaptive.scale_factor, 10.0);
        }
        if !adaptive.max_multiplier.is_finite() || adaptive.max_multiplier < 1.0 {
            c.fix("adaptive.max_multiplier", &mut adaptive.max_multiplier, 1.0);
        }
        for (field, value) in [
            ("adaptive.critical_multiplier", &mut adaptive.critical_multiplier),
            ("adaptive.low_multiplier", &mut adaptive.low_multiplier),
            ("adaptive.high_multiplier", &mut adaptive.high_multiplier),
        ] {
            if !value.is_finite() || *value < 0.0 {
                c.fix(field, value, 1.0);
            }
        }

        let breaker = &mut self.circuit_breaker;
        if breaker.suspend_after == 0 {
            c.fix_u32("circuit_breaker.suspend_after", &mut breaker.suspend_after, 1);
        }
        if breaker.permanent_after < breaker.suspend_after {
            let to = breaker.suspend_after;
            c.fix_u32(
                "circuit_breaker.permanent_after",
                &mut breaker.permanent_after,
                to,
            );
        }
        if breaker.max_backoff == 0 {
            c.fix_u64("circuit_breaker.max_backoff", &mut breaker.max_backoff, 1);
        }
        if breaker.backoff_base == 0 {
            c.fix_u64("circuit_breaker.backoff_base", &mut breaker.backoff_base, 2);
        }

        let warnings = &mut self.warnings;
        if !warnings.over_budget_ratio.is_finite() || warnings.over_budget_ratio <= 0.0 {
            c.fix(
                "warnings.over_budget_ratio",
                &mut warnings.over_budget_ratio,
                OVER_BUDGET_RATIO,
            );
        }

        for correction in &c.0 {
            warn!(
                field = correction.field,
                from = correction.from,
                to = correction.to,
                "Corrected invalid kernel config value"
            );
        }
        c.0
    }
}

fn frequency_field(class: FrequencyClass, field: &str) -> &'static str {
    match (class, field) {
        (FrequencyClass::High, "interval") => "frequencies.high.interval",
        (FrequencyClass::High, "cpu_budget") => "frequencies.high.cpu_budget",
        (FrequencyClass::High, _) => "frequencies.high.min_reserve",
        (FrequencyClass::Medium, "interval") => "frequencies.medium.interval",
        (FrequencyClass::Medium, "cpu_budget") => "frequencies.medium.cpu_budget",
        (FrequencyClass::Medium, _) => "frequencies.medium.min_reserve",
        (FrequencyClass::Low, "interval") => "frequencies.low.interval",
        (FrequencyClass::Low, "cpu_budget") => "frequencies.low.cpu_budget",
        (FrequencyClass::Low, _) => "frequencies.low.min_reserve",
    }
}
