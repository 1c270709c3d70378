/*!
 * Kernel Configuration
 *
 * Every tunable of the scheduler: CPU targets, reserve thresholds, per-class
 * defaults, adaptive scaling, circuit breaker and warning policies.
 * All of it is runtime-mutable through `Kernel::update_config`.
 */

mod normalize;

pub use normalize::ConfigCorrection;

use crate::core::errors::ConfigError;
use crate::core::limits::*;
use crate::core::types::{FrequencyClass, Tick};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming a JSON config file
pub const CONFIG_ENV_VAR: &str = "KERNEL_CONFIG";

/// Per-tick CPU targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpuConfig {
    /// Fraction of the host ceiling treated as the effective limit
    pub target_utilization: f64,
    /// Fraction of the effective limit never handed out to processes
    pub reserved_fraction: f64,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            target_utilization: DEFAULT_TARGET_UTILIZATION,
            reserved_fraction: DEFAULT_RESERVED_FRACTION,
        }
    }
}

/// Bucket (reserve) thresholds; must satisfy critical < low < high <= bucket_max
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReserveConfig {
    pub bucket_max: f64,
    pub critical: f64,
    pub low: f64,
    pub high: f64,
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            bucket_max: DEFAULT_BUCKET_MAX,
            critical: DEFAULT_BUCKET_CRITICAL,
            low: DEFAULT_BUCKET_LOW,
            high: DEFAULT_BUCKET_HIGH,
        }
    }
}

/// Defaults applied to processes that don't override them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrequencyDefaults {
    /// Minimum ticks between runs
    pub interval: Tick,
    /// Base fraction of the effective limit, before adaptive scaling
    pub cpu_budget: f64,
    /// Bucket level the process expects to be available
    pub min_reserve: f64,
}

/// A class entry as written in config; absent fields fall back to the class default
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialFrequency {
    interval: Option<Tick>,
    cpu_budget: Option<f64>,
    min_reserve: Option<f64>,
}

impl PartialFrequency {
    fn merged(self, class: FrequencyClass) -> FrequencyDefaults {
        let base = FrequencyTable::class_default(class);
        FrequencyDefaults {
            interval: self.interval.unwrap_or(base.interval),
            cpu_budget: self.cpu_budget.unwrap_or(base.cpu_budget),
            min_reserve: self.min_reserve.unwrap_or(base.min_reserve),
        }
    }
}

fn high_entry<'de, D: Deserializer<'de>>(d: D) -> Result<FrequencyDefaults, D::Error> {
    PartialFrequency::deserialize(d).map(|p| p.merged(FrequencyClass::High))
}

fn medium_entry<'de, D: Deserializer<'de>>(d: D) -> Result<FrequencyDefaults, D::Error> {
    PartialFrequency::deserialize(d).map(|p| p.merged(FrequencyClass::Medium))
}

fn low_entry<'de, D: Deserializer<'de>>(d: D) -> Result<FrequencyDefaults, D::Error> {
    PartialFrequency::deserialize(d).map(|p| p.merged(FrequencyClass::Low))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrequencyTable {
    #[serde(deserialize_with = "high_entry")]
    pub high: FrequencyDefaults,
    #[serde(deserialize_with = "medium_entry")]
    pub medium: FrequencyDefaults,
    #[serde(deserialize_with = "low_entry")]
    pub low: FrequencyDefaults,
}

impl FrequencyTable {
    pub fn get(&self, class: FrequencyClass) -> &FrequencyDefaults {
        match class {
            FrequencyClass::High => &self.high,
            FrequencyClass::Medium => &self.medium,
            FrequencyClass::Low => &self.low,
        }
    }

    pub fn get_mut(&mut self, class: FrequencyClass) -> &mut FrequencyDefaults {
        match class {
            FrequencyClass::High => &mut self.high,
            FrequencyClass::Medium => &mut self.medium,
            FrequencyClass::Low => &mut self.low,
        }
    }

    pub(crate) fn class_default(class: FrequencyClass) -> FrequencyDefaults {
        match class {
            FrequencyClass::High => FrequencyDefaults {
                interval: 1,
                cpu_budget: 0.5,
                min_reserve: 0.0,
            },
            FrequencyClass::Medium => FrequencyDefaults {
                interval: 5,
                cpu_budget: 0.3,
                min_reserve: 1_000.0,
            },
            FrequencyClass::Low => FrequencyDefaults {
                interval: 20,
                cpu_budget: 0.1,
                min_reserve: 3_000.0,
            },
        }
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self {
            high: Self::class_default(FrequencyClass::High),
            medium: Self::class_default(FrequencyClass::Medium),
            low: Self::class_default(FrequencyClass::Low),
        }
    }
}

/// Population and reserve scaling of per-class budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdaptiveConfig {
    /// Population at or below which the multiplier is 1
    pub min_population: usize,
    /// Population growth factor that adds one whole multiplier step
    pub scale_factor: f64,
    pub max_multiplier: f64,
    pub critical_multiplier: f64,
    pub low_multiplier: f64,
    pub high_multiplier: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            min_population: 1,
            scale_factor: 10.0,
            max_multiplier: 3.0,
            critical_multiplier: 0.3,
            low_multiplier: 0.6,
            high_multiplier: 1.2,
        }
    }
}

/// Failure escalation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircuitBreakerConfig {
    pub suspend_after: u32,
    pub permanent_after: u32,
    pub max_backoff: Tick,
    pub backoff_base: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            suspend_after: SUSPEND_AFTER_ERRORS,
            permanent_after: PERMANENT_AFTER_ERRORS,
            max_backoff: MAX_BACKOFF_TICKS,
            backoff_base: 2,
        }
    }
}

/// Health score weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthConfig {
    pub recent_window: Tick,
    pub recent_bonus: f64,
    pub error_penalty: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            recent_window: HEALTH_RECENT_WINDOW,
            recent_bonus: HEALTH_RECENT_BONUS,
            error_penalty: HEALTH_ERROR_PENALTY,
        }
    }
}

/// Advisory warning thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WarningConfig {
    /// Cost / expected-cost ratio above which a process is reported
    pub over_budget_ratio: f64,
    /// Minimum ticks between two reports for the same process
    pub cooldown_ticks: Tick,
    /// Wall-clock milliseconds above which a tick is logged as slow
    pub slow_tick_ms: u64,
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            over_budget_ratio: OVER_BUDGET_RATIO,
            cooldown_ticks: OVER_BUDGET_COOLDOWN,
            slow_tick_ms: SLOW_TICK_MS,
        }
    }
}

/// Complete kernel configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    pub cpu: CpuConfig,
    pub reserve: ReserveConfig,
    pub frequencies: FrequencyTable,
    pub adaptive: AdaptiveConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub health: HealthConfig,
    pub warnings: WarningConfig,
    /// Skip processes whose min reserve exceeds the current bucket
    pub enforce_min_reserve: bool,
}

impl KernelConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaves more headroom and backs off failing processes sooner
    pub fn conservative() -> Self {
        Self {
            cpu: CpuConfig {
                target_utilization: 0.9,
                reserved_fraction: 0.1,
            },
            circuit_breaker: CircuitBreakerConfig {
                suspend_after: 2,
                permanent_after: 6,
                ..CircuitBreakerConfig::default()
            },
            enforce_min_reserve: true,
            ..Self::default()
        }
    }

    /// Uses the full host ceiling and tolerates more failures
    pub fn aggressive() -> Self {
        Self {
            cpu: CpuConfig {
                target_utilization: 1.0,
                reserved_fraction: 0.0,
            },
            circuit_breaker: CircuitBreakerConfig {
                suspend_after: 5,
                permanent_after: 15,
                ..CircuitBreakerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing sections take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        info!(path = %path.display(), "Loaded kernel config");
        Ok(config)
    }

    /// Load from the file named by `KERNEL_CONFIG`, or defaults when unset
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => {
                debug!("{} not set, using default kernel config", CONFIG_ENV_VAR);
                Ok(Self::default())
            }
        }
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
