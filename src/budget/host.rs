/*!
 * CPU Host
 * The kernel's view of the environment that meters compute per tick
 */

use crate::core::types::Tick;
use parking_lot::Mutex;

/// Host-reported compute measurements
///
/// Implementations report live values: `used` grows while processes run
/// within a tick and resets when the host advances to the next one.
pub trait CpuHost: Send + Sync {
    /// Current tick number
    fn tick(&self) -> Tick;

    /// Advertised per-tick compute ceiling
    fn limit(&self) -> f64;

    /// Compute consumed so far this tick
    fn used(&self) -> f64;

    /// Current reserve (bucket) level
    fn bucket(&self) -> f64;

    /// Population driving adaptive scaling; the registry size when `None`
    fn population(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone)]
struct SimState {
    tick: Tick,
    limit: f64,
    used: f64,
    bucket: f64,
    bucket_max: f64,
    population: Option<usize>,
}

/// Deterministic in-process host
///
/// Work callbacks call [`SimHost::consume`] to charge compute; the driver
/// calls [`SimHost::advance`] between ticks. The bucket refills by the
/// unused part of the limit and drains by any overrun.
#[derive(Debug)]
pub struct SimHost {
    state: Mutex<SimState>,
}

impl SimHost {
    pub fn new(limit: f64, bucket_max: f64) -> Self {
        Self {
            state: Mutex::new(SimState {
                tick: 1,
                limit,
                used: 0.0,
                bucket: bucket_max,
                bucket_max,
                population: None,
            }),
        }
    }

    /// Charge compute to the current tick
    pub fn consume(&self, cost: f64) {
        self.state.lock().used += cost.max(0.0);
    }

    /// Use up the whole ceiling for the rest of this tick
    pub fn exhaust(&self) {
        let mut state = self.state.lock();
        state.used = state.used.max(state.limit);
    }

    /// Move to the next tick, settling the bucket
    pub fn advance(&self) -> Tick {
        let mut state = self.state.lock();
        let delta = state.limit - state.used;
        state.bucket = (state.bucket + delta).clamp(0.0, state.bucket_max);
        state.used = 0.0;
        state.tick += 1;
        state.tick
    }

    pub fn set_bucket(&self, bucket: f64) {
        let mut state = self.state.lock();
        state.bucket = bucket.clamp(0.0, state.bucket_max);
    }

    pub fn set_limit(&self, limit: f64) {
        self.state.lock().limit = limit.max(0.0);
    }

    pub fn set_population(&self, population: Option<usize>) {
        self.state.lock().population = population;
    }
}

impl CpuHost for SimHost {
    fn tick(&self) -> Tick {
        self.state.lock().tick
    }

    fn limit(&self) -> f64 {
        self.state.lock().limit
    }

    fn used(&self) -> f64 {
        self.state.lock().used
    }

    fn bucket(&self) -> f64 {
        self.state.lock().bucket
    }

    fn population(&self) -> Option<usize> {
        self.state.lock().population
    }
}
