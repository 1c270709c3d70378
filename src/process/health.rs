/*!
 * Health Monitor
 * Health scoring and circuit-breaker escalation for failing processes
 */

use super::types::ProcessStats;
use crate::config::{CircuitBreakerConfig, HealthConfig};
use crate::core::limits::{HEALTH_MAX, HEALTH_MIN};
use crate::core::types::{SuspendedUntil, Tick};

/// Outcome of evaluating a failure streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Stay eligible
    None,
    /// Back off until `resume_at`
    Temporary { duration: Tick, resume_at: Tick },
    /// Open the breaker for good
    Permanent,
}

impl Escalation {
    pub fn suspended_until(self) -> Option<SuspendedUntil> {
        match self {
            Escalation::None => None,
            Escalation::Temporary { resume_at, .. } => Some(SuspendedUntil::Tick(resume_at)),
            Escalation::Permanent => Some(SuspendedUntil::Forever),
        }
    }
}

/// Backoff length for a streak: `min(max_backoff, base ^ consecutive_errors)`
pub fn backoff_ticks(consecutive_errors: u32, breaker: &CircuitBreakerConfig) -> Tick {
    breaker
        .backoff_base
        .checked_pow(consecutive_errors)
        .map_or(breaker.max_backoff, |ticks| ticks.min(breaker.max_backoff))
}

/// Decide what a streak of `consecutive_errors` failures means at `now`
pub fn escalate(consecutive_errors: u32, now: Tick, breaker: &CircuitBreakerConfig) -> Escalation {
    if consecutive_errors >= breaker.permanent_after {
        Escalation::Permanent
    } else if consecutive_errors >= breaker.suspend_after {
        let duration = backoff_ticks(consecutive_errors, breaker);
        Escalation::Temporary {
            duration,
            resume_at: now.saturating_add(duration),
        }
    } else {
        Escalation::None
    }
}

/// Health score in `[0, 100]`
///
/// Success rate, plus a bonus for a recent success, minus a penalty per
/// current consecutive error. A process that never ran scores 100.
pub fn health_score(stats: &ProcessStats, now: Tick, health: &HealthConfig) -> f64 {
    if stats.run_count == 0 {
        return HEALTH_MAX;
    }

    let successes = stats.run_count.saturating_sub(stats.error_count);
    let mut score = HEALTH_MAX * successes as f64 / stats.run_count as f64;

    if let Some(last_success) = stats.last_success_tick {
        if now.saturating_sub(last_success) < health.recent_window {
            score += health.recent_bonus;
        }
    }

    score -= health.error_penalty * f64::from(stats.consecutive_errors);
    score.clamp(HEALTH_MIN, HEALTH_MAX)
}
