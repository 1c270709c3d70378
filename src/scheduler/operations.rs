/*!
 * Tick Execution
 * Eligibility checks, the wrap-around walk, and isolated process execution
 */

use super::{effective_cpu_budget, effective_interval, effective_min_reserve, Kernel};
use crate::budget::BudgetTable;
use crate::core::types::{ProcessId, ProcessState, SuspendedUntil, SuspensionReason, Tick};
use crate::monitoring::{LifecycleEvent, TickSpan};
use crate::process::{escalate, health_score, Escalation};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What happened during one `run`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: Tick,
    /// Ids in execution order
    pub executed: Vec<ProcessId>,
    /// Entries visited and found ineligible
    pub skipped: u64,
    /// Entries left unvisited because the budget ran out
    pub deferred: u64,
    /// Executions that ended in failure
    pub failed: u64,
    /// Budget ran out before anything executed
    pub starved: bool,
    /// Host compute consumed during the walk
    pub cpu_used: f64,
    pub queue_len: usize,
}

impl TickReport {
    fn new(tick: Tick, queue_len: usize) -> Self {
        Self {
            tick,
            queue_len,
            ..Self::default()
        }
    }

    pub fn executed_ids(&self) -> Vec<&str> {
        self.executed.iter().map(|id| id.as_str()).collect()
    }
}

impl Kernel {
    /// Run one tick
    ///
    /// Refreshes the adaptive budgets, rebuilds the queue if membership
    /// changed, then walks the queue once from just after the last executed
    /// entry, executing eligible processes until the meter reports no budget.
    pub fn run(&mut self) -> TickReport {
        let now = self.meter.tick();
        let span = TickSpan::new(now, Duration::from_millis(self.config.warnings.slow_tick_ms));
        let _entered = span.enter();
        self.stats.inc_ticks();

        let population = self
            .meter
            .host()
            .population()
            .unwrap_or_else(|| self.registry.len());
        let table = self
            .budgets
            .recompute(&self.config, population, self.meter.bucket(), now);

        if self.registry.is_empty() {
            debug!(tick = now, "No processes registered, nothing to run");
            return TickReport::new(now, 0);
        }

        if self.queue.is_dirty(self.registry.generation()) {
            self.queue.rebuild(&self.registry);
            self.stats.inc_rebuilds();
        }

        let order = self.queue.walk_order();
        let mut report = TickReport::new(now, order.len());
        let cpu_at_start = self.meter.used();

        for (position, (index, id)) in order.iter().enumerate() {
            if !self.check_eligible(id, now, &table) {
                report.skipped += 1;
                continue;
            }

            if !self.meter.has_budget() {
                report.deferred = (order.len() - position) as u64;
                if report.executed.is_empty() {
                    report.starved = true;
                    self.stats.inc_starved();
                    warn!(
                        tick = now,
                        deferred = report.deferred,
                        used = self.meter.used(),
                        limit = self.meter.limit(),
                        "Budget exhausted before any process ran"
                    );
                }
                break;
            }

            if !self.execute(id, now, &table) {
                report.failed += 1;
            }
            self.queue.mark_executed(*index);
            report.executed.push(id.clone());
        }

        report.cpu_used = (self.meter.used() - cpu_at_start).max(0.0);
        self.stats.add_skips(report.skipped);
        self.stats.add_deferrals(report.deferred);
        span.record_counts(report.executed.len(), report.skipped, report.deferred);

        debug!(
            tick = now,
            executed = report.executed.len(),
            skipped = report.skipped,
            deferred = report.deferred,
            failed = report.failed,
            cpu_used = report.cpu_used,
            "Tick finished"
        );
        report
    }

    /// Budget-independent eligibility; expired suspensions recover here
    fn check_eligible(&mut self, id: &ProcessId, now: Tick, table: &BudgetTable) -> bool {
        let Some(process) = self.registry.get_mut(id.as_str()) else {
            return false;
        };

        if process.is_suspended() {
            let expired = process
                .stats
                .suspended_until
                .map_or(false, |until| until.expired(now));
            if !expired {
                process.stats.skip_count += 1;
                return false;
            }

            let previous_reason = process.clear_suspension();
            self.stats.inc_recoveries();
            info!(
                process_id = %id,
                consecutive_errors = process.stats.consecutive_errors,
                "Process suspension expired, resuming"
            );
            self.notifier.publish(LifecycleEvent::Recovered {
                id: id.clone(),
                name: process.name().to_string(),
                previous_reason,
                consecutive_errors: process.stats.consecutive_errors,
                manual: false,
                tick: now,
            });
        }

        if let Some(last_run) = process.stats.last_run_tick {
            if now.saturating_sub(last_run) < effective_interval(&self.config, process) {
                process.stats.skip_count += 1;
                return false;
            }
        }

        if self.config.enforce_min_reserve
            && effective_min_reserve(&self.config, process) > table.bucket
        {
            process.stats.skip_count += 1;
            return false;
        }

        true
    }

    /// Execute one process in isolation; returns false on failure
    fn execute(&mut self, id: &ProcessId, now: Tick, table: &BudgetTable) -> bool {
        let limit = self.meter.limit();
        let Some(process) = self.registry.get_mut(id.as_str()) else {
            return true;
        };

        process.state = ProcessState::Running;
        let before = self.meter.used();
        let result = process.invoke();
        let cost = (self.meter.used() - before).max(0.0);

        process.stats.record_run(now, cost);
        self.stats.inc_executions();

        let succeeded = match result {
            Ok(()) => {
                process.stats.record_success(now);
                process.state = ProcessState::Idle;
                true
            }
            Err(failure) => {
                process.state = ProcessState::Error;
                process.stats.record_failure(&failure);
                self.stats.inc_failures();
                let consecutive_errors = process.stats.consecutive_errors;
                warn!(
                    process_id = %id,
                    error = %failure,
                    consecutive_errors,
                    "Process failed"
                );

                let escalation = escalate(consecutive_errors, now, &self.config.circuit_breaker);
                match escalation {
                    Escalation::None => process.state = ProcessState::Idle,
                    Escalation::Temporary {
                        duration,
                        resume_at,
                    } => {
                        process.suspend(
                            SuspendedUntil::Tick(resume_at),
                            SuspensionReason::ConsecutiveErrors,
                        );
                        self.stats.inc_suspensions();
                        warn!(
                            process_id = %id,
                            consecutive_errors,
                            duration,
                            resume_at,
                            "Process suspended with backoff"
                        );
                        self.notifier.publish(LifecycleEvent::Suspended {
                            id: id.clone(),
                            name: process.name().to_string(),
                            reason: SuspensionReason::ConsecutiveErrors,
                            consecutive_errors,
                            permanent: false,
                            resume_at: Some(resume_at),
                            tick: now,
                        });
                    }
                    Escalation::Permanent => {
                        process.suspend(SuspendedUntil::Forever, SuspensionReason::CircuitBreaker);
                        self.stats.inc_suspensions();
                        self.stats.inc_permanent_suspensions();
                        error!(
                            process_id = %id,
                            consecutive_errors,
                            "Circuit breaker opened, process permanently suspended"
                        );
                        self.notifier.publish(LifecycleEvent::Suspended {
                            id: id.clone(),
                            name: process.name().to_string(),
                            reason: SuspensionReason::CircuitBreaker,
                            consecutive_errors,
                            permanent: true,
                            resume_at: None,
                            tick: now,
                        });
                    }
                }
                false
            }
        };

        process.stats.health_score = health_score(&process.stats, now, &self.config.health);

        let expected = effective_cpu_budget(table, process) * limit;
        if expected > 0.0 && cost / expected > self.config.warnings.over_budget_ratio {
            let cooled_down = process
                .last_over_budget_warning
                .map_or(true, |last| {
                    now.saturating_sub(last) >= self.config.warnings.cooldown_ticks
                });
            if cooled_down {
                process.last_over_budget_warning = Some(now);
                process.stats.over_budget_warnings += 1;
                self.stats.inc_over_budget();
                warn!(
                    process_id = %id,
                    cost,
                    expected,
                    ratio = cost / expected,
                    "Process exceeded its CPU budget"
                );
            }
        }

        succeeded
    }
}
