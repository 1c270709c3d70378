/*!
 * Process Types
 * Registration metadata, live process records and per-process statistics
 */

use crate::core::errors::{ProcessFailure, SchedulerError};
use crate::core::limits::HEALTH_MAX;
use crate::core::types::{
    FrequencyClass, Priority, ProcessId, ProcessState, SuspendedUntil, SuspensionReason, Tick,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Work callback: synchronous, returns within the call
pub type WorkFn = Box<dyn FnMut() -> Result<(), ProcessFailure> + Send>;

/// Everything needed to register a process
pub struct ProcessDefinition {
    pub id: ProcessId,
    pub name: String,
    pub priority: Priority,
    pub frequency: FrequencyClass,
    /// Overrides the frequency-class interval
    pub interval: Option<Tick>,
    /// Overrides the adaptive frequency-class budget
    pub cpu_budget: Option<f64>,
    /// Overrides the frequency-class reserve threshold
    pub min_reserve: Option<f64>,
    work: WorkFn,
}

impl ProcessDefinition {
    pub fn new<F>(
        id: impl Into<ProcessId>,
        name: impl Into<String>,
        priority: Priority,
        frequency: FrequencyClass,
        work: F,
    ) -> Self
    where
        F: FnMut() -> Result<(), ProcessFailure> + Send + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            priority,
            frequency,
            interval: None,
            cpu_budget: None,
            min_reserve: None,
            work: Box::new(work),
        }
    }

    pub fn with_interval(mut self, interval: Tick) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_cpu_budget(mut self, cpu_budget: f64) -> Self {
        self.cpu_budget = Some(cpu_budget);
        self
    }

    pub fn with_min_reserve(mut self, min_reserve: f64) -> Self {
        self.min_reserve = Some(min_reserve);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), SchedulerError> {
        if self.id.as_str().trim().is_empty() {
            return Err(SchedulerError::InvalidDefinition(
                "process id must not be empty".into(),
            ));
        }
        if let Some(budget) = self.cpu_budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(SchedulerError::InvalidDefinition(format!(
                    "{}: cpu budget {} is not a finite non-negative fraction",
                    self.id, budget
                )));
            }
        }
        if let Some(reserve) = self.min_reserve {
            if !reserve.is_finite() || reserve < 0.0 {
                return Err(SchedulerError::InvalidDefinition(format!(
                    "{}: min reserve {} is not a finite non-negative level",
                    self.id, reserve
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ProcessDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("frequency", &self.frequency)
            .field("interval", &self.interval)
            .field("cpu_budget", &self.cpu_budget)
            .field("min_reserve", &self.min_reserve)
            .finish_non_exhaustive()
    }
}

/// Cumulative per-process statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub run_count: u64,
    pub total_cpu: f64,
    pub avg_cpu: f64,
    pub max_cpu: f64,
    pub last_run_tick: Option<Tick>,
    pub skip_count: u64,
    pub error_count: u64,
    pub consecutive_errors: u32,
    pub last_success_tick: Option<Tick>,
    pub last_error: Option<String>,
    pub health_score: f64,
    pub suspended_until: Option<SuspendedUntil>,
    pub suspension_reason: Option<SuspensionReason>,
    pub over_budget_warnings: u64,
}

impl Default for ProcessStats {
    fn default() -> Self {
        Self {
            run_count: 0,
            total_cpu: 0.0,
            avg_cpu: 0.0,
            max_cpu: 0.0,
            last_run_tick: None,
            skip_count: 0,
            error_count: 0,
            consecutive_errors: 0,
            last_success_tick: None,
            last_error: None,
            health_score: HEALTH_MAX,
            suspended_until: None,
            suspension_reason: None,
            over_budget_warnings: 0,
        }
    }
}

impl ProcessStats {
    /// Account one invocation's cost
    pub(crate) fn record_run(&mut self, now: Tick, cost: f64) {
        self.run_count += 1;
        self.total_cpu += cost;
        self.avg_cpu = self.total_cpu / self.run_count as f64;
        self.max_cpu = self.max_cpu.max(cost);
        self.last_run_tick = Some(now);
    }

    pub(crate) fn record_success(&mut self, now: Tick) {
        self.consecutive_errors = 0;
        self.last_success_tick = Some(now);
    }

    pub(crate) fn record_failure(&mut self, failure: &ProcessFailure) {
        self.error_count += 1;
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        self.last_error = Some(failure.message.clone());
    }

    /// Zero every counter; the suspension fields survive
    pub(crate) fn reset(&mut self) {
        let suspended_until = self.suspended_until.take();
        let suspension_reason = self.suspension_reason.take();
        *self = Self {
            suspended_until,
            suspension_reason,
            ..Self::default()
        };
    }
}

/// A registered unit of work
pub struct Process {
    id: ProcessId,
    name: String,
    priority: Priority,
    frequency: FrequencyClass,
    interval: Option<Tick>,
    cpu_budget: Option<f64>,
    min_reserve: Option<f64>,
    /// Registration order, used to break priority ties
    pub(crate) seq: u64,
    pub(crate) state: ProcessState,
    pub(crate) stats: ProcessStats,
    pub(crate) last_over_budget_warning: Option<Tick>,
    work: WorkFn,
}

impl Process {
    pub(crate) fn from_definition(definition: ProcessDefinition, seq: u64) -> Self {
        Self {
            id: definition.id,
            name: definition.name,
            priority: definition.priority,
            frequency: definition.frequency,
            interval: definition.interval,
            cpu_budget: definition.cpu_budget,
            min_reserve: definition.min_reserve,
            seq,
            state: ProcessState::Idle,
            stats: ProcessStats::default(),
            last_over_budget_warning: None,
            work: definition.work,
        }
    }

    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn frequency(&self) -> FrequencyClass {
        self.frequency
    }

    /// Interval override, if any
    pub fn interval(&self) -> Option<Tick> {
        self.interval
    }

    /// CPU budget override, if any
    pub fn cpu_budget(&self) -> Option<f64> {
        self.cpu_budget
    }

    /// Reserve threshold override, if any
    pub fn min_reserve(&self) -> Option<f64> {
        self.min_reserve
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn stats(&self) -> &ProcessStats {
        &self.stats
    }

    pub fn is_suspended(&self) -> bool {
        self.state == ProcessState::Suspended
    }

    pub(crate) fn suspend(&mut self, until: SuspendedUntil, reason: SuspensionReason) {
        self.state = ProcessState::Suspended;
        self.stats.suspended_until = Some(until);
        self.stats.suspension_reason = Some(reason);
    }

    /// Clear suspension, returning the reason it was suspended for
    pub(crate) fn clear_suspension(&mut self) -> Option<SuspensionReason> {
        self.state = ProcessState::Idle;
        self.stats.suspended_until = None;
        self.stats.suspension_reason.take()
    }

    /// Call the work callback; a panic counts as a failure
    pub(crate) fn invoke(&mut self) -> Result<(), ProcessFailure> {
        let work = &mut self.work;
        match panic::catch_unwind(AssertUnwindSafe(|| work())) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "process panicked".to_string());
                Err(ProcessFailure::new(format!("panic: {}", message)))
            }
        }
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("frequency", &self.frequency)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
