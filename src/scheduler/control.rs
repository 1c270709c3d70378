/*!
 * Process Control
 * Manual suspension, resumption, and statistics resets
 */

use super::Kernel;
use crate::core::errors::{KernelResult, SchedulerError};
use crate::core::types::{ProcessId, SuspendedUntil, SuspensionReason};
use crate::monitoring::LifecycleEvent;
use tracing::info;

impl Kernel {
    /// Suspend a process until it is manually resumed
    pub fn suspend(&mut self, id: &str) -> KernelResult<()> {
        if self.require(id)?.is_suspended() {
            return Err(SchedulerError::AlreadySuspended(id.to_string()).into());
        }

        let now = self.meter.tick();
        let Some(process) = self.registry.get_mut(id) else {
            return Err(SchedulerError::ProcessNotFound(id.to_string()).into());
        };
        process.suspend(SuspendedUntil::Forever, SuspensionReason::Manual);
        self.stats.inc_suspensions();
        info!(process_id = id, "Process suspended manually");

        self.notifier.publish(LifecycleEvent::Suspended {
            id: process.id().clone(),
            name: process.name().to_string(),
            reason: SuspensionReason::Manual,
            consecutive_errors: process.stats.consecutive_errors,
            permanent: false,
            resume_at: None,
            tick: now,
        });
        Ok(())
    }

    /// Clear any suspension, including a tripped circuit breaker
    ///
    /// The failure streak is kept, so one more failure re-evaluates the
    /// breaker immediately.
    pub fn resume(&mut self, id: &str) -> KernelResult<()> {
        if !self.require(id)?.is_suspended() {
            return Err(SchedulerError::NotSuspended(id.to_string()).into());
        }

        let now = self.meter.tick();
        let Some(process) = self.registry.get_mut(id) else {
            return Err(SchedulerError::ProcessNotFound(id.to_string()).into());
        };
        let previous_reason = process.clear_suspension();
        self.stats.inc_recoveries();
        info!(
            process_id = id,
            previous_reason = ?previous_reason,
            "Process resumed manually"
        );

        self.notifier.publish(LifecycleEvent::Recovered {
            id: process.id().clone(),
            name: process.name().to_string(),
            previous_reason,
            consecutive_errors: process.stats.consecutive_errors,
            manual: true,
            tick: now,
        });
        Ok(())
    }

    /// Resume every suspended process; returns how many were resumed
    pub fn resume_all_suspended(&mut self) -> usize {
        let suspended: Vec<ProcessId> = self
            .registry
            .iter()
            .filter(|p| p.is_suspended())
            .map(|p| p.id().clone())
            .collect();

        suspended
            .iter()
            .filter(|id| self.resume(id.as_str()).is_ok())
            .count()
    }

    /// Zero statistics for every process; suspensions stay in place
    pub fn reset_stats(&mut self) {
        for process in self.registry.iter_mut() {
            process.stats.reset();
            process.last_over_budget_warning = None;
        }
        info!(processes = self.registry.len(), "Process statistics reset");
    }

    /// Zero statistics for one process; its suspension stays in place
    pub fn reset_process_stats(&mut self, id: &str) -> KernelResult<()> {
        let process = self
            .registry
            .get_mut(id)
            .ok_or_else(|| SchedulerError::ProcessNotFound(id.to_string()))?;
        process.stats.reset();
        process.last_over_budget_warning = None;
        Ok(())
    }
}
