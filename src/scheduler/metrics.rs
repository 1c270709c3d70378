/*!
 * Scheduler Metrics
 * Aggregate summary and per-process detail for diagnostics tooling
 */

use super::{effective_cpu_budget, effective_interval, effective_min_reserve, Kernel};
use crate::core::limits::DEFAULT_TOP_N;
use crate::core::types::{FrequencyClass, Priority, ProcessId, ProcessState, Tick};
use crate::monitoring::KernelStats;
use crate::process::{Process, ProcessStats};
use serde::Serialize;
use std::cmp::Ordering;

/// One process in a ranked list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessMetric {
    pub id: ProcessId,
    pub name: String,
    pub value: f64,
}

/// Aggregate view over all processes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub tick: Tick,
    pub total_processes: usize,
    pub active_processes: usize,
    pub suspended_processes: usize,
    pub total_cpu: f64,
    pub avg_cpu_per_process: f64,
    pub avg_health: f64,
    /// Highest cumulative CPU first
    pub top_cpu: Vec<ProcessMetric>,
    /// Lowest health score first
    pub lowest_health: Vec<ProcessMetric>,
    pub kernel: KernelStats,
}

/// Everything known about one process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessDetail {
    pub id: ProcessId,
    pub name: String,
    pub priority: Priority,
    pub frequency: FrequencyClass,
    pub state: ProcessState,
    pub interval: Tick,
    pub cpu_budget: f64,
    pub min_reserve: f64,
    pub stats: ProcessStats,
}

impl Kernel {
    /// Summary with the default list length
    pub fn summary(&self) -> MetricsSummary {
        self.summary_top(DEFAULT_TOP_N)
    }

    /// Summary with `n` entries in the ranked lists
    pub fn summary_top(&self, n: usize) -> MetricsSummary {
        let processes: Vec<&Process> = self.registry.iter().collect();
        let total = processes.len();
        let suspended = processes.iter().filter(|p| p.is_suspended()).count();
        let total_cpu: f64 = processes.iter().map(|p| p.stats().total_cpu).sum();
        let total_health: f64 = processes.iter().map(|p| p.stats().health_score).sum();
        let (avg_cpu_per_process, avg_health) = if total == 0 {
            (0.0, 0.0)
        } else {
            (total_cpu / total as f64, total_health / total as f64)
        };

        MetricsSummary {
            tick: self.meter.tick(),
            total_processes: total,
            active_processes: total - suspended,
            suspended_processes: suspended,
            total_cpu,
            avg_cpu_per_process,
            avg_health,
            top_cpu: ranked(&processes, n, |p| p.stats().total_cpu, true),
            lowest_health: ranked(&processes, n, |p| p.stats().health_score, false),
            kernel: self.stats.snapshot(),
        }
    }

    pub fn process_detail(&self, id: &str) -> Option<ProcessDetail> {
        self.registry.get(id).map(|p| self.detail(p))
    }

    /// Detail for every process, highest priority first
    pub fn process_details(&self) -> Vec<ProcessDetail> {
        let mut details: Vec<ProcessDetail> =
            self.registry.iter().map(|p| self.detail(p)).collect();
        details.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        details
    }

    fn detail(&self, process: &Process) -> ProcessDetail {
        let table = self.budgets.current();
        ProcessDetail {
            id: process.id().clone(),
            name: process.name().to_string(),
            priority: process.priority(),
            frequency: process.frequency(),
            state: process.state(),
            interval: effective_interval(&self.config, process),
            cpu_budget: effective_cpu_budget(&table, process),
            min_reserve: effective_min_reserve(&self.config, process),
            stats: process.stats().clone(),
        }
    }
}

fn ranked<F>(processes: &[&Process], n: usize, value: F, descending: bool) -> Vec<ProcessMetric>
where
    F: Fn(&Process) -> f64,
{
    let mut metrics: Vec<ProcessMetric> = processes
        .iter()
        .map(|p| ProcessMetric {
            id: p.id().clone(),
            name: p.name().to_string(),
            value: value(*p),
        })
        .collect();

    metrics.sort_by(|a, b| {
        let by_value = if descending {
            b.value.total_cmp(&a.value)
        } else {
            a.value.total_cmp(&b.value)
        };
        match by_value {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        }
    });
    metrics.truncate(n);
    metrics
}
