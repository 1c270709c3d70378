/*!
 * Budget-Constrained Scheduler
 *
 * `Kernel` is the composition root: it owns the registry, the wrap-around
 * queue, the budget meter and adaptive calculator, and the lifecycle
 * notifier. Applications hold one instance and call `run` once per tick.
 */

use crate::budget::{AdaptiveBudgetCalculator, BudgetMeter, BudgetTable, CpuHost};
use crate::config::{ConfigCorrection, KernelConfig};
use crate::core::errors::{KernelResult, SchedulerError};
use crate::core::types::{ProcessId, Tick};
use crate::monitoring::{AtomicKernelStats, KernelStats, LifecycleEvent, LifecycleNotifier};
use crate::process::{Process, ProcessDefinition, Registry};
use std::sync::Arc;
use tracing::info;

mod control;
mod metrics;
mod operations;
mod queue;

pub use metrics::{MetricsSummary, ProcessDetail, ProcessMetric};
pub use operations::TickReport;
pub use queue::WrapQueue;

/// Cooperative, budget-constrained process scheduler
pub struct Kernel {
    config: KernelConfig,
    meter: BudgetMeter,
    budgets: AdaptiveBudgetCalculator,
    registry: Registry,
    queue: WrapQueue,
    notifier: Arc<LifecycleNotifier>,
    stats: Arc<AtomicKernelStats>,
}

impl Kernel {
    /// Create a kernel over `host`; the config is normalized first
    pub fn new(host: Arc<dyn CpuHost>, mut config: KernelConfig) -> Self {
        let corrections = config.normalize();
        info!(
            target_utilization = config.cpu.target_utilization,
            reserved_fraction = config.cpu.reserved_fraction,
            corrections = corrections.len(),
            "Kernel initialized"
        );

        Self {
            meter: BudgetMeter::new(host, &config.cpu),
            budgets: AdaptiveBudgetCalculator::new(&config),
            registry: Registry::new(),
            queue: WrapQueue::new(),
            notifier: Arc::new(LifecycleNotifier::new()),
            stats: Arc::new(AtomicKernelStats::new()),
            config,
        }
    }

    /// Create a kernel with the default configuration
    pub fn with_defaults(host: Arc<dyn CpuHost>) -> Self {
        Self::new(host, KernelConfig::default())
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Mutate the live config; takes effect from the next tick
    pub fn update_config<F>(&mut self, update: F) -> Vec<ConfigCorrection>
    where
        F: FnOnce(&mut KernelConfig),
    {
        update(&mut self.config);
        self.apply_config()
    }

    /// Replace the live config; takes effect from the next tick
    pub fn set_config(&mut self, config: KernelConfig) -> Vec<ConfigCorrection> {
        self.config = config;
        self.apply_config()
    }

    fn apply_config(&mut self) -> Vec<ConfigCorrection> {
        let corrections = self.config.normalize();
        self.meter.configure(&self.config.cpu);
        info!(corrections = corrections.len(), "Kernel config updated");
        corrections
    }

    pub fn meter(&self) -> &BudgetMeter {
        &self.meter
    }

    /// Budget table published for the most recent tick
    pub fn budget_table(&self) -> Arc<BudgetTable> {
        self.budgets.current()
    }

    /// Receive lifecycle events published from now on
    pub fn subscribe(&self) -> flume::Receiver<LifecycleEvent> {
        self.notifier.subscribe()
    }

    pub fn notifier(&self) -> &Arc<LifecycleNotifier> {
        &self.notifier
    }

    /// Snapshot of kernel-wide counters
    pub fn stats(&self) -> KernelStats {
        self.stats.snapshot()
    }

    /// Shared counters for reporting consumers
    pub fn stats_handle(&self) -> Arc<AtomicKernelStats> {
        Arc::clone(&self.stats)
    }

    /// Register a process, replacing any process with the same id
    pub fn register(&mut self, definition: ProcessDefinition) -> KernelResult<()> {
        definition.validate()?;
        let id = definition.id.clone();
        let priority = definition.priority;
        let frequency = definition.frequency;
        let replaced = self.registry.register(definition);
        info!(
            process_id = %id,
            priority = ?priority,
            frequency = ?frequency,
            replaced,
            "Process registered"
        );
        Ok(())
    }

    /// Register a startup table of processes; stops at the first invalid one
    pub fn register_all<I>(&mut self, definitions: I) -> KernelResult<usize>
    where
        I: IntoIterator<Item = ProcessDefinition>,
    {
        let mut count = 0;
        for definition in definitions {
            self.register(definition)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        let removed = self.registry.unregister(id);
        if removed {
            info!(process_id = id, "Process unregistered");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Process> {
        self.registry.get(id)
    }

    /// All registered processes, unordered
    pub fn list(&self) -> Vec<&Process> {
        self.registry.list()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Queue snapshot as of the last rebuild
    pub fn queue_order(&self) -> Vec<ProcessId> {
        self.queue.entries().to_vec()
    }

    /// Id the next tick resumes after
    pub fn last_executed(&self) -> Option<&ProcessId> {
        self.queue.last_executed()
    }

    /// Interval in effect for a process
    pub fn effective_interval(&self, process: &Process) -> Tick {
        effective_interval(&self.config, process)
    }

    /// CPU budget fraction in effect for a process under the current table
    pub fn effective_cpu_budget(&self, process: &Process) -> f64 {
        effective_cpu_budget(&self.budgets.current(), process)
    }

    /// Reserve threshold in effect for a process
    pub fn effective_min_reserve(&self, process: &Process) -> f64 {
        effective_min_reserve(&self.config, process)
    }

    fn require(&self, id: &str) -> Result<&Process, SchedulerError> {
        self.registry
            .get(id)
            .ok_or_else(|| SchedulerError::ProcessNotFound(id.to_string()))
    }
}

fn effective_interval(config: &KernelConfig, process: &Process) -> Tick {
    process
        .interval()
        .unwrap_or_else(|| config.frequencies.get(process.frequency()).interval)
}

fn effective_cpu_budget(table: &BudgetTable, process: &Process) -> f64 {
    process
        .cpu_budget()
        .unwrap_or_else(|| table.budget(process.frequency()))
}

fn effective_min_reserve(config: &KernelConfig, process: &Process) -> f64 {
    process
        .min_reserve()
        .unwrap_or_else(|| config.frequencies.get(process.frequency()).min_reserve)
}
