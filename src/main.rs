/*!
 * Kernel Simulator - Main Entry Point
 *
 * Drives the scheduler against a simulated host:
 * - Config from KERNEL_CONFIG (JSON), defaults otherwise
 * - KERNEL_SIM_TICKS ticks (default 500), one every KERNEL_SIM_TICK_MS ms (default 10)
 * - Prints the final metrics summary as JSON
 */

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use tick_kernel::{
    init_tracing, FrequencyClass, Kernel, KernelConfig, LifecycleEvent, Priority,
    ProcessDefinition, ProcessFailure, SimHost,
};

/// Per-tick CPU ceiling of the simulated host
const SIM_CPU_LIMIT: f64 = 20.0;

/// Startup process table: id, name, priority, frequency, cost, always fails
const SIM_PROCESSES: &[(&str, &str, Priority, FrequencyClass, f64, bool)] = &[
    ("defense", "Tower defense", Priority::Critical, FrequencyClass::High, 2.0, false),
    ("spawner", "Spawn queue", Priority::High, FrequencyClass::High, 1.5, false),
    ("harvest", "Harvest routing", Priority::Medium, FrequencyClass::High, 4.0, false),
    ("builder", "Construction", Priority::Medium, FrequencyClass::Medium, 3.0, false),
    ("market", "Market balancing", Priority::Low, FrequencyClass::Medium, 5.0, true),
    ("planner", "Expansion planner", Priority::Low, FrequencyClass::Low, 9.0, false),
    ("visuals", "Map visuals", Priority::Idle, FrequencyClass::High, 2.5, false),
];

fn definitions(host: &Arc<SimHost>) -> Vec<ProcessDefinition> {
    SIM_PROCESSES
        .iter()
        .map(|&(id, name, priority, frequency, cost, fails)| {
            let host = Arc::clone(host);
            let mut runs: u64 = 0;
            ProcessDefinition::new(id, name, priority, frequency, move || {
                runs += 1;
                // Deterministic jitter so costs aren't flat
                let jitter = (runs % 5) as f64 * 0.1 * cost;
                host.consume(cost + jitter);
                if fails {
                    return Err(ProcessFailure::new(format!("simulated failure on run {}", runs)));
                }
                Ok(())
            })
        })
        .collect()
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Tick kernel simulator starting...");

    let config = KernelConfig::from_env()?;
    let total_ticks = env_u64("KERNEL_SIM_TICKS", 500);
    let tick_ms = env_u64("KERNEL_SIM_TICK_MS", 10).max(1);

    let host = Arc::new(SimHost::new(SIM_CPU_LIMIT, config.reserve.bucket_max));
    let mut kernel = Kernel::new(host.clone(), config);
    let registered = kernel.register_all(definitions(&host))?;
    info!(registered, total_ticks, tick_ms, "Processes registered");

    let events = kernel.subscribe();
    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut ticks_run = 0;
    while ticks_run < total_ticks {
        tokio::select! {
            _ = interval.tick() => {
                let report = kernel.run();
                for event in events.try_iter() {
                    match &event {
                        LifecycleEvent::Suspended { .. } => warn!(event = ?event, "Lifecycle event"),
                        LifecycleEvent::Recovered { .. } => info!(event = ?event, "Lifecycle event"),
                    }
                }
                if report.starved {
                    warn!(tick = report.tick, "Tick starved");
                }
                host.advance();
                ticks_run += 1;
            }
            _ = &mut shutdown => {
                info!("Received Ctrl-C, stopping simulation");
                break;
            }
        }
    }

    info!(ticks_run, "Simulation finished");
    println!("{}", serde_json::to_string_pretty(&kernel.summary())?);
    Ok(())
}
