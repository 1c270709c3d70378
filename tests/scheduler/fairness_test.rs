/*!
 * Wrap-Around Fairness Properties
 * Budget-limited ticks still reach every eligible process
 */

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tick_kernel::{FrequencyClass, Kernel, Priority, ProcessDefinition, SimHost, Tick};

/// Kernel where every process counts itself and the host is exhausted
/// after `per_tick` executions within one tick
fn capped_kernel(
    priorities: &[Priority],
    intervals: &[Tick],
    per_tick: usize,
) -> (Kernel, Arc<SimHost>, Arc<AtomicUsize>) {
    let host = Arc::new(SimHost::new(100.0, 10_000.0));
    let ran = Arc::new(AtomicUsize::new(0));
    let mut kernel = Kernel::with_defaults(host.clone());

    for (i, (&priority, &interval)) in priorities.iter().zip(intervals).enumerate() {
        let host = host.clone();
        let ran = ran.clone();
        let id = format!("p{}", i);
        kernel
            .register(
                ProcessDefinition::new(id.clone(), id, priority, FrequencyClass::High, move || {
                    if ran.fetch_add(1, Ordering::SeqCst) + 1 >= per_tick {
                        host.exhaust();
                    }
                    Ok(())
                })
                .with_interval(interval),
            )
            .unwrap();
    }
    (kernel, host, ran)
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_everyone_runs_within_ceil_k_over_m(
        priorities in prop::collection::vec(priority_strategy(), 1..24),
        per_tick in 1usize..6,
    ) {
        let k = priorities.len();
        let intervals = vec![1; k];
        let (mut kernel, host, ran) = capped_kernel(&priorities, &intervals, per_tick);

        let bound = (k + per_tick - 1) / per_tick;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..bound {
            ran.store(0, Ordering::SeqCst);
            let report = kernel.run();
            prop_assert!(report.executed.len() <= per_tick);
            seen.extend(report.executed.iter().map(|id| id.to_string()));
            host.advance();
        }

        prop_assert_eq!(seen.len(), k);
    }

    #[test]
    fn prop_intervals_never_starve_under_wrap_around(
        specs in prop::collection::vec((priority_strategy(), 1u64..8), 1..16),
        per_tick in 1usize..4,
    ) {
        let priorities: Vec<Priority> = specs.iter().map(|(p, _)| *p).collect();
        let intervals: Vec<Tick> = specs.iter().map(|(_, i)| *i).collect();
        let k = priorities.len();
        let (mut kernel, host, ran) = capped_kernel(&priorities, &intervals, per_tick);

        let slack = ((k + per_tick - 1) / per_tick) as Tick;
        let mut runs: HashMap<String, Vec<Tick>> = HashMap::new();
        for _ in 0..120 {
            ran.store(0, Ordering::SeqCst);
            let report = kernel.run();
            for id in &report.executed {
                runs.entry(id.to_string()).or_default().push(report.tick);
            }
            host.advance();
        }

        for (i, interval) in intervals.iter().enumerate() {
            let id = format!("p{}", i);
            let ticks = runs.get(&id).cloned().unwrap_or_default();
            prop_assert!(!ticks.is_empty(), "{} never ran", id);
            prop_assert!(ticks[0] <= slack, "{} first ran at {}", id, ticks[0]);
            for pair in ticks.windows(2) {
                let gap = pair[1] - pair[0];
                prop_assert!(gap >= *interval, "{} ran after {} < {}", id, gap, interval);
                prop_assert!(
                    gap <= interval + slack,
                    "{} waited {} ticks (interval {}, slack {})",
                    id, gap, interval, slack
                );
            }
        }
    }
}
