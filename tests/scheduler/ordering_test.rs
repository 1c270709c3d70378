/*!
 * Queue Ordering Tests
 * Priority order, registration tie-breaks, and wrap-around after exhaustion
 */

use pretty_assertions::assert_eq;
use std::sync::Arc;
use tick_kernel::{FrequencyClass, Kernel, Priority, ProcessDefinition, ProcessState, SimHost};

fn noop(id: &str, priority: Priority) -> ProcessDefinition {
    ProcessDefinition::new(id, id, priority, FrequencyClass::High, || Ok(()))
}

#[test]
fn test_unlimited_budget_runs_in_priority_order() {
    let host = Arc::new(SimHost::new(1_000.0, 10_000.0));
    let mut kernel = Kernel::with_defaults(host);
    kernel
        .register_all(vec![
            noop("idle", Priority::Idle),
            noop("medium", Priority::Medium),
            noop("critical", Priority::Critical),
            noop("low", Priority::Low),
            noop("high", Priority::High),
        ])
        .unwrap();

    let report = kernel.run();

    assert_eq!(
        report.executed_ids(),
        vec!["critical", "high", "medium", "low", "idle"]
    );
    assert_eq!(report.skipped, 0);
    assert_eq!(report.deferred, 0);
    assert!(!report.starved);
}

#[test]
fn test_equal_priority_keeps_registration_order() {
    let mut kernel = Kernel::with_defaults(Arc::new(SimHost::new(1_000.0, 10_000.0)));
    for id in ["c", "a", "b"] {
        kernel.register(noop(id, Priority::Medium)).unwrap();
    }

    let order: Vec<String> = kernel
        .run()
        .executed
        .iter()
        .map(|id| id.to_string())
        .collect();
    assert_eq!(order, vec!["c", "a", "b"]);
}

#[test]
fn test_reregistration_keeps_queue_slot() {
    let host = Arc::new(SimHost::new(1_000.0, 10_000.0));
    let mut kernel = Kernel::with_defaults(host.clone());
    kernel.register(noop("a", Priority::Medium)).unwrap();
    kernel.register(noop("b", Priority::Medium)).unwrap();
    kernel.run();

    kernel.register(noop("a", Priority::Medium)).unwrap();
    let a = kernel.get("a").unwrap();
    assert_eq!(a.stats().run_count, 0);

    host.advance();
    let report = kernel.run();
    assert_eq!(report.executed_ids(), vec!["a", "b"]);
}

#[test]
fn test_budget_exhaustion_resumes_after_last_executed() {
    let host = Arc::new(SimHost::new(100.0, 10_000.0));
    let mut kernel = Kernel::with_defaults(host.clone());

    let exhaust = host.clone();
    kernel
        .register_all(vec![
            ProcessDefinition::new("p1", "P1", Priority::Critical, FrequencyClass::High, move || {
                exhaust.exhaust();
                Ok(())
            }),
            noop("p2", Priority::Medium),
            noop("p3", Priority::Low),
        ])
        .unwrap();

    let first = kernel.run();
    assert_eq!(first.executed_ids(), vec!["p1"]);
    assert_eq!(first.deferred, 2);
    assert!(!first.starved);
    assert_eq!(kernel.last_executed().map(|id| id.as_str()), Some("p1"));

    host.advance();
    let second = kernel.run();
    assert_eq!(second.executed_ids(), vec!["p2", "p3", "p1"]);
    assert_eq!(second.deferred, 0);
}

#[test]
fn test_starvation_when_budget_already_spent() {
    let host = Arc::new(SimHost::new(100.0, 10_000.0));
    let mut kernel = Kernel::with_defaults(host.clone());
    kernel
        .register_all(vec![noop("a", Priority::High), noop("b", Priority::Low)])
        .unwrap();

    host.exhaust();
    let report = kernel.run();

    assert!(report.starved);
    assert!(report.executed.is_empty());
    assert_eq!(report.deferred, 2);
    assert_eq!(kernel.stats().starved_ticks, 1);
    assert_eq!(kernel.stats().deferrals, 2);
}

#[test]
fn test_unregister_mid_run_rebuilds_queue() {
    let host = Arc::new(SimHost::new(1_000.0, 10_000.0));
    let mut kernel = Kernel::with_defaults(host.clone());
    kernel
        .register_all(vec![
            noop("a", Priority::High),
            noop("b", Priority::Medium),
            noop("c", Priority::Low),
        ])
        .unwrap();
    kernel.run();
    let rebuilds = kernel.stats().queue_rebuilds;

    assert!(kernel.unregister("b"));
    host.advance();
    let report = kernel.run();

    assert_eq!(report.executed_ids(), vec!["a", "c"]);
    assert_eq!(kernel.stats().queue_rebuilds, rebuilds + 1);
    assert_eq!(kernel.queue_order().len(), 2);
}

#[test]
fn test_interval_spaces_out_runs() {
    let host = Arc::new(SimHost::new(1_000.0, 10_000.0));
    let mut kernel = Kernel::with_defaults(host.clone());
    kernel
        .register_all(vec![
            ProcessDefinition::new("m", "m", Priority::Medium, FrequencyClass::Medium, || Ok(())),
            noop("fast", Priority::Low).with_interval(3),
        ])
        .unwrap();

    let mut medium_runs = Vec::new();
    let mut fast_runs = Vec::new();
    for _ in 0..20 {
        let report = kernel.run();
        for id in &report.executed {
            match id.as_str() {
                "m" => medium_runs.push(report.tick),
                _ => fast_runs.push(report.tick),
            }
        }
        host.advance();
    }

    assert_eq!(medium_runs, vec![1, 6, 11, 16]);
    assert_eq!(fast_runs, vec![1, 4, 7, 10, 13, 16, 19]);
    assert_eq!(kernel.get("m").unwrap().stats().skip_count, 16);
}

#[test]
fn test_panicking_process_is_isolated() {
    let mut kernel = Kernel::with_defaults(Arc::new(SimHost::new(1_000.0, 10_000.0)));
    kernel
        .register_all(vec![
            ProcessDefinition::new("boom", "boom", Priority::High, FrequencyClass::High, || {
                panic!("exploded")
            }),
            noop("after", Priority::Low),
        ])
        .unwrap();

    let report = kernel.run();

    assert_eq!(report.executed_ids(), vec!["boom", "after"]);
    assert_eq!(report.failed, 1);
    let boom = kernel.get("boom").unwrap();
    assert_eq!(boom.state(), ProcessState::Idle);
    assert_eq!(boom.stats().last_error.as_deref(), Some("panic: exploded"));
    assert_eq!(kernel.get("after").unwrap().stats().run_count, 1);
}
