/*!
 * Circuit Breaker Tests
 * Backoff escalation, automatic recovery, and permanent suspension
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use tick_kernel::process::health_score;
use tick_kernel::{
    FrequencyClass, Kernel, KernelConfig, LifecycleEvent, Priority, ProcessDefinition,
    ProcessState, ProcessStats, SimHost, SuspendedUntil, SuspensionReason, Tick,
};

fn failing() -> ProcessDefinition {
    ProcessDefinition::new("flaky", "Flaky", Priority::Medium, FrequencyClass::High, || {
        Err("always broken".into())
    })
}

fn healthy() -> ProcessDefinition {
    ProcessDefinition::new("steady", "Steady", Priority::Low, FrequencyClass::High, || Ok(()))
}

#[test]
fn test_backoff_schedule_then_permanent() {
    let host = Arc::new(SimHost::new(100.0, 10_000.0));
    let mut kernel = Kernel::with_defaults(host.clone());
    kernel.register_all(vec![failing(), healthy()]).unwrap();
    let events = kernel.subscribe();

    let mut failure_ticks = Vec::new();
    for _ in 0..1_100 {
        let report = kernel.run();
        if report.executed_ids().contains(&"flaky") {
            failure_ticks.push(report.tick);
        }
        assert!(report.executed_ids().contains(&"steady"));
        host.advance();
    }

    assert_eq!(
        failure_ticks,
        vec![1, 2, 3, 11, 27, 59, 123, 251, 507, 1019]
    );

    let received: Vec<LifecycleEvent> = events.try_iter().collect();
    let resume_ticks: Vec<Tick> = received
        .iter()
        .filter_map(|event| match event {
            LifecycleEvent::Suspended {
                resume_at: Some(at),
                permanent: false,
                ..
            } => Some(*at),
            _ => None,
        })
        .collect();
    assert_eq!(resume_ticks, vec![11, 27, 59, 123, 251, 507, 1019]);

    let recoveries = received
        .iter()
        .filter(|event| matches!(event, LifecycleEvent::Recovered { manual: false, .. }))
        .count();
    assert_eq!(recoveries, 7);

    let permanent: Vec<&LifecycleEvent> = received
        .iter()
        .filter(|event| event.is_permanent_suspension())
        .collect();
    assert_eq!(permanent.len(), 1);
    match permanent[0] {
        LifecycleEvent::Suspended {
            reason,
            consecutive_errors,
            tick,
            ..
        } => {
            assert_eq!(*reason, SuspensionReason::CircuitBreaker);
            assert_eq!(*consecutive_errors, 10);
            assert_eq!(*tick, 1019);
        }
        other => panic!("unexpected event {:?}", other),
    }

    let flaky = kernel.get("flaky").unwrap();
    assert_eq!(flaky.state(), ProcessState::Suspended);
    assert_eq!(flaky.stats().suspended_until, Some(SuspendedUntil::Forever));
    assert_eq!(flaky.stats().consecutive_errors, 10);
    assert_eq!(flaky.stats().run_count, 10);
    assert_eq!(flaky.stats().health_score, 0.0);

    let stats = kernel.stats();
    assert_eq!(stats.permanent_suspensions, 1);
    assert_eq!(stats.suspensions, 8);
    assert_eq!(stats.recoveries, 7);
    assert_eq!(stats.failures, 10);
}

#[test]
fn test_success_resets_streak() {
    let host = Arc::new(SimHost::new(100.0, 10_000.0));
    let mut kernel = Kernel::with_defaults(host.clone());
    let mut calls = 0u32;
    kernel
        .register(ProcessDefinition::new(
            "sometimes",
            "Sometimes",
            Priority::High,
            FrequencyClass::High,
            move || {
                calls += 1;
                if calls % 3 == 0 {
                    Ok(())
                } else {
                    Err(format!("call {} failed", calls).into())
                }
            },
        ))
        .unwrap();

    for _ in 0..30 {
        kernel.run();
        host.advance();
    }

    let process = kernel.get("sometimes").unwrap();
    assert_eq!(process.stats().run_count, 30);
    assert_eq!(process.stats().error_count, 20);
    assert!(process.stats().consecutive_errors < 3);
    assert_eq!(kernel.stats().suspensions, 0);
}

#[test]
fn test_manual_resume_keeps_streak() {
    let host = Arc::new(SimHost::new(100.0, 10_000.0));
    let mut kernel = Kernel::with_defaults(host.clone());
    kernel.register(failing()).unwrap();

    for _ in 0..3 {
        kernel.run();
        host.advance();
    }
    assert!(kernel.get("flaky").unwrap().is_suspended());

    kernel.resume("flaky").unwrap();
    let report = kernel.run();
    assert_eq!(report.executed_ids(), vec!["flaky"]);

    let flaky = kernel.get("flaky").unwrap();
    assert_eq!(flaky.stats().consecutive_errors, 4);
    assert_eq!(
        flaky.stats().suspended_until,
        Some(SuspendedUntil::Tick(report.tick + 16))
    );
}

#[test]
fn test_custom_breaker_thresholds() {
    let host = Arc::new(SimHost::new(100.0, 10_000.0));
    let mut config = KernelConfig::new();
    config.circuit_breaker.suspend_after = 1;
    config.circuit_breaker.permanent_after = 2;
    let mut kernel = Kernel::new(host.clone(), config);
    kernel.register(failing()).unwrap();

    kernel.run();
    let flaky = kernel.get("flaky").unwrap();
    assert_eq!(flaky.stats().suspended_until, Some(SuspendedUntil::Tick(3)));

    host.advance();
    host.advance();
    kernel.run();
    let flaky = kernel.get("flaky").unwrap();
    assert_eq!(flaky.stats().suspended_until, Some(SuspendedUntil::Forever));
    assert_eq!(
        flaky.stats().suspension_reason,
        Some(SuspensionReason::CircuitBreaker)
    );
}

proptest! {
    #[test]
    fn prop_health_score_is_bounded(
        run_count in 0u64..10_000,
        error_share in 0.0f64..=1.0,
        consecutive in 0u32..50,
        since_success in prop::option::of(0u64..500),
        now in 500u64..5_000,
    ) {
        let error_count = (run_count as f64 * error_share) as u64;
        let stats = ProcessStats {
            run_count,
            error_count,
            consecutive_errors: consecutive,
            last_success_tick: since_success.map(|ago| now - ago),
            ..ProcessStats::default()
        };

        let score = health_score(&stats, now, &KernelConfig::default().health);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn prop_health_stays_bounded_while_running(outcomes in prop::collection::vec(any::<bool>(), 1..80)) {
        let host = Arc::new(SimHost::new(100.0, 10_000.0));
        let mut kernel = Kernel::with_defaults(host.clone());
        let script = outcomes.clone();
        let mut step = 0usize;
        kernel
            .register(ProcessDefinition::new("scripted", "Scripted", Priority::High, FrequencyClass::High, move || {
                let ok = script[step % script.len()];
                step += 1;
                if ok { Ok(()) } else { Err("scripted failure".into()) }
            }))
            .unwrap();

        for _ in 0..outcomes.len() {
            kernel.run();
            let score = kernel.get("scripted").unwrap().stats().health_score;
            prop_assert!((0.0..=100.0).contains(&score), "score {}", score);
            host.advance();
        }
    }
}
