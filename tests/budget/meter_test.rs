/*!
 * Budget Meter Tests
 * Meter arithmetic and kernel behavior against a mocked host
 */

use mockall::mock;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tick_kernel::config::CpuConfig;
use tick_kernel::{
    BudgetMeter, CpuHost, FrequencyClass, Kernel, Priority, ProcessDefinition, Tick,
};

mock! {
    pub Host {}

    impl CpuHost for Host {
        fn tick(&self) -> Tick;
        fn limit(&self) -> f64;
        fn used(&self) -> f64;
        fn bucket(&self) -> f64;
        fn population(&self) -> Option<usize>;
    }
}

fn host(limit: f64, used: f64, bucket: f64) -> MockHost {
    let mut host = MockHost::new();
    host.expect_tick().returning(|| 7);
    host.expect_limit().returning(move || limit);
    host.expect_used().returning(move || used);
    host.expect_bucket().returning(move || bucket);
    host.expect_population().returning(|| None);
    host
}

#[test]
fn test_remaining_subtracts_reserve_margin() {
    let meter = BudgetMeter::new(Arc::new(host(100.0, 50.0, 8_000.0)), &CpuConfig::default());

    assert!((meter.limit() - 98.0).abs() < 1e-9);
    assert!((meter.reserve_margin() - 4.9).abs() < 1e-9);
    assert!((meter.remaining() - 43.1).abs() < 1e-9);
    assert!(meter.has_budget());
    assert_eq!(meter.bucket(), 8_000.0);
    assert_eq!(meter.tick(), 7);
}

#[test]
fn test_no_budget_inside_reserve_margin() {
    let meter = BudgetMeter::new(Arc::new(host(100.0, 94.0, 8_000.0)), &CpuConfig::default());

    assert_eq!(meter.remaining(), 0.0);
    assert!(!meter.has_budget());
}

#[test]
fn test_overrun_clamps_to_zero() {
    let meter = BudgetMeter::new(Arc::new(host(100.0, 250.0, 0.0)), &CpuConfig::default());
    assert_eq!(meter.remaining(), 0.0);
}

#[test]
fn test_reconfigure_changes_limit() {
    let mut meter = BudgetMeter::new(Arc::new(host(100.0, 0.0, 0.0)), &CpuConfig::default());
    meter.configure(&CpuConfig {
        target_utilization: 0.5,
        reserved_fraction: 0.0,
    });

    assert_eq!(meter.limit(), 50.0);
    assert_eq!(meter.remaining(), 50.0);
}

#[test]
fn test_kernel_starves_on_exhausted_host() {
    let mut kernel = Kernel::with_defaults(Arc::new(host(100.0, 100.0, 5_000.0)));
    kernel
        .register(ProcessDefinition::new(
            "a",
            "a",
            Priority::Critical,
            FrequencyClass::High,
            || Ok(()),
        ))
        .unwrap();

    let report = kernel.run();

    assert_eq!(report.tick, 7);
    assert!(report.starved);
    assert_eq!(report.deferred, 1);
    assert_eq!(kernel.get("a").unwrap().stats().run_count, 0);
}

#[test]
fn test_population_hint_overrides_registry_size() {
    let mut mocked = MockHost::new();
    mocked.expect_tick().returning(|| 1);
    mocked.expect_limit().returning(|| 100.0);
    mocked.expect_used().returning(|| 0.0);
    mocked.expect_bucket().returning(|| 5_000.0);
    mocked.expect_population().times(1).returning(|| Some(10));

    let mut kernel = Kernel::with_defaults(Arc::new(mocked));
    kernel.run();

    let table = kernel.budget_table();
    assert_eq!(table.population, 10);
    assert!((table.population_multiplier - 2.0).abs() < 1e-9);
    assert!((table.budget(FrequencyClass::High) - 1.0).abs() < 1e-9);
}
