/*!
 * Adaptive Budget Tests
 * Population and reserve multipliers, and published table snapshots
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tick_kernel::budget::adaptive::{population_multiplier, reserve_multiplier};
use tick_kernel::budget::AdaptiveBudgetCalculator;
use tick_kernel::config::{AdaptiveConfig, ReserveConfig};
use tick_kernel::{FrequencyClass, KernelConfig};

#[test]
fn test_population_multiplier_is_logarithmic() {
    let adaptive = AdaptiveConfig::default();
    assert_eq!(population_multiplier(&adaptive, 0), 1.0);
    assert_eq!(population_multiplier(&adaptive, 1), 1.0);
    assert!((population_multiplier(&adaptive, 10) - 2.0).abs() < 1e-9);
    assert!((population_multiplier(&adaptive, 100) - 3.0).abs() < 1e-9);
    assert_eq!(population_multiplier(&adaptive, 100_000), 3.0);
}

#[test]
fn test_reserve_multiplier_boundaries() {
    let reserve = ReserveConfig::default();
    let adaptive = AdaptiveConfig::default();
    let at = |bucket: f64| reserve_multiplier(&reserve, &adaptive, bucket);

    assert_eq!(at(0.0), 0.3);
    assert_eq!(at(499.0), 0.3);
    assert_eq!(at(500.0), 0.6);
    assert_eq!(at(1_999.0), 0.6);
    assert_eq!(at(2_000.0), 1.0);
    assert_eq!(at(9_000.0), 1.0);
    assert_eq!(at(9_001.0), 1.2);
    assert_eq!(at(10_000.0), 1.2);
}

#[test]
fn test_recompute_publishes_versioned_table() {
    let config = KernelConfig::default();
    let calculator = AdaptiveBudgetCalculator::new(&config);
    let base = calculator.current();
    assert_eq!(base.version, 0);
    assert_eq!(base.budget(FrequencyClass::Medium), 0.3);

    let table = calculator.recompute(&config, 1, 1_000.0, 42);

    assert_eq!(table.version, 1);
    assert_eq!(table.tick, 42);
    assert!((table.budget(FrequencyClass::High) - 0.3).abs() < 1e-9);
    assert!((table.budget(FrequencyClass::Low) - 0.06).abs() < 1e-9);
    assert_eq!(calculator.current().version, 1);
    assert!(base.is_stale(42));
    assert!(!table.is_stale(42));
}

proptest! {
    #[test]
    fn prop_population_multiplier_bounded_and_monotone(a in 0usize..1_000_000, b in 0usize..1_000_000) {
        let adaptive = AdaptiveConfig::default();
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        let m_small = population_multiplier(&adaptive, small);
        let m_large = population_multiplier(&adaptive, large);

        prop_assert!((1.0..=adaptive.max_multiplier).contains(&m_small));
        prop_assert!((1.0..=adaptive.max_multiplier).contains(&m_large));
        prop_assert!(m_small <= m_large);
    }

    #[test]
    fn prop_reserve_multiplier_non_decreasing(a in 0.0f64..10_000.0, b in 0.0f64..10_000.0) {
        let reserve = ReserveConfig::default();
        let adaptive = AdaptiveConfig::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!(
            reserve_multiplier(&reserve, &adaptive, low)
                <= reserve_multiplier(&reserve, &adaptive, high)
        );
    }
}
