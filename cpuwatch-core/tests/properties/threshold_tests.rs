//! Property tests for threshold evaluation

use cpuwatch_core::threshold::evaluate;
use proptest::prelude::*;

proptest! {
    /// crossed is exactly the inclusive >= comparison
    #[test]
    fn crossed_matches_comparison(
        usage in 0.0f64..=100.0,
        threshold in 0.0f64..=100.0,
        emit_only_above in any::<bool>(),
    ) {
        let c = evaluate(usage, threshold, emit_only_above);
        prop_assert_eq!(c.crossed, usage >= threshold);
    }

    /// A crossing sample is always emitted regardless of policy
    #[test]
    fn crossing_always_emits(
        usage in 0.0f64..=100.0,
        emit_only_above in any::<bool>(),
    ) {
        let c = evaluate(usage, usage, emit_only_above);
        prop_assert!(c.crossed);
        prop_assert!(c.should_emit);
    }

    /// With the policy off, every sample is emitted
    #[test]
    fn policy_off_always_emits(
        usage in 0.0f64..=100.0,
        threshold in 0.0f64..=100.0,
    ) {
        prop_assert!(evaluate(usage, threshold, false).should_emit);
    }

    /// With the policy on, emission and crossing coincide
    #[test]
    fn policy_on_emits_only_crossings(
        usage in 0.0f64..=100.0,
        threshold in 0.0f64..=100.0,
    ) {
        let c = evaluate(usage, threshold, true);
        prop_assert_eq!(c.should_emit, c.crossed);
    }
}
