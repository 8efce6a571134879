//! Threshold evaluation for CPU usage readings
//!
//! Pure decision logic with no I/O: given a usage percent, a threshold,
//! and the emission policy, decide whether the threshold was crossed and
//! whether a sample event should be emitted.

/// Outcome of comparing a usage value to the configured threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    /// True when usage reached or exceeded the threshold (inclusive)
    pub crossed: bool,
    /// True when a sample event should be emitted under the current policy
    pub should_emit: bool,
}

/// Evaluates a usage percent against the threshold.
///
/// The comparison is inclusive: `usage == threshold` counts as crossed.
/// With `emit_only_above` unset every sample is emitted; with it set only
/// crossing samples are. Error visibility is not governed by this policy.
#[must_use]
pub fn evaluate(usage: f64, threshold: f64, emit_only_above: bool) -> Crossing {
    let crossed = usage >= threshold;
    Crossing {
        crossed,
        should_emit: !emit_only_above || crossed,
    }
}
