//! Per-step performance metrics for the multi-zone engine.

/// Timing data collected during a single multi-zone step.
///
/// All durations are in microseconds. The engine overwrites these fields
/// after each `advance()`; phases that the current evolution mode skips
/// stay at zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Time spent in per-zone ISM and element physics.
    pub zone_physics_us: u64,
    /// Time spent moving gas and elements between zones.
    pub gas_migration_us: u64,
    /// Time spent relocating tracer particles.
    pub tracer_migration_us: u64,
    /// Time spent injecting new tracer particles.
    pub injection_us: u64,
    /// Time spent scanning tracers for delayed enrichment.
    pub enrichment_scan_us: u64,
    /// Live tracer count after the step.
    pub tracer_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.enrichment_scan_us, 0);
        assert_eq!(m.tracer_count, 0);
    }
}
