//! Composite Simpson integration with an explicit context.
//!
//! Integrands receive their parameters through a borrowed context value
//! rather than through shared mutable state, so several integrations can
//! run with different parameters without interfering.

/// Convergence controls for [`simpson`].
#[derive(Clone, Debug, PartialEq)]
pub struct QuadratureSettings {
    /// Relative change between successive refinements at which the
    /// integral is accepted. Default: 1e-6.
    pub tolerance: f64,
    /// Number of intervals in the first pass. Rounded up to even. Default: 64.
    pub min_intervals: usize,
    /// Refinement stops once the interval count would exceed this. Default: 2^20.
    pub max_intervals: usize,
}

impl Default for QuadratureSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            min_intervals: 64,
            max_intervals: 1 << 20,
        }
    }
}

/// Result of a [`simpson`] integration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quadrature {
    /// Estimated integral.
    pub value: f64,
    /// Absolute difference from the previous refinement.
    pub error: f64,
    /// Intervals used for the final estimate.
    pub intervals: usize,
    /// Whether the tolerance was met before `max_intervals`.
    pub converged: bool,
}

fn simpson_pass<C: ?Sized>(
    integrand: &impl Fn(f64, &C) -> f64,
    context: &C,
    lower: f64,
    upper: f64,
    n: usize,
) -> f64 {
    let h = (upper - lower) / n as f64;
    let mut sum = integrand(lower, context) + integrand(upper, context);
    for i in 1..n {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * integrand(lower + i as f64 * h, context);
    }
    sum * h / 3.0
}

/// Integrate `integrand(x, context)` over `[lower, upper]`.
///
/// The interval count doubles until two successive estimates agree to
/// within `settings.tolerance` (relative), or until the count would exceed
/// `settings.max_intervals`. An empty interval integrates to zero.
pub fn simpson<C: ?Sized>(
    integrand: impl Fn(f64, &C) -> f64,
    context: &C,
    lower: f64,
    upper: f64,
    settings: &QuadratureSettings,
) -> Quadrature {
    if lower == upper {
        return Quadrature {
            value: 0.0,
            error: 0.0,
            intervals: 0,
            converged: true,
        };
    }
    let mut n = settings.min_intervals.max(2);
    n += n % 2;
    let mut previous = simpson_pass(&integrand, context, lower, upper, n);
    loop {
        let next_n = n * 2;
        if next_n > settings.max_intervals {
            return Quadrature {
                value: previous,
                error: f64::NAN,
                intervals: n,
                converged: false,
            };
        }
        let current = simpson_pass(&integrand, context, lower, upper, next_n);
        let error = (current - previous).abs();
        if error <= settings.tolerance * current.abs() || (current == 0.0 && previous == 0.0) {
            return Quadrature {
                value: current,
                error,
                intervals: next_n,
                converged: true,
            };
        }
        previous = current;
        n = next_n;
    }
}
