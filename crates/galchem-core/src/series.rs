//! Per-timestep driving series.
//!
//! Every time-dependent input (star formation efficiency, mass loading,
//! infall metallicity, the ISM driving series, ...) is supplied either as
//! a constant or as one sample per timestep.

/// A quantity sampled on the timestep grid.
#[derive(Clone, Debug, PartialEq)]
pub enum Series {
    /// The same value at every timestep.
    Constant(f64),
    /// One value per timestep; index `i` is the value at time `i * dt`.
    Sampled(Vec<f64>),
}

impl Series {
    /// A series holding `value` at every timestep.
    pub fn constant(value: f64) -> Self {
        Self::Constant(value)
    }

    /// Sample `f(t)` at `t = i * dt` for `i in 0..len`.
    pub fn from_fn(len: usize, dt: f64, mut f: impl FnMut(f64) -> f64) -> Self {
        Self::Sampled((0..len).map(|i| f(i as f64 * dt)).collect())
    }

    /// Wrap pre-sampled values.
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self::Sampled(values)
    }

    /// Value at timestep `i`.
    ///
    /// Sampled series hold their last value past the end; configuration
    /// validation guarantees the run never reads past it.
    pub fn value(&self, i: usize) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Sampled(values) => match values.get(i) {
                Some(v) => *v,
                None => values.last().copied().unwrap_or(f64::NAN),
            },
        }
    }

    /// Number of samples, or `None` for a constant series.
    pub fn sample_count(&self) -> Option<usize> {
        match self {
            Self::Constant(_) => None,
            Self::Sampled(values) => Some(values.len()),
        }
    }

    /// Whether the series covers timesteps `0..required`.
    pub fn covers(&self, required: usize) -> bool {
        self.sample_count().is_none_or(|n| n >= required)
    }

    /// Iterate over the samples a run of `len` timesteps would read.
    pub fn iter(&self, len: usize) -> impl Iterator<Item = f64> + '_ {
        (0..len).map(move |i| self.value(i))
    }

    /// Whether every sample the run would read satisfies `pred`.
    pub fn all(&self, len: usize, mut pred: impl FnMut(f64) -> bool) -> bool {
        match self {
            Self::Constant(v) => pred(*v),
            Self::Sampled(values) => values.iter().take(len).all(|&v| pred(v)),
        }
    }
}

impl From<f64> for Series {
    fn from(v: f64) -> Self {
        Self::Constant(v)
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Self::Sampled(values)
    }
}
