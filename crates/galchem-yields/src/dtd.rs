//! SNe Ia delay-time distributions.

use galchem_core::DelayTimeDistribution;

/// Analytic SNe Ia delay-time distribution, unnormalized.
///
/// The engine applies the minimum delay and the normalization when it
/// tabulates the rate, so these forms only describe the shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IaDelay {
    /// `R(t) ∝ t^slope`. The conventional slope is -1.1.
    PowerLaw {
        /// Power-law index.
        slope: f64,
    },
    /// `R(t) ∝ exp(-t / timescale)`, timescale in Gyr.
    Exponential {
        /// e-folding timescale in Gyr.
        timescale: f64,
    },
}

impl Default for IaDelay {
    fn default() -> Self {
        Self::PowerLaw { slope: -1.1 }
    }
}

impl DelayTimeDistribution for IaDelay {
    fn rate(&self, age: f64) -> f64 {
        if age.is_nan() || age <= 0.0 {
            return 0.0;
        }
        match *self {
            Self::PowerLaw { slope } => age.powf(slope),
            Self::Exponential { timescale } => (-age / timescale).exp(),
        }
    }
}
