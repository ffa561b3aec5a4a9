//! Traits implemented by the yield and stellar-population collaborators.
//!
//! The engines never look inside a yield table or an IMF; they only ask
//! these traits for numbers. Plain closures implement each trait, so a
//! test can pass `|z: f64| 0.015` where a yield grid is expected.
//!
//! Implementations must be deterministic and must return finite values
//! for every finite query, extrapolating outside their tabulated range.

/// Net fractional yield of one element as a function of metallicity.
///
/// Used for core-collapse supernovae, Type Ia supernovae, and custom
/// enrichment channels: the returned value is the mass of the element
/// produced per unit stellar mass formed.
pub trait MetallicityYield: Send + Sync {
    /// Fractional yield at total metallicity `z`.
    fn yield_at(&self, z: f64) -> f64;
}

impl<F> MetallicityYield for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn yield_at(&self, z: f64) -> f64 {
        self(z)
    }
}

/// Fractional AGB yield of one element as a function of stellar mass
/// and metallicity.
pub trait AgbYield: Send + Sync {
    /// Fractional yield of stars of initial mass `turnoff_mass` (solar
    /// masses) at total metallicity `z`.
    fn yield_at(&self, turnoff_mass: f64, z: f64) -> f64;
}

impl<F> AgbYield for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn yield_at(&self, turnoff_mass: f64, z: f64) -> f64 {
        self(turnoff_mass, z)
    }
}

/// Bookkeeping of a simple stellar population of unit mass as it ages.
///
/// Tabulated once per zone at setup on the zone's timestep grid.
pub trait StellarPopulation: Send + Sync {
    /// Fraction of the population's initial mass returned to the ISM by
    /// age `age` (Gyr).
    fn cumulative_return_fraction(&self, age: f64) -> f64;

    /// Fraction of the population's initial mass still in main-sequence
    /// stars at age `age` (Gyr).
    fn main_sequence_mass_fraction(&self, age: f64) -> f64;

    /// Initial mass (solar masses) of stars leaving the main sequence at
    /// age `age` (Gyr). May be infinite at age zero.
    fn turnoff_mass(&self, age: f64) -> f64;
}

/// Unnormalized rate of a delayed enrichment process as a function of
/// population age.
///
/// Used for the SNe Ia delay-time distribution and for custom channel
/// rate kernels. The engine normalizes the tabulated rate itself.
pub trait DelayTimeDistribution: Send + Sync {
    /// Rate at age `age` (Gyr). Non-finite or negative values are treated
    /// as zero.
    fn rate(&self, age: f64) -> f64;
}

impl<F> DelayTimeDistribution for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn rate(&self, age: f64) -> f64 {
        self(age)
    }
}
