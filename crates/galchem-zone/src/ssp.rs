//! Per-zone stellar population tables, tabulated once at setup.
//!
//! Every table is indexed by population age in timesteps: entry `i`
//! describes a population of unit mass at age `i * dt`.

use galchem_core::{
    buffer, DelayTimeDistribution, SetupError, StellarPopulation, IA_NORMALIZATION_HORIZON,
};

use crate::config::{Recycling, ZoneConfig};

/// Tabulated stellar population bookkeeping for one zone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SspTables {
    /// Cumulative return fraction.
    pub crf: Vec<f64>,
    /// Main-sequence mass fraction.
    pub msmf: Vec<f64>,
    /// Turnoff mass in solar masses.
    pub turnoff: Vec<f64>,
    /// Normalized SN Ia rate per unit stellar mass per timestep.
    pub ia_rate: Vec<f64>,
}

impl SspTables {
    /// Tabulate `len` ages on the zone's timestep grid.
    pub fn build(config: &ZoneConfig, len: usize) -> Result<Self, SetupError> {
        let mut crf = buffer::with_capacity(len, "return fraction table")?;
        let mut msmf = buffer::with_capacity(len, "main sequence table")?;
        let mut turnoff = buffer::with_capacity(len, "turnoff table")?;
        let ia_rate = delay_kernel(
            config.ia_delay.as_ref(),
            config.ia_min_delay,
            config.dt,
            len,
            "SN Ia table",
        )?;
        let population: &dyn StellarPopulation = config.stellar_population.as_ref();
        for i in 0..len {
            let age = i as f64 * config.dt;
            crf.push(match config.recycling {
                Recycling::Continuous => population.cumulative_return_fraction(age),
                Recycling::Instantaneous(r) if i > 0 => r,
                Recycling::Instantaneous(_) => 0.0,
            });
            msmf.push(population.main_sequence_mass_fraction(age));
            turnoff.push(population.turnoff_mass(age));
        }
        Ok(Self {
            crf,
            msmf,
            turnoff,
            ia_rate,
        })
    }

    /// Number of tabulated ages.
    pub fn len(&self) -> usize {
        self.crf.len()
    }

    /// Whether the tables are empty (before setup or after release).
    pub fn is_empty(&self) -> bool {
        self.crf.is_empty()
    }
}

/// Tabulate a delayed-release kernel of `len` entries.
///
/// Entry `i` is `rate(i * dt)` for ages at or past `min_delay` and zero
/// before it; non-finite and negative rates count as zero. The kernel is
/// normalized to sum to one over the longer of the run and the
/// normalization horizon, so truncating a run does not inflate the rate.
/// A rate that vanishes everywhere gives an all-zero kernel.
pub fn delay_kernel(
    rate: &dyn DelayTimeDistribution,
    min_delay: f64,
    dt: f64,
    len: usize,
    buffer_name: &'static str,
) -> Result<Vec<f64>, SetupError> {
    let mut kernel = buffer::with_capacity(len, buffer_name)?;
    let value = |i: usize| {
        let age = i as f64 * dt;
        if age < min_delay {
            return 0.0;
        }
        let r = rate.rate(age);
        if r.is_finite() && r > 0.0 {
            r
        } else {
            0.0
        }
    };
    let horizon = (IA_NORMALIZATION_HORIZON / dt).ceil() as usize + 1;
    let total: f64 = (0..len.max(horizon)).map(value).sum();
    for i in 0..len {
        kernel.push(if total > 0.0 { value(i) / total } else { 0.0 });
    }
    Ok(kernel)
}
