//! Reusable configuration fixtures.
//!
//! Every zone preset uses `dt = 0.01` Gyr and a short run so integration
//! tests finish quickly. Yields are constants so expected masses can be
//! worked out by hand.

use galchem_core::{Series, StellarPopulation};
use galchem_multizone::{MigrationTable, MultiZoneConfig};
use galchem_zone::{ElementConfig, IsmMode, ZoneConfig};

/// Solar oxygen abundance by mass.
pub const SOLAR_O: f64 = 5.72e-3;
/// Solar iron abundance by mass.
pub const SOLAR_FE: f64 = 1.29e-3;
/// Solar helium abundance by mass.
pub const SOLAR_HE: f64 = 0.2703;

/// Returns a fixed fraction of each population on an exponential clock.
///
/// `crf(t) = R (1 - exp(-t / tau))`, `msmf(t) = exp(-t / tau)`, and the
/// turnoff mass falls as `1 / t`.
#[derive(Clone, Copy, Debug)]
pub struct ToyPopulation {
    pub return_fraction: f64,
    pub timescale: f64,
}

impl Default for ToyPopulation {
    fn default() -> Self {
        Self {
            return_fraction: 0.4,
            timescale: 1.0,
        }
    }
}

impl StellarPopulation for ToyPopulation {
    fn cumulative_return_fraction(&self, age: f64) -> f64 {
        if age <= 0.0 {
            return 0.0;
        }
        self.return_fraction * (1.0 - (-age / self.timescale).exp())
    }

    fn main_sequence_mass_fraction(&self, age: f64) -> f64 {
        if age <= 0.0 {
            return 1.0;
        }
        (-age / self.timescale).exp()
    }

    fn turnoff_mass(&self, age: f64) -> f64 {
        if age > 0.0 {
            1.0 / age
        } else {
            f64::INFINITY
        }
    }
}

/// Stars that never return mass or leave the main sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoStars;

impl StellarPopulation for NoStars {
    fn cumulative_return_fraction(&self, _: f64) -> f64 {
        0.0
    }

    fn main_sequence_mass_fraction(&self, _: f64) -> f64 {
        1.0
    }

    fn turnoff_mass(&self, _: f64) -> f64 {
        f64::INFINITY
    }
}

/// Oxygen from core-collapse supernovae only.
pub fn oxygen() -> ElementConfig {
    ElementConfig::new("o", SOLAR_O).with_ccsne(|_: f64| 0.015, 1.0)
}

/// Iron from core-collapse and Type Ia supernovae.
pub fn iron() -> ElementConfig {
    ElementConfig::new("fe", SOLAR_FE)
        .with_ccsne(|_: f64| 0.0012, 1.0)
        .with_sneia(|_: f64| 0.0017, 1.0)
}

/// Helium with a metallicity-independent AGB yield.
pub fn helium() -> ElementConfig {
    ElementConfig::new("he", SOLAR_HE)
        .with_ccsne(|_: f64| 0.05, 1.0)
        .with_agb(|_: f64, _: f64| 0.01, 1.0)
}

/// A zone with constant star formation of `sfr` Msun/yr, running to
/// `final_time` Gyr with outputs every 0.1 Gyr.
pub fn sfr_zone(name: &str, sfr: f64, final_time: f64) -> ZoneConfig {
    ZoneConfig::new(name, IsmMode::StarFormation(Series::constant(sfr)))
        .with_dt(0.01)
        .with_output_times(output_times(final_time))
        .with_stellar_population(ToyPopulation::default())
        .with_ia_delay(|_: f64| 1.0, 0.05)
}

/// A zone with constant infall of `ifr` Msun/yr.
pub fn infall_zone(name: &str, ifr: f64, final_time: f64) -> ZoneConfig {
    ZoneConfig::new(name, IsmMode::Infall(Series::constant(ifr)))
        .with_dt(0.01)
        .with_output_times(output_times(final_time))
        .with_stellar_population(ToyPopulation::default())
        .with_ia_delay(|_: f64| 1.0, 0.05)
}

/// An infall zone tracking oxygen, iron, and helium.
pub fn enriched_zone(name: &str, final_time: f64) -> ZoneConfig {
    infall_zone(name, 5.0, final_time)
        .with_initial_gas(1e9)
        .with_element(oxygen())
        .with_element(iron())
        .with_element(helium())
}

/// Outputs at `0, 0.1, 0.2, ...` up to and including `final_time`.
pub fn output_times(final_time: f64) -> Vec<f64> {
    let steps = (final_time / 0.1).round() as usize;
    let mut times: Vec<f64> = (0..=steps).map(|i| i as f64 * 0.1).collect();
    if let Some(last) = times.last_mut() {
        *last = final_time;
    }
    times
}

/// Two enriched zones with no migration.
pub fn two_zone_config(final_time: f64) -> MultiZoneConfig {
    MultiZoneConfig::new(
        "pair",
        vec![
            enriched_zone("inner", final_time),
            enriched_zone("outer", final_time),
        ],
    )
}

/// A table moving material from zone `from` to zone `to` with probability
/// `p` per 10 Myr, for `k` zones.
pub fn one_way(k: usize, from: usize, to: usize, p: f64) -> MigrationTable {
    MigrationTable::from_fn(k, |i, j| if i == from && j == to { p } else { 0.0 })
}

/// A symmetric table exchanging material between every pair of zones.
pub fn uniform(k: usize, p: f64) -> MigrationTable {
    MigrationTable::from_fn(k, |i, j| if i != j { p } else { 0.0 })
}
