//! Simple stellar population bookkeeping.
//!
//! [`SspModel`] answers the three questions the engines ask of a stellar
//! population of unit mass: how much of it has been returned to the ISM,
//! how much is still on the main sequence, and which stellar mass is
//! leaving the main sequence at a given age.

use galchem_core::StellarPopulation;

use crate::imf::Imf;
use crate::quadrature::{simpson, QuadratureSettings};

/// Main-sequence lifetime of a solar-mass star, in Gyr.
const SOLAR_LIFETIME: f64 = 10.0;

/// Stars above this initial mass leave neutron-star remnants.
const WHITE_DWARF_LIMIT: f64 = 8.0;

/// Remnant mass of stars above the white dwarf limit.
const NEUTRON_STAR_MASS: f64 = 1.44;

/// A simple stellar population drawn from an IMF.
///
/// Lifetimes follow `tau(m) = 10 Gyr * m^-exponent * (1 + post_ms)`.
/// Remnant masses follow the Kalirai et al. (2008) initial-final mass
/// relation below 8 solar masses and are 1.44 solar masses above it.
#[derive(Clone, Debug)]
pub struct SspModel {
    imf: Imf,
    lower_mass: f64,
    upper_mass: f64,
    post_main_sequence: f64,
    lifetime_exponent: f64,
    settings: QuadratureSettings,
    total_mass: f64,
}

impl SspModel {
    /// A population from `imf` over 0.08 to 100 solar masses, with a 10%
    /// post-main-sequence lifetime and a lifetime exponent of 3.5.
    pub fn new(imf: Imf) -> Self {
        let mut ssp = Self {
            imf,
            lower_mass: 0.08,
            upper_mass: 100.0,
            post_main_sequence: 0.1,
            lifetime_exponent: 3.5,
            settings: QuadratureSettings::default(),
            total_mass: 1.0,
        };
        ssp.total_mass = ssp.integrate(mass_integrand, ssp.lower_mass, ssp.upper_mass);
        ssp
    }

    /// Replace the stellar mass range.
    pub fn with_mass_range(mut self, lower: f64, upper: f64) -> Self {
        self.lower_mass = lower;
        self.upper_mass = upper;
        self.total_mass = self.integrate(mass_integrand, lower, upper);
        self
    }

    /// Replace the post-main-sequence lifetime fraction.
    pub fn with_post_main_sequence(mut self, fraction: f64) -> Self {
        self.post_main_sequence = fraction;
        self
    }

    /// Replace the quadrature settings used by every table lookup.
    pub fn with_quadrature(mut self, settings: QuadratureSettings) -> Self {
        self.settings = settings;
        self.total_mass = self.integrate(mass_integrand, self.lower_mass, self.upper_mass);
        self
    }

    /// The population's IMF.
    pub fn imf(&self) -> Imf {
        self.imf
    }

    /// Total lifetime of a star of initial mass `m`, in Gyr.
    pub fn lifetime(&self, m: f64) -> f64 {
        SOLAR_LIFETIME * m.powf(-self.lifetime_exponent) * (1.0 + self.post_main_sequence)
    }

    /// Remnant mass left by a star of initial mass `m`.
    pub fn remnant_mass(m: f64) -> f64 {
        if m < WHITE_DWARF_LIMIT {
            0.394 + 0.109 * m
        } else {
            NEUTRON_STAR_MASS
        }
    }

    /// Integrate `f(m, self)` over `[lo, hi]` in `ln m`.
    ///
    /// IMF integrands are power laws, which are smooth in `ln m` and
    /// converge in few refinements.
    fn integrate(&self, f: fn(f64, &SspModel) -> f64, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return 0.0;
        }
        simpson(
            |u, ssp: &SspModel| {
                let m = u.exp();
                f(m, ssp) * m
            },
            self,
            lo.ln(),
            hi.ln(),
            &self.settings,
        )
        .value
    }
}

fn mass_integrand(m: f64, ssp: &SspModel) -> f64 {
    ssp.imf.mass_weighted(m)
}

fn ejecta_integrand(m: f64, ssp: &SspModel) -> f64 {
    (m - SspModel::remnant_mass(m)) * ssp.imf.dn_dm(m)
}

impl StellarPopulation for SspModel {
    fn cumulative_return_fraction(&self, age: f64) -> f64 {
        let turnoff = self.turnoff_mass(age);
        if turnoff >= self.upper_mass {
            return 0.0;
        }
        let lo = turnoff.max(self.lower_mass);
        // The remnant relation is discontinuous at the white dwarf limit.
        let returned = if lo < WHITE_DWARF_LIMIT && self.upper_mass > WHITE_DWARF_LIMIT {
            self.integrate(ejecta_integrand, lo, WHITE_DWARF_LIMIT)
                + self.integrate(ejecta_integrand, WHITE_DWARF_LIMIT, self.upper_mass)
        } else {
            self.integrate(ejecta_integrand, lo, self.upper_mass)
        };
        returned / self.total_mass
    }

    fn main_sequence_mass_fraction(&self, age: f64) -> f64 {
        let hi = self.turnoff_mass(age).min(self.upper_mass);
        self.integrate(mass_integrand, self.lower_mass, hi) / self.total_mass
    }

    fn turnoff_mass(&self, age: f64) -> f64 {
        if age <= 0.0 {
            return f64::INFINITY;
        }
        let scale = SOLAR_LIFETIME * (1.0 + self.post_main_sequence);
        (age / scale).powf(-1.0 / self.lifetime_exponent)
    }
}
