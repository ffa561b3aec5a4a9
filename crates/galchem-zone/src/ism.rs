//! The ISM reservoir: gas mass, star formation rate, and infall rate.
//!
//! One of the three quantities is specified by the zone's [`IsmMode`];
//! the other two follow from the star formation law and the gas balance
//!
//! ```text
//! dM_gas = (infall - SFR - outflow) * dt + recycled
//! ```
//!
//! Gas mass is floored at [`GAS_MASS_FLOOR`] and both rates at zero after
//! every update. The star formation history is kept for the smoothed
//! outflow and for the delayed-source convolution.

use galchem_core::{buffer, SetupError, GAS_MASS_FLOOR, YEARS_PER_GYR};

use crate::config::{IsmMode, ZoneConfig};

/// Gas state of one zone.
#[derive(Clone, Debug, Default)]
pub struct IsmReservoir {
    gas_mass: f64,
    star_formation_rate: f64,
    infall_rate: f64,
    outflow_rate: f64,
    unretained: f64,
    history: Vec<f64>,
}

impl IsmReservoir {
    /// An empty reservoir with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the reservoir from the driving series at `t = 0`.
    ///
    /// In gas and star-formation modes the initial infall rate is NaN:
    /// no history exists to solve the balance equation against.
    pub fn setup(&mut self, config: &ZoneConfig, capacity: usize) -> Result<(), SetupError> {
        self.history = buffer::with_capacity(capacity, "star formation history")?;
        let tau = config.tau_star.value(0);
        match &config.mode {
            IsmMode::Gas(series) => {
                self.gas_mass = series.value(0);
                self.star_formation_rate = config.law.rate(self.gas_mass, tau);
                self.infall_rate = f64::NAN;
            }
            IsmMode::Infall(series) => {
                self.gas_mass = config.initial_gas;
                self.infall_rate = series.value(0);
                self.star_formation_rate = config.law.rate(self.gas_mass, tau);
            }
            IsmMode::StarFormation(series) => {
                self.star_formation_rate = series.value(0);
                self.gas_mass = config.law.gas_mass_for(self.star_formation_rate, tau);
                self.infall_rate = f64::NAN;
            }
        }
        self.unretained = 0.0;
        self.apply_floors();
        self.history.push(self.star_formation_rate);
        self.refresh_outflow(config, 0);
        Ok(())
    }

    /// Release the history buffer.
    pub fn release(&mut self) {
        *self = Self::default();
    }

    /// Advance from timestep `timestep` to `timestep + 1`.
    ///
    /// `recycled` is the gas (solar masses) returned by stellar populations
    /// over the step. The balance uses the star formation and outflow
    /// rates of the starting timestep.
    pub fn advance(&mut self, config: &ZoneConfig, timestep: usize, recycled: f64) {
        let step = config.dt * YEARS_PER_GYR;
        let next = timestep + 1;
        let tau = config.tau_star.value(next);
        let old_mass = self.gas_mass;
        let old_sfr = self.star_formation_rate;
        let outflow = self.outflow_rate;
        match &config.mode {
            IsmMode::Gas(series) => {
                self.gas_mass = series.value(next);
                self.star_formation_rate = config.law.rate(self.gas_mass, tau);
                self.infall_rate =
                    solve_infall(self.gas_mass - old_mass, old_sfr, outflow, recycled, step);
            }
            IsmMode::Infall(series) => {
                self.gas_mass += (self.infall_rate - old_sfr - outflow) * step + recycled;
                self.infall_rate = series.value(next);
                // Floor before deriving the rate so a drained reservoir
                // forms no stars.
                if self.gas_mass < GAS_MASS_FLOOR {
                    self.gas_mass = GAS_MASS_FLOOR;
                }
                self.star_formation_rate = config.law.rate(self.gas_mass, tau);
            }
            IsmMode::StarFormation(series) => {
                self.star_formation_rate = series.value(next);
                self.gas_mass = config.law.gas_mass_for(self.star_formation_rate, tau);
                self.infall_rate =
                    solve_infall(self.gas_mass - old_mass, old_sfr, outflow, recycled, step);
            }
        }
        self.apply_floors();
        self.history.push(self.star_formation_rate);
    }

    /// Recompute the outflow rate for `timestep` from the current star
    /// formation history and the ejecta the elements could not retain.
    pub fn refresh_outflow(&mut self, config: &ZoneConfig, timestep: usize) {
        let eta = config.mass_loading.value(timestep);
        let window = if config.smoothing_time < config.dt {
            1
        } else {
            (config.smoothing_time / config.dt).floor() as usize
        };
        let sfr = if window <= 1 {
            self.star_formation_rate
        } else {
            let start = self.history.len().saturating_sub(window);
            let recent = &self.history[start..];
            if recent.is_empty() {
                self.star_formation_rate
            } else {
                recent.iter().sum::<f64>() / recent.len() as f64
            }
        };
        let step = config.dt * YEARS_PER_GYR;
        self.outflow_rate = eta * sfr + self.unretained / step;
    }

    /// Record the ejecta (solar masses) not retained by the zone over the
    /// last step. Feeds the next outflow rate.
    pub fn set_unretained(&mut self, mass: f64) {
        self.unretained = mass;
    }

    fn apply_floors(&mut self) {
        // NaN passes both comparisons and is caught by the zone's finite check.
        if self.gas_mass < GAS_MASS_FLOOR {
            self.gas_mass = GAS_MASS_FLOOR;
        }
        if self.star_formation_rate < 0.0 {
            self.star_formation_rate = 0.0;
        }
        if self.infall_rate < 0.0 {
            self.infall_rate = 0.0;
        }
    }

    /// Gas mass in solar masses.
    pub fn gas_mass(&self) -> f64 {
        self.gas_mass
    }

    /// Overwrite the gas mass, clamping to the floor. Used by migration.
    pub fn set_gas_mass(&mut self, mass: f64) {
        self.gas_mass = if mass < GAS_MASS_FLOOR {
            GAS_MASS_FLOOR
        } else {
            mass
        };
    }

    /// Star formation rate in solar masses per year.
    pub fn star_formation_rate(&self) -> f64 {
        self.star_formation_rate
    }

    /// Infall rate in solar masses per year.
    pub fn infall_rate(&self) -> f64 {
        self.infall_rate
    }

    /// Outflow rate in solar masses per year.
    pub fn outflow_rate(&self) -> f64 {
        self.outflow_rate
    }

    /// Star formation rate at every past timestep.
    pub fn history(&self) -> &[f64] {
        &self.history
    }
}

/// Infall rate implied by a known change in gas mass.
fn solve_infall(delta: f64, sfr: f64, outflow: f64, recycled: f64, step: f64) -> f64 {
    (delta + step * (sfr + outflow) - recycled) / step
}
