//! The element reservoir: one element's ISM mass and metallicity history.
//!
//! Each step the element gains its retained share of prompt (CCSN) and
//! delayed (SN Ia, AGB, channel) production plus the element carried by
//! recycled gas, and loses mass to star formation and outflow in
//! proportion to its abundance. The mass is floored at zero afterwards.

use galchem_core::{buffer, SetupError};

use crate::channel::Channel;
use crate::config::ElementConfig;
use crate::delayed::DelayedElementYields;

/// Zone state shared by every element update in one step.
///
/// Rates and masses are those of the starting timestep.
#[derive(Clone, Copy, Debug)]
pub struct StepContext {
    /// Step length in years.
    pub step: f64,
    /// Star formation rate, solar masses per year.
    pub star_formation_rate: f64,
    /// Gas mass, solar masses.
    pub gas_mass: f64,
    /// Outflow rate, solar masses per year.
    pub outflow_rate: f64,
    /// Outflow enhancement factor.
    pub enhancement: f64,
    /// Total metallicity passed to the yield functions.
    pub metallicity: f64,
}

/// ISM state of one element in one zone.
#[derive(Clone, Debug)]
pub struct ElementReservoir {
    symbol: String,
    solar_abundance: f64,
    primordial: bool,
    mass: f64,
    history: Vec<f64>,
    channels: Vec<Channel>,
}

impl ElementReservoir {
    /// An empty reservoir for `config`.
    pub fn new(config: &ElementConfig, primordial: bool) -> Self {
        Self {
            symbol: config.symbol.clone(),
            solar_abundance: config.solar_abundance,
            primordial,
            mass: 0.0,
            history: Vec::new(),
            channels: Vec::new(),
        }
    }

    /// Allocate the metallicity history and tabulate channel kernels.
    ///
    /// Resets the mass to zero: zones start metal-free.
    pub fn setup(
        &mut self,
        config: &ElementConfig,
        dt: f64,
        capacity: usize,
    ) -> Result<(), SetupError> {
        self.history = buffer::with_capacity(capacity, "metallicity history")?;
        self.channels = buffer::with_capacity(config.channels.len(), "channels")?;
        for channel in &config.channels {
            self.channels.push(Channel::build(channel, dt, capacity)?);
        }
        self.mass = 0.0;
        Ok(())
    }

    /// Release every timestep buffer.
    pub fn release(&mut self) {
        self.history = Vec::new();
        self.channels = Vec::new();
        self.mass = 0.0;
    }

    /// Add the element carried by infalling gas over one step.
    ///
    /// An undefined infall rate (the first step of gas- and
    /// star-formation-driven runs) carries nothing.
    pub fn enrich_from_infall(
        &mut self,
        config: &ElementConfig,
        infall_rate: f64,
        step: f64,
        timestep: usize,
    ) {
        if infall_rate.is_finite() {
            self.mass += infall_rate * step * config.infall_metallicity.value(timestep);
        }
    }

    /// Apply one step of production and loss.
    ///
    /// Every term is computed from the mass at the start of the step.
    /// Returns the mass produced but not retained by the zone, which feeds
    /// the next outflow rate.
    pub fn update(
        &mut self,
        config: &ElementConfig,
        ctx: &StepContext,
        delayed: &DelayedElementYields,
    ) -> f64 {
        let m0 = self.mass;
        let ccsne =
            config.ccsne.yield_fn.yield_at(ctx.metallicity) * ctx.star_formation_rate * ctx.step;

        let mut retained = config.ccsne.entrainment * ccsne
            + config.sneia.entrainment * delayed.sneia
            + config.agb.entrainment * delayed.agb;
        let mut unretained = (1.0 - config.ccsne.entrainment) * ccsne
            + (1.0 - config.sneia.entrainment) * delayed.sneia
            + (1.0 - config.agb.entrainment) * delayed.agb;
        for (channel, &produced) in self.channels.iter().zip(&delayed.channels) {
            retained += channel.entrainment() * produced;
            unretained += (1.0 - channel.entrainment()) * produced;
        }

        let abundance = m0 / ctx.gas_mass;
        let enhancement = if self.primordial { 1.0 } else { ctx.enhancement };
        let star_formation = ctx.star_formation_rate * ctx.step * abundance;
        let outflow = enhancement * ctx.outflow_rate * ctx.step * abundance;

        self.mass = m0 + retained + delayed.recycled - star_formation - outflow;
        if self.mass < 0.0 {
            self.mass = 0.0;
        }
        unretained
    }

    /// Append the metallicity by mass in `gas_mass` of gas to the history.
    pub fn record(&mut self, gas_mass: f64) {
        self.history.push(self.mass / gas_mass);
    }

    /// Element symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Solar abundance by mass.
    pub fn solar_abundance(&self) -> f64 {
        self.solar_abundance
    }

    /// Whether this element's outflow is exempt from enhancement.
    pub fn is_primordial(&self) -> bool {
        self.primordial
    }

    /// Mass in the ISM, solar masses.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Overwrite the mass, clamping at zero. Used by migration.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = if mass < 0.0 { 0.0 } else { mass };
    }

    /// Metallicity by mass at every recorded timestep.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Custom channels with their tabulated kernels.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;

    fn ctx() -> StepContext {
        StepContext {
            step: 1e7,
            star_formation_rate: 1.0,
            gas_mass: 1e9,
            outflow_rate: 2.0,
            enhancement: 3.0,
            metallicity: 0.01,
        }
    }

    fn reservoir(config: &ElementConfig, primordial: bool, mass: f64) -> ElementReservoir {
        let mut r = ElementReservoir::new(config, primordial);
        r.setup(config, 0.01, 8).unwrap();
        r.set_mass(mass);
        r
    }

    #[test]
    fn prompt_yield_respects_entrainment() {
        let config = ElementConfig::new("o", 5.7e-3).with_ccsne(|_: f64| 0.01, 0.75);
        let mut r = reservoir(&config, false, 0.0);
        let unretained = r.update(&config, &ctx(), &DelayedElementYields::default());
        // 0.01 * 1 Msun/yr * 1e7 yr = 1e5 Msun produced.
        assert!((r.mass() - 7.5e4).abs() < 1e-6);
        assert!((unretained - 2.5e4).abs() < 1e-6);
    }

    #[test]
    fn losses_scale_with_abundance() {
        let config = ElementConfig::new("fe", 1.29e-3);
        let mut r = reservoir(&config, false, 1e6);
        r.update(&config, &ctx(), &DelayedElementYields::default());
        // Abundance 1e-3: star formation removes 1e4, enhanced outflow 6e4.
        assert!((r.mass() - (1e6 - 1e4 - 6e4)).abs() < 1e-6);
    }

    #[test]
    fn primordial_outflow_is_not_enhanced() {
        let config = ElementConfig::new("he", 0.2703);
        let mut r = reservoir(&config, true, 1e6);
        r.update(&config, &ctx(), &DelayedElementYields::default());
        assert!((r.mass() - (1e6 - 1e4 - 2e4)).abs() < 1e-6);
    }

    #[test]
    fn mass_is_floored_at_zero() {
        let config = ElementConfig::new("fe", 1.29e-3);
        let mut r = reservoir(&config, false, 1e6);
        let mut c = ctx();
        c.outflow_rate = 1e3;
        r.update(&config, &c, &DelayedElementYields::default());
        assert_eq!(r.mass(), 0.0);
    }

    #[test]
    fn delayed_sources_and_channels_add_mass() {
        let config = ElementConfig::new("n", 6.91e-4)
            .with_sneia(|_: f64| 0.0, 0.5)
            .with_channel(
                ChannelConfig::new("novae", |_: f64| 0.0, |_: f64| 1.0).with_entrainment(0.0),
            );
        let mut r = reservoir(&config, false, 0.0);
        let mut c = ctx();
        c.star_formation_rate = 0.0;
        let mut delayed = DelayedElementYields::with_channels(1);
        delayed.sneia = 10.0;
        delayed.agb = 5.0;
        delayed.recycled = 1.0;
        delayed.channels[0] = 4.0;
        let unretained = r.update(&config, &c, &delayed);
        assert!((r.mass() - (5.0 + 5.0 + 1.0)).abs() < 1e-12);
        assert!((unretained - (5.0 + 4.0)).abs() < 1e-12);
    }

    #[test]
    fn infall_enrichment_uses_current_metallicity() {
        let config = ElementConfig::new("o", 5.7e-3).with_infall_metallicity(vec![0.001, 0.002]);
        let mut r = reservoir(&config, false, 0.0);
        r.enrich_from_infall(&config, 10.0, 1e7, 1);
        assert!((r.mass() - 2e5).abs() < 1e-6);
        r.enrich_from_infall(&config, f64::NAN, 1e7, 1);
        assert!((r.mass() - 2e5).abs() < 1e-6);
    }

    #[test]
    fn record_appends_metallicity() {
        let config = ElementConfig::new("o", 5.7e-3);
        let mut r = reservoir(&config, false, 2.0);
        r.record(100.0);
        assert_eq!(r.history(), &[0.02]);
    }
}
