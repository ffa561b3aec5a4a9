//! Zone configuration and validation.
//!
//! [`ZoneConfig`] is the builder-input for a [`Zone`](crate::Zone).
//! [`validate()`](ZoneConfig::validate) checks every structural invariant
//! before any timestep buffer is allocated.

use std::fmt;
use std::sync::Arc;

use galchem_core::{
    AgbYield, DelayTimeDistribution, MetallicityYield, SetupError, Series, StellarPopulation,
    YEARS_PER_GYR,
};
use galchem_yields::{IaDelay, Imf, SspModel};

use crate::output::output_step;

// ── IsmMode ────────────────────────────────────────────────────────

/// Which quantity drives a zone's gas evolution.
///
/// Chosen once at configuration and never changed during a run. The
/// other two of (gas mass, infall rate, star formation rate) are derived.
#[derive(Clone, Debug, PartialEq)]
pub enum IsmMode {
    /// Gas mass (solar masses) is specified at every timestep.
    Gas(Series),
    /// Infall rate (solar masses per year) is specified at every timestep.
    Infall(Series),
    /// Star formation rate (solar masses per year) is specified at every timestep.
    StarFormation(Series),
}

impl IsmMode {
    /// Parse a mode name (`"gas"`, `"ifr"`, or `"sfr"`, case-insensitive).
    pub fn from_name(name: &str, series: impl Into<Series>) -> Result<Self, SetupError> {
        let series = series.into();
        match name.to_ascii_lowercase().as_str() {
            "gas" => Ok(Self::Gas(series)),
            "ifr" => Ok(Self::Infall(series)),
            "sfr" => Ok(Self::StarFormation(series)),
            _ => Err(SetupError::UnrecognizedMode {
                mode: name.to_string(),
            }),
        }
    }

    /// Short name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gas(_) => "gas",
            Self::Infall(_) => "ifr",
            Self::StarFormation(_) => "sfr",
        }
    }

    /// The driving series.
    pub fn series(&self) -> &Series {
        match self {
            Self::Gas(s) | Self::Infall(s) | Self::StarFormation(s) => s,
        }
    }
}

// ── StarFormationLaw ───────────────────────────────────────────────

/// Relation between gas mass and star formation rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StarFormationLaw {
    /// `SFR = M / tau_star`.
    Linear,
    /// Kennicutt-Schmidt: `SFR = M / tau_star * (M / reference_mass)^index`.
    Schmidt {
        /// Power-law index on the normalized gas mass.
        index: f64,
        /// Gas mass (solar masses) at which the law reduces to linear.
        reference_mass: f64,
    },
}

impl StarFormationLaw {
    /// Star formation rate (solar masses per year) of `gas_mass` with an
    /// efficiency timescale of `tau_star` Gyr.
    pub fn rate(&self, gas_mass: f64, tau_star: f64) -> f64 {
        let linear = gas_mass / (tau_star * YEARS_PER_GYR);
        match *self {
            Self::Linear => linear,
            Self::Schmidt {
                index,
                reference_mass,
            } => linear * (gas_mass / reference_mass).powf(index),
        }
    }

    /// Gas mass that forms stars at `sfr` with timescale `tau_star`.
    ///
    /// Closed-form inverse of [`rate`](Self::rate).
    pub fn gas_mass_for(&self, sfr: f64, tau_star: f64) -> f64 {
        let linear = sfr * tau_star * YEARS_PER_GYR;
        match *self {
            Self::Linear => linear,
            Self::Schmidt {
                index,
                reference_mass,
            } => (linear * reference_mass.powf(index)).powf(1.0 / (1.0 + index)),
        }
    }
}

// ── Recycling ──────────────────────────────────────────────────────

/// How stellar populations return mass to the ISM.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Recycling {
    /// Follow the stellar population's cumulative return fraction.
    Continuous,
    /// Return this fraction of each step's newly formed stars within the step.
    Instantaneous(f64),
}

// ── Element sources ────────────────────────────────────────────────

/// A metallicity-dependent yield and the fraction of it retained in the zone.
#[derive(Clone)]
pub struct SourceYield {
    /// Fractional yield as a function of metallicity.
    pub yield_fn: Arc<dyn MetallicityYield>,
    /// Fraction of the product retained in the zone, in `[0, 1]`.
    pub entrainment: f64,
}

impl SourceYield {
    /// A yield with full entrainment.
    pub fn new(yield_fn: impl MetallicityYield + 'static) -> Self {
        Self {
            yield_fn: Arc::new(yield_fn),
            entrainment: 1.0,
        }
    }

    /// A source producing nothing.
    pub fn zero() -> Self {
        Self::new(|_: f64| 0.0)
    }
}

impl fmt::Debug for SourceYield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceYield")
            .field("entrainment", &self.entrainment)
            .finish_non_exhaustive()
    }
}

/// An AGB yield grid and the fraction of it retained in the zone.
#[derive(Clone)]
pub struct AgbSource {
    /// Fractional yield as a function of turnoff mass and metallicity.
    pub yield_fn: Arc<dyn AgbYield>,
    /// Fraction of the product retained in the zone, in `[0, 1]`.
    pub entrainment: f64,
}

impl AgbSource {
    /// A yield with full entrainment.
    pub fn new(yield_fn: impl AgbYield + 'static) -> Self {
        Self {
            yield_fn: Arc::new(yield_fn),
            entrainment: 1.0,
        }
    }

    /// A source producing nothing.
    pub fn zero() -> Self {
        Self::new(|_: f64, _: f64| 0.0)
    }
}

impl fmt::Debug for AgbSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgbSource")
            .field("entrainment", &self.entrainment)
            .finish_non_exhaustive()
    }
}

/// A user-defined delayed enrichment channel.
///
/// The channel produces `yield_fn(Z)` per unit stellar mass, released over
/// the population's life following `rate`. The rate is tabulated and
/// normalized at setup.
#[derive(Clone)]
pub struct ChannelConfig {
    /// Label used in logs.
    pub name: String,
    /// Fractional yield as a function of metallicity at formation.
    pub yield_fn: Arc<dyn MetallicityYield>,
    /// Unnormalized rate as a function of population age.
    pub rate: Arc<dyn DelayTimeDistribution>,
    /// Fraction of the product retained in the zone, in `[0, 1]`.
    pub entrainment: f64,
}

impl ChannelConfig {
    /// A channel with full entrainment.
    pub fn new(
        name: impl Into<String>,
        yield_fn: impl MetallicityYield + 'static,
        rate: impl DelayTimeDistribution + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            yield_fn: Arc::new(yield_fn),
            rate: Arc::new(rate),
            entrainment: 1.0,
        }
    }

    /// Replace the entrainment fraction.
    pub fn with_entrainment(mut self, entrainment: f64) -> Self {
        self.entrainment = entrainment;
        self
    }
}

impl fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("name", &self.name)
            .field("entrainment", &self.entrainment)
            .finish_non_exhaustive()
    }
}

// ── ElementConfig ──────────────────────────────────────────────────

/// Configuration of one tracked element.
#[derive(Clone, Debug)]
pub struct ElementConfig {
    /// Element symbol, lowercase by convention (`"o"`, `"fe"`, `"he"`).
    pub symbol: String,
    /// Solar abundance by mass, used for [X/H] and metallicity scaling.
    pub solar_abundance: f64,
    /// Core-collapse supernova yield.
    pub ccsne: SourceYield,
    /// Type Ia supernova yield.
    pub sneia: SourceYield,
    /// AGB star yield.
    pub agb: AgbSource,
    /// Custom enrichment channels.
    pub channels: Vec<ChannelConfig>,
    /// Metallicity by mass of infalling gas.
    pub infall_metallicity: Series,
}

impl ElementConfig {
    /// An element with zero yields from every source and metal-free infall.
    pub fn new(symbol: impl Into<String>, solar_abundance: f64) -> Self {
        Self {
            symbol: symbol.into(),
            solar_abundance,
            ccsne: SourceYield::zero(),
            sneia: SourceYield::zero(),
            agb: AgbSource::zero(),
            channels: Vec::new(),
            infall_metallicity: Series::constant(0.0),
        }
    }

    /// Set the CCSN yield and its entrainment fraction.
    pub fn with_ccsne(
        mut self,
        yield_fn: impl MetallicityYield + 'static,
        entrainment: f64,
    ) -> Self {
        self.ccsne = SourceYield {
            yield_fn: Arc::new(yield_fn),
            entrainment,
        };
        self
    }

    /// Set the SN Ia yield and its entrainment fraction.
    pub fn with_sneia(
        mut self,
        yield_fn: impl MetallicityYield + 'static,
        entrainment: f64,
    ) -> Self {
        self.sneia = SourceYield {
            yield_fn: Arc::new(yield_fn),
            entrainment,
        };
        self
    }

    /// Set the AGB yield and its entrainment fraction.
    pub fn with_agb(mut self, yield_fn: impl AgbYield + 'static, entrainment: f64) -> Self {
        self.agb = AgbSource {
            yield_fn: Arc::new(yield_fn),
            entrainment,
        };
        self
    }

    /// Add a custom enrichment channel.
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channels.push(channel);
        self
    }

    /// Set the infall metallicity series.
    pub fn with_infall_metallicity(mut self, series: impl Into<Series>) -> Self {
        self.infall_metallicity = series.into();
        self
    }

    fn validate(&self, reads: usize) -> Result<(), SetupError> {
        let symbol = &self.symbol;
        if !(self.solar_abundance.is_finite() && self.solar_abundance > 0.0) {
            return Err(invalid(
                format!("{symbol}.solar_abundance"),
                "must be finite and positive",
            ));
        }
        let sources = [
            ("ccsne", self.ccsne.entrainment),
            ("sneia", self.sneia.entrainment),
            ("agb", self.agb.entrainment),
        ];
        let channels = self.channels.iter().map(|c| (c.name.as_str(), c.entrainment));
        for (source, value) in sources.into_iter().chain(channels) {
            if !(0.0..=1.0).contains(&value) {
                return Err(SetupError::InvalidEntrainment {
                    element: symbol.clone(),
                    source: source.to_string(),
                    value,
                });
            }
        }
        check_series(
            &format!("{symbol}.infall_metallicity"),
            &self.infall_metallicity,
            reads,
            |z| z.is_finite() && (0.0..=1.0).contains(&z),
            "must lie in [0, 1]",
        )
    }
}

// ── ZoneConfig ─────────────────────────────────────────────────────

/// Complete configuration of one zone.
///
/// All time series are sampled on the zone's timestep grid; sampled
/// series must cover every timestep the run reads (see
/// [`series_reads()`](Self::series_reads)).
#[derive(Clone)]
pub struct ZoneConfig {
    /// Zone name used in logs and errors.
    pub name: String,
    /// Timestep size in Gyr. Default: 0.01.
    pub dt: f64,
    /// Ascending output times in Gyr. Default: 0 to 10 every 10 Myr.
    pub output_times: Vec<f64>,
    /// ISM driving mode and its series.
    pub mode: IsmMode,
    /// Star formation efficiency timescale in Gyr. Default: 2.
    pub tau_star: Series,
    /// Mass-loading factor of the outflow. Default: 2.5.
    pub mass_loading: Series,
    /// Outflow metallicity enhancement factor. Default: 1.
    pub enhancement: Series,
    /// Outflow smoothing time in Gyr. Default: 0 (instantaneous).
    pub smoothing_time: f64,
    /// Star formation law. Default: linear.
    pub law: StarFormationLaw,
    /// Recycling prescription. Default: continuous.
    pub recycling: Recycling,
    /// Initial gas mass in infall mode, in solar masses. Default: 6e9.
    pub initial_gas: f64,
    /// SN Ia delay-time distribution. Default: `t^-1.1`.
    pub ia_delay: Arc<dyn DelayTimeDistribution>,
    /// Minimum SN Ia delay time in Gyr. Default: 0.15.
    pub ia_min_delay: f64,
    /// Stellar population bookkeeping. Default: Kroupa IMF.
    pub stellar_population: Arc<dyn StellarPopulation>,
    /// Tracked elements.
    pub elements: Vec<ElementConfig>,
    /// Element whose outflow is never enhanced. Default: `"he"`.
    pub primordial: Option<String>,
    /// MDF bin edges. Default: -3 to 1 in steps of 0.05.
    pub bins: Vec<f64>,
    /// Solar metallicity. Default: 0.014.
    pub z_solar: f64,
}

impl fmt::Debug for ZoneConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneConfig")
            .field("name", &self.name)
            .field("dt", &self.dt)
            .field("mode", &self.mode.name())
            .field("law", &self.law)
            .field("recycling", &self.recycling)
            .field("ia_min_delay", &self.ia_min_delay)
            .field("elements", &self.elements)
            .field("primordial", &self.primordial)
            .finish_non_exhaustive()
    }
}

/// Output times from 0 to 10 Gyr every 10 Myr.
pub fn default_output_times() -> Vec<f64> {
    (0..=1000).map(|i| i as f64 * 0.01).collect()
}

/// MDF bin edges from -3 to 1 in steps of 0.05.
pub fn default_bins() -> Vec<f64> {
    (0..=80).map(|i| -3.0 + i as f64 * 0.05).collect()
}

impl ZoneConfig {
    /// A zone driven by `mode`, with every other setting at its default.
    pub fn new(name: impl Into<String>, mode: IsmMode) -> Self {
        Self {
            name: name.into(),
            dt: 0.01,
            output_times: default_output_times(),
            mode,
            tau_star: Series::constant(2.0),
            mass_loading: Series::constant(2.5),
            enhancement: Series::constant(1.0),
            smoothing_time: 0.0,
            law: StarFormationLaw::Linear,
            recycling: Recycling::Continuous,
            initial_gas: 6e9,
            ia_delay: Arc::new(IaDelay::default()),
            ia_min_delay: 0.15,
            stellar_population: Arc::new(SspModel::new(Imf::Kroupa)),
            elements: Vec::new(),
            primordial: Some("he".to_string()),
            bins: default_bins(),
            z_solar: 0.014,
        }
    }

    /// Set the timestep size.
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Set the output times.
    pub fn with_output_times(mut self, times: Vec<f64>) -> Self {
        self.output_times = times;
        self
    }

    /// Set the star formation efficiency timescale.
    pub fn with_tau_star(mut self, tau_star: impl Into<Series>) -> Self {
        self.tau_star = tau_star.into();
        self
    }

    /// Set the mass-loading factor.
    pub fn with_mass_loading(mut self, eta: impl Into<Series>) -> Self {
        self.mass_loading = eta.into();
        self
    }

    /// Set the outflow enhancement factor.
    pub fn with_enhancement(mut self, enhancement: impl Into<Series>) -> Self {
        self.enhancement = enhancement.into();
        self
    }

    /// Set the outflow smoothing time.
    pub fn with_smoothing_time(mut self, smoothing: f64) -> Self {
        self.smoothing_time = smoothing;
        self
    }

    /// Set the star formation law.
    pub fn with_law(mut self, law: StarFormationLaw) -> Self {
        self.law = law;
        self
    }

    /// Set the recycling prescription.
    pub fn with_recycling(mut self, recycling: Recycling) -> Self {
        self.recycling = recycling;
        self
    }

    /// Set the initial gas mass used in infall mode.
    pub fn with_initial_gas(mut self, mass: f64) -> Self {
        self.initial_gas = mass;
        self
    }

    /// Set the SN Ia delay-time distribution and minimum delay.
    pub fn with_ia_delay(
        mut self,
        dtd: impl DelayTimeDistribution + 'static,
        min_delay: f64,
    ) -> Self {
        self.ia_delay = Arc::new(dtd);
        self.ia_min_delay = min_delay;
        self
    }

    /// Set the stellar population model.
    pub fn with_stellar_population(
        mut self,
        population: impl StellarPopulation + 'static,
    ) -> Self {
        self.stellar_population = Arc::new(population);
        self
    }

    /// Add a tracked element.
    pub fn with_element(mut self, element: ElementConfig) -> Self {
        self.elements.push(element);
        self
    }

    /// Set the element exempt from outflow enhancement.
    pub fn with_primordial(mut self, symbol: Option<&str>) -> Self {
        self.primordial = symbol.map(str::to_string);
        self
    }

    /// Set the MDF bin edges.
    pub fn with_bins(mut self, bins: Vec<f64>) -> Self {
        self.bins = bins;
        self
    }

    /// Time of the final output.
    pub fn final_time(&self) -> f64 {
        self.output_times.last().copied().unwrap_or(0.0)
    }

    /// Number of timesteps the run advances through: every step up to and
    /// including the one the final output snaps to.
    ///
    /// Saturates for runs too long to index; such runs fail allocation.
    pub fn timestep_count(&self) -> usize {
        output_step(self.final_time(), self.dt).saturating_add(1)
    }

    /// Number of samples a sampled series must supply: the run reads
    /// index `n + 1` while advancing timestep `n`.
    pub fn series_reads(&self) -> usize {
        self.timestep_count().saturating_add(1)
    }

    /// Check every invariant of the configuration.
    pub fn validate(&self) -> Result<(), SetupError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SetupError::InvalidTimestep { value: self.dt });
        }
        if self.output_times.is_empty() {
            return Err(SetupError::NoOutputTimes);
        }
        for (i, &t) in self.output_times.iter().enumerate() {
            let ascending = i == 0 || t > self.output_times[i - 1];
            if !(t.is_finite() && t >= 0.0 && ascending) {
                return Err(SetupError::UnsortedOutputTimes { index: i });
            }
        }
        let reads = self.series_reads();
        let driving = self.mode.series();
        match self.mode {
            IsmMode::Gas(_) => {
                check_series("gas", driving, reads, f64::is_finite, "must be finite")?
            }
            IsmMode::Infall(_) => {
                check_series("ifr", driving, reads, non_negative, "must be finite and >= 0")?;
                if !(self.initial_gas.is_finite() && self.initial_gas > 0.0) {
                    return Err(invalid("initial_gas", "must be finite and positive"));
                }
            }
            IsmMode::StarFormation(_) => {
                check_series("sfr", driving, reads, non_negative, "must be finite and >= 0")?
            }
        }
        check_series(
            "tau_star",
            &self.tau_star,
            reads,
            |t| t.is_finite() && t > 0.0,
            "must be finite and positive",
        )?;
        check_series(
            "mass_loading",
            &self.mass_loading,
            reads,
            non_negative,
            "must be finite and >= 0",
        )?;
        check_series(
            "enhancement",
            &self.enhancement,
            reads,
            non_negative,
            "must be finite and >= 0",
        )?;
        if !non_negative(self.smoothing_time) {
            return Err(invalid("smoothing_time", "must be finite and >= 0"));
        }
        if let StarFormationLaw::Schmidt {
            index,
            reference_mass,
        } = self.law
        {
            if !(index.is_finite() && index > -1.0) {
                return Err(invalid("law.index", "must be finite and > -1"));
            }
            if !(reference_mass.is_finite() && reference_mass > 0.0) {
                return Err(invalid("law.reference_mass", "must be finite and positive"));
            }
        }
        if let Recycling::Instantaneous(r) = self.recycling {
            if !(0.0..=1.0).contains(&r) {
                return Err(invalid("recycling", "fraction must lie in [0, 1]"));
            }
        }
        if !non_negative(self.ia_min_delay) {
            return Err(invalid("ia_min_delay", "must be finite and >= 0"));
        }
        if !(self.z_solar.is_finite() && self.z_solar > 0.0) {
            return Err(invalid("z_solar", "must be finite and positive"));
        }
        for (i, element) in self.elements.iter().enumerate() {
            if self.elements[..i].iter().any(|e| e.symbol == element.symbol) {
                return Err(SetupError::DuplicateElement {
                    symbol: element.symbol.clone(),
                });
            }
            element.validate(reads)?;
        }
        if self.bins.len() < 2 {
            return Err(SetupError::InvalidBins {
                reason: format!("need at least 2 edges, got {}", self.bins.len()),
            });
        }
        if self.bins.iter().any(|b| !b.is_finite()) {
            return Err(SetupError::InvalidBins {
                reason: "edges must be finite".to_string(),
            });
        }
        if let Some(i) = self.bins.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SetupError::InvalidBins {
                reason: format!("edges not strictly ascending at index {}", i + 1),
            });
        }
        Ok(())
    }
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn invalid(name: impl Into<String>, reason: &str) -> SetupError {
    SetupError::InvalidParameter {
        name: name.into(),
        reason: reason.to_string(),
    }
}

fn check_series(
    name: &str,
    series: &Series,
    reads: usize,
    valid: impl FnMut(f64) -> bool,
    reason: &str,
) -> Result<(), SetupError> {
    if !series.covers(reads) {
        return Err(SetupError::SeriesTooShort {
            name: name.to_string(),
            required: reads,
            supplied: series.sample_count().unwrap_or(0),
        });
    }
    if !series.all(reads, valid) {
        return Err(invalid(name, reason));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ZoneConfig {
        ZoneConfig::new("test", IsmMode::Infall(Series::constant(10.0)))
            .with_output_times(vec![0.0, 0.5, 1.0])
            .with_dt(0.1)
    }

    #[test]
    fn default_config_validates() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn timestep_count_includes_final_output() {
        // Times 0.0, 0.1, ..., 1.0.
        assert_eq!(base().timestep_count(), 11);
        assert_eq!(base().series_reads(), 12);
        // Halfway between steps 9 and 10 snaps to the later one.
        let c = base().with_output_times(vec![0.0, 0.95]);
        assert_eq!(c.timestep_count(), 11);
        let c = base().with_output_times(vec![0.0, 0.3]);
        assert_eq!(c.timestep_count(), 4);
    }

    #[test]
    fn mode_names_parse() {
        assert!(matches!(
            IsmMode::from_name("SFR", 1.0),
            Ok(IsmMode::StarFormation(_))
        ));
        assert_eq!(IsmMode::from_name("ifr", 1.0).unwrap().name(), "ifr");
        assert_eq!(
            IsmMode::from_name("hot", 1.0),
            Err(SetupError::UnrecognizedMode {
                mode: "hot".to_string()
            })
        );
    }

    #[test]
    fn schmidt_inverse_round_trips() {
        let law = StarFormationLaw::Schmidt {
            index: 0.5,
            reference_mass: 1e8,
        };
        for mass in [1e6, 3e8, 5e9] {
            let sfr = law.rate(mass, 2.0);
            let back = law.gas_mass_for(sfr, 2.0);
            assert!((back - mass).abs() < 1e-9 * mass);
        }
        assert_eq!(StarFormationLaw::Linear.rate(2e9, 2.0), 1.0);
    }

    #[test]
    fn rejects_bad_timestep() {
        let c = base().with_dt(0.0);
        assert_eq!(c.validate(), Err(SetupError::InvalidTimestep { value: 0.0 }));
        let c = base().with_dt(f64::NAN);
        assert!(matches!(
            c.validate(),
            Err(SetupError::InvalidTimestep { .. })
        ));
    }

    #[test]
    fn rejects_unsorted_outputs() {
        let c = base().with_output_times(vec![0.0, 0.5, 0.5]);
        assert_eq!(
            c.validate(),
            Err(SetupError::UnsortedOutputTimes { index: 2 })
        );
        let c = base().with_output_times(vec![]);
        assert_eq!(c.validate(), Err(SetupError::NoOutputTimes));
    }

    #[test]
    fn rejects_short_series() {
        let c = base().with_tau_star(vec![2.0; 5]);
        assert_eq!(
            c.validate(),
            Err(SetupError::SeriesTooShort {
                name: "tau_star".to_string(),
                required: 12,
                supplied: 5,
            })
        );
    }

    #[test]
    fn rejects_entrainment_outside_unit_interval() {
        let o = ElementConfig::new("o", 5.7e-3).with_ccsne(|_: f64| 0.015, 1.5);
        let c = base().with_element(o);
        assert_eq!(
            c.validate(),
            Err(SetupError::InvalidEntrainment {
                element: "o".to_string(),
                source: "ccsne".to_string(),
                value: 1.5,
            })
        );
    }

    #[test]
    fn rejects_duplicate_elements() {
        let c = base()
            .with_element(ElementConfig::new("fe", 1.29e-3))
            .with_element(ElementConfig::new("fe", 1.29e-3));
        assert_eq!(
            c.validate(),
            Err(SetupError::DuplicateElement {
                symbol: "fe".to_string()
            })
        );
    }

    #[test]
    fn rejects_bad_bins() {
        let c = base().with_bins(vec![0.0]);
        assert!(matches!(c.validate(), Err(SetupError::InvalidBins { .. })));
        let c = base().with_bins(vec![0.0, -1.0]);
        assert!(matches!(c.validate(), Err(SetupError::InvalidBins { .. })));
    }

    #[test]
    fn rejects_non_positive_tau_star() {
        let c = base().with_tau_star(0.0);
        assert!(matches!(
            c.validate(),
            Err(SetupError::InvalidParameter { ref name, .. }) if name == "tau_star"
        ));
    }
}
