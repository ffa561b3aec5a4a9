//! The single-zone engine.
//!
//! A [`Zone`] owns one [`IsmReservoir`], one [`ElementReservoir`] per
//! tracked element, and one [`MdfAccumulator`]. Each timestep runs, in
//! order:
//!
//! 1. delayed-source convolution over the zone's own star formation history,
//! 2. infall enrichment of every element,
//! 3. the ISM update,
//! 4. every element update,
//! 5. metallicity recording,
//! 6. the MDF update and the time advance.
//!
//! The multi-zone engine drives the same sequence through
//! [`step_physics()`](Zone::step_physics),
//! [`record_metallicity()`](Zone::record_metallicity) and
//! [`complete_step()`](Zone::complete_step), supplying delayed yields from
//! its tracer scan instead of the convolution.

use galchem_core::{
    buffer, RunState, SetupError, StepError, TIMESTEP_BUFFER, YEARS_PER_GYR,
};
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::config::ZoneConfig;
use crate::delayed::{DelayedElementYields, DelayedYields};
use crate::element::{ElementReservoir, StepContext};
use crate::ism::IsmReservoir;
use crate::mdf::{abundance_ratio, MdfAccumulator};
use crate::output::OutputSchedule;
use crate::snapshot::{ElementSnapshot, MdfTable, ZoneOutput, ZoneSnapshot};
use crate::ssp::SspTables;

/// A single-zone chemical evolution model.
pub struct Zone {
    config: ZoneConfig,
    state: RunState,
    timestep: usize,
    ism: IsmReservoir,
    elements: Vec<ElementReservoir>,
    symbols: IndexMap<String, usize>,
    mdf: MdfAccumulator,
    tables: SspTables,
    metallicity: Vec<f64>,
    schedule: OutputSchedule,
    stellar_mass: f64,
    delayed: DelayedYields,
}

impl Zone {
    /// Validate `config` and build an uninitialized zone.
    pub fn new(config: ZoneConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let primordial = config.primordial.as_deref();
        let elements: Vec<ElementReservoir> = config
            .elements
            .iter()
            .map(|e| ElementReservoir::new(e, primordial == Some(e.symbol.as_str())))
            .collect();
        let symbols = config
            .elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.symbol.clone(), i))
            .collect();
        let schedule = OutputSchedule::new(&config.output_times, config.dt);
        log::debug!(
            "zone '{}': {} mode, dt = {} Gyr, {} elements, {} outputs",
            config.name,
            config.mode.name(),
            config.dt,
            elements.len(),
            config.output_times.len()
        );
        Ok(Self {
            config,
            state: RunState::Uninitialized,
            timestep: 0,
            ism: IsmReservoir::new(),
            elements,
            symbols,
            mdf: MdfAccumulator::default(),
            tables: SspTables::default(),
            metallicity: Vec::new(),
            schedule,
            stellar_mass: 0.0,
            delayed: DelayedYields::default(),
        })
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Allocate every timestep buffer and seed the initial state.
    ///
    /// Allowed from `Uninitialized` or `Failed`. On failure every buffer
    /// allocated by this attempt is released and the zone is `Failed`.
    pub fn setup(&mut self) -> Result<(), SetupError> {
        if !self.state.can_setup() {
            return Err(SetupError::InvalidState { state: self.state });
        }
        match self.try_setup() {
            Ok(()) => {
                self.state = RunState::Running;
                log::debug!(
                    "zone '{}' set up: {} timesteps, initial gas {:.3e} Msun",
                    self.config.name,
                    self.config.timestep_count(),
                    self.ism.gas_mass()
                );
                Ok(())
            }
            Err(e) => {
                self.release();
                self.state = RunState::Failed;
                log::warn!("zone '{}' setup rolled back: {e}", self.config.name);
                Err(e)
            }
        }
    }

    fn try_setup(&mut self) -> Result<(), SetupError> {
        let capacity = self
            .config
            .timestep_count()
            .saturating_add(1 + TIMESTEP_BUFFER);
        self.metallicity = buffer::with_capacity(capacity, "metallicity history")?;
        self.tables = SspTables::build(&self.config, capacity)?;
        self.ism.setup(&self.config, capacity)?;
        for (element, config) in self.elements.iter_mut().zip(&self.config.elements) {
            element.setup(config, self.config.dt, capacity)?;
        }
        self.mdf = MdfAccumulator::new(&self.config.bins, self.elements.len())?;
        self.delayed = self.empty_delayed();
        self.timestep = 0;
        self.stellar_mass = 0.0;
        self.schedule.reset();
        self.record_metallicity();
        Ok(())
    }

    /// Abort the run, releasing every timestep buffer.
    ///
    /// The zone returns to `Uninitialized` and may be set up again.
    pub fn cancel(&mut self) {
        self.release();
        self.state = RunState::Uninitialized;
        log::debug!("zone '{}' cancelled", self.config.name);
    }

    fn release(&mut self) {
        self.ism.release();
        self.elements.iter_mut().for_each(ElementReservoir::release);
        self.mdf.release();
        self.tables = SspTables::default();
        self.metallicity = Vec::new();
        self.delayed = DelayedYields::default();
        self.schedule.reset();
        self.timestep = 0;
        self.stellar_mass = 0.0;
    }

    // ── Stepping ───────────────────────────────────────────────────

    /// Advance one timestep.
    ///
    /// Returns the snapshot of the starting state if an output was due.
    /// After the final output time has been passed the zone is `Finished`
    /// and its MDFs are normalized.
    pub fn advance(&mut self) -> Result<Option<ZoneSnapshot>, StepError> {
        self.ensure_running()?;
        let snapshot = self.take_due_snapshot();
        let mut delayed = std::mem::take(&mut self.delayed);
        self.convolve(&mut delayed);
        let result = self.step_physics(&delayed);
        self.delayed = delayed;
        result?;
        self.record_metallicity();
        self.complete_step();
        Ok(snapshot)
    }

    /// Run to completion.
    pub fn evolve(&mut self) -> Result<ZoneOutput, StepError> {
        let mut snapshots = Vec::with_capacity(self.config.output_times.len());
        while self.state == RunState::Running {
            if let Some(snapshot) = self.advance()? {
                snapshots.push(snapshot);
            }
        }
        Ok(ZoneOutput {
            snapshots,
            mdf: self.mdf_table(),
        })
    }

    fn ensure_running(&self) -> Result<(), StepError> {
        if self.state == RunState::Running {
            Ok(())
        } else {
            Err(StepError::NotRunning { state: self.state })
        }
    }

    /// Snapshot the current state if an output is due, consuming it.
    pub fn take_due_snapshot(&mut self) -> Option<ZoneSnapshot> {
        if self.schedule.take_due(self.timestep) {
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// Fill `delayed` with the production of every population this zone
    /// has formed, over the coming step.
    pub fn convolve(&self, delayed: &mut DelayedYields) {
        delayed.clear();
        let step = self.step_years();
        let n = self.timestep;
        let history = self.ism.history();
        for age in 0..=n {
            let birth = n - age;
            let mass = history[birth] * step;
            delayed.recycled += self.recycled_fraction(age) * mass;
        }
        for (e, out) in delayed.elements.iter_mut().enumerate() {
            for age in 0..=n {
                let birth = n - age;
                let mass = history[birth] * step;
                self.deposit_element(e, birth, age, mass, out);
            }
        }
    }

    /// Fraction of a population's initial mass returned over the step it
    /// spends at age `age` timesteps.
    pub fn recycled_fraction(&self, age: usize) -> f64 {
        let crf = &self.tables.crf;
        match (crf.get(age), crf.get(age + 1)) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        }
    }

    /// Add the production of element `e` by `mass` solar masses of stars
    /// formed in this zone at timestep `birth`, now aged `age` timesteps.
    ///
    /// Yields are evaluated at this zone's metallicity at `birth` and with
    /// this zone's stellar population tables. The receiving zone may differ.
    pub fn deposit_element(
        &self,
        e: usize,
        birth: usize,
        age: usize,
        mass: f64,
        out: &mut DelayedElementYields,
    ) {
        let (Some(element), Some(config)) = (self.elements.get(e), self.config.elements.get(e))
        else {
            return;
        };
        let z = self.metallicity.get(birth).copied().unwrap_or(0.0);
        let z_element = element.history().get(birth).copied().unwrap_or(0.0);
        out.recycled += self.recycled_fraction(age) * mass * z_element;

        let tables = &self.tables;
        if let (Some(&on_ms), Some(&next_ms), Some(&turnoff)) = (
            tables.msmf.get(age),
            tables.msmf.get(age + 1),
            tables.turnoff.get(age + 1),
        ) {
            let leaving = on_ms - next_ms;
            if leaving > 0.0 {
                out.agb += mass * leaving * config.agb.yield_fn.yield_at(turnoff, z);
            }
        }
        if let Some(&rate) = tables.ia_rate.get(age) {
            if rate > 0.0 {
                out.sneia += mass * rate * config.sneia.yield_fn.yield_at(z);
            }
        }
        for (slot, channel) in out.channels.iter_mut().zip(element.channels()) {
            *slot += channel.produced(mass, age, z);
        }
    }

    /// Apply one step of ISM and element physics using `delayed`.
    ///
    /// Does not record metallicities, update the MDF, or advance time.
    pub fn step_physics(&mut self, delayed: &DelayedYields) -> Result<(), StepError> {
        self.ensure_running()?;
        let n = self.timestep;
        let step = self.step_years();

        let infall = self.ism.infall_rate();
        for (element, config) in self.elements.iter_mut().zip(&self.config.elements) {
            element.enrich_from_infall(config, infall, step, n);
        }

        let ctx = StepContext {
            step,
            star_formation_rate: self.ism.star_formation_rate(),
            gas_mass: self.ism.gas_mass(),
            outflow_rate: self.ism.outflow_rate(),
            enhancement: self.config.enhancement.value(n),
            metallicity: self.metallicity.get(n).copied().unwrap_or(0.0),
        };
        self.ism.advance(&self.config, n, delayed.recycled);
        self.stellar_mass += ctx.star_formation_rate * step - delayed.recycled;

        let empty = DelayedElementYields::default();
        let mut unretained = 0.0;
        for (e, (element, config)) in self
            .elements
            .iter_mut()
            .zip(&self.config.elements)
            .enumerate()
        {
            let d = delayed.elements.get(e).unwrap_or(&empty);
            unretained += element.update(config, &ctx, d);
        }
        self.ism.set_unretained(unretained);
        self.check_finite()
    }

    fn check_finite(&self) -> Result<(), StepError> {
        let bad = |quantity: &str| StepError::NonFinite {
            quantity: quantity.to_string(),
            zone: self.config.name.clone(),
            timestep: self.timestep,
        };
        if !self.ism.gas_mass().is_finite() {
            return Err(bad("gas mass"));
        }
        if !self.ism.star_formation_rate().is_finite() {
            return Err(bad("star formation rate"));
        }
        if !self.ism.infall_rate().is_finite() {
            return Err(bad("infall rate"));
        }
        for element in &self.elements {
            if !element.mass().is_finite() {
                return Err(bad(&format!("{} mass", element.symbol())));
            }
        }
        Ok(())
    }

    /// Append the current metallicities to every history.
    ///
    /// Must follow the ISM update of the same step.
    pub fn record_metallicity(&mut self) {
        let gas = self.ism.gas_mass();
        for element in &mut self.elements {
            element.record(gas);
        }
        let z = self.scaled_metallicity();
        self.metallicity.push(z);
    }

    /// Total metallicity of the tracked elements, rescaled to solar.
    ///
    /// `Z = z_solar * sum(Z_x) / sum(Z_x,solar)`; zero with no elements.
    pub fn scaled_metallicity(&self) -> f64 {
        let gas = self.ism.gas_mass();
        let (z, solar) = self
            .elements
            .iter()
            .fold((0.0, 0.0), |(z, s), e| (z + e.mass() / gas, s + e.solar_abundance()));
        if solar > 0.0 {
            self.config.z_solar * z / solar
        } else {
            0.0
        }
    }

    /// Update the MDF and advance the clock by one timestep.
    ///
    /// Finishes the run, normalizing the MDF, once the step of the final
    /// output has been completed.
    pub fn complete_step(&mut self) {
        let weight = self.ism.star_formation_rate();
        let abundances = self.abundances();
        self.mdf.add(&abundances, weight);
        self.timestep += 1;
        self.ism.refresh_outflow(&self.config, self.timestep);
        if self.timestep > self.schedule.last_step() {
            self.mdf.normalize();
            self.state = RunState::Finished;
            log::info!(
                "zone '{}' finished after {} timesteps",
                self.config.name,
                self.timestep
            );
        }
    }

    /// [X/H] of every element.
    pub fn abundances(&self) -> SmallVec<[f64; 8]> {
        let gas = self.ism.gas_mass();
        self.elements
            .iter()
            .map(|e| abundance_ratio(e.mass(), gas, e.solar_abundance()))
            .collect()
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// The zone's configuration.
    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Zone name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Current timestep index.
    pub fn timestep(&self) -> usize {
        self.timestep
    }

    /// Current simulated time, Gyr.
    pub fn time(&self) -> f64 {
        self.timestep as f64 * self.config.dt
    }

    /// Length of one step in years.
    pub fn step_years(&self) -> f64 {
        self.config.dt * YEARS_PER_GYR
    }

    /// The gas reservoir.
    pub fn ism(&self) -> &IsmReservoir {
        &self.ism
    }

    /// Element reservoirs, in configuration order.
    pub fn elements(&self) -> &[ElementReservoir] {
        &self.elements
    }

    /// Index of the element with symbol `symbol`.
    pub fn element_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.get(symbol).copied()
    }

    /// Mass of element `e` in the ISM.
    pub fn element_mass(&self, e: usize) -> f64 {
        self.elements.get(e).map_or(0.0, ElementReservoir::mass)
    }

    /// Overwrite the gas mass, clamped to the floor.
    pub fn set_gas_mass(&mut self, mass: f64) {
        self.ism.set_gas_mass(mass);
    }

    /// Overwrite the mass of element `e`, clamped at zero.
    pub fn set_element_mass(&mut self, e: usize, mass: f64) {
        if let Some(element) = self.elements.get_mut(e) {
            element.set_mass(mass);
        }
    }

    /// Stellar population tables.
    pub fn tables(&self) -> &SspTables {
        &self.tables
    }

    /// Scaled total metallicity at every recorded timestep.
    pub fn metallicity_history(&self) -> &[f64] {
        &self.metallicity
    }

    /// Mass in stars, solar masses.
    pub fn stellar_mass(&self) -> f64 {
        self.stellar_mass
    }

    /// Overwrite the stellar mass. Used when stars migrate between zones.
    pub fn set_stellar_mass(&mut self, mass: f64) {
        self.stellar_mass = mass;
    }

    /// Delayed yields applied in the most recent step.
    pub fn last_delayed(&self) -> &DelayedYields {
        &self.delayed
    }

    /// Record the delayed yields supplied by an outside scan, returning
    /// the previously recorded ones for reuse.
    pub fn replace_last_delayed(&mut self, delayed: DelayedYields) -> DelayedYields {
        std::mem::replace(&mut self.delayed, delayed)
    }

    /// Zeroed delayed yields shaped for this zone's elements.
    pub fn empty_delayed(&self) -> DelayedYields {
        DelayedYields::with_shape(self.config.elements.iter().map(|e| e.channels.len()))
    }

    /// The MDF accumulator.
    pub fn mdf(&self) -> &MdfAccumulator {
        &self.mdf
    }

    /// Mutable access to the MDF accumulator, for rebuilding from tracers.
    pub fn mdf_mut(&mut self) -> &mut MdfAccumulator {
        &mut self.mdf
    }

    /// The MDFs labelled by element symbol.
    pub fn mdf_table(&self) -> MdfTable {
        let symbols: Vec<&str> = self.elements.iter().map(ElementReservoir::symbol).collect();
        self.mdf.to_table(&symbols)
    }

    /// The zone's current state.
    pub fn snapshot(&self) -> ZoneSnapshot {
        let n = self.timestep;
        let gas = self.ism.gas_mass();
        let enhancement = self.config.enhancement.value(n);
        let elements = self
            .elements
            .iter()
            .zip(&self.config.elements)
            .map(|(element, config)| {
                let z = element.mass() / gas;
                let enh = if element.is_primordial() { 1.0 } else { enhancement };
                (
                    element.symbol().to_string(),
                    ElementSnapshot {
                        mass: element.mass(),
                        inflow_metallicity: config.infall_metallicity.value(n),
                        outflow_metallicity: enh * z,
                    },
                )
            })
            .collect();
        ZoneSnapshot {
            time: self.time(),
            gas_mass: gas,
            stellar_mass: self.stellar_mass,
            star_formation_rate: self.ism.star_formation_rate(),
            infall_rate: self.ism.infall_rate(),
            outflow_rate: self.ism.outflow_rate(),
            mass_loading: self.config.mass_loading.value(n),
            elements,
        }
    }
}

impl std::fmt::Debug for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zone")
            .field("name", &self.config.name)
            .field("state", &self.state)
            .field("timestep", &self.timestep)
            .field("gas_mass", &self.ism.gas_mass())
            .finish_non_exhaustive()
    }
}
