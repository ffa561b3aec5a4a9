//! Multi-zone model configuration.

use galchem_core::{SetupError, ZoneId};
use galchem_zone::{ElementConfig, ZoneConfig};

use crate::migration::MigrationTable;
use crate::strategy::MigrationStrategy;

/// How zones and tracers are coupled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvolutionMode {
    /// Gas migrates between zones and delayed enrichment is deposited by
    /// tracers into the zone they currently occupy.
    #[default]
    Full,
    /// Every zone evolves on its own; tracers only record where stars end
    /// up, for the final roster and MDFs.
    Simple,
}

impl EvolutionMode {
    /// Tracer injections beyond one per completed timestep.
    ///
    /// After `T` completed timesteps a run holds
    /// `(T + injection_offset()) * zones * tracers_per_zone` tracers.
    pub fn injection_offset(self) -> usize {
        match self {
            Self::Full => 1,
            Self::Simple => 0,
        }
    }
}

/// Complete configuration of a multi-zone model.
#[derive(Clone, Debug)]
pub struct MultiZoneConfig {
    /// Model name used in logs.
    pub name: String,
    /// Per-zone configurations. Every zone must share the timestep,
    /// output times, and element list.
    pub zones: Vec<ZoneConfig>,
    /// Gas and element migration probabilities per 10 Myr.
    pub gas_migration: MigrationTable,
    /// Tracer migration probabilities per 10 Myr.
    pub tracer_migration: MigrationTable,
    /// Tracers injected per zone per timestep. Default: 1.
    pub tracers_per_zone: usize,
    /// Tracer migration strategy. Default: stochastic.
    pub strategy: MigrationStrategy,
    /// Zone coupling. Default: full.
    pub mode: EvolutionMode,
    /// Seed of the tracer migration generator.
    pub seed: u64,
}

impl MultiZoneConfig {
    /// A model of `zones` with no migration.
    pub fn new(name: impl Into<String>, zones: Vec<ZoneConfig>) -> Self {
        Self {
            name: name.into(),
            zones,
            gas_migration: MigrationTable::None,
            tracer_migration: MigrationTable::None,
            tracers_per_zone: 1,
            strategy: MigrationStrategy::default(),
            mode: EvolutionMode::default(),
            seed: 0,
        }
    }

    /// Set the gas migration table.
    pub fn with_gas_migration(mut self, table: MigrationTable) -> Self {
        self.gas_migration = table;
        self
    }

    /// Set the tracer migration table.
    pub fn with_tracer_migration(mut self, table: MigrationTable) -> Self {
        self.tracer_migration = table;
        self
    }

    /// Set the number of tracers per zone per timestep.
    pub fn with_tracers_per_zone(mut self, n: usize) -> Self {
        self.tracers_per_zone = n;
        self
    }

    /// Set the tracer migration strategy.
    pub fn with_strategy(mut self, strategy: MigrationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the evolution mode.
    pub fn with_mode(mut self, mode: EvolutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the migration seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Timestep size shared by every zone.
    pub fn dt(&self) -> f64 {
        self.zones.first().map_or(0.0, |z| z.dt)
    }

    /// Timesteps in a complete run.
    pub fn timestep_count(&self) -> usize {
        self.zones.first().map_or(0, ZoneConfig::timestep_count)
    }

    /// Check every zone and their mutual consistency.
    ///
    /// Migration tables are checked at setup, where the run length is
    /// known.
    pub fn validate(&self) -> Result<(), SetupError> {
        let Some(first) = self.zones.first() else {
            return Err(SetupError::NoZones);
        };
        if self.tracers_per_zone == 0 {
            return Err(SetupError::InvalidTracerCount);
        }
        for zone in &self.zones {
            zone.validate()?;
        }
        let symbols = |z: &ZoneConfig| -> Vec<String> {
            z.elements.iter().map(|e| e.symbol.clone()).collect()
        };
        // Tracers carry channel production between zones by position.
        fn channels(e: &ElementConfig) -> Vec<&str> {
            e.channels.iter().map(|c| c.name.as_str()).collect()
        }
        let reference = symbols(first);
        for (i, zone) in self.zones.iter().enumerate().skip(1) {
            let mismatch = |reason: &str| SetupError::ZoneMismatch {
                zone: ZoneId(i as u32),
                reason: reason.to_string(),
            };
            if zone.dt != first.dt {
                return Err(mismatch("timestep differs from zone 0"));
            }
            if zone.output_times != first.output_times {
                return Err(mismatch("output times differ from zone 0"));
            }
            if symbols(zone) != reference {
                return Err(mismatch("element list differs from zone 0"));
            }
            for (element, base) in zone.elements.iter().zip(&first.elements) {
                if channels(element) != channels(base) {
                    return Err(mismatch(&format!(
                        "channels of element '{}' differ from zone 0",
                        element.symbol
                    )));
                }
            }
            if self.zones[..i].iter().any(|z| z.name == zone.name) {
                return Err(mismatch("zone name is already taken"));
            }
        }
        Ok(())
    }
}
