//! Tracer particles: quantized stellar populations that migrate.
//!
//! Every tracer is created once, keeps its mass and birth coordinates for
//! the rest of the run, and only ever changes its current zone. The
//! population is an append-only vector; a [`TracerId`] is an index into it.

use galchem_core::{buffer, ElementValues, SetupError, TracerId, ZoneId};

/// One quantized stellar population.
#[derive(Clone, Debug, PartialEq)]
pub struct Tracer {
    /// Stellar mass at formation, solar masses.
    pub mass: f64,
    /// Zone the population formed in.
    pub origin_zone: ZoneId,
    /// Timestep the population formed at.
    pub origin_timestep: usize,
    /// Zone the population currently occupies.
    pub zone: ZoneId,
    /// Precomputed zone at each timestep from formation, for replayed
    /// migration. Entry 0 is the origin zone.
    pub history: Option<Vec<ZoneId>>,
}

impl Tracer {
    /// A tracer born in `zone` at `timestep`.
    pub fn new(mass: f64, zone: ZoneId, timestep: usize) -> Self {
        Self {
            mass,
            origin_zone: zone,
            origin_timestep: timestep,
            zone,
            history: None,
        }
    }

    /// Age in timesteps at `timestep`.
    pub fn age(&self, timestep: usize) -> usize {
        timestep.saturating_sub(self.origin_timestep)
    }
}

/// The append-only tracer population of one multi-zone run.
#[derive(Clone, Debug, Default)]
pub struct TracerPopulation {
    tracers: Vec<Tracer>,
}

impl TracerPopulation {
    /// An empty population with room for `capacity` tracers.
    pub fn with_capacity(capacity: usize) -> Result<Self, SetupError> {
        Ok(Self {
            tracers: buffer::with_capacity(capacity, "tracer population")?,
        })
    }

    /// Append a tracer, returning its id.
    pub fn push(&mut self, tracer: Tracer) -> TracerId {
        let id = TracerId(self.tracers.len() as u64);
        self.tracers.push(tracer);
        id
    }

    /// Number of live tracers.
    pub fn len(&self) -> usize {
        self.tracers.len()
    }

    /// Whether there are no tracers.
    pub fn is_empty(&self) -> bool {
        self.tracers.is_empty()
    }

    /// Every tracer, in injection order.
    pub fn iter(&self) -> std::slice::Iter<'_, Tracer> {
        self.tracers.iter()
    }

    /// Mutable access to every tracer, in injection order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Tracer> {
        self.tracers.iter_mut()
    }

    /// Tracers currently in `zone`.
    pub fn count_in_zone(&self, zone: ZoneId) -> usize {
        self.tracers.iter().filter(|t| t.zone == zone).count()
    }

    /// Drop every tracer and the backing storage.
    pub fn release(&mut self) {
        self.tracers = Vec::new();
    }
}

/// A tracer as reported at the end of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct TracerRecord {
    /// Formation time, Gyr.
    pub formation_time: f64,
    /// Zone the population formed in.
    pub origin_zone: ZoneId,
    /// Zone the population ended in.
    pub final_zone: ZoneId,
    /// Stellar mass at formation, solar masses.
    pub mass: f64,
    /// Metallicity by mass of each element at formation.
    pub metallicity: ElementValues,
}
