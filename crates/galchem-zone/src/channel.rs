//! Custom delayed enrichment channels.

use std::sync::Arc;

use galchem_core::{MetallicityYield, SetupError};

use crate::config::ChannelConfig;
use crate::ssp::delay_kernel;

/// A channel with its rate kernel tabulated on the zone's timestep grid.
#[derive(Clone)]
pub struct Channel {
    name: String,
    yield_fn: Arc<dyn MetallicityYield>,
    kernel: Vec<f64>,
    entrainment: f64,
}

impl Channel {
    /// Tabulate `config`'s rate over `len` ages.
    pub fn build(config: &ChannelConfig, dt: f64, len: usize) -> Result<Self, SetupError> {
        let kernel = delay_kernel(config.rate.as_ref(), 0.0, dt, len, "channel kernel")?;
        Ok(Self {
            name: config.name.clone(),
            yield_fn: Arc::clone(&config.yield_fn),
            kernel,
            entrainment: config.entrainment,
        })
    }

    /// Mass produced over one step by `mass` solar masses of stars aged
    /// `age` timesteps, formed at total metallicity `z`.
    pub fn produced(&self, mass: f64, age: usize, z: f64) -> f64 {
        match self.kernel.get(age) {
            Some(&rate) if rate > 0.0 => mass * rate * self.yield_fn.yield_at(z),
            _ => 0.0,
        }
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fraction of the product retained in the zone.
    pub fn entrainment(&self) -> f64 {
        self.entrainment
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("kernel_len", &self.kernel.len())
            .field("entrainment", &self.entrainment)
            .finish()
    }
}
