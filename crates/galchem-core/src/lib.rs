//! Core types and traits for the galchem chemical-evolution framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared by the single-zone and multi-zone
//! engines: identifiers, time series, physical constants, the traits
//! implemented by yield and stellar-population collaborators, the error
//! taxonomy, and the stable status codes returned to callers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod constants;
pub mod error;
pub mod id;
pub mod series;
pub mod state;
pub mod status;
pub mod traits;

pub use constants::{
    GAS_MASS_FLOOR, IA_NORMALIZATION_HORIZON, MIGRATION_REFERENCE_INTERVAL, TIMESTEP_BUFFER,
    YEARS_PER_GYR,
};
pub use error::{SetupError, StepError};
pub use id::{ElementValues, TracerId, ZoneId};
pub use series::Series;
pub use state::RunState;
pub use status::ChemStatus;
pub use traits::{AgbYield, DelayTimeDistribution, MetallicityYield, StellarPopulation};
