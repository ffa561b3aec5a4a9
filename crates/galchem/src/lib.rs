//! galchem: galactic chemical evolution.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all galchem sub-crates. For most users, adding `galchem` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use galchem::prelude::*;
//!
//! let oxygen = ElementConfig::new("o", 5.72e-3).with_ccsne(|_: f64| 0.015, 1.0);
//! let zone = |name: &str| {
//!     ZoneConfig::new(name, IsmMode::from_name("ifr", 5.0).unwrap())
//!         .with_output_times(vec![0.0, 0.25, 0.5])
//!         .with_element(oxygen.clone())
//! };
//!
//! // One zone on its own.
//! let mut single = Zone::new(zone("solo")).unwrap();
//! single.setup().unwrap();
//! let output = single.evolve().unwrap();
//! assert_eq!(output.snapshots.len(), 3);
//!
//! // Two zones exchanging gas and stars.
//! let config = MultiZoneConfig::new("pair", vec![zone("inner"), zone("outer")])
//!     .with_gas_migration(MigrationTable::from_fn(2, |i, j| if i != j { 0.01 } else { 0.0 }))
//!     .with_tracer_migration(MigrationTable::from_fn(2, |i, j| if i != j { 0.05 } else { 0.0 }));
//! let mut model = MultiZone::new(config).unwrap();
//! model.setup().unwrap();
//! let output = model.evolve().unwrap();
//! assert_eq!(output.zones["inner"].snapshots.len(), 3);
//! assert_eq!(model.state(), RunState::Finished);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `galchem-core` | IDs, series, traits, errors, status codes |
//! | [`yields`] | `galchem-yields` | Yield grids, IMFs, SSP model, SN Ia delays |
//! | [`zone`] | `galchem-zone` | Single-zone engine, MDFs, snapshots |
//! | [`multizone`] | `galchem-multizone` | Migration, tracer particles, multi-zone engine |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and errors (`galchem-core`).
///
/// Contains the collaborator traits ([`types::MetallicityYield`],
/// [`types::AgbYield`], [`types::StellarPopulation`],
/// [`types::DelayTimeDistribution`]) and the status codes returned to
/// callers ([`types::ChemStatus`]).
pub use galchem_core as types;

/// Reference yield and stellar population collaborators (`galchem-yields`).
pub use galchem_yields as yields;

/// The single-zone engine (`galchem-zone`).
///
/// [`zone::Zone`] evolves one well-mixed region.
pub use galchem_zone as zone;

/// The multi-zone engine (`galchem-multizone`).
///
/// [`multizone::MultiZone`] couples zones through gas migration and
/// tracer particles.
pub use galchem_multizone as multizone;

/// Common imports for typical galchem usage.
///
/// ```rust
/// use galchem::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use galchem_core::{
        AgbYield, ChemStatus, DelayTimeDistribution, MetallicityYield, RunState, Series,
        StellarPopulation, TracerId, ZoneId,
    };

    // Errors
    pub use galchem_core::{SetupError, StepError};

    // Collaborators
    pub use galchem_yields::{AgbGrid, IaDelay, Imf, MetallicityGrid, SspModel};

    // Single zone
    pub use galchem_zone::{
        ElementConfig, IsmMode, MdfTable, Recycling, StarFormationLaw, Zone, ZoneConfig,
        ZoneOutput, ZoneSnapshot,
    };

    // Multi-zone
    pub use galchem_multizone::{
        EvolutionMode, MigrationStrategy, MigrationTable, MultiZone, MultiZoneConfig,
        MultiZoneOutput, StepMetrics, TracerRecord,
    };
}
