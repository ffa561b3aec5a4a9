//! Multi-zone chemical evolution.
//!
//! A [`MultiZone`] owns several [`Zone`](galchem_zone::Zone)s, moves gas and
//! elements between them through a normalized [`MigrationMatrix`], and
//! follows the stars they form as [`Tracer`] particles. Delayed enrichment
//! (SN Ia, AGB, recycling, custom channels) is evaluated by scanning the
//! tracers and depositing each population's production into the zone it
//! occupies at the time.
//!
//! # Example
//!
//! ```
//! use galchem_multizone::{MigrationTable, MultiZone, MultiZoneConfig};
//! use galchem_zone::{ElementConfig, IsmMode, ZoneConfig};
//!
//! let zone = |name: &str| {
//!     ZoneConfig::new(name, IsmMode::from_name("sfr", 1.0).unwrap())
//!         .with_dt(0.05)
//!         .with_output_times(vec![0.0, 0.5])
//!         .with_element(ElementConfig::new("o", 5.72e-3).with_ccsne(|_: f64| 0.015, 1.0))
//! };
//! let config = MultiZoneConfig::new("disk", vec![zone("inner"), zone("outer")])
//!     .with_tracer_migration(MigrationTable::from_fn(2, |i, j| if i != j { 0.05 } else { 0.0 }))
//!     .with_seed(42);
//! let mut model = MultiZone::new(config).unwrap();
//! model.setup().unwrap();
//! let output = model.evolve().unwrap();
//! assert_eq!(output.zones.len(), 2);
//! assert_eq!(output.tracers.len(), 11 * 2);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod migration;
pub mod multizone;
pub mod strategy;
pub mod tracer;

pub use config::{EvolutionMode, MultiZoneConfig};
pub use metrics::StepMetrics;
pub use migration::{MassTransfer, MigrationMatrix, MigrationTable};
pub use multizone::{MultiZone, MultiZoneOutput};
pub use strategy::{
    draw, MigrationStrategy, ReplayMigration, StochasticMigration, TracerMigration,
};
pub use tracer::{Tracer, TracerPopulation, TracerRecord};
