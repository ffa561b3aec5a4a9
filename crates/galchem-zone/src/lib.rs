//! Single-zone chemical evolution engine.
//!
//! A [`Zone`] evolves the gas, star formation, and per-element ISM masses
//! of one well-mixed region on a fixed timestep grid, and accumulates the
//! metallicity distribution of the stars it forms.
//!
//! # Example
//!
//! ```
//! use galchem_zone::{ElementConfig, IsmMode, Zone, ZoneConfig};
//!
//! let config = ZoneConfig::new("disk", IsmMode::from_name("ifr", 9.1).unwrap())
//!     .with_output_times(vec![0.0, 0.5, 1.0])
//!     .with_element(ElementConfig::new("o", 5.72e-3).with_ccsne(|_: f64| 0.015, 1.0));
//! let mut zone = Zone::new(config).unwrap();
//! zone.setup().unwrap();
//! let output = zone.evolve().unwrap();
//! assert_eq!(output.snapshots.len(), 3);
//! assert!(output.snapshots[2].elements["o"].mass > 0.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod config;
pub mod delayed;
pub mod element;
pub mod ism;
pub mod mdf;
pub mod output;
pub mod snapshot;
pub mod ssp;
pub mod zone;

pub use channel::Channel;
pub use config::{
    default_bins, default_output_times, AgbSource, ChannelConfig, ElementConfig, IsmMode,
    Recycling, SourceYield, StarFormationLaw, ZoneConfig,
};
pub use delayed::{DelayedElementYields, DelayedYields};
pub use element::{ElementReservoir, StepContext};
pub use ism::IsmReservoir;
pub use mdf::{abundance_ratio, MdfAccumulator};
pub use output::{output_step, OutputSchedule};
pub use snapshot::{ElementSnapshot, MdfTable, ZoneOutput, ZoneSnapshot};
pub use ssp::{delay_kernel, SspTables};
pub use zone::Zone;
