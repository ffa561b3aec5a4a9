//! Reference collaborators for galchem engines.
//!
//! The engines consume yields and stellar-population bookkeeping only
//! through the traits in `galchem_core::traits`. This crate provides
//! ready-made implementations:
//!
//! - [`MetallicityGrid`]: tabulated yield vs metallicity (CCSNe, SNe Ia).
//! - [`AgbGrid`]: tabulated AGB yield vs stellar mass and metallicity.
//! - [`Imf`]: Salpeter and Kroupa initial mass functions.
//! - [`SspModel`]: return fraction, main-sequence mass fraction, and
//!   turnoff mass of a simple stellar population.
//! - [`IaDelay`]: SNe Ia delay-time distributions.
//! - [`quadrature`]: Simpson integration with an explicit context.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dtd;
pub mod grid;
pub mod imf;
pub mod quadrature;
pub mod ssp;

pub use dtd::IaDelay;
pub use grid::{AgbGrid, GridError, MetallicityGrid};
pub use imf::Imf;
pub use quadrature::{simpson, Quadrature, QuadratureSettings};
pub use ssp::SspModel;
