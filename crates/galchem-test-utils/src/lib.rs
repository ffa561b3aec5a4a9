//! Test fixtures for galchem development.
//!
//! Provides toy stellar populations ([`ToyPopulation`], [`NoStars`]),
//! element presets with constant yields, and ready-made single- and
//! multi-zone configurations small enough to run in unit tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::*;
