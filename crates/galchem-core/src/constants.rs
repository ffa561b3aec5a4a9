//! Physical and bookkeeping constants shared across the workspace.
//!
//! Time is measured in Gyr, masses in solar masses, and rates in solar
//! masses per year. A rate sustained for one timestep `dt` moves
//! `rate * dt * YEARS_PER_GYR` solar masses.

/// Years per Gyr; converts a per-year rate over a Gyr timestep into a mass.
pub const YEARS_PER_GYR: f64 = 1e9;

/// Smallest gas mass a zone may hold, in solar masses.
///
/// Gas masses below this floor are clamped silently after every update
/// and every migration.
pub const GAS_MASS_FLOOR: f64 = 1e-12;

/// Interval (Gyr) over which user-supplied migration probabilities are quoted.
///
/// A probability `p` per 10 Myr becomes `p * dt / MIGRATION_REFERENCE_INTERVAL`
/// for a timestep of `dt` Gyr.
pub const MIGRATION_REFERENCE_INTERVAL: f64 = 0.01;

/// Extra timesteps allocated past the final output time.
pub const TIMESTEP_BUFFER: usize = 10;

/// Horizon (Gyr) over which delay-time distributions are normalized.
pub const IA_NORMALIZATION_HORIZON: f64 = 15.0;
