//! Tabulated nucleosynthetic yields.
//!
//! [`MetallicityGrid`] holds a yield sampled at a set of metallicities,
//! [`AgbGrid`] a yield sampled on a (stellar mass, metallicity) grid.
//! Both interpolate linearly and extrapolate outside the grid.

use std::error::Error;
use std::fmt;

use galchem_core::{AgbYield, MetallicityYield};

// ── GridError ──────────────────────────────────────────────────────

/// Errors detected while constructing a yield grid.
#[derive(Clone, Debug, PartialEq)]
pub enum GridError {
    /// An axis has no points.
    Empty {
        /// Which axis.
        axis: &'static str,
    },
    /// The yield table does not match the axis lengths.
    LengthMismatch {
        /// Number of yields the axes imply.
        expected: usize,
        /// Number of yields supplied.
        actual: usize,
    },
    /// Axis values are not strictly ascending.
    NotAscending {
        /// Which axis.
        axis: &'static str,
        /// Index of the first out-of-order value.
        index: usize,
    },
    /// An axis value or yield is NaN or infinite.
    NonFinite {
        /// Which axis, or `"yield"`.
        axis: &'static str,
        /// Index of the offending value.
        index: usize,
    },
    /// The AGB mass limits do not bracket the mass axis.
    MassLimits {
        /// Configured lower limit.
        lower: f64,
        /// Configured upper limit.
        upper: f64,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { axis } => write!(f, "{axis} axis is empty"),
            Self::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} yields, got {actual}")
            }
            Self::NotAscending { axis, index } => {
                write!(f, "{axis} axis is not strictly ascending at index {index}")
            }
            Self::NonFinite { axis, index } => {
                write!(f, "non-finite {axis} value at index {index}")
            }
            Self::MassLimits { lower, upper } => write!(
                f,
                "mass limits [{lower}, {upper}] do not bracket the mass axis"
            ),
        }
    }
}

impl Error for GridError {}

fn check_axis(axis: &'static str, values: &[f64]) -> Result<(), GridError> {
    if values.is_empty() {
        return Err(GridError::Empty { axis });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(GridError::NonFinite { axis, index });
    }
    if let Some(index) = values.windows(2).position(|w| w[1] <= w[0]) {
        return Err(GridError::NotAscending {
            axis,
            index: index + 1,
        });
    }
    Ok(())
}

fn check_values(values: &[f64], expected: usize) -> Result<(), GridError> {
    if values.len() != expected {
        return Err(GridError::LengthMismatch {
            expected,
            actual: values.len(),
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(GridError::NonFinite {
            axis: "yield",
            index,
        });
    }
    Ok(())
}

/// Index `i` of the segment `[axis[i], axis[i + 1]]` used for `x`.
///
/// Values below or above the axis use the first or last segment, so the
/// caller extrapolates from the two nearest points. Requires `axis.len() >= 2`.
fn segment(axis: &[f64], x: f64) -> usize {
    let last = axis.len() - 2;
    match axis.partition_point(|&a| a <= x) {
        0 => 0,
        p => (p - 1).min(last),
    }
}

fn lerp(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

// ── MetallicityGrid ────────────────────────────────────────────────

/// Yield as a piecewise-linear function of metallicity.
///
/// Outside the grid the yield is extrapolated linearly from the bottom
/// or top two grid points. A single-point grid is constant.
#[derive(Clone, Debug, PartialEq)]
pub struct MetallicityGrid {
    metallicities: Vec<f64>,
    yields: Vec<f64>,
}

impl MetallicityGrid {
    /// Build a grid from ascending metallicities and matching yields.
    pub fn new(metallicities: Vec<f64>, yields: Vec<f64>) -> Result<Self, GridError> {
        check_axis("metallicity", &metallicities)?;
        check_values(&yields, metallicities.len())?;
        Ok(Self {
            metallicities,
            yields,
        })
    }

    /// A metallicity-independent yield.
    pub fn constant(value: f64) -> Result<Self, GridError> {
        Self::new(vec![0.0], vec![value])
    }

    /// Grid metallicities.
    pub fn metallicities(&self) -> &[f64] {
        &self.metallicities
    }

    /// Grid yields.
    pub fn yields(&self) -> &[f64] {
        &self.yields
    }

    /// Yield at metallicity `z`.
    pub fn evaluate(&self, z: f64) -> f64 {
        if self.metallicities.len() == 1 {
            return self.yields[0];
        }
        let i = segment(&self.metallicities, z);
        lerp(
            self.metallicities[i],
            self.yields[i],
            self.metallicities[i + 1],
            self.yields[i + 1],
            z,
        )
    }
}

impl MetallicityYield for MetallicityGrid {
    fn yield_at(&self, z: f64) -> f64 {
        self.evaluate(z)
    }
}

// ── AgbGrid ────────────────────────────────────────────────────────

/// AGB yield sampled on a (stellar mass, metallicity) grid.
///
/// Yields are stored mass-major: `yields[i * n_z + j]` belongs to
/// `masses[i]` and `metallicities[j]`. Below the lowest grid mass the
/// yield falls linearly to zero at the lower mass limit; above the
/// highest grid mass it falls linearly to zero at the upper limit.
/// Beyond either limit the yield is zero. In metallicity the grid is
/// extrapolated linearly from the two nearest grid points.
#[derive(Clone, Debug, PartialEq)]
pub struct AgbGrid {
    masses: Vec<f64>,
    metallicities: Vec<f64>,
    yields: Vec<f64>,
    lower_mass: f64,
    upper_mass: f64,
}

impl AgbGrid {
    /// Default lower stellar-mass limit for AGB enrichment, in solar masses.
    pub const DEFAULT_LOWER_MASS: f64 = 0.08;
    /// Default upper stellar-mass limit for AGB enrichment, in solar masses.
    pub const DEFAULT_UPPER_MASS: f64 = 8.0;

    /// Build a grid with the default mass limits.
    pub fn new(
        masses: Vec<f64>,
        metallicities: Vec<f64>,
        yields: Vec<f64>,
    ) -> Result<Self, GridError> {
        check_axis("mass", &masses)?;
        check_axis("metallicity", &metallicities)?;
        check_values(&yields, masses.len() * metallicities.len())?;
        let lower_mass = Self::DEFAULT_LOWER_MASS.min(masses[0]);
        let upper_mass = Self::DEFAULT_UPPER_MASS.max(masses[masses.len() - 1]);
        Ok(Self {
            masses,
            metallicities,
            yields,
            lower_mass,
            upper_mass,
        })
    }

    /// Replace the mass limits at which the yield is tied to zero.
    pub fn with_mass_limits(mut self, lower: f64, upper: f64) -> Result<Self, GridError> {
        let first = self.masses[0];
        let last = self.masses[self.masses.len() - 1];
        if !(lower.is_finite() && upper.is_finite() && lower <= first && upper >= last) {
            return Err(GridError::MassLimits { lower, upper });
        }
        self.lower_mass = lower;
        self.upper_mass = upper;
        Ok(self)
    }

    /// Lower and upper mass limits.
    pub fn mass_limits(&self) -> (f64, f64) {
        (self.lower_mass, self.upper_mass)
    }

    /// Yield of the grid mass `masses[i]` at metallicity `z`.
    fn at_grid_mass(&self, i: usize, z: f64) -> f64 {
        let n_z = self.metallicities.len();
        let row = &self.yields[i * n_z..(i + 1) * n_z];
        if n_z == 1 {
            return row[0];
        }
        let j = segment(&self.metallicities, z);
        lerp(
            self.metallicities[j],
            row[j],
            self.metallicities[j + 1],
            row[j + 1],
            z,
        )
    }

    /// Yield of stars of initial mass `mass` at metallicity `z`.
    pub fn evaluate(&self, mass: f64, z: f64) -> f64 {
        if !mass.is_finite() || mass <= self.lower_mass || mass >= self.upper_mass {
            return 0.0;
        }
        let n_m = self.masses.len();
        let first = self.masses[0];
        let last = self.masses[n_m - 1];
        if mass < first {
            return lerp(self.lower_mass, 0.0, first, self.at_grid_mass(0, z), mass);
        }
        if mass > last {
            return lerp(last, self.at_grid_mass(n_m - 1, z), self.upper_mass, 0.0, mass);
        }
        if n_m == 1 {
            return self.at_grid_mass(0, z);
        }
        let i = segment(&self.masses, mass);
        lerp(
            self.masses[i],
            self.at_grid_mass(i, z),
            self.masses[i + 1],
            self.at_grid_mass(i + 1, z),
            mass,
        )
    }
}

impl AgbYield for AgbGrid {
    fn yield_at(&self, turnoff_mass: f64, z: f64) -> f64 {
        self.evaluate(turnoff_mass, z)
    }
}
