//! Error types for the galchem framework.
//!
//! Failures split into two classes: configuration or allocation problems
//! caught before the first timestep ([`SetupError`]), and problems raised
//! while advancing a running model ([`StepError`]). Numerical floors
//! (negative element mass, vanishing gas mass, negative rates) are clamped
//! silently and are not errors.

use std::error::Error;
use std::fmt;

use crate::id::ZoneId;
use crate::state::RunState;

/// Errors detected while configuring or setting up a model.
///
/// Returned before any timestep executes. Any buffers allocated by the
/// failing setup attempt have already been released when this is returned.
#[derive(Clone, Debug, PartialEq)]
pub enum SetupError {
    /// Timestep size is NaN, infinite, zero, or negative.
    InvalidTimestep {
        /// The offending value.
        value: f64,
    },
    /// No output times were requested.
    NoOutputTimes,
    /// Output times are not finite, non-negative, and strictly ascending.
    UnsortedOutputTimes {
        /// Index of the first offending output time.
        index: usize,
    },
    /// A sampled series is shorter than the run it drives.
    SeriesTooShort {
        /// Which series.
        name: String,
        /// Samples the run reads.
        required: usize,
        /// Samples supplied.
        supplied: usize,
    },
    /// An ISM driving mode name outside `gas`, `ifr`, `sfr`.
    UnrecognizedMode {
        /// The rejected name.
        mode: String,
    },
    /// An entrainment fraction outside `[0, 1]`.
    InvalidEntrainment {
        /// Element symbol.
        element: String,
        /// Which enrichment source.
        source: String,
        /// The offending value.
        value: f64,
    },
    /// Two elements share a symbol.
    DuplicateElement {
        /// The repeated symbol.
        symbol: String,
    },
    /// A scalar parameter or series sample is outside its valid range.
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Description of the valid range.
        reason: String,
    },
    /// MDF bin edges are too few or not strictly ascending.
    InvalidBins {
        /// Description of the problem.
        reason: String,
    },
    /// A zone's outgoing migration probability exceeds 1 after normalization.
    MigrationOverflow {
        /// Timestep of the offending row.
        timestep: usize,
        /// Origin zone of the offending row.
        zone: ZoneId,
        /// The normalized outgoing total.
        total: f64,
    },
    /// A migration table does not match the zone count.
    MigrationShape {
        /// Description of the mismatch.
        reason: String,
    },
    /// Zones in one model disagree on timestep, outputs, or elements.
    ZoneMismatch {
        /// The first zone that disagrees with zone 0.
        zone: ZoneId,
        /// Description of the mismatch.
        reason: String,
    },
    /// A multi-zone model with no zones.
    NoZones,
    /// Tracers per zone per timestep is zero.
    InvalidTracerCount,
    /// A timestep buffer could not be allocated.
    AllocationFailed {
        /// Which buffer.
        buffer: &'static str,
    },
    /// `setup()` was called while the engine was running or finished.
    InvalidState {
        /// The engine's state at the time of the call.
        state: RunState,
    },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimestep { value } => {
                write!(f, "timestep must be finite and positive, got {value}")
            }
            Self::NoOutputTimes => write!(f, "no output times requested"),
            Self::UnsortedOutputTimes { index } => write!(
                f,
                "output time {index} is not finite, non-negative, and strictly ascending"
            ),
            Self::SeriesTooShort {
                name,
                required,
                supplied,
            } => write!(
                f,
                "series '{name}' has {supplied} samples but the run reads {required}"
            ),
            Self::UnrecognizedMode { mode } => {
                write!(f, "unrecognized ISM mode '{mode}' (expected gas, ifr, or sfr)")
            }
            Self::InvalidEntrainment {
                element,
                source,
                value,
            } => write!(
                f,
                "{source} entrainment for '{element}' must be in [0, 1], got {value}"
            ),
            Self::DuplicateElement { symbol } => write!(f, "element '{symbol}' listed twice"),
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter '{name}': {reason}")
            }
            Self::InvalidBins { reason } => write!(f, "invalid MDF bins: {reason}"),
            Self::MigrationOverflow {
                timestep,
                zone,
                total,
            } => write!(
                f,
                "zone {zone} migrates a fraction {total} > 1 at timestep {timestep}"
            ),
            Self::MigrationShape { reason } => write!(f, "migration table: {reason}"),
            Self::ZoneMismatch { zone, reason } => write!(f, "zone {zone}: {reason}"),
            Self::NoZones => write!(f, "multi-zone model has no zones"),
            Self::InvalidTracerCount => write!(f, "tracers per zone must be at least 1"),
            Self::AllocationFailed { buffer } => write!(f, "failed to allocate {buffer}"),
            Self::InvalidState { state } => write!(f, "cannot set up an engine that is {state}"),
        }
    }
}

impl Error for SetupError {}

/// Errors raised while advancing a model by one timestep.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// The engine is not in the `Running` state.
    NotRunning {
        /// The engine's state at the time of the call.
        state: RunState,
    },
    /// A non-finite value appeared in the zone state after an update.
    NonFinite {
        /// Which quantity.
        quantity: String,
        /// Name of the zone.
        zone: String,
        /// Timestep being advanced.
        timestep: usize,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRunning { state } => write!(f, "engine is {state}, not running"),
            Self::NonFinite {
                quantity,
                zone,
                timestep,
            } => write!(
                f,
                "non-finite {quantity} in zone '{zone}' at timestep {timestep}"
            ),
        }
    }
}

impl Error for StepError {}
