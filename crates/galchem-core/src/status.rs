//! Stable status codes for callers that work with integer return codes.
//!
//! [`ChemStatus`] is a `repr(i32)` enum: `Ok = 0`, every failure negative.
//! Conversions from [`SetupError`] and [`StepError`] are provided so the
//! immediate caller can check a single integer before proceeding.

use crate::error::{SetupError, StepError};

/// Status code returned by every fallible operation. Values are stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChemStatus {
    /// Success.
    Ok = 0,
    /// Timestep, output times, series, or scalar parameter invalid.
    InvalidConfig = -1,
    /// ISM driving mode outside the closed set of three.
    UnrecognizedMode = -2,
    /// Migration row sum exceeds 1 after normalization.
    MigrationOverflow = -3,
    /// Migration table shape does not match the zone count.
    MigrationShape = -4,
    /// Timestep buffer allocation failed.
    AllocationFailed = -5,
    /// Operation not valid in the engine's current state.
    InvalidState = -6,
    /// A non-finite value appeared during an update.
    NonFinite = -7,
}

impl From<&SetupError> for ChemStatus {
    fn from(e: &SetupError) -> Self {
        match e {
            SetupError::UnrecognizedMode { .. } => ChemStatus::UnrecognizedMode,
            SetupError::MigrationOverflow { .. } => ChemStatus::MigrationOverflow,
            SetupError::MigrationShape { .. } => ChemStatus::MigrationShape,
            SetupError::AllocationFailed { .. } => ChemStatus::AllocationFailed,
            SetupError::InvalidState { .. } => ChemStatus::InvalidState,
            SetupError::InvalidTimestep { .. }
            | SetupError::NoOutputTimes
            | SetupError::UnsortedOutputTimes { .. }
            | SetupError::SeriesTooShort { .. }
            | SetupError::InvalidEntrainment { .. }
            | SetupError::DuplicateElement { .. }
            | SetupError::InvalidParameter { .. }
            | SetupError::InvalidBins { .. }
            | SetupError::ZoneMismatch { .. }
            | SetupError::NoZones
            | SetupError::InvalidTracerCount => ChemStatus::InvalidConfig,
        }
    }
}

impl From<&StepError> for ChemStatus {
    fn from(e: &StepError) -> Self {
        match e {
            StepError::NotRunning { .. } => ChemStatus::InvalidState,
            StepError::NonFinite { .. } => ChemStatus::NonFinite,
        }
    }
}
