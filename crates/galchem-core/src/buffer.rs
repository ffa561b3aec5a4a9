//! Fallible allocation of timestep-indexed buffers.
//!
//! Every buffer sized by the run length goes through these helpers so an
//! oversized run surfaces as [`SetupError::AllocationFailed`] instead of
//! aborting the process.

use crate::error::SetupError;

/// An empty vector with room for exactly `capacity` elements.
pub fn with_capacity<T>(capacity: usize, buffer: &'static str) -> Result<Vec<T>, SetupError> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|_| SetupError::AllocationFailed { buffer })?;
    Ok(v)
}

/// A vector of `len` copies of `value`, allocated fallibly.
pub fn filled<T: Clone>(len: usize, value: T, buffer: &'static str) -> Result<Vec<T>, SetupError> {
    let mut v = with_capacity(len, buffer)?;
    v.resize(len, value);
    Ok(v)
}
