//! Strongly-typed identifiers and the [`ElementValues`] type alias.

use smallvec::SmallVec;
use std::fmt;

/// Identifies a zone within a multi-zone model.
///
/// `ZoneId(n)` corresponds to the n-th zone in the model configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub u32);

impl ZoneId {
    /// The zone's position in the model's zone list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ZoneId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Stable handle to a tracer particle.
///
/// A tracer's identity is its position in the population's backing
/// vector, assigned at injection and never reused. The vector may
/// reallocate as it grows, so tracers are never referred to by address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TracerId(pub u64);

impl TracerId {
    /// The tracer's position in the population vector.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TracerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TracerId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// One value per tracked element, in configuration order.
///
/// Uses `SmallVec<[f64; 8]>` so that the common case of a handful of
/// tracked elements never touches the heap inside per-timestep loops.
pub type ElementValues = SmallVec<[f64; 8]>;
