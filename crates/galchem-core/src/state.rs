//! Engine lifecycle state.

use std::fmt;

/// Lifecycle of a single-zone or multi-zone engine.
///
/// ```text
/// Uninitialized --setup()--> Running --(final output passed)--> Finished
///       ^   \                   |
///       |    `--setup() error--> Failed --setup()--> Running
///       `---------cancel()------'
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Configured but no timestep buffers allocated.
    Uninitialized,
    /// Buffers allocated; timesteps may be advanced.
    Running,
    /// The final requested output time has been passed.
    Finished,
    /// The last setup attempt failed and was rolled back.
    Failed,
}

impl RunState {
    /// Whether `setup()` may be called from this state.
    pub fn can_setup(self) -> bool {
        matches!(self, Self::Uninitialized | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
