//! When a run emits snapshots.

/// Relative tolerance, in timesteps, under which a time counts as lying
/// on the timestep grid.
const GRID_TOLERANCE: f64 = 1e-9;

/// Index of the timestep an output at `time` snaps to on a grid of step
/// `dt`.
///
/// That is the first step `n` with `n * dt >= time`, or with
/// `n * dt + dt / 2 > time` when stepping early lands nearer. Times within
/// rounding error of a grid point snap to that point, and a time exactly
/// halfway between two steps goes to the later one. Saturates for times
/// too far out to index.
pub fn output_step(time: f64, dt: f64) -> usize {
    let x = time / dt;
    let nearest = x.round();
    if (x - nearest).abs() <= GRID_TOLERANCE * nearest.abs().max(1.0) {
        return nearest as usize;
    }
    let lower = x.floor();
    if x - lower < 0.5 - GRID_TOLERANCE {
        lower as usize
    } else {
        (lower as usize).saturating_add(1)
    }
}

/// Tracks which output times have been emitted.
///
/// Each output time is mapped once to the timestep it snaps to (see
/// [`output_step()`]); output `k` is due once the run reaches that step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputSchedule {
    steps: Vec<usize>,
    next: usize,
}

impl OutputSchedule {
    /// A schedule over ascending `times` on a grid of step `dt`.
    pub fn new(times: &[f64], dt: f64) -> Self {
        Self {
            steps: times.iter().map(|&t| output_step(t, dt)).collect(),
            next: 0,
        }
    }

    /// Whether an output is due at `timestep`.
    pub fn is_due(&self, timestep: usize) -> bool {
        self.steps.get(self.next).is_some_and(|&step| timestep >= step)
    }

    /// Consume every output due at `timestep`. Returns whether any was.
    ///
    /// Output times closer together than a timestep collapse into one
    /// snapshot.
    pub fn take_due(&mut self, timestep: usize) -> bool {
        let mut any = false;
        while self.is_due(timestep) {
            self.next += 1;
            any = true;
        }
        any
    }

    /// Number of outputs already emitted.
    pub fn emitted(&self) -> usize {
        self.next
    }

    /// Timestep of the final output.
    pub fn last_step(&self) -> usize {
        self.steps.last().copied().unwrap_or(0)
    }

    /// Rewind to the first output.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_nearest_timestep() {
        let mut s = OutputSchedule::new(&[0.0, 0.26], 0.1);
        assert!(s.take_due(0));
        assert!(!s.take_due(1));
        assert!(!s.take_due(2));
        // 0.3 is nearer to 0.26 than 0.2 is.
        assert!(s.take_due(3));
        assert_eq!(s.emitted(), 2);
        assert!(!s.take_due(4));
    }

    #[test]
    fn triggers_one_step_early_when_nearer() {
        let mut s = OutputSchedule::new(&[0.0, 0.24], 0.1);
        s.take_due(0);
        assert!(!s.take_due(1));
        assert!(s.take_due(2));
    }

    #[test]
    fn close_outputs_collapse() {
        let mut s = OutputSchedule::new(&[0.0, 0.01, 0.02, 0.5], 0.1);
        assert!(s.take_due(0));
        assert_eq!(s.emitted(), 3);
        s.reset();
        assert_eq!(s.emitted(), 0);
    }

    #[test]
    fn grid_times_survive_rounding() {
        // 3 * 0.1 and 7 * 0.1 both round above the literal.
        assert_eq!(output_step(0.3, 0.1), 3);
        assert_eq!(output_step(0.7, 0.1), 7);
        assert_eq!(output_step(1.0, 0.1), 10);
        assert_eq!(output_step(0.3, 0.01), 30);
        assert_eq!(OutputSchedule::new(&[0.0, 0.3], 0.1).last_step(), 3);
    }

    #[test]
    fn halfway_goes_to_later_step() {
        assert_eq!(output_step(0.95, 0.1), 10);
        assert_eq!(output_step(0.25, 0.1), 3);
    }

    #[test]
    fn huge_times_saturate() {
        assert_eq!(output_step(1e30, 1.0), usize::MAX);
    }
}
