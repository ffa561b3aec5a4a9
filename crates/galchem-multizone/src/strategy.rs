//! Tracer migration strategies.
//!
//! A [`TracerMigration`] decides where each tracer lives at every
//! timestep. Two strategies ship with the crate:
//!
//! - [`StochasticMigration`] rolls the dice every timestep.
//! - [`ReplayMigration`] rolls them once, at injection, and records a
//!   zone history that later timesteps replay.
//!
//! Both use the same draw: one uniform deviate per candidate destination,
//! in zone order, skipping the tracer's current zone. The first candidate
//! whose deviate falls below its probability wins. Drawing per candidate
//! rather than per tracer keeps a zone's chance of receiving a tracer
//! independent of where it sits in the candidate order.

use galchem_core::ZoneId;
use rand::{Rng, RngCore};

use crate::migration::MigrationMatrix;
use crate::tracer::Tracer;

/// Which [`TracerMigration`] a multi-zone model uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MigrationStrategy {
    /// Draw each tracer's destination every timestep.
    #[default]
    Stochastic,
    /// Precompute each tracer's zone history at injection.
    Replay,
}

impl MigrationStrategy {
    /// Build the strategy object.
    pub fn build(self) -> Box<dyn TracerMigration> {
        match self {
            Self::Stochastic => Box::new(StochasticMigration),
            Self::Replay => Box::new(ReplayMigration),
        }
    }
}

/// Moves tracer particles between zones.
///
/// The engine calls [`prepare()`](Self::prepare) once when a tracer is
/// injected and [`relocate()`](Self::relocate) once per timestep for
/// every tracer that existed before the step's injection. Only the
/// tracer's `zone` and `history` may change.
pub trait TracerMigration: Send + Sync {
    /// Strategy name, for logging.
    fn name(&self) -> &str;

    /// Called once at injection.
    ///
    /// `first_step` is the first timestep at which [`relocate()`](Self::relocate)
    /// will be called for this tracer; `last_step` is the run's final
    /// timestep.
    fn prepare(
        &self,
        tracer: &mut Tracer,
        matrix: &MigrationMatrix,
        first_step: usize,
        last_step: usize,
        rng: &mut dyn RngCore,
    );

    /// Move `tracer` over timestep `timestep`.
    fn relocate(
        &self,
        tracer: &mut Tracer,
        matrix: &MigrationMatrix,
        timestep: usize,
        rng: &mut dyn RngCore,
    );
}

/// Draw the zone a tracer in `current` occupies after one step with
/// outgoing probabilities `row`.
pub fn draw(current: ZoneId, row: &[f64], rng: &mut dyn RngCore) -> ZoneId {
    for (j, &p) in row.iter().enumerate() {
        if j == current.index() {
            continue;
        }
        let u: f64 = rng.random();
        if u < p {
            return ZoneId(j as u32);
        }
    }
    current
}

// ── Stochastic ─────────────────────────────────────────────────────

/// Draws every tracer's destination at every timestep.
#[derive(Clone, Copy, Debug, Default)]
pub struct StochasticMigration;

impl TracerMigration for StochasticMigration {
    fn name(&self) -> &str {
        "stochastic"
    }

    fn prepare(
        &self,
        tracer: &mut Tracer,
        _matrix: &MigrationMatrix,
        _first_step: usize,
        _last_step: usize,
        _rng: &mut dyn RngCore,
    ) {
        tracer.history = None;
    }

    fn relocate(
        &self,
        tracer: &mut Tracer,
        matrix: &MigrationMatrix,
        timestep: usize,
        rng: &mut dyn RngCore,
    ) {
        tracer.zone = draw(tracer.zone, matrix.row(timestep, tracer.zone.index()), rng);
    }
}

// ── Replay ─────────────────────────────────────────────────────────

/// Precomputes each tracer's path at injection and replays it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReplayMigration;

impl TracerMigration for ReplayMigration {
    fn name(&self) -> &str {
        "replay"
    }

    fn prepare(
        &self,
        tracer: &mut Tracer,
        matrix: &MigrationMatrix,
        first_step: usize,
        last_step: usize,
        rng: &mut dyn RngCore,
    ) {
        let origin = tracer.origin_timestep;
        let len = last_step.saturating_sub(origin) + 2;
        let mut history = Vec::with_capacity(len);
        let mut zone = tracer.zone;
        history.push(zone);
        for step in origin..=last_step {
            if step >= first_step {
                zone = draw(zone, matrix.row(step, zone.index()), rng);
            }
            history.push(zone);
        }
        tracer.history = Some(history);
    }

    fn relocate(
        &self,
        tracer: &mut Tracer,
        _matrix: &MigrationMatrix,
        timestep: usize,
        _rng: &mut dyn RngCore,
    ) {
        let index = (timestep + 1).saturating_sub(tracer.origin_timestep);
        if let Some(&zone) = tracer.history.as_ref().and_then(|h| h.get(index)) {
            tracer.zone = zone;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationTable;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn one_way(k: usize) -> MigrationMatrix {
        MigrationTable::from_fn(k, |i, j| if i == 0 && j == 1 { 1.0 } else { 0.0 })
            .normalize(k, 0.01, 10)
            .unwrap()
    }

    #[test]
    fn certain_move_always_happens() {
        let m = one_way(2);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(draw(ZoneId(0), m.row(0, 0), &mut rng), ZoneId(1));
            assert_eq!(draw(ZoneId(1), m.row(0, 1), &mut rng), ZoneId(1));
        }
    }

    #[test]
    fn draw_consumes_one_deviate_per_candidate() {
        let m = MigrationMatrix::zero(4).unwrap();
        let mut a = ChaCha8Rng::seed_from_u64(3);
        let mut b = ChaCha8Rng::seed_from_u64(3);
        draw(ZoneId(1), m.row(0, 1), &mut a);
        for _ in 0..3 {
            let _: f64 = b.random();
        }
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn move_probability_matches_table() {
        let m = MigrationTable::from_fn(3, |i, j| if i == 0 && j == 2 { 0.3 } else { 0.0 })
            .normalize(3, 0.01, 1)
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let trials = 20_000;
        let moved = (0..trials)
            .filter(|_| draw(ZoneId(0), m.row(0, 0), &mut rng) == ZoneId(2))
            .count();
        let fraction = moved as f64 / trials as f64;
        assert!((fraction - 0.3).abs() < 0.02, "fraction {fraction}");
    }

    #[test]
    fn replay_follows_precomputed_history() {
        let m = one_way(2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut tracer = Tracer::new(1.0, ZoneId(0), 3);
        ReplayMigration.prepare(&mut tracer, &m, 4, 9, &mut rng);
        let history = tracer.history.clone().unwrap();
        assert_eq!(history.len(), 8);
        // Held in place until the first relocation at timestep 4.
        assert_eq!(history[0], ZoneId(0));
        assert_eq!(history[1], ZoneId(0));
        assert_eq!(history[2], ZoneId(1));
        ReplayMigration.relocate(&mut tracer, &m, 4, &mut rng);
        assert_eq!(tracer.zone, ZoneId(1));
    }

    #[test]
    fn stochastic_prepare_keeps_no_history() {
        let m = one_way(2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut tracer = Tracer::new(1.0, ZoneId(0), 0);
        StochasticMigration.prepare(&mut tracer, &m, 0, 9, &mut rng);
        assert!(tracer.history.is_none());
        StochasticMigration.relocate(&mut tracer, &m, 0, &mut rng);
        assert_eq!(tracer.zone, ZoneId(1));
    }

    #[test]
    fn strategy_names() {
        assert_eq!(MigrationStrategy::Stochastic.build().name(), "stochastic");
        assert_eq!(MigrationStrategy::Replay.build().name(), "replay");
    }
}
