//! End-to-end multi-zone scenarios.

use galchem_core::{ChemStatus, RunState, SetupError, ZoneId};
use galchem_multizone::{
    EvolutionMode, MassTransfer, MigrationStrategy, MigrationTable, MultiZone, MultiZoneConfig,
};
use galchem_test_utils::{
    enriched_zone, iron, one_way, oxygen, sfr_zone, two_zone_config, uniform,
};
use galchem_zone::{ChannelConfig, ElementConfig, MdfTable, Zone};

fn running(config: MultiZoneConfig) -> MultiZone {
    let mut model = MultiZone::new(config).unwrap();
    model.setup().unwrap();
    model
}

fn relative(a: f64, b: f64) -> f64 {
    if a == b {
        0.0
    } else {
        (a - b).abs() / a.abs().max(b.abs())
    }
}

// ── No migration ───────────────────────────────────────────────────

#[test]
fn uncoupled_zones_match_single_zone_runs() {
    for mode in [EvolutionMode::Full, EvolutionMode::Simple] {
        let mut model = running(two_zone_config(0.5).with_mode(mode));
        let mut alone = Zone::new(enriched_zone("inner", 0.5)).unwrap();
        alone.setup().unwrap();
        while model.state() == RunState::Running {
            model.advance().unwrap();
            alone.advance().unwrap();
            let zone = &model.zones()[0];
            for e in 0..alone.elements().len() {
                let (a, b) = (zone.element_mass(e), alone.element_mass(e));
                assert!(relative(a, b) < 1e-3, "{mode:?} element {e}: {a} vs {b}");
            }
            assert!(relative(zone.ism().gas_mass(), alone.ism().gas_mass()) < 1e-3);
        }
        assert_eq!(alone.state(), RunState::Finished);
    }
}

#[test]
fn simple_mode_ignores_gas_migration() {
    let config = two_zone_config(0.3)
        .with_mode(EvolutionMode::Simple)
        .with_gas_migration(uniform(2, 0.5))
        .with_tracer_migration(uniform(2, 0.5));
    let mut model = running(config);
    let mut alone = Zone::new(enriched_zone("outer", 0.3)).unwrap();
    alone.setup().unwrap();
    while model.state() == RunState::Running {
        model.advance().unwrap();
        alone.advance().unwrap();
    }
    for e in 0..alone.elements().len() {
        assert_eq!(model.zones()[1].element_mass(e), alone.element_mass(e));
    }
}

// ── Separation ─────────────────────────────────────────────────────

#[test]
fn tracers_leaving_a_zone_carry_type_ia_enrichment_with_them() {
    for strategy in [MigrationStrategy::Stochastic, MigrationStrategy::Replay] {
        let zone = |name: &str| sfr_zone(name, 1.0, 0.3).with_element(iron());
        let config = MultiZoneConfig::new("split", vec![zone("source"), zone("sink")])
            .with_tracer_migration(one_way(2, 0, 1, 1.0))
            .with_strategy(strategy);
        let mut model = running(config);
        let t_d = 0.05;
        while model.state() == RunState::Running {
            let n = model.timestep();
            model.advance().unwrap();
            let source = model.last_delayed(ZoneId(0)).unwrap();
            let sink = model.last_delayed(ZoneId(1)).unwrap();
            assert_eq!(source.elements[0].sneia, 0.0, "{strategy:?} timestep {n}");
            if n as f64 * 0.01 > t_d + 0.01 {
                assert!(sink.elements[0].sneia > 0.0, "{strategy:?} timestep {n}");
            }
        }
        let out = model.evolve().unwrap();
        // No tracer ends in the source zone, so its MDF has no data.
        assert!(out.zones["source"].mdf.abundances["fe"].iter().all(|v| v.is_nan()));
        let sink = &out.zones["sink"].mdf;
        let integral = MdfTable::integral(&sink.abundances["fe"], &sink.bin_edges);
        assert!((integral - 1.0).abs() < 1e-9, "{strategy:?}");
    }
}

#[test]
fn zones_with_different_channels_are_rejected() {
    let novae = ChannelConfig::new("novae", |_: f64| 0.01, |_: f64| 1.0);
    let source = sfr_zone("source", 1.0, 0.3)
        .with_element(ElementConfig::new("o", 5.7e-3).with_channel(novae));
    let sink = sfr_zone("sink", 1.0, 0.3).with_element(ElementConfig::new("o", 5.7e-3));
    let config = MultiZoneConfig::new("split", vec![source, sink])
        .with_tracer_migration(one_way(2, 0, 1, 1.0));
    let err = MultiZone::new(config).unwrap_err();
    assert!(matches!(err, SetupError::ZoneMismatch { zone: ZoneId(1), .. }));
    assert_eq!(ChemStatus::from(&err), ChemStatus::InvalidConfig);
}

#[test]
fn channel_yields_follow_tracers_across_zones() {
    let element = || {
        ElementConfig::new("o", 5.7e-3)
            .with_channel(ChannelConfig::new("novae", |_: f64| 0.01, |_: f64| 1.0))
    };
    let source = sfr_zone("source", 1.0, 0.3).with_element(element());
    let sink = sfr_zone("sink", 0.0, 0.3).with_element(element());
    let config = MultiZoneConfig::new("split", vec![source, sink])
        .with_tracer_migration(one_way(2, 0, 1, 1.0));
    let mut model = running(config);
    let mut received = 0.0;
    while model.state() == RunState::Running {
        model.advance().unwrap();
        received += model.last_delayed(ZoneId(1)).unwrap().elements[0].channels[0];
    }
    // The sink forms no stars, so everything it receives was carried in.
    assert!(received > 0.0);
}

// ── Tracer count ───────────────────────────────────────────────────

#[test]
fn tracer_count_grows_by_one_generation_per_step() {
    for mode in [EvolutionMode::Full, EvolutionMode::Simple] {
        let zones = vec![
            sfr_zone("a", 1.0, 0.2).with_element(oxygen()),
            sfr_zone("b", 2.0, 0.2).with_element(oxygen()),
            sfr_zone("c", 3.0, 0.2).with_element(oxygen()),
        ];
        let config = MultiZoneConfig::new("count", zones)
            .with_mode(mode)
            .with_tracers_per_zone(3)
            .with_tracer_migration(uniform(3, 0.2));
        let mut model = running(config);
        let c = mode.injection_offset();
        assert_eq!(model.tracer_count(), c * 3 * 3);
        let total = model.timestep_count();
        for t in 1..total {
            model.advance().unwrap();
            assert_eq!(model.tracer_count(), (t + c) * 3 * 3, "{mode:?} after {t}");
            assert_eq!(model.metrics().tracer_count, model.tracer_count());
        }
        model.advance().unwrap();
        assert_eq!(model.state(), RunState::Finished);
        // The injection past the final output is skipped.
        assert_eq!(model.tracer_count(), total * 3 * 3);
    }
}

#[test]
fn final_output_survives_a_grid_time_that_rounds_up() {
    let zone = |name: &str| {
        sfr_zone(name, 1.0, 1.0)
            .with_element(oxygen())
            .with_dt(0.1)
            .with_output_times(vec![0.0, 0.3])
    };
    let config = MultiZoneConfig::new("rounded", vec![zone("a"), zone("b")])
        .with_tracer_migration(uniform(2, 0.1));
    let mut model = running(config);
    assert_eq!(model.timestep_count(), 4);
    let out = model.evolve().unwrap();
    for (name, zone) in &out.zones {
        assert_eq!(zone.snapshots.len(), 2, "zone {name}");
        assert!((zone.snapshots[1].time - 0.3).abs() < 1e-12, "zone {name}");
    }
    assert_eq!(model.state(), RunState::Finished);
}

#[test]
fn tracer_mass_splits_star_formation() {
    let config = MultiZoneConfig::new("split", vec![sfr_zone("a", 2.0, 0.1)])
        .with_tracers_per_zone(4);
    let model = running(config);
    for tracer in model.tracers().iter() {
        // 2 Msun/yr over 10 Myr, in four parts.
        assert!((tracer.mass - 5e6).abs() < 1e-6);
    }
}

// ── Zero yields ────────────────────────────────────────────────────

#[test]
fn element_without_sources_stays_zero_under_migration() {
    let inert = || ElementConfig::new("n", 6.91e-4);
    let zones = vec![
        enriched_zone("a", 0.3).with_element(inert()),
        enriched_zone("b", 0.3).with_element(inert()),
        enriched_zone("c", 0.3).with_element(inert()),
    ];
    for strategy in [MigrationStrategy::Stochastic, MigrationStrategy::Replay] {
        let config = MultiZoneConfig::new("inert", zones.clone())
            .with_gas_migration(uniform(3, 0.3))
            .with_tracer_migration(uniform(3, 0.3))
            .with_strategy(strategy);
        let mut model = running(config);
        let n = model.zones()[0].element_index("n").unwrap();
        while model.state() == RunState::Running {
            model.advance().unwrap();
            for zone in model.zones() {
                assert_eq!(zone.element_mass(n), 0.0);
            }
        }
    }
}

// ── Gas migration ──────────────────────────────────────────────────

#[test]
fn gas_migration_conserves_mass() {
    let mut zones: Vec<Zone> = ["a", "b", "c"]
        .iter()
        .map(|name| {
            let mut z = Zone::new(enriched_zone(name, 0.2)).unwrap();
            z.setup().unwrap();
            z
        })
        .collect();
    zones[0].set_element_mass(0, 1e6);
    zones[1].set_gas_mass(3e9);
    let matrix = MigrationTable::from_fn(3, |i, j| 0.1 * (i + j) as f64)
        .normalize(3, 0.01, 21)
        .unwrap();
    let gas_before: f64 = zones.iter().map(|z| z.ism().gas_mass()).sum();
    let o_before: f64 = zones.iter().map(|z| z.element_mass(0)).sum();
    let mut transfer = MassTransfer::new(3, zones[0].elements().len()).unwrap();
    transfer.migrate_gas(&mut zones, &matrix, 0);
    let gas_after: f64 = zones.iter().map(|z| z.ism().gas_mass()).sum();
    let o_after: f64 = zones.iter().map(|z| z.element_mass(0)).sum();
    assert!(relative(gas_before, gas_after) < 1e-12);
    assert!(relative(o_before, o_after) < 1e-12);
    // Zone 0 sends 0.1 + 0.2 of its oxygen away.
    assert!((zones[0].element_mass(0) - 0.7e6).abs() < 1e-3);
}

#[test]
fn coupled_run_stays_finite_and_floored() {
    let config = two_zone_config(0.5)
        .with_gas_migration(one_way(2, 0, 1, 0.9))
        .with_tracer_migration(uniform(2, 0.4));
    let mut model = running(config);
    while model.state() == RunState::Running {
        model.advance().unwrap();
        for zone in model.zones() {
            assert!(zone.ism().gas_mass() >= galchem_core::GAS_MASS_FLOOR);
            for e in 0..zone.elements().len() {
                let m = zone.element_mass(e);
                assert!(m.is_finite() && m >= 0.0);
            }
        }
    }
}

// ── Setup failures ─────────────────────────────────────────────────

#[test]
fn overflowing_migration_fails_setup() {
    let config = two_zone_config(0.2).with_gas_migration(uniform(2, 1.5));
    let mut model = MultiZone::new(config).unwrap();
    let err = model.setup().unwrap_err();
    assert_eq!(ChemStatus::from(&err), ChemStatus::MigrationOverflow);
    assert_eq!(model.state(), RunState::Failed);
    assert!(model
        .zones()
        .iter()
        .all(|z| z.state() == RunState::Uninitialized));
    assert_eq!(model.tracer_count(), 0);
    assert!(matches!(
        model.advance(),
        Err(galchem_core::StepError::NotRunning { .. })
    ));
}

#[test]
fn misshapen_migration_fails_setup() {
    let config = two_zone_config(0.2).with_tracer_migration(uniform(3, 0.1));
    let mut model = MultiZone::new(config).unwrap();
    let err = model.setup().unwrap_err();
    assert_eq!(ChemStatus::from(&err), ChemStatus::MigrationShape);
    // Short time-varying tables are rejected too.
    let config = two_zone_config(0.2)
        .with_gas_migration(MigrationTable::time_varying_from_fn(5, 2, |_, _, _| 0.0));
    let mut model = MultiZone::new(config).unwrap();
    assert!(matches!(
        model.setup(),
        Err(SetupError::MigrationShape { .. })
    ));
}

#[test]
fn cancelled_model_can_be_set_up_again() {
    let mut model = MultiZone::new(two_zone_config(0.2)).unwrap();
    model.setup().unwrap();
    model.advance().unwrap();
    model.cancel();
    assert_eq!(model.state(), RunState::Uninitialized);
    assert_eq!(model.tracer_count(), 0);
    model.setup().unwrap();
    assert_eq!(model.timestep(), 0);
    assert_eq!(model.tracer_count(), 2);
}

// ── Randomness ─────────────────────────────────────────────────────

fn roster_zones(seed: u64, strategy: MigrationStrategy) -> Vec<ZoneId> {
    let zones = vec![
        sfr_zone("a", 1.0, 0.5).with_element(oxygen()),
        sfr_zone("b", 1.0, 0.5).with_element(oxygen()),
        sfr_zone("c", 1.0, 0.5).with_element(oxygen()),
    ];
    let config = MultiZoneConfig::new("seeded", zones)
        .with_tracer_migration(uniform(3, 0.3))
        .with_tracers_per_zone(2)
        .with_strategy(strategy)
        .with_seed(seed);
    let out = running(config).evolve().unwrap();
    out.tracers.iter().map(|t| t.final_zone).collect()
}

#[test]
fn same_seed_same_roster() {
    for strategy in [MigrationStrategy::Stochastic, MigrationStrategy::Replay] {
        assert_eq!(roster_zones(9, strategy), roster_zones(9, strategy));
        assert_ne!(roster_zones(9, strategy), roster_zones(10, strategy));
    }
}

#[test]
fn replay_and_stochastic_agree_statistically() {
    let p = 0.02;
    let per_zone = 20;
    let stayed = |strategy: MigrationStrategy| {
        let config = MultiZoneConfig::new(
            "drift",
            vec![
                sfr_zone("a", 1.0, 0.5).with_element(oxygen()),
                sfr_zone("b", 1.0, 0.5).with_element(oxygen()),
            ],
        )
        .with_tracer_migration(one_way(2, 0, 1, p))
        .with_tracers_per_zone(per_zone)
        .with_strategy(strategy)
        .with_seed(2024);
        let out = running(config).evolve().unwrap();
        out.tracers
            .iter()
            .filter(|t| t.origin_zone == ZoneId(0) && t.final_zone == ZoneId(0))
            .count() as f64
    };
    // A tracer born at timestep o is relocated at timesteps o..=50.
    let expected: f64 = (1..=51).map(|a| (1.0 - p).powi(a)).sum::<f64>() * per_zone as f64;
    let stochastic = stayed(MigrationStrategy::Stochastic);
    let replay = stayed(MigrationStrategy::Replay);
    assert!(relative(stochastic, expected) < 0.1, "{stochastic} vs {expected}");
    assert!(relative(replay, expected) < 0.1, "{replay} vs {expected}");
}

// ── Roster ─────────────────────────────────────────────────────────

#[test]
fn roster_records_birth_metallicity() {
    let mut model = running(two_zone_config(0.2).with_tracer_migration(uniform(2, 0.5)));
    let out = model.evolve().unwrap();
    assert_eq!(out.tracers.len(), model.tracer_count());
    for record in &out.tracers {
        assert_eq!(record.metallicity.len(), 3);
        let step = (record.formation_time / 0.01).round() as usize;
        let origin = &model.zones()[record.origin_zone.index()];
        assert_eq!(record.metallicity[0], origin.elements()[0].history()[step]);
    }
    let first = &out.tracers[0];
    assert_eq!(first.formation_time, 0.0);
    assert!(first.metallicity.iter().all(|&z| z == 0.0));
}
