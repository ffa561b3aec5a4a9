//! End-to-end single-zone scenarios.

use galchem_core::{ChemStatus, RunState, SetupError, GAS_MASS_FLOOR};
use galchem_test_utils::{enriched_zone, helium, infall_zone, iron, oxygen, sfr_zone};
use galchem_zone::{ElementConfig, IsmMode, MdfTable, Zone, ZoneConfig};

fn running(config: ZoneConfig) -> Zone {
    let mut zone = Zone::new(config).unwrap();
    zone.setup().unwrap();
    zone
}

// ── Quiescence ─────────────────────────────────────────────────────

#[test]
fn zone_without_star_formation_stays_empty() {
    let config = sfr_zone("quiet", 0.0, 0.3)
        .with_element(oxygen())
        .with_element(iron());
    let mut zone = running(config);
    while zone.state() == RunState::Running {
        zone.advance().unwrap();
        assert_eq!(zone.element_mass(0), 0.0);
        assert_eq!(zone.element_mass(1), 0.0);
        assert_eq!(zone.ism().outflow_rate(), 0.0);
    }
    let table = zone.mdf_table();
    for density in table.abundances.values().chain(table.ratios.values()) {
        assert!(density.iter().all(|v| v.is_nan()));
    }
}

#[test]
fn quiescent_snapshots_report_zero() {
    let mut zone = running(sfr_zone("quiet", 0.0, 0.2).with_element(oxygen()));
    let out = zone.evolve().unwrap();
    assert_eq!(out.snapshots.len(), 3);
    for s in &out.snapshots {
        assert_eq!(s.star_formation_rate, 0.0);
        assert_eq!(s.outflow_rate, 0.0);
        assert_eq!(s.elements["o"].mass, 0.0);
        assert_eq!(s.gas_mass, GAS_MASS_FLOOR);
    }
}

// ── Post-update invariants ─────────────────────────────────────────

#[test]
fn draining_zone_respects_floors() {
    let config = infall_zone("drain", 0.0, 1.0)
        .with_initial_gas(1e8)
        .with_mass_loading(20.0)
        .with_tau_star(0.1)
        .with_element(oxygen())
        .with_element(iron());
    let mut zone = running(config);
    while zone.state() == RunState::Running {
        zone.advance().unwrap();
        let ism = zone.ism();
        assert!(ism.gas_mass() >= GAS_MASS_FLOOR);
        assert!(ism.star_formation_rate() >= 0.0);
        assert!(ism.infall_rate() >= 0.0);
        assert!(zone.element_mass(0) >= 0.0);
        assert!(zone.element_mass(1) >= 0.0);
    }
}

#[test]
fn gas_driven_zone_infers_non_negative_infall() {
    // Gas mass falls faster than star formation and outflow can remove it.
    let gas: Vec<f64> = (0..40).map(|i| 1e9 * (1.0 - i as f64 * 0.02)).collect();
    let config = ZoneConfig::new("gas", IsmMode::Gas(gas.into()))
        .with_dt(0.01)
        .with_output_times(vec![0.0, 0.3])
        .with_element(oxygen());
    let mut zone = running(config);
    while zone.state() == RunState::Running {
        zone.advance().unwrap();
        assert!(zone.ism().infall_rate() >= 0.0);
    }
}

// ── Zero yields ────────────────────────────────────────────────────

#[test]
fn element_without_sources_stays_at_zero() {
    let config = enriched_zone("inert", 0.5).with_element(ElementConfig::new("n", 6.91e-4));
    let mut zone = running(config);
    let n = zone.element_index("n").unwrap();
    while zone.state() == RunState::Running {
        zone.advance().unwrap();
        assert_eq!(zone.element_mass(n), 0.0);
    }
}

// ── Outflow enhancement ────────────────────────────────────────────

#[test]
fn primordial_element_outflow_is_not_enhanced() {
    let config = enriched_zone("enh", 0.2).with_enhancement(3.0);
    let mut zone = running(config);
    for _ in 0..10 {
        zone.advance().unwrap();
    }
    let s = zone.snapshot();
    let gas = s.gas_mass;
    let he = &s.elements["he"];
    let o = &s.elements["o"];
    assert!((he.outflow_metallicity - he.mass / gas).abs() <= 1e-12 * he.mass / gas);
    assert!((o.outflow_metallicity - 3.0 * o.mass / gas).abs() <= 1e-12 * o.mass / gas);
}

#[test]
fn enhancement_removes_more_metals() {
    let run = |enhancement: f64| {
        let mut zone = running(
            sfr_zone("z", 1.0, 0.3)
                .with_element(oxygen())
                .with_enhancement(enhancement),
        );
        while zone.state() == RunState::Running {
            zone.advance().unwrap();
        }
        zone.element_mass(0)
    };
    assert!(run(2.0) < run(1.0));
}

#[test]
fn no_primordial_element_enhances_everything() {
    let config = enriched_zone("all", 0.2)
        .with_enhancement(2.0)
        .with_primordial(None);
    let mut zone = running(config);
    for _ in 0..5 {
        zone.advance().unwrap();
    }
    let s = zone.snapshot();
    let he = &s.elements["he"];
    assert!((he.outflow_metallicity - 2.0 * he.mass / s.gas_mass).abs() <= 1e-12);
}

// ── MDF ────────────────────────────────────────────────────────────

#[test]
fn enriched_run_produces_normalized_mdfs() {
    let mut zone = running(enriched_zone("mdf", 1.0));
    let out = zone.evolve().unwrap();
    let edges = &out.mdf.bin_edges;
    let o = &out.mdf.abundances["o"];
    assert!((MdfTable::integral(o, edges) - 1.0).abs() < 1e-9);
    assert_eq!(
        out.mdf.ratios.keys().collect::<Vec<_>>(),
        vec!["fe/o", "he/o", "he/fe"]
    );
    for density in out.mdf.ratios.values() {
        assert!((MdfTable::integral(density, edges) - 1.0).abs() < 1e-9);
    }
}

// ── Lifecycle ──────────────────────────────────────────────────────

#[test]
fn cancelled_zone_reproduces_a_fresh_run() {
    let fresh = {
        let mut zone = running(enriched_zone("a", 0.3));
        zone.evolve().unwrap()
    };
    let mut zone = running(enriched_zone("a", 0.3));
    for _ in 0..7 {
        zone.advance().unwrap();
    }
    zone.cancel();
    assert_eq!(zone.state(), RunState::Uninitialized);
    zone.setup().unwrap();
    let again = zone.evolve().unwrap();
    assert_eq!(fresh.snapshots, again.snapshots);
    assert_eq!(fresh.mdf.abundances["o"], again.mdf.abundances["o"]);
}

#[test]
fn final_output_is_emitted_when_its_grid_time_rounds_up() {
    // 3 * 0.1 and 7 * 0.1 both exceed their decimal literals.
    for (last, steps) in [(0.3, 4), (0.7, 8), (1.0, 11)] {
        let config = sfr_zone("rounded", 1.0, 1.0)
            .with_element(oxygen())
            .with_dt(0.1)
            .with_output_times(vec![0.0, last]);
        let mut zone = running(config);
        let out = zone.evolve().unwrap();
        let times: Vec<f64> = out.snapshots.iter().map(|s| s.time).collect();
        assert_eq!(times.len(), 2, "outputs {times:?} for final time {last}");
        assert!((times[1] - last).abs() < 1e-12);
        assert_eq!(zone.timestep(), steps);
        assert_eq!(zone.state(), RunState::Finished);
    }
}

#[test]
fn finished_zone_cannot_be_set_up_again() {
    let mut zone = running(enriched_zone("done", 0.1));
    zone.evolve().unwrap();
    let err = zone.setup().unwrap_err();
    assert_eq!(ChemStatus::from(&err), ChemStatus::InvalidState);
    zone.cancel();
    assert!(zone.setup().is_ok());
}

// ── Failure codes ──────────────────────────────────────────────────

#[test]
fn unknown_mode_has_its_own_code() {
    let err = IsmMode::from_name("outflow", 1.0).unwrap_err();
    assert_eq!(
        err,
        SetupError::UnrecognizedMode {
            mode: "outflow".into()
        }
    );
    assert_eq!(ChemStatus::from(&err), ChemStatus::UnrecognizedMode);
}

#[test]
fn invalid_configuration_is_rejected_before_allocation() {
    let err = Zone::new(sfr_zone("bad", 1.0, 0.3).with_dt(0.0)).unwrap_err();
    assert_eq!(ChemStatus::from(&err), ChemStatus::InvalidConfig);
    let leaky = ElementConfig::new("o", 5.7e-3).with_ccsne(|_: f64| 0.01, 1.5);
    let err = Zone::new(sfr_zone("bad", 1.0, 0.3).with_element(leaky)).unwrap_err();
    assert!(matches!(err, SetupError::InvalidEntrainment { .. }));
    let twice = sfr_zone("bad", 1.0, 0.3)
        .with_element(oxygen())
        .with_element(oxygen());
    let err = Zone::new(twice).unwrap_err();
    assert!(matches!(err, SetupError::DuplicateElement { .. }));
}

#[test]
fn oversized_run_fails_allocation_and_rolls_back() {
    let config = sfr_zone("huge", 1.0, 0.3)
        .with_dt(1.0)
        .with_output_times(vec![0.0, 1e30])
        .with_element(helium());
    let mut zone = Zone::new(config).unwrap();
    let err = zone.setup().unwrap_err();
    assert_eq!(ChemStatus::from(&err), ChemStatus::AllocationFailed);
    assert_eq!(zone.state(), RunState::Failed);
    assert!(zone.metallicity_history().is_empty());
    assert!(zone.tables().is_empty());
    // A failed zone may retry setup.
    assert!(matches!(
        zone.setup(),
        Err(SetupError::AllocationFailed { .. })
    ));
}
