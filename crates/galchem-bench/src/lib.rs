//! Benchmark profiles for the galchem engines.
//!
//! - [`reference_profile`]: 8 ring zones, 1 Gyr, four elements, 2 tracers
//!   per zone per step
//! - [`stress_profile`]: 32 ring zones, 2 Gyr, 4 tracers per zone per step
//! - [`reference_zone`]: one zone of the reference profile on its own

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use galchem_core::Series;
use galchem_multizone::{MigrationTable, MultiZoneConfig};
use galchem_yields::{AgbGrid, IaDelay, Imf, MetallicityGrid, SspModel};
use galchem_zone::{ElementConfig, IsmMode, ZoneConfig};

/// Oxygen, magnesium, iron, and nitrogen with grid yields.
///
/// Nitrogen carries an AGB grid so the scan exercises every source.
pub fn reference_elements() -> Vec<ElementConfig> {
    let grid = |values: [f64; 4]| {
        MetallicityGrid::new(vec![0.0, 0.004, 0.014, 0.03], values.to_vec()).unwrap()
    };
    let agb = AgbGrid::new(
        vec![1.0, 2.0, 4.0, 6.0],
        vec![0.004, 0.014],
        vec![1e-4, 2e-4, 4e-4, 5e-4, 6e-4, 8e-4, 3e-4, 4e-4],
    )
    .unwrap();
    vec![
        ElementConfig::new("o", 5.72e-3).with_ccsne(grid([0.015, 0.015, 0.014, 0.013]), 1.0),
        ElementConfig::new("mg", 6.71e-4).with_ccsne(grid([1e-3, 1e-3, 9e-4, 8e-4]), 1.0),
        ElementConfig::new("fe", 1.29e-3)
            .with_ccsne(grid([1e-3; 4]), 1.0)
            .with_sneia(grid([1.7e-3; 4]), 1.0),
        ElementConfig::new("n", 6.91e-4)
            .with_ccsne(grid([3.6e-4; 4]), 1.0)
            .with_agb(agb, 1.0),
    ]
}

/// One infall-driven zone with a Kroupa population, running to
/// `final_time` Gyr.
pub fn reference_zone(name: &str, final_time: f64) -> ZoneConfig {
    let outputs = (0..=(final_time / 0.1).round() as usize)
        .map(|i| i as f64 * 0.1)
        .collect();
    let mut zone = ZoneConfig::new(name, IsmMode::Infall(Series::constant(2.0)))
        .with_output_times(outputs)
        .with_stellar_population(SspModel::new(Imf::Kroupa))
        .with_ia_delay(IaDelay::default(), 0.15)
        .with_initial_gas(1e9);
    for element in reference_elements() {
        zone = zone.with_element(element);
    }
    zone
}

/// Migration between neighbouring zones on a ring, probability `p` per
/// 10 Myr in each direction.
pub fn ring_migration(k: usize, p: f64) -> MigrationTable {
    MigrationTable::from_fn(k, |i, j| {
        if k > 1 && (j == (i + 1) % k || i == (j + 1) % k) && i != j {
            p
        } else {
            0.0
        }
    })
}

/// 8 zones on a ring, 1 Gyr.
pub fn reference_profile(seed: u64) -> MultiZoneConfig {
    profile(8, 1.0, 2, seed)
}

/// 32 zones on a ring, 2 Gyr.
pub fn stress_profile(seed: u64) -> MultiZoneConfig {
    profile(32, 2.0, 4, seed)
}

fn profile(k: usize, final_time: f64, tracers: usize, seed: u64) -> MultiZoneConfig {
    let zones = (0..k)
        .map(|i| reference_zone(&format!("ring{i}"), final_time))
        .collect();
    MultiZoneConfig::new(format!("ring{k}"), zones)
        .with_gas_migration(ring_migration(k, 0.01))
        .with_tracer_migration(ring_migration(k, 0.05))
        .with_tracers_per_zone(tracers)
        .with_seed(seed)
}
