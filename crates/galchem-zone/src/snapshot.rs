//! Values handed to the output writer.

use indexmap::IndexMap;

/// One element's state in a [`ZoneSnapshot`].
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSnapshot {
    /// Mass in the ISM, solar masses.
    pub mass: f64,
    /// Metallicity by mass of infalling gas.
    pub inflow_metallicity: f64,
    /// Metallicity by mass of outflowing gas.
    pub outflow_metallicity: f64,
}

/// State of one zone at one output time.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneSnapshot {
    /// Simulated time, Gyr.
    pub time: f64,
    /// Gas mass, solar masses.
    pub gas_mass: f64,
    /// Mass in stars, solar masses.
    pub stellar_mass: f64,
    /// Star formation rate, solar masses per year.
    pub star_formation_rate: f64,
    /// Infall rate, solar masses per year.
    pub infall_rate: f64,
    /// Outflow rate, solar masses per year.
    pub outflow_rate: f64,
    /// Mass-loading factor.
    pub mass_loading: f64,
    /// Per-element state, in configuration order.
    pub elements: IndexMap<String, ElementSnapshot>,
}

/// End-of-run normalized MDFs of one zone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MdfTable {
    /// Bin edges in dex.
    pub bin_edges: Vec<f64>,
    /// [X/H] density per element, keyed by symbol.
    pub abundances: IndexMap<String, Vec<f64>>,
    /// [X/Y] density per element pair, keyed `"x/y"`.
    pub ratios: IndexMap<String, Vec<f64>>,
}

impl MdfTable {
    /// Width-weighted sum of one density; one for a normalized MDF.
    pub fn integral(density: &[f64], edges: &[f64]) -> f64 {
        density
            .iter()
            .zip(edges.windows(2))
            .map(|(d, w)| d * (w[1] - w[0]))
            .sum()
    }
}

/// Everything a completed single-zone run produces.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneOutput {
    /// One snapshot per output time.
    pub snapshots: Vec<ZoneSnapshot>,
    /// Normalized MDFs.
    pub mdf: MdfTable,
}
