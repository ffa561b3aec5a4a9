//! Stellar metallicity distribution functions.
//!
//! The accumulator holds one histogram of [X/H] per element and one of
//! [X/Y] per unordered element pair. Pairs are ordered `(i, j)` for `i` in
//! `1..n` and `j` in `0..i`, labelled `X_i/X_j`.
//!
//! Histograms accumulate raw weights (star formation rate or tracer mass)
//! and are converted in place to a probability density by
//! [`normalize()`](MdfAccumulator::normalize).

use galchem_core::{buffer, SetupError};
use indexmap::IndexMap;

use crate::snapshot::MdfTable;

/// Online MDF histograms for one zone.
#[derive(Clone, Debug, Default)]
pub struct MdfAccumulator {
    edges: Vec<f64>,
    abundances: Vec<Vec<f64>>,
    ratios: Vec<Vec<f64>>,
    pairs: Vec<(usize, usize)>,
    normalized: bool,
}

impl MdfAccumulator {
    /// Zeroed histograms over `edges` for `n_elements` elements.
    ///
    /// `edges` must be strictly ascending with at least two entries.
    pub fn new(edges: &[f64], n_elements: usize) -> Result<Self, SetupError> {
        let bins = edges.len().saturating_sub(1);
        let mut edge_buf = buffer::with_capacity(edges.len(), "MDF bin edges")?;
        edge_buf.extend_from_slice(edges);
        let pairs: Vec<(usize, usize)> = (1..n_elements)
            .flat_map(|i| (0..i).map(move |j| (i, j)))
            .collect();
        let mut abundances = buffer::with_capacity(n_elements, "MDF")?;
        for _ in 0..n_elements {
            abundances.push(buffer::filled(bins, 0.0, "MDF")?);
        }
        let mut ratios = buffer::with_capacity(pairs.len(), "MDF")?;
        for _ in 0..pairs.len() {
            ratios.push(buffer::filled(bins, 0.0, "MDF")?);
        }
        Ok(Self {
            edges: edge_buf,
            abundances,
            ratios,
            pairs,
            normalized: false,
        })
    }

    /// Bin containing `x`, or `None` if `x` is outside the edges or not finite.
    ///
    /// Bins are half-open `[lo, hi)`.
    pub fn bin_index(&self, x: f64) -> Option<usize> {
        let (first, last) = (*self.edges.first()?, *self.edges.last()?);
        if !x.is_finite() || x < first || x >= last {
            return None;
        }
        Some(self.edges.partition_point(|&e| e <= x) - 1)
    }

    /// Add `weight` at the given per-element [X/H] values.
    ///
    /// Ratios are formed from differences of the abundances. Values that
    /// fall outside the bins or are not finite are skipped.
    pub fn add(&mut self, abundances: &[f64], weight: f64) {
        for (e, &x) in abundances.iter().enumerate() {
            if let (Some(bin), Some(hist)) = (self.bin_index(x), self.abundances.get_mut(e)) {
                hist[bin] += weight;
            }
        }
        for p in 0..self.pairs.len() {
            let (i, j) = self.pairs[p];
            let (Some(&xi), Some(&xj)) = (abundances.get(i), abundances.get(j)) else {
                continue;
            };
            if let Some(bin) = self.bin_index(xi - xj) {
                self.ratios[p][bin] += weight;
            }
        }
        self.normalized = false;
    }

    /// Zero every histogram.
    pub fn reset(&mut self) {
        for hist in self.abundances.iter_mut().chain(self.ratios.iter_mut()) {
            hist.iter_mut().for_each(|v| *v = 0.0);
        }
        self.normalized = false;
    }

    /// Convert every histogram to a probability density.
    ///
    /// Counts are divided by bin width, then rescaled so the width-weighted
    /// sum is exactly one. A histogram with no weight becomes all NaN.
    /// Normalizing an already normalized accumulator only repeats the
    /// rescaling, which leaves it unchanged.
    pub fn normalize(&mut self) {
        let widths: Vec<f64> = self.edges.windows(2).map(|w| w[1] - w[0]).collect();
        let first_pass = !self.normalized;
        for hist in self.abundances.iter_mut().chain(self.ratios.iter_mut()) {
            if first_pass {
                for (v, w) in hist.iter_mut().zip(&widths) {
                    *v /= w;
                }
            }
            let total: f64 = hist.iter().zip(&widths).map(|(v, w)| v * w).sum();
            if total > 0.0 {
                hist.iter_mut().for_each(|v| *v /= total);
            } else {
                hist.iter_mut().for_each(|v| *v = f64::NAN);
            }
        }
        self.normalized = true;
    }

    /// Bin edges.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// [X/H] histogram of element `e`.
    pub fn abundance(&self, e: usize) -> &[f64] {
        &self.abundances[e]
    }

    /// [X/Y] histogram of pair `p`.
    pub fn ratio(&self, p: usize) -> &[f64] {
        &self.ratios[p]
    }

    /// Element index pairs, in histogram order.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Copy the histograms into a table labelled by element symbol.
    pub fn to_table(&self, symbols: &[&str]) -> MdfTable {
        let mut abundances = IndexMap::with_capacity(self.abundances.len());
        for (symbol, hist) in symbols.iter().zip(&self.abundances) {
            abundances.insert(symbol.to_string(), hist.clone());
        }
        let mut ratios = IndexMap::with_capacity(self.ratios.len());
        for (&(i, j), hist) in self.pairs.iter().zip(&self.ratios) {
            if let (Some(x), Some(y)) = (symbols.get(i), symbols.get(j)) {
                ratios.insert(format!("{x}/{y}"), hist.clone());
            }
        }
        MdfTable {
            bin_edges: self.edges.clone(),
            abundances,
            ratios,
        }
    }

    /// Release every histogram.
    pub fn release(&mut self) {
        *self = Self::default();
    }
}

/// [X/H] of `mass` of an element in `gas_mass` of gas.
pub fn abundance_ratio(mass: f64, gas_mass: f64, solar_abundance: f64) -> f64 {
    (mass / gas_mass / solar_abundance).log10()
}
