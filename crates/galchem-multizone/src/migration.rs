//! Migration tables and deterministic gas/element transfer.
//!
//! Users quote migration as the probability per 10 Myr that material in
//! zone `i` moves to zone `j`. A [`MigrationTable`] holds those raw values;
//! [`MigrationTable::normalize()`] rescales them to the run's timestep,
//! forces the diagonal to zero, and checks that no zone gives away more
//! than everything it holds.

use galchem_core::{buffer, SetupError, ZoneId, MIGRATION_REFERENCE_INTERVAL};
use galchem_zone::Zone;

/// Tolerance on a normalized row sum above one.
const ROW_SUM_TOLERANCE: f64 = 1e-12;

/// User-supplied migration probabilities per 10 Myr.
///
/// Values are stored row-major: `values[(t * k + i) * k + j]` is the
/// probability of moving from zone `i` to zone `j` at timestep `t`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum MigrationTable {
    /// No migration.
    #[default]
    None,
    /// The same `k x k` table at every timestep.
    Static(Vec<f64>),
    /// One `k x k` table per timestep.
    TimeVarying(Vec<f64>),
}

impl MigrationTable {
    /// A static table with entry `f(i, j)` for `k` zones.
    pub fn from_fn(k: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(k * k);
        for i in 0..k {
            for j in 0..k {
                values.push(f(i, j));
            }
        }
        Self::Static(values)
    }

    /// A time-varying table with entry `f(t, i, j)` for `timesteps`
    /// timesteps and `k` zones.
    pub fn time_varying_from_fn(
        timesteps: usize,
        k: usize,
        f: impl Fn(usize, usize, usize) -> f64,
    ) -> Self {
        let mut values = Vec::with_capacity(timesteps * k * k);
        for t in 0..timesteps {
            for i in 0..k {
                for j in 0..k {
                    values.push(f(t, i, j));
                }
            }
        }
        Self::TimeVarying(values)
    }

    /// Rescale to a timestep of `dt` Gyr for `k` zones and a run of
    /// `timesteps` steps.
    ///
    /// Fails with [`SetupError::MigrationShape`] if the table does not
    /// match `k` or covers fewer timesteps than the run, and with
    /// [`SetupError::MigrationOverflow`] if a zone's outgoing probability
    /// exceeds one after rescaling.
    pub fn normalize(
        &self,
        k: usize,
        dt: f64,
        timesteps: usize,
    ) -> Result<MigrationMatrix, SetupError> {
        let per_step = k * k;
        let (raw, rows): (&[f64], usize) = match self {
            Self::None => return MigrationMatrix::zero(k),
            Self::Static(values) => {
                if values.len() != per_step {
                    return Err(SetupError::MigrationShape {
                        reason: format!(
                            "static table has {} entries, expected {k} x {k}",
                            values.len()
                        ),
                    });
                }
                (values, 1)
            }
            Self::TimeVarying(values) => {
                if per_step == 0 || values.len() % per_step != 0 {
                    return Err(SetupError::MigrationShape {
                        reason: format!(
                            "time-varying table has {} entries, not a multiple of {k} x {k}",
                            values.len()
                        ),
                    });
                }
                let rows = values.len() / per_step;
                if rows < timesteps {
                    return Err(SetupError::MigrationShape {
                        reason: format!("table covers {rows} timesteps, run needs {timesteps}"),
                    });
                }
                (values, rows)
            }
        };
        let scale = dt / MIGRATION_REFERENCE_INTERVAL;
        let mut values = buffer::with_capacity(raw.len(), "migration matrix")?;
        for t in 0..rows {
            for i in 0..k {
                let mut total = 0.0;
                for j in 0..k {
                    let p = raw[(t * k + i) * k + j];
                    if !(p.is_finite() && p >= 0.0) {
                        return Err(SetupError::InvalidParameter {
                            name: format!("migration[{t}][{i}][{j}]"),
                            reason: format!("probability {p} must be finite and non-negative"),
                        });
                    }
                    let p = if i == j { 0.0 } else { p * scale };
                    total += p;
                    values.push(p);
                }
                if total > 1.0 + ROW_SUM_TOLERANCE {
                    return Err(SetupError::MigrationOverflow {
                        timestep: t,
                        zone: ZoneId(i as u32),
                        total,
                    });
                }
            }
        }
        Ok(MigrationMatrix { k, rows, values })
    }
}

/// Migration probabilities per timestep, normalized to the run's `dt`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MigrationMatrix {
    k: usize,
    rows: usize,
    values: Vec<f64>,
}

impl MigrationMatrix {
    /// A matrix that never migrates anything.
    pub fn zero(k: usize) -> Result<Self, SetupError> {
        Ok(Self {
            k,
            rows: 1,
            values: buffer::filled(k * k, 0.0, "migration matrix")?,
        })
    }

    /// Number of zones.
    pub fn zones(&self) -> usize {
        self.k
    }

    /// Outgoing probabilities of zone `i` at timestep `t`.
    ///
    /// Timesteps past the last stored table reuse it.
    pub fn row(&self, t: usize, i: usize) -> &[f64] {
        let t = t.min(self.rows.saturating_sub(1));
        let start = (t * self.k + i) * self.k;
        &self.values[start..start + self.k]
    }

    /// Probability of moving from zone `i` to zone `j` at timestep `t`.
    pub fn probability(&self, t: usize, i: usize, j: usize) -> f64 {
        self.row(t, i)[j]
    }

    /// Whether every entry is zero.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&p| p == 0.0)
    }

    /// Release the backing storage.
    pub fn release(&mut self) {
        *self = Self::default();
    }
}

// ── Gas and element transfer ───────────────────────────────────────

/// Scratch space for [`migrate_gas()`](Self::migrate_gas), reused across
/// timesteps.
#[derive(Clone, Debug, Default)]
pub struct MassTransfer {
    gas: Vec<f64>,
    elements: Vec<f64>,
}

impl MassTransfer {
    /// Scratch for `k` zones of `n_elements` elements each.
    pub fn new(k: usize, n_elements: usize) -> Result<Self, SetupError> {
        Ok(Self {
            gas: buffer::filled(k, 0.0, "gas transfer")?,
            elements: buffer::filled(k * n_elements, 0.0, "element transfer")?,
        })
    }

    /// Move gas and every element between zones at timestep `t`.
    ///
    /// All transfers are computed from the pre-migration masses before any
    /// zone is changed. Afterwards gas masses are clamped to the floor and
    /// element masses at zero.
    pub fn migrate_gas(&mut self, zones: &mut [Zone], matrix: &MigrationMatrix, t: usize) {
        let k = zones.len();
        let n_elements = zones.first().map_or(0, |z| z.elements().len());
        self.gas.iter_mut().for_each(|v| *v = 0.0);
        self.elements.iter_mut().for_each(|v| *v = 0.0);

        for i in 0..k {
            let row = matrix.row(t, i);
            let gas = zones[i].ism().gas_mass();
            for (j, &p) in row.iter().enumerate() {
                if p == 0.0 {
                    continue;
                }
                let moved = p * gas;
                self.gas[i] -= moved;
                self.gas[j] += moved;
                for e in 0..n_elements {
                    let moved = p * zones[i].element_mass(e);
                    self.elements[i * n_elements + e] -= moved;
                    self.elements[j * n_elements + e] += moved;
                }
            }
        }

        for (i, zone) in zones.iter_mut().enumerate() {
            let gas = zone.ism().gas_mass() + self.gas[i];
            zone.set_gas_mass(gas);
            for e in 0..n_elements {
                let mass = zone.element_mass(e) + self.elements[i * n_elements + e];
                zone.set_element_mass(e, mass);
            }
        }
    }

    /// Release the scratch space.
    pub fn release(&mut self) {
        *self = Self::default();
    }
}
