//! Stellar initial mass functions.

/// An initial mass function, `dN/dm` up to a normalization constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Imf {
    /// Salpeter (1955): a single power law of slope -2.35.
    Salpeter,
    /// Kroupa (2001): slopes -0.3, -1.3 and -2.3 broken at 0.08 and 0.5
    /// solar masses, continuous at both breaks.
    Kroupa,
}

impl Imf {
    /// Unnormalized number of stars per unit mass at mass `m`.
    pub fn dn_dm(self, m: f64) -> f64 {
        if m.is_nan() || m <= 0.0 {
            return 0.0;
        }
        match self {
            Self::Salpeter => m.powf(-2.35),
            Self::Kroupa => {
                if m < 0.08 {
                    m.powf(-0.3)
                } else if m < 0.5 {
                    0.08 * m.powf(-1.3)
                } else {
                    0.04 * m.powf(-2.3)
                }
            }
        }
    }

    /// Unnormalized mass per unit mass at mass `m`, `m * dN/dm`.
    pub fn mass_weighted(self, m: f64) -> f64 {
        m * self.dn_dm(m)
    }

    /// Parse a lowercase IMF name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "salpeter" => Some(Self::Salpeter),
            "kroupa" => Some(Self::Kroupa),
            _ => None,
        }
    }
}
