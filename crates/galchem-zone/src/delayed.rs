//! Mass released over one step by previously formed stellar populations.
//!
//! Filled either by the single-zone convolution over the zone's own star
//! formation history or by the multi-zone tracer scan. Values are masses
//! in solar masses before entrainment; the receiving zone applies its own
//! entrainment fractions.

use smallvec::SmallVec;

/// Delayed production of one element over one step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DelayedElementYields {
    /// Type Ia supernova production.
    pub sneia: f64,
    /// AGB production.
    pub agb: f64,
    /// Element mass in recycled gas.
    pub recycled: f64,
    /// Production of each custom channel, in configuration order.
    pub channels: SmallVec<[f64; 4]>,
}

impl DelayedElementYields {
    /// Zeroed yields for an element with `channels` custom channels.
    pub fn with_channels(channels: usize) -> Self {
        Self {
            channels: SmallVec::from_elem(0.0, channels),
            ..Self::default()
        }
    }

    fn clear(&mut self) {
        self.sneia = 0.0;
        self.agb = 0.0;
        self.recycled = 0.0;
        self.channels.iter_mut().for_each(|c| *c = 0.0);
    }
}

/// Delayed production of every element and of recycled gas over one step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DelayedYields {
    /// Gas returned to the ISM.
    pub recycled: f64,
    /// Per-element production, in the zone's element order.
    pub elements: Vec<DelayedElementYields>,
}

impl DelayedYields {
    /// Zeroed yields shaped by the channel count of each element.
    pub fn with_shape(channels: impl IntoIterator<Item = usize>) -> Self {
        Self {
            recycled: 0.0,
            elements: channels
                .into_iter()
                .map(DelayedElementYields::with_channels)
                .collect(),
        }
    }

    /// Zero every entry, keeping the shape.
    pub fn clear(&mut self) {
        self.recycled = 0.0;
        self.elements.iter_mut().for_each(DelayedElementYields::clear);
    }
}
