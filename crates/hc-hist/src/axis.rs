//! Uniform binning shared by histograms and profiles.

use hc_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Where a value lands on an [`Axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinLocation {
    /// Below the lower edge of the first bin.
    Underflow,
    /// In-range bin index (0-based).
    Bin(usize),
    /// At or above the upper edge of the last bin (NaN included).
    Overflow,
}

/// `n_bins` uniform bins over `[x_min, x_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Number of bins (excluding under/overflow).
    pub n_bins: usize,
    /// Lower edge of first bin.
    pub x_min: f64,
    /// Upper edge of last bin.
    pub x_max: f64,
}

impl Axis {
    /// Create a validated axis.
    pub fn new(n_bins: usize, x_min: f64, x_max: f64) -> Result<Self> {
        let axis = Self { n_bins, x_min, x_max };
        axis.validate()?;
        Ok(axis)
    }

    /// Check the invariants (`n_bins > 0`, finite edges, `x_max > x_min`).
    pub fn validate(&self) -> Result<()> {
        if self.n_bins == 0 {
            return Err(Error::Validation("axis must have at least one bin".into()));
        }
        if !self.x_min.is_finite() || !self.x_max.is_finite() || self.x_max <= self.x_min {
            return Err(Error::Validation(format!(
                "invalid axis range [{}, {})",
                self.x_min, self.x_max
            )));
        }
        Ok(())
    }

    /// Width of every bin.
    #[inline]
    pub fn bin_width(&self) -> f64 {
        (self.x_max - self.x_min) / self.n_bins as f64
    }

    /// Lower edge of bin `i`.
    #[inline]
    pub fn bin_low_edge(&self, i: usize) -> f64 {
        self.x_min + i as f64 * self.bin_width()
    }

    /// Centre of bin `i`.
    #[inline]
    pub fn bin_center(&self, i: usize) -> f64 {
        self.x_min + (i as f64 + 0.5) * self.bin_width()
    }

    /// All bin edges (length `n_bins + 1`).
    pub fn bin_edges(&self) -> Vec<f64> {
        (0..=self.n_bins).map(|i| self.bin_low_edge(i)).collect()
    }

    /// Locate `x`. Lower edges are inclusive, upper edges exclusive.
    pub fn locate(&self, x: f64) -> BinLocation {
        if x < self.x_min {
            return BinLocation::Underflow;
        }
        if x.is_nan() || x >= self.x_max {
            return BinLocation::Overflow;
        }
        let idx = ((x - self.x_min) / self.bin_width()).floor() as usize;
        // Rounding can push values just below an edge into the next bin.
        let idx = idx.min(self.n_bins - 1);
        if idx > 0 && x < self.bin_low_edge(idx) {
            BinLocation::Bin(idx - 1)
        } else {
            BinLocation::Bin(idx)
        }
    }

    /// Whether two axes bin identically.
    pub fn same_binning(&self, other: &Axis) -> bool {
        self.n_bins == other.n_bins && self.x_min == other.x_min && self.x_max == other.x_max
    }
}
