//! Profile: per-bin running statistics of a filled quantity.
//!
//! Each bin keeps `(entries, sum, sum_sq)` of the values filled into it.
//! The mean and the standard error of the mean are derived on read:
//!
//! ```text
//! mean      = sum / entries
//! variance  = max(sum_sq / entries - mean^2, 0)
//! std_error = sqrt(variance / entries)
//! ```
//!
//! Merging is elementwise addition, so any partition of the input yields the
//! same aggregate; with integer-valued fills the sums are exact and merged
//! results are bit-identical to a single pass.

use hc_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::axis::{Axis, BinLocation};
use crate::series::{BinSeries, BinValue};

/// Running statistics of one profile bin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileBin {
    /// Number of fills.
    pub entries: u64,
    /// Sum of filled values.
    pub sum: f64,
    /// Sum of squared filled values.
    pub sum_sq: f64,
}

impl ProfileBin {
    /// Add one value.
    #[inline]
    pub fn add(&mut self, y: f64) {
        self.entries += 1;
        self.sum += y;
        self.sum_sq += y * y;
    }

    /// Add another bin's statistics.
    #[inline]
    pub fn merge(&mut self, other: &ProfileBin) {
        self.entries += other.entries;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
    }

    /// Mean of the filled values, `None` for an empty bin.
    pub fn mean(&self) -> Option<f64> {
        if self.entries == 0 {
            return None;
        }
        Some(self.sum / self.entries as f64)
    }

    /// Population variance of the filled values, `None` for an empty bin.
    pub fn variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        let n = self.entries as f64;
        Some((self.sum_sq / n - mean * mean).max(0.0))
    }

    /// Standard error of the mean, `None` for an empty bin.
    pub fn std_error(&self) -> Option<f64> {
        let var = self.variance()?;
        Some((var / self.entries as f64).sqrt())
    }
}

/// A uniformly binned profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name (store key).
    pub name: String,
    /// Profile title.
    #[serde(default)]
    pub title: String,
    /// Binning of the x quantity.
    #[serde(flatten)]
    pub axis: Axis,
    /// In-range bins.
    pub bins: Vec<ProfileBin>,
    /// Fills with x below the axis.
    #[serde(default)]
    pub underflow: ProfileBin,
    /// Fills with x at or above the axis end.
    #[serde(default)]
    pub overflow: ProfileBin,
}

impl Profile {
    /// Create an empty profile.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        n_bins: usize,
        x_min: f64,
        x_max: f64,
    ) -> Result<Self> {
        let axis = Axis::new(n_bins, x_min, x_max)?;
        Ok(Self::with_axis(name, title, axis))
    }

    /// Create an empty profile over an existing axis.
    pub fn with_axis(name: impl Into<String>, title: impl Into<String>, axis: Axis) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            axis,
            bins: vec![ProfileBin::default(); axis.n_bins],
            underflow: ProfileBin::default(),
            overflow: ProfileBin::default(),
        }
    }

    /// Number of in-range bins.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.axis.n_bins
    }

    /// Fill value `y` at position `x`.
    pub fn fill(&mut self, x: f64, y: f64) {
        match self.axis.locate(x) {
            BinLocation::Underflow => self.underflow.add(y),
            BinLocation::Overflow => self.overflow.add(y),
            BinLocation::Bin(b) => self.bins[b].add(y),
        }
    }

    /// Fill value `y` directly into bin `bin`.
    pub fn fill_bin(&mut self, bin: usize, y: f64) -> Result<()> {
        let n = self.n_bins();
        if bin >= n {
            return Err(Error::Validation(format!(
                "profile '{}': bin {bin} out of range (n_bins={n})",
                self.name
            )));
        }
        self.bins[bin].add(y);
        Ok(())
    }

    /// Statistics of bin `bin`.
    pub fn bin(&self, bin: usize) -> Option<&ProfileBin> {
        self.bins.get(bin)
    }

    /// Total number of in-range fills.
    pub fn entries(&self) -> u64 {
        self.bins.iter().map(|b| b.entries).sum()
    }

    /// Add another profile with identical binning bin-by-bin.
    pub fn merge(&mut self, other: &Profile) -> Result<()> {
        if !self.axis.same_binning(&other.axis) {
            return Err(Error::Validation(format!(
                "cannot merge profile '{}' into '{}': binning differs",
                other.name, self.name
            )));
        }
        for (a, b) in self.bins.iter_mut().zip(&other.bins) {
            a.merge(b);
        }
        self.underflow.merge(&other.underflow);
        self.overflow.merge(&other.overflow);
        Ok(())
    }

    /// Per-bin mean ± standard error; empty bins are undefined.
    pub fn projection(&self) -> BinSeries {
        let values = self
            .bins
            .iter()
            .map(|b| match (b.mean(), b.std_error()) {
                (Some(value), Some(error)) => Some(BinValue { value, error }),
                _ => None,
            })
            .collect();
        BinSeries { name: self.name.clone(), axis: self.axis, values }
    }

    /// Check internal consistency after deserialization.
    pub fn validate(&self) -> Result<()> {
        self.axis.validate()?;
        if self.bins.len() != self.n_bins() {
            return Err(Error::Validation(format!(
                "profile '{}': expected {} bins, got {}",
                self.name,
                self.n_bins(),
                self.bins.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bin_statistics() {
        let mut b = ProfileBin::default();
        for y in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            b.add(y);
        }
        assert_eq!(b.entries, 8);
        assert_eq!(b.mean(), Some(5.0));
        assert_eq!(b.variance(), Some(4.0));
        assert_relative_eq!(b.std_error().unwrap(), (4.0f64 / 8.0).sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn empty_bin_is_undefined() {
        let b = ProfileBin::default();
        assert_eq!(b.mean(), None);
        assert_eq!(b.std_error(), None);
    }

    #[test]
    fn identical_fills_have_zero_error() {
        let mut b = ProfileBin::default();
        for _ in 0..1000 {
            b.add(5.0);
        }
        assert_eq!(b.mean(), Some(5.0));
        assert_eq!(b.std_error(), Some(0.0));
    }

    #[test]
    fn fill_by_position_and_bin() {
        let mut p = Profile::new("pion", "", 10, 0.0, 10.0).unwrap();
        p.fill(9.5, 3.0);
        p.fill(9.5, 5.0);
        p.fill(-0.5, 1.0);
        p.fill_bin(0, 2.0).unwrap();
        assert!(p.fill_bin(10, 2.0).is_err());

        assert_eq!(p.bins[9].entries, 2);
        assert_eq!(p.bins[9].mean(), Some(4.0));
        assert_eq!(p.bins[0].sum, 2.0);
        assert_eq!(p.underflow.entries, 1);
        assert_eq!(p.entries(), 3);
    }

    #[test]
    fn projection_skips_empty_bins() {
        let mut p = Profile::new("kaon", "", 3, 0.0, 3.0).unwrap();
        p.fill_bin(1, 1.0).unwrap();
        p.fill_bin(1, 3.0).unwrap();
        let s = p.projection();
        assert!(s.values[0].is_none());
        let v = s.values[1].unwrap();
        assert_eq!(v.value, 2.0);
        assert_relative_eq!(v.error, (1.0f64 / 2.0).sqrt(), epsilon = 1e-15);
        assert!(s.values[2].is_none());
    }
}
