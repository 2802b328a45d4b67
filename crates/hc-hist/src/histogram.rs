//! Uniform 1D histogram.

use hc_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::axis::{Axis, BinLocation};

/// A uniformly binned 1D histogram of weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Histogram name (store key).
    pub name: String,
    /// Histogram title.
    #[serde(default)]
    pub title: String,
    /// Binning.
    #[serde(flatten)]
    pub axis: Axis,
    /// Bin contents (sum of weights per bin, length = n_bins).
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin.
    pub sumw2: Vec<f64>,
    /// Underflow sum of weights.
    #[serde(default)]
    pub underflow: f64,
    /// Overflow sum of weights.
    #[serde(default)]
    pub overflow: f64,
    /// Number of fills, under/overflow included.
    #[serde(default)]
    pub entries: u64,
}

impl Histogram {
    /// Create an empty histogram with `n_bins` uniform bins over `[x_min, x_max)`.
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

    /// Create an empty histogram over an existing axis.
    pub fn with_axis(name: impl Into<String>, title: impl Into<String>, axis: Axis) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            axis,
            bin_content: vec![0.0; axis.n_bins],
            sumw2: vec![0.0; axis.n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    /// Number of in-range bins.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.axis.n_bins
    }

    /// Centre of bin `i`.
    #[inline]
    pub fn bin_center(&self, i: usize) -> f64 {
        self.axis.bin_center(i)
    }

    /// Fill `x` with unit weight.
    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    /// Fill `x` with weight `w`.
    pub fn fill_weighted(&mut self, x: f64, w: f64) {
        self.entries += 1;
        match self.axis.locate(x) {
            BinLocation::Underflow => self.underflow += w,
            BinLocation::Overflow => self.overflow += w,
            BinLocation::Bin(b) => {
                self.bin_content[b] += w;
                self.sumw2[b] += w * w;
            }
        }
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }

    /// Sum of in-range `content × width` (the "width" integral).
    pub fn integral_width(&self) -> f64 {
        self.upper_tail_integrals_width().first().copied().unwrap_or(0.0)
    }

    /// Width-weighted integral from bin `b` to the last bin, for every `b`.
    ///
    /// Element 0 is the full integral. The sequence is non-increasing for
    /// non-negative contents, and the same array backs [`integral_width`]
    /// so a tail that covers every non-empty bin equals the total exactly.
    ///
    /// [`integral_width`]: Histogram::integral_width
    pub fn upper_tail_integrals_width(&self) -> Vec<f64> {
        let w = self.axis.bin_width();
        let mut tails = vec![0.0; self.n_bins()];
        let mut acc = 0.0;
        for b in (0..self.n_bins()).rev() {
            acc += self.bin_content[b] * w;
            tails[b] = acc;
        }
        tails
    }

    /// Multiply every bin (and under/overflow) by `factor`.
    pub fn scale(&mut self, factor: f64) {
        let f2 = factor * factor;
        for (c, s) in self.bin_content.iter_mut().zip(self.sumw2.iter_mut()) {
            *c *= factor;
            *s *= f2;
        }
        self.underflow *= factor;
        self.overflow *= factor;
    }

    /// Scale so that `Σ content × width = 1` (a density).
    ///
    /// A histogram with zero (or non-finite) integral cannot be normalized;
    /// this is an input error, typically an empty event source.
    pub fn normalize_by_width(&mut self) -> Result<()> {
        let integral = self.integral_width();
        if !(integral.is_finite() && integral > 0.0) {
            return Err(Error::Validation(format!(
                "cannot normalize histogram '{}': integral is {integral}",
                self.name
            )));
        }
        self.scale(1.0 / integral);
        Ok(())
    }

    /// Add another histogram with identical binning bin-by-bin.
    pub fn merge(&mut self, other: &Histogram) -> Result<()> {
        if !self.axis.same_binning(&other.axis) {
            return Err(Error::Validation(format!(
                "cannot merge '{}' into '{}': binning differs",
                other.name, self.name
            )));
        }
        for (a, b) in self.bin_content.iter_mut().zip(&other.bin_content) {
            *a += b;
        }
        for (a, b) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *a += b;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.entries += other.entries;
        Ok(())
    }

    /// Check internal consistency after deserialization.
    pub fn validate(&self) -> Result<()> {
        self.axis.validate()?;
        if self.bin_content.len() != self.n_bins() || self.sumw2.len() != self.n_bins() {
            return Err(Error::Validation(format!(
                "histogram '{}': expected {} bins, got content={} sumw2={}",
                self.name,
                self.n_bins(),
                self.bin_content.len(),
                self.sumw2.len()
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
    fn fill_simple() {
        let mut h = Histogram::new("h", "", 3, 0.0, 3.0).unwrap();
        for x in [0.5, 1.5, 2.5, 0.5, -1.0, 3.5] {
            h.fill(x);
        }
        assert_eq!(h.bin_content, vec![2.0, 1.0, 1.0]);
        assert_eq!(h.underflow, 1.0);
        assert_eq!(h.overflow, 1.0);
        assert_eq!(h.entries, 6);
        assert_eq!(h.integral(), 4.0);
    }

    #[test]
    fn fill_with_weight() {
        let mut h = Histogram::new("h", "", 2, 0.0, 2.0).unwrap();
        h.fill_weighted(0.5, 2.0);
        h.fill_weighted(1.5, 3.0);
        h.fill_weighted(0.5, 1.0);
        assert_eq!(h.bin_content, vec![3.0, 3.0]);
        assert_eq!(h.sumw2, vec![5.0, 9.0]);
    }

    #[test]
    fn normalize_makes_density() {
        let mut h = Histogram::new("calibration", "", 100, 0.0, 200.0).unwrap();
        for n in [0, 3, 3, 7, 12, 12, 12, 40, 41, 150] {
            h.fill(n as f64);
        }
        assert_eq!(h.integral_width(), 20.0);
        h.normalize_by_width().unwrap();
        assert_relative_eq!(h.integral_width(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(h.integral(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn normalize_rejects_empty() {
        let mut h = Histogram::new("calibration", "", 100, 0.0, 200.0).unwrap();
        let err = h.normalize_by_width().unwrap_err();
        assert!(err.to_string().contains("integral is 0"));

        // Overflow-only content does not count towards the integral.
        h.fill(500.0);
        assert!(h.normalize_by_width().is_err());
    }

    #[test]
    fn tail_integrals_are_suffix_sums() {
        let mut h = Histogram::new("h", "", 4, 0.0, 8.0).unwrap();
        h.fill(1.0);
        h.fill(5.0);
        h.fill(5.5);
        let tails = h.upper_tail_integrals_width();
        assert_eq!(tails, vec![6.0, 4.0, 4.0, 0.0]);
        assert_eq!(h.integral_width(), tails[0]);
    }

    #[test]
    fn merge_requires_same_binning() {
        let mut a = Histogram::new("a", "", 2, 0.0, 2.0).unwrap();
        let mut b = Histogram::new("b", "", 2, 0.0, 2.0).unwrap();
        a.fill(0.5);
        b.fill(1.5);
        b.fill(9.0);
        a.merge(&b).unwrap();
        assert_eq!(a.bin_content, vec![1.0, 1.0]);
        assert_eq!(a.overflow, 1.0);
        assert_eq!(a.entries, 3);

        let c = Histogram::new("c", "", 3, 0.0, 2.0).unwrap();
        assert!(a.merge(&c).is_err());
    }
}
