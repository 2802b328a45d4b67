//! Binned value ± error series (profile projections and their ratios).

use std::fmt::Write as _;

use hc_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::axis::Axis;

/// One defined bin of a [`BinSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinValue {
    /// Central value.
    pub value: f64,
    /// Statistical error.
    pub error: f64,
}

/// Per-bin values over an [`Axis`]; `None` marks an undefined bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSeries {
    /// Series name.
    pub name: String,
    /// Binning.
    pub axis: Axis,
    /// One slot per bin.
    pub values: Vec<Option<BinValue>>,
}

impl BinSeries {
    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.axis.n_bins
    }

    /// Same series under a new name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Multiply values and errors by `factor`.
    pub fn scaled(&self, factor: f64) -> BinSeries {
        let values = self
            .values
            .iter()
            .map(|v| {
                v.map(|b| BinValue { value: b.value * factor, error: (b.error * factor).abs() })
            })
            .collect();
        BinSeries { name: self.name.clone(), axis: self.axis, values }
    }

    /// Bin-by-bin quotient `self / den` with uncorrelated error propagation:
    ///
    /// ```text
    /// r = n / d
    /// σ = sqrt(σn² d² + σd² n²) / d²
    /// ```
    ///
    /// A bin is undefined when either side is undefined or `d == 0`.
    pub fn divide(&self, den: &BinSeries) -> Result<BinSeries> {
        if !self.axis.same_binning(&den.axis) {
            return Err(Error::Validation(format!(
                "cannot divide '{}' by '{}': binning differs",
                self.name, den.name
            )));
        }
        let values = self
            .values
            .iter()
            .zip(&den.values)
            .map(|(n, d)| match (n, d) {
                (Some(n), Some(d)) => divide_values(*n, *d),
                _ => None,
            })
            .collect();
        Ok(BinSeries { name: self.name.clone(), axis: self.axis, values })
    }

    /// Merge adjacent bin pairs `(0,1), (2,3), …`: values add, errors add in
    /// quadrature. A pair with an undefined member is undefined. Requires an
    /// even number of bins.
    pub fn combine_pairs(&self) -> Result<BinSeries> {
        let n = self.n_bins();
        if n % 2 != 0 {
            return Err(Error::Validation(format!(
                "cannot combine bin pairs of '{}': {n} bins is odd",
                self.name
            )));
        }
        let values = self
            .values
            .chunks_exact(2)
            .map(|pair| match (pair[0], pair[1]) {
                (Some(a), Some(b)) => Some(BinValue {
                    value: a.value + b.value,
                    error: a.error.hypot(b.error),
                }),
                _ => None,
            })
            .collect();
        let axis = Axis::new(n / 2, self.axis.x_min, self.axis.x_max)?;
        Ok(BinSeries { name: self.name.clone(), axis, values })
    }

    /// Validation printout, one line per bin:
    /// `Bin i: Value = v, Error = e` (1-based, undefined bins print `undefined`).
    pub fn format_bins(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}:", self.name);
        for (i, v) in self.values.iter().enumerate() {
            let _ = match v {
                Some(b) => writeln!(out, "Bin {}: Value = {}, Error = {}", i + 1, b.value, b.error),
                None => writeln!(out, "Bin {}: undefined", i + 1),
            };
        }
        out
    }
}

fn divide_values(n: BinValue, d: BinValue) -> Option<BinValue> {
    if d.value == 0.0 {
        return None;
    }
    let d2 = d.value * d.value;
    let value = n.value / d.value;
    let error = ((n.error * n.error) * d2 + (d.error * d.error) * (n.value * n.value)).sqrt() / d2;
    Some(BinValue { value, error })
}
