//! Percentile boundaries from a calibration histogram.
//!
//! For a threshold `p` (percent) the boundary is the centre of the highest
//! bin `b` whose upper-tail integral `Σ_{i ≥ b} content_i × width` reaches
//! `p/100 × total`. Tail integrals come from one suffix-sum array that also
//! provides `total`, so `p = 100` lands exactly on the lowest non-empty bin.

use std::fmt::Write as _;

use hc_core::{Error, Result};
use hc_hist::Histogram;
use serde::{Deserialize, Serialize};

/// Multiplicity-class percentages (the default threshold list).
pub const MULTIPLICITY_CLASS_PERCENTILES: [f64; 10] =
    [0.95, 4.7, 9.5, 14.0, 19.0, 28.0, 38.0, 48.0, 68.0, 100.0];

/// Round-number percentages.
pub const ROUND_PERCENTILES: [f64; 10] = [1.0, 5.0, 10.0, 15.0, 20.0, 30.0, 40.0, 50.0, 70.0, 100.0];

/// How the boundary bin is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Scan downward from the last bin.
    LinearScan,
    /// Partition point over the non-increasing tail integrals.
    #[default]
    BinarySearch,
}

/// Boundary value for every threshold, in threshold order.
///
/// Thresholds must be finite and positive. A threshold that no bin reaches
/// (`p > 100`, or rounding at `p = 100`) falls back to the lowest bin centre.
pub fn percentile_boundaries(
    hist: &Histogram,
    thresholds: &[f64],
    strategy: SearchStrategy,
) -> Result<Vec<f64>> {
    if thresholds.is_empty() {
        return Err(Error::Validation("percentile threshold list is empty".into()));
    }
    if let Some(p) = thresholds.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
        return Err(Error::Validation(format!("invalid percentile threshold {p}")));
    }
    if let Some(c) = hist.bin_content.iter().find(|c| !(c.is_finite() && **c >= 0.0)) {
        return Err(Error::Validation(format!(
            "histogram '{}' has a negative or non-finite bin ({c})",
            hist.name
        )));
    }

    let tails = hist.upper_tail_integrals_width();
    let total = tails.first().copied().unwrap_or(0.0);
    if !(total > 0.0) {
        return Err(Error::Validation(format!(
            "histogram '{}' has zero integral; cannot derive percentiles",
            hist.name
        )));
    }

    let boundaries = thresholds
        .iter()
        .map(|&p| {
            let target = p / 100.0 * total;
            let bin = match strategy {
                SearchStrategy::LinearScan => (0..tails.len()).rev().find(|&b| tails[b] >= target),
                SearchStrategy::BinarySearch => {
                    tails.partition_point(|&t| t >= target).checked_sub(1)
                }
            };
            match bin {
                Some(b) => hist.bin_center(b),
                None => {
                    tracing::warn!(threshold = p, "no bin reaches percentile target; using lowest bin");
                    hist.bin_center(0)
                }
            }
        })
        .collect();
    Ok(boundaries)
}

/// `p% -> boundary` lines for validation output.
pub fn format_boundaries(thresholds: &[f64], boundaries: &[f64]) -> String {
    let mut out = String::new();
    for (p, b) in thresholds.iter().zip(boundaries) {
        let _ = writeln!(out, "Percentile {p}%: {b}");
    }
    out
}
