//! Centrality classifiers.
//!
//! Two conventions are kept apart on purpose:
//!
//! - [`PercentileClassifier`] maps a forward-track count through percentile
//!   boundaries with a strict "greater than" scan, producing the real index
//!   `n − 0.5, n − 1.5, …, 0.5`.
//! - [`FixedEdgeClassifier`] maps a centrality percentage through an
//!   ascending edge table; the first interval is the highest class.
//!
//! Values outside every class are assigned a fallback class instead of being
//! dropped, and flagged on the returned [`CentralityClass`].

use hc_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Canonical centrality edges (percent) for the fixed-edge policy.
pub const CANONICAL_CENTRALITY_EDGES: [f64; 11] =
    [0.0, 0.95, 4.7, 9.5, 14.0, 19.0, 28.0, 38.0, 48.0, 68.0, 100.0];

/// A class assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentralityClass {
    /// Class bin, `0..n_classes`.
    pub bin: usize,
    /// Whether the value was outside every class and took the fallback.
    pub fallback: bool,
}

impl CentralityClass {
    /// Bin centre on the class axis (`bin + 0.5`).
    #[inline]
    pub fn center(&self) -> f64 {
        self.bin as f64 + 0.5
    }
}

/// Maps one per-event scalar to a class.
pub trait Classifier {
    /// Number of classes.
    fn n_classes(&self) -> usize;

    /// Classify `value`.
    fn classify(&self, value: f64) -> CentralityClass;
}

/// Percentile-boundary policy over forward-track counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileClassifier {
    boundaries: Vec<f64>,
}

impl PercentileClassifier {
    /// Boundaries in threshold order (one class per boundary).
    pub fn new(boundaries: Vec<f64>) -> Result<Self> {
        if boundaries.is_empty() {
            return Err(Error::Validation("percentile classifier needs boundaries".into()));
        }
        if let Some(b) = boundaries.iter().find(|b| !b.is_finite()) {
            return Err(Error::Validation(format!("non-finite class boundary {b}")));
        }
        Ok(Self { boundaries })
    }

    /// The boundaries, in scan order.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Real-valued class index before the fallback clamp.
    ///
    /// Starts at `n − 0.5` and walks the boundaries in order: the first
    /// boundary `count` strictly exceeds stops the walk, any other boundary
    /// lowers the index by one. May return `−0.5`.
    pub fn raw_index(&self, count: f64) -> f64 {
        let mut index = self.boundaries.len() as f64 - 0.5;
        for &b in &self.boundaries {
            if count > b {
                break;
            }
            index -= 1.0;
        }
        index
    }

    /// Class index in `{0.5, …, n − 0.5}`; below-range counts take `0.5`.
    pub fn class_index(&self, count: f64) -> f64 {
        self.raw_index(count).max(0.5)
    }
}

impl Classifier for PercentileClassifier {
    fn n_classes(&self) -> usize {
        self.boundaries.len()
    }

    fn classify(&self, count: f64) -> CentralityClass {
        let raw = self.raw_index(count);
        if raw < 0.5 {
            return CentralityClass { bin: 0, fallback: true };
        }
        CentralityClass { bin: (raw - 0.5) as usize, fallback: false }
    }
}

/// Fixed-edge policy over a centrality percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedEdgeClassifier {
    edges: Vec<f64>,
}

impl Default for FixedEdgeClassifier {
    fn default() -> Self {
        Self { edges: CANONICAL_CENTRALITY_EDGES.to_vec() }
    }
}

impl FixedEdgeClassifier {
    /// Strictly ascending edges; `edges.len() − 1` classes.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::Validation(format!(
                "fixed-edge classifier needs at least 2 edges, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Validation(format!(
                "class edges must be finite and strictly ascending: {edges:?}"
            )));
        }
        Ok(Self { edges })
    }

    /// The edge table.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }
}

impl Classifier for FixedEdgeClassifier {
    fn n_classes(&self) -> usize {
        self.edges.len() - 1
    }

    /// `edges[k] ≤ c < edges[k+1]` gives class `n − 1 − k`. Anything outside
    /// `[edges[0], edges[n])`, NaN included, takes class `0`.
    fn classify(&self, c: f64) -> CentralityClass {
        let n = self.n_classes();
        if c.is_nan() || c < self.edges[0] || c >= self.edges[n] {
            return CentralityClass { bin: 0, fallback: true };
        }
        let k = self.edges.partition_point(|&e| e <= c) - 1;
        CentralityClass { bin: n - 1 - k, fallback: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascending() -> PercentileClassifier {
        PercentileClassifier::new(vec![5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0])
            .unwrap()
    }

    fn descending() -> PercentileClassifier {
        PercentileClassifier::new(vec![50.0, 45.0, 40.0, 35.0, 30.0, 25.0, 20.0, 15.0, 10.0, 5.0])
            .unwrap()
    }

    #[test]
    fn percentile_policy_ascending_list() {
        let c = ascending();
        // Anything above the first boundary stops immediately.
        let idx: Vec<f64> = [0.0, 5.0, 12.0, 50.0, 51.0].iter().map(|&n| c.class_index(n)).collect();
        assert_eq!(idx, vec![0.5, 0.5, 9.5, 9.5, 9.5]);
        assert_eq!(c.raw_index(5.0), -0.5);
    }

    #[test]
    fn percentile_policy_descending_list() {
        // Boundaries as produced from ascending percentages.
        let c = descending();
        let idx: Vec<f64> =
            [0.0, 5.0, 12.0, 50.0, 51.0].iter().map(|&n| c.class_index(n)).collect();
        assert_eq!(idx, vec![0.5, 0.5, 1.5, 8.5, 9.5]);
    }

    #[test]
    fn percentile_policy_equality_continues() {
        let c = descending();
        assert_eq!(c.class_index(45.0), 7.5);
        assert_eq!(c.class_index(45.5), 8.5);
    }

    #[test]
    fn percentile_policy_fallback_is_flagged() {
        let c = descending();
        assert_eq!(c.classify(3.0), CentralityClass { bin: 0, fallback: true });
        assert_eq!(c.classify(6.0), CentralityClass { bin: 0, fallback: false });
        assert_eq!(c.classify(1000.0), CentralityClass { bin: 9, fallback: false });
        assert_eq!(c.classify(1000.0).center(), 9.5);
    }

    #[test]
    fn fixed_edge_policy() {
        let c = FixedEdgeClassifier::new(vec![0.0, 1.0, 5.0, 10.0, 100.0]).unwrap();
        assert_eq!(c.n_classes(), 4);
        assert_eq!(c.classify(3.0).bin, 2);
        assert_eq!(c.classify(0.0).bin, 3);
        assert_eq!(c.classify(1.0).bin, 2);
        assert_eq!(c.classify(99.9).bin, 0);
        assert!(!c.classify(99.9).fallback);
    }

    #[test]
    fn fixed_edge_fallbacks() {
        let c = FixedEdgeClassifier::new(vec![0.0, 1.0, 5.0, 10.0, 100.0]).unwrap();
        assert_eq!(c.classify(100.0), CentralityClass { bin: 0, fallback: true });
        assert_eq!(c.classify(f64::NAN), CentralityClass { bin: 0, fallback: true });
        assert_eq!(c.classify(-1.0), CentralityClass { bin: 0, fallback: true });
        assert_eq!(c.classify(0.0), CentralityClass { bin: 3, fallback: false });
    }

    #[test]
    fn below_first_edge_takes_lowest_class() {
        let c = FixedEdgeClassifier::new(vec![0.0, 10.0, 20.0, 30.0, 40.0]).unwrap();
        assert_eq!(c.classify(-1.0), CentralityClass { bin: 0, fallback: true });
        assert_eq!(c.classify(f64::NEG_INFINITY).bin, 0);
        assert_eq!(c.classify(39.9), CentralityClass { bin: 0, fallback: false });
        assert_eq!(c.classify(5.0), CentralityClass { bin: 3, fallback: false });
    }

    #[test]
    fn canonical_edges() {
        let c = FixedEdgeClassifier::default();
        assert_eq!(c.n_classes(), 10);
        assert_eq!(c.classify(0.5).bin, 9);
        assert_eq!(c.classify(0.95).bin, 8);
        assert_eq!(c.classify(75.0).bin, 0);
    }

    #[test]
    fn rejects_bad_tables() {
        assert!(FixedEdgeClassifier::new(vec![1.0]).is_err());
        assert!(FixedEdgeClassifier::new(vec![0.0, 5.0, 5.0]).is_err());
        assert!(PercentileClassifier::new(vec![]).is_err());
        assert!(PercentileClassifier::new(vec![1.0, f64::INFINITY]).is_err());
    }
}
