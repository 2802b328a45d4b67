//! Experimental reference points.
//!
//! Reference data is a JSON object of named tables, each a list of points:
//!
//! ```json
//! { "Table 36": [ { "x": 1.0, "y": 0.12, "ey_low": 0.01, "ey_high": 0.01 } ] }
//! ```
//!
//! Tables list classes from the most central down. Point `i` of a table whose
//! points each span `k` classes sits at the centre of the `(i·k)`-th class
//! counted from the top of the ratio axis, with x errors of `k` half-widths.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use hc_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::ratio::RatioSeries;

/// One point with asymmetric errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// Abscissa.
    pub x: f64,
    /// Ordinate.
    pub y: f64,
    /// Lower x error.
    #[serde(default)]
    pub ex_low: f64,
    /// Upper x error.
    #[serde(default)]
    pub ex_high: f64,
    /// Lower y error.
    #[serde(default)]
    pub ey_low: f64,
    /// Upper y error.
    #[serde(default)]
    pub ey_high: f64,
}

/// Named reference tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceData {
    tables: BTreeMap<String, Vec<ReferencePoint>>,
}

impl ReferenceData {
    /// Read a reference file. A missing file is an input-absent error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::InputAbsent(format!("reference file {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        let data: ReferenceData = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %path.display(), tables = data.tables.len(), "loaded reference data");
        Ok(data)
    }

    /// Points of `table`; a missing table is an input-absent error.
    pub fn table(&self, table: &str) -> Result<&[ReferencePoint]> {
        self.tables
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::InputAbsent(format!("reference table '{table}'")))
    }

    /// Table names.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Add or replace a table.
    pub fn insert(&mut self, table: impl Into<String>, points: Vec<ReferencePoint>) {
        self.tables.insert(table.into(), points);
    }
}

/// Place `points` on a class axis given by its `centers` (lowest class first)
/// and common `class_width`.
///
/// Point `i` takes the centre of class `n − 1 − i·k` and x errors of
/// `k × class_width / 2`, where `k = classes_per_point`.
pub fn align_to_classes(
    points: &[ReferencePoint],
    centers: &[f64],
    class_width: f64,
    classes_per_point: usize,
) -> Result<Vec<ReferencePoint>> {
    if classes_per_point == 0 {
        return Err(Error::Validation("classes_per_point must be >= 1".into()));
    }
    let n = centers.len();
    if points.len() * classes_per_point > n {
        return Err(Error::Validation(format!(
            "{} reference points of {classes_per_point} class(es) each do not fit {n} classes",
            points.len()
        )));
    }
    let half = 0.5 * class_width * classes_per_point as f64;
    Ok(points
        .iter()
        .enumerate()
        .map(|(i, p)| ReferencePoint {
            x: centers[n - 1 - i * classes_per_point],
            ex_low: half,
            ex_high: half,
            ..*p
        })
        .collect())
}

/// Multiply `y` and its errors by `factor`.
pub fn scale_points(points: &[ReferencePoint], factor: f64) -> Vec<ReferencePoint> {
    points
        .iter()
        .map(|p| ReferencePoint {
            y: p.y * factor,
            ey_low: p.ey_low * factor.abs(),
            ey_high: p.ey_high * factor.abs(),
            ..*p
        })
        .collect()
}

/// A request to attach one reference table to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRequest {
    /// Table name in the reference file.
    pub table: String,
    /// Label (usually the ratio it compares to).
    pub label: String,
    /// Factor applied to `y`.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Classes of the ratio axis covered by each point.
    #[serde(default = "default_classes_per_point")]
    pub classes_per_point: usize,
}

impl ReferenceRequest {
    /// One point per class, unscaled.
    pub fn new(table: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            label: label.into(),
            scale: default_scale(),
            classes_per_point: default_classes_per_point(),
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

fn default_classes_per_point() -> usize {
    1
}

/// Aligned, scaled points of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSeries {
    /// Table name.
    pub table: String,
    /// Label.
    pub label: String,
    /// Factor applied to `y`.
    pub scale: f64,
    /// Points on the class axis.
    pub points: Vec<ReferencePoint>,
}

/// Resolve `requests` against `data`, aligning each table to the axis of the
/// ratio sharing its label (the first ratio otherwise).
pub fn reference_series(
    data: &ReferenceData,
    requests: &[ReferenceRequest],
    ratios: &[RatioSeries],
) -> Result<Vec<ReferenceSeries>> {
    requests
        .iter()
        .map(|req| {
            let axis = ratios
                .iter()
                .find(|r| r.label == req.label)
                .or_else(|| ratios.first())
                .ok_or_else(|| Error::Validation("no ratio axis to align references to".into()))?;
            let aligned = align_to_classes(
                data.table(&req.table)?,
                &axis.class_centers(),
                axis.class_width(),
                req.classes_per_point,
            )?;
            tracing::debug!(table = %req.table, ratio = %axis.label, points = aligned.len(), "aligned reference table");
            Ok(ReferenceSeries {
                table: req.table.clone(),
                label: req.label.clone(),
                scale: req.scale,
                points: scale_points(&aligned, req.scale),
            })
        })
        .collect()
}

/// `Point i: X = x ± [exl, exh], Y = y ± [eyl, eyh]` lines, counting from 1.
pub fn format_points(points: &[ReferencePoint]) -> String {
    let mut out = String::new();
    for (i, p) in points.iter().enumerate() {
        let _ = writeln!(
            out,
            "Point {}: X = {} ± [{}, {}], Y = {} ± [{}, {}]",
            i + 1,
            p.x, p.ex_low, p.ex_high, p.y, p.ey_low, p.ey_high
        );
    }
    out
}
