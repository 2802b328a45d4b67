//! Per-class yield ratios and the ratio report artifact.
//!
//! For a class bin with numerator mean `μn ± σn` and denominator mean
//! `μd ± σd` (standard errors of the mean) and scale factor `s`:
//!
//! ```text
//! r = s × μn / μd
//! σ = s × sqrt(σn² μd² + σd² μn²) / μd²
//! ```
//!
//! which equals `|r| × sqrt((σn/μn)² + (σd/μd)²)` whenever `μn ≠ 0`. A row is
//! undefined when the denominator has no entries or a zero mean, or when the
//! numerator has no entries.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use hc_core::{Error, Result};
use hc_hist::{BinSeries, BinValue, ObjectStore, Profile, ProfileBin};
use serde::{Deserialize, Serialize};

use crate::reference::ReferenceSeries;
use crate::species::Species;

/// Schema identifier of [`RatioReport`].
pub const RATIO_REPORT_SCHEMA_VERSION: &str = "hadrochem_ratio_report_v0";

/// One requested ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSpec {
    /// Output label, e.g. `kaon/pion`.
    pub label: String,
    /// Numerator profile key.
    pub numerator: String,
    /// Denominator profile key.
    pub denominator: String,
    /// Multiplicative scale factor.
    pub scale: f64,
}

impl RatioSpec {
    /// Arbitrary ratio.
    pub fn new(
        label: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
        scale: f64,
    ) -> Self {
        Self {
            label: label.into(),
            numerator: numerator.into(),
            denominator: denominator.into(),
            scale,
        }
    }

    /// `species / pion` with the species' scale factor.
    pub fn to_pion(species: Species) -> Self {
        Self::new(
            format!("{species}/pion"),
            species.profile_key(),
            Species::Pion.profile_key(),
            species.scale_factor(),
        )
    }

    /// Every non-pion species over pions.
    pub fn standard() -> Vec<Self> {
        Species::ALL.into_iter().filter(|s| *s != Species::Pion).map(Self::to_pion).collect()
    }
}

/// Scaled ratio of two profile bins, `None` when undefined.
pub fn ratio_of_bins(num: &ProfileBin, den: &ProfileBin, scale: f64) -> Option<BinValue> {
    let (Some(mn), Some(sn)) = (num.mean(), num.std_error()) else {
        return None;
    };
    let (Some(md), Some(sd)) = (den.mean(), den.std_error()) else {
        return None;
    };
    if md == 0.0 {
        return None;
    }
    let md2 = md * md;
    Some(BinValue {
        value: scale * mn / md,
        error: scale * ((sn * sn) * md2 + (sd * sd) * (mn * mn)).sqrt() / md2,
    })
}

/// Per-class mean ± standard error of one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEntry {
    /// Class bin.
    pub class_bin: usize,
    /// Class centre.
    pub class_center: f64,
    /// Contributing events.
    pub entries: u64,
    /// Mean count per event.
    pub mean: Option<f64>,
    /// Standard error of the mean.
    pub std_error: Option<f64>,
}

/// All classes of one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldSeries {
    /// Profile key.
    pub key: String,
    /// One entry per class.
    pub entries: Vec<YieldEntry>,
}

impl YieldSeries {
    /// Summarize a profile.
    pub fn from_profile(profile: &Profile) -> Self {
        let entries = profile
            .bins
            .iter()
            .enumerate()
            .map(|(i, b)| YieldEntry {
                class_bin: i,
                class_center: profile.axis.bin_center(i),
                entries: b.entries,
                mean: b.mean(),
                std_error: b.std_error(),
            })
            .collect();
        Self { key: profile.name.clone(), entries }
    }
}

/// One class row of a ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioEntry {
    /// Class bin.
    pub class_bin: usize,
    /// Class centre.
    pub class_center: f64,
    /// Half the class width.
    pub class_half_width: f64,
    /// Numerator mean ± error.
    pub numerator: Option<BinValue>,
    /// Denominator mean ± error.
    pub denominator: Option<BinValue>,
    /// Scaled ratio.
    pub ratio: Option<f64>,
    /// Propagated error.
    pub error: Option<f64>,
}

/// All classes of one ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSeries {
    /// Ratio label.
    pub label: String,
    /// Numerator profile key.
    pub numerator: String,
    /// Denominator profile key.
    pub denominator: String,
    /// Scale factor applied.
    pub scale: f64,
    /// Whether adjacent class pairs were combined first.
    pub combined_pairs: bool,
    /// One entry per (possibly combined) class.
    pub entries: Vec<RatioEntry>,
}

impl RatioSeries {
    /// Ratio values as a series (for printouts).
    pub fn to_bin_series(&self) -> Result<BinSeries> {
        let n = self.entries.len();
        let axis = hc_hist::Axis::new(n, 0.0, n as f64 * self.class_width())?;
        let values = self
            .entries
            .iter()
            .map(|e| match (e.ratio, e.error) {
                (Some(value), Some(error)) => Some(BinValue { value, error }),
                _ => None,
            })
            .collect();
        Ok(BinSeries { name: self.label.clone(), axis, values })
    }

    /// Width of one (possibly combined) class.
    pub fn class_width(&self) -> f64 {
        self.entries.first().map_or(1.0, |e| 2.0 * e.class_half_width)
    }

    /// Class centres, lowest class first.
    pub fn class_centers(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.class_center).collect()
    }
}

/// Build one ratio series from two profiles.
///
/// With `combine_pairs`, the per-class means of each profile are summed over
/// adjacent class pairs (errors in quadrature) before dividing.
pub fn ratio_series(
    num: &Profile,
    den: &Profile,
    spec: &RatioSpec,
    combine_pairs: bool,
) -> Result<RatioSeries> {
    if !num.axis.same_binning(&den.axis) {
        return Err(Error::Validation(format!(
            "ratio '{}': profiles '{}' and '{}' have different binning",
            spec.label, num.name, den.name
        )));
    }

    let entries: Vec<RatioEntry> = if combine_pairs {
        let pn = num.projection().combine_pairs()?;
        let pd = den.projection().combine_pairs()?;
        let r = pn.scaled(spec.scale).divide(&pd)?;
        (0..r.n_bins())
            .map(|i| RatioEntry {
                class_bin: i,
                class_center: r.axis.bin_center(i),
                class_half_width: 0.5 * r.axis.bin_width(),
                numerator: pn.values[i],
                denominator: pd.values[i],
                ratio: r.values[i].map(|v| v.value),
                error: r.values[i].map(|v| v.error),
            })
            .collect()
    } else {
        num.bins
            .iter()
            .zip(&den.bins)
            .enumerate()
            .map(|(i, (n, d))| {
                let r = ratio_of_bins(n, d, spec.scale);
                RatioEntry {
                    class_bin: i,
                    class_center: num.axis.bin_center(i),
                    class_half_width: 0.5 * num.axis.bin_width(),
                    numerator: bin_value(n),
                    denominator: bin_value(d),
                    ratio: r.map(|v| v.value),
                    error: r.map(|v| v.error),
                }
            })
            .collect()
    };

    for e in entries.iter().filter(|e| e.ratio.is_none()) {
        tracing::warn!(ratio = %spec.label, class_bin = e.class_bin, "undefined ratio (empty or zero denominator)");
    }

    Ok(RatioSeries {
        label: spec.label.clone(),
        numerator: spec.numerator.clone(),
        denominator: spec.denominator.clone(),
        scale: spec.scale,
        combined_pairs: combine_pairs,
        entries,
    })
}

fn bin_value(b: &ProfileBin) -> Option<BinValue> {
    Some(BinValue { value: b.mean()?, error: b.std_error()? })
}

/// Report metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Producing tool.
    pub tool: String,
    /// Tool version.
    pub tool_version: String,
    /// Creation time.
    pub created_unix_ms: u128,
}

/// Per-class yields, ratios and optional reference points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioReport {
    /// Always [`RATIO_REPORT_SCHEMA_VERSION`].
    pub schema_version: String,
    /// Metadata.
    pub meta: ReportMeta,
    /// Yield summaries, one per profile used.
    pub yields: Vec<YieldSeries>,
    /// Ratios, in request order.
    pub ratios: Vec<RatioSeries>,
    /// Experimental reference points.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ReferenceSeries>,
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Computation(format!("system time error: {e}")))?;
    Ok(d.as_millis())
}

/// Build a report from the yield profiles in `store`.
///
/// A missing profile is an input-absent error; undefined rows are kept as
/// `null` and the report proceeds.
pub fn build_report(
    store: &ObjectStore,
    specs: &[RatioSpec],
    combine_pairs: bool,
) -> Result<RatioReport> {
    if specs.is_empty() {
        return Err(Error::Validation("no ratios requested".into()));
    }
    let mut ratios = Vec::with_capacity(specs.len());
    let mut keys: Vec<&str> = Vec::new();
    for spec in specs {
        let num = store.get_profile(&spec.numerator)?;
        let den = store.get_profile(&spec.denominator)?;
        ratios.push(ratio_series(num, den, spec, combine_pairs)?);
        for k in [spec.denominator.as_str(), spec.numerator.as_str()] {
            if !keys.contains(&k) {
                keys.push(k);
            }
        }
    }
    let yields = keys
        .iter()
        .map(|k| store.get_profile(k).map(YieldSeries::from_profile))
        .collect::<Result<Vec<_>>>()?;

    Ok(RatioReport {
        schema_version: RATIO_REPORT_SCHEMA_VERSION.to_string(),
        meta: ReportMeta {
            tool: "hadrochem".to_string(),
            tool_version: hc_core::VERSION.to_string(),
            created_unix_ms: now_unix_ms()?,
        },
        yields,
        ratios,
        references: Vec::new(),
    })
}

impl RatioReport {
    /// Attach reference points.
    pub fn with_references(mut self, references: Vec<ReferenceSeries>) -> Self {
        self.references = references;
        self
    }

    /// Validation printout: `Bin i: Value = …, Error = …` per ratio, then the
    /// reference points.
    pub fn format_text(&self) -> Result<String> {
        let mut out = String::new();
        for r in &self.ratios {
            out.push_str(&r.to_bin_series()?.format_bins());
        }
        for reference in &self.references {
            let _ = writeln!(out, "{} ({}, scale {}):", reference.label, reference.table, reference.scale);
            out.push_str(&crate::reference::format_points(&reference.points));
        }
        Ok(out)
    }
}
