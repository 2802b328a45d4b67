//! Analysis stages shared by the single-step commands and `hadrochem run`.

use anyhow::Result;
use hc_analysis::{
    CalibrationConfig, ClassSource, FixedEdgeClassifier, ForwardSelection, KaonConvention, Pipeline,
    RatioReport, RatioSpec, ReferenceData, ReferenceRequest, SearchStrategy, YieldAggregator,
    aggregate, aggregate_events_par, build_report, calibrate, calibrate_events_par,
    percentile_boundaries, reference_series,
};
use hc_core::{CentralityEstimator, Event, EventSource};
use hc_events::EventChain;
use hc_hist::{Histogram, ObjectStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const BOUNDARIES_SCHEMA_VERSION: &str = "hadrochem_boundaries_v0";

/// Where events come from: explicit files, or a directory plus file-name pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

pub fn default_pattern() -> String {
    ".jsonl".to_string()
}

impl InputSpec {
    pub fn open(&self) -> Result<EventChain> {
        if !self.files.is_empty() {
            return Ok(EventChain::new(self.files.clone()));
        }
        match &self.dir {
            Some(dir) => Ok(EventChain::from_dir(dir, &self.pattern)?),
            None => anyhow::bail!("no event input given (use --input or --dir)"),
        }
    }
}

fn collect_events(source: &mut impl EventSource) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    source.for_each_event(|ev| {
        events.push(ev.clone());
        Ok(())
    })?;
    Ok(events)
}

/// Analysis configuration family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Percentile classes from the forward-track count.
    #[default]
    ForwardPercentile,
    /// Fixed centrality edges over a precomputed estimator.
    FixedEdge,
    /// Xi/anti-Xi tagged events (classes per [`XiClasses`]).
    XiTagged,
}

/// Class source of the `xi-tagged` pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XiClasses {
    /// Percentile boundaries on the forward-track count.
    #[default]
    ForwardPercentile,
    /// Fixed edges on the configured estimator.
    FixedEdge,
}

/// Everything needed to build a [`Pipeline`] besides the boundaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineChoice {
    #[serde(default)]
    pub kind: PipelineKind,
    #[serde(default)]
    pub estimator: CentralityEstimator,
    #[serde(default)]
    pub edges: Option<Vec<f64>>,
    #[serde(default)]
    pub window: Option<f64>,
    #[serde(default)]
    pub xi_classes: XiClasses,
    #[serde(default)]
    pub kaon: Option<KaonConvention>,
}

impl PipelineChoice {
    pub fn needs_boundaries(&self) -> bool {
        match self.kind {
            PipelineKind::ForwardPercentile => true,
            PipelineKind::FixedEdge => false,
            PipelineKind::XiTagged => self.xi_classes == XiClasses::ForwardPercentile,
        }
    }

    fn fixed_edge_classifier(&self) -> Result<FixedEdgeClassifier> {
        Ok(match &self.edges {
            Some(edges) => FixedEdgeClassifier::new(edges.clone())?,
            None => FixedEdgeClassifier::default(),
        })
    }

    pub fn build(&self, boundaries: Option<Vec<f64>>, forward: &ForwardSelection) -> Result<Pipeline> {
        let percentile_bounds = || {
            boundaries
                .clone()
                .ok_or_else(|| anyhow::anyhow!("pipeline {:?} needs percentile boundaries", self.kind))
        };
        let mut pipeline = match self.kind {
            PipelineKind::ForwardPercentile => Pipeline::forward_percentile(percentile_bounds()?)?,
            PipelineKind::FixedEdge => Pipeline::fixed_edge(self.fixed_edge_classifier()?, self.estimator),
            PipelineKind::XiTagged => {
                let classes = match self.xi_classes {
                    XiClasses::ForwardPercentile => ClassSource::percentile(percentile_bounds()?)?,
                    XiClasses::FixedEdge => ClassSource::FixedEdge {
                        classifier: self.fixed_edge_classifier()?,
                        estimator: self.estimator,
                    },
                };
                Pipeline::xi_pair_tagged(classes, self.window)
            }
        };
        if let Some(kaon) = self.kaon {
            pipeline.kaon = kaon;
        }
        pipeline.forward = forward.clone();
        pipeline.validate()?;
        Ok(pipeline)
    }

    pub fn ratios(&self) -> Vec<RatioSpec> {
        match self.kind {
            PipelineKind::XiTagged => Pipeline::xi_pair_ratios(self.window),
            _ => RatioSpec::standard(),
        }
    }
}

/// Percentile boundaries as handed from the calibration to the analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundariesArtifact {
    pub schema_version: String,
    pub calibration: String,
    pub strategy: SearchStrategy,
    pub percentiles: Vec<f64>,
    pub boundaries: Vec<f64>,
}

impl BoundariesArtifact {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("boundaries file not found: {}", path.display());
        }
        let artifact: Self = serde_json::from_slice(&std::fs::read(path)?)?;
        if artifact.schema_version != BOUNDARIES_SCHEMA_VERSION {
            anyhow::bail!(
                "unsupported boundaries schema '{}' in {}",
                artifact.schema_version,
                path.display()
            );
        }
        Ok(artifact)
    }
}

pub fn calibrate_stage(
    input: &InputSpec,
    selection: &ForwardSelection,
    config: &CalibrationConfig,
    threads: usize,
) -> Result<Histogram> {
    let mut chain = input.open()?;
    tracing::info!(files = chain.files().len(), "calibration inputs");
    let hist = if threads == 1 {
        calibrate(&mut chain, selection, config)?
    } else {
        let events = collect_events(&mut chain)?;
        calibrate_events_par(&events, selection, config)?
    };
    Ok(hist)
}

pub fn boundaries_stage(
    calibration: &Histogram,
    percentiles: &[f64],
    strategy: SearchStrategy,
) -> Result<BoundariesArtifact> {
    let boundaries = percentile_boundaries(calibration, percentiles, strategy)?;
    Ok(BoundariesArtifact {
        schema_version: BOUNDARIES_SCHEMA_VERSION.to_string(),
        calibration: calibration.name.clone(),
        strategy,
        percentiles: percentiles.to_vec(),
        boundaries,
    })
}

pub fn analyze_stage<'p>(
    pipeline: &'p Pipeline,
    input: &InputSpec,
    threads: usize,
) -> Result<YieldAggregator<'p>> {
    let mut chain = input.open()?;
    tracing::info!(pipeline = %pipeline.name, files = chain.files().len(), "analysis inputs");
    let agg = if threads == 1 {
        aggregate(pipeline, &mut chain)?
    } else {
        let events = collect_events(&mut chain)?;
        aggregate_events_par(pipeline, &events)?
    };
    Ok(agg)
}

pub fn report_stage(
    yields: &ObjectStore,
    specs: &[RatioSpec],
    combine_pairs: bool,
    references: Option<&Path>,
    requests: &[ReferenceRequest],
) -> Result<RatioReport> {
    let report = build_report(yields, specs, combine_pairs)?;
    let Some(path) = references else {
        if !requests.is_empty() {
            anyhow::bail!("reference tables requested without a reference file");
        }
        return Ok(report);
    };
    let data = ReferenceData::open(path)?;
    let series = reference_series(&data, requests, &report.ratios)?;
    Ok(report.with_references(series))
}
