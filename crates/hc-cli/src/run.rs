//! `hadrochem run`: the full two-pass analysis from one config file.

use anyhow::Result;
use hc_analysis::{
    CalibrationConfig, ForwardSelection, MULTIPLICITY_CLASS_PERCENTILES, ReferenceRequest,
    SearchStrategy,
};
use hc_hist::ObjectStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::stages::{
    InputSpec, PipelineChoice, analyze_stage, boundaries_stage, calibrate_stage, report_stage,
};

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Analysis sample.
    pub inputs: InputSpec,
    /// Calibration sample. Defaults to the analysis sample.
    #[serde(default)]
    pub calibration_inputs: Option<InputSpec>,
    /// Output directory for all artifacts.
    pub out_dir: PathBuf,

    /// Threads (0 = auto). Use 1 for a streaming single-threaded pass.
    #[serde(default = "default_threads")]
    pub threads: usize,

    #[serde(default)]
    pub forward: ForwardSelection,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
    #[serde(default)]
    pub strategy: SearchStrategy,
    #[serde(default)]
    pub pipeline: PipelineChoice,

    /// Combine adjacent classes pairwise before division.
    #[serde(default)]
    pub combine_pairs: bool,
    #[serde(default)]
    pub references: Option<PathBuf>,
    #[serde(default)]
    pub reference_tables: Vec<ReferenceRequest>,
}

fn default_threads() -> usize {
    1
}

fn default_percentiles() -> Vec<f64> {
    MULTIPLICITY_CLASS_PERCENTILES.to_vec()
}

/// Read YAML (default) or JSON (`.json`) config.
pub fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        anyhow::bail!("config file not found: {}", path.display());
    }
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        serde_yaml_ng::from_slice(&bytes)?
    };
    Ok(cfg)
}

#[derive(Debug, Clone, Serialize)]
pub struct RunPaths {
    pub out_dir: PathBuf,
    pub calibration: PathBuf,
    pub boundaries: PathBuf,
    pub yields: PathBuf,
    pub report_json: PathBuf,
    pub report_txt: PathBuf,
}

pub fn derive_paths(out_dir: &Path) -> RunPaths {
    RunPaths {
        out_dir: out_dir.to_path_buf(),
        calibration: out_dir.join("calibration.json"),
        boundaries: out_dir.join("boundaries.json"),
        yields: out_dir.join("yields.json"),
        report_json: out_dir.join("report.json"),
        report_txt: out_dir.join("report.txt"),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub pipeline: String,
    pub classes: usize,
    pub events: u64,
    pub skipped: u64,
    pub fallbacks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundaries: Option<Vec<f64>>,
    pub artifacts: Vec<PathBuf>,
}

pub fn run(cfg: &RunConfig) -> Result<RunSummary> {
    let paths = derive_paths(&cfg.out_dir);
    std::fs::create_dir_all(&paths.out_dir)?;
    let mut artifacts = Vec::new();

    // Pass 1: calibration and boundaries, only for percentile classes.
    let boundaries = if cfg.pipeline.needs_boundaries() {
        let calib_inputs = cfg.calibration_inputs.as_ref().unwrap_or(&cfg.inputs);
        let hist = calibrate_stage(calib_inputs, &cfg.forward, &cfg.calibration, cfg.threads)?;
        let artifact = boundaries_stage(&hist, &cfg.percentiles, cfg.strategy)?;

        let mut store = ObjectStore::new();
        store.insert_histogram(hist);
        store.write(&paths.calibration)?;
        crate::write_json(Some(&paths.boundaries), &artifact)?;
        artifacts.push(paths.calibration.clone());
        artifacts.push(paths.boundaries.clone());
        Some(artifact.boundaries)
    } else {
        None
    };

    // Pass 2: yields.
    let pipeline = cfg.pipeline.build(boundaries.clone(), &cfg.forward)?;
    let agg = analyze_stage(&pipeline, &cfg.inputs, cfg.threads)?;
    let mut yields = ObjectStore::new();
    agg.write_into(&mut yields);
    yields.write(&paths.yields)?;
    artifacts.push(paths.yields.clone());

    let report = report_stage(
        &yields,
        &pipeline.ratios,
        cfg.combine_pairs,
        cfg.references.as_deref(),
        &cfg.reference_tables,
    )?;
    crate::write_json(Some(&paths.report_json), &report)?;
    std::fs::write(&paths.report_txt, report.format_text()?)?;
    artifacts.push(paths.report_json.clone());
    artifacts.push(paths.report_txt.clone());

    tracing::info!(out_dir = %paths.out_dir.display(), "run complete");
    Ok(RunSummary {
        pipeline: pipeline.name.clone(),
        classes: pipeline.n_classes(),
        events: agg.events(),
        skipped: agg.skipped(),
        fallbacks: agg.fallbacks(),
        boundaries,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::PipelineKind;

    #[test]
    fn config_defaults() {
        let yaml = "inputs:\n  dir: /data/runs\nout_dir: /tmp/out\n";
        let cfg: RunConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(cfg.threads, 1);
        assert_eq!(cfg.inputs.pattern, ".jsonl");
        assert_eq!(cfg.percentiles, MULTIPLICITY_CLASS_PERCENTILES.to_vec());
        assert_eq!(cfg.pipeline.kind, PipelineKind::ForwardPercentile);
        assert_eq!(cfg.calibration, CalibrationConfig::default());
        assert!(cfg.calibration_inputs.is_none());
        assert!(!cfg.combine_pairs);
    }

    #[test]
    fn config_overrides() {
        let yaml = r#"
inputs:
  files: [a.jsonl, b.jsonl]
out_dir: out
threads: 0
calibration:
  n_bins: 50
  x_max: 100
strategy: linear_scan
pipeline:
  kind: fixed_edge
  estimator: cl1
combine_pairs: true
reference_tables:
  - table: Table 36
    label: kaon/pion
"#;
        let cfg: RunConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(cfg.inputs.files.len(), 2);
        assert_eq!(cfg.calibration.n_bins, 50);
        assert_eq!(cfg.strategy, SearchStrategy::LinearScan);
        assert_eq!(cfg.pipeline.kind, PipelineKind::FixedEdge);
        assert!(!cfg.pipeline.needs_boundaries());
        assert_eq!(cfg.reference_tables[0].scale, 1.0);
    }
}
