//! hadrochem CLI

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use hc_analysis::{
    CALIBRATION_KEY, CalibrationConfig, ForwardPolicy, ForwardSelection, KaonConvention,
    MULTIPLICITY_CLASS_PERCENTILES, ROUND_PERCENTILES, ReferenceRequest, SearchStrategy,
    format_boundaries,
};
use hc_core::CentralityEstimator;
use hc_events::{ToyConfig, ToySource, write_events};
use hc_hist::ObjectStore;
use serde::Serialize;
use std::path::{Path, PathBuf};

mod run;
mod stages;

use stages::{
    BoundariesArtifact, InputSpec, PipelineChoice, PipelineKind, XiClasses, analyze_stage,
    boundaries_stage, calibrate_stage, report_stage,
};

#[derive(Parser)]
#[command(name = "hadrochem")]
#[command(about = "hadrochem - centrality-classified strange-hadron yield ratios")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Args)]
struct InputArgs {
    /// Event file (JSON lines). Repeat to chain several files in order.
    #[arg(short = 'i', long = "input")]
    inputs: Vec<PathBuf>,

    /// Directory to scan for event files instead of explicit inputs.
    #[arg(long, conflicts_with = "inputs")]
    dir: Option<PathBuf>,

    /// Substring a file name must contain to be picked up from `--dir`.
    #[arg(long, default_value = ".jsonl")]
    pattern: String,
}

impl From<InputArgs> for InputSpec {
    fn from(a: InputArgs) -> Self {
        InputSpec { files: a.inputs, dir: a.dir, pattern: a.pattern }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ForwardPolicyArg {
    /// Charged hadrons.
    ChargedHadron,
    /// Any charged particle.
    Charged,
}

impl From<ForwardPolicyArg> for ForwardPolicy {
    fn from(a: ForwardPolicyArg) -> Self {
        match a {
            ForwardPolicyArg::ChargedHadron => ForwardPolicy::ChargedHadron,
            ForwardPolicyArg::Charged => ForwardPolicy::Charged,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Linear,
    Binary,
}

impl From<StrategyArg> for SearchStrategy {
    fn from(a: StrategyArg) -> Self {
        match a {
            StrategyArg::Linear => SearchStrategy::LinearScan,
            StrategyArg::Binary => SearchStrategy::BinarySearch,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KaonArg {
    /// K0S (310)
    ShortLived,
    /// K0 (311)
    Neutral,
    /// K± (321)
    Charged,
    /// K± or K0S
    ChargedOrShortLived,
}

impl From<KaonArg> for KaonConvention {
    fn from(a: KaonArg) -> Self {
        match a {
            KaonArg::ShortLived => KaonConvention::ShortLived,
            KaonArg::Neutral => KaonConvention::Neutral,
            KaonArg::Charged => KaonConvention::Charged,
            KaonArg::ChargedOrShortLived => KaonConvention::ChargedOrShortLived,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct PipelineArgs {
    /// Analysis configuration.
    #[arg(long, value_enum, default_value_t = PipelineKind::ForwardPercentile)]
    pipeline: PipelineKind,

    /// Centrality estimator for `fixed-edge` (v0a, v0c, cl1).
    #[arg(long, default_value = "v0a")]
    estimator: CentralityEstimator,

    /// Comma-separated ascending class edges (percent) for `fixed-edge`.
    #[arg(long, value_delimiter = ',')]
    edges: Option<Vec<f64>>,

    /// Proximity window in eta for `xi-tagged`. Omit to count in the full acceptance.
    #[arg(long)]
    window: Option<f64>,

    /// Class source for `xi-tagged`; `fixed-edge` uses `--estimator` and `--edges`.
    #[arg(long, value_enum, default_value_t = XiClasses::ForwardPercentile)]
    xi_classes: XiClasses,

    /// Override the kaon code convention of the pipeline.
    #[arg(long, value_enum)]
    kaon: Option<KaonArg>,
}

impl From<PipelineArgs> for PipelineChoice {
    fn from(a: PipelineArgs) -> Self {
        PipelineChoice {
            kind: a.pipeline,
            estimator: a.estimator,
            edges: a.edges,
            window: a.window,
            xi_classes: a.xi_classes,
            kaon: a.kaon.map(Into::into),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate class-stratified toy events (JSON lines)
    Generate {
        /// Output event file
        #[arg(short, long)]
        output: PathBuf,

        /// Toy configuration (YAML, or JSON by extension)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Events per percent of class width (overrides the config)
        #[arg(long)]
        events_per_percent: Option<f64>,

        /// RNG seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Fill the forward-multiplicity calibration histogram
    Calibrate {
        #[command(flatten)]
        input: InputArgs,

        /// Output store (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Forward-track attribute requirement
        #[arg(long, value_enum, default_value = "charged-hadron")]
        forward_policy: ForwardPolicyArg,

        /// Number of bins
        #[arg(long, default_value = "100")]
        bins: usize,

        /// Upper edge of the count axis
        #[arg(long, default_value = "200.0")]
        x_max: f64,

        /// Threads (0 = auto). Use 1 for a streaming single-threaded pass.
        #[arg(long, default_value = "1")]
        threads: usize,
    },

    /// Derive percentile boundaries from a calibration histogram
    Percentiles {
        /// Calibration store (JSON)
        #[arg(long)]
        calibration: PathBuf,

        /// Histogram key in the store
        #[arg(long, default_value = CALIBRATION_KEY)]
        key: String,

        /// Comma-separated percentages. Defaults to the multiplicity-class table.
        #[arg(long, value_delimiter = ',', conflicts_with = "round")]
        percentiles: Option<Vec<f64>>,

        /// Use the round-number percentages (1, 5, 10, ..., 100)
        #[arg(long)]
        round: bool,

        /// Boundary search
        #[arg(long, value_enum, default_value = "binary")]
        strategy: StrategyArg,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print `Percentile p%: b` lines to stdout
        #[arg(long)]
        text: bool,
    },

    /// Run the yield analysis pass
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Boundaries file from `percentiles` (percentile pipelines only)
        #[arg(long)]
        boundaries: Option<PathBuf>,

        /// Forward-track attribute requirement
        #[arg(long, value_enum, default_value = "charged-hadron")]
        forward_policy: ForwardPolicyArg,

        /// Output store of yield profiles (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Threads (0 = auto). Use 1 for a streaming single-threaded pass.
        #[arg(long, default_value = "1")]
        threads: usize,
    },

    /// Compute yield ratios from a store of yield profiles
    Report {
        /// Yield store from `analyze`
        #[arg(long)]
        yields: PathBuf,

        /// Pipeline that produced the yields (selects the ratios)
        #[arg(long, value_enum, default_value_t = PipelineKind::ForwardPercentile)]
        pipeline: PipelineKind,

        /// Proximity window used by `xi-tagged`
        #[arg(long)]
        window: Option<f64>,

        /// Combine adjacent classes pairwise before division
        #[arg(long)]
        combine_pairs: bool,

        /// Reference data file (JSON)
        #[arg(long)]
        references: Option<PathBuf>,

        /// Reference table to attach. Repeatable.
        #[arg(long, requires = "references")]
        table: Vec<String>,

        /// Factor applied to reference y values
        #[arg(long, default_value = "1.0")]
        reference_scale: f64,

        /// Ratio classes covered by each reference point
        #[arg(long, default_value = "1")]
        classes_per_point: usize,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print `Bin i: Value = v, Error = e` lines to stdout
        #[arg(long)]
        text: bool,
    },

    /// Calibrate, classify and report from one config file
    Run {
        /// Run config (YAML, or JSON by extension)
        #[arg(long)]
        config: PathBuf,

        /// Summary output (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Generate { output, config, events_per_percent, seed } => {
            cmd_generate(&output, config.as_deref(), events_per_percent, seed)
        }
        Commands::Calibrate { input, output, forward_policy, bins, x_max, threads } => {
            cmd_calibrate(input.into(), &output, forward_policy.into(), bins, x_max, threads)
        }
        Commands::Percentiles { calibration, key, percentiles, round, strategy, output, text } => {
            let thresholds = match (percentiles, round) {
                (Some(p), _) => p,
                (None, true) => ROUND_PERCENTILES.to_vec(),
                (None, false) => MULTIPLICITY_CLASS_PERCENTILES.to_vec(),
            };
            cmd_percentiles(&calibration, &key, &thresholds, strategy.into(), output.as_ref(), text)
        }
        Commands::Analyze { input, pipeline, boundaries, forward_policy, output, threads } => {
            cmd_analyze(
                input.into(),
                pipeline.into(),
                boundaries.as_deref(),
                forward_policy.into(),
                &output,
                threads,
            )
        }
        Commands::Report {
            yields,
            pipeline,
            window,
            combine_pairs,
            references,
            table,
            reference_scale,
            classes_per_point,
            output,
            text,
        } => {
            let choice = PipelineChoice { kind: pipeline, window, ..PipelineChoice::default() };
            let requests: Vec<ReferenceRequest> = table
                .into_iter()
                .map(|t| ReferenceRequest {
                    scale: reference_scale,
                    classes_per_point,
                    ..ReferenceRequest::new(t.clone(), t)
                })
                .collect();
            cmd_report(
                &yields,
                &choice,
                combine_pairs,
                references.as_deref(),
                &requests,
                output.as_ref(),
                text,
            )
        }
        Commands::Run { config, output } => cmd_run(&config, output.as_ref()),
        Commands::Version => {
            println!("hadrochem {}", hc_core::VERSION);
            Ok(())
        }
    }
}

fn setup_threads(threads: usize) {
    if threads > 0 {
        // Ignore errors if a global pool was already initialized.
        let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
    }
}

fn write_json(output: Option<&PathBuf>, value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    if let Some(path) = output {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, text + "\n")?;
    } else {
        println!("{text}");
    }
    Ok(())
}

fn cmd_generate(
    output: &Path,
    config: Option<&Path>,
    events_per_percent: Option<f64>,
    seed: Option<u64>,
) -> Result<()> {
    let mut cfg: ToyConfig = match config {
        Some(path) => run::read_config(path)?,
        None => ToyConfig::default(),
    };
    if let Some(epp) = events_per_percent {
        cfg.events_per_percent = epp;
    }
    if let Some(seed) = seed {
        cfg.seed = seed;
    }
    let mut source = ToySource::new(cfg)?;
    let n = write_events(&mut source, output)?;
    write_json(None, &serde_json::json!({ "events": n, "output": output }))
}

fn cmd_calibrate(
    input: InputSpec,
    output: &Path,
    policy: ForwardPolicy,
    bins: usize,
    x_max: f64,
    threads: usize,
) -> Result<()> {
    setup_threads(threads);
    let config = CalibrationConfig { n_bins: bins, x_max, ..CalibrationConfig::default() };
    let hist = calibrate_stage(&input, &ForwardSelection::new(policy), &config, threads)?;

    let entries = hist.entries;
    let mut store = if output.exists() { ObjectStore::open(output)? } else { ObjectStore::new() };
    store.insert_histogram(hist);
    store.write(output)?;
    tracing::info!(output = %output.display(), entries, "calibration written");
    Ok(())
}

fn cmd_percentiles(
    calibration: &Path,
    key: &str,
    thresholds: &[f64],
    strategy: SearchStrategy,
    output: Option<&PathBuf>,
    text: bool,
) -> Result<()> {
    let store = ObjectStore::open(calibration)?;
    let hist = store.get_histogram(key)?;
    let artifact = boundaries_stage(hist, thresholds, strategy)?;
    if output.is_some() || !text {
        write_json(output, &artifact)?;
    }
    if text {
        print!("{}", format_boundaries(&artifact.percentiles, &artifact.boundaries));
    }
    Ok(())
}

fn cmd_analyze(
    input: InputSpec,
    choice: PipelineChoice,
    boundaries: Option<&Path>,
    policy: ForwardPolicy,
    output: &Path,
    threads: usize,
) -> Result<()> {
    setup_threads(threads);
    let bounds = match boundaries {
        Some(path) => Some(BoundariesArtifact::read(path)?.boundaries),
        None if choice.needs_boundaries() => {
            anyhow::bail!("--boundaries is required for the {:?} pipeline", choice.kind)
        }
        None => None,
    };
    let pipeline = choice.build(bounds, &ForwardSelection::new(policy))?;
    let agg = analyze_stage(&pipeline, &input, threads)?;

    let mut store = ObjectStore::new();
    agg.write_into(&mut store);
    store.write(output)?;
    write_json(
        None,
        &serde_json::json!({
            "pipeline": pipeline.name,
            "classes": pipeline.n_classes(),
            "events": agg.events(),
            "skipped": agg.skipped(),
            "fallbacks": agg.fallbacks(),
            "output": output,
        }),
    )
}

fn cmd_report(
    yields: &Path,
    choice: &PipelineChoice,
    combine_pairs: bool,
    references: Option<&Path>,
    requests: &[ReferenceRequest],
    output: Option<&PathBuf>,
    text: bool,
) -> Result<()> {
    let store = ObjectStore::open(yields)?;
    let report = report_stage(&store, &choice.ratios(), combine_pairs, references, requests)?;
    if output.is_some() || !text {
        write_json(output, &report)?;
    }
    if text {
        print!("{}", report.format_text()?);
    }
    Ok(())
}

fn cmd_run(config: &Path, output: Option<&PathBuf>) -> Result<()> {
    let cfg: run::RunConfig = run::read_config(config)?;
    setup_threads(cfg.threads);
    tracing::info!(config = %config.display(), out_dir = %cfg.out_dir.display(), "run");
    let summary = run::run(&cfg)?;
    write_json(output, &summary)
}
