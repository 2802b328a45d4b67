//! # hc-analysis
//!
//! Centrality-classified strange-hadron yield ratios.
//!
//! The analysis runs in two passes over event sources:
//!
//! 1. [`calibrate`] fills the forward-track multiplicity of a sample into a
//!    width-normalized histogram, and [`percentile_boundaries`] turns it into
//!    class boundaries.
//! 2. A [`Pipeline`] classifies every event of the analysis sample and
//!    [`YieldAggregator`] accumulates per-class yield profiles, from which
//!    [`build_report`] derives scaled ratios to pions.
//!
//! ```
//! use hc_analysis::{
//!     CalibrationConfig, ForwardSelection, Pipeline, SearchStrategy,
//!     MULTIPLICITY_CLASS_PERCENTILES, aggregate, calibrate, percentile_boundaries,
//! };
//! use hc_core::{Event, Particle, VecSource};
//!
//! let pion = Particle { pid: 211, pt: 1.0, eta: 0.0, y: 0.0, phi: 0.0, is_hadron: true, is_charged: true };
//! let events = vec![Event::new(vec![pion; 5]); 100];
//!
//! let calib = calibrate(
//!     &mut VecSource::new(events.clone()),
//!     &ForwardSelection::default(),
//!     &CalibrationConfig::default(),
//! )
//! .unwrap();
//! let bounds =
//!     percentile_boundaries(&calib, &MULTIPLICITY_CLASS_PERCENTILES, SearchStrategy::default())
//!         .unwrap();
//! let pipeline = Pipeline::forward_percentile(bounds).unwrap();
//! let yields = aggregate(&pipeline, &mut VecSource::new(events)).unwrap();
//! assert_eq!(yields.events(), 100);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod acceptance;
pub mod calibration;
pub mod classify;
pub mod percentile;
pub mod pipeline;
pub mod ratio;
pub mod reference;
pub mod species;
pub mod yields;

pub use acceptance::{EtaWindow, ForwardPolicy, ForwardSelection};
pub use calibration::{
    CALIBRATION_KEY, CalibrationAccumulator, CalibrationConfig, calibrate, calibrate_events_par,
};
pub use classify::{
    CANONICAL_CENTRALITY_EDGES, CentralityClass, Classifier, FixedEdgeClassifier,
    PercentileClassifier,
};
pub use percentile::{
    MULTIPLICITY_CLASS_PERCENTILES, ROUND_PERCENTILES, SearchStrategy, format_boundaries,
    percentile_boundaries,
};
pub use pipeline::{ClassSource, Pipeline, YieldAggregator, aggregate, aggregate_events_par};
pub use ratio::{
    RATIO_REPORT_SCHEMA_VERSION, RatioEntry, RatioReport, RatioSeries, RatioSpec, ReportMeta,
    YieldEntry, YieldSeries, build_report, ratio_of_bins, ratio_series,
};
pub use reference::{
    ReferenceData, ReferencePoint, ReferenceRequest, ReferenceSeries, align_to_classes,
    format_points, reference_series, scale_points,
};
pub use species::{KaonConvention, Species};
pub use yields::{
    Anchor, Anchors, KinematicCut, KinematicVariable, Matcher, PairTag, Proximity, YieldChannel,
};
