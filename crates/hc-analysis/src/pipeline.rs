//! Analysis pipelines and the per-class yield aggregator.
//!
//! A [`Pipeline`] bundles the class source, the counted channels and the
//! cuts of one analysis. [`YieldAggregator`] applies it event by event and
//! keeps one [`Profile`] per channel over the class axis; aggregators merge
//! by elementwise addition so partial passes can be folded in any order.

use std::collections::BTreeSet;

use hc_core::{CentralityEstimator, Error, Event, EventSource, Result};
use hc_hist::{ObjectStore, Profile};
use rayon::prelude::*;

use crate::acceptance::ForwardSelection;
use crate::classify::{CentralityClass, Classifier, FixedEdgeClassifier, PercentileClassifier};
use crate::ratio::RatioSpec;
use crate::species::{KaonConvention, Species};
use crate::yields::{Anchor, KinematicCut, PairTag, YieldChannel};

/// Where an event's class comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassSource {
    /// Forward-track count through percentile boundaries.
    ForwardPercentile(PercentileClassifier),
    /// A centrality estimator through fixed edges.
    FixedEdge {
        /// Edge table.
        classifier: FixedEdgeClassifier,
        /// Estimator read from the event.
        estimator: CentralityEstimator,
    },
}

impl ClassSource {
    /// Percentile classes from forward-count `boundaries`.
    pub fn percentile(boundaries: Vec<f64>) -> Result<Self> {
        Ok(ClassSource::ForwardPercentile(PercentileClassifier::new(boundaries)?))
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        match self {
            ClassSource::ForwardPercentile(c) => c.n_classes(),
            ClassSource::FixedEdge { classifier, .. } => classifier.n_classes(),
        }
    }
}

/// One complete analysis configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Name used in logs.
    pub name: String,
    /// Class assignment.
    pub classes: ClassSource,
    /// Forward-track predicate (class input and forward exclusion).
    pub forward: ForwardSelection,
    /// Acceptance for counted particles.
    pub cut: KinematicCut,
    /// Kaon code convention of the event source.
    pub kaon: KaonConvention,
    /// Counted channels, one profile each.
    pub channels: Vec<YieldChannel>,
    /// Optional event-level pair requirement.
    pub pair_tag: Option<PairTag>,
    /// Ratios reported for this pipeline.
    pub ratios: Vec<RatioSpec>,
}

fn species_channels() -> Vec<YieldChannel> {
    Species::ALL.into_iter().map(YieldChannel::species).collect()
}

impl Pipeline {
    /// Generator events: percentile classes from the forward count,
    /// `|y| < 0.5` excluding forward tracks, kaon = K0S.
    ///
    /// Takes the boundaries by value: the calibration pass must be complete.
    pub fn forward_percentile(boundaries: Vec<f64>) -> Result<Self> {
        Ok(Self {
            name: "forward_percentile".to_string(),
            classes: ClassSource::percentile(boundaries)?,
            forward: ForwardSelection::default(),
            cut: KinematicCut { exclude_forward: true, ..KinematicCut::rapidity(0.5) },
            kaon: KaonConvention::ShortLived,
            channels: species_channels(),
            pair_tag: None,
            ratios: RatioSpec::standard(),
        })
    }

    /// Thermal events: fixed-edge classes from `estimator`, `|y| < 0.5`,
    /// kaon = K0.
    pub fn fixed_edge(classifier: FixedEdgeClassifier, estimator: CentralityEstimator) -> Self {
        Self {
            name: "fixed_edge".to_string(),
            classes: ClassSource::FixedEdge { classifier, estimator },
            forward: ForwardSelection::default(),
            cut: KinematicCut::rapidity(0.5),
            kaon: KaonConvention::Neutral,
            channels: species_channels(),
            pair_tag: None,
            ratios: RatioSpec::standard(),
        }
    }

    /// Ξ⁻/Ξ̄⁺-tagged events, `|eta| ≤ 1`, classified by `classes`.
    ///
    /// With a `window`, K⁺ and π± are counted within `window` of the Ξ⁻ and
    /// K⁻ and π± within `window` of the Ξ̄⁺. Without one, K0S and π± anywhere
    /// in the acceptance are counted.
    pub fn xi_pair_tagged(classes: ClassSource, window: Option<f64>) -> Self {
        let (channels, kaon) = match window {
            Some(w) => (
                vec![
                    YieldChannel::pid("hKPlusCent", 321).near(Anchor::Particle, w),
                    YieldChannel::species(Species::Pion).keyed("hPiPlusCent").near(Anchor::Particle, w),
                    YieldChannel::pid("hKMinusCent", -321).near(Anchor::Antiparticle, w),
                    YieldChannel::species(Species::Pion)
                        .keyed("hPiMinusCent")
                        .near(Anchor::Antiparticle, w),
                ],
                KaonConvention::Charged,
            ),
            None => (
                vec![YieldChannel::species(Species::Pion), YieldChannel::species(Species::Kaon)],
                KaonConvention::ShortLived,
            ),
        };
        Self {
            name: "xi_pair_tagged".to_string(),
            classes,
            forward: ForwardSelection::default(),
            cut: KinematicCut { inclusive: true, ..KinematicCut::pseudorapidity(1.0) },
            kaon,
            channels,
            pair_tag: Some(PairTag::default()),
            ratios: Self::xi_pair_ratios(window),
        }
    }

    /// Ratios reported by [`Pipeline::xi_pair_tagged`] for `window`.
    pub fn xi_pair_ratios(window: Option<f64>) -> Vec<RatioSpec> {
        match window {
            Some(_) => vec![
                RatioSpec::new("K+/pi (Xi)", "hKPlusCent", "hPiPlusCent", 1.0),
                RatioSpec::new("K-/pi (anti-Xi)", "hKMinusCent", "hPiMinusCent", 1.0),
            ],
            None => vec![RatioSpec::new("kaon/pion", "hKCent", "hPiCent", 1.0)],
        }
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.classes.n_classes()
    }

    /// Check channels against the rest of the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(Error::Validation(format!("pipeline '{}' has no channels", self.name)));
        }
        let mut keys = BTreeSet::new();
        for ch in &self.channels {
            if !keys.insert(ch.key.as_str()) {
                return Err(Error::Validation(format!(
                    "pipeline '{}': duplicate channel key '{}'",
                    self.name, ch.key
                )));
            }
            if let Some(prox) = ch.proximity {
                if self.pair_tag.is_none() {
                    return Err(Error::Validation(format!(
                        "channel '{}' uses a proximity window but the pipeline has no pair tag",
                        ch.key
                    )));
                }
                if !(prox.window > 0.0) {
                    return Err(Error::Validation(format!(
                        "channel '{}': proximity window must be > 0, got {}",
                        ch.key, prox.window
                    )));
                }
            }
        }
        Ok(())
    }

    /// Class of `event`.
    pub fn classify(&self, event: &Event) -> Result<CentralityClass> {
        match &self.classes {
            ClassSource::ForwardPercentile(c) => Ok(c.classify(f64::from(self.forward.count(event)))),
            ClassSource::FixedEdge { classifier, estimator } => {
                let est = event.centrality.ok_or_else(|| {
                    Error::Validation(format!(
                        "pipeline '{}' needs centrality estimators but the event has none",
                        self.name
                    ))
                })?;
                Ok(classifier.classify(est.get(*estimator)))
            }
        }
    }
}

/// Per-class yield profiles of one pipeline.
#[derive(Debug, Clone)]
pub struct YieldAggregator<'p> {
    pipeline: &'p Pipeline,
    profiles: Vec<Profile>,
    counts: Vec<u32>,
    events: u64,
    skipped: u64,
    fallbacks: u64,
}

impl PartialEq for YieldAggregator<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.profiles == other.profiles
            && self.events == other.events
            && self.skipped == other.skipped
            && self.fallbacks == other.fallbacks
    }
}

impl<'p> YieldAggregator<'p> {
    /// Empty aggregator for a validated pipeline.
    pub fn new(pipeline: &'p Pipeline) -> Result<Self> {
        pipeline.validate()?;
        let n = pipeline.n_classes();
        let profiles = pipeline
            .channels
            .iter()
            .map(|ch| Profile::new(ch.key.clone(), pipeline.name.clone(), n, 0.0, n as f64))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            pipeline,
            profiles,
            counts: vec![0; pipeline.channels.len()],
            events: 0,
            skipped: 0,
            fallbacks: 0,
        })
    }

    /// Fold one event in.
    pub fn consume(&mut self, event: &Event) -> Result<()> {
        let pl = self.pipeline;
        let anchors = match &pl.pair_tag {
            Some(tag) => match tag.find(event) {
                Some(a) => Some(a),
                None => {
                    self.skipped += 1;
                    return Ok(());
                }
            },
            None => None,
        };

        let class = pl.classify(event)?;
        if class.fallback {
            self.fallbacks += 1;
        }

        self.counts.fill(0);
        for p in &event.particles {
            if pl.cut.exclude_forward && pl.forward.is_forward(p) {
                continue;
            }
            if !pl.cut.accepts(p) {
                continue;
            }
            for (n, ch) in self.counts.iter_mut().zip(&pl.channels) {
                if ch.counts(p, pl.kaon, anchors.as_ref()) {
                    *n += 1;
                }
            }
        }
        for (profile, &n) in self.profiles.iter_mut().zip(&self.counts) {
            profile.fill_bin(class.bin, f64::from(n))?;
        }
        self.events += 1;
        Ok(())
    }

    /// Add another aggregator of the same pipeline.
    pub fn merge(&mut self, other: &YieldAggregator<'_>) -> Result<()> {
        if self.profiles.len() != other.profiles.len() {
            return Err(Error::Validation("cannot merge aggregators of different pipelines".into()));
        }
        for (a, b) in self.profiles.iter_mut().zip(&other.profiles) {
            a.merge(b)?;
        }
        self.events += other.events;
        self.skipped += other.skipped;
        self.fallbacks += other.fallbacks;
        Ok(())
    }

    /// Events folded in.
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Events rejected by the pair tag.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Events assigned a fallback class.
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks
    }

    /// Profiles in channel order.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Profile of channel `key`.
    pub fn profile(&self, key: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == key)
    }

    /// Insert every profile into `store`.
    pub fn write_into(&self, store: &mut ObjectStore) {
        for p in &self.profiles {
            store.insert_profile(p.clone());
        }
    }

    fn log_summary(&self) {
        tracing::info!(
            pipeline = %self.pipeline.name,
            events = self.events,
            skipped = self.skipped,
            fallbacks = self.fallbacks,
            "analysis pass done"
        );
        if self.fallbacks > 0 {
            tracing::warn!(
                fallbacks = self.fallbacks,
                "events outside every class were assigned the fallback class"
            );
        }
    }
}

/// Sequential analysis pass over `source`.
pub fn aggregate<'p, S: EventSource>(pipeline: &'p Pipeline, source: &mut S) -> Result<YieldAggregator<'p>> {
    let mut agg = YieldAggregator::new(pipeline)?;
    source.for_each_event(|ev| agg.consume(ev))?;
    agg.log_summary();
    Ok(agg)
}

/// Parallel analysis pass over an in-memory sample.
///
/// Profile fills are integer counts, so the merged sums are exact and the
/// result is identical to [`aggregate`] for any thread count.
pub fn aggregate_events_par<'p>(pipeline: &'p Pipeline, events: &[Event]) -> Result<YieldAggregator<'p>> {
    let empty = YieldAggregator::new(pipeline)?;
    let agg = events
        .par_iter()
        .with_min_len(64)
        .try_fold(
            || empty.clone(),
            |mut acc, ev| {
                acc.consume(ev)?;
                Ok::<_, Error>(acc)
            },
        )
        .try_reduce(
            || empty.clone(),
            |mut a, b| {
                a.merge(&b)?;
                Ok(a)
            },
        )?;
    agg.log_summary();
    Ok(agg)
}
