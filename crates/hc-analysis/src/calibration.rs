//! Forward-multiplicity calibration pass.
//!
//! One linear pass over an event sample fills the forward-track count of
//! every event into a histogram, which is then normalized by width so that
//! `Σ content × width = 1`. The result feeds
//! [`percentile_boundaries`](crate::percentile::percentile_boundaries).

use hc_core::{Event, EventSource, Result};
use hc_hist::Histogram;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::acceptance::ForwardSelection;

/// Default store key of the calibration histogram.
pub const CALIBRATION_KEY: &str = "calibration";

fn default_name() -> String {
    CALIBRATION_KEY.to_string()
}
fn default_n_bins() -> usize {
    100
}
fn default_x_max() -> f64 {
    200.0
}

/// Binning and naming of the calibration histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Store key.
    #[serde(default = "default_name")]
    pub name: String,
    /// Number of bins.
    #[serde(default = "default_n_bins")]
    pub n_bins: usize,
    /// Lower edge.
    #[serde(default)]
    pub x_min: f64,
    /// Upper edge.
    #[serde(default = "default_x_max")]
    pub x_max: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self { name: default_name(), n_bins: default_n_bins(), x_min: 0.0, x_max: default_x_max() }
    }
}

/// Mergeable, un-normalized calibration state.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationAccumulator {
    selection: ForwardSelection,
    hist: Histogram,
}

impl CalibrationAccumulator {
    /// Empty accumulator.
    pub fn new(selection: ForwardSelection, config: &CalibrationConfig) -> Result<Self> {
        let hist = Histogram::new(
            config.name.clone(),
            "forward multiplicity",
            config.n_bins,
            config.x_min,
            config.x_max,
        )?;
        Ok(Self { selection, hist })
    }

    /// Fill the forward count of one event (unit weight).
    pub fn consume(&mut self, event: &Event) {
        let n = self.selection.count(event);
        self.hist.fill(f64::from(n));
    }

    /// Add another accumulator's counts.
    pub fn merge(&mut self, other: &CalibrationAccumulator) -> Result<()> {
        self.hist.merge(&other.hist)
    }

    /// Events consumed so far.
    pub fn events(&self) -> u64 {
        self.hist.entries
    }

    /// Raw (un-normalized) histogram.
    pub fn histogram(&self) -> &Histogram {
        &self.hist
    }

    /// Normalize by width and return the calibration histogram.
    ///
    /// Fails when no event landed in range (empty sample).
    pub fn finish(self) -> Result<Histogram> {
        let mut hist = self.hist;
        if hist.overflow > 0.0 {
            tracing::warn!(
                overflow = hist.overflow,
                x_max = hist.axis.x_max,
                "forward multiplicity beyond calibration range"
            );
        }
        hist.normalize_by_width()?;
        Ok(hist)
    }
}

/// Sequential calibration pass over `source`.
pub fn calibrate<S: EventSource>(
    source: &mut S,
    selection: &ForwardSelection,
    config: &CalibrationConfig,
) -> Result<Histogram> {
    let mut acc = CalibrationAccumulator::new(selection.clone(), config)?;
    let n = source.for_each_event(|ev| {
        acc.consume(ev);
        Ok(())
    })?;
    tracing::info!(events = n, name = %config.name, "calibration pass done");
    acc.finish()
}

/// Parallel calibration over an in-memory sample.
///
/// Unit-weight bin sums are exact, so the result does not depend on the
/// thread count.
pub fn calibrate_events_par(
    events: &[Event],
    selection: &ForwardSelection,
    config: &CalibrationConfig,
) -> Result<Histogram> {
    let empty = CalibrationAccumulator::new(selection.clone(), config)?;
    let acc = events
        .par_iter()
        .with_min_len(256)
        .fold(
            || empty.clone(),
            |mut acc, ev| {
                acc.consume(ev);
                acc
            },
        )
        .map(Ok::<_, hc_core::Error>)
        .try_reduce(
            || empty.clone(),
            |mut a, b| {
                a.merge(&b)?;
                Ok(a)
            },
        )?;
    tracing::info!(events = acc.events(), name = %config.name, "calibration pass done");
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hc_core::{Particle, VecSource};

    fn forward(n: usize) -> Event {
        let p = Particle {
            pid: 211,
            pt: 0.5,
            eta: 3.0,
            y: 3.0,
            phi: 0.0,
            is_hadron: true,
            is_charged: true,
        };
        Event::new(vec![p; n])
    }

    #[test]
    fn calibration_is_a_density() {
        let events: Vec<Event> = [0, 1, 3, 3, 10, 55].iter().map(|&n| forward(n)).collect();
        let h = calibrate(
            &mut VecSource::new(events),
            &ForwardSelection::default(),
            &CalibrationConfig::default(),
        )
        .unwrap();
        assert_eq!(h.name, CALIBRATION_KEY);
        assert_eq!(h.entries, 6);
        assert_relative_eq!(h.integral_width(), 1.0, epsilon = 1e-12);
        // counts 3,3 share bin 1 ([2,4)): 2 / (6 × 2)
        assert_relative_eq!(h.bin_content[1], 2.0 / 12.0, epsilon = 1e-15);
    }

    #[test]
    fn empty_source_is_rejected() {
        let err = calibrate(
            &mut VecSource::new(vec![]),
            &ForwardSelection::default(),
            &CalibrationConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("integral"));
    }

    #[test]
    fn parallel_matches_sequential() {
        let events: Vec<Event> = (0..2000).map(|i| forward((i * 7919) % 180)).collect();
        let sel = ForwardSelection::default();
        let cfg = CalibrationConfig::default();
        let seq = calibrate(&mut VecSource::new(events.clone()), &sel, &cfg).unwrap();
        let par = calibrate_events_par(&events, &sel, &cfg).unwrap();
        assert_eq!(seq, par);
    }
}
