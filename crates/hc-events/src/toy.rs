//! Seeded class-stratified toy events.
//!
//! Stands in for the thermal generator behind the [`EventSource`] interface.
//! Events are produced class by class: a class covering `[lo, hi)` percent
//! yields `round((hi - lo) × events_per_percent)` events whose `v0a`/`v0c`
//! estimators are uniform in `[lo, hi)` and whose `cl1` is the class's
//! charged multiplicity. Per-species counts are Poisson with mean
//!
//! ```text
//! mean = per_mult × mult_charged × gamma_s^strangeness
//! gamma_s = 1 − 0.25 × exp(−mult_charged / 59)
//! ```
//!
//! so strange-hadron fractions rise with multiplicity.

use std::f64::consts::TAU;

use hc_core::{CentralityEstimators, Error, Event, EventSource, Particle, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

/// One centrality class of the toy generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToyClass {
    /// Lower centrality edge (percent).
    pub lo: f64,
    /// Upper centrality edge (percent).
    pub hi: f64,
    /// Mean charged multiplicity of the class.
    pub mult_charged: f64,
}

/// A species emitted by the toy generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToySpecies {
    /// PDG code of the particle.
    pub pid: i32,
    /// Mean count per unit of charged multiplicity.
    pub per_mult: f64,
    /// Number of strange valence quarks.
    #[serde(default)]
    pub strangeness: u32,
    /// Whether the species is electrically charged.
    #[serde(default)]
    pub charged: bool,
    /// Emit the antiparticle half of the time.
    #[serde(default = "default_true")]
    pub antiparticles: bool,
}

fn default_true() -> bool {
    true
}

fn default_classes() -> Vec<ToyClass> {
    const EDGES: [f64; 10] = [0.0, 1.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 70.0, 100.0];
    const MULT: [f64; 9] = [26.0, 20.0, 16.2, 13.75, 10.0, 8.0, 6.3, 4.5, 2.5];
    MULT.iter()
        .enumerate()
        .map(|(i, &mult_charged)| ToyClass { lo: EDGES[i], hi: EDGES[i + 1], mult_charged })
        .collect()
}

fn default_species() -> Vec<ToySpecies> {
    let s = |pid, per_mult, strangeness, charged| ToySpecies {
        pid,
        per_mult,
        strangeness,
        charged,
        antiparticles: true,
    };
    vec![
        s(211, 0.80, 0, true),
        s(2212, 0.05, 0, true),
        s(321, 0.055, 1, true),
        s(311, 0.055, 1, false),
        s(310, 0.0275, 1, false),
        s(3122, 0.025, 1, false),
        s(3312, 0.0035, 2, true),
        s(3334, 0.0006, 3, true),
    ]
}

fn default_events_per_percent() -> f64 {
    100.0
}

fn default_max_abs_y() -> f64 {
    1.0
}

fn default_pt_range() -> (f64, f64) {
    (0.15, 3.0)
}

/// Toy generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToyConfig {
    /// Centrality classes, generated in list order.
    #[serde(default = "default_classes")]
    pub classes: Vec<ToyClass>,
    /// Events per percent of class width.
    #[serde(default = "default_events_per_percent")]
    pub events_per_percent: f64,
    /// Emitted species.
    #[serde(default = "default_species")]
    pub species: Vec<ToySpecies>,
    /// Particles are uniform in `|y| < max_abs_y` (and `eta = y`).
    #[serde(default = "default_max_abs_y")]
    pub max_abs_y: f64,
    /// Uniform transverse-momentum range.
    #[serde(default = "default_pt_range")]
    pub pt_range: (f64, f64),
    /// RNG seed.
    #[serde(default)]
    pub seed: u64,
}

impl Default for ToyConfig {
    fn default() -> Self {
        Self {
            classes: default_classes(),
            events_per_percent: default_events_per_percent(),
            species: default_species(),
            max_abs_y: default_max_abs_y(),
            pt_range: default_pt_range(),
            seed: 0,
        }
    }
}

impl ToyConfig {
    /// Check classes, rates and ranges.
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(Error::Validation("toy generator needs at least one class".into()));
        }
        for c in &self.classes {
            if !(c.lo.is_finite() && c.hi.is_finite() && c.lo < c.hi) {
                return Err(Error::Validation(format!(
                    "invalid toy class interval [{}, {})",
                    c.lo, c.hi
                )));
            }
            if !(c.mult_charged.is_finite() && c.mult_charged >= 0.0) {
                return Err(Error::Validation(format!(
                    "invalid charged multiplicity {} for class [{}, {})",
                    c.mult_charged, c.lo, c.hi
                )));
            }
        }
        if !(self.events_per_percent.is_finite() && self.events_per_percent >= 0.0) {
            return Err(Error::Validation(format!(
                "events_per_percent must be >= 0, got {}",
                self.events_per_percent
            )));
        }
        if let Some(sp) = self.species.iter().find(|s| !(s.per_mult.is_finite() && s.per_mult >= 0.0)) {
            return Err(Error::Validation(format!(
                "invalid per_mult {} for species {}",
                sp.per_mult, sp.pid
            )));
        }
        let (pt_lo, pt_hi) = self.pt_range;
        if !(self.max_abs_y > 0.0 && pt_lo >= 0.0 && pt_lo < pt_hi && pt_hi.is_finite()) {
            return Err(Error::Validation(format!(
                "invalid toy kinematics: max_abs_y={}, pt_range=({pt_lo}, {pt_hi})",
                self.max_abs_y
            )));
        }
        Ok(())
    }

    /// Number of events generated for class `i`.
    pub fn events_in_class(&self, i: usize) -> u64 {
        self.classes
            .get(i)
            .map(|c| ((c.hi - c.lo) * self.events_per_percent).round() as u64)
            .unwrap_or(0)
    }

    /// Total number of events over all classes.
    pub fn total_events(&self) -> u64 {
        (0..self.classes.len()).map(|i| self.events_in_class(i)).sum()
    }
}

/// Strangeness suppression factor at a given charged multiplicity.
pub fn gamma_s(mult_charged: f64) -> f64 {
    1.0 - 0.25 * (-mult_charged / 59.0).exp()
}

/// Seeded toy [`EventSource`].
pub struct ToySource {
    config: ToyConfig,
    rng: StdRng,
    /// Per class, per species: Poisson yield (None for a zero mean).
    yields: Vec<Vec<Option<Poisson<f64>>>>,
    class_idx: usize,
    remaining: u64,
    emitted: u64,
}

impl ToySource {
    /// Validate the configuration and seed the generator.
    pub fn new(config: ToyConfig) -> Result<Self> {
        config.validate()?;
        let mut yields = Vec::with_capacity(config.classes.len());
        for class in &config.classes {
            let g = gamma_s(class.mult_charged);
            let mut row = Vec::with_capacity(config.species.len());
            for sp in &config.species {
                let mean = sp.per_mult * class.mult_charged * g.powi(sp.strangeness as i32);
                let dist = if mean > 0.0 {
                    Some(Poisson::new(mean).map_err(|e| {
                        Error::Validation(format!("species {}: poisson mean {mean}: {e}", sp.pid))
                    })?)
                } else {
                    None
                };
                row.push(dist);
            }
            yields.push(row);
        }
        let remaining = config.events_in_class(0);
        tracing::debug!(
            classes = config.classes.len(),
            total_events = config.total_events(),
            seed = config.seed,
            "toy source ready"
        );
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            yields,
            class_idx: 0,
            remaining,
            emitted: 0,
        })
    }

    /// Events produced so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    fn fill(&mut self, event: &mut Event) {
        let class = self.config.classes[self.class_idx];
        let (pt_lo, pt_hi) = self.config.pt_range;
        let max_y = self.config.max_abs_y;

        for (sp, dist) in self.config.species.iter().zip(&self.yields[self.class_idx]) {
            let Some(dist) = dist else { continue };
            let k: f64 = dist.sample(&mut self.rng);
            for _ in 0..k as u64 {
                let y = self.rng.random_range(-max_y..max_y);
                let pid = if sp.antiparticles && self.rng.random::<bool>() { -sp.pid } else { sp.pid };
                event.particles.push(Particle {
                    pid,
                    pt: self.rng.random_range(pt_lo..pt_hi),
                    eta: y,
                    y,
                    phi: self.rng.random_range(0.0..TAU),
                    is_hadron: true,
                    is_charged: sp.charged,
                });
            }
        }

        let v0a = class.lo + self.rng.random::<f64>() * (class.hi - class.lo);
        event.centrality = Some(CentralityEstimators { v0a, v0c: v0a, cl1: class.mult_charged });
    }
}

impl EventSource for ToySource {
    fn next_event(&mut self, event: &mut Event) -> Result<bool> {
        event.clear();
        while self.remaining == 0 {
            if self.class_idx + 1 >= self.config.classes.len() {
                return Ok(false);
            }
            self.class_idx += 1;
            self.remaining = self.config.events_in_class(self.class_idx);
        }
        self.fill(event);
        self.remaining -= 1;
        self.emitted += 1;
        Ok(true)
    }

    fn len_hint(&self) -> Option<usize> {
        let later: u64 =
            (self.class_idx + 1..self.config.classes.len()).map(|i| self.config.events_in_class(i)).sum();
        Some((self.remaining + later) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ToyConfig {
        ToyConfig {
            classes: vec![
                ToyClass { lo: 0.0, hi: 1.0, mult_charged: 26.0 },
                ToyClass { lo: 1.0, hi: 5.0, mult_charged: 20.0 },
                ToyClass { lo: 5.0, hi: 10.0, mult_charged: 16.2 },
            ],
            events_per_percent: 4.0,
            seed: 7,
            ..ToyConfig::default()
        }
    }

    fn collect(cfg: ToyConfig) -> Vec<Event> {
        let mut src = ToySource::new(cfg).unwrap();
        let mut out = Vec::new();
        src.for_each_event(|ev| {
            out.push(ev.clone());
            Ok(())
        })
        .unwrap();
        out
    }

    #[test]
    fn class_counts_follow_width() {
        let cfg = small();
        assert_eq!(cfg.events_in_class(0), 4);
        assert_eq!(cfg.events_in_class(1), 16);
        assert_eq!(cfg.events_in_class(2), 20);
        assert_eq!(cfg.total_events(), 40);

        let src = ToySource::new(cfg.clone()).unwrap();
        assert_eq!(src.len_hint(), Some(40));
        assert_eq!(collect(cfg).len(), 40);
    }

    #[test]
    fn centrality_within_class() {
        let events = collect(small());
        for (i, ev) in events.iter().enumerate() {
            let c = ev.centrality.unwrap();
            let (lo, hi, mult) = match i {
                0..4 => (0.0, 1.0, 26.0),
                4..20 => (1.0, 5.0, 20.0),
                _ => (5.0, 10.0, 16.2),
            };
            assert!(c.v0a >= lo && c.v0a < hi, "event {i}: v0a={}", c.v0a);
            assert_eq!(c.v0c, c.v0a);
            assert_eq!(c.cl1, mult);
        }
    }

    #[test]
    fn same_seed_same_events() {
        assert_eq!(collect(small()), collect(small()));
        let other = ToyConfig { seed: 8, ..small() };
        assert_ne!(collect(small()), collect(other));
    }

    #[test]
    fn particles_respect_kinematics() {
        let cfg = small();
        for ev in collect(cfg.clone()) {
            for p in &ev.particles {
                assert!(p.y.abs() < cfg.max_abs_y);
                assert!(p.pt >= cfg.pt_range.0 && p.pt < cfg.pt_range.1);
                assert!(cfg.species.iter().any(|s| s.pid == p.pid.abs()));
            }
        }
    }

    #[test]
    fn empty_classes_are_skipped() {
        let cfg = ToyConfig {
            classes: vec![
                ToyClass { lo: 0.0, hi: 0.1, mult_charged: 10.0 },
                ToyClass { lo: 0.1, hi: 1.0, mult_charged: 10.0 },
            ],
            events_per_percent: 2.0,
            ..ToyConfig::default()
        };
        assert_eq!(cfg.events_in_class(0), 0);
        let events = collect(cfg);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.centrality.unwrap().v0a >= 0.1));
    }

    #[test]
    fn rejects_bad_config() {
        let cfg = ToyConfig { classes: vec![], ..ToyConfig::default() };
        assert!(ToySource::new(cfg).is_err());
        let cfg = ToyConfig {
            classes: vec![ToyClass { lo: 5.0, hi: 1.0, mult_charged: 1.0 }],
            ..ToyConfig::default()
        };
        assert!(ToySource::new(cfg).is_err());
    }

    #[test]
    fn strangeness_enhancement_grows_with_multiplicity() {
        assert!(gamma_s(26.0) > gamma_s(2.5));
        assert!(gamma_s(2.5) > 0.75);
        assert_eq!(gamma_s(0.0), 0.75);
        approx::assert_relative_eq!(gamma_s(59.0), 1.0 - 0.25 / std::f64::consts::E, epsilon = 1e-15);
    }
}
