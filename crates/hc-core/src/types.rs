//! Event records.
//!
//! Records are plain data: they carry no behaviour beyond small kinematic
//! accessors, and serialization lives in the event-source crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A final-state particle as delivered by an event source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// PDG identity code; the sign distinguishes particle from antiparticle.
    pub pid: i32,
    /// Transverse momentum (GeV).
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Rapidity.
    pub y: f64,
    /// Azimuthal angle.
    #[serde(default)]
    pub phi: f64,
    /// Whether the particle is a hadron.
    #[serde(default)]
    pub is_hadron: bool,
    /// Whether the particle carries electric charge.
    #[serde(default)]
    pub is_charged: bool,
}

impl Particle {
    /// Absolute PDG code.
    #[inline]
    pub fn abs_pid(&self) -> u32 {
        self.pid.unsigned_abs()
    }
}

/// Precomputed centrality estimators (percent) attached by the thermal source.
///
/// The three values are interchangeable as "the" centrality of the event;
/// which one feeds the classifier is a pipeline choice.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CentralityEstimators {
    /// Forward A-side estimator.
    pub v0a: f64,
    /// Forward C-side estimator.
    pub v0c: f64,
    /// Central-barrel multiplicity estimator.
    pub cl1: f64,
}

impl CentralityEstimators {
    /// Read one estimator.
    pub fn get(&self, which: CentralityEstimator) -> f64 {
        match which {
            CentralityEstimator::V0A => self.v0a,
            CentralityEstimator::V0C => self.v0c,
            CentralityEstimator::Cl1 => self.cl1,
        }
    }
}

/// Selector for one of the [`CentralityEstimators`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CentralityEstimator {
    /// `v0a`
    #[default]
    V0A,
    /// `v0c`
    V0C,
    /// `cl1`
    Cl1,
}

impl fmt::Display for CentralityEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CentralityEstimator::V0A => "v0a",
            CentralityEstimator::V0C => "v0c",
            CentralityEstimator::Cl1 => "cl1",
        };
        f.write_str(s)
    }
}

impl FromStr for CentralityEstimator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "v0a" => Ok(Self::V0A),
            "v0c" => Ok(Self::V0C),
            "cl1" => Ok(Self::Cl1),
            other => Err(Error::Validation(format!(
                "unknown centrality estimator '{other}' (expected v0a, v0c, cl1)"
            ))),
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

/// One collision event.
///
/// Sources refill a caller-owned `Event` every step (see
/// [`EventSource::next_event`](crate::EventSource::next_event)); the particle
/// buffer keeps its capacity across steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Final-state particles, order irrelevant.
    pub particles: Vec<Particle>,
    /// Event weight.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Centrality estimators, when the source provides them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centrality: Option<CentralityEstimators>,
}

impl Default for Event {
    fn default() -> Self {
        Self { particles: Vec::new(), weight: 1.0, centrality: None }
    }
}

impl Event {
    /// Create an event with unit weight and no centrality estimators.
    pub fn new(particles: Vec<Particle>) -> Self {
        Self { particles, ..Self::default() }
    }

    /// Reset to an empty unit-weight event, keeping the particle allocation.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.weight = 1.0;
        self.centrality = None;
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the event holds no particles.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
