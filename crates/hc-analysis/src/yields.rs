//! Yield selection: kinematic cuts, channels and pair tagging.
//!
//! A [`YieldChannel`] names one per-class profile and says which particles
//! it counts. Channels differ only in data (species or signed PDG code, an
//! optional proximity window around a tagged anchor), never in code path.

use hc_core::{Event, Particle};
use serde::{Deserialize, Serialize};

use crate::species::{KaonConvention, Species};

/// Longitudinal variable a [`KinematicCut`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KinematicVariable {
    /// `y`
    #[default]
    Rapidity,
    /// `eta`
    Pseudorapidity,
}

fn default_max_abs() -> f64 {
    0.5
}

/// Acceptance for counted particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicCut {
    /// Cut variable.
    #[serde(default)]
    pub variable: KinematicVariable,
    /// Bound on `|variable|`, exclusive unless `inclusive`.
    #[serde(default = "default_max_abs")]
    pub max_abs: f64,
    /// Accept `|variable| == max_abs`.
    #[serde(default)]
    pub inclusive: bool,
    /// Optional transverse-momentum threshold (exclusive).
    #[serde(default)]
    pub pt_min: Option<f64>,
    /// Skip particles that count as forward tracks.
    #[serde(default)]
    pub exclude_forward: bool,
}

impl Default for KinematicCut {
    fn default() -> Self {
        Self::rapidity(default_max_abs())
    }
}

impl KinematicCut {
    /// `|y| < max_abs`.
    pub fn rapidity(max_abs: f64) -> Self {
        Self {
            variable: KinematicVariable::Rapidity,
            max_abs,
            inclusive: false,
            pt_min: None,
            exclude_forward: false,
        }
    }

    /// `|eta| < max_abs`.
    pub fn pseudorapidity(max_abs: f64) -> Self {
        Self { variable: KinematicVariable::Pseudorapidity, ..Self::rapidity(max_abs) }
    }

    /// Whether `p` passes the longitudinal and `pt` requirements.
    pub fn accepts(&self, p: &Particle) -> bool {
        let v = match self.variable {
            KinematicVariable::Rapidity => p.y,
            KinematicVariable::Pseudorapidity => p.eta,
        }
        .abs();
        let inside = if self.inclusive { v <= self.max_abs } else { v < self.max_abs };
        inside && self.pt_min.is_none_or(|min| p.pt > min)
    }
}

/// Particle identity a channel counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Matcher {
    /// Any charge state of a species (`|pid|`).
    Species {
        /// Species.
        species: Species,
    },
    /// Exactly this signed PDG code.
    Pid {
        /// PDG code.
        pid: i32,
    },
}

impl Matcher {
    /// Whether `p` matches.
    #[inline]
    pub fn matches(&self, p: &Particle, kaon: KaonConvention) -> bool {
        match *self {
            Matcher::Species { species } => species.matches(p.abs_pid(), kaon),
            Matcher::Pid { pid } => p.pid == pid,
        }
    }
}

/// Which tagged particle a proximity window is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// The tag particle (e.g. Ξ⁻).
    Particle,
    /// Its antiparticle (e.g. Ξ̄⁺).
    Antiparticle,
}

/// `|eta − eta_anchor| < window`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Proximity {
    /// Reference particle.
    pub anchor: Anchor,
    /// Half-width in pseudorapidity.
    pub window: f64,
}

/// One counted quantity, filled into the profile named `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldChannel {
    /// Profile key.
    pub key: String,
    /// Counted identity.
    pub matcher: Matcher,
    /// Optional proximity requirement (needs a [`PairTag`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity: Option<Proximity>,
}

impl YieldChannel {
    /// All particles of `species`, keyed by the species' profile key.
    pub fn species(species: Species) -> Self {
        Self {
            key: species.profile_key().to_string(),
            matcher: Matcher::Species { species },
            proximity: None,
        }
    }

    /// Particles with signed code `pid`.
    pub fn pid(key: impl Into<String>, pid: i32) -> Self {
        Self { key: key.into(), matcher: Matcher::Pid { pid }, proximity: None }
    }

    /// Require proximity to `anchor` within `window`.
    pub fn near(mut self, anchor: Anchor, window: f64) -> Self {
        self.proximity = Some(Proximity { anchor, window });
        self
    }

    /// Same channel under another key.
    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Whether `p` counts, given the event's anchors.
    #[inline]
    pub fn counts(&self, p: &Particle, kaon: KaonConvention, anchors: Option<&Anchors>) -> bool {
        if !self.matcher.matches(p, kaon) {
            return false;
        }
        match (self.proximity, anchors) {
            (None, _) => true,
            (Some(prox), Some(a)) => (p.eta - a.eta(prox.anchor)).abs() < prox.window,
            (Some(_), None) => false,
        }
    }
}

/// Pseudorapidities of the tagged pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    /// Tag particle.
    pub particle_eta: f64,
    /// Tag antiparticle.
    pub antiparticle_eta: f64,
}

impl Anchors {
    /// Pseudorapidity of `anchor`.
    #[inline]
    pub fn eta(&self, anchor: Anchor) -> f64 {
        match anchor {
            Anchor::Particle => self.particle_eta,
            Anchor::Antiparticle => self.antiparticle_eta,
        }
    }
}

fn default_tag_pid() -> i32 {
    3312
}
fn default_tag_max_abs_eta() -> f64 {
    1.0
}

/// Event-level requirement of a particle/antiparticle pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairTag {
    /// PDG code of the tag particle; its negation is the antiparticle.
    #[serde(default = "default_tag_pid")]
    pub pid: i32,
    /// Both must satisfy `|eta| ≤ max_abs_eta`.
    #[serde(default = "default_tag_max_abs_eta")]
    pub max_abs_eta: f64,
}

impl Default for PairTag {
    fn default() -> Self {
        Self { pid: default_tag_pid(), max_abs_eta: default_tag_max_abs_eta() }
    }
}

impl PairTag {
    /// Anchors of `event`, or `None` if either member is missing.
    ///
    /// The last accepted particle of each sign in event order is the anchor.
    pub fn find(&self, event: &Event) -> Option<Anchors> {
        let mut particle = None;
        let mut anti = None;
        for p in event.particles.iter().filter(|p| p.eta.abs() <= self.max_abs_eta) {
            if p.pid == self.pid {
                particle = Some(p.eta);
            } else if p.pid == -self.pid {
                anti = Some(p.eta);
            }
        }
        Some(Anchors { particle_eta: particle?, antiparticle_eta: anti? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(pid: i32, eta: f64) -> Particle {
        Particle { pid, pt: 1.0, eta, y: eta, phi: 0.0, is_hadron: true, is_charged: true }
    }

    #[test]
    fn cut_bounds() {
        let cut = KinematicCut::rapidity(0.5);
        assert!(cut.accepts(&part(211, 0.49)));
        assert!(!cut.accepts(&part(211, -0.5)));
        let incl = KinematicCut { inclusive: true, ..KinematicCut::pseudorapidity(1.0) };
        assert!(incl.accepts(&part(211, -1.0)));
        let pt = KinematicCut { pt_min: Some(1.0), ..cut };
        assert!(!pt.accepts(&part(211, 0.0)));
    }

    #[test]
    fn matcher_sign_handling() {
        let k = KaonConvention::Charged;
        let any = Matcher::Species { species: Species::Kaon };
        let plus = Matcher::Pid { pid: 321 };
        assert!(any.matches(&part(-321, 0.0), k));
        assert!(plus.matches(&part(321, 0.0), k));
        assert!(!plus.matches(&part(-321, 0.0), k));
    }

    #[test]
    fn pair_tag_uses_last_members() {
        let tag = PairTag::default();
        let ev = Event::new(vec![
            part(3312, 0.3),
            part(-3312, -0.2),
            part(3312, 0.9),
            part(3312, 1.5),
        ]);
        let a = tag.find(&ev).unwrap();
        assert_eq!(a.particle_eta, 0.9);
        assert_eq!(a.antiparticle_eta, -0.2);

        let lone = Event::new(vec![part(3312, 0.0), part(-3312, 1.2)]);
        assert!(tag.find(&lone).is_none());
    }

    #[test]
    fn window_follows_last_xi() {
        let tag = PairTag::default();
        let ev = Event::new(vec![part(3312, -0.6), part(-3312, 0.0), part(3312, 0.6)]);
        let anchors = tag.find(&ev).unwrap();
        let ch = YieldChannel::pid("hKPlusCent", 321).near(Anchor::Particle, 0.1);
        let k = KaonConvention::Charged;
        assert!(ch.counts(&part(321, 0.65), k, Some(&anchors)));
        assert!(!ch.counts(&part(321, -0.65), k, Some(&anchors)));
    }

    #[test]
    fn proximity_window() {
        let anchors = Anchors { particle_eta: 0.5, antiparticle_eta: -0.5 };
        let ch = YieldChannel::pid("hKPlusCent", 321).near(Anchor::Particle, 0.2);
        let k = KaonConvention::Charged;
        assert!(ch.counts(&part(321, 0.6), k, Some(&anchors)));
        assert!(!ch.counts(&part(321, 0.75), k, Some(&anchors)));
        assert!(!ch.counts(&part(321, 0.6), k, None));
        let anti = YieldChannel::pid("hKMinusCent", -321).near(Anchor::Antiparticle, 0.2);
        assert!(anti.counts(&part(-321, -0.45), k, Some(&anchors)));
    }
}
