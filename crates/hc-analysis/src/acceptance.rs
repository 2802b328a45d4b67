//! Forward-detector acceptance.

use hc_core::{Event, Particle};
use serde::{Deserialize, Serialize};

/// Open pseudorapidity interval `(lo, hi)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EtaWindow {
    /// Lower bound (exclusive).
    pub lo: f64,
    /// Upper bound (exclusive).
    pub hi: f64,
}

impl EtaWindow {
    /// Whether `eta` lies strictly inside the window.
    #[inline]
    pub fn contains(&self, eta: f64) -> bool {
        eta > self.lo && eta < self.hi
    }
}

/// Which particle attributes a forward track must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardPolicy {
    /// Charged and hadronic.
    #[default]
    ChargedHadron,
    /// Charged only (for sources that do not flag hadrons).
    Charged,
}

fn default_pt_min() -> f64 {
    0.1
}

fn default_windows() -> Vec<EtaWindow> {
    vec![EtaWindow { lo: -3.7, hi: -1.7 }, EtaWindow { lo: 2.8, hi: 5.1 }]
}

/// Forward-track predicate: policy flags, `pt > pt_min`, `eta` in any window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardSelection {
    /// Attribute requirements.
    #[serde(default)]
    pub policy: ForwardPolicy,
    /// Transverse-momentum threshold (GeV, exclusive).
    #[serde(default = "default_pt_min")]
    pub pt_min: f64,
    /// Acceptance windows.
    #[serde(default = "default_windows")]
    pub windows: Vec<EtaWindow>,
}

impl Default for ForwardSelection {
    fn default() -> Self {
        Self::new(ForwardPolicy::default())
    }
}

impl ForwardSelection {
    /// Default windows and threshold under `policy`.
    pub fn new(policy: ForwardPolicy) -> Self {
        Self { policy, pt_min: default_pt_min(), windows: default_windows() }
    }

    /// Whether `p` counts as a forward track.
    pub fn is_forward(&self, p: &Particle) -> bool {
        let flags = match self.policy {
            ForwardPolicy::ChargedHadron => p.is_charged && p.is_hadron,
            ForwardPolicy::Charged => p.is_charged,
        };
        flags && p.pt > self.pt_min && self.windows.iter().any(|w| w.contains(p.eta))
    }

    /// Number of forward tracks in `event`.
    pub fn count(&self, event: &Event) -> u32 {
        event.particles.iter().filter(|p| self.is_forward(p)).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(eta: f64, pt: f64, is_hadron: bool, is_charged: bool) -> Particle {
        Particle { pid: 211, pt, eta, y: eta, phi: 0.0, is_hadron, is_charged }
    }

    #[test]
    fn windows_are_open() {
        let sel = ForwardSelection::default();
        assert!(sel.is_forward(&track(-2.0, 0.5, true, true)));
        assert!(sel.is_forward(&track(4.0, 0.5, true, true)));
        assert!(!sel.is_forward(&track(-3.7, 0.5, true, true)));
        assert!(!sel.is_forward(&track(-1.7, 0.5, true, true)));
        assert!(!sel.is_forward(&track(2.8, 0.5, true, true)));
        assert!(!sel.is_forward(&track(5.1, 0.5, true, true)));
        assert!(!sel.is_forward(&track(0.0, 0.5, true, true)));
    }

    #[test]
    fn pt_threshold_is_strict() {
        let sel = ForwardSelection::default();
        assert!(!sel.is_forward(&track(3.0, 0.1, true, true)));
        assert!(sel.is_forward(&track(3.0, 0.1001, true, true)));
    }

    #[test]
    fn policies_differ_on_hadron_flag() {
        let lepton = track(3.0, 1.0, false, true);
        assert!(!ForwardSelection::new(ForwardPolicy::ChargedHadron).is_forward(&lepton));
        assert!(ForwardSelection::new(ForwardPolicy::Charged).is_forward(&lepton));

        let neutral = track(3.0, 1.0, true, false);
        assert!(!ForwardSelection::new(ForwardPolicy::Charged).is_forward(&neutral));
    }

    #[test]
    fn counts_per_event() {
        let ev = Event::new(vec![
            track(3.0, 1.0, true, true),
            track(-2.5, 0.2, true, true),
            track(0.0, 1.0, true, true),
            track(3.0, 0.05, true, true),
        ]);
        assert_eq!(ForwardSelection::default().count(&ev), 2);
    }
}
