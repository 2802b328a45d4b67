//! Species of interest, their PDG codes and ratio scale factors.

use std::fmt;
use std::str::FromStr;

use hc_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which PDG code(s) count as "kaon". Sources disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KaonConvention {
    /// K0S (310), as written by the multi-purpose generator.
    #[default]
    ShortLived,
    /// K0 (311), as written by the thermal generator.
    Neutral,
    /// K± (321).
    Charged,
    /// K± or K0S.
    ChargedOrShortLived,
}

impl KaonConvention {
    /// Whether `abs_pid` is a kaon under this convention.
    pub fn matches(self, abs_pid: u32) -> bool {
        match self {
            KaonConvention::ShortLived => abs_pid == 310,
            KaonConvention::Neutral => abs_pid == 311,
            KaonConvention::Charged => abs_pid == 321,
            KaonConvention::ChargedOrShortLived => abs_pid == 321 || abs_pid == 310,
        }
    }
}

/// A hadron species counted by the yield aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// π (211).
    Pion,
    /// K (per [`KaonConvention`]).
    Kaon,
    /// p (2212).
    Proton,
    /// Λ (3122).
    Lambda,
    /// Ξ (3312).
    Xi,
    /// Ω (3334).
    Omega,
}

impl Species {
    /// All species, in report order.
    pub const ALL: [Species; 6] = [
        Species::Pion,
        Species::Kaon,
        Species::Proton,
        Species::Lambda,
        Species::Xi,
        Species::Omega,
    ];

    /// Whether a particle with `|pid| = abs_pid` belongs to this species.
    pub fn matches(self, abs_pid: u32, kaon: KaonConvention) -> bool {
        match self {
            Species::Pion => abs_pid == 211,
            Species::Kaon => kaon.matches(abs_pid),
            Species::Proton => abs_pid == 2212,
            Species::Lambda => abs_pid == 3122,
            Species::Xi => abs_pid == 3312,
            Species::Omega => abs_pid == 3334,
        }
    }

    /// Scale factor applied to this species' yield in a ratio to pions.
    pub fn scale_factor(self) -> f64 {
        match self {
            Species::Pion | Species::Proton => 1.0,
            Species::Kaon | Species::Lambda => 2.0,
            Species::Xi => 6.0,
            Species::Omega => 16.0,
        }
    }

    /// Store key of this species' per-class yield profile.
    pub fn profile_key(self) -> &'static str {
        match self {
            Species::Pion => "hPiCent",
            Species::Kaon => "hKCent",
            Species::Proton => "hPCent",
            Species::Lambda => "hLCent",
            Species::Xi => "hXCent",
            Species::Omega => "hOmegaCent",
        }
    }

    /// Short label.
    pub fn label(self) -> &'static str {
        match self {
            Species::Pion => "pion",
            Species::Kaon => "kaon",
            Species::Proton => "proton",
            Species::Lambda => "lambda",
            Species::Xi => "xi",
            Species::Omega => "omega",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Species {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Species::ALL
            .into_iter()
            .find(|sp| sp.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unknown species '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kaon_conventions() {
        assert!(Species::Kaon.matches(310, KaonConvention::ShortLived));
        assert!(!Species::Kaon.matches(311, KaonConvention::ShortLived));
        assert!(Species::Kaon.matches(311, KaonConvention::Neutral));
        assert!(Species::Kaon.matches(321, KaonConvention::Charged));
        assert!(Species::Kaon.matches(310, KaonConvention::ChargedOrShortLived));
        assert!(Species::Kaon.matches(321, KaonConvention::ChargedOrShortLived));
        assert!(!Species::Kaon.matches(311, KaonConvention::ChargedOrShortLived));
    }

    #[test]
    fn codes_and_factors() {
        let k = KaonConvention::default();
        assert!(Species::Pion.matches(211, k));
        assert!(Species::Omega.matches(3334, k));
        assert!(!Species::Xi.matches(3334, k));
        let factors: Vec<f64> = Species::ALL.iter().map(|s| s.scale_factor()).collect();
        assert_eq!(factors, vec![1.0, 2.0, 1.0, 2.0, 6.0, 16.0]);
    }

    #[test]
    fn parse_labels() {
        assert_eq!("Kaon".parse::<Species>().unwrap(), Species::Kaon);
        let err = "muon".parse::<Species>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: unknown species 'muon'");
        assert_eq!(Species::Xi.to_string(), "xi");
    }
}
