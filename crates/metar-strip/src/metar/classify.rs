//! Flight category classification.
//!
//! Visibility and every ceiling layer each yield a category; the worst known
//! one wins. `Unknown` only survives when nothing known contributes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::observation::{CloudLayer, Observation, Visibility};

/// Flight category, ordered worst to best with `Unknown` below everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "lifr", alias = "low-instrument")]
    LowInstrument,
    #[serde(rename = "ifr", alias = "instrument")]
    Instrument,
    #[serde(rename = "mvfr", alias = "marginal-visual")]
    MarginalVisual,
    #[serde(rename = "vfr", alias = "visual")]
    Visual,
}

impl Severity {
    /// All categories, worst known first, `Unknown` last.
    pub const ALL: [Severity; 5] = [
        Severity::LowInstrument,
        Severity::Instrument,
        Severity::MarginalVisual,
        Severity::Visual,
        Severity::Unknown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Severity::Unknown => "UNKNOWN",
            Severity::LowInstrument => "LIFR",
            Severity::Instrument => "IFR",
            Severity::MarginalVisual => "MVFR",
            Severity::Visual => "VFR",
        }
    }

    /// Combine two contributions, keeping the worse known one.
    pub fn worst(self, other: Severity) -> Severity {
        match (self, other) {
            (Severity::Unknown, s) | (s, Severity::Unknown) => s,
            (a, b) => a.min(b),
        }
    }

    /// The category after this one in the display cycle
    /// unknown → VFR → MVFR → IFR → LIFR → unknown.
    pub fn cycle_next(self) -> Severity {
        match self {
            Severity::Unknown => Severity::Visual,
            Severity::Visual => Severity::MarginalVisual,
            Severity::MarginalVisual => Severity::Instrument,
            Severity::Instrument => Severity::LowInstrument,
            Severity::LowInstrument => Severity::Unknown,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn visibility_severity(visibility: &Visibility) -> Severity {
    let d = visibility.distance;
    if d > 5.0 {
        Severity::Visual
    } else if d >= 3.0 {
        Severity::MarginalVisual
    } else if d >= 1.0 {
        Severity::Instrument
    } else {
        Severity::LowInstrument
    }
}

fn layer_severity(layer: &CloudLayer) -> Severity {
    if !layer.cover.is_ceiling() {
        return Severity::Visual;
    }
    match layer.base {
        None => Severity::Unknown,
        Some(base) if base > 3000.0 => Severity::Visual,
        Some(base) if base > 1000.0 => Severity::MarginalVisual,
        Some(base) if base > 500.0 => Severity::Instrument,
        Some(_) => Severity::LowInstrument,
    }
}

/// Classify one observation.
pub fn classify(observation: &Observation) -> Severity {
    let Some(visibility) = &observation.visibility else {
        return Severity::Unknown;
    };

    observation
        .clouds
        .iter()
        .map(layer_severity)
        .fold(visibility_severity(visibility), Severity::worst)
}

impl Observation {
    pub fn severity(&self) -> Severity {
        classify(self)
    }
}
