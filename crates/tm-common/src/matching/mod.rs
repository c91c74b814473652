pub mod adjustments;
pub mod algorithm;
pub mod comprehensive;
pub mod confidence;
pub mod education;
pub mod experience;
pub mod location;
pub mod pipeline;
pub mod preferences;
pub mod reasons;
pub mod scoring;
pub mod skills;
pub mod weights;

use serde::{Deserialize, Serialize};

use crate::config::RuleOutcome;

pub use algorithm::AlgorithmKind;
pub use confidence::Confidence;
pub use pipeline::{BatchControl, BatchRanker, BulkOptions};
pub use scoring::MatchingService;
pub use weights::FactorWeights;

/// Output of one factor matcher: a `[0, 1]` score, typed detail and the
/// reason strings produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorResult<D> {
    pub score: f64,
    pub details: D,
    pub reasons: Vec<String>,
}

impl<D> FactorResult<D> {
    pub fn new(score: f64, details: D, reasons: Vec<String>) -> Self {
        Self {
            score: clamp_unit(score),
            details,
            reasons,
        }
    }

    /// Score on the 0..=100 scale used by breakdowns.
    pub fn percent(&self) -> f64 {
        self.score * 100.0
    }
}

/// Score of an auxiliary fit check (salary, remote mode, culture, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitScore {
    pub score: f64,
    pub reasons: Vec<String>,
}

impl FitScore {
    pub fn new(score: f64, reason: impl Into<String>) -> Self {
        Self {
            score: clamp_unit(score),
            reasons: vec![reason.into()],
        }
    }
}

impl From<&RuleOutcome> for FitScore {
    fn from(outcome: &RuleOutcome) -> Self {
        Self::new(outcome.score, outcome.reason.as_str())
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Walks `(minimum, score)` bands top-down and returns the first band `value` reaches.
pub(crate) fn banded(value: f64, bands: &[(f64, f64)], floor: f64) -> f64 {
    bands
        .iter()
        .find(|(minimum, _)| value >= *minimum)
        .map(|(_, score)| *score)
        .unwrap_or(floor)
}
