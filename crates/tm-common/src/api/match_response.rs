use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matching::adjustments::{Adjustment, CareerFit};
use crate::matching::comprehensive::ComprehensiveFactors;
use crate::matching::experience::ExperienceDetails;
use crate::matching::location::LocationDetails;
use crate::matching::skills::SkillDetails;
use crate::matching::{AlgorithmKind, Confidence, FactorWeights};

/// Per-factor sub-scores on the 0..=100 scale. Factors an algorithm does not
/// use are reported as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub education: f64,
    pub preferences: f64,
}

impl ScoreBreakdown {
    /// Σ factor × weight, before adjustments.
    pub fn weighted(&self, weights: &FactorWeights) -> f64 {
        self.skills * weights.skills
            + self.experience * weights.experience
            + self.location * weights.location
            + self.education * weights.education
            + self.preferences * weights.preferences
    }
}

/// Structured detail behind the score; sections an algorithm never computed are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<SkillDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<ExperienceDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career: Option<CareerFit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comprehensive: Option<ComprehensiveFactors>,
}

/// Outcome of scoring one candidate against one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    // === score ===
    /// Final score, 0..=100.
    pub score: u8,
    pub confidence: Confidence,
    pub breakdown: ScoreBreakdown,
    pub weights: FactorWeights,

    // === adjustments ===
    pub adjustments: Vec<Adjustment>,
    /// Clamped sum of `adjustments`.
    pub adjustment_total: i32,

    // === explanation ===
    pub reasons: Vec<String>,
    pub recommendations: Vec<String>,
    pub details: MatchDetails,

    // === metadata ===
    pub algorithm: AlgorithmKind,
    pub execution_time_ms: f64,
    pub timestamp: DateTime<Utc>,
}

impl MatchResult {
    /// Equality on everything except `timestamp` and `execution_time_ms`.
    pub fn same_outcome(&self, other: &MatchResult) -> bool {
        self.score == other.score
            && self.confidence == other.confidence
            && self.breakdown == other.breakdown
            && self.weights == other.weights
            && self.adjustments == other.adjustments
            && self.adjustment_total == other.adjustment_total
            && self.reasons == other.reasons
            && self.recommendations == other.recommendations
            && self.details == other.details
            && self.algorithm == other.algorithm
    }
}

/// Rounds and clamps a raw 0..=100 score.
pub(crate) fn final_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}
