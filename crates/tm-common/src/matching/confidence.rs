use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::config::ConfidenceScoring;

/// Declaration order is ascending so `Ord` follows confidence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Confidence {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Maps a final score and the number of factors that fed it to a label.
pub fn calibrate(score: u8, factor_count: usize, config: &ConfidenceScoring) -> Confidence {
    if score >= config.very_high_score && factor_count >= config.very_high_factors {
        Confidence::VeryHigh
    } else if score >= config.high_score && factor_count >= config.high_factors {
        Confidence::High
    } else if score >= config.medium_score {
        Confidence::Medium
    } else if score >= config.low_score {
        Confidence::Low
    } else {
        Confidence::VeryLow
    }
}
