use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

use super::weights::{EXPERIENCE_BASED_WEIGHTS, FactorWeights, SKILL_BASED_WEIGHTS};
use crate::config::WeightScoring;
use crate::error::MatchError;

/// The four scoring algorithms. Parsing is the only place an unknown name can
/// surface; everything downstream matches exhaustively.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, AsRefStr, EnumIter,
)]
#[serde(rename_all = "kebab-case", try_from = "String")]
#[strum(serialize_all = "kebab-case")]
pub enum AlgorithmKind {
    SkillBased,
    ExperienceBased,
    #[default]
    AiHybrid,
    Comprehensive,
}

impl AlgorithmKind {
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmKind::SkillBased => "skill-based",
            AlgorithmKind::ExperienceBased => "experience-based",
            AlgorithmKind::AiHybrid => "ai-hybrid",
            AlgorithmKind::Comprehensive => "comprehensive",
        }
    }

    /// Factors carrying non-zero weight; feeds confidence calibration.
    pub fn factor_count(self) -> usize {
        match self {
            AlgorithmKind::SkillBased => SKILL_BASED_WEIGHTS.non_zero_count(),
            AlgorithmKind::ExperienceBased => EXPERIENCE_BASED_WEIGHTS.non_zero_count(),
            AlgorithmKind::AiHybrid | AlgorithmKind::Comprehensive => 5,
        }
    }

    /// Whether the dynamic weight policy and heuristic adjustments apply.
    pub fn uses_adjustments(self) -> bool {
        matches!(self, AlgorithmKind::AiHybrid | AlgorithmKind::Comprehensive)
    }

    pub fn descriptor(self, config: &WeightScoring) -> AlgorithmDescriptor {
        let description = match self {
            AlgorithmKind::SkillBased => "Matches based on technical skills and competencies",
            AlgorithmKind::ExperienceBased => "Matches based on work experience and role history",
            AlgorithmKind::AiHybrid => "AI-powered comprehensive matching with dynamic weighting",
            AlgorithmKind::Comprehensive => "Complete analysis including cultural fit and career growth",
        };
        let weights = match self {
            AlgorithmKind::SkillBased => SKILL_BASED_WEIGHTS,
            AlgorithmKind::ExperienceBased => EXPERIENCE_BASED_WEIGHTS,
            AlgorithmKind::AiHybrid | AlgorithmKind::Comprehensive => config.base,
        };
        AlgorithmDescriptor {
            name: self,
            description: description.to_string(),
            weights,
            is_default: self == AlgorithmKind::default(),
        }
    }

    pub fn catalog(config: &WeightScoring) -> Vec<AlgorithmDescriptor> {
        AlgorithmKind::iter().map(|kind| kind.descriptor(config)).collect()
    }
}

impl FromStr for AlgorithmKind {
    type Err = MatchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        AlgorithmKind::iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MatchError::UnknownAlgorithm(raw.to_string()))
    }
}

impl TryFrom<String> for AlgorithmKind {
    type Error = MatchError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Catalog entry; `weights` are the nominal (pre-adjustment) weights.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmDescriptor {
    pub name: AlgorithmKind,
    pub description: String,
    pub weights: FactorWeights,
    pub is_default: bool,
}
