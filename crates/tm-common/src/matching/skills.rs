use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use super::{FactorResult, banded, reasons::skill_reasons};
use crate::config::SkillScoring;
use crate::model::{CandidateSkill, Requirement, SkillLevel, same_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GapSeverity {
    /// Required skill the candidate does not list at all.
    Critical,
    /// Required skill held below the expected level or tenure.
    High,
    /// Optional skill held below the expected level or tenure.
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedSkill {
    pub skill: String,
    pub candidate_level: Option<SkillLevel>,
    pub required_level: Option<SkillLevel>,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingSkill {
    pub skill: String,
    pub level: Option<SkillLevel>,
    pub required: bool,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    pub skill: String,
    pub required_level: Option<SkillLevel>,
    /// `None` when the candidate lacks the skill entirely.
    pub current_level: Option<SkillLevel>,
    pub severity: GapSeverity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDetails {
    pub matched_skills: Vec<MatchedSkill>,
    pub missing_skills: Vec<MissingSkill>,
    pub skill_gaps: Vec<SkillGap>,
    pub total_required: usize,
    pub total_matched: usize,
    pub total_missing: usize,
    pub critical_gaps: usize,
}

/// Weighted skill coverage of a job's requirements.
///
/// Required skills weigh twice as much as optional ones. Each matched skill
/// scores the mean of its level fit and its tenure fit; missing skills score 0.
pub fn match_skills(
    candidate_skills: &[CandidateSkill],
    requirements: &[Requirement],
    config: &SkillScoring,
) -> FactorResult<SkillDetails> {
    let mut details = SkillDetails {
        total_required: requirements.len(),
        ..SkillDetails::default()
    };
    let mut total_weight = 0.0;
    let mut matched_weight = 0.0;

    for requirement in requirements {
        let weight = if requirement.required {
            config.required_weight
        } else {
            config.optional_weight
        };
        total_weight += weight;

        let held = candidate_skills
            .iter()
            .find(|skill| same_text(&skill.name, &requirement.skill));

        let Some(held) = held else {
            details.missing_skills.push(MissingSkill {
                skill: requirement.skill.clone(),
                level: requirement.level,
                required: requirement.required,
                weight,
            });
            if requirement.required {
                details.skill_gaps.push(SkillGap {
                    skill: requirement.skill.clone(),
                    required_level: requirement.level,
                    current_level: None,
                    severity: GapSeverity::Critical,
                });
            }
            continue;
        };

        let level = level_score(held.level, requirement.level, config);
        let tenure = experience_score(held.years_experience, requirement.years_experience, config);
        let score = (level + tenure) / 2.0;
        matched_weight += weight * score;

        details.matched_skills.push(MatchedSkill {
            skill: requirement.skill.clone(),
            candidate_level: held.level,
            required_level: requirement.level,
            score,
            weight,
        });

        if score < config.gap_threshold {
            details.skill_gaps.push(SkillGap {
                skill: requirement.skill.clone(),
                required_level: requirement.level,
                current_level: held.level,
                severity: if requirement.required {
                    GapSeverity::High
                } else {
                    GapSeverity::Medium
                },
            });
        }
    }

    details.total_matched = details.matched_skills.len();
    details.total_missing = details.missing_skills.len();
    details.critical_gaps = details
        .skill_gaps
        .iter()
        .filter(|gap| gap.severity == GapSeverity::Critical)
        .count();

    let score = if total_weight > 0.0 {
        matched_weight / total_weight
    } else {
        0.0
    };
    let reasons = skill_reasons(&details, score);

    FactorResult::new(score, details, reasons)
}

/// 1.0 at or above the required level, 0.7 one step below, 0.3 otherwise.
pub fn level_score(
    candidate: Option<SkillLevel>,
    required: Option<SkillLevel>,
    config: &SkillScoring,
) -> f64 {
    let held = candidate.unwrap_or(config.default_candidate_level).rank();
    let needed = required.unwrap_or(config.default_required_level).rank();

    if held >= needed {
        config.level_at_or_above
    } else if held == needed - 1 {
        config.level_one_below
    } else {
        config.level_further_below
    }
}

/// Tenure fit from the years ratio; no stated requirement counts as fully met.
pub fn experience_score(candidate_years: f64, required_years: f64, config: &SkillScoring) -> f64 {
    if required_years <= 0.0 {
        return 1.0;
    }
    banded(
        candidate_years / required_years,
        &config.experience_bands,
        config.experience_floor,
    )
}
