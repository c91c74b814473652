//! Auxiliary factors layered on top of ai-hybrid by the comprehensive algorithm.

use serde::{Deserialize, Serialize};

use super::FitScore;
use super::adjustments::CareerFit;
use super::preferences::salary_fit;
use crate::config::{ComprehensiveScoring, PreferenceScoring};
use crate::model::{Candidate, Job, same_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveFactors {
    pub cultural_fit: FitScore,
    pub career_growth: FitScore,
    pub salary_fit: FitScore,
    pub availability: FitScore,
}

impl ComprehensiveFactors {
    pub fn evaluate(
        candidate: &Candidate,
        job: &Job,
        career: &CareerFit,
        config: &ComprehensiveScoring,
        preferences: &PreferenceScoring,
    ) -> Self {
        let expectation = candidate
            .preferences
            .as_ref()
            .and_then(|p| p.salary_expectation.as_ref());

        Self {
            cultural_fit: cultural_fit(candidate, job, config),
            career_growth: career_growth(candidate, job, career, config),
            salary_fit: salary_fit(expectation, job.salary.as_ref(), preferences),
            availability: availability_fit(candidate, config),
        }
    }

    /// Extra points on the 0..=100 scale: each factor x 100 x its weight.
    pub fn bonus_points(&self, config: &ComprehensiveScoring) -> f64 {
        (self.cultural_fit.score * config.cultural_weight
            + self.career_growth.score * config.growth_weight
            + self.salary_fit.score * config.salary_weight
            + self.availability.score * config.availability_weight)
            * 100.0
    }
}

pub fn cultural_fit(candidate: &Candidate, job: &Job, config: &ComprehensiveScoring) -> FitScore {
    let mut score = config.cultural_base;
    let mut reasons = Vec::new();

    if let Some(prefs) = &candidate.preferences {
        if contains_ignore_case(prefs.company_sizes.as_deref(), job.company.size.as_deref()) {
            score += config.company_size_bonus;
            reasons.push("Company size matches preference".to_string());
        }
        if contains_ignore_case(prefs.industries.as_deref(), job.industry()) {
            score += config.industry_bonus;
            reasons.push("Industry matches preference".to_string());
        }
    }

    FitScore {
        score: score.min(1.0),
        reasons,
    }
}

pub fn career_growth(
    candidate: &Candidate,
    job: &Job,
    career: &CareerFit,
    config: &ComprehensiveScoring,
) -> FitScore {
    let mut score = config.growth_base;
    let mut reasons = Vec::new();

    if career.is_career_progression {
        score += config.progression_bonus;
        reasons.push("Excellent career progression opportunity".to_string());
    }

    let new_skills = job
        .requirements
        .iter()
        .filter(|req| !candidate.has_skill(req.skill.trim()))
        .count();
    if (1..=config.learning_max_new_skills).contains(&new_skills) {
        score += config.learning_bonus;
        reasons.push("Good opportunity to learn new skills".to_string());
    }

    FitScore {
        score: score.min(1.0),
        reasons,
    }
}

pub fn availability_fit(candidate: &Candidate, config: &ComprehensiveScoring) -> FitScore {
    let availability = candidate
        .preferences
        .as_ref()
        .and_then(|p| p.availability.as_deref())
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let Some(availability) = availability else {
        return (&config.availability_unspecified).into();
    };

    let availability = availability.to_lowercase();
    config
        .availability
        .iter()
        .find(|(label, _)| *label == availability)
        .map(|(_, outcome)| outcome)
        .unwrap_or(&config.availability_other)
        .into()
}

fn contains_ignore_case(list: Option<&[String]>, value: Option<&str>) -> bool {
    match (list, value) {
        (Some(list), Some(value)) => list.iter().any(|item| same_text(item, value)),
        _ => false,
    }
}
