use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{FactorResult, reasons::experience_reasons};
use crate::config::ExperienceScoring;
use crate::model::{Job, Position, same_text, total_years};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceDetails {
    pub total_years: f64,
    pub relevant_years: f64,
    pub required_years: f64,
    pub industry_match: bool,
    /// Best title similarity across all positions (can exceed 1.0 for identical titles).
    pub role_match: f64,
    pub relevant_positions: usize,
    pub total_positions: usize,
    pub years_score: f64,
    pub total_experience_boost: f64,
}

pub fn match_experience(
    positions: &[Position],
    job: &Job,
    config: &ExperienceScoring,
) -> FactorResult<ExperienceDetails> {
    let required_years = config.required_years.get(job.experience_level);

    if positions.is_empty() {
        let details = ExperienceDetails {
            required_years,
            ..ExperienceDetails::default()
        };
        let reasons = experience_reasons(&details);
        return FactorResult::new(0.0, details, reasons);
    }

    let job_industry = job.industry();
    let in_job_industry = |position: &Position| match (position.industry.as_deref(), job_industry) {
        (Some(held), Some(wanted)) => same_text(held, wanted),
        _ => false,
    };

    let relevant: Vec<&Position> = positions
        .iter()
        .filter(|p| {
            title_similarity(&p.title, &job.title) > config.relevance_threshold || in_job_industry(p)
        })
        .collect();

    let total = total_years(positions);
    let relevant_years = relevant
        .iter()
        .map(|p| p.duration_months)
        .sum::<f64>()
        / 12.0;
    let industry_match = positions.iter().any(in_job_industry);
    let role_match = positions
        .iter()
        .map(|p| title_similarity(&p.title, &job.title))
        .fold(0.0, f64::max);

    let years_score = (relevant_years / required_years).min(1.0);
    let total_experience_boost = (total / (required_years * config.total_years_stretch)).min(1.0);
    let industry_credit = if industry_match {
        1.0
    } else {
        config.industry_miss_credit
    };

    let score = years_score * config.years_weight
        + industry_credit * config.industry_weight
        + role_match * config.role_weight
        + total_experience_boost * config.total_weight;

    let details = ExperienceDetails {
        total_years: total,
        relevant_years,
        required_years,
        industry_match,
        role_match,
        relevant_positions: relevant.len(),
        total_positions: positions.len(),
        years_score,
        total_experience_boost,
    };
    let reasons = experience_reasons(&details);

    FactorResult::new(score, details, reasons)
}

/// `2 * common / |union|` over lowercased whitespace tokens.
///
/// Common words are counted over the first title's tokens, so identical
/// two-word titles score 2.0.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let left: Vec<&str> = a.split_whitespace().collect();
    let right: Vec<&str> = b.split_whitespace().collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let right_set: HashSet<&str> = right.iter().copied().collect();
    let common = left.iter().filter(|word| right_set.contains(*word)).count();
    let union: HashSet<&str> = left.iter().chain(right.iter()).copied().collect();

    (common as f64 * 2.0) / union.len() as f64
}
