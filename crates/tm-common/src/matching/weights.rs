use serde::{Deserialize, Serialize};

use crate::config::WeightScoring;
use crate::model::{ExperienceLevel, Job};

/// skill-based: skills only.
pub const SKILL_BASED_WEIGHTS: FactorWeights = FactorWeights {
    skills: 1.0,
    ..FactorWeights::ZERO
};

/// experience-based: 70% experience / 30% skills.
pub const EXPERIENCE_BASED_WEIGHTS: FactorWeights = FactorWeights {
    skills: 0.3,
    experience: 0.7,
    ..FactorWeights::ZERO
};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FactorWeights {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub education: f64,
    pub preferences: f64,
}

impl FactorWeights {
    pub const ZERO: FactorWeights = FactorWeights {
        skills: 0.0,
        experience: 0.0,
        location: 0.0,
        education: 0.0,
        preferences: 0.0,
    };

    pub fn sum(&self) -> f64 {
        self.skills + self.experience + self.location + self.education + self.preferences
    }

    pub fn add(&self, delta: &FactorWeights) -> FactorWeights {
        FactorWeights {
            skills: self.skills + delta.skills,
            experience: self.experience + delta.experience,
            location: self.location + delta.location,
            education: self.education + delta.education,
            preferences: self.preferences + delta.preferences,
        }
    }

    pub fn non_zero_count(&self) -> usize {
        [
            self.skills,
            self.experience,
            self.location,
            self.education,
            self.preferences,
        ]
        .iter()
        .filter(|w| **w != 0.0)
        .count()
    }
}

/// Per-job weight vector for the ai-hybrid family.
///
/// Adjustments are additive and applied in a fixed order (level, remote, skill
/// count). The result is not re-normalized: an entry-level job sums to 1.05.
pub fn dynamic_weights(job: &Job, config: &WeightScoring) -> FactorWeights {
    let mut weights = config.base;

    match job.experience_level {
        Some(ExperienceLevel::Entry) => weights = weights.add(&config.entry_delta),
        Some(ExperienceLevel::Senior) | Some(ExperienceLevel::Executive) => {
            weights = weights.add(&config.senior_delta)
        }
        Some(ExperienceLevel::Mid) | None => {}
    }

    if job.location.remote {
        weights.location =
            (weights.location - config.remote_location_cut).max(config.remote_location_floor);
        weights = weights.add(&config.remote_delta);
    }

    if job.required_skill_count() > config.skill_heavy_threshold {
        weights = weights.add(&config.skill_heavy_delta);
    }

    weights
}
