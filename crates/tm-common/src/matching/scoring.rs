use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::adjustments::{AdjustmentSummary, apply_adjustments, assess_career_fit};
use super::algorithm::AlgorithmKind;
use super::comprehensive::ComprehensiveFactors;
use super::confidence::calibrate;
use super::education::match_education;
use super::experience::match_experience;
use super::location::match_location;
use super::preferences::match_preferences;
use super::reasons::{
    FactorSummary, advanced_recommendations, basic_recommendations, combined_reasons,
    comprehensive_factor_reasons,
};
use super::skills::{MissingSkill, match_skills};
use super::weights::{EXPERIENCE_BASED_WEIGHTS, FactorWeights, SKILL_BASED_WEIGHTS, dynamic_weights};
use crate::api::match_response::{MatchDetails, MatchResult, ScoreBreakdown, final_score};
use crate::config::ScoringConfig;
use crate::error::MatchError;
use crate::model::{Candidate, Job};

/// Everything an algorithm produces before the shared finishing steps
/// (rounding, confidence, recommendations).
struct Scored {
    raw: f64,
    breakdown: ScoreBreakdown,
    weights: FactorWeights,
    adjustments: AdjustmentSummary,
    reasons: Vec<String>,
    details: MatchDetails,
    missing: Vec<MissingSkill>,
}

/// Scores a single candidate/job pair. Holds only configuration, so one
/// instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct MatchingService {
    config: ScoringConfig,
}

impl MatchingService {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn match_candidate_to_job(
        &self,
        candidate: &Candidate,
        job: &Job,
        algorithm: AlgorithmKind,
    ) -> Result<MatchResult, MatchError> {
        self.match_candidate_to_job_at(candidate, job, algorithm, Utc::now())
    }

    /// Same as [`match_candidate_to_job`](Self::match_candidate_to_job) with `now` pinned,
    /// which makes the recent-activity rule reproducible.
    #[instrument(
        level = "debug",
        skip(self, candidate, job, now),
        fields(candidate_id = %candidate.id, job_id = %job.id)
    )]
    pub fn match_candidate_to_job_at(
        &self,
        candidate: &Candidate,
        job: &Job,
        algorithm: AlgorithmKind,
        now: DateTime<Utc>,
    ) -> Result<MatchResult, MatchError> {
        let started = Instant::now();
        candidate.validate()?;
        job.validate()?;

        let scored = match algorithm {
            AlgorithmKind::SkillBased => self.skill_based(candidate, job),
            AlgorithmKind::ExperienceBased => self.experience_based(candidate, job),
            AlgorithmKind::AiHybrid => self.ai_hybrid(candidate, job, now),
            AlgorithmKind::Comprehensive => self.comprehensive(candidate, job, now),
        };

        let score = final_score(scored.raw);
        let confidence = calibrate(score, algorithm.factor_count(), &self.config.confidence);
        let recommendations = if algorithm.uses_adjustments() {
            advanced_recommendations(score, &scored.missing)
        } else {
            basic_recommendations(score)
        };

        debug!(
            algorithm = %algorithm,
            score,
            confidence = confidence.as_ref(),
            adjustment_total = scored.adjustments.total,
            "pair scored"
        );

        Ok(MatchResult {
            score,
            confidence,
            breakdown: scored.breakdown,
            weights: scored.weights,
            adjustments: scored.adjustments.adjustments,
            adjustment_total: scored.adjustments.total,
            reasons: scored.reasons,
            recommendations,
            details: scored.details,
            algorithm,
            execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            timestamp: Utc::now(),
        })
    }

    /// Resolves `algorithm` by name first; unknown names fail the call.
    pub fn match_by_name(
        &self,
        candidate: &Candidate,
        job: &Job,
        algorithm: &str,
    ) -> Result<MatchResult, MatchError> {
        let algorithm: AlgorithmKind = algorithm.parse()?;
        self.match_candidate_to_job(candidate, job, algorithm)
    }

    fn skill_based(&self, candidate: &Candidate, job: &Job) -> Scored {
        let skills = match_skills(&candidate.skills, &job.requirements, &self.config.skills);
        let breakdown = ScoreBreakdown {
            skills: skills.percent(),
            ..ScoreBreakdown::default()
        };

        Scored {
            raw: breakdown.weighted(&SKILL_BASED_WEIGHTS),
            breakdown,
            weights: SKILL_BASED_WEIGHTS,
            adjustments: AdjustmentSummary::default(),
            reasons: skills.reasons,
            missing: skills.details.missing_skills.clone(),
            details: MatchDetails {
                skills: Some(skills.details),
                ..MatchDetails::default()
            },
        }
    }

    fn experience_based(&self, candidate: &Candidate, job: &Job) -> Scored {
        let experience = match_experience(&candidate.experience, job, &self.config.experience);
        let skills = match_skills(&candidate.skills, &job.requirements, &self.config.skills);
        let breakdown = ScoreBreakdown {
            skills: skills.percent(),
            experience: experience.percent(),
            ..ScoreBreakdown::default()
        };

        let mut reasons = experience.reasons;
        reasons.extend(skills.reasons);

        Scored {
            raw: breakdown.weighted(&EXPERIENCE_BASED_WEIGHTS),
            breakdown,
            weights: EXPERIENCE_BASED_WEIGHTS,
            adjustments: AdjustmentSummary::default(),
            reasons,
            missing: skills.details.missing_skills.clone(),
            details: MatchDetails {
                skills: Some(skills.details),
                experience: Some(experience.details),
                ..MatchDetails::default()
            },
        }
    }

    fn ai_hybrid(&self, candidate: &Candidate, job: &Job, now: DateTime<Utc>) -> Scored {
        let config = &self.config;
        let skills = match_skills(&candidate.skills, &job.requirements, &config.skills);
        let experience = match_experience(&candidate.experience, job, &config.experience);
        let location = match_location(candidate.location.as_ref(), &job.location, &config.location);
        let education = match_education(&candidate.education, &job.requirements, &config.education);
        let preferences = match_preferences(candidate.preferences.as_ref(), job, &config.preferences);

        let weights = dynamic_weights(job, &config.weights);
        let breakdown = ScoreBreakdown {
            skills: skills.percent(),
            experience: experience.percent(),
            location: location.percent(),
            education: education.percent(),
            preferences: preferences.percent(),
        };

        let career = assess_career_fit(candidate, job, now, &config.adjustments);
        let adjustments = apply_adjustments(&career, skills.score, &config.adjustments);

        let reasons = combined_reasons(&FactorSummary {
            skills: skills.score,
            experience: experience.score,
            location: location.score,
            remote_compatible: location.details.remote_compatible,
            education: education.score,
        });

        Scored {
            raw: breakdown.weighted(&weights) + f64::from(adjustments.total),
            breakdown,
            weights,
            adjustments,
            reasons,
            missing: skills.details.missing_skills.clone(),
            details: MatchDetails {
                skills: Some(skills.details),
                experience: Some(experience.details),
                location: Some(location.details),
                career: Some(career),
                comprehensive: None,
            },
        }
    }

    fn comprehensive(&self, candidate: &Candidate, job: &Job, now: DateTime<Utc>) -> Scored {
        let mut scored = self.ai_hybrid(candidate, job, now);
        let career = scored.details.career.unwrap_or_default();

        let factors = ComprehensiveFactors::evaluate(
            candidate,
            job,
            &career,
            &self.config.comprehensive,
            &self.config.preferences,
        );

        // ai-hybrid is rounded on its own before the bonus lands
        let base = f64::from(final_score(scored.raw));
        scored.raw = base + factors.bonus_points(&self.config.comprehensive);
        scored.reasons.extend(comprehensive_factor_reasons(
            factors.cultural_fit.score,
            factors.career_growth.score,
            factors.salary_fit.score,
        ));
        scored.details.comprehensive = Some(factors);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Confidence;
    use crate::matching::adjustments::AdjustmentKind;
    use crate::model::{
        CandidateLocation, CandidateSkill, Company, ExperienceLevel, JobLocation, Position,
        Requirement, SkillLevel,
    };
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn base_job() -> Job {
        Job {
            id: "job-1".into(),
            title: "Backend Engineer".into(),
            requirements: ["Rust", "PostgreSQL", "Docker"]
                .iter()
                .map(|skill| Requirement {
                    skill: skill.to_string(),
                    level: Some(SkillLevel::Advanced),
                    required: true,
                    years_experience: 3.0,
                })
                .collect(),
            experience_level: Some(ExperienceLevel::Mid),
            location: JobLocation {
                city: "Berlin".into(),
                country: "Germany".into(),
                ..JobLocation::default()
            },
            company: Company {
                industry: Some("Software".into()),
                ..Company::default()
            },
            ..Job::default()
        }
    }

    fn base_candidate() -> Candidate {
        Candidate {
            id: "cand-1".into(),
            skills: ["Rust", "PostgreSQL", "Docker"]
                .iter()
                .map(|name| CandidateSkill {
                    name: name.to_string(),
                    level: Some(SkillLevel::Expert),
                    years_experience: 5.0,
                })
                .collect(),
            experience: vec![Position {
                title: "Backend Engineer".into(),
                industry: Some("Software".into()),
                duration_months: 60.0,
            }],
            location: Some(CandidateLocation {
                city: "Berlin".into(),
                country: "Germany".into(),
                ..CandidateLocation::default()
            }),
            ..Candidate::default()
        }
    }

    #[test]
    fn skill_based_uses_skills_only() {
        let service = MatchingService::default();
        let result = service
            .match_candidate_to_job_at(&base_candidate(), &base_job(), AlgorithmKind::SkillBased, now())
            .unwrap();

        assert_eq!(result.score, 100);
        assert_eq!(result.breakdown.experience, 0.0);
        assert!(result.adjustments.is_empty());
        // single factor caps confidence below very-high and high
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(result.recommendations[0], "Highly recommended for interview");
        assert!(result.details.experience.is_none());
    }

    #[test]
    fn experience_based_blends_seventy_thirty() {
        let service = MatchingService::default();
        let mut candidate = base_candidate();
        candidate.skills.clear();

        let result = service
            .match_candidate_to_job_at(&candidate, &base_job(), AlgorithmKind::ExperienceBased, now())
            .unwrap();

        // experience saturates at 100, skills are 0
        assert_eq!(result.breakdown.experience, 100.0);
        assert_eq!(result.score, 70);
        assert_eq!(result.confidence, Confidence::Medium);
        assert!(result.reasons.contains(&"3 skills need development".to_string()));
    }

    #[test]
    fn ai_hybrid_applies_adjustments() {
        let service = MatchingService::default();
        let result = service
            .match_candidate_to_job_at(&base_candidate(), &base_job(), AlgorithmKind::AiHybrid, now())
            .unwrap();

        let kinds: Vec<_> = result.adjustments.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AdjustmentKind::PerfectSkills]);
        assert_eq!(result.adjustment_total, 5);
        assert!(result.score >= 90);
        assert_eq!(result.confidence, Confidence::VeryHigh);
        assert!(result.reasons.contains(&"Exceptional skill alignment".to_string()));
        assert!(result.reasons.contains(&"Perfect location match".to_string()));
        assert_eq!(
            result.recommendations[0],
            "Priority candidate - schedule interview immediately"
        );
        assert!(result.details.career.is_some());
    }

    #[test]
    fn comprehensive_adds_bonus_on_top_of_hybrid() {
        let service = MatchingService::default();
        let mut job = base_job();
        job.requirements.push(Requirement {
            skill: "Kubernetes".into(),
            required: true,
            ..Requirement::default()
        });
        let mut candidate = base_candidate();
        candidate.experience[0].duration_months = 12.0;

        let hybrid = service
            .match_candidate_to_job_at(&candidate, &job, AlgorithmKind::AiHybrid, now())
            .unwrap();
        let comprehensive = service
            .match_candidate_to_job_at(&candidate, &job, AlgorithmKind::Comprehensive, now())
            .unwrap();

        let factors = comprehensive.details.comprehensive.as_ref().unwrap();
        let bonus = factors.bonus_points(&service.config().comprehensive);
        let expected = (f64::from(hybrid.score) + bonus).round().min(100.0) as u8;
        assert_eq!(comprehensive.score, expected);
        assert!(comprehensive.score >= hybrid.score);
        assert_eq!(comprehensive.breakdown, hybrid.breakdown);
    }

    #[test]
    fn extreme_env_overrides_still_score() {
        let config = ScoringConfig::from_lookup(|key| match key {
            "TM_RECENT_ACTIVITY_DAYS" => Some("9223372036854775807".to_string()),
            "TM_ADJUSTMENT_CAP" => Some("-2147483648".to_string()),
            _ => None,
        });
        let service = MatchingService::new(config);
        let mut candidate = base_candidate();
        candidate.last_active = Some(Utc.with_ymd_and_hms(1995, 1, 1, 0, 0, 0).unwrap());

        let result = service
            .match_candidate_to_job_at(&candidate, &base_job(), AlgorithmKind::AiHybrid, now())
            .unwrap();
        assert!(
            result
                .adjustments
                .iter()
                .any(|a| a.kind == AdjustmentKind::RecentActivity)
        );
        assert!(result.score <= 100);
    }

    #[test]
    fn unknown_algorithm_name_fails() {
        let service = MatchingService::default();
        let err = service
            .match_by_name(&base_candidate(), &base_job(), "quantum")
            .unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_ALGORITHM");
    }

    #[test]
    fn invalid_record_is_malformed() {
        let service = MatchingService::default();
        let mut candidate = base_candidate();
        candidate.id = String::new();
        let err = service
            .match_candidate_to_job(&candidate, &base_job(), AlgorithmKind::AiHybrid)
            .unwrap_err();
        assert!(matches!(err, MatchError::MalformedInput { record: "candidate", .. }));
    }

    #[test]
    fn scoring_is_repeatable() {
        let service = MatchingService::default();
        for algorithm in [
            AlgorithmKind::SkillBased,
            AlgorithmKind::ExperienceBased,
            AlgorithmKind::AiHybrid,
            AlgorithmKind::Comprehensive,
        ] {
            let first = service
                .match_candidate_to_job_at(&base_candidate(), &base_job(), algorithm, now())
                .unwrap();
            let second = service
                .match_candidate_to_job_at(&base_candidate(), &base_job(), algorithm, now())
                .unwrap();
            assert!(first.same_outcome(&second), "{algorithm}");
        }
    }
}
