//! Tunable tables and point values for the matching engine.
//!
//! Everything the matchers treat as a constant lives here so callers (and tests)
//! can swap individual values without touching the scoring code.

use std::collections::HashMap;

use crate::matching::weights::FactorWeights;
use crate::model::{ExperienceLevel, SkillLevel};

/// Upper bound for `TM_RECENT_ACTIVITY_DAYS`.
pub const MAX_RECENT_ACTIVITY_DAYS: i64 = 36_500;
/// Adjustments move a 0..=100 score, so a larger cap has no effect.
pub const MAX_ADJUSTMENT_CAP: i32 = 100;

/// Score a rule yields together with the reason reported for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub score: f64,
    pub reason: String,
}

impl RuleOutcome {
    pub fn new(score: f64, reason: &str) -> Self {
        Self {
            score,
            reason: reason.to_string(),
        }
    }
}

/// Value per job experience level with a fallback for postings that omit it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelTable<T> {
    pub entry: T,
    pub mid: T,
    pub senior: T,
    pub executive: T,
    pub fallback: T,
}

impl<T: Copy> LevelTable<T> {
    pub fn get(&self, level: Option<ExperienceLevel>) -> T {
        match level {
            Some(ExperienceLevel::Entry) => self.entry,
            Some(ExperienceLevel::Mid) => self.mid,
            Some(ExperienceLevel::Senior) => self.senior,
            Some(ExperienceLevel::Executive) => self.executive,
            None => self.fallback,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkillScoring {
    pub required_weight: f64,
    pub optional_weight: f64,
    pub level_at_or_above: f64,
    pub level_one_below: f64,
    pub level_further_below: f64,
    pub default_candidate_level: SkillLevel,
    pub default_required_level: SkillLevel,
    /// (minimum years ratio, score), checked top-down.
    pub experience_bands: Vec<(f64, f64)>,
    pub experience_floor: f64,
    /// Matched skills scoring below this are reported as gaps.
    pub gap_threshold: f64,
}

impl Default for SkillScoring {
    fn default() -> Self {
        Self {
            required_weight: 2.0,
            optional_weight: 1.0,
            level_at_or_above: 1.0,
            level_one_below: 0.7,
            level_further_below: 0.3,
            default_candidate_level: SkillLevel::Beginner,
            default_required_level: SkillLevel::Intermediate,
            experience_bands: vec![(1.0, 1.0), (0.8, 0.9), (0.6, 0.7), (0.4, 0.5)],
            experience_floor: 0.3,
            gap_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExperienceScoring {
    pub required_years: LevelTable<f64>,
    pub relevance_threshold: f64,
    pub years_weight: f64,
    pub industry_weight: f64,
    pub role_weight: f64,
    pub total_weight: f64,
    /// Industry component credit when no position matches the job's industry.
    pub industry_miss_credit: f64,
    /// Total years are compared against `required_years * total_years_stretch`.
    pub total_years_stretch: f64,
}

impl Default for ExperienceScoring {
    fn default() -> Self {
        Self {
            required_years: LevelTable {
                entry: 1.0,
                mid: 3.0,
                senior: 7.0,
                executive: 12.0,
                fallback: 3.0,
            },
            relevance_threshold: 0.3,
            years_weight: 0.4,
            industry_weight: 0.25,
            role_weight: 0.25,
            total_weight: 0.1,
            industry_miss_credit: 0.5,
            total_years_stretch: 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationScoring {
    /// Lowercased country name -> UTC offsets (hours) observed in that country.
    pub timezone_offsets: HashMap<String, Vec<f64>>,
    pub fallback_offsets: Vec<f64>,
    pub timezone_tolerance_hours: f64,
    pub timezone_penalty: f64,
    pub same_city: f64,
    pub same_country: f64,
    pub nearby_same_country: f64,
    pub nearby_km: f64,
    pub relocate: f64,
    pub no_relocate: f64,
    pub unknown: f64,
    pub same_country_km: f64,
    pub cross_border_km: f64,
    pub earth_radius_km: f64,
}

impl Default for LocationScoring {
    fn default() -> Self {
        let table: &[(&str, &[f64])] = &[
            ("us", &[-8.0, -7.0, -6.0, -5.0]),
            ("usa", &[-8.0, -7.0, -6.0, -5.0]),
            ("united states", &[-8.0, -7.0, -6.0, -5.0]),
            ("uk", &[0.0]),
            ("united kingdom", &[0.0]),
            ("germany", &[1.0]),
            ("japan", &[9.0]),
            ("australia", &[10.0]),
            ("india", &[5.5]),
            ("singapore", &[8.0]),
            ("china", &[8.0]),
        ];

        Self {
            timezone_offsets: table
                .iter()
                .map(|(country, offsets)| (country.to_string(), offsets.to_vec()))
                .collect(),
            fallback_offsets: vec![0.0],
            timezone_tolerance_hours: 5.0,
            timezone_penalty: 0.2,
            same_city: 1.0,
            same_country: 0.7,
            nearby_same_country: 0.8,
            nearby_km: 100.0,
            relocate: 0.4,
            no_relocate: 0.1,
            unknown: 0.5,
            same_country_km: 200.0,
            cross_border_km: 1000.0,
            earth_radius_km: 6371.0,
        }
    }
}

impl LocationScoring {
    pub fn offsets_for(&self, country: &str) -> &[f64] {
        self.timezone_offsets
            .get(&country.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&self.fallback_offsets)
    }
}

#[derive(Debug, Clone)]
pub struct EducationScoring {
    pub relevant: f64,
    pub general: f64,
    pub missing: f64,
}

impl Default for EducationScoring {
    fn default() -> Self {
        Self {
            relevant: 0.8,
            general: 0.6,
            missing: 0.5,
        }
    }
}

/// Outcome per combination of remote preference and job arrangement.
#[derive(Debug, Clone)]
pub struct RemoteRules {
    /// `only`, job is remote.
    pub remote_matched: RuleOutcome,
    /// `only`, job is not remote.
    pub remote_required: RuleOutcome,
    /// `hybrid`, job is remote or hybrid.
    pub hybrid_available: RuleOutcome,
    /// `onsite`, job is not remote.
    pub onsite_matched: RuleOutcome,
    pub flexible: RuleOutcome,
    /// Every other pairing, unrecognised preferences included.
    pub mismatch: RuleOutcome,
}

impl Default for RemoteRules {
    fn default() -> Self {
        Self {
            remote_matched: RuleOutcome::new(1.0, "Remote work preference perfectly matched"),
            remote_required: RuleOutcome::new(0.1, "Remote work required but job is onsite"),
            hybrid_available: RuleOutcome::new(0.9, "Hybrid work arrangement available"),
            onsite_matched: RuleOutcome::new(1.0, "Onsite work preference matched"),
            flexible: RuleOutcome::new(0.8, "Flexible work arrangement acceptable"),
            mismatch: RuleOutcome::new(0.5, "Work arrangement differs from preference"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceScoring {
    pub employment_type_points: f64,
    pub salary_points: f64,
    pub remote_points: f64,
    pub missing: f64,
    /// Salary fit when the candidate has no expectation at all.
    pub salary_unspecified: f64,
    pub salary_currency_mismatch: f64,
    /// (minimum jobMid/expectationMid ratio, outcome), checked top-down.
    pub salary_bands: Vec<(f64, RuleOutcome)>,
    /// Outcome when the ratio is below every band.
    pub salary_below_bands: RuleOutcome,
    pub remote: RemoteRules,
}

impl Default for PreferenceScoring {
    fn default() -> Self {
        Self {
            employment_type_points: 0.3,
            salary_points: 0.4,
            remote_points: 0.3,
            missing: 0.5,
            salary_unspecified: 0.7,
            salary_currency_mismatch: 0.5,
            salary_bands: vec![
                (1.1, RuleOutcome::new(1.0, "Salary exceeds expectations")),
                (0.9, RuleOutcome::new(0.9, "Salary meets expectations")),
                (0.8, RuleOutcome::new(0.7, "Salary slightly below expectations")),
            ],
            salary_below_bands: RuleOutcome::new(0.4, "Salary significantly below expectations"),
            remote: RemoteRules::default(),
        }
    }
}

/// Additive weight deltas applied by the dynamic weight policy.
#[derive(Debug, Clone)]
pub struct WeightScoring {
    pub base: FactorWeights,
    pub entry_delta: FactorWeights,
    pub senior_delta: FactorWeights,
    pub remote_location_cut: f64,
    pub remote_location_floor: f64,
    pub remote_delta: FactorWeights,
    /// Jobs with more required skills than this get `skill_heavy_delta`.
    pub skill_heavy_threshold: usize,
    pub skill_heavy_delta: FactorWeights,
}

impl Default for WeightScoring {
    fn default() -> Self {
        Self {
            base: FactorWeights {
                skills: 0.35,
                experience: 0.30,
                location: 0.15,
                education: 0.10,
                preferences: 0.10,
            },
            entry_delta: FactorWeights {
                skills: 0.10,
                experience: -0.10,
                education: 0.05,
                ..FactorWeights::ZERO
            },
            senior_delta: FactorWeights {
                skills: -0.05,
                experience: 0.15,
                location: -0.05,
                education: -0.05,
                ..FactorWeights::ZERO
            },
            remote_location_cut: 0.10,
            remote_location_floor: 0.05,
            remote_delta: FactorWeights {
                skills: 0.05,
                experience: 0.05,
                ..FactorWeights::ZERO
            },
            skill_heavy_threshold: 8,
            skill_heavy_delta: FactorWeights {
                skills: 0.10,
                experience: -0.05,
                preferences: -0.05,
                ..FactorWeights::ZERO
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdjustmentScoring {
    /// Total-years thresholds separating career levels 1|2|3|4.
    pub career_level_years: [f64; 3],
    pub job_levels: LevelTable<i32>,
    pub career_progression: i32,
    pub industry_switch: i32,
    pub overqualified: i32,
    pub underqualified: i32,
    pub recent_activity: i32,
    pub perfect_skills: i32,
    /// Summed adjustments are clamped to `[-cap, cap]`.
    pub cap: i32,
    pub recent_activity_days: i64,
    pub perfect_skill_threshold: f64,
}

impl Default for AdjustmentScoring {
    fn default() -> Self {
        Self {
            career_level_years: [2.0, 5.0, 10.0],
            job_levels: LevelTable {
                entry: 1,
                mid: 2,
                senior: 3,
                executive: 4,
                fallback: 2,
            },
            career_progression: 5,
            industry_switch: -3,
            overqualified: -8,
            underqualified: -12,
            recent_activity: 2,
            perfect_skills: 5,
            cap: 15,
            recent_activity_days: 30,
            perfect_skill_threshold: 0.95,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfidenceScoring {
    pub very_high_score: u8,
    pub very_high_factors: usize,
    pub high_score: u8,
    pub high_factors: usize,
    pub medium_score: u8,
    pub low_score: u8,
}

impl Default for ConfidenceScoring {
    fn default() -> Self {
        Self {
            very_high_score: 85,
            very_high_factors: 3,
            high_score: 75,
            high_factors: 2,
            medium_score: 60,
            low_score: 40,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComprehensiveScoring {
    pub cultural_weight: f64,
    pub growth_weight: f64,
    pub salary_weight: f64,
    pub availability_weight: f64,
    pub cultural_base: f64,
    pub company_size_bonus: f64,
    pub industry_bonus: f64,
    pub growth_base: f64,
    pub progression_bonus: f64,
    pub learning_bonus: f64,
    /// Learning bonus applies when 1..=this many requirements are new skills.
    pub learning_max_new_skills: usize,
    /// (lowercased notice period, outcome).
    pub availability: Vec<(String, RuleOutcome)>,
    /// Notice periods missing from `availability`.
    pub availability_other: RuleOutcome,
    pub availability_unspecified: RuleOutcome,
}

impl Default for ComprehensiveScoring {
    fn default() -> Self {
        Self {
            cultural_weight: 0.10,
            growth_weight: 0.10,
            salary_weight: 0.05,
            availability_weight: 0.05,
            cultural_base: 0.7,
            company_size_bonus: 0.2,
            industry_bonus: 0.1,
            growth_base: 0.6,
            progression_bonus: 0.3,
            learning_bonus: 0.2,
            learning_max_new_skills: 3,
            availability: [
                ("immediate", 1.0, "Immediately available"),
                ("2weeks", 0.9, "Available with 2 weeks notice"),
                ("1month", 0.8, "Available with 1 month notice"),
                ("3months", 0.6, "Available with 3 months notice"),
            ]
            .into_iter()
            .map(|(label, score, reason)| (label.to_string(), RuleOutcome::new(score, reason)))
            .collect(),
            availability_other: RuleOutcome::new(0.7, "Availability to be discussed"),
            availability_unspecified: RuleOutcome::new(0.8, "Availability not specified"),
        }
    }
}

/// Every heuristic the engine applies, grouped per component.
#[derive(Debug, Clone, Default)]
pub struct ScoringConfig {
    pub skills: SkillScoring,
    pub experience: ExperienceScoring,
    pub location: LocationScoring,
    pub education: EducationScoring,
    pub preferences: PreferenceScoring,
    pub weights: WeightScoring,
    pub adjustments: AdjustmentScoring,
    pub confidence: ConfidenceScoring,
    pub comprehensive: ComprehensiveScoring,
}

impl ScoringConfig {
    /// Defaults with `TM_*` environment overrides.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse(&lookup, "TM_TIMEZONE_TOLERANCE_HOURS") {
            config.location.timezone_tolerance_hours = v;
        }
        if let Some(v) = parse(&lookup, "TM_RELEVANCE_THRESHOLD") {
            config.experience.relevance_threshold = v;
        }
        if let Some(v) = parse::<i64, _>(&lookup, "TM_RECENT_ACTIVITY_DAYS") {
            config.adjustments.recent_activity_days = v.clamp(0, MAX_RECENT_ACTIVITY_DAYS);
        }
        if let Some(v) = parse::<i32, _>(&lookup, "TM_ADJUSTMENT_CAP") {
            config.adjustments.cap = v.saturating_abs().min(MAX_ADJUSTMENT_CAP);
        }
        if let Some(v) = parse(&lookup, "TM_PERFECT_SKILL_THRESHOLD") {
            config.adjustments.perfect_skill_threshold = v;
        }

        config
    }
}

/// What a batch does when its deadline passes or its token is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancellationPolicy {
    /// Return the pairs scored so far and flag the result as cancelled.
    #[default]
    ReturnPartial,
    /// Fail the whole call with [`MatchError::Cancelled`](crate::MatchError::Cancelled).
    FailBatch,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Worker threads for batch scoring; `None` sizes the pool to available cores.
    pub worker_threads: Option<usize>,
    pub cancellation_policy: CancellationPolicy,
    pub default_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            cancellation_policy: CancellationPolicy::ReturnPartial,
            default_limit: 10,
        }
    }
}

impl BatchConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            worker_threads: parse::<usize, _>(&lookup, "TM_BATCH_WORKERS").filter(|n| *n > 0),
            cancellation_policy: match lookup("TM_BATCH_CANCEL_POLICY")
                .map(|raw| raw.to_ascii_lowercase())
                .as_deref()
            {
                Some("fail") | Some("fail_batch") => CancellationPolicy::FailBatch,
                _ => defaults.cancellation_policy,
            },
            default_limit: parse(&lookup, "TM_BATCH_DEFAULT_LIMIT").unwrap_or(defaults.default_limit),
        }
    }

    pub fn resolved_threads(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1);
        self.worker_threads.unwrap_or(cores).max(1)
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|raw| raw.trim().parse().ok())
}
