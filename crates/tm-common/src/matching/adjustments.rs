use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use tracing::debug;

use crate::config::AdjustmentScoring;
use crate::model::{Candidate, Job, same_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdjustmentKind {
    CareerProgression,
    IndustrySwitch,
    #[serde(rename = "overqualification")]
    #[strum(serialize = "overqualification")]
    Overqualified,
    #[serde(rename = "underqualification")]
    #[strum(serialize = "underqualification")]
    Underqualified,
    RecentActivity,
    PerfectSkills,
}

impl AdjustmentKind {
    pub fn reason(self) -> &'static str {
        match self {
            AdjustmentKind::CareerProgression => "Position represents natural career progression",
            AdjustmentKind::IndustrySwitch => "Industry change may require adaptation",
            AdjustmentKind::Overqualified => "Candidate may be overqualified",
            AdjustmentKind::Underqualified => "Candidate lacks required qualifications",
            AdjustmentKind::RecentActivity => "Candidate recently active in job search",
            AdjustmentKind::PerfectSkills => "Exceptional skill match",
        }
    }

    fn points(self, config: &AdjustmentScoring) -> i32 {
        match self {
            AdjustmentKind::CareerProgression => config.career_progression,
            AdjustmentKind::IndustrySwitch => config.industry_switch,
            AdjustmentKind::Overqualified => config.overqualified,
            AdjustmentKind::Underqualified => config.underqualified,
            AdjustmentKind::RecentActivity => config.recent_activity,
            AdjustmentKind::PerfectSkills => config.perfect_skills,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    pub value: i32,
    pub reason: String,
}

impl Adjustment {
    fn new(kind: AdjustmentKind, config: &AdjustmentScoring) -> Self {
        Self {
            kind,
            value: kind.points(config),
            reason: kind.reason().to_string(),
        }
    }
}

/// Applied adjustments and their clamped total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentSummary {
    pub total: i32,
    pub adjustments: Vec<Adjustment>,
}

/// Where the job sits relative to the candidate's career so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerFit {
    /// 1 (entry) ..= 4 (executive), inferred from total years of experience.
    pub candidate_level: i32,
    pub job_level: i32,
    pub is_career_progression: bool,
    pub is_industry_switch: bool,
    pub is_overqualified: bool,
    pub is_underqualified: bool,
    pub is_recently_active: bool,
}

pub fn infer_career_level(total_years: f64, config: &AdjustmentScoring) -> i32 {
    let below = config
        .career_level_years
        .iter()
        .position(|threshold| total_years < *threshold);
    match below {
        Some(index) => index as i32 + 1,
        None => config.career_level_years.len() as i32 + 1,
    }
}

pub fn assess_career_fit(
    candidate: &Candidate,
    job: &Job,
    now: DateTime<Utc>,
    config: &AdjustmentScoring,
) -> CareerFit {
    let candidate_level = infer_career_level(candidate.total_experience_years(), config);
    let job_level = config.job_levels.get(job.experience_level);

    let job_industry = job.industry();
    let mut industries = candidate.industries().peekable();
    let is_industry_switch = industries.peek().is_some()
        && !industries.any(|held| {
            job_industry.is_some_and(|wanted| same_text(held, wanted))
        });

    let is_recently_active = candidate.last_active.is_some_and(|seen| {
        // a window reaching past the representable range covers every timestamp
        Duration::try_days(config.recent_activity_days)
            .and_then(|window| now.checked_sub_signed(window))
            .is_none_or(|cutoff| seen > cutoff)
    });

    CareerFit {
        candidate_level,
        job_level,
        is_career_progression: job_level == candidate_level + 1,
        is_industry_switch,
        is_overqualified: candidate_level > job_level + 1,
        is_underqualified: candidate_level < job_level - 1,
        is_recently_active,
    }
}

/// Heuristic point deltas on the 0..=100 scale. The total is clamped to
/// `[-cap, cap]`; the individual entries are reported unclamped.
pub fn apply_adjustments(
    fit: &CareerFit,
    skill_score: f64,
    config: &AdjustmentScoring,
) -> AdjustmentSummary {
    let rules = [
        (fit.is_career_progression, AdjustmentKind::CareerProgression),
        (fit.is_industry_switch, AdjustmentKind::IndustrySwitch),
        (fit.is_overqualified, AdjustmentKind::Overqualified),
        (fit.is_underqualified, AdjustmentKind::Underqualified),
        (fit.is_recently_active, AdjustmentKind::RecentActivity),
        (
            skill_score > config.perfect_skill_threshold,
            AdjustmentKind::PerfectSkills,
        ),
    ];

    let adjustments: Vec<Adjustment> = rules
        .into_iter()
        .filter(|(applies, _)| *applies)
        .map(|(_, kind)| Adjustment::new(kind, config))
        .collect();

    let raw = adjustments
        .iter()
        .fold(0i32, |sum, a| sum.saturating_add(a.value));
    let cap = config.cap.saturating_abs();
    let total = raw.clamp(-cap, cap);
    if raw != total {
        debug!(raw, total, "adjustment total clamped");
    }

    AdjustmentSummary { total, adjustments }
}
