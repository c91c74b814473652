use chrono::{DateTime, Utc};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use strum::{AsRefStr, EnumString};

use crate::error::MatchError;

/// Proficiency ladder shared by candidate skills and job requirements.
/// Declaration order is the ranking order.
///
/// Record fields decode it leniently: any casing is accepted and an
/// unrecognised label reads as "no level", so the matcher defaults apply.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub fn rank(self) -> i32 {
        match self {
            SkillLevel::Beginner => 1,
            SkillLevel::Intermediate => 2,
            SkillLevel::Advanced => 3,
            SkillLevel::Expert => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExperienceLevel {
    #[serde(alias = "Entry", alias = "ENTRY")]
    Entry,
    #[serde(alias = "Mid", alias = "MID")]
    Mid,
    #[serde(alias = "Senior", alias = "SENIOR")]
    Senior,
    #[serde(alias = "Executive", alias = "EXECUTIVE")]
    Executive,
}

/// Work arrangement a candidate asks for. Labels are matched without regard
/// to case; anything unrecognised becomes [`RemotePreference::Other`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RemotePreference {
    Only,
    Hybrid,
    Onsite,
    Flexible,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

impl SalaryRange {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSkill {
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_skill_level",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<SkillLevel>,
    #[serde(default)]
    pub years_experience: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Months in the role; fractional values are kept as-is.
    #[serde(default)]
    pub duration_months: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default)]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateLocation {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub willing_to_relocate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub job_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_expectation: Option<SalaryRange>,
    #[serde(
        default,
        deserialize_with = "lenient_remote_preference",
        skip_serializing_if = "Option::is_none"
    )]
    pub remote_preference: Option<RemotePreference>,
    /// Free-form notice period ("immediate", "2weeks", "1month", "3months", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_sizes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industries: Option<Vec<String>>,
}

/// Candidate snapshot handed to the engine. Never mutated while scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub skills: Vec<CandidateSkill>,
    #[serde(default)]
    pub experience: Vec<Position>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<CandidateLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn total_experience_years(&self) -> f64 {
        total_years(&self.experience)
    }

    /// Industries of past positions, blanks dropped.
    pub fn industries(&self) -> impl Iterator<Item = &str> {
        self.experience
            .iter()
            .filter_map(|p| p.industry.as_deref())
            .filter(|i| !i.trim().is_empty())
    }

    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.iter().any(|s| same_text(&s.name, name))
    }

    /// Structural checks. Optional data is never an error here; the matchers
    /// fall back to neutral defaults for it.
    pub fn validate(&self) -> Result<(), MatchError> {
        const RECORD: &str = "candidate";
        if self.id.trim().is_empty() {
            return Err(MatchError::malformed(RECORD, "id is empty"));
        }
        if let Some(skill) = self
            .skills
            .iter()
            .find(|s| !s.years_experience.is_finite() || s.years_experience < 0.0)
        {
            return Err(MatchError::malformed(
                RECORD,
                format!("skill {} has invalid yearsExperience", skill.name),
            ));
        }
        if let Some(position) = self
            .experience
            .iter()
            .find(|p| !p.duration_months.is_finite() || p.duration_months < 0.0)
        {
            return Err(MatchError::malformed(
                RECORD,
                format!("position {} has invalid durationMonths", position.title),
            ));
        }
        if let Some(coords) = self.location.as_ref().and_then(|l| l.coordinates) {
            check_coordinates(RECORD, coords)?;
        }
        if let Some(salary) = self
            .preferences
            .as_ref()
            .and_then(|p| p.salary_expectation.as_ref())
        {
            check_salary(RECORD, "salaryExpectation", salary)?;
        }
        Ok(())
    }

    pub fn from_value(value: Value) -> Result<Self, MatchError> {
        decode_record("candidate", value)
    }

    pub fn from_json(raw: &str) -> Result<Self, MatchError> {
        decode_str("candidate", raw)
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub skill: String,
    #[serde(
        default,
        deserialize_with = "lenient_skill_level",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<SkillLevel>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub years_experience: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLocation {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub hybrid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

/// Job posting snapshot handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub location: JobLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<SalaryRange>,
    #[serde(default)]
    pub company: Company,
}

impl Job {
    pub fn required_skill_count(&self) -> usize {
        self.requirements.iter().filter(|r| r.required).count()
    }

    pub fn industry(&self) -> Option<&str> {
        self.company
            .industry
            .as_deref()
            .filter(|i| !i.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        const RECORD: &str = "job";
        if self.id.trim().is_empty() {
            return Err(MatchError::malformed(RECORD, "id is empty"));
        }
        if let Some(req) = self
            .requirements
            .iter()
            .find(|r| !r.years_experience.is_finite() || r.years_experience < 0.0)
        {
            return Err(MatchError::malformed(
                RECORD,
                format!("requirement {} has invalid yearsExperience", req.skill),
            ));
        }
        if let Some(coords) = self.location.coordinates {
            check_coordinates(RECORD, coords)?;
        }
        if let Some(salary) = &self.salary {
            check_salary(RECORD, "salary", salary)?;
        }
        Ok(())
    }

    pub fn from_value(value: Value) -> Result<Self, MatchError> {
        decode_record("job", value)
    }

    pub fn from_json(raw: &str) -> Result<Self, MatchError> {
        decode_str("job", raw)
    }
}

/// Which side of a pairing a record belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    Candidate,
    Job,
}

/// Records that can be reported by identity in batch error lists.
pub trait Identified {
    const KIND: RecordKind;

    fn record_id(&self) -> &str;
}

impl Identified for Candidate {
    const KIND: RecordKind = RecordKind::Candidate;

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Identified for Job {
    const KIND: RecordKind = RecordKind::Job;

    fn record_id(&self) -> &str {
        &self.id
    }
}

pub(crate) fn total_years(positions: &[Position]) -> f64 {
    positions
        .iter()
        .map(|p| p.duration_months)
        .sum::<f64>()
        / 12.0
}

/// Case-insensitive comparison of free-text labels (skill names, industries),
/// ignoring surrounding whitespace. Uses full Unicode lowercasing.
pub fn same_text(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// `None` when the field holds no string; `Some(None)` when the label is unknown.
fn lenient_label<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .map(|label| label.trim().parse().ok()))
}

fn lenient_skill_level<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SkillLevel>, D::Error> {
    Ok(lenient_label(deserializer)?.flatten())
}

fn lenient_remote_preference<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RemotePreference>, D::Error> {
    Ok(lenient_label(deserializer)?.map(|parsed| parsed.unwrap_or(RemotePreference::Other)))
}

/// Best-effort id of a raw record, used when the record itself fails to decode.
pub fn raw_record_id(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_record<T: DeserializeOwned>(record: &'static str, value: Value) -> Result<T, MatchError> {
    let value = normalize_id(value);
    serde_json::from_value(value).map_err(|err| MatchError::malformed(record, err.to_string()))
}

fn decode_str<T: DeserializeOwned>(record: &'static str, raw: &str) -> Result<T, MatchError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| MatchError::malformed(record, err.to_string()))?;
    decode_record(record, value)
}

// Upstream stores hand out numeric ids as often as string ids.
fn normalize_id(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        if let Some(Value::Number(n)) = obj.get("id") {
            let id = n.to_string();
            obj.insert("id".into(), Value::String(id));
        }
    }
    value
}

fn check_coordinates(record: &'static str, coords: Coordinates) -> Result<(), MatchError> {
    let valid = coords.lat.is_finite()
        && coords.lon.is_finite()
        && (-90.0..=90.0).contains(&coords.lat)
        && (-180.0..=180.0).contains(&coords.lon);
    if valid {
        Ok(())
    } else {
        Err(MatchError::malformed(
            record,
            format!("coordinates out of range: ({}, {})", coords.lat, coords.lon),
        ))
    }
}

fn check_salary(
    record: &'static str,
    field: &str,
    salary: &SalaryRange,
) -> Result<(), MatchError> {
    if salary.min.is_finite() && salary.max.is_finite() {
        Ok(())
    } else {
        Err(MatchError::malformed(record, format!("{field} is not finite")))
    }
}
