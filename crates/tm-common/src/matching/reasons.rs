//! Templated reason and recommendation strings.
//!
//! The wording is part of the wire contract: downstream consumers match on
//! these strings, so keep them stable.

use super::experience::ExperienceDetails;
use super::location::LocationDetails;
use super::skills::{MissingSkill, SkillDetails};

const MISSING_SKILLS_LISTED: usize = 3;

pub fn skill_reasons(details: &SkillDetails, score: f64) -> Vec<String> {
    if details.total_required == 0 {
        return vec!["No skill requirements specified".to_string()];
    }

    let mut reasons = Vec::new();
    if details.total_matched > 0 {
        reasons.push(format!("{} required skills matched", details.total_matched));
    }
    if score > 0.8 {
        reasons.push("Excellent technical skill alignment".to_string());
    } else if score > 0.6 {
        reasons.push("Good technical skill match".to_string());
    }
    if details.total_missing > 0 {
        reasons.push(format!("{} skills need development", details.total_missing));
    }
    reasons
}

pub fn experience_reasons(details: &ExperienceDetails) -> Vec<String> {
    if details.total_positions == 0 {
        return vec!["No work experience listed".to_string()];
    }

    let mut reasons = Vec::new();
    if details.relevant_years >= details.required_years {
        reasons.push("Meets experience requirements".to_string());
    }
    if details.industry_match {
        reasons.push("Relevant industry experience".to_string());
    }
    if details.role_match > 0.7 {
        reasons.push("Strong role similarity".to_string());
    }
    if reasons.is_empty() {
        reasons.push(format!(
            "{:.1} of {} required years of relevant experience",
            details.relevant_years, details.required_years
        ));
    }
    reasons
}

/// `known` is false when the candidate has no location on file.
pub fn location_reasons(details: &LocationDetails, remote: bool, known: bool) -> Vec<String> {
    let reason = match (known, remote) {
        (false, _) => "No location information available",
        (true, true) if details.timezone_compatible => "Remote work compatible",
        (true, true) => "Timezone difference may affect collaboration",
        (true, false) if details.same_city && details.same_country => "Perfect location match",
        (true, false) if details.same_country => "Located in the same country",
        (true, false) if details.willing_to_relocate => "Willing to relocate",
        (true, false) => "Relocation required but not preferred",
    };
    vec![reason.to_string()]
}

pub fn education_reasons(has_records: bool, relevant: bool) -> Vec<String> {
    let reason = if !has_records {
        "No education information available"
    } else if relevant {
        "Relevant educational background"
    } else {
        "General educational background"
    };
    vec![reason.to_string()]
}

/// Factor scores as seen by the ai-hybrid summary, all on the `[0, 1]` scale.
#[derive(Debug, Clone, Copy)]
pub struct FactorSummary {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub remote_compatible: bool,
    pub education: f64,
}

pub fn combined_reasons(summary: &FactorSummary) -> Vec<String> {
    let mut reasons = Vec::new();
    if summary.skills > 0.8 {
        reasons.push("Exceptional skill alignment".to_string());
    }
    if summary.experience > 0.8 {
        reasons.push("Highly relevant experience".to_string());
    }
    if summary.location > 0.9 {
        reasons.push("Perfect location match".to_string());
    } else if summary.remote_compatible {
        reasons.push("Remote work compatible".to_string());
    }
    if summary.education > 0.8 {
        reasons.push("Relevant educational background".to_string());
    }
    reasons
}

pub fn comprehensive_factor_reasons(cultural: f64, growth: f64, salary: f64) -> Vec<String> {
    let mut reasons = Vec::new();
    if cultural > 0.8 {
        reasons.push("Strong cultural fit indicators".to_string());
    }
    if growth > 0.8 {
        reasons.push("Excellent career growth opportunity".to_string());
    }
    if salary > 0.9 {
        reasons.push("Salary expectations well matched".to_string());
    }
    reasons
}

/// Recommendation table for the single-factor algorithms.
pub fn basic_recommendations(score: u8) -> Vec<String> {
    let pair: [&str; 2] = match score {
        80.. => [
            "Highly recommended for interview",
            "Fast-track consideration suggested",
        ],
        60..=79 => ["Consider for interview", "Skills assessment recommended"],
        40..=59 => ["Potential with development", "Training program consideration"],
        _ => [
            "Not recommended for current role",
            "Consider for future opportunities",
        ],
    };
    pair.iter().map(|s| s.to_string()).collect()
}

/// Recommendation table for ai-hybrid and comprehensive; the middle band names
/// up to three missing skills.
pub fn advanced_recommendations(score: u8, missing: &[MissingSkill]) -> Vec<String> {
    match score {
        85.. => vec![
            "Priority candidate - schedule interview immediately".to_string(),
            "Consider expedited hiring process".to_string(),
        ],
        70..=84 => vec![
            "Strong candidate - proceed with standard interview".to_string(),
            "Technical assessment recommended".to_string(),
        ],
        50..=69 => {
            let mut recommendations =
                vec!["Potential candidate - additional screening needed".to_string()];
            if !missing.is_empty() {
                let names: Vec<&str> = missing
                    .iter()
                    .take(MISSING_SKILLS_LISTED)
                    .map(|m| m.skill.as_str())
                    .collect();
                recommendations.push(format!("Skills development needed: {}", names.join(", ")));
            }
            recommendations
        }
        _ => vec![
            "Does not meet current requirements".to_string(),
            "Consider for future roles or with additional training".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(names: &[&str]) -> Vec<MissingSkill> {
        names
            .iter()
            .map(|name| MissingSkill {
                skill: name.to_string(),
                level: None,
                required: true,
                weight: 2.0,
            })
            .collect()
    }

    #[test]
    fn basic_table_boundaries() {
        assert_eq!(basic_recommendations(80)[0], "Highly recommended for interview");
        assert_eq!(basic_recommendations(79)[0], "Consider for interview");
        assert_eq!(basic_recommendations(40)[1], "Training program consideration");
        assert_eq!(basic_recommendations(39)[0], "Not recommended for current role");
    }

    #[test]
    fn advanced_table_lists_first_three_missing_skills() {
        let recs = advanced_recommendations(55, &missing(&["Go", "Kafka", "K8s", "Terraform"]));
        assert_eq!(
            recs,
            vec![
                "Potential candidate - additional screening needed",
                "Skills development needed: Go, Kafka, K8s",
            ]
        );

        let none_missing = advanced_recommendations(50, &[]);
        assert_eq!(none_missing.len(), 1);

        assert_eq!(
            advanced_recommendations(85, &[])[0],
            "Priority candidate - schedule interview immediately"
        );
        assert_eq!(
            advanced_recommendations(49, &[])[0],
            "Does not meet current requirements"
        );
    }

    #[test]
    fn combined_prefers_perfect_location_over_remote() {
        let summary = FactorSummary {
            skills: 0.9,
            experience: 0.5,
            location: 1.0,
            remote_compatible: true,
            education: 0.8,
        };
        assert_eq!(
            combined_reasons(&summary),
            vec!["Exceptional skill alignment", "Perfect location match"]
        );

        let remote = FactorSummary {
            location: 0.8,
            ..summary
        };
        assert!(combined_reasons(&remote).contains(&"Remote work compatible".to_string()));
    }

    #[test]
    fn experience_reasons_never_empty_with_positions() {
        let details = ExperienceDetails {
            total_positions: 1,
            relevant_years: 0.5,
            required_years: 3.0,
            ..ExperienceDetails::default()
        };
        assert_eq!(
            experience_reasons(&details),
            vec!["0.5 of 3 required years of relevant experience"]
        );
    }
}
