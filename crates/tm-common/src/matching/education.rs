use serde::{Deserialize, Serialize};

use super::{FactorResult, reasons::education_reasons};
use crate::config::EducationScoring;
use crate::model::{Education, Requirement};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationDetails {
    pub records: usize,
    /// Education fields that overlap a requirement skill name.
    pub relevant_fields: Vec<String>,
}

/// A field is relevant when it and a requirement's skill name contain one
/// another (case-insensitive).
pub fn match_education(
    education: &[Education],
    requirements: &[Requirement],
    config: &EducationScoring,
) -> FactorResult<EducationDetails> {
    if education.is_empty() {
        return FactorResult::new(
            config.missing,
            EducationDetails::default(),
            education_reasons(false, false),
        );
    }

    let relevant_fields: Vec<String> = education
        .iter()
        .filter(|record| {
            let field = record.field.trim().to_lowercase();
            !field.is_empty()
                && requirements.iter().any(|req| {
                    let skill = req.skill.trim().to_lowercase();
                    !skill.is_empty() && (skill.contains(&field) || field.contains(&skill))
                })
        })
        .map(|record| record.field.clone())
        .collect();

    let relevant = !relevant_fields.is_empty();
    let score = if relevant {
        config.relevant
    } else {
        config.general
    };
    let details = EducationDetails {
        records: education.len(),
        relevant_fields,
    };

    FactorResult::new(score, details, education_reasons(true, relevant))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(skill: &str) -> Requirement {
        Requirement {
            skill: skill.into(),
            required: true,
            ..Requirement::default()
        }
    }

    fn education(field: &str) -> Education {
        Education {
            field: field.into(),
            degree: Some("BSc".into()),
        }
    }

    #[test]
    fn substring_match_either_direction() {
        let config = EducationScoring::default();
        let reqs = [requirement("Machine Learning"), requirement("Python")];

        let forward = match_education(&[education("learning")], &reqs, &config);
        assert_eq!(forward.score, 0.8);
        assert_eq!(forward.reasons, vec!["Relevant educational background"]);

        let backward = match_education(&[education("Python Programming")], &reqs, &config);
        assert_eq!(backward.score, 0.8);
        assert_eq!(backward.details.relevant_fields, vec!["Python Programming"]);
    }

    #[test]
    fn unrelated_field_is_general() {
        let result = match_education(
            &[education("History")],
            &[requirement("Rust")],
            &EducationScoring::default(),
        );
        assert_eq!(result.score, 0.6);
        assert_eq!(result.reasons, vec!["General educational background"]);
    }

    #[test]
    fn blank_field_never_matches() {
        let result = match_education(&[education("")], &[requirement("Rust")], &EducationScoring::default());
        assert_eq!(result.score, 0.6);
    }

    #[test]
    fn no_records_is_neutral() {
        let result = match_education(&[], &[requirement("Rust")], &EducationScoring::default());
        assert_eq!(result.score, 0.5);
        assert_eq!(result.details.records, 0);
    }
}
