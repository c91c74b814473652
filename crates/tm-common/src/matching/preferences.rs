use serde::{Deserialize, Serialize};

use super::{FactorResult, FitScore};
use crate::config::PreferenceScoring;
use crate::model::{Job, JobLocation, Preferences, RemotePreference, SalaryRange, same_text};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceDetails {
    pub employment_type_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_fit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_fit: Option<f64>,
}

/// Additive preference fit: employment type, salary and remote mode each add
/// their share; the sum is capped at 1.0.
pub fn match_preferences(
    preferences: Option<&Preferences>,
    job: &Job,
    config: &PreferenceScoring,
) -> FactorResult<PreferenceDetails> {
    let Some(preferences) = preferences else {
        return FactorResult::new(
            config.missing,
            PreferenceDetails::default(),
            vec!["No preferences specified".to_string()],
        );
    };

    let mut score = 0.0;
    let mut reasons = Vec::new();
    let mut details = PreferenceDetails::default();

    if let Some(employment) = job.employment_type.as_deref() {
        if preferences
            .job_types
            .iter()
            .any(|wanted| same_text(wanted, employment))
        {
            score += config.employment_type_points;
            details.employment_type_match = true;
            reasons.push("Employment type matches preferences".to_string());
        }
    }

    if preferences.salary_expectation.is_some() {
        let fit = salary_fit(
            preferences.salary_expectation.as_ref(),
            job.salary.as_ref(),
            config,
        );
        score += fit.score * config.salary_points;
        details.salary_fit = Some(fit.score);
        reasons.extend(fit.reasons);
    }

    if let Some(remote) = preferences.remote_preference {
        let fit = remote_fit(remote, &job.location, config);
        score += fit.score * config.remote_points;
        details.remote_fit = Some(fit.score);
        reasons.extend(fit.reasons);
    }

    FactorResult::new(score.min(1.0), details, reasons)
}

/// Compares the midpoint of the job's range with the midpoint of the
/// candidate's expectation.
pub fn salary_fit(
    expectation: Option<&SalaryRange>,
    offered: Option<&SalaryRange>,
    config: &PreferenceScoring,
) -> FitScore {
    let Some(expectation) = expectation else {
        return FitScore::new(config.salary_unspecified, "No salary expectations specified");
    };
    let Some(offered) = offered else {
        return FitScore::new(config.salary_currency_mismatch, "Job salary not disclosed");
    };
    if !same_text(&expectation.currency, &offered.currency) {
        return FitScore::new(
            config.salary_currency_mismatch,
            "Currency mismatch - conversion needed",
        );
    }

    let expected_mid = expectation.midpoint();
    let ratio = if expected_mid <= 0.0 {
        f64::INFINITY
    } else {
        offered.midpoint() / expected_mid
    };

    let outcome = config
        .salary_bands
        .iter()
        .find(|(minimum, _)| ratio >= *minimum)
        .map(|(_, outcome)| outcome)
        .unwrap_or(&config.salary_below_bands);
    outcome.into()
}

pub fn remote_fit(
    preference: RemotePreference,
    job: &JobLocation,
    config: &PreferenceScoring,
) -> FitScore {
    let rules = &config.remote;
    let outcome = match preference {
        RemotePreference::Only if job.remote => &rules.remote_matched,
        RemotePreference::Only => &rules.remote_required,
        RemotePreference::Hybrid if job.remote || job.hybrid => &rules.hybrid_available,
        RemotePreference::Onsite if !job.remote => &rules.onsite_matched,
        RemotePreference::Flexible => &rules.flexible,
        RemotePreference::Hybrid | RemotePreference::Onsite | RemotePreference::Other => {
            &rules.mismatch
        }
    };
    outcome.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleOutcome;

    fn salary(min: f64, max: f64, currency: &str) -> SalaryRange {
        SalaryRange {
            min,
            max,
            currency: currency.into(),
        }
    }

    fn base_job() -> Job {
        Job {
            id: "j".into(),
            employment_type: Some("full-time".into()),
            salary: Some(salary(90_000.0, 110_000.0, "USD")),
            location: JobLocation {
                remote: true,
                ..JobLocation::default()
            },
            ..Job::default()
        }
    }

    #[test]
    fn salary_bands_follow_ratio() {
        let config = PreferenceScoring::default();
        let offered = salary(100_000.0, 100_000.0, "USD");

        let cases = [
            (90_000.0, 1.0, "Salary exceeds expectations"),
            (105_000.0, 0.9, "Salary meets expectations"),
            (120_000.0, 0.7, "Salary slightly below expectations"),
            (150_000.0, 0.4, "Salary significantly below expectations"),
        ];
        for (expected_mid, score, reason) in cases {
            let expectation = salary(expected_mid, expected_mid, "usd");
            let fit = salary_fit(Some(&expectation), Some(&offered), &config);
            assert_eq!(fit.score, score, "expectation {expected_mid}");
            assert_eq!(fit.reasons, vec![reason]);
        }
    }

    #[test]
    fn salary_edge_cases() {
        let config = PreferenceScoring::default();
        let usd = salary(50_000.0, 60_000.0, "USD");
        let eur = salary(50_000.0, 60_000.0, "EUR");

        assert_eq!(salary_fit(None, Some(&usd), &config).score, 0.7);
        assert_eq!(salary_fit(Some(&usd), Some(&eur), &config).score, 0.5);
        assert_eq!(salary_fit(Some(&usd), None, &config).score, 0.5);

        let zero = salary(0.0, 0.0, "USD");
        assert_eq!(salary_fit(Some(&zero), Some(&usd), &config).score, 1.0);
    }

    #[test]
    fn remote_rule_table() {
        let remote = JobLocation {
            remote: true,
            ..JobLocation::default()
        };
        let hybrid = JobLocation {
            hybrid: true,
            ..JobLocation::default()
        };
        let onsite = JobLocation::default();
        let config = PreferenceScoring::default();
        let fit = |preference, job: &JobLocation| remote_fit(preference, job, &config).score;

        assert_eq!(fit(RemotePreference::Only, &remote), 1.0);
        assert_eq!(fit(RemotePreference::Only, &onsite), 0.1);
        assert_eq!(fit(RemotePreference::Hybrid, &hybrid), 0.9);
        assert_eq!(fit(RemotePreference::Hybrid, &onsite), 0.5);
        assert_eq!(fit(RemotePreference::Onsite, &onsite), 1.0);
        assert_eq!(fit(RemotePreference::Onsite, &remote), 0.5);
        assert_eq!(fit(RemotePreference::Flexible, &remote), 0.8);
        assert_eq!(fit(RemotePreference::Other, &remote), 0.5);
        assert_eq!(
            remote_fit(RemotePreference::Other, &onsite, &config).reasons,
            vec!["Work arrangement differs from preference"]
        );
    }

    #[test]
    fn remote_and_salary_tables_are_configurable() {
        let mut config = PreferenceScoring::default();
        config.remote.flexible = RuleOutcome::new(0.6, "Open to any arrangement");
        config.salary_bands[0].1 = RuleOutcome::new(0.95, "Pays above the ask");

        let fit = remote_fit(RemotePreference::Flexible, &JobLocation::default(), &config);
        assert_eq!(fit.score, 0.6);
        assert_eq!(fit.reasons, vec!["Open to any arrangement"]);

        let expectation = salary(50_000.0, 50_000.0, "USD");
        let offered = salary(80_000.0, 80_000.0, "USD");
        let fit = salary_fit(Some(&expectation), Some(&offered), &config);
        assert_eq!(fit.score, 0.95);
        assert_eq!(fit.reasons, vec!["Pays above the ask"]);
    }

    #[test]
    fn all_preferences_matched_caps_at_one() {
        let prefs = Preferences {
            job_types: vec!["Full-Time".into()],
            salary_expectation: Some(salary(80_000.0, 90_000.0, "USD")),
            remote_preference: Some(RemotePreference::Only),
            ..Preferences::default()
        };
        let result = match_preferences(Some(&prefs), &base_job(), &PreferenceScoring::default());

        // 0.3 + 0.4 * 1.0 + 0.3 * 1.0
        assert!((result.score - 1.0).abs() < 1e-9);
        assert!(result.details.employment_type_match);
        assert_eq!(result.reasons.len(), 3);
    }

    #[test]
    fn partial_preferences_add_up() {
        let prefs = Preferences {
            job_types: vec!["contract".into()],
            remote_preference: Some(RemotePreference::Flexible),
            ..Preferences::default()
        };
        let result = match_preferences(Some(&prefs), &base_job(), &PreferenceScoring::default());
        assert!((result.score - 0.24).abs() < 1e-9);
        assert_eq!(result.details.salary_fit, None);
    }

    #[test]
    fn missing_preferences_are_neutral() {
        let result = match_preferences(None, &base_job(), &PreferenceScoring::default());
        assert_eq!(result.score, 0.5);
        assert_eq!(result.reasons, vec!["No preferences specified"]);
    }
}
