use serde::{Deserialize, Serialize};

use super::{FactorResult, reasons::location_reasons};
use crate::config::LocationScoring;
use crate::model::{CandidateLocation, Coordinates, JobLocation, same_text};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetails {
    /// Estimated commute distance; `None` for remote roles or unknown locations.
    pub distance_km: Option<f64>,
    pub remote_compatible: bool,
    pub timezone_compatible: bool,
    pub same_city: bool,
    pub same_country: bool,
    pub willing_to_relocate: bool,
}

/// remote roles are judged on timezone overlap, onsite roles on
/// city / country proximity and relocation willingness.
pub fn match_location(
    candidate: Option<&CandidateLocation>,
    job: &JobLocation,
    config: &LocationScoring,
) -> FactorResult<LocationDetails> {
    let Some(candidate) = candidate else {
        let details = LocationDetails::default();
        let reasons = location_reasons(&details, job.remote, false);
        return FactorResult::new(config.unknown, details, reasons);
    };

    let same_city = same_place(&candidate.city, &job.city);
    let same_country = same_place(&candidate.country, &job.country);
    let timezone_compatible = is_timezone_compatible(&candidate.country, &job.country, config);

    let mut details = LocationDetails {
        distance_km: None,
        remote_compatible: job.remote,
        timezone_compatible,
        same_city,
        same_country,
        willing_to_relocate: candidate.willing_to_relocate,
    };

    let score = if job.remote {
        if timezone_compatible {
            1.0
        } else {
            1.0 - config.timezone_penalty
        }
    } else if same_city && same_country {
        details.distance_km = Some(0.0);
        config.same_city
    } else if same_country {
        let distance = estimate_distance_km(candidate, job, config);
        details.distance_km = Some(distance);
        if distance < config.nearby_km {
            config.nearby_same_country
        } else {
            config.same_country
        }
    } else {
        details.distance_km = Some(estimate_distance_km(candidate, job, config));
        if candidate.willing_to_relocate {
            config.relocate
        } else {
            config.no_relocate
        }
    };

    let reasons = location_reasons(&details, job.remote, true);
    FactorResult::new(score, details, reasons)
}

/// True when any pair of the two countries' UTC offsets lies within tolerance.
pub fn is_timezone_compatible(
    candidate_country: &str,
    job_country: &str,
    config: &LocationScoring,
) -> bool {
    let candidate_offsets = config.offsets_for(candidate_country);
    let job_offsets = config.offsets_for(job_country);

    candidate_offsets.iter().any(|c| {
        job_offsets
            .iter()
            .any(|j| (c - j).abs() <= config.timezone_tolerance_hours)
    })
}

/// Haversine distance when both sides carry coordinates, otherwise a coarse
/// same-city / same-country / cross-border estimate.
pub fn estimate_distance_km(
    candidate: &CandidateLocation,
    job: &JobLocation,
    config: &LocationScoring,
) -> f64 {
    match (candidate.coordinates, job.coordinates) {
        (Some(a), Some(b)) => haversine_km(a, b, config.earth_radius_km),
        _ if !same_place(&candidate.country, &job.country) => config.cross_border_km,
        _ if !same_place(&candidate.city, &job.city) => config.same_country_km,
        _ => 0.0,
    }
}

pub fn haversine_km(a: Coordinates, b: Coordinates, radius_km: f64) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    radius_km * c
}

fn same_place(a: &str, b: &str) -> bool {
    !a.trim().is_empty() && same_text(a, b)
}
