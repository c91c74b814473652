use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::match_response::MatchResult;
use crate::error::PairError;
use crate::matching::AlgorithmKind;
use crate::model::{Candidate, Job};

/// One ranked entry: the scored entity and its match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry<E> {
    pub entity: E,
    #[serde(rename = "match")]
    pub result: MatchResult,
}

/// Ranked output of scoring one subject against a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult<S, E> {
    pub subject: S,
    /// Sorted by score descending; ties keep input order.
    pub matches: Vec<RankedEntry<E>>,
    /// Size of the input pool, including failed and skipped records.
    pub total_count: usize,
    pub algorithm: AlgorithmKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub errors: Vec<PairError>,
    #[serde(default)]
    pub cancelled: bool,
    /// Pairs never scored because the batch was cancelled.
    #[serde(default)]
    pub skipped: usize,
}

/// Candidates ranked for one job.
pub type CandidateRanking = BatchResult<Job, Candidate>;
/// Jobs ranked for one candidate.
pub type JobRanking = BatchResult<Candidate, Job>;

impl<S, E> BatchResult<S, E> {
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatches {
    pub job: Job,
    pub matches: Vec<RankedEntry<Candidate>>,
    pub total_qualified: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub total_jobs: usize,
    pub jobs_with_matches: usize,
    pub total_candidates: usize,
    pub algorithm: AlgorithmKind,
    pub threshold: u8,
}

/// Qualified matches for every job that has at least one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMatchResult {
    pub results: Vec<JobMatches>,
    pub summary: BulkSummary,
    #[serde(default)]
    pub errors: Vec<PairError>,
    #[serde(default)]
    pub cancelled: bool,
    pub timestamp: DateTime<Utc>,
}
