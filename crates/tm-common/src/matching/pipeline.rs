use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::algorithm::AlgorithmKind;
use super::scoring::MatchingService;
use crate::api::batch_response::{
    BatchResult, BulkMatchResult, BulkSummary, CandidateRanking, JobMatches, JobRanking,
    RankedEntry,
};
use crate::api::match_response::MatchResult;
use crate::config::{BatchConfig, CancellationPolicy};
use crate::error::{MatchError, PairError};
use crate::model::{Candidate, Identified, Job, RecordKind, raw_record_id};

/// Per-call cancellation controls. Checked before each pair is scored;
/// pairs already in flight finish.
#[derive(Debug, Clone, Default)]
pub struct BatchControl {
    pub cancel: Option<CancellationToken>,
    pub deadline: Option<Instant>,
    /// Overrides [`BatchConfig::cancellation_policy`] for this call.
    pub policy: Option<CancellationPolicy>,
    /// Cancels the token once this many pairs have been scored.
    #[cfg(test)]
    cancel_after: Option<(usize, std::sync::Arc<std::sync::atomic::AtomicUsize>)>,
}

impl BatchControl {
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_policy(mut self, policy: CancellationPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn should_stop(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    #[cfg(test)]
    pub(crate) fn cancel_after(mut self, pairs: usize) -> Self {
        self.cancel.get_or_insert_with(CancellationToken::new);
        self.cancel_after = Some((pairs, Default::default()));
        self
    }

    fn pair_finished(&self) {
        #[cfg(test)]
        if let (Some((limit, count)), Some(token)) = (&self.cancel_after, &self.cancel) {
            let done = count.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            if done >= *limit {
                token.cancel();
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOptions {
    /// Minimum score for a candidate to be listed under a job.
    pub threshold: u8,
    pub per_job_limit: usize,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            threshold: 50,
            per_job_limit: 5,
        }
    }
}

enum PairOutcome {
    Scored(usize, MatchResult),
    Failed(PairError),
    Skipped,
}

struct Ranked {
    scored: Vec<(usize, MatchResult)>,
    errors: Vec<PairError>,
    skipped: usize,
}

/// Scores one subject against a pool on a bounded rayon pool and returns a
/// stably sorted top-N.
pub struct BatchRanker {
    service: MatchingService,
    config: BatchConfig,
    pool: rayon::ThreadPool,
}

impl BatchRanker {
    pub fn new(service: MatchingService, config: BatchConfig) -> Result<Self, MatchError> {
        let threads = config.resolved_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("tm-batch-{index}"))
            .build()
            .map_err(|err| MatchError::WorkerPool(err.to_string()))?;

        Ok(Self {
            service,
            config,
            pool,
        })
    }

    pub fn service(&self) -> &MatchingService {
        &self.service
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    // -----------------------------------------------------------------------
    // Candidates for a job
    // -----------------------------------------------------------------------

    pub fn rank_candidates(
        &self,
        job: &Job,
        candidates: &[Candidate],
        limit: Option<usize>,
        algorithm: AlgorithmKind,
        control: &BatchControl,
    ) -> Result<CandidateRanking, MatchError> {
        self.rank_candidates_at(job, candidates, limit, algorithm, control, Utc::now())
    }

    pub fn rank_candidates_at(
        &self,
        job: &Job,
        candidates: &[Candidate],
        limit: Option<usize>,
        algorithm: AlgorithmKind,
        control: &BatchControl,
        now: DateTime<Utc>,
    ) -> Result<CandidateRanking, MatchError> {
        let indexed: Vec<(usize, &Candidate)> = candidates.iter().enumerate().collect();
        self.rank_for_job(job, indexed, Vec::new(), candidates.len(), limit, algorithm, control, now)
    }

    /// Like [`rank_candidates`](Self::rank_candidates) but decodes each raw
    /// record on its own, so a malformed record becomes a per-pair error.
    pub fn rank_candidate_records(
        &self,
        job: &Job,
        records: Vec<Value>,
        limit: Option<usize>,
        algorithm: AlgorithmKind,
        control: &BatchControl,
    ) -> Result<CandidateRanking, MatchError> {
        let total = records.len();
        let (decoded, errors) = decode_records(records, Candidate::from_value);
        let indexed = decoded.iter().map(|(index, c)| (*index, c)).collect();
        self.rank_for_job(job, indexed, errors, total, limit, algorithm, control, Utc::now())
    }

    #[allow(clippy::too_many_arguments)]
    fn rank_for_job(
        &self,
        job: &Job,
        indexed: Vec<(usize, &Candidate)>,
        mut errors: Vec<PairError>,
        total: usize,
        limit: Option<usize>,
        algorithm: AlgorithmKind,
        control: &BatchControl,
        now: DateTime<Utc>,
    ) -> Result<CandidateRanking, MatchError> {
        job.validate()?;
        let limit = limit.unwrap_or(self.config.default_limit);

        let ranked = self.score_pool(&job.id, &indexed, total, limit, control, |candidate| {
            self.service
                .match_candidate_to_job_at(candidate, job, algorithm, now)
        })?;
        errors.extend(ranked.errors);
        errors.sort_by_key(|e| e.index);

        let lookup: BTreeMap<usize, &Candidate> = indexed.into_iter().collect();
        let matches = attach_entities(ranked.scored, &lookup);

        Ok(BatchResult {
            subject: job.clone(),
            matches,
            total_count: total,
            algorithm,
            timestamp: Utc::now(),
            errors,
            cancelled: ranked.skipped > 0,
            skipped: ranked.skipped,
        })
    }

    // -----------------------------------------------------------------------
    // Jobs for a candidate
    // -----------------------------------------------------------------------

    pub fn rank_jobs(
        &self,
        candidate: &Candidate,
        jobs: &[Job],
        limit: Option<usize>,
        algorithm: AlgorithmKind,
        control: &BatchControl,
    ) -> Result<JobRanking, MatchError> {
        self.rank_jobs_at(candidate, jobs, limit, algorithm, control, Utc::now())
    }

    pub fn rank_jobs_at(
        &self,
        candidate: &Candidate,
        jobs: &[Job],
        limit: Option<usize>,
        algorithm: AlgorithmKind,
        control: &BatchControl,
        now: DateTime<Utc>,
    ) -> Result<JobRanking, MatchError> {
        let indexed: Vec<(usize, &Job)> = jobs.iter().enumerate().collect();
        self.rank_for_candidate(candidate, indexed, Vec::new(), jobs.len(), limit, algorithm, control, now)
    }

    pub fn rank_job_records(
        &self,
        candidate: &Candidate,
        records: Vec<Value>,
        limit: Option<usize>,
        algorithm: AlgorithmKind,
        control: &BatchControl,
    ) -> Result<JobRanking, MatchError> {
        let total = records.len();
        let (decoded, errors) = decode_records(records, Job::from_value);
        let indexed = decoded.iter().map(|(index, j)| (*index, j)).collect();
        self.rank_for_candidate(candidate, indexed, errors, total, limit, algorithm, control, Utc::now())
    }

    #[allow(clippy::too_many_arguments)]
    fn rank_for_candidate(
        &self,
        candidate: &Candidate,
        indexed: Vec<(usize, &Job)>,
        mut errors: Vec<PairError>,
        total: usize,
        limit: Option<usize>,
        algorithm: AlgorithmKind,
        control: &BatchControl,
        now: DateTime<Utc>,
    ) -> Result<JobRanking, MatchError> {
        candidate.validate()?;
        let limit = limit.unwrap_or(self.config.default_limit);

        let ranked = self.score_pool(&candidate.id, &indexed, total, limit, control, |job| {
            self.service
                .match_candidate_to_job_at(candidate, job, algorithm, now)
        })?;
        errors.extend(ranked.errors);
        errors.sort_by_key(|e| e.index);

        let lookup: BTreeMap<usize, &Job> = indexed.into_iter().collect();
        let matches = attach_entities(ranked.scored, &lookup);

        Ok(BatchResult {
            subject: candidate.clone(),
            matches,
            total_count: total,
            algorithm,
            timestamp: Utc::now(),
            errors,
            cancelled: ranked.skipped > 0,
            skipped: ranked.skipped,
        })
    }

    // -----------------------------------------------------------------------
    // Bulk
    // -----------------------------------------------------------------------

    /// Ranks candidates for every job and keeps, per job, the top
    /// `per_job_limit` matches scoring at least `threshold`. Jobs without a
    /// qualified match are left out of `results`.
    #[instrument(skip_all, fields(jobs = jobs.len(), candidates = candidates.len(), algorithm = %algorithm))]
    pub fn bulk_match(
        &self,
        jobs: &[Job],
        candidates: &[Candidate],
        algorithm: AlgorithmKind,
        options: BulkOptions,
        control: &BatchControl,
    ) -> Result<BulkMatchResult, MatchError> {
        let now = Utc::now();
        let mut results = Vec::new();
        let mut errors: BTreeMap<(RecordKind, usize), PairError> = BTreeMap::new();
        let mut cancelled = false;
        // jobs whose whole candidate pool was looked at
        let mut processed = 0;

        for (job_index, job) in jobs.iter().enumerate() {
            if control.should_stop() {
                cancelled = true;
                break;
            }

            let ranking = match self.rank_candidates_at(
                job,
                candidates,
                Some(options.per_job_limit),
                algorithm,
                control,
                now,
            ) {
                Ok(ranking) => ranking,
                Err(err @ MatchError::MalformedInput { .. }) => {
                    warn!(index = job_index, job_id = %job.id, error = %err, "job excluded from bulk match");
                    errors.insert(
                        (RecordKind::Job, job_index),
                        PairError::new(RecordKind::Job, job_index, Some(job.id.clone()), &err),
                    );
                    processed += 1;
                    continue;
                }
                Err(MatchError::Cancelled { .. }) => {
                    cancelled = true;
                    break;
                }
                Err(err) => return Err(err),
            };

            cancelled |= ranking.cancelled;
            if !ranking.cancelled {
                processed += 1;
            }
            // candidate failures repeat for every job; keep one entry per candidate
            for error in ranking.errors {
                errors.entry((error.record, error.index)).or_insert(error);
            }

            let qualified: Vec<RankedEntry<Candidate>> = ranking
                .matches
                .into_iter()
                .filter(|entry| entry.result.score >= options.threshold)
                .collect();
            if !qualified.is_empty() {
                results.push(JobMatches {
                    job: ranking.subject,
                    total_qualified: qualified.len(),
                    matches: qualified,
                });
            }

            if ranking.skipped > 0 {
                break;
            }
        }

        if cancelled && self.policy(control) == CancellationPolicy::FailBatch {
            return Err(MatchError::Cancelled {
                completed: processed,
                total: jobs.len(),
            });
        }

        info!(
            processed,
            jobs_with_matches = results.len(),
            errors = errors.len(),
            cancelled,
            "bulk match finished"
        );

        Ok(BulkMatchResult {
            summary: BulkSummary {
                total_jobs: jobs.len(),
                jobs_with_matches: results.len(),
                total_candidates: candidates.len(),
                algorithm,
                threshold: options.threshold,
            },
            results,
            errors: errors.into_values().collect(),
            cancelled,
            timestamp: Utc::now(),
        })
    }

    fn policy(&self, control: &BatchControl) -> CancellationPolicy {
        control.policy.unwrap_or(self.config.cancellation_policy)
    }

    /// Scores every entry in parallel, then sorts by score descending. The
    /// sort is stable and outcomes are collected in input order, so ties keep
    /// the caller's order.
    fn score_pool<E, F>(
        &self,
        subject_id: &str,
        indexed: &[(usize, &E)],
        total: usize,
        limit: usize,
        control: &BatchControl,
        score: F,
    ) -> Result<Ranked, MatchError>
    where
        E: Identified + Sync,
        F: Fn(&E) -> Result<MatchResult, MatchError> + Sync,
    {
        let started = Instant::now();

        let outcomes: Vec<PairOutcome> = self.pool.install(|| {
            indexed
                .par_iter()
                .map(|&(index, entity)| {
                    if control.should_stop() {
                        return PairOutcome::Skipped;
                    }
                    let outcome = score(entity);
                    control.pair_finished();
                    match outcome {
                        Ok(result) => PairOutcome::Scored(index, result),
                        Err(err) => {
                            warn!(
                                index,
                                id = entity.record_id(),
                                error = %err,
                                "pair excluded from ranking"
                            );
                            PairOutcome::Failed(PairError::new(
                                E::KIND,
                                index,
                                Some(entity.record_id().to_string()),
                                &err,
                            ))
                        }
                    }
                })
                .collect()
        });

        let mut ranked = Ranked {
            scored: Vec::with_capacity(outcomes.len()),
            errors: Vec::new(),
            skipped: 0,
        };
        for outcome in outcomes {
            match outcome {
                PairOutcome::Scored(index, result) => ranked.scored.push((index, result)),
                PairOutcome::Failed(error) => ranked.errors.push(error),
                PairOutcome::Skipped => ranked.skipped += 1,
            }
        }

        if ranked.skipped > 0 && self.policy(control) == CancellationPolicy::FailBatch {
            warn!(subject_id, skipped = ranked.skipped, "batch cancelled");
            return Err(MatchError::Cancelled {
                completed: indexed.len() - ranked.skipped,
                total,
            });
        }

        ranked.scored.sort_by(|a, b| b.1.score.cmp(&a.1.score));
        let scored_count = ranked.scored.len();
        ranked.scored.truncate(limit);

        info!(
            subject_id,
            pool = total,
            scored = scored_count,
            returned = ranked.scored.len(),
            errors = ranked.errors.len(),
            skipped = ranked.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch ranked"
        );

        Ok(ranked)
    }
}

fn attach_entities<E: Clone>(
    scored: Vec<(usize, MatchResult)>,
    lookup: &BTreeMap<usize, &E>,
) -> Vec<RankedEntry<E>> {
    scored
        .into_iter()
        .filter_map(|(index, result)| {
            lookup.get(&index).map(|entity| RankedEntry {
                entity: (*entity).clone(),
                result,
            })
        })
        .collect()
}

fn decode_records<T, F>(records: Vec<Value>, decode: F) -> (Vec<(usize, T)>, Vec<PairError>)
where
    T: Identified,
    F: Fn(Value) -> Result<T, MatchError>,
{
    let mut decoded = Vec::with_capacity(records.len());
    let mut errors = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let id = raw_record_id(&record);
        match decode(record) {
            Ok(value) => decoded.push((index, value)),
            Err(err) => {
                warn!(index, id = ?id, error = %err, "record could not be decoded");
                errors.push(PairError::new(T::KIND, index, id, &err));
            }
        }
    }

    (decoded, errors)
}
